use std::borrow::Cow;
use std::collections::HashMap;

use crate::cancel::CancelToken;
use crate::error::{SmudgeError, SmudgeResult};
use crate::frame::{FrameRgba, GifMetadata};

/// Re-encodes edited full-canvas frames as an animated GIF, preserving the
/// source's per-frame sub-regions, disposal methods, and delays.
///
/// Each edited frame *is* the accumulated canvas after its source frame drew,
/// so the inverse of the extractor's draw-at-offset step is cropping exactly
/// the original sub-region back out. Re-encoding full canvases instead would
/// still play back, but would balloon the file and quietly rewrite the
/// disposal structure the user expects to keep.
pub fn reconstruct_gif(
    edited: &[FrameRgba],
    metadata: &GifMetadata,
    cancel: &CancelToken,
) -> SmudgeResult<Vec<u8>> {
    if edited.len() != metadata.frame_count() {
        return Err(SmudgeError::reconstruction(format!(
            "{} edited frames but metadata records {} (frame-index invariant broken)",
            edited.len(),
            metadata.frame_count()
        )));
    }

    let screen_w = metadata.screen_width;
    let screen_h = metadata.screen_height;
    let mut out = Vec::new();
    {
        let global = metadata.global_palette.as_deref().unwrap_or(&[]);
        let mut encoder = gif::Encoder::new(&mut out, screen_w as u16, screen_h as u16, global)
            .map_err(|e| SmudgeError::reconstruction(format!("encoder init: {e}")))?;
        encoder
            .set_repeat(gif::Repeat::Infinite)
            .map_err(|e| SmudgeError::reconstruction(format!("repeat header: {e}")))?;

        for (index, (frame, meta)) in edited.iter().zip(&metadata.frames).enumerate() {
            cancel.checkpoint()?;

            // Editing may have happened at a different target size; compositing
            // geometry is native, so go back to native before cropping.
            let native = frame.resized(screen_w, screen_h)?;
            let patch = native.crop(&meta.region)?;

            let mut encoded = quantize_patch(&patch);
            encoded.top = meta.region.top as u16;
            encoded.left = meta.region.left as u16;
            encoded.delay = meta.delay_cs;
            encoded.dispose = meta.disposal.into();
            encoder
                .write_frame(&encoded)
                .map_err(|e| SmudgeError::reconstruction(format!("frame {index}: {e}")))?;
        }
    }

    tracing::debug!(frames = edited.len(), bytes = out.len(), "reconstruction complete");
    Ok(out)
}

/// Indexed encoding for an RGBA patch. When the patch fits in one 256-entry
/// palette the mapping is exact, which keeps untouched regions byte-stable
/// across a round trip; otherwise the gif crate's quantizer takes over.
fn quantize_patch(patch: &FrameRgba) -> gif::Frame<'static> {
    match exact_palette_frame(patch) {
        Some(frame) => frame,
        None => {
            let mut rgba = patch.data.clone();
            let mut frame =
                gif::Frame::from_rgba_speed(patch.width as u16, patch.height as u16, &mut rgba, 10);
            frame.top = 0;
            frame.left = 0;
            frame
        }
    }
}

fn exact_palette_frame(patch: &FrameRgba) -> Option<gif::Frame<'static>> {
    let mut palette: Vec<u8> = Vec::new();
    let mut lookup: HashMap<[u8; 3], u8> = HashMap::new();
    let mut transparent: Option<u8> = None;
    let mut indices = Vec::with_capacity(patch.data.len() / 4);

    for px in patch.data.chunks_exact(4) {
        let index = if px[3] == 0 {
            match transparent {
                Some(i) => i,
                None => {
                    if palette.len() / 3 >= 256 {
                        return None;
                    }
                    let i = (palette.len() / 3) as u8;
                    // Reserve a slot; its color is never shown.
                    palette.extend_from_slice(&[0, 0, 0]);
                    transparent = Some(i);
                    i
                }
            }
        } else {
            let rgb = [px[0], px[1], px[2]];
            match lookup.get(&rgb) {
                Some(&i) => i,
                None => {
                    let used = palette.len() / 3;
                    if used >= 256 {
                        return None;
                    }
                    let i = used as u8;
                    palette.extend_from_slice(&rgb);
                    lookup.insert(rgb, i);
                    i
                }
            }
        };
        indices.push(index);
    }

    let mut frame = gif::Frame::default();
    frame.width = patch.width as u16;
    frame.height = patch.height as u16;
    frame.palette = Some(palette);
    frame.transparent = transparent;
    frame.buffer = Cow::Owned(indices);
    Some(frame)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{Disposal, FrameMeta, FrameRegion};

    fn solid(width: u32, height: u32, px: [u8; 4]) -> FrameRgba {
        let mut f = FrameRgba::blank(width, height).unwrap();
        for y in 0..height {
            for x in 0..width {
                f.set_pixel(x, y, px);
            }
        }
        f
    }

    fn meta_for(frames: usize, width: u32, height: u32) -> GifMetadata {
        GifMetadata {
            screen_width: width,
            screen_height: height,
            global_palette: None,
            frames: (0..frames)
                .map(|_| FrameMeta {
                    region: FrameRegion::new(0, 0, width, height),
                    disposal: Disposal::Keep,
                    delay_cs: 10,
                    transparent: None,
                })
                .collect(),
        }
    }

    #[test]
    fn frame_count_mismatch_fails_before_encoding() {
        let frames = vec![solid(4, 4, [1, 2, 3, 255]); 2];
        let meta = meta_for(3, 4, 4);
        let err = reconstruct_gif(&frames, &meta, &CancelToken::new()).unwrap_err();
        assert!(matches!(err, SmudgeError::Reconstruction(_)));
    }

    #[test]
    fn output_is_a_decodable_gif() {
        let frames = vec![
            solid(4, 4, [200, 10, 10, 255]),
            solid(4, 4, [10, 200, 10, 255]),
        ];
        let meta = meta_for(2, 4, 4);
        let bytes = reconstruct_gif(&frames, &meta, &CancelToken::new()).unwrap();
        assert_eq!(&bytes[0..6], b"GIF89a");

        let (decoded, decoded_meta) =
            crate::extract::extract_frames(&bytes, None, &CancelToken::new()).unwrap();
        assert_eq!(decoded.len(), 2);
        assert_eq!(decoded_meta.frames[0].delay_cs, 10);
        assert_eq!(decoded[0].pixel(1, 1), [200, 10, 10, 255]);
        assert_eq!(decoded[1].pixel(1, 1), [10, 200, 10, 255]);
    }

    #[test]
    fn exact_palette_handles_transparency() {
        let mut patch = solid(2, 2, [9, 9, 9, 255]);
        patch.set_pixel(1, 1, [0, 0, 0, 0]);
        let frame = exact_palette_frame(&patch).unwrap();
        assert!(frame.transparent.is_some());
        assert_eq!(frame.buffer.len(), 4);
    }

    #[test]
    fn exact_palette_gives_up_past_256_colors() {
        let mut patch = FrameRgba::blank(32, 32).unwrap();
        for y in 0..32 {
            for x in 0..32 {
                patch.set_pixel(x, y, [x as u8 * 8, y as u8 * 8, 77, 255]);
            }
        }
        assert!(exact_palette_frame(&patch).is_none());
    }
}

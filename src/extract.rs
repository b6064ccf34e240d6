use std::io::Cursor;

use crate::cancel::CancelToken;
use crate::error::{SmudgeError, SmudgeResult};
use crate::frame::{Disposal, FrameMeta, FrameRegion, FrameRgba, GifMetadata};

/// Disposal-aware canvas accumulator: the explicit `(canvas, snapshot)` state
/// for the compositing fold. Frame N's visible pixels depend on frames
/// 0..N-1 through disposal, so steps must run in frame order.
///
/// Disposal is deferred: a frame's disposal applies to the canvas immediately
/// before the *next* frame draws, which is why the previous frame's region and
/// disposal ride along in the accumulator.
#[derive(Clone, Debug)]
pub struct Compositor {
    canvas: FrameRgba,
    saved: Option<FrameRgba>,
    prev: Option<(FrameRegion, Disposal)>,
}

impl Compositor {
    pub fn new(screen_width: u32, screen_height: u32) -> SmudgeResult<Self> {
        Ok(Self {
            canvas: FrameRgba::blank(screen_width, screen_height)?,
            saved: None,
            prev: None,
        })
    }

    /// Composites one frame and returns the resulting full-canvas state.
    pub fn step(
        &mut self,
        patch: &FrameRgba,
        region: FrameRegion,
        disposal: Disposal,
    ) -> FrameRgba {
        match self.prev.take() {
            // Clear only the previous frame's sub-region, not the whole canvas.
            Some((prev_region, Disposal::Background)) => {
                self.canvas.clear_region(&prev_region);
            }
            // Roll back to the snapshot taken before the previous frame drew.
            Some((_, Disposal::Previous)) => {
                if let Some(saved) = self.saved.take() {
                    self.canvas = saved;
                }
            }
            Some((_, Disposal::Keep)) | None => {}
        }

        // A later frame may need the canvas exactly as it was before this
        // frame draws.
        if disposal == Disposal::Previous {
            self.saved = Some(self.canvas.clone());
        }

        self.canvas.draw_patch(patch, region.left, region.top);
        self.prev = Some((region, disposal));
        self.canvas.clone()
    }
}

/// Decodes a GIF byte stream into disposal-composited full-canvas frames plus
/// the metadata reconstruction needs later.
///
/// Compositing always runs at the native logical-screen size; when a target
/// size is given, each composited frame is additionally resampled to it, so
/// scaling never leaks into the compositing math. Unreadable individual frame
/// patches are skipped (with their metadata records, keeping frames and
/// metadata index-aligned); a GIF with zero usable frames is a decode error.
pub fn extract_frames(
    bytes: &[u8],
    target_size: Option<(u32, u32)>,
    cancel: &CancelToken,
) -> SmudgeResult<(Vec<FrameRgba>, GifMetadata)> {
    let mut options = gif::DecodeOptions::new();
    options.set_color_output(gif::ColorOutput::RGBA);
    let mut decoder = options
        .read_info(Cursor::new(bytes))
        .map_err(|e| SmudgeError::decode(format!("unreadable GIF container: {e}")))?;

    let screen_width = u32::from(decoder.width());
    let screen_height = u32::from(decoder.height());
    if screen_width == 0 || screen_height == 0 {
        return Err(SmudgeError::decode("GIF logical screen has zero area"));
    }
    if let Some((w, h)) = target_size {
        if w == 0 || h == 0 {
            return Err(SmudgeError::validation("target size must be non-zero"));
        }
    }
    let global_palette = decoder.global_palette().map(|p| p.to_vec());

    let mut compositor = Compositor::new(screen_width, screen_height)?;
    let mut frames = Vec::new();
    let mut metas = Vec::new();
    let mut index = 0usize;

    loop {
        cancel.checkpoint()?;
        let decoded = match decoder.read_next_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => break,
            Err(e) if index == 0 => {
                return Err(SmudgeError::decode(format!("first frame unreadable: {e}")));
            }
            Err(e) => {
                // Truncated tail after good frames: keep what we have.
                tracing::warn!(frame = index, error = %e, "stopping at unreadable frame");
                break;
            }
        };
        index += 1;

        let region = FrameRegion::new(
            u32::from(decoded.left),
            u32::from(decoded.top),
            u32::from(decoded.width),
            u32::from(decoded.height),
        );
        let expected = (region.width as usize) * (region.height as usize) * 4;
        if region.is_empty() || decoded.buffer.len() != expected {
            tracing::warn!(
                frame = index - 1,
                width = region.width,
                height = region.height,
                bytes = decoded.buffer.len(),
                "skipping frame with empty or short patch"
            );
            continue;
        }

        let patch = FrameRgba::from_data(region.width, region.height, decoded.buffer.to_vec())?;
        let disposal = Disposal::from(decoded.dispose);
        let composited = compositor.step(&patch, region, disposal);

        let frame = match target_size {
            Some((w, h)) => composited.resized(w, h)?,
            None => composited,
        };
        frames.push(frame);
        metas.push(FrameMeta {
            region,
            disposal,
            delay_cs: decoded.delay,
            transparent: decoded.transparent,
        });
    }

    if frames.is_empty() {
        return Err(SmudgeError::decode("GIF contains zero usable frames"));
    }
    tracing::debug!(
        frames = frames.len(),
        screen_width,
        screen_height,
        "extraction complete"
    );

    Ok((
        frames,
        GifMetadata {
            screen_width,
            screen_height,
            global_palette,
            frames: metas,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(width: u32, height: u32, px: [u8; 4]) -> FrameRgba {
        let mut f = FrameRgba::blank(width, height).unwrap();
        for y in 0..height {
            for x in 0..width {
                f.set_pixel(x, y, px);
            }
        }
        f
    }

    #[test]
    fn keep_disposal_accumulates() {
        let mut c = Compositor::new(4, 4).unwrap();
        c.step(
            &solid(4, 4, [10, 0, 0, 255]),
            FrameRegion::new(0, 0, 4, 4),
            Disposal::Keep,
        );
        let second = c.step(
            &solid(2, 2, [0, 20, 0, 255]),
            FrameRegion::new(1, 1, 2, 2),
            Disposal::Keep,
        );

        assert_eq!(second.pixel(0, 0), [10, 0, 0, 255]);
        assert_eq!(second.pixel(1, 1), [0, 20, 0, 255]);
        assert_eq!(second.pixel(3, 3), [10, 0, 0, 255]);
    }

    #[test]
    fn background_disposal_clears_only_the_previous_region() {
        let mut c = Compositor::new(4, 4).unwrap();
        c.step(
            &solid(4, 4, [10, 0, 0, 255]),
            FrameRegion::new(0, 0, 4, 4),
            Disposal::Keep,
        );
        c.step(
            &solid(2, 2, [0, 20, 0, 255]),
            FrameRegion::new(1, 1, 2, 2),
            Disposal::Background,
        );
        let third = c.step(
            &solid(1, 1, [0, 0, 30, 255]),
            FrameRegion::new(0, 0, 1, 1),
            Disposal::Keep,
        );

        // Frame 1's region was cleared before frame 2 drew.
        assert_eq!(third.pixel(1, 1), [0, 0, 0, 0]);
        assert_eq!(third.pixel(2, 2), [0, 0, 0, 0]);
        // Outside frame 1's region the first frame survives.
        assert_eq!(third.pixel(3, 3), [10, 0, 0, 255]);
        assert_eq!(third.pixel(0, 0), [0, 0, 30, 255]);
    }

    #[test]
    fn previous_disposal_restores_the_predraw_snapshot() {
        let mut c = Compositor::new(2, 2).unwrap();
        let first = c.step(
            &solid(2, 2, [10, 0, 0, 255]),
            FrameRegion::new(0, 0, 2, 2),
            Disposal::Keep,
        );
        c.step(
            &solid(2, 2, [0, 20, 0, 255]),
            FrameRegion::new(0, 0, 2, 2),
            Disposal::Previous,
        );
        let third = c.step(
            &solid(1, 1, [0, 0, 30, 255]),
            FrameRegion::new(1, 1, 1, 1),
            Disposal::Keep,
        );

        // Frame 2's pixels are gone; frame 1 shows through under frame 3.
        assert_eq!(third.pixel(0, 0), first.pixel(0, 0));
        assert_eq!(third.pixel(1, 1), [0, 0, 30, 255]);
    }

    #[test]
    fn garbage_bytes_fail_with_decode_error() {
        let err = extract_frames(b"definitely not a gif", None, &CancelToken::new()).unwrap_err();
        assert!(matches!(err, SmudgeError::Decode(_)));
    }
}

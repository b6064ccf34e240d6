use image::{RgbaImage, imageops};

use crate::error::{SmudgeError, SmudgeResult};

/// Row-major RGBA8 pixel buffer. The unit passed between every pipeline stage:
/// decoded patches, composited canvases, edited frames.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRgba {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl FrameRgba {
    /// Fully transparent buffer of the given size.
    pub fn blank(width: u32, height: u32) -> SmudgeResult<Self> {
        let len = buffer_len(width, height)?;
        Ok(Self {
            width,
            height,
            data: vec![0u8; len],
        })
    }

    pub fn from_data(width: u32, height: u32, data: Vec<u8>) -> SmudgeResult<Self> {
        let expected = buffer_len(width, height)?;
        if data.len() != expected {
            return Err(SmudgeError::dimension_mismatch(format!(
                "rgba buffer is {} bytes, expected {} for {}x{}",
                data.len(),
                expected,
                width,
                height
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn same_size(&self, other: &FrameRgba) -> bool {
        self.width == other.width && self.height == other.height
    }

    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = ((y * self.width + x) * 4) as usize;
        [self.data[i], self.data[i + 1], self.data[i + 2], self.data[i + 3]]
    }

    #[inline]
    pub fn set_pixel(&mut self, x: u32, y: u32, px: [u8; 4]) {
        let i = ((y * self.width + x) * 4) as usize;
        self.data[i..i + 4].copy_from_slice(&px);
    }

    /// Draws a patch at the given offset with GIF transparency semantics:
    /// pixels with alpha 0 leave the canvas untouched, everything else is
    /// copied verbatim. Out-of-canvas pixels are dropped.
    pub fn draw_patch(&mut self, patch: &FrameRgba, left: u32, top: u32) {
        for row in 0..patch.height {
            let dst_y = top + row;
            if dst_y >= self.height {
                break;
            }
            for col in 0..patch.width {
                let dst_x = left + col;
                if dst_x >= self.width {
                    break;
                }
                let px = patch.pixel(col, row);
                if px[3] > 0 {
                    self.set_pixel(dst_x, dst_y, px);
                }
            }
        }
    }

    /// Resets a sub-region to fully transparent. Used for
    /// restore-to-background disposal; the region is clamped to the canvas.
    pub fn clear_region(&mut self, region: &FrameRegion) {
        let clamped = region.clamped_to(self.width, self.height);
        for row in 0..clamped.height {
            let y = clamped.top + row;
            let start = ((y * self.width + clamped.left) * 4) as usize;
            let end = start + (clamped.width * 4) as usize;
            self.data[start..end].fill(0);
        }
    }

    /// Copies out exactly the given sub-region. The inverse of `draw_patch`.
    pub fn crop(&self, region: &FrameRegion) -> SmudgeResult<FrameRgba> {
        let clamped = region.clamped_to(self.width, self.height);
        if clamped != *region {
            return Err(SmudgeError::dimension_mismatch(format!(
                "crop region {}x{}+{}+{} exceeds canvas {}x{}",
                region.width, region.height, region.left, region.top, self.width, self.height
            )));
        }
        let mut out = FrameRgba::blank(region.width, region.height)?;
        for row in 0..region.height {
            let src_y = region.top + row;
            let src_start = ((src_y * self.width + region.left) * 4) as usize;
            let dst_start = ((row * region.width) * 4) as usize;
            let len = (region.width * 4) as usize;
            out.data[dst_start..dst_start + len]
                .copy_from_slice(&self.data[src_start..src_start + len]);
        }
        Ok(out)
    }

    /// Bilinear resample to the target size. Identity when the size already
    /// matches (no copy semantics change, still returns an owned frame).
    pub fn resized(&self, width: u32, height: u32) -> SmudgeResult<FrameRgba> {
        if width == self.width && height == self.height {
            return Ok(self.clone());
        }
        if width == 0 || height == 0 {
            return Err(SmudgeError::validation("resize target must be non-zero"));
        }
        let img = RgbaImage::from_raw(self.width, self.height, self.data.clone())
            .ok_or_else(|| SmudgeError::validation("rgba buffer does not match dimensions"))?;
        let out = imageops::resize(&img, width, height, imageops::FilterType::Triangle);
        Ok(FrameRgba {
            width,
            height,
            data: out.into_raw(),
        })
    }
}

fn buffer_len(width: u32, height: u32) -> SmudgeResult<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(4))
        .ok_or_else(|| SmudgeError::validation("frame buffer size overflow"))
}

/// Per-frame GIF disposal instruction: what happens to the canvas before the
/// next frame draws.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Disposal {
    /// None/unspecified: leave the canvas as-is (additive compositing).
    Keep,
    /// Clear this frame's own sub-region to transparent.
    Background,
    /// Restore the canvas to its state before this frame drew.
    Previous,
}

impl From<gif::DisposalMethod> for Disposal {
    fn from(d: gif::DisposalMethod) -> Self {
        match d {
            gif::DisposalMethod::Any | gif::DisposalMethod::Keep => Disposal::Keep,
            gif::DisposalMethod::Background => Disposal::Background,
            gif::DisposalMethod::Previous => Disposal::Previous,
        }
    }
}

impl From<Disposal> for gif::DisposalMethod {
    fn from(d: Disposal) -> Self {
        match d {
            Disposal::Keep => gif::DisposalMethod::Keep,
            Disposal::Background => gif::DisposalMethod::Background,
            Disposal::Previous => gif::DisposalMethod::Previous,
        }
    }
}

/// A frame's sub-rectangle within the logical screen.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FrameRegion {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

impl FrameRegion {
    pub fn new(left: u32, top: u32, width: u32, height: u32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Intersection with a canvas anchored at the origin.
    pub fn clamped_to(&self, canvas_width: u32, canvas_height: u32) -> FrameRegion {
        let left = self.left.min(canvas_width);
        let top = self.top.min(canvas_height);
        FrameRegion {
            left,
            top,
            width: self.width.min(canvas_width - left),
            height: self.height.min(canvas_height - top),
        }
    }
}

/// Immutable per-frame metadata recorded at decode time and consumed again at
/// reconstruction time.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FrameMeta {
    pub region: FrameRegion,
    pub disposal: Disposal,
    /// Display delay in GIF time units (centiseconds).
    pub delay_cs: u16,
    /// Transparent palette index from the source frame, if any.
    pub transparent: Option<u8>,
}

/// Everything about the source GIF that reconstruction needs: created once by
/// extraction, read-only afterward.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct GifMetadata {
    pub screen_width: u32,
    pub screen_height: u32,
    /// Global color table (RGB triples), when the source carried one.
    pub global_palette: Option<Vec<u8>>,
    /// One record per usable frame, index-aligned with the composited frames.
    pub frames: Vec<FrameMeta>,
}

impl GifMetadata {
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }
}

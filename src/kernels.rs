use crate::error::{SmudgeError, SmudgeResult};
use crate::frame::FrameRgba;

/// Spatial blur style applied inside the painted mask.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlurStyle {
    /// Box-average approximation of a gaussian blur.
    Gaussian,
    /// Block quantization: every pixel takes its block's corner color.
    Pixelated,
    /// Block averaging: every pixel takes its block's mean color.
    Mosaic,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct BlurSettings {
    pub style: BlurStyle,
    pub intensity: u32,
}

impl BlurSettings {
    pub fn new(style: BlurStyle, intensity: u32) -> Self {
        Self { style, intensity }
    }

    pub fn validate(&self) -> SmudgeResult<()> {
        if self.intensity > 256 {
            return Err(SmudgeError::validation("blur intensity must be <= 256"));
        }
        Ok(())
    }

    /// Intensity 0 leaves every pixel untouched.
    pub fn is_noop(&self) -> bool {
        self.intensity == 0
    }

    pub fn kernel(&self) -> PixelKernel {
        match self.style {
            BlurStyle::Gaussian => gaussian_px,
            BlurStyle::Pixelated => pixelate_px,
            BlurStyle::Mosaic => mosaic_px,
        }
    }
}

/// Unconditional per-pixel transform: reads the pristine `src`, writes one
/// pixel of `dst`. Deciding which pixels to transform is the caller's job, so
/// output never depends on visit order and frames can be processed in
/// parallel.
pub type PixelKernel = fn(x: u32, y: u32, src: &FrameRgba, dst: &mut FrameRgba, intensity: u32);

/// Averages a square neighborhood of radius `intensity / 2` around (x, y),
/// clamping neighbor coordinates to the buffer edges.
pub fn gaussian_px(x: u32, y: u32, src: &FrameRgba, dst: &mut FrameRgba, intensity: u32) {
    let radius = (intensity / 2) as i64;
    if radius == 0 {
        dst.set_pixel(x, y, src.pixel(x, y));
        return;
    }

    let w = i64::from(src.width);
    let h = i64::from(src.height);
    let mut acc = [0u64; 4];
    let mut count = 0u64;
    for dy in -radius..=radius {
        let sy = (i64::from(y) + dy).clamp(0, h - 1) as u32;
        for dx in -radius..=radius {
            let sx = (i64::from(x) + dx).clamp(0, w - 1) as u32;
            let px = src.pixel(sx, sy);
            for c in 0..4 {
                acc[c] += u64::from(px[c]);
            }
            count += 1;
        }
    }

    let mut out = [0u8; 4];
    for c in 0..4 {
        out[c] = ((acc[c] + count / 2) / count) as u8;
    }
    dst.set_pixel(x, y, out);
}

/// Snaps (x, y) down to the corner of its containing block of size
/// `max(1, intensity / 2)` and copies the corner pixel's color.
pub fn pixelate_px(x: u32, y: u32, src: &FrameRgba, dst: &mut FrameRgba, intensity: u32) {
    let block = (intensity / 2).max(1);
    let bx = x - x % block;
    let by = y - y % block;
    dst.set_pixel(x, y, src.pixel(bx, by));
}

/// Like `pixelate_px` but averages the whole block instead of sampling the
/// corner. The average is recomputed for every pixel in the block; frames are
/// small enough that caching per block is not worth the bookkeeping.
pub fn mosaic_px(x: u32, y: u32, src: &FrameRgba, dst: &mut FrameRgba, intensity: u32) {
    let block = (intensity / 2).max(1);
    let bx = x - x % block;
    let by = y - y % block;
    let x_end = (bx + block).min(src.width);
    let y_end = (by + block).min(src.height);

    let mut acc = [0u64; 4];
    let mut count = 0u64;
    for sy in by..y_end {
        for sx in bx..x_end {
            let px = src.pixel(sx, sy);
            for c in 0..4 {
                acc[c] += u64::from(px[c]);
            }
            count += 1;
        }
    }

    let mut out = [0u8; 4];
    for c in 0..4 {
        out[c] = ((acc[c] + count / 2) / count) as u8;
    }
    dst.set_pixel(x, y, out);
}

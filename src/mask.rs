use crate::error::{SmudgeError, SmudgeResult};
use crate::frame::{FrameRegion, FrameRgba};

/// Full-canvas alpha buffer holding the user-painted blur region. One mask per
/// editing session, shared across every frame; membership is binary (any alpha
/// above zero counts), the exact alpha value never matters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MaskCanvas {
    width: u32,
    height: u32,
    alpha: Vec<u8>,
}

impl MaskCanvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            alpha: vec![0u8; (width as usize) * (height as usize)],
        }
    }

    /// Wraps an alpha buffer painted elsewhere (e.g. a UI canvas handing over
    /// its stroke layer).
    pub fn from_alpha(width: u32, height: u32, alpha: Vec<u8>) -> SmudgeResult<Self> {
        if alpha.len() != (width as usize) * (height as usize) {
            return Err(SmudgeError::dimension_mismatch(format!(
                "alpha buffer is {} bytes, expected {} for {}x{}",
                alpha.len(),
                (width as usize) * (height as usize),
                width,
                height
            )));
        }
        Ok(Self {
            width,
            height,
            alpha,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn matches(&self, frame: &FrameRgba) -> bool {
        self.width == frame.width && self.height == frame.height
    }

    /// Stamps an opaque filled circle centered at (cx, cy). Additive: strokes
    /// accumulate and never erase. Off-canvas portions are clipped.
    pub fn paint(&mut self, cx: i64, cy: i64, brush_radius: u32) {
        let r = i64::from(brush_radius.max(1));
        let r2 = r * r;
        let y0 = (cy - r).max(0);
        let y1 = (cy + r).min(i64::from(self.height) - 1);
        for y in y0..=y1 {
            let dy = y - cy;
            let x0 = (cx - r).max(0);
            let x1 = (cx + r).min(i64::from(self.width) - 1);
            for x in x0..=x1 {
                let dx = x - cx;
                if dx * dx + dy * dy <= r2 {
                    self.alpha[(y as usize) * (self.width as usize) + (x as usize)] = 255;
                }
            }
        }
    }

    /// Stamps an axis-aligned rectangle. Batch/CLI entry point for masks that
    /// were not hand-painted.
    pub fn paint_rect(&mut self, region: &FrameRegion) {
        let clamped = region.clamped_to(self.width, self.height);
        for y in clamped.top..clamped.top + clamped.height {
            let row = (y as usize) * (self.width as usize);
            self.alpha[row + clamped.left as usize..row + (clamped.left + clamped.width) as usize]
                .fill(255);
        }
    }

    pub fn clear(&mut self) {
        self.alpha.fill(0);
    }

    #[inline]
    pub fn is_masked(&self, x: u32, y: u32) -> bool {
        self.alpha[(y as usize) * (self.width as usize) + (x as usize)] > 0
    }

    pub fn is_empty(&self) -> bool {
        self.alpha.iter().all(|&a| a == 0)
    }

    pub fn painted_pixels(&self) -> usize {
        self.alpha.iter().filter(|&&a| a > 0).count()
    }
}

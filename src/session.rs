use crate::cancel::CancelToken;
use crate::error::{SmudgeError, SmudgeResult};
use crate::extract::extract_frames;
use crate::frame::{FrameRgba, GifMetadata};
use crate::kernels::BlurSettings;
use crate::mask::MaskCanvas;
use crate::process::{apply_masked_blur, process_all};
use crate::reconstruct::reconstruct_gif;

/// One GIF editing session: the extracted frames, their metadata, the shared
/// mask, the currently shown frame, and the pending blur settings — all in one
/// passed-around value instead of ambient canvas state, so the whole
/// paint/preview/commit loop runs headless.
#[derive(Debug, Default)]
pub struct EditSession {
    frames: Vec<FrameRgba>,
    metadata: Option<GifMetadata>,
    mask: Option<MaskCanvas>,
    current: usize,
    settings: Option<BlurSettings>,
}

impl EditSession {
    /// Empty session; painting and previewing are no-ops until a GIF loads.
    pub fn new() -> Self {
        Self::default()
    }

    /// Extracts the GIF and sizes a fresh mask to the editing resolution.
    pub fn load(
        &mut self,
        bytes: &[u8],
        target_size: Option<(u32, u32)>,
        cancel: &CancelToken,
    ) -> SmudgeResult<()> {
        let (frames, metadata) = extract_frames(bytes, target_size, cancel)?;
        let (w, h) = (frames[0].width, frames[0].height);
        self.frames = frames;
        self.metadata = Some(metadata);
        self.mask = Some(MaskCanvas::new(w, h));
        self.current = 0;
        Ok(())
    }

    pub fn is_loaded(&self) -> bool {
        !self.frames.is_empty()
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn metadata(&self) -> Option<&GifMetadata> {
        self.metadata.as_ref()
    }

    pub fn current_frame(&self) -> Option<&FrameRgba> {
        self.frames.get(self.current)
    }

    pub fn select_frame(&mut self, index: usize) -> SmudgeResult<()> {
        if index >= self.frames.len() {
            return Err(SmudgeError::validation(format!(
                "frame {index} out of range (have {})",
                self.frames.len()
            )));
        }
        self.current = index;
        Ok(())
    }

    /// Brush stroke onto the shared mask. Drawing before a GIF is loaded is
    /// not an error, just a skipped stroke.
    pub fn paint(&mut self, x: i64, y: i64, brush_radius: u32) {
        let Some(mask) = self.mask.as_mut() else {
            return;
        };
        mask.paint(x, y, brush_radius);
    }

    /// Rectangular mask stamp for callers without pointer input (batch jobs,
    /// the CLI). Same silent no-op rule as `paint`.
    pub fn paint_rect(&mut self, region: &crate::frame::FrameRegion) {
        if let Some(mask) = self.mask.as_mut() {
            mask.paint_rect(region);
        }
    }

    pub fn clear_mask(&mut self) {
        if let Some(mask) = self.mask.as_mut() {
            mask.clear();
        }
    }

    pub fn mask(&self) -> Option<&MaskCanvas> {
        self.mask.as_ref()
    }

    pub fn set_blur(&mut self, settings: BlurSettings) -> SmudgeResult<()> {
        settings.validate()?;
        self.settings = Some(settings);
        Ok(())
    }

    /// Non-destructive preview of the current frame under the pending
    /// settings. Always computed from the pristine stored frame, so redraws
    /// with different settings never compound.
    pub fn preview(&self) -> SmudgeResult<FrameRgba> {
        let frame = self
            .current_frame()
            .ok_or_else(|| SmudgeError::validation("no GIF loaded"))?;
        let (Some(mask), Some(settings)) = (self.mask.as_ref(), self.settings.as_ref()) else {
            return Ok(frame.clone());
        };
        apply_masked_blur(frame, mask, settings)
    }

    /// Commits the pending blur across every frame and re-encodes the GIF.
    /// The stored frames stay pristine; exporting twice gives the same bytes.
    pub fn export_gif(&self, cancel: &CancelToken) -> SmudgeResult<Vec<u8>> {
        let metadata = self
            .metadata
            .as_ref()
            .ok_or_else(|| SmudgeError::validation("no GIF loaded"))?;
        let edited = match (self.mask.as_ref(), self.settings.as_ref()) {
            (Some(mask), Some(settings)) => process_all(&self.frames, mask, settings, cancel)?,
            _ => self.frames.clone(),
        };
        reconstruct_gif(&edited, metadata, cancel)
    }
}

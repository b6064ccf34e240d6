use rayon::prelude::*;

use crate::cancel::CancelToken;
use crate::error::{SmudgeError, SmudgeResult};
use crate::frame::FrameRgba;
use crate::kernels::BlurSettings;
use crate::mask::MaskCanvas;

/// Copy-on-write masked blur for one frame. The pristine `frame` is never
/// mutated, so repeated preview calls with different settings always start
/// from the same source instead of compounding earlier previews.
pub fn apply_masked_blur(
    frame: &FrameRgba,
    mask: &MaskCanvas,
    settings: &BlurSettings,
) -> SmudgeResult<FrameRgba> {
    settings.validate()?;
    if !mask.matches(frame) {
        return Err(SmudgeError::dimension_mismatch(format!(
            "mask is {}x{}, frame is {}x{}",
            mask.width(),
            mask.height(),
            frame.width,
            frame.height
        )));
    }

    let mut out = frame.clone();
    if settings.is_noop() || mask.is_empty() {
        return Ok(out);
    }

    let kernel = settings.kernel();
    for y in 0..frame.height {
        for x in 0..frame.width {
            if mask.is_masked(x, y) {
                kernel(x, y, frame, &mut out, settings.intensity);
            }
        }
    }
    Ok(out)
}

/// Applies the committed blur to every frame with the one shared mask,
/// returning a new array in input order. Frames are independent at this stage
/// (disposal ordering was already resolved during extraction), so they fan out
/// across the rayon pool. Any frame failing aborts the whole batch.
pub fn process_all(
    frames: &[FrameRgba],
    mask: &MaskCanvas,
    settings: &BlurSettings,
    cancel: &CancelToken,
) -> SmudgeResult<Vec<FrameRgba>> {
    settings.validate()?;
    for (index, frame) in frames.iter().enumerate() {
        if !mask.matches(frame) {
            return Err(SmudgeError::dimension_mismatch(format!(
                "frame {index} is {}x{}, mask is {}x{}",
                frame.width,
                frame.height,
                mask.width(),
                mask.height()
            )));
        }
    }
    cancel.checkpoint()?;

    tracing::debug!(
        frames = frames.len(),
        style = ?settings.style,
        intensity = settings.intensity,
        "batch blur start"
    );

    frames
        .par_iter()
        .map(|frame| {
            cancel.checkpoint()?;
            apply_masked_blur(frame, mask, settings)
        })
        .collect()
}

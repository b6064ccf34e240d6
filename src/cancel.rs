use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use crate::error::{SmudgeError, SmudgeResult};

/// Cooperative cancellation flag shared between a long-running pipeline stage
/// and its caller. Checked between frames only; a frame in flight finishes.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    /// Bails out of the current stage; partial state is discarded by the caller.
    pub fn checkpoint(&self) -> SmudgeResult<()> {
        if self.is_cancelled() {
            return Err(SmudgeError::Cancelled);
        }
        Ok(())
    }
}

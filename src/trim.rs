use std::path::PathBuf;

/// Smallest legal trim window, in seconds.
pub const MIN_TRIM_WINDOW: f64 = 0.1;

/// One layout slot's source clip and its active trim window. The slot may be
/// empty (no source yet); trim math only needs the duration.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct VideoClip {
    pub source: Option<PathBuf>,
    /// Full source duration in seconds.
    pub duration: f64,
    pub start_time: f64,
    pub end_time: f64,
    /// Longest window this clip may select.
    pub max_window: f64,
    /// Pixel offsets from the centered position within the layout cell.
    #[serde(default)]
    pub position_x: f64,
    #[serde(default)]
    pub position_y: f64,
    /// Content scale within the cell; 1.0 fills the cell exactly.
    #[serde(default = "default_scale")]
    pub scale: f64,
}

fn default_scale() -> f64 {
    1.0
}

impl VideoClip {
    pub fn new(source: Option<PathBuf>, duration: f64, max_window: f64) -> Self {
        let duration = duration.max(0.0);
        let max_window = max_window.max(MIN_TRIM_WINDOW);
        Self {
            source,
            duration,
            start_time: 0.0,
            end_time: duration.min(max_window),
            max_window,
            position_x: 0.0,
            position_y: 0.0,
            scale: 1.0,
        }
    }

    pub fn window(&self) -> f64 {
        self.end_time - self.start_time
    }

    fn at_max_window(&self) -> bool {
        self.window() >= self.max_window - f64::EPSILON
    }

    /// Moves the window's start. When the window is already at its maximum
    /// width, both boundaries slide together; otherwise only the start moves.
    /// Always clamps to a legal window, never errors.
    pub fn set_start_time(&mut self, new_start: f64) {
        let new_start = clamp_time(new_start, self.duration);
        if self.at_max_window() {
            let width = self.window();
            let mut start = new_start;
            let mut end = start + width;
            if end > self.duration {
                end = self.duration;
                start = (end - width).max(0.0);
            }
            self.start_time = start;
            self.end_time = end;
            return;
        }

        // Only the start moves; the end stays where the user left it.
        self.start_time = new_start
            .min(self.end_time - MIN_TRIM_WINDOW)
            .max(0.0);
        if self.window() > self.max_window {
            self.start_time = self.end_time - self.max_window;
        }
    }

    /// Moves the window's end, with the same sliding-window behavior as
    /// `set_start_time`.
    pub fn set_end_time(&mut self, new_end: f64) {
        let new_end = clamp_time(new_end, self.duration);
        if self.at_max_window() {
            let width = self.window();
            let mut end = new_end;
            let mut start = end - width;
            if start < 0.0 {
                start = 0.0;
                end = (start + width).min(self.duration);
            }
            self.start_time = start;
            self.end_time = end;
            return;
        }

        // Symmetric: only the end moves.
        self.end_time = new_end
            .max(self.start_time + MIN_TRIM_WINDOW)
            .min(self.duration);
        if self.window() > self.max_window {
            self.end_time = self.start_time + self.max_window;
        }
    }
}

fn clamp_time(t: f64, duration: f64) -> f64 {
    if t.is_finite() { t.clamp(0.0, duration) } else { 0.0 }
}

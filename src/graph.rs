use crate::error::{SmudgeError, SmudgeResult};
use crate::trim::VideoClip;

/// Multi-clip compositing layouts. Each layout is a fixed grid; the grid shape
/// is the only thing that varies between them, so one shared cell expression
/// plus a stack operator covers all five.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    Single,
    SideBySide,
    TriptychHorizontal,
    TriptychVertical,
    Grid2x2,
}

impl Layout {
    pub fn required_clips(&self) -> usize {
        let (cols, rows) = self.grid();
        cols * rows
    }

    /// (columns, rows) of the cell grid.
    fn grid(&self) -> (usize, usize) {
        match self {
            Layout::Single => (1, 1),
            Layout::SideBySide => (2, 1),
            Layout::TriptychHorizontal => (3, 1),
            Layout::TriptychVertical => (1, 3),
            Layout::Grid2x2 => (2, 2),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Layout::Single => "single",
            Layout::SideBySide => "side by side",
            Layout::TriptychHorizontal => "horizontal triptych",
            Layout::TriptychVertical => "vertical triptych",
            Layout::Grid2x2 => "2x2 grid",
        }
    }

    /// The stack filter joining the cell outputs, or `None` for a single cell.
    fn stack_filter(&self) -> Option<&'static str> {
        match self.grid() {
            (1, 1) => None,
            (2, 1) => Some("hstack=inputs=2"),
            (3, 1) => Some("hstack=inputs=3"),
            (1, 3) => Some("vstack=inputs=3"),
            _ => Some("xstack=inputs=4:layout=0_0|w0_0|0_h0|w0_h0"),
        }
    }
}

/// Target geometry for one filter-graph build.
#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize)]
pub struct GraphConfig {
    pub layout: Layout,
    pub fps: u32,
    pub width: u32,
    pub height: u32,
}

impl GraphConfig {
    fn validate(&self, clips: &[VideoClip]) -> SmudgeResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(SmudgeError::missing_dimensions(format!(
                "target is {}x{}",
                self.width, self.height
            )));
        }
        if self.fps == 0 {
            return Err(SmudgeError::validation("fps must be non-zero"));
        }
        let required = self.layout.required_clips();
        if clips.len() != required {
            return Err(SmudgeError::unsupported_layout(format!(
                "{} needs exactly {} clips, got {}",
                self.layout.name(),
                required,
                clips.len()
            )));
        }
        Ok(())
    }

    fn cell_size(&self) -> (u32, u32) {
        let (cols, rows) = self.layout.grid();
        (self.width / cols as u32, self.height / rows as u32)
    }
}

/// First pass of the two-pass palette pipeline: the shared clip/stack chain
/// ending in `palettegen`. Fails fast on bad preconditions so no external
/// ffmpeg process is ever spawned for an invalid graph.
pub fn build_palettegen_graph(cfg: &GraphConfig, clips: &[VideoClip]) -> SmudgeResult<String> {
    let (mut graph, label) = build_stacked_chain(cfg, clips)?;
    graph.push_str(&format!(
        "[{label}]fps={fps},scale={w}:{h}:flags=lanczos,palettegen=stats_mode=diff[palette]",
        fps = cfg.fps,
        w = cfg.width,
        h = cfg.height,
    ));
    Ok(graph)
}

/// Second pass: same chain, ending in `paletteuse` against the palette input
/// (which follows the clip inputs, so its index equals the clip count).
pub fn build_paletteuse_graph(cfg: &GraphConfig, clips: &[VideoClip]) -> SmudgeResult<String> {
    let (mut graph, label) = build_stacked_chain(cfg, clips)?;
    graph.push_str(&format!(
        "[{label}]fps={fps},scale={w}:{h}:flags=lanczos[scaled];\
         [scaled][{palette}:v]paletteuse=dither=bayer:bayer_scale=5:diff_mode=rectangle[out]",
        fps = cfg.fps,
        w = cfg.width,
        h = cfg.height,
        palette = clips.len(),
    ));
    Ok(graph)
}

/// Per-clip cell chains plus the layout's stack operator. Returns the partial
/// graph and the label its tail should read from.
fn build_stacked_chain(
    cfg: &GraphConfig,
    clips: &[VideoClip],
) -> SmudgeResult<(String, String)> {
    cfg.validate(clips)?;

    let (cell_w, cell_h) = cfg.cell_size();
    let mut graph = String::new();
    for (i, clip) in clips.iter().enumerate() {
        graph.push_str(&cell_expression(i, clip, cell_w, cell_h));
        graph.push(';');
    }

    let label = match cfg.layout.stack_filter() {
        None => "cell0".to_string(),
        Some(stack) => {
            for i in 0..clips.len() {
                graph.push_str(&format!("[cell{i}]"));
            }
            graph.push_str(&format!("{stack}[stacked];"));
            "stacked".to_string()
        }
    };
    Ok((graph, label))
}

/// One clip's chain: trim to its window, reset timestamps, scale to cover the
/// cell (honoring the clip's own scale factor), then a centered crop shifted
/// by the clip's pixel offsets.
fn cell_expression(index: usize, clip: &VideoClip, cell_w: u32, cell_h: u32) -> String {
    let scale = clip.scale.max(1.0);
    let scaled_w = ((f64::from(cell_w)) * scale).round() as u32;
    let scaled_h = ((f64::from(cell_h)) * scale).round() as u32;
    format!(
        "[{index}:v]trim=start={start:.3}:end={end:.3},setpts=PTS-STARTPTS,\
         scale={sw}:{sh}:force_original_aspect_ratio=increase,\
         crop={cw}:{ch}:(iw-{cw})/2+{dx:.0}:(ih-{ch})/2+{dy:.0}[cell{index}]",
        start = clip.start_time,
        end = clip.end_time,
        sw = scaled_w,
        sh = scaled_h,
        cw = cell_w,
        ch = cell_h,
        dx = clip.position_x,
        dy = clip.position_y,
    )
}

#![forbid(unsafe_code)]

pub mod cancel;
pub mod error;
pub mod extract;
pub mod frame;
pub mod graph;
pub mod kernels;
pub mod mask;
pub mod process;
pub mod reconstruct;
pub mod session;
pub mod trim;

pub use cancel::CancelToken;
pub use error::{SmudgeError, SmudgeResult};
pub use extract::{Compositor, extract_frames};
pub use frame::{Disposal, FrameMeta, FrameRegion, FrameRgba, GifMetadata};
pub use graph::{GraphConfig, Layout, build_palettegen_graph, build_paletteuse_graph};
pub use kernels::{BlurSettings, BlurStyle};
pub use mask::MaskCanvas;
pub use process::{apply_masked_blur, process_all};
pub use reconstruct::reconstruct_gif;
pub use session::EditSession;
pub use trim::{MIN_TRIM_WINDOW, VideoClip};

pub mod error;
pub mod ffmpeg;
pub mod preview;
pub mod segments;

pub use error::{Precondition, PreviewError};
pub use ffmpeg::{OverwritePolicy, PreviewOptions};
pub use preview::{
    PreparedPreview, PreviewOutcome, PreviewRequest, PreviewStrategy, Previewer, StrategyKind,
    check_system_dependencies, create_preview, create_preview_async,
};
pub use segments::{Segment, SegmentPlan, plan_segments};

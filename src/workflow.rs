mod error;
mod execute;
mod io;
mod report;
mod setup;
mod spec;

#[cfg(test)]
mod tests;

pub use error::{Result, SessionError};
pub use execute::{run_session, summarize_segmentations};
pub use io::{load_session, save_report};
pub use report::{SegmentationSummary, SessionReport, StepReport};
pub use setup::build_context;
pub use spec::{CommandInvocation, DisplaySetSpec, SegmentationSpec, SessionSpec};

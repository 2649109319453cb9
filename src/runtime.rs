mod command_service;
mod context;
mod data_source;
mod display_set_service;
mod download;
mod error;
mod metadata_store;
mod prompt;
mod screen_capture;
mod segmentation_service;
mod sync;
mod tool_group_service;
mod viewport_service;


pub use command_service::CommandService;
pub use context::AppContext;
pub use data_source::{
    DataSource, DataSourceConfig, DicomWebDataSource, LocalDataSource, build_data_source,
};
pub use display_set_service::{DisplaySetService, InMemoryDisplaySets};
pub use download::{DirectoryDownloads, DownloadSink};
pub use error::{Result, ServiceError};
pub use metadata_store::{InMemoryMetadataStore, InstanceRecord, MetadataStore};
pub use prompt::{
    PromptAction, PromptRequest, PromptResult, ReportPrompt, ScriptedPrompt, StdinPrompt,
};
pub use screen_capture::{RenderedCapture, ScreenCapture};
pub use segmentation_service::{InMemorySegmentationService, SegmentationService};
pub use tool_group_service::{InMemoryToolGroups, ToolGroupService};
pub use viewport_service::{InMemoryViewportGrid, ViewportGridService};

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;

use crate::commands::{self, CommandOutput};
use crate::config::ViewerConfig;

use super::{
    CommandService, DataSource, DirectoryDownloads, DisplaySetService, DownloadSink,
    InMemoryDisplaySets, InMemoryMetadataStore, InMemorySegmentationService, InMemoryToolGroups,
    InMemoryViewportGrid, MetadataStore, RenderedCapture, ReportPrompt, Result, ScreenCapture,
    ScriptedPrompt, SegmentationService, ServiceError, ToolGroupService, ViewportGridService,
    build_data_source,
};

/// The services every command runs against. Cloning shares the services.
#[derive(Clone)]
pub struct AppContext {
    config: ViewerConfig,
    segmentation_service: Arc<dyn SegmentationService>,
    viewport_grid_service: Arc<dyn ViewportGridService>,
    display_set_service: Arc<dyn DisplaySetService>,
    tool_group_service: Arc<dyn ToolGroupService>,
    metadata_store: Arc<dyn MetadataStore>,
    screen_capture: Arc<dyn ScreenCapture>,
    downloads: Arc<dyn DownloadSink>,
    report_prompt: Arc<dyn ReportPrompt>,
    data_sources: BTreeMap<String, Arc<dyn DataSource>>,
    command_service: CommandService,
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("AppContext")
            .field("config", &self.config)
            .field("data_sources", &self.data_sources.keys().collect::<Vec<_>>())
            .field("command_service", &self.command_service)
            .finish()
    }
}

impl Default for AppContext {
    fn default() -> Self {
        Self::new(ViewerConfig::default())
    }
}

impl AppContext {
    /// In-memory services, downloads into `config.output_dir`, data sources
    /// as configured, and a prompt that always saves.
    pub fn new(config: ViewerConfig) -> Self {
        let segmentation_service: Arc<dyn SegmentationService> =
            Arc::new(InMemorySegmentationService::new());
        let display_set_service: Arc<dyn DisplaySetService> = Arc::new(InMemoryDisplaySets::new());
        let screen_capture = Arc::new(RenderedCapture::new(
            Arc::clone(&display_set_service),
            Arc::clone(&segmentation_service),
        ));
        let data_sources = config
            .data_sources
            .iter()
            .map(|settings| (settings.name.clone(), build_data_source(settings)))
            .collect();
        Self {
            downloads: Arc::new(DirectoryDownloads::new(config.output_dir.clone())),
            config,
            segmentation_service,
            viewport_grid_service: Arc::new(InMemoryViewportGrid::new()),
            display_set_service,
            tool_group_service: Arc::new(InMemoryToolGroups::new()),
            metadata_store: Arc::new(InMemoryMetadataStore::new()),
            screen_capture,
            report_prompt: Arc::new(ScriptedPrompt::default()),
            data_sources,
            command_service: CommandService::default(),
        }
    }

    pub fn with_screen_capture(mut self, screen_capture: Arc<dyn ScreenCapture>) -> Self {
        self.screen_capture = screen_capture;
        self
    }

    pub fn with_downloads(mut self, downloads: Arc<dyn DownloadSink>) -> Self {
        self.downloads = downloads;
        self
    }

    pub fn with_report_prompt(mut self, report_prompt: Arc<dyn ReportPrompt>) -> Self {
        self.report_prompt = report_prompt;
        self
    }

    pub fn with_metadata_store(mut self, metadata_store: Arc<dyn MetadataStore>) -> Self {
        self.metadata_store = metadata_store;
        self
    }

    /// Registers `data_source` under the name its configuration reports.
    pub fn with_data_source(mut self, data_source: Arc<dyn DataSource>) -> Self {
        self.data_sources
            .insert(data_source.config().name, data_source);
        self
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn segmentation_service(&self) -> &dyn SegmentationService {
        self.segmentation_service.as_ref()
    }

    pub fn viewport_grid_service(&self) -> &dyn ViewportGridService {
        self.viewport_grid_service.as_ref()
    }

    pub fn display_set_service(&self) -> &dyn DisplaySetService {
        self.display_set_service.as_ref()
    }

    pub fn tool_group_service(&self) -> &dyn ToolGroupService {
        self.tool_group_service.as_ref()
    }

    pub fn metadata_store(&self) -> &dyn MetadataStore {
        self.metadata_store.as_ref()
    }

    pub fn screen_capture(&self) -> &dyn ScreenCapture {
        self.screen_capture.as_ref()
    }

    pub fn downloads(&self) -> &dyn DownloadSink {
        self.downloads.as_ref()
    }

    pub fn report_prompt(&self) -> &dyn ReportPrompt {
        self.report_prompt.as_ref()
    }

    pub fn command_service(&self) -> &CommandService {
        &self.command_service
    }

    pub fn data_source_names(&self) -> Vec<String> {
        self.data_sources.keys().cloned().collect()
    }

    /// Looks up `name`, falling back to the configured default and then to
    /// the only registered source.
    pub fn data_source(&self, name: Option<&str>) -> Result<Arc<dyn DataSource>> {
        let name = name
            .map(str::to_string)
            .or_else(|| self.config.default_data_source_name().map(str::to_string))
            .or_else(|| {
                (self.data_sources.len() == 1)
                    .then(|| self.data_sources.keys().next().cloned())
                    .flatten()
            })
            .ok_or_else(|| ServiceError::DataSourceNotFound("<default>".to_string()))?;
        self.data_sources
            .get(&name)
            .cloned()
            .ok_or(ServiceError::DataSourceNotFound(name))
    }

    pub fn execute_command(
        &self,
        command: &str,
        params: &Value,
    ) -> commands::Result<CommandOutput> {
        self.command_service.execute(self, command, params)
    }
}

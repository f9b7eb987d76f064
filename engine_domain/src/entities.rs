//! Entities: domain objects with identity and lifecycle.

mod execution_context;
mod folder_configuration;
mod pipeline;
mod pipeline_node;
mod processed_file_entry;

pub use execution_context::{ExecutionContext, ExecutionError, NodeMetrics};
pub use folder_configuration::{EdiFlags, FolderConfiguration, SourceConfig};
pub use pipeline::{Edge, Pipeline};
pub use pipeline_node::PipelineNode;
pub use processed_file_entry::ProcessedFileEntry;

//! # Pipeline Flow Domain
//!
//! The domain layer for the pipeline-flow engine: the pure business rules of
//! DAG execution and folder dispatch, independent of any I/O technology,
//! database, or CLI.
//!
//! ## Module Structure
//!
//! - [`error`] — the unified [`PipelineError`] taxonomy
//! - [`value_objects`] — immutable, self-validating identifiers and scalars
//!   (`NodeId`, `FolderId`, `Checksum`, `NodeType`, `Value`, `BackendKind`)
//! - [`entities`] — objects with identity and lifecycle (`Pipeline`,
//!   `PipelineNode`, `ExecutionContext`, `FolderConfiguration`,
//!   `ProcessedFileEntry`)
//! - [`services`] — stateless domain services and infrastructure ports
//!   (`RemoteFileSystem`, `ChecksumService`, `EdiValidator`, `SendBackend`)
//! - [`repositories`] — persistence abstractions (`ProcessedFileRepository`)
//!
//! ## Domain-Driven Design Concepts
//!
//! ### Entities
//! Entities carry identity through time. `Pipeline` and `FolderConfiguration`
//! are loaded once per run and treated as immutable snapshots; `ExecutionContext`
//! is the one entity that is genuinely mutated, once per run, by the executor.
//!
//! ### Value Objects
//! `NodeId`, `FolderId`, and `Checksum` are newtypes that validate their
//! invariants at construction so illegal states (an empty node id, a
//! non-hex checksum) are unrepresentable once constructed.
//!
//! ### Domain Services
//! `ChecksumService` and `EdiValidator` express pure or nearly-pure business
//! rules that don't belong to a single entity. `RemoteFileSystem` and
//! `SendBackend` are infrastructure *ports*: traits the domain defines and
//! the infrastructure layer implements, kept here because the domain is what
//! needs the abstraction.
//!
//! ### Repositories
//! `ProcessedFileRepository` hides the processed-file ledger's storage
//! technology behind a narrow, domain-shaped interface.

pub mod entities;
pub mod error;
pub mod repositories;
pub mod services;
pub mod value_objects;

pub use entities::{
    ExecutionContext, FolderConfiguration, Pipeline, PipelineNode, ProcessedFileEntry,
};
pub use error::PipelineError;
pub use value_objects::{BackendKind, Checksum, FolderId, NodeId, NodeType, Record, Value};

// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

// Production code safety enforced via CI and `make lint-strict`
// (lib/bins checked separately from tests - tests may use unwrap/expect)

//! # Pipeline Flow
//!
//! Application and infrastructure layers for the batch file-processing
//! pipeline engine. The domain layer ([`pipeline_flow_domain`]) defines the
//! pipeline description, the node-output map, and the service/repository
//! ports; this crate wires concrete implementations behind those ports and
//! drives the two top-level use cases:
//!
//! - Running a single pipeline end to end (DAG validation, topological
//!   execution, per-node retry) - [`application::use_cases::run_pipeline`].
//! - Dispatching every configured source folder (hash, dedup, EDI, send) -
//!   [`application::use_cases::run_dispatch`].
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │         Application Layer           │
//! │  use_cases / services / utilities   │
//! └─────────────────┬───────────────────┘
//! ┌─────────────────┴───────────────────┐
//! │            Domain Layer             │
//! │  entities / value_objects / ports   │
//! └─────────────────┬───────────────────┘
//! ┌─────────────────┴───────────────────┐
//! │       Infrastructure Layer          │
//! │  remote_fs / adapters / repos       │
//! └─────────────────────────────────────┘
//! ```

pub mod application;
pub mod infrastructure;

pub use pipeline_flow_domain::{
    BackendKind, Checksum, ExecutionContext, FolderConfiguration, FolderId, NodeId, NodeType, Pipeline,
    PipelineError, PipelineNode, ProcessedFileEntry, Record, Value,
};

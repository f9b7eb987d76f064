//! Concrete [`ProcessedFileRepository`](pipeline_flow_domain::repositories::ProcessedFileRepository)
//! implementation (C2, §4.2, §6).

pub mod sqlite_ledger_repository;

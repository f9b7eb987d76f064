//! Concrete [`SendBackend`](pipeline_flow_domain::services::SendBackend)
//! implementations (§4.5): `copy`, `ftp`, `email`, and a `mock` used outside
//! `#[cfg(test)]` wiring (e.g. dry-run CLI invocations, §6).

pub mod copy_backend;
pub mod email_backend;
pub mod ftp_backend;
pub mod mock_backend;

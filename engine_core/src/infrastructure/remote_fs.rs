//! Concrete [`RemoteFileSystem`](pipeline_flow_domain::services::RemoteFileSystem)
//! implementations, one per protocol named in a folder's `SourceConfig`
//! (§4.1), plus a [`factory`] tying a protocol name and its connection
//! parameters to the right one.

pub mod factory;
pub mod ftp;
pub mod local;
pub mod sftp;
pub mod smb;

//! Infrastructure: concrete adapters behind the domain's service ports
//! (C1 remote filesystems, C5 send backends, C2 ledger) plus the ambient
//! config/logging stack (§10).

pub mod adapters;
pub mod config;
pub mod logging;
pub mod remote_fs;
pub mod repositories;

pub mod run_dispatch;
pub mod run_pipeline;

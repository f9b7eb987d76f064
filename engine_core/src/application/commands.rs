use std::path::PathBuf;

/// Parameters for a single pipeline run (§6).
#[derive(Debug, Clone)]
pub struct RunPipelineCommand {
    pub pipeline_path: PathBuf,
    pub input_path: PathBuf,
    pub output_path: PathBuf,
}

/// Parameters for a dispatch run over a folder-configuration set (§6).
#[derive(Debug, Clone)]
pub struct RunDispatchCommand {
    pub folders_path: PathBuf,
    pub force_edi_validation: bool,
}

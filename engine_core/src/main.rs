//! Process entry point: parses and validates CLI arguments, wires the
//! ambient stack (config, logging, ledger), constructs the deps each use
//! case needs, runs the selected one, and maps the outcome to a process
//! exit code (§6, §10).

use std::sync::Arc;

use pipeline_flow_bootstrap::{bootstrap_cli, result_to_exit_code, ValidatedCommand};
use pipeline_flow_domain::entities::FolderConfiguration;
use pipeline_flow_domain::repositories::ProcessedFileRepository;
use pipeline_flow_domain::PipelineError;

use pipeline_flow::application::commands::{RunDispatchCommand, RunPipelineCommand};
use pipeline_flow::application::services::node_handlers::NodeDeps;
use pipeline_flow::application::services::send_manager::SendManager;
use pipeline_flow::application::use_cases::run_dispatch::run_dispatch;
use pipeline_flow::application::use_cases::run_pipeline::run_pipeline;
use pipeline_flow::infrastructure::adapters::copy_backend::CopyBackend;
use pipeline_flow::infrastructure::adapters::email_backend::EmailBackend;
use pipeline_flow::infrastructure::adapters::ftp_backend::FtpBackend;
use pipeline_flow::infrastructure::config::{load_config, EngineConfig, LogFormat};
use pipeline_flow::infrastructure::logging::init_logging;
use pipeline_flow::infrastructure::remote_fs::factory::remote_fs_factory;
use pipeline_flow::infrastructure::repositories::sqlite_ledger_repository::SqliteLedgerRepository;

#[tokio::main]
async fn main() {
    let validated_cli = match bootstrap_cli() {
        Ok(cli) => cli,
        Err(error) => {
            eprintln!("CLI error: {error}");
            std::process::exit(2);
        }
    };

    let config_path = validated_cli.config.as_ref().map(|p| p.to_string_lossy().into_owned());
    let mut config = load_config(config_path.as_deref()).unwrap_or_else(|error| {
        eprintln!("configuration error: {error}");
        std::process::exit(2);
    });

    if let Some(format) = validated_cli.log_format {
        config.log_format = match format {
            pipeline_flow_bootstrap::cli::LogFormatArg::Pretty => LogFormat::Pretty,
            pipeline_flow_bootstrap::cli::LogFormatArg::Json => LogFormat::Json,
        };
    }
    if validated_cli.quiet {
        config.log_level = "error".to_string();
    } else {
        config.log_level = bump_log_level(&config.log_level, validated_cli.verbose);
    }

    init_logging(&config.log_level, &config.log_format);

    let shutdown = pipeline_flow_bootstrap::shutdown::ShutdownCoordinator::default();
    pipeline_flow_bootstrap::signals::install_signal_handlers(shutdown.clone());

    let result: Result<(), PipelineError> = match validated_cli.command {
        ValidatedCommand::Run { pipeline, input, output } => run(pipeline, input, output).await,
        ValidatedCommand::Dispatch { folders, force_edi_validation } => dispatch(folders, force_edi_validation, &config).await,
    };

    if let Err(error) = &result {
        tracing::error!(error = %error, "run failed");
    }
    std::process::exit(result_to_exit_code(&result).as_i32());
}

fn bump_log_level(base: &str, verbose: u8) -> String {
    match verbose {
        0 => base.to_string(),
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    }
}

async fn run(pipeline: std::path::PathBuf, input: std::path::PathBuf, output: std::path::PathBuf) -> Result<(), PipelineError> {
    let command = RunPipelineCommand {
        pipeline_path: pipeline,
        input_path: input,
        output_path: output,
    };
    let deps = NodeDeps::new(remote_fs_factory());
    let report = run_pipeline(&command, deps).await?;

    tracing::info!(nodes_run = report.nodes_run, errors = report.errors.len(), duration = ?report.total_duration, "run complete");
    if !report.success {
        return Err(PipelineError::handler_failed(format!("{} of {} nodes reported an error", report.errors.len(), report.nodes_run)));
    }
    Ok(())
}

async fn dispatch(folders_path: std::path::PathBuf, force_edi_validation: bool, config: &EngineConfig) -> Result<(), PipelineError> {
    let command = RunDispatchCommand {
        folders_path: folders_path.clone(),
        force_edi_validation,
    };

    let source = tokio::fs::read_to_string(&folders_path).await?;
    let folders: Vec<FolderConfiguration> = serde_json::from_str(&source)?;

    let ledger: Arc<dyn ProcessedFileRepository> = Arc::new(SqliteLedgerRepository::connect(&config.ledger_url).await?);

    let mut backends: Vec<Arc<dyn pipeline_flow_domain::services::SendBackend>> = vec![Arc::new(CopyBackend), Arc::new(FtpBackend)];
    if !config.smtp_relay_host.is_empty() {
        let email = EmailBackend::new(&config.smtp_relay_host, config.smtp_username.clone(), config.smtp_password.clone(), config.smtp_from_address.clone())?;
        backends.push(Arc::new(email));
    }
    let send_manager = SendManager::new(backends);

    let factory = remote_fs_factory();
    let summary = run_dispatch(&command, &folders, &factory, &ledger, &send_manager, force_edi_validation).await;

    tracing::info!(
        folders_processed = summary.folders_processed,
        files_processed = summary.files_processed,
        files_failed = summary.files_failed,
        folders_unreachable = summary.folders_unreachable,
        "dispatch complete"
    );
    for error in &summary.errors {
        tracing::warn!(file = %error.file_name, message = %error.message, "dispatch error");
    }

    if summary.folders_unreachable > 0 {
        return Err(PipelineError::io_error("one or more configured folders were unreachable"));
    }
    Ok(())
}

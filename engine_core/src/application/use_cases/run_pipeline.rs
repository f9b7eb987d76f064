//! Pipeline executor (C8, §4's "Data flow" + §5 scheduling model): loads,
//! validates, and runs a single pipeline end to end.

use std::time::Instant;

use pipeline_flow_domain::{entities::ExecutionError, ExecutionContext, Pipeline, PipelineError};

use crate::application::commands::RunPipelineCommand;
use crate::application::services::node_handlers::{execute_node, NodeDeps};

/// Outcome of one pipeline run. `success` iff the context recorded zero
/// errors across every node - a handler-internal per-record error does not
/// flip this to `false` (§7's "handler-internal per-record errors are
/// accumulated and returned alongside success"), only a fatal handler
/// failure that stops the run does.
#[derive(Debug)]
pub struct RunPipelineReport {
    pub success: bool,
    pub errors: Vec<ExecutionError>,
    pub nodes_run: usize,
    pub total_duration: std::time::Duration,
}

/// Loads the pipeline description from `command.pipeline_path`, validates
/// the DAG (C7), then walks nodes in topological order invoking
/// [`execute_node`] for each, timing every node and checking the
/// cancellation flag before starting the next one (§5). A handler that
/// returns `Err` stops the run immediately and is surfaced to the caller;
/// per-record errors recorded on the context do not.
pub async fn run_pipeline(command: &RunPipelineCommand, deps: NodeDeps) -> Result<RunPipelineReport, PipelineError> {
    let source = tokio::fs::read_to_string(&command.pipeline_path).await?;
    let pipeline = Pipeline::parse(&source)?;
    pipeline.validate()?;

    let deps = deps.with_paths(command.input_path.clone(), command.output_path.clone());
    let order = pipeline.execution_order();
    let mut ctx = ExecutionContext::new();

    for node_id in &order {
        if ctx.is_cancelled() {
            tracing::info!(node_id = %node_id, "run cancelled, stopping before next node");
            break;
        }
        let node = pipeline
            .get(node_id)
            .expect("execution_order only yields ids present in the pipeline");

        ctx.increment_attempts(node_id);
        let span = tracing::info_span!("node", id = %node_id, r#type = ?node.node_type);
        let _enter = span.enter();

        let started = Instant::now();
        let result = execute_node(node, &pipeline, &mut ctx, &deps).await;
        ctx.record_node_timing(node_id.clone(), started.elapsed());

        if let Err(error) = result {
            tracing::error!(node_id = %node_id, error = %error, "node handler failed");
            return Ok(RunPipelineReport {
                success: false,
                errors: {
                    let mut errors: Vec<ExecutionError> = ctx.errors().to_vec();
                    errors.push(ExecutionError::new(Some(node_id.clone()), error.to_string(), error.category()));
                    errors
                },
                nodes_run: ctx.node_count(),
                total_duration: ctx.total_duration(),
            });
        }
    }

    Ok(RunPipelineReport {
        success: !ctx.has_errors(),
        errors: ctx.errors().to_vec(),
        nodes_run: ctx.node_count(),
        total_duration: ctx.total_duration(),
    })
}

//! `delay`, `cache` - the control role group (§4.8).

use std::time::Duration;

use pipeline_flow_domain::{ExecutionContext, Pipeline, PipelineError, PipelineNode};

use super::{upstream_value, NodeDeps};

/// Sleeps for a configured duration; passes input through unchanged. A
/// genuine suspension of the executor for that interval (§5).
pub async fn delay(node: &PipelineNode, pipeline: &Pipeline, ctx: &mut ExecutionContext) -> Result<(), PipelineError> {
    let value = upstream_value(&node.id, pipeline, ctx).clone();
    let millis = node.config_f64("duration_ms").unwrap_or(0.0).max(0.0) as u64;
    tokio::time::sleep(Duration::from_millis(millis)).await;
    ctx.publish(node.id.clone(), value);
    Ok(())
}

/// Stores the upstream input under `cache_key` in `deps.cache` for the
/// remainder of the run and republishes it unchanged, so a later node can
/// reference the cached value via `cache_key` instead of a direct edge
/// when the graph shape makes a direct edge awkward. A thin alias over the
/// node output map, not a second storage tier.
pub fn cache(node: &PipelineNode, pipeline: &Pipeline, ctx: &mut ExecutionContext, deps: &NodeDeps) -> Result<(), PipelineError> {
    let value = upstream_value(&node.id, pipeline, ctx).clone();
    let key = node
        .config_str("cache_key")
        .ok_or_else(|| PipelineError::invalid_config(format!("cache node {} missing \"cache_key\"", node.id)))?;
    deps.cache.lock().unwrap().insert(key.to_string(), value.clone());
    ctx.publish(node.id.clone(), value);
    Ok(())
}

//! `start`, `end`, `trigger` - structural markers with no transformation
//! semantics of their own (§4.8 "Structural" role group).

use pipeline_flow_domain::{ExecutionContext, Pipeline, PipelineError, PipelineNode, Value};

use super::upstream_value;

/// The graph's single entry point. Carries no upstream; publishes the
/// context's current-data (empty at run start) so a directly-following
/// node has something to read via an edge.
pub fn start(node: &PipelineNode, ctx: &mut ExecutionContext) -> Result<(), PipelineError> {
    ctx.publish(node.id.clone(), ctx.current_data.clone());
    Ok(())
}

/// A schedule/webhook marker in the source system; here it behaves exactly
/// like `start` since triggering is an external concern outside this run.
pub fn trigger(node: &PipelineNode, ctx: &mut ExecutionContext) -> Result<(), PipelineError> {
    ctx.publish(node.id.clone(), ctx.current_data.clone());
    Ok(())
}

/// A termination marker. Passes its upstream value through unchanged so a
/// graph with multiple `end` nodes (one per branch) still has a well-defined
/// output at each.
pub fn end(node: &PipelineNode, pipeline: &Pipeline, ctx: &mut ExecutionContext) -> Result<(), PipelineError> {
    let value: Value = upstream_value(&node.id, pipeline, ctx).clone();
    ctx.publish(node.id.clone(), value);
    Ok(())
}

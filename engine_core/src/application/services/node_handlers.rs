//! Node handler dispatch (C9, §4.8). One function per [`NodeType`] variant,
//! grouped into the role modules named in §4.8's table. The executor
//! ([`crate::application::use_cases::run_pipeline`]) calls [`execute_node`]
//! once per node in topological order.

pub mod control;
pub mod deps;
pub mod external;
pub mod io_nodes;
pub mod join_aggregate;
pub mod quality;
pub mod row_shape;
pub mod structural;
pub mod text_date;

pub use deps::NodeDeps;

use pipeline_flow_domain::{ExecutionContext, NodeId, NodeType, Pipeline, PipelineError, PipelineNode, Value};

/// Dispatches `node` to its handler, per the closed tagged-variant switch
/// the node-type enum replaces the source's string dispatch table with.
pub async fn execute_node(node: &PipelineNode, pipeline: &Pipeline, ctx: &mut ExecutionContext, deps: &NodeDeps) -> Result<(), PipelineError> {
    match node.node_type {
        NodeType::Start => structural::start(node, ctx),
        NodeType::End => structural::end(node, pipeline, ctx),
        NodeType::Trigger => structural::trigger(node, ctx),

        NodeType::FolderSource => io_nodes::folder_source(node, ctx, deps).await,
        NodeType::Output => io_nodes::output(node, pipeline, ctx, deps).await,
        NodeType::ReadJson => io_nodes::read_json(node, ctx).await,
        NodeType::WriteJson => io_nodes::write_json(node, pipeline, ctx).await,
        NodeType::ReadExcel => io_nodes::read_excel(node, ctx).await,
        NodeType::WriteExcel => io_nodes::write_excel(node, pipeline, ctx).await,

        NodeType::Remapper => row_shape::remapper(node, pipeline, ctx),
        NodeType::Extract => row_shape::remapper(node, pipeline, ctx),
        NodeType::Transform => row_shape::transform(node, pipeline, ctx),
        NodeType::Filter => row_shape::filter(node, pipeline, ctx),
        NodeType::Router => row_shape::router(node, pipeline, ctx),
        NodeType::Sort => row_shape::sort(node, pipeline, ctx),
        NodeType::Dedupe => row_shape::dedupe(node, pipeline, ctx),
        NodeType::Union => row_shape::union(node, pipeline, ctx),
        NodeType::Pivot => row_shape::pivot(node, pipeline, ctx),
        NodeType::Unpivot => row_shape::unpivot(node, pipeline, ctx),

        NodeType::Join => join_aggregate::join(node, ctx),
        NodeType::Aggregate => join_aggregate::aggregate(node, pipeline, ctx),
        NodeType::LookupTable => join_aggregate::lookup_table(node, pipeline, ctx),

        NodeType::Validate => quality::validate(node, pipeline, ctx),
        NodeType::Profile => quality::profile(node, pipeline, ctx),
        NodeType::Impute => quality::impute(node, pipeline, ctx),
        NodeType::Normalize => quality::normalize(node, pipeline, ctx),
        NodeType::Outlier => quality::outlier(node, pipeline, ctx),

        NodeType::Text => text_date::text(node, pipeline, ctx),
        NodeType::Date => text_date::date(node, pipeline, ctx),

        NodeType::ApiEnrich => external::api_enrich(node, pipeline, ctx, deps).await,
        NodeType::Query => external::query(node, pipeline, ctx),

        NodeType::Delay => control::delay(node, pipeline, ctx).await,
        NodeType::Cache => control::cache(node, pipeline, ctx, deps),
    }
}

/// The "upstream accessor" (§4.8): the value a handler should read as its
/// input. Finds the first incoming edge whose source-id has already
/// published into the node output map; falls back to the context's
/// current-data field (empty at run start) when there is none.
pub fn upstream_value<'a>(node_id: &NodeId, pipeline: &Pipeline, ctx: &'a ExecutionContext) -> &'a Value {
    for edge in pipeline.incoming_edges(node_id) {
        if let Some(value) = ctx.output_of(&edge.source) {
            return value;
        }
    }
    &ctx.current_data
}

/// Looks up a specific upstream node's output by id, for handlers (`join`,
/// `lookupTable`, `cache`) that identify their source explicitly in config
/// rather than by edge discovery order (§9).
pub fn named_upstream<'a>(source_id: &NodeId, ctx: &'a ExecutionContext) -> Option<&'a Value> {
    ctx.output_of(source_id)
}

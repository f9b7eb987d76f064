//! `apiEnrich`, `query` - the external role group (§4.8).

use pipeline_flow_domain::{ExecutionContext, Pipeline, PipelineError, PipelineNode, Record, Value};
use serde_json::Value as Json;

use crate::application::utilities::expression::CompiledExpression;

use super::{upstream_value, NodeDeps};

/// Per-record HTTP call (GET or POST). Non-200 responses and network
/// errors leave the record unenriched and append to the context error
/// list, but do not fail the pipeline.
pub async fn api_enrich(node: &PipelineNode, pipeline: &Pipeline, ctx: &mut ExecutionContext, deps: &NodeDeps) -> Result<(), PipelineError> {
    let records = upstream_value(&node.id, pipeline, ctx).clone().into_records();

    let url = node
        .config_str("url")
        .ok_or_else(|| PipelineError::invalid_config(format!("apiEnrich node {} missing \"url\"", node.id)))?;
    let method = node.config_str("method").unwrap_or("GET").to_ascii_uppercase();
    let response_field = node.config_str("response_field").unwrap_or("_enrichment").to_string();

    let mut output = Vec::with_capacity(records.len());
    for mut record in records {
        let request = if method == "POST" {
            deps.http_client.post(url).json(&Json::Object(record.clone().into_iter().collect()))
        } else {
            deps.http_client.get(url)
        };

        match request.send().await {
            Ok(response) if response.status().is_success() => match response.json::<Json>().await {
                Ok(body) => {
                    record.insert(response_field.clone(), body);
                }
                Err(error) => ctx.record_error(pipeline_flow_domain::entities::ExecutionError::new(
                    Some(node.id.clone()),
                    format!("apiEnrich response body: {error}"),
                    "api_error",
                )),
            },
            Ok(response) => ctx.record_error(pipeline_flow_domain::entities::ExecutionError::new(
                Some(node.id.clone()),
                format!("apiEnrich non-200 response: {}", response.status()),
                "api_error",
            )),
            Err(error) => ctx.record_error(pipeline_flow_domain::entities::ExecutionError::new(
                Some(node.id.clone()),
                format!("apiEnrich request failed: {error}"),
                "api_error",
            )),
        }
        output.push(record);
    }

    ctx.publish(node.id.clone(), Value::Records(output));
    Ok(())
}

/// Same sandboxed expression language as `transform`, evaluated once per
/// record as a row predicate to select a subset; errors are recorded on
/// the structured error list only (§9).
pub fn query(node: &PipelineNode, pipeline: &Pipeline, ctx: &mut ExecutionContext) -> Result<(), PipelineError> {
    let records = upstream_value(&node.id, pipeline, ctx).clone().into_records();

    let source = node
        .config_str("expression")
        .ok_or_else(|| PipelineError::invalid_config(format!("query node {} missing \"expression\"", node.id)))?;
    let compiled = CompiledExpression::compile(source)?;

    let mut output: Vec<Record> = Vec::with_capacity(records.len());
    for record in records {
        match compiled.eval_bool(&record) {
            Ok(true) => output.push(record),
            Ok(false) => {}
            Err(error) => ctx.record_error(pipeline_flow_domain::entities::ExecutionError::new(Some(node.id.clone()), error.to_string(), "expression_error")),
        }
    }

    ctx.publish(node.id.clone(), Value::Records(output));
    Ok(())
}

//! `join`, `aggregate`, `lookupTable` - the join/aggregate role group (§4.8).

use std::collections::BTreeMap;

use pipeline_flow_domain::{ExecutionContext, NodeId, Pipeline, PipelineError, PipelineNode, Record, Value};
use serde_json::Value as Json;

use super::{named_upstream, upstream_value};

fn required_source_id(node: &PipelineNode, key: &str) -> Result<NodeId, PipelineError> {
    let raw = node
        .config_str(key)
        .ok_or_else(|| PipelineError::invalid_config(format!("{:?} node {} missing \"{}\"", node.node_type, node.id, key)))?;
    NodeId::new(raw)
}

/// Inner or left join over two upstream nodes named explicitly by
/// `left_source_id`/`right_source_id`, keyed by `[{left, right}]` field
/// pairs under `AND` semantics. Columns are optionally prefixed with
/// `left_prefix`/`right_prefix`. On a left-join miss, right-side columns are
/// emitted as null using the first right record as the column template.
pub fn join(node: &PipelineNode, ctx: &mut ExecutionContext) -> Result<(), PipelineError> {
    let left_id = required_source_id(node, "left_source_id")?;
    let right_id = required_source_id(node, "right_source_id")?;

    let left = named_upstream(&left_id, ctx)
        .ok_or_else(|| PipelineError::handler_failed(format!("{}: left_source_id has not produced output yet", node.id)))?
        .clone()
        .into_records();
    let right = named_upstream(&right_id, ctx)
        .ok_or_else(|| PipelineError::handler_failed(format!("{}: right_source_id has not produced output yet", node.id)))?
        .clone()
        .into_records();

    let keys: Vec<(String, String)> = match node.config.get("keys") {
        Some(Json::Array(pairs)) => pairs
            .iter()
            .filter_map(|p| {
                let left = p.get("left")?.as_str()?.to_string();
                let right = p.get("right")?.as_str()?.to_string();
                Some((left, right))
            })
            .collect(),
        _ => Vec::new(),
    };
    let join_type = node.config_str("join_type").unwrap_or("inner");
    let left_prefix = node.config_str("left_prefix").unwrap_or("");
    let right_prefix = node.config_str("right_prefix").unwrap_or("");

    let right_template: Record = right.first().cloned().unwrap_or_default();

    let matches = |l: &Record, r: &Record| keys.iter().all(|(lk, rk)| l.get(lk) == r.get(rk));

    let prefixed = |prefix: &str, record: &Record, out: &mut Record| {
        for (k, v) in record {
            let key = if prefix.is_empty() { k.clone() } else { format!("{prefix}{k}") };
            out.insert(key, v.clone());
        }
    };

    let mut output = Vec::new();
    for l in &left {
        let mut found = false;
        for r in &right {
            if matches(l, r) {
                found = true;
                let mut row = Record::new();
                prefixed(left_prefix, l, &mut row);
                prefixed(right_prefix, r, &mut row);
                output.push(row);
            }
        }
        if !found && join_type == "left" {
            let mut row = Record::new();
            prefixed(left_prefix, l, &mut row);
            for k in right_template.keys() {
                let key = if right_prefix.is_empty() { k.clone() } else { format!("{right_prefix}{k}") };
                row.insert(key, Json::Null);
            }
            output.push(row);
        }
    }

    ctx.publish(node.id.clone(), Value::Records(output));
    Ok(())
}

#[derive(Clone, Copy)]
enum AggFn {
    Sum,
    Avg,
    Count,
    Min,
    Max,
}

impl AggFn {
    fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "SUM" => Some(Self::Sum),
            "AVG" => Some(Self::Avg),
            "COUNT" => Some(Self::Count),
            "MIN" => Some(Self::Min),
            "MAX" => Some(Self::Max),
            _ => None,
        }
    }
}

struct AggSpec {
    field: String,
    function: AggFn,
    alias: String,
}

/// Groups by zero or more fields; computes `SUM`/`AVG`/`COUNT`/`MIN`/`MAX`
/// per aggregation spec. Non-numeric values are skipped for numeric
/// aggregations; `COUNT` counts non-null values. Groups are emitted in
/// first-seen order.
pub fn aggregate(node: &PipelineNode, pipeline: &Pipeline, ctx: &mut ExecutionContext) -> Result<(), PipelineError> {
    let records = upstream_value(&node.id, pipeline, ctx).clone().into_records();

    let group_fields: Vec<String> = match node.config.get("group_by") {
        Some(Json::Array(fields)) => fields.iter().filter_map(|f| f.as_str().map(str::to_string)).collect(),
        _ => Vec::new(),
    };
    let specs: Vec<AggSpec> = match node.config.get("aggregations") {
        Some(Json::Array(specs)) => specs
            .iter()
            .filter_map(|s| {
                let field = s.get("field")?.as_str()?.to_string();
                let function = AggFn::parse(s.get("function")?.as_str()?)?;
                let alias = s.get("alias").and_then(Json::as_str).unwrap_or(&field).to_string();
                Some(AggSpec { field, function, alias })
            })
            .collect(),
        _ => Vec::new(),
    };

    let mut order: Vec<Vec<Json>> = Vec::new();
    let mut groups: BTreeMap<Vec<String>, Vec<&Record>> = BTreeMap::new();
    for record in &records {
        let key: Vec<String> = group_fields.iter().map(|f| json_display(record.get(f).unwrap_or(&Json::Null))).collect();
        if !groups.contains_key(&key) {
            order.push(group_fields.iter().map(|f| record.get(f).cloned().unwrap_or(Json::Null)).collect());
        }
        groups.entry(key).or_default().push(record);
    }

    let key_of = |values: &[Json]| -> Vec<String> { values.iter().map(json_display).collect() };

    let mut output = Vec::with_capacity(order.len());
    for values in &order {
        let key = key_of(values);
        let rows = &groups[&key];
        let mut row = Record::new();
        for (field, value) in group_fields.iter().zip(values) {
            row.insert(field.clone(), value.clone());
        }
        for spec in &specs {
            let numbers: Vec<f64> = rows.iter().filter_map(|r| r.get(&spec.field)).filter_map(Json::as_f64).collect();
            let non_null = rows.iter().filter(|r| !matches!(r.get(&spec.field), None | Some(Json::Null))).count();
            let value = match spec.function {
                AggFn::Sum => Json::from(numbers.iter().sum::<f64>()),
                AggFn::Avg => {
                    if numbers.is_empty() {
                        Json::Null
                    } else {
                        Json::from(numbers.iter().sum::<f64>() / numbers.len() as f64)
                    }
                }
                AggFn::Count => Json::from(non_null as u64),
                AggFn::Min => numbers.iter().cloned().fold(None, |acc: Option<f64>, n| Some(acc.map_or(n, |a| a.min(n)))).map(Json::from).unwrap_or(Json::Null),
                AggFn::Max => numbers.iter().cloned().fold(None, |acc: Option<f64>, n| Some(acc.map_or(n, |a| a.max(n)))).map(Json::from).unwrap_or(Json::Null),
            };
            row.insert(spec.alias.clone(), value);
        }
        output.push(row);
    }

    ctx.publish(node.id.clone(), Value::Records(output));
    Ok(())
}

fn json_display(value: &Json) -> String {
    match value {
        Json::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Enriches each upstream record by matching a configured key field against
/// an in-memory table (another upstream node's output, named by
/// `table_source_id`), copying configured `columns` from the first matching
/// table row. No match leaves the configured columns absent unless
/// `default_values` are configured.
pub fn lookup_table(node: &PipelineNode, pipeline: &Pipeline, ctx: &mut ExecutionContext) -> Result<(), PipelineError> {
    let table_id = required_source_id(node, "table_source_id")?;
    let table = named_upstream(&table_id, ctx)
        .ok_or_else(|| PipelineError::handler_failed(format!("{}: table_source_id has not produced output yet", node.id)))?
        .clone()
        .into_records();

    let key_field = node
        .config_str("key_field")
        .ok_or_else(|| PipelineError::invalid_config(format!("lookupTable node {} missing \"key_field\"", node.id)))?;
    let columns: Vec<String> = match node.config.get("columns") {
        Some(Json::Array(cols)) => cols.iter().filter_map(|c| c.as_str().map(str::to_string)).collect(),
        _ => Vec::new(),
    };
    let defaults: BTreeMap<String, Json> = match node.config.get("default_values") {
        Some(Json::Object(map)) => map.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
        _ => BTreeMap::new(),
    };

    let records = upstream_value(&node.id, pipeline, ctx).clone().into_records();
    let mut output = Vec::with_capacity(records.len());
    for mut record in records {
        let key = record.get(key_field).cloned();
        let matched = key.as_ref().and_then(|k| table.iter().find(|row| row.get(key_field) == Some(k)));
        for column in &columns {
            if let Some(row) = matched {
                if let Some(value) = row.get(column) {
                    record.insert(column.clone(), value.clone());
                    continue;
                }
            }
            if let Some(default) = defaults.get(column) {
                record.insert(column.clone(), default.clone());
            }
        }
        output.push(record);
    }

    ctx.publish(node.id.clone(), Value::Records(output));
    Ok(())
}

//! `remapper`, `extract`, `transform`, `filter`, `router`, `sort`, `dedupe`,
//! `union`, `pivot`, `unpivot` - the row-shape role group (§4.8).

use std::cmp::Ordering;
use std::collections::BTreeSet;

use pipeline_flow_domain::{ExecutionContext, NodeId, Pipeline, PipelineError, PipelineNode, Record, Value};
use serde_json::Value as Json;

use crate::application::utilities::expression::CompiledExpression;

use super::upstream_value;

#[derive(Clone, Copy, PartialEq)]
enum Logic {
    And,
    Or,
}

struct Condition {
    field: String,
    operator: String,
    value: Option<Json>,
}

fn parse_conditions(node: &PipelineNode) -> (Logic, Vec<Condition>) {
    let logic = match node.config_str("logic") {
        Some("OR") | Some("or") => Logic::Or,
        _ => Logic::And,
    };
    let conditions = match node.config.get("conditions") {
        Some(Json::Array(items)) => items
            .iter()
            .filter_map(|c| {
                let field = c.get("field")?.as_str()?.to_string();
                let operator = c.get("operator")?.as_str()?.to_string();
                let value = c.get("value").cloned();
                Some(Condition { field, operator, value })
            })
            .collect(),
        _ => Vec::new(),
    };
    (logic, conditions)
}

fn eval_condition(record: &Record, condition: &Condition) -> bool {
    let field_value = record.get(&condition.field);
    match condition.operator.as_str() {
        "is_null" => matches!(field_value, None | Some(Json::Null)),
        "is_not_null" => !matches!(field_value, None | Some(Json::Null)),
        "equals" => field_value == condition.value.as_ref(),
        "not_equals" => field_value != condition.value.as_ref(),
        "greater" => match (field_value.and_then(Json::as_f64), condition.value.as_ref().and_then(Json::as_f64)) {
            (Some(a), Some(b)) => a > b,
            _ => false,
        },
        "less" => match (field_value.and_then(Json::as_f64), condition.value.as_ref().and_then(Json::as_f64)) {
            (Some(a), Some(b)) => a < b,
            _ => false,
        },
        "contains" => match (field_value.and_then(Json::as_str), condition.value.as_ref().and_then(Json::as_str)) {
            (Some(haystack), Some(needle)) => haystack.contains(needle),
            _ => false,
        },
        _ => false,
    }
}

fn matches_predicate(record: &Record, logic: Logic, conditions: &[Condition]) -> bool {
    if conditions.is_empty() {
        return true;
    }
    match logic {
        Logic::And => conditions.iter().all(|c| eval_condition(record, c)),
        Logic::Or => conditions.iter().any(|c| eval_condition(record, c)),
    }
}

/// Splits records into two channels, `<id>_true` and `<id>_false`, per a
/// `{field, operator, value}` predicate list combined by `AND`/`OR`.
pub fn router(node: &PipelineNode, pipeline: &Pipeline, ctx: &mut ExecutionContext) -> Result<(), PipelineError> {
    let records = upstream_value(&node.id, pipeline, ctx).clone().into_records();
    let (logic, conditions) = parse_conditions(node);

    let mut matched = Vec::new();
    let mut unmatched = Vec::new();
    for record in records {
        if matches_predicate(&record, logic, &conditions) {
            matched.push(record);
        } else {
            unmatched.push(record);
        }
    }

    ctx.publish(node.id.true_channel(), Value::Records(matched));
    ctx.publish(node.id.false_channel(), Value::Records(unmatched));
    Ok(())
}

/// Same predicate language as `router`; keeps only matching records.
pub fn filter(node: &PipelineNode, pipeline: &Pipeline, ctx: &mut ExecutionContext) -> Result<(), PipelineError> {
    let records = upstream_value(&node.id, pipeline, ctx).clone().into_records();
    let (logic, conditions) = parse_conditions(node);
    let output: Vec<Record> = records.into_iter().filter(|r| matches_predicate(r, logic, &conditions)).collect();
    ctx.publish(node.id.clone(), Value::Records(output));
    Ok(())
}

fn apply_field_transform(value: Json, transform: &str) -> Json {
    match transform {
        "upper" => value.as_str().map(|s| Json::String(s.to_uppercase())).unwrap_or(value),
        "lower" => value.as_str().map(|s| Json::String(s.to_lowercase())).unwrap_or(value),
        "title" => value
            .as_str()
            .map(|s| Json::String(s.split_whitespace().map(title_word).collect::<Vec<_>>().join(" ")))
            .unwrap_or(value),
        "trim" => value.as_str().map(|s| Json::String(s.trim().to_string())).unwrap_or(value),
        "number" => value
            .as_str()
            .and_then(|s| s.trim().parse::<f64>().ok())
            .map(Json::from)
            .unwrap_or(value),
        _ => value,
    }
}

fn title_word(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Renames fields per `[{source, target, transform}]`. `dropOthers`
/// controls whether unmapped fields are retained.
pub fn remapper(node: &PipelineNode, pipeline: &Pipeline, ctx: &mut ExecutionContext) -> Result<(), PipelineError> {
    let records = upstream_value(&node.id, pipeline, ctx).clone().into_records();
    let drop_others = node.config_bool("dropOthers");

    struct Mapping {
        source: String,
        target: String,
        transform: String,
    }
    let mappings: Vec<Mapping> = match node.config.get("mappings") {
        Some(Json::Array(items)) => items
            .iter()
            .filter_map(|m| {
                let source = m.get("source")?.as_str()?.to_string();
                let target = m.get("target")?.as_str()?.to_string();
                let transform = m.get("transform").and_then(Json::as_str).unwrap_or("none").to_string();
                Some(Mapping { source, target, transform })
            })
            .collect(),
        _ => Vec::new(),
    };

    let output = records
        .into_iter()
        .map(|record| {
            let mut out = if drop_others { Record::new() } else { record.clone() };
            for mapping in &mappings {
                if let Some(value) = record.get(&mapping.source) {
                    out.remove(&mapping.source);
                    out.insert(mapping.target.clone(), apply_field_transform(value.clone(), &mapping.transform));
                }
            }
            out
        })
        .collect();

    ctx.publish(node.id.clone(), Value::Records(output));
    Ok(())
}

/// Evaluates a sandboxed expression per record, writing the result to
/// `alias` (or `field` if absent). An expression error is recorded on the
/// context's error list and skips that record's assignment; it does not
/// fail the pipeline.
pub fn transform(node: &PipelineNode, pipeline: &Pipeline, ctx: &mut ExecutionContext) -> Result<(), PipelineError> {
    let records = upstream_value(&node.id, pipeline, ctx).clone().into_records();

    let source = node
        .config_str("expression")
        .ok_or_else(|| PipelineError::invalid_config(format!("transform node {} missing \"expression\"", node.id)))?;
    let target_field = node.config_str("alias").or_else(|| node.config_str("field")).unwrap_or("result").to_string();
    let compiled = CompiledExpression::compile(source)?;

    let mut output = Vec::with_capacity(records.len());
    for mut record in records {
        match compiled.eval(&record) {
            Ok(value) => {
                record.insert(target_field.clone(), value);
            }
            Err(error) => ctx.record_error(pipeline_flow_domain::entities::ExecutionError::new(Some(node.id.clone()), error.to_string(), "expression_error")),
        }
        output.push(record);
    }

    ctx.publish(node.id.clone(), Value::Records(output));
    Ok(())
}

/// Multi-key stable sort with per-key direction. Numeric values compare
/// numerically; others compare as lowercased strings. Mixed types fall back
/// to original order for that key.
pub fn sort(node: &PipelineNode, pipeline: &Pipeline, ctx: &mut ExecutionContext) -> Result<(), PipelineError> {
    let mut records = upstream_value(&node.id, pipeline, ctx).clone().into_records();

    struct Key {
        field: String,
        descending: bool,
    }
    let keys: Vec<Key> = match node.config.get("keys") {
        Some(Json::Array(items)) => items
            .iter()
            .filter_map(|k| {
                let field = k.get("field")?.as_str()?.to_string();
                let descending = matches!(k.get("direction").and_then(Json::as_str), Some("desc") | Some("descending"));
                Some(Key { field, descending })
            })
            .collect(),
        _ => Vec::new(),
    };

    records.sort_by(|a, b| {
        for key in &keys {
            let ordering = compare_values(a.get(&key.field), b.get(&key.field));
            let ordering = if key.descending { ordering.reverse() } else { ordering };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    });

    ctx.publish(node.id.clone(), Value::Records(records));
    Ok(())
}

fn compare_values(a: Option<&Json>, b: Option<&Json>) -> Ordering {
    match (a.and_then(Json::as_f64), b.and_then(Json::as_f64)) {
        (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
        _ => match (a.and_then(Json::as_str), b.and_then(Json::as_str)) {
            (Some(a), Some(b)) => a.to_lowercase().cmp(&b.to_lowercase()),
            _ => Ordering::Equal,
        },
    }
}

/// Deduplicates on the `|`-joined concatenation of configured field values.
/// `keep ∈ {first, last}` decides which occurrence of a key survives.
pub fn dedupe(node: &PipelineNode, pipeline: &Pipeline, ctx: &mut ExecutionContext) -> Result<(), PipelineError> {
    let records = upstream_value(&node.id, pipeline, ctx).clone().into_records();

    let fields: Vec<String> = match node.config.get("fields") {
        Some(Json::Array(items)) => items.iter().filter_map(|f| f.as_str().map(str::to_string)).collect(),
        _ => Vec::new(),
    };
    let keep_last = node.config_str("keep") == Some("last");

    let key_of = |record: &Record| -> String {
        fields
            .iter()
            .map(|f| record.get(f).map(json_display).unwrap_or_default())
            .collect::<Vec<_>>()
            .join("|")
    };

    let mut seen: std::collections::HashMap<String, usize> = std::collections::HashMap::new();
    let mut output: Vec<Option<Record>> = Vec::with_capacity(records.len());
    for record in records {
        let key = key_of(&record);
        output.push(Some(record));
        let idx = output.len() - 1;
        if let Some(&existing) = seen.get(&key) {
            if keep_last {
                output[existing] = None;
            } else {
                output[idx] = None;
            }
        }
        seen.insert(key, idx);
    }

    ctx.publish(node.id.clone(), Value::Records(output.into_iter().flatten().collect()));
    Ok(())
}

fn json_display(value: &Json) -> String {
    match value {
        Json::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Concatenates the outputs of every incoming edge's source node, in
/// edge-insertion order, into a single `Records` value. The historical
/// `sources` config field is not consulted (§9).
pub fn union(node: &PipelineNode, pipeline: &Pipeline, ctx: &mut ExecutionContext) -> Result<(), PipelineError> {
    let mut output = Vec::new();
    let source_ids: Vec<NodeId> = pipeline.incoming_edges(&node.id).map(|e| e.source.clone()).collect();
    for source_id in source_ids {
        if let Some(value) = ctx.output_of(&source_id) {
            output.extend(value.clone().into_records());
        }
    }
    ctx.publish(node.id.clone(), Value::Records(output));
    Ok(())
}

/// Turns long data wide: groups by `index` fields, spreads `column_field`'s
/// distinct values into new columns populated from `value_field` (missing
/// combinations become null).
pub fn pivot(node: &PipelineNode, pipeline: &Pipeline, ctx: &mut ExecutionContext) -> Result<(), PipelineError> {
    let records = upstream_value(&node.id, pipeline, ctx).clone().into_records();

    let index_fields: Vec<String> = match node.config.get("index") {
        Some(Json::Array(items)) => items.iter().filter_map(|f| f.as_str().map(str::to_string)).collect(),
        _ => Vec::new(),
    };
    let column_field = node
        .config_str("column_field")
        .ok_or_else(|| PipelineError::invalid_config(format!("pivot node {} missing \"column_field\"", node.id)))?;
    let value_field = node
        .config_str("value_field")
        .ok_or_else(|| PipelineError::invalid_config(format!("pivot node {} missing \"value_field\"", node.id)))?;

    let mut columns = BTreeSet::new();
    for record in &records {
        if let Some(v) = record.get(column_field) {
            columns.insert(json_display(v));
        }
    }

    let mut order: Vec<Vec<Json>> = Vec::new();
    let mut groups: std::collections::HashMap<Vec<String>, Record> = std::collections::HashMap::new();
    for record in &records {
        let key_values: Vec<Json> = index_fields.iter().map(|f| record.get(f).cloned().unwrap_or(Json::Null)).collect();
        let key: Vec<String> = key_values.iter().map(json_display).collect();
        if !groups.contains_key(&key) {
            order.push(key_values.clone());
            let mut base = Record::new();
            for (field, value) in index_fields.iter().zip(&key_values) {
                base.insert(field.clone(), value.clone());
            }
            groups.insert(key.clone(), base);
        }
        if let Some(column_value) = record.get(column_field) {
            let row = groups.get_mut(&key).unwrap();
            row.insert(json_display(column_value), record.get(value_field).cloned().unwrap_or(Json::Null));
        }
    }

    let mut output = Vec::with_capacity(order.len());
    for key_values in &order {
        let key: Vec<String> = key_values.iter().map(json_display).collect();
        let mut row = groups.remove(&key).unwrap();
        for column in &columns {
            row.entry(column.clone()).or_insert(Json::Null);
        }
        output.push(row);
    }

    ctx.publish(node.id.clone(), Value::Records(output));
    Ok(())
}

/// The inverse of `pivot`: turns a fixed set of `value_columns` into
/// `<variable, value>` row pairs while carrying the remaining fields
/// through unchanged.
pub fn unpivot(node: &PipelineNode, pipeline: &Pipeline, ctx: &mut ExecutionContext) -> Result<(), PipelineError> {
    let records = upstream_value(&node.id, pipeline, ctx).clone().into_records();

    let value_columns: Vec<String> = match node.config.get("value_columns") {
        Some(Json::Array(items)) => items.iter().filter_map(|f| f.as_str().map(str::to_string)).collect(),
        _ => Vec::new(),
    };
    let variable_name = node.config_str("variable_name").unwrap_or("variable").to_string();
    let value_name = node.config_str("value_name").unwrap_or("value").to_string();

    let mut output = Vec::new();
    for record in &records {
        let carried: Record = record.iter().filter(|(k, _)| !value_columns.contains(k)).map(|(k, v)| (k.clone(), v.clone())).collect();
        for column in &value_columns {
            let mut row = carried.clone();
            row.insert(variable_name.clone(), Json::String(column.clone()));
            row.insert(value_name.clone(), record.get(column).cloned().unwrap_or(Json::Null));
            output.push(row);
        }
    }

    ctx.publish(node.id.clone(), Value::Records(output));
    Ok(())
}

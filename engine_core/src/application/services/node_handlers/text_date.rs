//! `text`, `date` - the text/date role group (§4.8).

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use pipeline_flow_domain::{ExecutionContext, Pipeline, PipelineError, PipelineNode, Record, Value};
use regex::Regex;
use serde_json::Value as Json;

use super::upstream_value;

struct TextStep {
    field: String,
    op: String,
    args: Vec<Json>,
}

/// Field-scoped string operations - `upper`, `lower`, `trim`,
/// `replace(pattern, replacement, is_regex)`, `split(delimiter, index)`,
/// `concat(fields, separator)` - one operation per configured step, applied
/// in configured order.
pub fn text(node: &PipelineNode, pipeline: &Pipeline, ctx: &mut ExecutionContext) -> Result<(), PipelineError> {
    let mut records = upstream_value(&node.id, pipeline, ctx).clone().into_records();

    let steps: Vec<TextStep> = match node.config.get("steps") {
        Some(Json::Array(items)) => items
            .iter()
            .filter_map(|s| {
                let field = s.get("field")?.as_str()?.to_string();
                let op = s.get("op")?.as_str()?.to_string();
                let args = s.get("args").and_then(Json::as_array).cloned().unwrap_or_default();
                Some(TextStep { field, op, args })
            })
            .collect(),
        _ => Vec::new(),
    };

    for step in &steps {
        for record in records.iter_mut() {
            apply_text_step(record, step);
        }
    }

    ctx.publish(node.id.clone(), Value::Records(records));
    Ok(())
}

fn apply_text_step(record: &mut Record, step: &TextStep) {
    match step.op.as_str() {
        "upper" => {
            if let Some(s) = record.get(&step.field).and_then(Json::as_str) {
                record.insert(step.field.clone(), Json::String(s.to_uppercase()));
            }
        }
        "lower" => {
            if let Some(s) = record.get(&step.field).and_then(Json::as_str) {
                record.insert(step.field.clone(), Json::String(s.to_lowercase()));
            }
        }
        "trim" => {
            if let Some(s) = record.get(&step.field).and_then(Json::as_str) {
                record.insert(step.field.clone(), Json::String(s.trim().to_string()));
            }
        }
        "replace" => {
            let (Some(pattern), Some(replacement)) = (step.args.first().and_then(Json::as_str), step.args.get(1).and_then(Json::as_str)) else {
                return;
            };
            let is_regex = step.args.get(2).and_then(Json::as_bool).unwrap_or(false);
            if let Some(s) = record.get(&step.field).and_then(Json::as_str) {
                let replaced = if is_regex {
                    Regex::new(pattern).map(|re| re.replace_all(s, replacement).to_string()).unwrap_or_else(|_| s.to_string())
                } else {
                    s.replace(pattern, replacement)
                };
                record.insert(step.field.clone(), Json::String(replaced));
            }
        }
        "split" => {
            let Some(delimiter) = step.args.first().and_then(Json::as_str) else {
                return;
            };
            let index = step.args.get(1).and_then(Json::as_u64).unwrap_or(0) as usize;
            if let Some(s) = record.get(&step.field).and_then(Json::as_str) {
                let part = s.split(delimiter).nth(index).map(str::to_string);
                record.insert(step.field.clone(), part.map(Json::String).unwrap_or(Json::Null));
            }
        }
        "concat" => {
            let Some(fields) = step.args.first().and_then(Json::as_array) else {
                return;
            };
            let separator = step.args.get(1).and_then(Json::as_str).unwrap_or("");
            let joined = fields
                .iter()
                .filter_map(Json::as_str)
                .filter_map(|f| record.get(f).and_then(Json::as_str))
                .collect::<Vec<_>>()
                .join(separator);
            record.insert(step.field.clone(), Json::String(joined));
        }
        _ => {}
    }
}

/// Parses a field as a date/time per a configured input format, optionally
/// reformats to an output format, and can derive a component
/// (`year`/`month`/`day`/`weekday`) into a separate alias field.
/// Unparseable values are left untouched and recorded as a per-record
/// error.
pub fn date(node: &PipelineNode, pipeline: &Pipeline, ctx: &mut ExecutionContext) -> Result<(), PipelineError> {
    let mut records = upstream_value(&node.id, pipeline, ctx).clone().into_records();

    let field = node
        .config_str("field")
        .ok_or_else(|| PipelineError::invalid_config(format!("date node {} missing \"field\"", node.id)))?
        .to_string();
    let input_format = node.config_str("input_format").unwrap_or("%Y-%m-%d").to_string();
    let output_format = node.config_str("output_format").map(str::to_string);
    let component = node.config_str("component").map(str::to_string);
    let component_alias = node.config_str("component_alias").unwrap_or("component").to_string();

    for record in records.iter_mut() {
        let Some(raw) = record.get(&field).and_then(Json::as_str).map(str::to_string) else {
            continue;
        };
        let parsed = NaiveDateTime::parse_from_str(&raw, &input_format)
            .map(|dt| dt.date())
            .or_else(|_| NaiveDate::parse_from_str(&raw, &input_format));
        let Ok(date) = parsed else {
            ctx.record_error(pipeline_flow_domain::entities::ExecutionError::new(
                Some(node.id.clone()),
                format!("could not parse \"{raw}\" as date with format \"{input_format}\""),
                "date_parse_error",
            ));
            continue;
        };
        if let Some(output_format) = &output_format {
            record.insert(field.clone(), Json::String(date.format(output_format).to_string()));
        }
        if let Some(component) = &component {
            let value = match component.as_str() {
                "year" => Some(Json::from(date.year())),
                "month" => Some(Json::from(date.month())),
                "day" => Some(Json::from(date.day())),
                "weekday" => Some(Json::String(date.weekday().to_string())),
                _ => None,
            };
            if let Some(value) = value {
                record.insert(component_alias.clone(), value);
            }
        }
    }

    ctx.publish(node.id.clone(), Value::Records(records));
    Ok(())
}

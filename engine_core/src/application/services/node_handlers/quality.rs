//! `validate`, `profile`, `impute`, `normalize`, `outlier` - the data
//! quality role group (§4.8).

use pipeline_flow_domain::{ExecutionContext, Pipeline, PipelineError, PipelineNode, Record, Value};
use regex::Regex;
use serde_json::Value as Json;

use super::upstream_value;

struct FieldRule {
    field: String,
    required: bool,
    type_check: Option<String>,
    min: Option<f64>,
    max: Option<f64>,
    pattern: Option<Regex>,
}

/// Applies a list of per-field rules to each record. A failing record is
/// tagged with `_validation_errors` (a list of violation strings) rather
/// than dropped - downstream `router`/`filter` nodes decide disposition.
pub fn validate(node: &PipelineNode, pipeline: &Pipeline, ctx: &mut ExecutionContext) -> Result<(), PipelineError> {
    let records = upstream_value(&node.id, pipeline, ctx).clone().into_records();

    let rules: Vec<FieldRule> = match node.config.get("rules") {
        Some(Json::Array(rules)) => rules
            .iter()
            .filter_map(|r| {
                let field = r.get("field")?.as_str()?.to_string();
                Some(FieldRule {
                    field,
                    required: r.get("required").and_then(Json::as_bool).unwrap_or(false),
                    type_check: r.get("type").and_then(Json::as_str).map(str::to_string),
                    min: r.get("min").and_then(Json::as_f64),
                    max: r.get("max").and_then(Json::as_f64),
                    pattern: r.get("pattern").and_then(Json::as_str).and_then(|p| Regex::new(p).ok()),
                })
            })
            .collect(),
        _ => Vec::new(),
    };

    let mut output = Vec::with_capacity(records.len());
    for mut record in records {
        let mut violations = Vec::new();
        for rule in &rules {
            let value = record.get(&rule.field);
            let present = !matches!(value, None | Some(Json::Null));
            if rule.required && !present {
                violations.push(format!("{}: required", rule.field));
                continue;
            }
            if !present {
                continue;
            }
            let value = value.unwrap();
            if let Some(type_check) = &rule.type_check {
                let matches_type = match type_check.as_str() {
                    "string" => value.is_string(),
                    "number" => value.is_number(),
                    "boolean" => value.is_boolean(),
                    _ => true,
                };
                if !matches_type {
                    violations.push(format!("{}: expected {type_check}", rule.field));
                }
            }
            if let Some(n) = value.as_f64() {
                if let Some(min) = rule.min {
                    if n < min {
                        violations.push(format!("{}: below min {min}", rule.field));
                    }
                }
                if let Some(max) = rule.max {
                    if n > max {
                        violations.push(format!("{}: above max {max}", rule.field));
                    }
                }
            }
            if let Some(pattern) = &rule.pattern {
                if let Some(s) = value.as_str() {
                    if !pattern.is_match(s) {
                        violations.push(format!("{}: does not match pattern", rule.field));
                    }
                }
            }
        }
        if !violations.is_empty() {
            record.insert("_validation_errors".to_string(), Json::Array(violations.into_iter().map(Json::String).collect()));
        }
        output.push(record);
    }

    ctx.publish(node.id.clone(), Value::Records(output));
    Ok(())
}

/// Per-field summary statistics (count, null count, distinct count, and for
/// numeric fields min/max/mean) over the upstream input, published as a
/// single summary record. Does not alter the records it receives.
pub fn profile(node: &PipelineNode, pipeline: &Pipeline, ctx: &mut ExecutionContext) -> Result<(), PipelineError> {
    let records = upstream_value(&node.id, pipeline, ctx).clone().into_records();

    let mut fields: Vec<String> = Vec::new();
    for record in &records {
        for key in record.keys() {
            if !fields.contains(key) {
                fields.push(key.clone());
            }
        }
    }

    let mut summary = Record::new();
    for field in &fields {
        let mut count = 0u64;
        let mut null_count = 0u64;
        let mut distinct = std::collections::HashSet::new();
        let mut numbers = Vec::new();
        for record in &records {
            match record.get(field) {
                None | Some(Json::Null) => null_count += 1,
                Some(value) => {
                    count += 1;
                    distinct.insert(value.to_string());
                    if let Some(n) = value.as_f64() {
                        numbers.push(n);
                    }
                }
            }
        }
        let mut stats = Record::new();
        stats.insert("count".to_string(), Json::from(count));
        stats.insert("null_count".to_string(), Json::from(null_count));
        stats.insert("distinct_count".to_string(), Json::from(distinct.len() as u64));
        if !numbers.is_empty() {
            let min = numbers.iter().cloned().fold(f64::INFINITY, f64::min);
            let max = numbers.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            let mean = numbers.iter().sum::<f64>() / numbers.len() as f64;
            stats.insert("min".to_string(), Json::from(min));
            stats.insert("max".to_string(), Json::from(max));
            stats.insert("mean".to_string(), Json::from(mean));
        }
        summary.insert(field.clone(), Json::Object(stats.into_iter().collect()));
    }

    ctx.publish(node.id.clone(), Value::Records(vec![summary]));
    Ok(())
}

/// Fills missing/null values per field per a configured strategy
/// (`constant`, `mean`, `median`, `mode`). Numeric strategies skip
/// non-numeric fields and record a per-field error rather than crashing.
pub fn impute(node: &PipelineNode, pipeline: &Pipeline, ctx: &mut ExecutionContext) -> Result<(), PipelineError> {
    let mut records = upstream_value(&node.id, pipeline, ctx).clone().into_records();

    let strategies: Vec<(String, String, Option<Json>)> = match node.config.get("fields") {
        Some(Json::Array(specs)) => specs
            .iter()
            .filter_map(|s| {
                let field = s.get("field")?.as_str()?.to_string();
                let strategy = s.get("strategy")?.as_str()?.to_string();
                let value = s.get("value").cloned();
                Some((field, strategy, value))
            })
            .collect(),
        _ => Vec::new(),
    };

    for (field, strategy, constant) in &strategies {
        let fill: Option<Json> = match strategy.as_str() {
            "constant" => constant.clone(),
            "mean" | "median" | "mode" => {
                let mut numbers: Vec<f64> = records.iter().filter_map(|r| r.get(field)).filter_map(Json::as_f64).collect();
                if numbers.is_empty() {
                    None
                } else {
                    match strategy.as_str() {
                        "mean" => Some(Json::from(numbers.iter().sum::<f64>() / numbers.len() as f64)),
                        "median" => {
                            numbers.sort_by(|a, b| a.partial_cmp(b).unwrap());
                            let mid = numbers.len() / 2;
                            let median = if numbers.len() % 2 == 0 { (numbers[mid - 1] + numbers[mid]) / 2.0 } else { numbers[mid] };
                            Some(Json::from(median))
                        }
                        "mode" => {
                            let mut counts: std::collections::HashMap<u64, usize> = std::collections::HashMap::new();
                            for n in &numbers {
                                *counts.entry(n.to_bits()).or_insert(0) += 1;
                            }
                            counts.into_iter().max_by_key(|(_, c)| *c).map(|(bits, _)| Json::from(f64::from_bits(bits)))
                        }
                        _ => None,
                    }
                }
            }
            _ => None,
        };
        let Some(fill) = fill else { continue };
        for record in records.iter_mut() {
            let missing = matches!(record.get(field), None | Some(Json::Null));
            if missing {
                record.insert(field.clone(), fill.clone());
            }
        }
    }

    ctx.publish(node.id.clone(), Value::Records(records));
    Ok(())
}

/// Min-max or z-score normalization, per field. Degenerate ranges
/// (`max == min`, `std == 0`) map to the identity rather than dividing by
/// zero.
pub fn normalize(node: &PipelineNode, pipeline: &Pipeline, ctx: &mut ExecutionContext) -> Result<(), PipelineError> {
    let mut records = upstream_value(&node.id, pipeline, ctx).clone().into_records();

    let method = node.config_str("method").unwrap_or("min-max");
    let fields: Vec<String> = match node.config.get("fields") {
        Some(Json::Array(fields)) => fields.iter().filter_map(|f| f.as_str().map(str::to_string)).collect(),
        _ => Vec::new(),
    };

    for field in &fields {
        let numbers: Vec<f64> = records.iter().filter_map(|r| r.get(field)).filter_map(Json::as_f64).collect();
        if numbers.is_empty() {
            continue;
        }
        match method {
            "z-score" => {
                let mean = numbers.iter().sum::<f64>() / numbers.len() as f64;
                let variance = numbers.iter().map(|n| (n - mean).powi(2)).sum::<f64>() / numbers.len() as f64;
                let std = variance.sqrt();
                if std == 0.0 {
                    continue;
                }
                for record in records.iter_mut() {
                    if let Some(n) = record.get(field).and_then(Json::as_f64) {
                        record.insert(field.clone(), Json::from((n - mean) / std));
                    }
                }
            }
            _ => {
                let min = numbers.iter().cloned().fold(f64::INFINITY, f64::min);
                let max = numbers.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
                if max == min {
                    continue;
                }
                for record in records.iter_mut() {
                    if let Some(n) = record.get(field).and_then(Json::as_f64) {
                        record.insert(field.clone(), Json::from((n - min) / (max - min)));
                    }
                }
            }
        }
    }

    ctx.publish(node.id.clone(), Value::Records(records));
    Ok(())
}

/// IQR (`Q1 - 1.5*IQR`, `Q3 + 1.5*IQR`) or z-score (`|z| > 3`) outlier
/// detection over a single field. Requires at least 4 values to have a
/// defined bound. Actions: `flag` (adds `_is_outlier`), `remove`, `cap`
/// (clips to bounds).
pub fn outlier(node: &PipelineNode, pipeline: &Pipeline, ctx: &mut ExecutionContext) -> Result<(), PipelineError> {
    let mut records = upstream_value(&node.id, pipeline, ctx).clone().into_records();

    let field = node
        .config_str("field")
        .ok_or_else(|| PipelineError::invalid_config(format!("outlier node {} missing \"field\"", node.id)))?;
    let method = node.config_str("method").unwrap_or("iqr");
    let action = node.config_str("action").unwrap_or("flag");

    let mut numbers: Vec<f64> = records.iter().filter_map(|r| r.get(field)).filter_map(Json::as_f64).collect();
    if numbers.len() < 4 {
        ctx.publish(node.id.clone(), Value::Records(records));
        return Ok(());
    }
    numbers.sort_by(|a, b| a.partial_cmp(b).unwrap());

    let (lower, upper) = match method {
        "z-score" => {
            let mean = numbers.iter().sum::<f64>() / numbers.len() as f64;
            let variance = numbers.iter().map(|n| (n - mean).powi(2)).sum::<f64>() / numbers.len() as f64;
            let std = variance.sqrt();
            (mean - 3.0 * std, mean + 3.0 * std)
        }
        _ => {
            let quantile = |values: &[f64], q: f64| -> f64 {
                let idx = q * (values.len() - 1) as f64;
                let lo = idx.floor() as usize;
                let hi = idx.ceil() as usize;
                if lo == hi {
                    values[lo]
                } else {
                    values[lo] + (values[hi] - values[lo]) * (idx - lo as f64)
                }
            };
            let q1 = quantile(&numbers, 0.25);
            let q3 = quantile(&numbers, 0.75);
            let iqr = q3 - q1;
            (q1 - 1.5 * iqr, q3 + 1.5 * iqr)
        }
    };

    let mut output = Vec::with_capacity(records.len());
    for mut record in records.drain(..) {
        let Some(n) = record.get(field).and_then(Json::as_f64) else {
            output.push(record);
            continue;
        };
        let is_outlier = n < lower || n > upper;
        if !is_outlier {
            output.push(record);
            continue;
        }
        match action {
            "remove" => {}
            "cap" => {
                let capped = n.clamp(lower, upper);
                record.insert(field.to_string(), Json::from(capped));
                output.push(record);
            }
            _ => {
                record.insert("_is_outlier".to_string(), Json::Bool(true));
                output.push(record);
            }
        }
    }

    ctx.publish(node.id.clone(), Value::Records(output));
    Ok(())
}

//! `folderSource`, `output`, `readJson`, `writeJson`, `readExcel`,
//! `writeExcel` - the I/O role group (§4.8). `folderSource` and `output`
//! are the two retry-bearing handlers (§4.8 "Retry policy"): 3 attempts,
//! 1s initial delay, multiplier 2.

use std::path::PathBuf;
use std::time::Duration;

use calamine::{Reader, Xlsx};
use pipeline_flow_domain::{ExecutionContext, Pipeline, PipelineError, PipelineNode, Record, Value};
use rust_xlsxwriter::Workbook;
use serde_json::Value as Json;

use crate::application::utilities::retry::retry;

use super::{upstream_value, NodeDeps};

const SOURCE_RETRY_ATTEMPTS: u32 = 3;
const SOURCE_RETRY_DELAY: Duration = Duration::from_secs(1);
const SOURCE_RETRY_MULTIPLIER: u32 = 2;

/// Resolves which path/remote-fs pair a `folderSource`/`output` node reads
/// from or writes to: an explicit `protocol` + `path` in the node's own
/// config takes precedence; otherwise the run's own `--input`/`--output`
/// path is used via the `local` protocol.
enum Target {
    Local(PathBuf),
    Remote { protocol: String, path: String },
}

fn resolve_target(node: &PipelineNode, fallback: &Option<PathBuf>) -> Result<Target, PipelineError> {
    match (node.config_str("protocol"), node.config_str("path")) {
        (Some(protocol), Some(path)) => Ok(Target::Remote {
            protocol: protocol.to_string(),
            path: path.to_string(),
        }),
        _ => fallback
            .clone()
            .map(Target::Local)
            .ok_or_else(|| PipelineError::invalid_config(format!("node {} has no path and the run has no default input/output path", node.id))),
    }
}

async fn read_bytes(node: &PipelineNode, deps: &NodeDeps, fallback: &Option<PathBuf>) -> Result<Vec<u8>, PipelineError> {
    match resolve_target(node, fallback)? {
        Target::Local(path) => tokio::fs::read(&path).await.map_err(PipelineError::from),
        Target::Remote { protocol, path } => {
            let fs = (deps.remote_fs_factory)(&protocol, &node.config)?;
            let local_tmp = std::env::temp_dir().join(format!("pipeline-flow-{}.tmp", node.id));
            let ok = fs.download(&path, &local_tmp.to_string_lossy()).await;
            fs.close().await;
            if !ok {
                return Err(PipelineError::io_error(format!("failed to download {path} via {protocol}")));
            }
            tokio::fs::read(&local_tmp).await.map_err(PipelineError::from)
        }
    }
}

async fn write_bytes(node: &PipelineNode, deps: &NodeDeps, fallback: &Option<PathBuf>, bytes: &[u8]) -> Result<(), PipelineError> {
    match resolve_target(node, fallback)? {
        Target::Local(path) => tokio::fs::write(&path, bytes).await.map_err(PipelineError::from),
        Target::Remote { protocol, path } => {
            let fs = (deps.remote_fs_factory)(&protocol, &node.config)?;
            let local_tmp = std::env::temp_dir().join(format!("pipeline-flow-{}.tmp", node.id));
            tokio::fs::write(&local_tmp, bytes).await?;
            let ok = fs.upload(&local_tmp.to_string_lossy(), &path).await;
            fs.close().await;
            if !ok {
                return Err(PipelineError::io_error(format!("failed to upload to {path} via {protocol}")));
            }
            Ok(())
        }
    }
}

/// Reads the run's input (JSON array of records, or a single record object)
/// into `node.id`'s output slot.
pub async fn folder_source(node: &PipelineNode, ctx: &mut ExecutionContext, deps: &NodeDeps) -> Result<(), PipelineError> {
    let fallback = deps.input_path.clone();
    let bytes = retry(
        || async { read_bytes(node, deps, &fallback).await },
        SOURCE_RETRY_ATTEMPTS,
        SOURCE_RETRY_DELAY,
        SOURCE_RETRY_MULTIPLIER,
    )
    .await?;
    let value: Value = serde_json::from_slice(&bytes)?;
    ctx.publish(node.id.clone(), value);
    Ok(())
}

/// Writes the upstream value out as JSON. A sink node - it still republishes
/// its input unchanged so a malformed graph with something downstream of
/// `output` doesn't silently starve.
pub async fn output(node: &PipelineNode, pipeline: &Pipeline, ctx: &mut ExecutionContext, deps: &NodeDeps) -> Result<(), PipelineError> {
    let value = upstream_value(&node.id, pipeline, ctx).clone();
    let bytes = serde_json::to_vec(&value)?;
    let fallback = deps.output_path.clone();
    retry(
        || async { write_bytes(node, deps, &fallback, &bytes).await },
        SOURCE_RETRY_ATTEMPTS,
        SOURCE_RETRY_DELAY,
        SOURCE_RETRY_MULTIPLIER,
    )
    .await?;
    ctx.publish(node.id.clone(), value);
    Ok(())
}

/// Reads a local JSON file named by the `path` config key - deterministic,
/// no retry (only the run's designated input/output endpoints retry).
pub async fn read_json(node: &PipelineNode, ctx: &mut ExecutionContext) -> Result<(), PipelineError> {
    let path = node
        .config_str("path")
        .ok_or_else(|| PipelineError::invalid_config(format!("readJson node {} missing \"path\"", node.id)))?;
    let bytes = tokio::fs::read(path).await?;
    let value: Value = serde_json::from_slice(&bytes)?;
    ctx.publish(node.id.clone(), value);
    Ok(())
}

pub async fn write_json(node: &PipelineNode, pipeline: &Pipeline, ctx: &mut ExecutionContext) -> Result<(), PipelineError> {
    let path = node
        .config_str("path")
        .ok_or_else(|| PipelineError::invalid_config(format!("writeJson node {} missing \"path\"", node.id)))?;
    let value = upstream_value(&node.id, pipeline, ctx).clone();
    let bytes = serde_json::to_vec_pretty(&value)?;
    tokio::fs::write(path, bytes).await?;
    ctx.publish(node.id.clone(), value);
    Ok(())
}

/// Reads the first worksheet of an `.xlsx` file, treating row 1 as headers.
pub async fn read_excel(node: &PipelineNode, ctx: &mut ExecutionContext) -> Result<(), PipelineError> {
    let path = node
        .config_str("path")
        .ok_or_else(|| PipelineError::invalid_config(format!("readExcel node {} missing \"path\"", node.id)))?
        .to_string();

    let records = tokio::task::spawn_blocking(move || -> Result<Vec<Record>, PipelineError> {
        let mut workbook: Xlsx<_> = calamine::open_workbook(&path).map_err(|e| PipelineError::io_error(format!("{path}: {e}")))?;
        let sheet_name = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| PipelineError::io_error(format!("{path}: workbook has no sheets")))?;
        let range = workbook
            .worksheet_range(&sheet_name)
            .map_err(|e| PipelineError::io_error(format!("{path}: {e}")))?;
        let mut rows = range.rows();
        let headers: Vec<String> = rows.next().map(|r| r.iter().map(|c| c.to_string()).collect()).unwrap_or_default();
        let mut records = Vec::new();
        for row in rows {
            let mut record = Record::new();
            for (header, cell) in headers.iter().zip(row.iter()) {
                record.insert(header.clone(), excel_cell_to_json(cell));
            }
            records.push(record);
        }
        Ok(records)
    })
    .await
    .map_err(|e| PipelineError::internal_error(e.to_string()))??;

    ctx.publish(node.id.clone(), Value::Records(records));
    Ok(())
}

fn excel_cell_to_json(cell: &calamine::Data) -> Json {
    use calamine::Data;
    match cell {
        Data::Empty => Json::Null,
        Data::String(s) => Json::String(s.clone()),
        Data::Float(f) => serde_json::Number::from_f64(*f).map(Json::Number).unwrap_or(Json::Null),
        Data::Int(i) => Json::from(*i),
        Data::Bool(b) => Json::Bool(*b),
        other => Json::String(other.to_string()),
    }
}

/// Writes the upstream records as an `.xlsx` workbook, columns taken from
/// the union of all record keys in first-seen order.
pub async fn write_excel(node: &PipelineNode, pipeline: &Pipeline, ctx: &mut ExecutionContext) -> Result<(), PipelineError> {
    let path = node
        .config_str("path")
        .ok_or_else(|| PipelineError::invalid_config(format!("writeExcel node {} missing \"path\"", node.id)))?
        .to_string();
    let value = upstream_value(&node.id, pipeline, ctx).clone();
    let records = value.clone().into_records();

    let mut columns: Vec<String> = Vec::new();
    for record in &records {
        for key in record.keys() {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
        }
    }

    tokio::task::spawn_blocking(move || -> Result<(), PipelineError> {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        for (col_idx, column) in columns.iter().enumerate() {
            sheet
                .write_string(0, col_idx as u16, column)
                .map_err(|e| PipelineError::io_error(e.to_string()))?;
        }
        for (row_idx, record) in records.iter().enumerate() {
            for (col_idx, column) in columns.iter().enumerate() {
                let row = (row_idx + 1) as u32;
                match record.get(column) {
                    Some(Json::Number(n)) if n.as_f64().is_some() => {
                        sheet
                            .write_number(row, col_idx as u16, n.as_f64().unwrap())
                            .map_err(|e| PipelineError::io_error(e.to_string()))?;
                    }
                    Some(Json::Bool(b)) => {
                        sheet.write_boolean(row, col_idx as u16, *b).map_err(|e| PipelineError::io_error(e.to_string()))?;
                    }
                    Some(Json::Null) | None => {}
                    Some(other) => {
                        let text = match other {
                            Json::String(s) => s.clone(),
                            other => other.to_string(),
                        };
                        sheet.write_string(row, col_idx as u16, &text).map_err(|e| PipelineError::io_error(e.to_string()))?;
                    }
                }
            }
        }
        workbook.save(&path).map_err(|e| PipelineError::io_error(e.to_string()))?;
        Ok(())
    })
    .await
    .map_err(|e| PipelineError::internal_error(e.to_string()))??;

    ctx.publish(node.id.clone(), value);
    Ok(())
}

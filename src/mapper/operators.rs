//! Supported operator kinds and their wire shaping.

use crate::config::{InputConfig, OutputConfig};
use crate::graph::{Operation, OperationCategory};
use crate::mapper::paths;
use crate::mapper::WireOperator;
use chrono::Local;
use serde_json::{json, Map, Value};
use std::fmt;

/// Key function the executor expects on a global reduce.
pub const GLOBAL_REDUCE_KEY_UDF: &str = "(_ : Any) => 1";

/// Every operator the mapper knows how to shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorKind {
    JdbcRemoteInput,
    TextFileInput,
    Map,
    FlatMap,
    Filter,
    Reduce,
    ReduceBy,
    GroupBy,
    Sort,
    Join,
    TextFileOutput,
}

impl OperatorKind {
    pub const ALL: [OperatorKind; 11] = [
        OperatorKind::JdbcRemoteInput,
        OperatorKind::TextFileInput,
        OperatorKind::Map,
        OperatorKind::FlatMap,
        OperatorKind::Filter,
        OperatorKind::Reduce,
        OperatorKind::ReduceBy,
        OperatorKind::GroupBy,
        OperatorKind::Sort,
        OperatorKind::Join,
        OperatorKind::TextFileOutput,
    ];

    /// Wire `operatorName`.
    pub fn name(&self) -> &'static str {
        match self {
            OperatorKind::JdbcRemoteInput => "jdbcRemoteInput",
            OperatorKind::TextFileInput => "textFileInput",
            OperatorKind::Map => "map",
            OperatorKind::FlatMap => "flatMap",
            OperatorKind::Filter => "filter",
            OperatorKind::Reduce => "reduce",
            OperatorKind::ReduceBy => "reduceBy",
            OperatorKind::GroupBy => "groupBy",
            OperatorKind::Sort => "sort",
            OperatorKind::Join => "join",
            OperatorKind::TextFileOutput => "textFileOutput",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    pub fn category(&self) -> OperationCategory {
        match self {
            OperatorKind::JdbcRemoteInput | OperatorKind::TextFileInput => OperationCategory::Input,
            OperatorKind::Join => OperationCategory::Binary,
            OperatorKind::TextFileOutput => OperationCategory::Output,
            _ => OperationCategory::Unary,
        }
    }

    /// `data` keys that must be present and non-null for the executor.
    pub fn required_data(&self) -> &'static [&'static str] {
        match self {
            OperatorKind::JdbcRemoteInput => &["uri", "table", "columnNames"],
            OperatorKind::TextFileInput | OperatorKind::TextFileOutput => &["filename"],
            OperatorKind::Map | OperatorKind::FlatMap | OperatorKind::Filter => &["udf"],
            OperatorKind::Reduce | OperatorKind::ReduceBy => &["keyUdf", "udf"],
            OperatorKind::GroupBy | OperatorKind::Sort => &["keyUdf"],
            OperatorKind::Join => &["thisKeyUdf", "thatKeyUdf"],
        }
    }

    /// Build the wire operator, or explain why it cannot be built.
    pub(crate) fn shape(
        &self,
        op: &Operation,
        input: &InputConfig,
        output: &OutputConfig,
    ) -> Result<WireOperator, String> {
        let data = match self {
            OperatorKind::JdbcRemoteInput => jdbc_input(op, input)?,
            OperatorKind::TextFileInput => text_file_input(op, input)?,
            OperatorKind::Map | OperatorKind::FlatMap | OperatorKind::Filter => {
                data([("udf", json!(op.udf))])
            }
            OperatorKind::Reduce => data([
                ("keyUdf", json!(GLOBAL_REDUCE_KEY_UDF)),
                ("udf", json!(op.udf)),
            ]),
            OperatorKind::ReduceBy => {
                data([("keyUdf", json!(op.key_udf)), ("udf", json!(op.udf))])
            }
            OperatorKind::GroupBy | OperatorKind::Sort => data([("keyUdf", json!(op.key_udf))]),
            OperatorKind::Join => data([
                ("thisKeyUdf", json!(op.this_key_udf)),
                ("thatKeyUdf", json!(op.that_key_udf)),
            ]),
            OperatorKind::TextFileOutput => text_file_output(output)?,
        };

        let (input_ids, output_ids) = match self.category() {
            OperationCategory::Input if *self == OperatorKind::TextFileInput => {
                (Vec::new(), op.output_ids.clone())
            }
            OperationCategory::Output => (op.input_ids.clone(), Vec::new()),
            _ => (op.input_ids.clone(), op.output_ids.clone()),
        };

        Ok(WireOperator {
            id: op.id,
            cat: self.category(),
            input: input_ids,
            output: output_ids,
            operator_name: self.name().to_string(),
            data,
        })
    }
}

impl fmt::Display for OperatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn data<const N: usize>(entries: [(&str, Value); N]) -> Map<String, Value> {
    entries
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect()
}

fn jdbc_input(op: &Operation, input: &InputConfig) -> Result<Map<String, Value>, String> {
    let table = op
        .table
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| "no table named".to_string())?;
    let uri = input
        .jdbc_uri
        .as_deref()
        .ok_or_else(|| "no JDBC uri configured".to_string())?;

    Ok(data([
        ("uri", json!(uri)),
        ("username", json!(input.jdbc_username.as_deref().unwrap_or_default())),
        ("password", json!(input.jdbc_password.as_deref().unwrap_or_default())),
        ("table", json!(paths::projection_query(table, &op.column_names))),
        ("columnNames", json!(op.column_names)),
    ]))
}

fn text_file_input(op: &Operation, input: &InputConfig) -> Result<Map<String, Value>, String> {
    let name = op
        .input_file_name
        .as_deref()
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| "no input file name".to_string())?;
    let folder = input
        .input_folder
        .as_deref()
        .ok_or_else(|| "no input folder configured".to_string())?;
    let folder = paths::folder_uri(folder)
        .map_err(|e| format!("cannot resolve input folder {}: {}", folder.display(), e))?;

    Ok(data([(
        "filename",
        json!(format!("{}{}", folder, paths::text_file_name(name))),
    )]))
}

fn text_file_output(output: &OutputConfig) -> Result<Map<String, Value>, String> {
    let folder = output
        .output_folder
        .as_deref()
        .ok_or_else(|| "no output folder configured".to_string())?;
    if !folder.is_dir() {
        return Err(format!("output folder {} does not exist", folder.display()));
    }
    let folder = paths::folder_uri(folder)
        .map_err(|e| format!("cannot resolve output folder {}: {}", folder.display(), e))?;

    Ok(data([(
        "filename",
        json!(format!("{}{}", folder, paths::output_file_name(Local::now()))),
    )]))
}

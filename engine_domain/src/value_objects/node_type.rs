use serde::{Deserialize, Serialize};

/// The closed set of node kinds the executor knows how to run.
///
/// Parsing a pipeline description maps each node's `type` string onto one of
/// these variants; an unrecognized string is a fatal `UnknownNodeType`
/// configuration error raised at validation time, never at dispatch time.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeType {
    // Structural
    Start,
    End,
    Trigger,

    // I/O
    FolderSource,
    Output,
    ReadJson,
    WriteJson,
    ReadExcel,
    WriteExcel,

    // Row-shape
    Remapper,
    Extract,
    Transform,
    Filter,
    Router,
    Sort,
    Dedupe,
    Union,
    Pivot,
    Unpivot,

    // Join/aggregate
    Join,
    Aggregate,
    LookupTable,

    // Quality
    Validate,
    Profile,
    Impute,
    Normalize,
    Outlier,

    // Text/date
    Text,
    Date,

    // External
    ApiEnrich,
    Query,

    // Control
    Delay,
    Cache,
}

impl NodeType {
    /// The two node types whose handlers wrap the underlying operation with
    /// the executor's retry policy (see `application::use_cases::run_pipeline`).
    pub fn is_retry_bearing(&self) -> bool {
        matches!(self, NodeType::FolderSource | NodeType::Output)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::Start => "start",
            NodeType::End => "end",
            NodeType::Trigger => "trigger",
            NodeType::FolderSource => "folderSource",
            NodeType::Output => "output",
            NodeType::ReadJson => "readJson",
            NodeType::WriteJson => "writeJson",
            NodeType::ReadExcel => "readExcel",
            NodeType::WriteExcel => "writeExcel",
            NodeType::Remapper => "remapper",
            NodeType::Extract => "extract",
            NodeType::Transform => "transform",
            NodeType::Filter => "filter",
            NodeType::Router => "router",
            NodeType::Sort => "sort",
            NodeType::Dedupe => "dedupe",
            NodeType::Union => "union",
            NodeType::Pivot => "pivot",
            NodeType::Unpivot => "unpivot",
            NodeType::Join => "join",
            NodeType::Aggregate => "aggregate",
            NodeType::LookupTable => "lookupTable",
            NodeType::Validate => "validate",
            NodeType::Profile => "profile",
            NodeType::Impute => "impute",
            NodeType::Normalize => "normalize",
            NodeType::Outlier => "outlier",
            NodeType::Text => "text",
            NodeType::Date => "date",
            NodeType::ApiEnrich => "apiEnrich",
            NodeType::Query => "query",
            NodeType::Delay => "delay",
            NodeType::Cache => "cache",
        }
    }
}

impl std::str::FromStr for NodeType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "start" => NodeType::Start,
            "end" => NodeType::End,
            "trigger" => NodeType::Trigger,
            "folderSource" => NodeType::FolderSource,
            "output" => NodeType::Output,
            "readJson" => NodeType::ReadJson,
            "writeJson" => NodeType::WriteJson,
            "readExcel" => NodeType::ReadExcel,
            "writeExcel" => NodeType::WriteExcel,
            "remapper" => NodeType::Remapper,
            "extract" => NodeType::Extract,
            "transform" => NodeType::Transform,
            "filter" => NodeType::Filter,
            "router" => NodeType::Router,
            "sort" => NodeType::Sort,
            "dedupe" => NodeType::Dedupe,
            "union" => NodeType::Union,
            "pivot" => NodeType::Pivot,
            "unpivot" => NodeType::Unpivot,
            "join" => NodeType::Join,
            "aggregate" => NodeType::Aggregate,
            "lookupTable" => NodeType::LookupTable,
            "validate" => NodeType::Validate,
            "profile" => NodeType::Profile,
            "impute" => NodeType::Impute,
            "normalize" => NodeType::Normalize,
            "outlier" => NodeType::Outlier,
            "text" => NodeType::Text,
            "date" => NodeType::Date,
            "apiEnrich" => NodeType::ApiEnrich,
            "query" => NodeType::Query,
            "delay" => NodeType::Delay,
            "cache" => NodeType::Cache,
            _ => return Err(()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn round_trips_every_variant() {
        let all = [
            NodeType::Start,
            NodeType::End,
            NodeType::Trigger,
            NodeType::FolderSource,
            NodeType::Output,
            NodeType::ReadJson,
            NodeType::WriteJson,
            NodeType::ReadExcel,
            NodeType::WriteExcel,
            NodeType::Remapper,
            NodeType::Extract,
            NodeType::Transform,
            NodeType::Filter,
            NodeType::Router,
            NodeType::Sort,
            NodeType::Dedupe,
            NodeType::Union,
            NodeType::Pivot,
            NodeType::Unpivot,
            NodeType::Join,
            NodeType::Aggregate,
            NodeType::LookupTable,
            NodeType::Validate,
            NodeType::Profile,
            NodeType::Impute,
            NodeType::Normalize,
            NodeType::Outlier,
            NodeType::Text,
            NodeType::Date,
            NodeType::ApiEnrich,
            NodeType::Query,
            NodeType::Delay,
            NodeType::Cache,
        ];
        for nt in all {
            assert_eq!(NodeType::from_str(nt.as_str()), Ok(nt));
        }
    }

    #[test]
    fn unknown_type_rejected() {
        assert!(NodeType::from_str("bogus").is_err());
    }

    #[test]
    fn only_source_and_output_are_retry_bearing() {
        assert!(NodeType::FolderSource.is_retry_bearing());
        assert!(NodeType::Output.is_retry_bearing());
        assert!(!NodeType::Filter.is_retry_bearing());
    }
}

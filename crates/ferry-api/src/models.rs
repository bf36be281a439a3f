//! Request and response bodies exchanged with the browser UI.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// RFC9457-compatible problem document surfaced on request errors.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProblemDetails {
    /// Problem type reference.
    #[serde(rename = "type")]
    pub kind: String,
    /// Short summary of the problem type.
    pub title: String,
    /// HTTP status code.
    pub status: u16,
    /// Occurrence-specific explanation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Current listing plus any per-item failures from the last operation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DataResponse {
    /// One record per failed item; empty for pure reads.
    pub operation_results: Vec<OperationResult>,
    /// Set when either listing could not be read.
    pub listing_errors: bool,
    /// Entries of every source root, keyed by root path.
    pub source_contents: BTreeMap<String, Vec<String>>,
    /// Destination subdirectories.
    pub destinations: Vec<String>,
}

/// Failure record for a single item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OperationResult {
    /// `<source root>/<item>` as requested.
    pub src: String,
    /// Destination subdirectory as requested.
    pub dest: String,
    /// Operation label, e.g. `move`.
    pub operation: String,
    /// Failure description.
    pub message: String,
}

/// Body of `POST /move`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MoveRequest {
    /// Source root the items live in.
    #[serde(default)]
    pub src: String,
    /// Item names, processed in order.
    #[serde(default)]
    pub items: Vec<String>,
    /// Destination subdirectory.
    #[serde(default)]
    pub dest: String,
}

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Possible errors when building requests or evaluating list filters
#[derive(Error, Debug)]
pub enum Error {
    /// Request parameters failed local validation
    #[error("request validation failed: {0}")]
    Validation(String),

    /// A namespace was supplied for a cluster-scoped model
    #[error("{kind} is cluster-scoped and cannot be addressed within namespace {namespace:?}")]
    NamespacedClusterResource {
        /// Kind of the model
        kind: String,
        /// The namespace that was supplied
        namespace: String,
    },

    /// A label selector string could not be parsed
    #[error("invalid label selector: {0}")]
    InvalidSelector(String),

    /// Failed to serialize a request body
    #[error("failed to serialize body: {0}")]
    SerializeBody(#[source] serde_json::Error),

    /// Failed to assemble the http request
    #[error("failed to build request: {0}")]
    BuildRequest(#[source] http::Error),

    /// A JSON patch could not be applied locally
    #[error("failed to apply json patch: {0}")]
    Patch(#[source] json_patch::PatchError),
}

/// An error response from the API.
#[derive(Error, Deserialize, Serialize, Debug, Clone, Eq, PartialEq)]
#[error("{message}: {reason}")]
pub struct ErrorResponse {
    /// The status
    pub status: String,
    /// A message about the error
    #[serde(default)]
    pub message: String,
    /// The reason for the error
    #[serde(default)]
    pub reason: String,
    /// The error code
    pub code: u16,
    /// Extended data associated with the reason.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<StatusDetails>,
}

/// StatusDetails is a set of additional properties that MAY be set by the server
/// to provide additional information about a response.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusDetails {
    /// The Causes array includes more details associated with the StatusReason failure.
    pub causes: Option<Vec<StatusCause>>,
    /// The group attribute of the resource associated with the status StatusReason.
    pub group: Option<String>,
    /// The kind attribute of the resource associated with the status StatusReason.
    pub kind: Option<String>,
    /// The name attribute of the resource associated with the status StatusReason.
    pub name: Option<String>,
    /// If specified, the time in seconds before the operation should be retried.
    pub retry_after_seconds: Option<i32>,
    /// UID of the resource.
    pub uid: Option<String>,
}

/// StatusCause provides more information about an api.Status failure.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCause {
    /// The field of the resource that has caused this error, as named by its JSON serialization.
    pub field: Option<String>,
    /// A human-readable description of the cause of the error.
    pub message: Option<String>,
    /// A machine-readable description of the cause of the error.
    pub reason: Option<String>,
}

impl ErrorResponse {
    /// Whether the server reported the object as missing
    pub fn is_not_found(&self) -> bool {
        self.code == 404 || self.reason == "NotFound"
    }

    /// Whether the server rejected the write because of a stale resourceVersion
    pub fn is_conflict(&self) -> bool {
        self.code == 409 || self.reason == "Conflict"
    }
}

//! JSON-Patch documents as the console builds them
//!
//! A patch list may contain empty slots: any falsy JSON value in the console's
//! arrays (`null`, `false`, `0`, `""`). These are dropped before sending, and a
//! list with nothing left is a no-op.
use crate::{Error, Result};
use serde::{de::Error as _, Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Content type of a JSON-Patch request body
pub const JSON_PATCH_CONTENT_TYPE: &str = "application/json-patch+json";

/// The operation of a single patch entry
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatchOp {
    /// Add a value
    Add,
    /// Remove the value at `path`
    Remove,
    /// Replace the value at `path`
    Replace,
    /// Move the value at `from` to `path`
    Move,
    /// Copy the value at `from` to `path`
    Copy,
    /// Check the value at `path`
    Test,
}

/// One RFC 6902 operation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PatchOperation {
    /// The operation
    pub op: PatchOp,
    /// JSON pointer to the target location
    pub path: String,
    /// Value for `add`, `replace` and `test`
    ///
    /// A present `null` is kept as `Some(Value::Null)`.
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "allow_null")]
    pub value: Option<Value>,
    /// Source location for `move` and `copy`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
}

fn allow_null<'de, D>(de: D) -> std::result::Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(de).map(Option::Some)
}

impl PatchOperation {
    fn new(op: PatchOp, path: &str) -> Self {
        Self {
            op,
            path: path.to_string(),
            value: None,
            from: None,
        }
    }

    /// An `add` operation
    pub fn add(path: &str, value: Value) -> Self {
        Self {
            value: Some(value),
            ..Self::new(PatchOp::Add, path)
        }
    }

    /// A `replace` operation
    pub fn replace(path: &str, value: Value) -> Self {
        Self {
            value: Some(value),
            ..Self::new(PatchOp::Replace, path)
        }
    }

    /// A `remove` operation
    pub fn remove(path: &str) -> Self {
        Self::new(PatchOp::Remove, path)
    }

    /// A `test` operation
    pub fn test(path: &str, value: Value) -> Self {
        Self {
            value: Some(value),
            ..Self::new(PatchOp::Test, path)
        }
    }

    /// A `move` operation
    pub fn move_from(from: &str, path: &str) -> Self {
        Self {
            from: Some(from.to_string()),
            ..Self::new(PatchOp::Move, path)
        }
    }

    /// A `copy` operation
    pub fn copy_from(from: &str, path: &str) -> Self {
        Self {
            from: Some(from.to_string()),
            ..Self::new(PatchOp::Copy, path)
        }
    }
}

/// An ordered list of patch entries, some of which may be empty
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Patch(pub Vec<Option<PatchOperation>>);

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

impl<'de> Deserialize<'de> for Patch {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // entries like `cond && {...}` leave falsy slots behind
        Vec::<Value>::deserialize(deserializer)?
            .into_iter()
            .map(|entry| {
                if is_falsy(&entry) {
                    Ok(None)
                } else {
                    PatchOperation::deserialize(entry).map(Some).map_err(D::Error::custom)
                }
            })
            .collect::<std::result::Result<_, _>>()
            .map(Patch)
    }
}

impl Patch {
    /// The operations that remain after dropping empty entries, in order
    pub fn compact(&self) -> Vec<&PatchOperation> {
        self.0.iter().flatten().collect()
    }

    /// Whether sending this patch would change nothing
    pub fn is_noop(&self) -> bool {
        self.0.iter().all(Option::is_none)
    }

    /// The request body: a JSON array of the remaining operations
    pub fn to_body(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(&self.compact()).map_err(Error::SerializeBody)
    }

    /// Convert into the `json-patch` crate's representation
    ///
    /// Fails when an operation is missing its `value` or `from`, or when a path is not a JSON pointer.
    pub fn to_json_patch(&self) -> Result<json_patch::Patch> {
        let raw = serde_json::to_value(self.compact()).map_err(Error::SerializeBody)?;
        serde_json::from_value(raw).map_err(|e| Error::Validation(format!("invalid json patch: {e}")))
    }

    /// Apply the patch to a local copy of `doc`
    pub fn preview(&self, doc: &Value) -> Result<Value> {
        let patch = self.to_json_patch()?;
        let mut doc = doc.clone();
        json_patch::patch(&mut doc, &patch.0).map_err(Error::Patch)?;
        Ok(doc)
    }
}

impl FromIterator<PatchOperation> for Patch {
    fn from_iter<T: IntoIterator<Item = PatchOperation>>(iter: T) -> Self {
        Self(iter.into_iter().map(Some).collect())
    }
}

impl From<Vec<PatchOperation>> for Patch {
    fn from(ops: Vec<PatchOperation>) -> Self {
        ops.into_iter().collect()
    }
}

//! Metadata structs used in traits, lists, and resource objects.
use crate::model::K8sModel;
pub use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ListMeta, ObjectMeta};
use serde::{Deserialize, Serialize};

/// Type information that is flattened into every kubernetes object
#[derive(Deserialize, Serialize, Clone, Default, Debug, Eq, PartialEq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct TypeMeta {
    /// The version of the API
    pub api_version: String,

    /// The name of the API
    pub kind: String,
}

impl TypeMeta {
    /// Type information of an instance of `model`
    pub fn for_model(model: &K8sModel) -> Self {
        Self {
            api_version: model.group_version(),
            kind: model.kind.clone(),
        }
    }
}

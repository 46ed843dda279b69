//! Static descriptions of the resource kinds the console talks to
use crate::params::PropagationPolicy;
use serde::{Deserialize, Serialize};
use std::any::TypeId;

/// Describes a Kubernetes resource kind well enough to address it over REST
///
/// Deserializes from the console's camelCase model shape; display-only fields
/// such as `label` or `abbr` are ignored.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct K8sModel {
    /// Singular PascalCase name of the resource
    pub kind: String,
    /// Resource group, empty (or `core`) for the legacy core group
    #[serde(default)]
    pub api_group: String,
    /// Version within the group
    pub api_version: String,
    /// Plural name of the resource, used as its url segment
    pub plural: String,
    /// Whether instances live inside a namespace
    #[serde(default)]
    pub namespaced: bool,
    /// Garbage collection policy sent when deleting instances
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub propagation_policy: Option<PropagationPolicy>,
    /// Whether the kind is backed by a CustomResourceDefinition
    #[serde(default)]
    pub crd: bool,
}

impl K8sModel {
    /// A namespaced kind
    pub fn namespaced(group: &str, version: &str, kind: &str, plural: &str) -> Self {
        Self::new(group, version, kind, plural, true)
    }

    /// A cluster-scoped kind
    pub fn cluster(group: &str, version: &str, kind: &str, plural: &str) -> Self {
        Self::new(group, version, kind, plural, false)
    }

    fn new(group: &str, version: &str, kind: &str, plural: &str, namespaced: bool) -> Self {
        Self {
            kind: kind.to_string(),
            api_group: group.to_string(),
            api_version: version.to_string(),
            plural: plural.to_string(),
            namespaced,
            propagation_policy: None,
            crd: false,
        }
    }

    /// Describe a generated `k8s-openapi` type
    ///
    /// ```
    /// use console_k8s_core::K8sModel;
    /// use k8s_openapi::api::apps::v1::Deployment;
    /// let model = K8sModel::of::<Deployment>();
    /// assert_eq!(model.reference(), "apps~v1~Deployment");
    /// assert!(model.namespaced);
    /// ```
    pub fn of<K>() -> Self
    where
        K: k8s_openapi::Resource,
        K::Scope: 'static,
    {
        let namespaced = TypeId::of::<K::Scope>() == TypeId::of::<k8s_openapi::NamespaceResourceScope>();
        Self::new(K::GROUP, K::VERSION, K::KIND, K::URL_PATH_SEGMENT, namespaced)
    }

    /// Set the propagation policy used on delete
    #[must_use]
    pub fn with_propagation_policy(mut self, policy: PropagationPolicy) -> Self {
        self.propagation_policy = Some(policy);
        self
    }

    /// Mark the kind as a custom resource
    #[must_use]
    pub fn crd(mut self) -> Self {
        self.crd = true;
        self
    }

    /// Whether the kind belongs to the legacy core group
    pub fn is_core_group(&self) -> bool {
        self.api_group.is_empty() || self.api_group == "core"
    }

    /// The group name, empty for the core group
    pub fn group(&self) -> &str {
        if self.is_core_group() {
            ""
        } else {
            &self.api_group
        }
    }

    /// The `apiVersion` of instances: `v1` for the core group, `group/version` otherwise
    pub fn group_version(&self) -> String {
        if self.is_core_group() {
            self.api_version.clone()
        } else {
            format!("{}/{}", self.api_group, self.api_version)
        }
    }

    /// Stable identity of the kind, `group~version~kind`
    pub fn reference(&self) -> String {
        let group = if self.is_core_group() { "core" } else { &self.api_group };
        format!("{}~{}~{}", group, self.api_version, self.kind)
    }

    /// Root path of the group version
    pub fn api_path(&self) -> String {
        if self.is_core_group() {
            format!("/api/{}", self.api_version)
        } else {
            format!("/apis/{}/{}", self.api_group, self.api_version)
        }
    }
}

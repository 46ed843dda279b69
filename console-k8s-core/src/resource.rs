pub use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
use std::collections::BTreeMap;

/// An accessor trait for anything carrying [`ObjectMeta`]
///
/// The verbs read `.metadata.name` and `.metadata.namespace` through this trait
/// to address an existing object. Implemented for every `k8s-openapi` resource
/// and for [`ResourceObject`](crate::object::ResourceObject).
pub trait Resource {
    /// Metadata that all persisted resources must have
    fn meta(&self) -> &ObjectMeta;
    /// Metadata that all persisted resources must have
    fn meta_mut(&mut self) -> &mut ObjectMeta;
}

/// Implement accessor trait for any ObjectMeta-using Kubernetes Resource
impl<K> Resource for K
where
    K: k8s_openapi::Metadata<Ty = ObjectMeta>,
{
    fn meta(&self) -> &ObjectMeta {
        self.metadata()
    }

    fn meta_mut(&mut self) -> &mut ObjectMeta {
        self.metadata_mut()
    }
}

/// Helper methods for resources.
pub trait ResourceExt: Resource {
    /// Returns the most useful name identifier available
    ///
    /// Tries `name`, then `generateName`, and falls back on an empty string.
    fn name_any(&self) -> String;
    /// The name, if set and non-empty
    fn name(&self) -> Option<&str>;
    /// The namespace the resource is in, if set and non-empty
    fn namespace(&self) -> Option<&str>;
    /// The resource version
    fn resource_version(&self) -> Option<String>;
    /// Unique ID
    fn uid(&self) -> Option<String>;
    /// Returns the creation timestamp
    fn creation_timestamp(&self) -> Option<Time>;
    /// Returns resource labels
    fn labels(&self) -> &BTreeMap<String, String>;
    /// Provides mutable access to the labels
    fn labels_mut(&mut self) -> &mut BTreeMap<String, String>;
    /// Returns resource annotations
    fn annotations(&self) -> &BTreeMap<String, String>;
}

static EMPTY_MAP: BTreeMap<String, String> = BTreeMap::new();

impl<K: Resource> ResourceExt for K {
    fn name_any(&self) -> String {
        self.meta()
            .name
            .clone()
            .or_else(|| self.meta().generate_name.clone())
            .unwrap_or_default()
    }

    fn name(&self) -> Option<&str> {
        self.meta().name.as_deref().filter(|n| !n.is_empty())
    }

    fn namespace(&self) -> Option<&str> {
        self.meta().namespace.as_deref().filter(|n| !n.is_empty())
    }

    fn resource_version(&self) -> Option<String> {
        self.meta().resource_version.clone()
    }

    fn uid(&self) -> Option<String> {
        self.meta().uid.clone()
    }

    fn creation_timestamp(&self) -> Option<Time> {
        self.meta().creation_timestamp.clone()
    }

    fn labels(&self) -> &BTreeMap<String, String> {
        self.meta().labels.as_ref().unwrap_or(&EMPTY_MAP)
    }

    fn labels_mut(&mut self) -> &mut BTreeMap<String, String> {
        self.meta_mut().labels.get_or_insert_with(BTreeMap::new)
    }

    fn annotations(&self) -> &BTreeMap<String, String> {
        self.meta().annotations.as_ref().unwrap_or(&EMPTY_MAP)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::core::v1::ConfigMap;

    #[test]
    fn accessors_on_openapi_types() {
        let mut cm = ConfigMap {
            metadata: ObjectMeta {
                generate_name: Some("settings-".into()),
                namespace: Some("".into()),
                ..ObjectMeta::default()
            },
            ..ConfigMap::default()
        };
        assert_eq!(cm.name(), None);
        assert_eq!(cm.name_any(), "settings-");
        assert_eq!(cm.namespace(), None);
        assert!(cm.labels().is_empty());
        cm.labels_mut().insert("app".into(), "web".into());
        assert_eq!(cm.labels().get("app").map(String::as_str), Some("web"));
    }
}

//! Generic objects and list envelopes, and list flattening.
use crate::{
    metadata::{ListMeta, ObjectMeta, TypeMeta},
    model::K8sModel,
    resource::Resource,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

/// A Kubernetes list envelope
///
/// `{apiVersion, kind, metadata, items}` as returned by a collection GET.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ObjectList<T> {
    /// apiVersion of the list, shared by its items
    #[serde(default)]
    pub api_version: String,

    /// Kind of the list, e.g. `PodList`
    #[serde(default)]
    pub kind: String,

    /// ListMeta, carrying `resourceVersion` and the `continue` token
    #[serde(default)]
    pub metadata: ListMeta,

    /// The items we are actually interested in.
    #[serde(bound(deserialize = "Vec<T>: Deserialize<'de>"))]
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

impl<T> ObjectList<T> {
    /// `iter` returns an Iterator over the elements of this ObjectList
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    /// `iter_mut` returns an Iterator of mutable references to the elements of this ObjectList
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.items.iter_mut()
    }

    /// The token to fetch the next page, if the server truncated the list
    pub fn continue_token(&self) -> Option<&str> {
        self.metadata.continue_.as_deref().filter(|t| !t.is_empty())
    }
}

impl<T> IntoIterator for ObjectList<T> {
    type IntoIter = ::std::vec::IntoIter<Self::Item>;
    type Item = T;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a ObjectList<T> {
    type IntoIter = ::std::slice::Iter<'a, T>;
    type Item = &'a T;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl ObjectList<Value> {
    /// Stamp `kind` and `apiVersion` onto every item
    ///
    /// `kind` comes from the model and `apiVersion` from the envelope
    /// (or the model when the envelope has none). Values already present on
    /// an item are overwritten. Items that are not JSON objects are left alone.
    pub fn stamp(&mut self, model: &K8sModel) {
        if self.api_version.is_empty() {
            self.api_version = model.group_version();
        }
        for item in &mut self.items {
            if let Value::Object(fields) = item {
                fields.insert("kind".into(), Value::String(model.kind.clone()));
                fields.insert("apiVersion".into(), Value::String(self.api_version.clone()));
            }
        }
    }

    /// Stamp the items and convert them into `K`, keeping the envelope
    pub fn into_typed<K: DeserializeOwned>(mut self, model: &K8sModel) -> Result<ObjectList<K>, serde_json::Error> {
        self.stamp(model);
        let items = self
            .items
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<K>, _>>()?;
        Ok(ObjectList {
            api_version: self.api_version,
            kind: self.kind,
            metadata: self.metadata,
            items,
        })
    }

    /// Stamp the items and return them as a plain typed vector
    pub fn flatten<K: DeserializeOwned>(self, model: &K8sModel) -> Result<Vec<K>, serde_json::Error> {
        self.into_typed(model).map(|list| list.items)
    }
}

/// A dynamic representation of a kubernetes object
///
/// This works with any non-list object, whether or not its kind is known at compile time.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ResourceObject {
    /// The type fields, not always present
    #[serde(flatten, default)]
    pub types: Option<TypeMeta>,
    /// Object metadata
    #[serde(default)]
    pub metadata: ObjectMeta,

    /// All other keys, e.g. `spec` and `status`
    #[serde(flatten)]
    pub data: Value,
}

impl ResourceObject {
    /// Create a ResourceObject with type information set from a model
    #[must_use]
    pub fn new(name: &str, model: &K8sModel) -> Self {
        Self {
            types: Some(TypeMeta::for_model(model)),
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                ..Default::default()
            },
            data: Value::Object(Default::default()),
        }
    }

    /// Attach dynamic data to a ResourceObject
    #[must_use]
    pub fn data(mut self, data: Value) -> Self {
        self.data = data;
        self
    }

    /// Attach a namespace to a ResourceObject
    #[must_use]
    pub fn within(mut self, ns: &str) -> Self {
        self.metadata.namespace = Some(ns.into());
        self
    }

    /// Attempt to convert this `ResourceObject` into a concrete type
    pub fn try_parse<K: DeserializeOwned>(self) -> Result<K, serde_json::Error> {
        serde_json::from_value(serde_json::to_value(self)?)
    }
}

impl Resource for ResourceObject {
    fn meta(&self) -> &ObjectMeta {
        &self.metadata
    }

    fn meta_mut(&mut self) -> &mut ObjectMeta {
        &mut self.metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ResourceExt;
    use assert_json_diff::assert_json_eq;
    use k8s_openapi::api::core::v1::Pod;
    use serde_json::json;

    fn pods() -> K8sModel {
        K8sModel::namespaced("", "v1", "Pod", "pods")
    }

    fn pod_list() -> ObjectList<Value> {
        serde_json::from_value(json!({
            "apiVersion": "v1",
            "kind": "PodList",
            "metadata": {"resourceVersion": "17", "continue": "next"},
            "items": [
                {"metadata": {"name": "a", "namespace": "ns"}},
                {"kind": "Stale", "apiVersion": "v0", "metadata": {"name": "b", "namespace": "ns"}}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn stamping_overrides_item_types() {
        let mut list = pod_list();
        list.stamp(&pods());
        for item in &list {
            assert_eq!(item["kind"], "Pod");
            assert_eq!(item["apiVersion"], "v1");
        }
        assert_eq!(list.continue_token(), Some("next"));
    }

    #[test]
    fn flatten_into_openapi_types() {
        let items: Vec<Pod> = pod_list().flatten(&pods()).unwrap();
        let names: Vec<_> = items.iter().map(|p| p.name_any()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn envelope_without_version_uses_model() {
        let deployments = K8sModel::namespaced("apps", "v1", "Deployment", "deployments");
        let list: ObjectList<Value> = serde_json::from_value(json!({"items": [{"metadata": {"name": "web"}}]})).unwrap();
        let typed: ObjectList<ResourceObject> = list.into_typed(&deployments).unwrap();
        assert_eq!(typed.api_version, "apps/v1");
        let types = typed.items[0].types.clone().unwrap();
        assert_eq!(types, TypeMeta::for_model(&deployments));
    }

    #[test]
    fn resource_object_keeps_unknown_fields() {
        let obj = ResourceObject::new("web", &pods())
            .within("prod")
            .data(json!({"spec": {"containers": [{"name": "app", "image": "nginx"}]}}));
        assert_json_eq!(
            serde_json::to_value(&obj).unwrap(),
            json!({
                "apiVersion": "v1",
                "kind": "Pod",
                "metadata": {"name": "web", "namespace": "prod"},
                "spec": {"containers": [{"name": "app", "image": "nginx"}]}
            })
        );
        let pod: Pod = obj.try_parse().unwrap();
        assert_eq!(pod.spec.unwrap().containers[0].image.as_deref(), Some("nginx"));
    }
}

//! Query and body parameters for the resource verbs
use crate::{model::K8sModel, selector::Selector};
use serde::{de, Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Garbage collection mode applied to the dependents of a deleted object
///
/// See <https://kubernetes.io/docs/concepts/architecture/garbage-collection/>.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum PropagationPolicy {
    /// Orphan dependents
    Orphan,
    /// Allow the garbage collector to delete the dependents in the background
    Background,
    /// A cascading policy that deletes all dependents in the foreground
    Foreground,
}

/// Conditions that must be fulfilled before a deletion is carried out
///
/// If not possible, a `409 Conflict` status will be returned.
#[derive(Default, Clone, Serialize, Deserialize, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Preconditions {
    /// Specifies the target ResourceVersion
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_version: Option<String>,
    /// Specifies the target UID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
}

/// The `DeleteOptions` body sent along with a delete call
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeleteOptions {
    /// Always `DeleteOptions`
    pub kind: String,
    /// Always `v1`
    pub api_version: String,
    /// Whether and how garbage collection will be performed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub propagation_policy: Option<PropagationPolicy>,
    /// The duration in seconds before the object should be deleted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grace_period_seconds: Option<u32>,
    /// Conditions that must be fulfilled before the deletion happens
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preconditions: Option<Preconditions>,
}

impl Default for DeleteOptions {
    fn default() -> Self {
        Self {
            kind: "DeleteOptions".into(),
            api_version: "v1".into(),
            propagation_policy: None,
            grace_period_seconds: None,
            preconditions: None,
        }
    }
}

impl DeleteOptions {
    /// Construct `DeleteOptions` carrying a propagation policy
    pub fn with_policy(policy: PropagationPolicy) -> Self {
        Self {
            propagation_policy: Some(policy),
            ..Self::default()
        }
    }

    /// The body implied by a model's configured propagation policy, if it has one
    pub fn for_model(model: &K8sModel) -> Option<Self> {
        model.propagation_policy.map(Self::with_policy)
    }

    /// Set the grace period in seconds
    #[must_use]
    pub fn grace_period(mut self, secs: u32) -> Self {
        self.grace_period_seconds = Some(secs);
        self
    }

    /// Set preconditions for the delete
    #[must_use]
    pub fn preconditions(mut self, preconditions: Preconditions) -> Self {
        self.preconditions = Some(preconditions);
        self
    }
}

/// Extra query parameters appended to a resource url
///
/// Keys are kept sorted so identical parameter sets always encode the same way.
/// Scalar JSON values are accepted when deserializing and stored in their string form.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub struct QueryParams(BTreeMap<String, String>);

impl QueryParams {
    /// Whether no parameters are set
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Insert or overwrite a parameter
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Look up a parameter
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Remove a parameter, returning its value
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.remove(key)
    }

    /// Iterate over the parameters in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub(crate) fn populate_qp(&self, qp: &mut form_urlencoded::Serializer<String>) {
        for (k, v) in self.iter() {
            qp.append_pair(k, v);
        }
    }

    /// Encode as an `application/x-www-form-urlencoded` query string
    pub fn encode(&self) -> String {
        let mut qp = form_urlencoded::Serializer::new(String::new());
        self.populate_qp(&mut qp);
        qp.finish()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for QueryParams {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl<'de> Deserialize<'de> for QueryParams {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<String, serde_json::Value>::deserialize(deserializer)?;
        let mut params = BTreeMap::new();
        for (key, value) in raw {
            let value = match value {
                serde_json::Value::Null => continue,
                serde_json::Value::String(s) => s,
                serde_json::Value::Bool(b) => b.to_string(),
                serde_json::Value::Number(n) => n.to_string(),
                other => serde_json::to_string(&other).map_err(de::Error::custom)?,
            };
            params.insert(key, value);
        }
        Ok(Self(params))
    }
}

/// Query parameters of a list call
///
/// `ns` selects the namespace of the collection url and is never sent as a query parameter.
/// The label selector is kept structured and serialized with [`Selector::to_selector_string`].
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    /// Namespace of the collection, all namespaces when unset
    #[serde(default)]
    pub ns: Option<String>,

    /// A selector to restrict the list of returned objects by their labels.
    #[serde(default)]
    pub label_selector: Option<Selector>,

    /// A selector to restrict the list of returned objects by their fields.
    #[serde(default)]
    pub field_selector: Option<String>,

    /// Limit the number of results.
    ///
    /// If there are more results, the server will respond with a continue token.
    #[serde(default)]
    pub limit: Option<u32>,

    /// Fetch a further page of results.
    #[serde(default, rename = "continue")]
    pub continue_token: Option<String>,

    /// Any other query parameter, passed through verbatim
    #[serde(flatten)]
    pub extra: QueryParams,
}

impl ListParams {
    pub(crate) fn populate_qp(&self, qp: &mut form_urlencoded::Serializer<String>) {
        if let Some(selector) = &self.label_selector {
            qp.append_pair("labelSelector", &selector.to_selector_string());
        }
        if let Some(fields) = &self.field_selector {
            qp.append_pair("fieldSelector", fields);
        }
        if let Some(limit) = &self.limit {
            qp.append_pair("limit", &limit.to_string());
        }
        if let Some(continue_token) = &self.continue_token {
            qp.append_pair("continue", continue_token);
        }
        self.extra.populate_qp(qp);
    }

    /// Whether any query parameter would be sent
    pub fn has_query(&self) -> bool {
        self.label_selector.is_some()
            || self.field_selector.is_some()
            || self.limit.is_some()
            || self.continue_token.is_some()
            || !self.extra.is_empty()
    }
}

/// Builder interface to ListParams
///
/// Usage:
/// ```
/// use console_k8s_core::params::ListParams;
/// let lp = ListParams::default()
///     .within("default")
///     .labels("app=blog".parse().unwrap())
///     .limit(50);
/// ```
impl ListParams {
    /// List within a namespace
    #[must_use]
    pub fn within(mut self, ns: &str) -> Self {
        self.ns = Some(ns.to_string());
        self
    }

    /// Configure the selector to restrict the list of returned objects by their labels.
    #[must_use]
    pub fn labels(mut self, selector: Selector) -> Self {
        self.label_selector = Some(selector);
        self
    }

    /// Configure the selector to restrict the list of returned objects by their fields.
    #[must_use]
    pub fn fields(mut self, field_selector: &str) -> Self {
        self.field_selector = Some(field_selector.to_string());
        self
    }

    /// Sets a result limit.
    #[must_use]
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Sets a continue token.
    #[must_use]
    pub fn continue_token(mut self, token: &str) -> Self {
        self.continue_token = Some(token.to_string());
        self
    }

    /// Adds an arbitrary query parameter
    #[must_use]
    pub fn param(mut self, key: &str, value: &str) -> Self {
        self.extra.insert(key, value);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::K8sModel;
    use assert_json_diff::assert_json_eq;
    use serde_json::json;

    #[test]
    fn delete_options_from_model_policy() {
        let model = K8sModel::namespaced("apps", "v1", "Deployment", "deployments")
            .with_propagation_policy(PropagationPolicy::Foreground);
        let body = DeleteOptions::for_model(&model).unwrap();
        assert_json_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({"kind": "DeleteOptions", "apiVersion": "v1", "propagationPolicy": "Foreground"})
        );

        let plain = K8sModel::namespaced("", "v1", "ConfigMap", "configmaps");
        assert!(DeleteOptions::for_model(&plain).is_none());
    }

    #[test]
    fn query_params_stringify_scalars() {
        let qp: QueryParams =
            serde_json::from_value(json!({"limit": 10, "watch": true, "fieldSelector": "a=b", "skip": null}))
                .unwrap();
        assert_eq!(qp.get("limit"), Some("10"));
        assert_eq!(qp.get("watch"), Some("true"));
        assert_eq!(qp.get("skip"), None);
        assert_eq!(qp.encode(), "fieldSelector=a%3Db&limit=10&watch=true");
    }

    #[test]
    fn list_params_from_console_shape() {
        let lp: ListParams = serde_json::from_value(json!({
            "ns": "openshift",
            "labelSelector": {"matchLabels": {"app": "web"}},
            "limit": 250,
            "resourceVersion": "0",
        }))
        .unwrap();
        assert_eq!(lp.ns.as_deref(), Some("openshift"));
        assert_eq!(lp.limit, Some(250));
        assert_eq!(lp.extra.get("resourceVersion"), Some("0"));
        assert_eq!(lp.label_selector.unwrap().to_selector_string(), "app=web");
    }

    #[test]
    fn list_params_query_order() {
        let lp = ListParams::default()
            .labels("tier in (db,web)".parse().unwrap())
            .fields("status.phase=Running")
            .limit(5)
            .continue_token("abc");
        let mut qp = form_urlencoded::Serializer::new(String::new());
        lp.populate_qp(&mut qp);
        assert_eq!(
            qp.finish(),
            "labelSelector=tier+in+%28db%2Cweb%29&fieldSelector=status.phase%3DRunning&limit=5&continue=abc"
        );
    }
}

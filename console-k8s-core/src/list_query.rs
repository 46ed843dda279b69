//! Per-resource list queries of list pages
//!
//! A list page watches one or more resources. Each is described by a
//! [`ResourceRequest`], resolved against the page namespace and turned into a
//! [`ListQuery`] whose [`query_id`](ListQuery::query_id) keys its results.
use crate::{model::K8sModel, params::ListParams, selector::Selector, Error, Result};
use serde::{Deserialize, Serialize};

/// Separator between the model reference and the query in a query id
pub const QUERY_ID_SEPARATOR: &str = "---";

/// The query a list page issues for one resource
///
/// Serializes in a fixed field order so equal queries produce equal ids.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    /// Label selector
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label_selector: Option<Selector>,
    /// Namespace, all namespaces when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ns: Option<String>,
    /// Field selector, including the name restriction
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_selector: Option<String>,
    /// Page size
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

impl ListQuery {
    /// Build a query, dropping empty parts
    ///
    /// A `name` restricts the query with a `metadata.name=<name>` field
    /// selector, appended to any other field selector.
    pub fn new(
        ns: Option<&str>,
        selector: Option<&Selector>,
        field_selector: Option<&str>,
        name: Option<&str>,
        limit: Option<u32>,
    ) -> Self {
        let field_selector = field_selector.filter(|f| !f.is_empty());
        let field_selector = match name.filter(|n| !n.is_empty()) {
            Some(name) => Some(match field_selector {
                Some(fields) => format!("{fields},metadata.name={name}"),
                None => format!("metadata.name={name}"),
            }),
            None => field_selector.map(String::from),
        };
        Self {
            label_selector: selector.filter(|s| !s.selects_all()).cloned(),
            ns: ns.filter(|n| !n.is_empty()).map(String::from),
            field_selector,
            limit: limit.filter(|l| *l > 0),
        }
    }

    /// Whether the query restricts nothing
    pub fn is_empty(&self) -> bool {
        self.label_selector.is_none() && self.ns.is_none() && self.field_selector.is_none() && self.limit.is_none()
    }

    /// Stable key for the results of this query on `model`
    ///
    /// `<reference>` for an empty query, `<reference>---<query as json>` otherwise.
    pub fn query_id(&self, model: &K8sModel) -> String {
        let reference = model.reference();
        if self.is_empty() {
            return reference;
        }
        match serde_json::to_string(self) {
            Ok(json) => format!("{reference}{QUERY_ID_SEPARATOR}{json}"),
            Err(_) => reference,
        }
    }

    /// The list parameters implementing this query
    pub fn list_params(&self) -> ListParams {
        ListParams {
            ns: self.ns.clone(),
            label_selector: self.label_selector.clone(),
            field_selector: self.field_selector.clone(),
            limit: self.limit,
            ..ListParams::default()
        }
    }
}

/// One resource of a multi-resource list page
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRequest {
    /// The model to fetch
    pub kind: K8sModel,
    /// Namespace of the resource
    #[serde(default)]
    pub namespace: Option<String>,
    /// Whether the resource follows the page namespace instead of `namespace`
    #[serde(default)]
    pub namespaced: bool,
    /// Label selector
    #[serde(default)]
    pub selector: Option<Selector>,
    /// Field selector
    #[serde(default)]
    pub field_selector: Option<String>,
    /// Restrict to a single object name
    #[serde(default)]
    pub name: Option<String>,
    /// Page size
    #[serde(default)]
    pub limit: Option<u32>,
    /// Whether to list the collection, or get a single object by name
    #[serde(default = "default_is_list")]
    pub is_list: bool,
    /// Whether a failure to fetch this resource is tolerated
    #[serde(default)]
    pub optional: bool,
    /// Key of the results, the model kind once resolved
    #[serde(default)]
    pub prop: String,
}

fn default_is_list() -> bool {
    true
}

impl ResourceRequest {
    /// List all objects of a model
    ///
    /// Namespaced models follow the page namespace until [`ResourceRequest::within`] pins one.
    pub fn new(kind: K8sModel) -> Self {
        let prop = kind.kind.clone();
        Self {
            namespaced: kind.namespaced,
            kind,
            namespace: None,
            selector: None,
            field_selector: None,
            name: None,
            limit: None,
            is_list: true,
            optional: false,
            prop,
        }
    }

    /// Fetch a single named object instead of a list
    #[must_use]
    pub fn single(mut self, name: &str) -> Self {
        self.name = Some(name.into());
        self.is_list = false;
        self
    }

    /// Restrict by label selector
    #[must_use]
    pub fn selector(mut self, selector: Selector) -> Self {
        self.selector = Some(selector);
        self
    }

    /// Restrict by field selector
    #[must_use]
    pub fn fields(mut self, field_selector: &str) -> Self {
        self.field_selector = Some(field_selector.into());
        self
    }

    /// Pin the namespace, ignoring the page namespace
    #[must_use]
    pub fn within(mut self, ns: &str) -> Self {
        self.namespace = Some(ns.into());
        self.namespaced = false;
        self
    }

    /// Tolerate failures fetching this resource
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Resolve against the namespace of the page
    ///
    /// Requests flagged `namespaced` take the page namespace, others keep
    /// their own. The result is keyed by the model kind. A cluster-scoped model
    /// left with a namespace cannot be shown and is an error.
    pub fn resolve(mut self, page_namespace: Option<&str>) -> Result<Self> {
        if self.namespaced {
            self.namespace = page_namespace.filter(|n| !n.is_empty()).map(String::from);
        }
        if !self.kind.namespaced {
            if let Some(ns) = self.namespace.as_deref().filter(|n| !n.is_empty()) {
                return Err(Error::NamespacedClusterResource {
                    kind: self.kind.kind.clone(),
                    namespace: ns.to_string(),
                });
            }
        }
        self.prop = self.kind.kind.clone();
        Ok(self)
    }

    /// The list query of this resource
    pub fn query(&self) -> ListQuery {
        ListQuery::new(
            self.namespace.as_deref(),
            self.selector.as_ref(),
            self.field_selector.as_deref(),
            self.name.as_deref(),
            self.limit,
        )
    }

    /// Stable key of this resource's results
    pub fn query_id(&self) -> String {
        self.query().query_id(&self.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pods() -> K8sModel {
        K8sModel::namespaced("", "v1", "Pod", "pods")
    }

    #[test]
    fn empty_query_id_is_reference() {
        let q = ListQuery::new(Some(""), Some(&Selector::default()), None, Some(""), Some(0));
        assert!(q.is_empty());
        assert_eq!(q.query_id(&pods()), "core~v1~Pod");
    }

    #[test]
    fn query_id_is_stable() {
        let selector: Selector = "app=web".parse().unwrap();
        let a = ListQuery::new(Some("prod"), Some(&selector), None, Some("web-0"), Some(10));
        let b = ListQuery::new(Some("prod"), Some(&selector), None, Some("web-0"), Some(10));
        assert_eq!(a.query_id(&pods()), b.query_id(&pods()));
        assert_eq!(
            a.query_id(&pods()),
            r#"core~v1~Pod---{"labelSelector":"app=web","ns":"prod","fieldSelector":"metadata.name=web-0","limit":10}"#
        );
    }

    #[test]
    fn name_joins_field_selector() {
        let q = ListQuery::new(None, None, Some("status.phase=Running"), Some("db"), None);
        assert_eq!(q.field_selector.as_deref(), Some("status.phase=Running,metadata.name=db"));
        let lp = q.list_params();
        assert_eq!(lp.field_selector, q.field_selector);
        assert!(lp.ns.is_none());
    }

    #[test]
    fn resolve_uses_page_namespace() {
        let nodes = K8sModel::cluster("", "v1", "Node", "nodes");
        let pods_req = ResourceRequest::new(pods()).resolve(Some("prod")).unwrap();
        assert_eq!(pods_req.namespace.as_deref(), Some("prod"));
        let all_pods = ResourceRequest::new(pods()).resolve(None).unwrap();
        assert_eq!(all_pods.namespace, None);
        let nodes_req = ResourceRequest::new(nodes.clone()).resolve(Some("prod")).unwrap();
        assert_eq!(nodes_req.namespace, None);
        assert!(matches!(
            ResourceRequest::new(nodes).within("prod").resolve(None),
            Err(Error::NamespacedClusterResource { .. })
        ));
    }

    #[test]
    fn pinned_namespace_survives_resolve() {
        let pinned = ResourceRequest::new(pods()).within("other");
        assert!(!pinned.namespaced);
        assert_eq!(pinned.clone().resolve(None).unwrap().namespace.as_deref(), Some("other"));
        assert_eq!(pinned.resolve(Some("prod")).unwrap().namespace.as_deref(), Some("other"));
    }

    #[test]
    fn namespaced_flag_comes_from_the_entry() {
        // only an entry flagged namespaced follows the page
        let r: ResourceRequest = serde_json::from_value(json!({
            "kind": {"kind": "Pod", "apiVersion": "v1", "plural": "pods", "namespaced": true},
            "namespace": "other",
        }))
        .unwrap();
        assert!(!r.namespaced);
        assert_eq!(r.resolve(Some("prod")).unwrap().namespace.as_deref(), Some("other"));

        let r: ResourceRequest = serde_json::from_value(json!({
            "kind": {"kind": "Pod", "apiVersion": "v1", "plural": "pods", "namespaced": true},
            "namespace": "other",
            "namespaced": true,
        }))
        .unwrap();
        assert_eq!(r.resolve(Some("prod")).unwrap().namespace.as_deref(), Some("prod"));
    }

    #[test]
    fn deserializes_page_resource() {
        let r: ResourceRequest = serde_json::from_value(json!({
            "kind": {"kind": "Secret", "apiVersion": "v1", "plural": "secrets", "namespaced": true},
            "namespaced": true,
            "selector": {"matchLabels": {"app": "web"}},
            "prop": "secrets"
        }))
        .unwrap();
        assert!(r.is_list);
        let r = r.resolve(Some("ns")).unwrap();
        assert_eq!(r.prop, "Secret");
        assert_eq!(
            r.query_id(),
            r#"core~v1~Secret---{"labelSelector":"app=web","ns":"ns"}"#
        );
    }
}

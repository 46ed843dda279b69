//! REST paths for a model and a set of addressing options
use crate::{model::K8sModel, params::QueryParams, Error, Result};
use serde::{Deserialize, Serialize};

/// Addressing options for a single request
///
/// Empty strings count as unset, matching the console's option objects.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Options {
    /// Name of a single object
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Namespace to scope the request to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ns: Option<String>,
    /// Trailing path after the object, e.g. a subresource
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Query parameters
    #[serde(default, skip_serializing_if = "QueryParams::is_empty")]
    pub query_params: QueryParams,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

impl Options {
    /// Options addressing a single named object
    pub fn named(name: &str) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Scope to a namespace
    #[must_use]
    pub fn within(mut self, ns: &str) -> Self {
        self.ns = Some(ns.into());
        self
    }

    /// Append a trailing path
    #[must_use]
    pub fn path(mut self, path: &str) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Add a query parameter
    #[must_use]
    pub fn param(mut self, key: &str, value: &str) -> Self {
        self.query_params.insert(key, value);
        self
    }

    /// Fill unset name and namespace from defaults
    ///
    /// Values already present on `self` win.
    #[must_use]
    pub fn or_defaults(mut self, ns: Option<&str>, name: Option<&str>) -> Self {
        if present(&self.ns).is_none() {
            self.ns = ns.filter(|v| !v.is_empty()).map(String::from);
        }
        if present(&self.name).is_none() {
            self.name = name.filter(|v| !v.is_empty()).map(String::from);
        }
        self
    }

    /// The namespace, if set and non-empty
    pub fn namespace(&self) -> Option<&str> {
        present(&self.ns)
    }

    /// The name, if set and non-empty
    pub fn object_name(&self) -> Option<&str> {
        present(&self.name)
    }

    /// Whether no addressing option is set
    pub fn is_empty(&self) -> bool {
        present(&self.name).is_none()
            && present(&self.ns).is_none()
            && present(&self.path).is_none()
            && self.query_params.is_empty()
    }
}

/// Build the path of a resource, including its query string
///
/// `/api/<version>` or `/apis/<group>/<version>`, then `/namespaces/<ns>`,
/// `/<plural>`, `/<name>`, `/<path>` and finally `?<query>`.
pub fn resource_path(model: &K8sModel, opts: &Options) -> Result<String> {
    let mut url = model.api_path();
    if let Some(ns) = opts.namespace() {
        if !model.namespaced {
            return Err(Error::NamespacedClusterResource {
                kind: model.kind.clone(),
                namespace: ns.to_string(),
            });
        }
        url.push_str("/namespaces/");
        url.push_str(ns);
    }
    url.push('/');
    url.push_str(&model.plural);
    if let Some(name) = opts.object_name() {
        url.push('/');
        url.push_str(name);
    }
    if let Some(path) = present(&opts.path) {
        url.push('/');
        url.push_str(path.trim_start_matches('/'));
    }
    if !opts.query_params.is_empty() {
        url.push('?');
        url.push_str(&opts.query_params.encode());
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn deployments() -> K8sModel {
        K8sModel::namespaced("apps", "v1", "Deployment", "deployments")
    }

    #[test]
    fn singleton_in_namespace() {
        let opts = Options::named("web").within("prod");
        assert_eq!(
            resource_path(&deployments(), &opts).unwrap(),
            "/apis/apps/v1/namespaces/prod/deployments/web"
        );
        // same inputs, same path
        assert_eq!(
            resource_path(&deployments(), &opts).unwrap(),
            resource_path(&deployments(), &opts.clone()).unwrap()
        );
    }

    #[test]
    fn core_group_with_subpath_and_query() {
        let pods = K8sModel::namespaced("", "v1", "Pod", "pods");
        let opts = Options::named("db-0")
            .within("data")
            .path("log")
            .param("container", "main")
            .param("tailLines", "100");
        assert_eq!(
            resource_path(&pods, &opts).unwrap(),
            "/api/v1/namespaces/data/pods/db-0/log?container=main&tailLines=100"
        );
    }

    #[test]
    fn namespaced_model_without_namespace_is_cluster_wide() {
        assert_eq!(
            resource_path(&deployments(), &Options::default()).unwrap(),
            "/apis/apps/v1/deployments"
        );
        let blank = Options {
            ns: Some("".into()),
            name: Some("".into()),
            ..Options::default()
        };
        assert!(blank.is_empty());
        assert_eq!(resource_path(&deployments(), &blank).unwrap(), "/apis/apps/v1/deployments");
    }

    #[test]
    fn cluster_scoped_model_rejects_namespace() {
        let nodes = K8sModel::cluster("", "v1", "Node", "nodes");
        assert_eq!(resource_path(&nodes, &Options::named("n1")).unwrap(), "/api/v1/nodes/n1");
        let err = resource_path(&nodes, &Options::named("n1").within("default")).unwrap_err();
        assert!(matches!(err, Error::NamespacedClusterResource { ref kind, .. } if kind == "Node"));
    }

    #[test]
    fn explicit_options_beat_defaults() {
        let opts = Options::named("explicit").or_defaults(Some("from-body"), Some("ignored"));
        assert_eq!(opts.namespace(), Some("from-body"));
        assert_eq!(opts.object_name(), Some("explicit"));
    }

    #[test]
    fn deserializes_console_options() {
        let opts: Options = serde_json::from_value(json!({
            "ns": "default",
            "path": "status",
            "queryParams": {"dryRun": "All"}
        }))
        .unwrap();
        assert_eq!(opts.query_params.get("dryRun"), Some("All"));
        assert_eq!(
            resource_path(&deployments(), &opts.or_defaults(None, Some("web"))).unwrap(),
            "/apis/apps/v1/namespaces/default/deployments/web/status?dryRun=All"
        );
    }
}

//! Request builder for the console verbs
use crate::{
    model::K8sModel,
    params::{DeleteOptions, ListParams},
    patch::{Patch, JSON_PATCH_CONTENT_TYPE},
    url::{resource_path, Options},
    Error, Result,
};
use http::header::{ACCEPT, CONTENT_TYPE};

const JSON: &str = "application/json";

/// A Kubernetes request builder
///
/// Takes a model and supplies constructors for the console's verbs.
/// All of them return `http::Request` objects with paths relative to the cluster url.
#[derive(Debug, Clone)]
pub struct Request {
    /// The model every request is addressed to
    pub model: K8sModel,
}

impl Request {
    /// New request builder for a model
    pub fn new(model: K8sModel) -> Self {
        Self { model }
    }

    fn path(&self, opts: &Options) -> Result<String> {
        resource_path(&self.model, opts)
    }
}

fn json_request(method: http::Method, url: String, body: Vec<u8>) -> Result<http::Request<Vec<u8>>> {
    http::Request::builder()
        .method(method)
        .uri(url)
        .header(ACCEPT, JSON)
        .header(CONTENT_TYPE, JSON)
        .body(body)
        .map_err(Error::BuildRequest)
}

/// Convenience methods found from API conventions
impl Request {
    /// Get a single instance, or the raw collection when no name is set
    pub fn get(&self, opts: &Options) -> Result<http::Request<Vec<u8>>> {
        let url = self.path(opts)?;
        http::Request::get(url)
            .header(ACCEPT, JSON)
            .body(vec![])
            .map_err(Error::BuildRequest)
    }

    /// List a collection of a resource
    ///
    /// The namespace comes from [`ListParams::ns`] and is never sent as a query parameter.
    pub fn list(&self, lp: &ListParams) -> Result<http::Request<Vec<u8>>> {
        let opts = Options {
            ns: lp.ns.clone(),
            ..Options::default()
        };
        let mut url = self.path(&opts)?;
        if lp.has_query() {
            url.push('?');
            let mut qp = form_urlencoded::Serializer::new(url);
            lp.populate_qp(&mut qp);
            url = qp.finish();
        }
        http::Request::get(url)
            .header(ACCEPT, JSON)
            .body(vec![])
            .map_err(Error::BuildRequest)
    }

    /// Create an instance of a resource in the collection addressed by `opts`
    pub fn create(&self, opts: &Options, data: Vec<u8>) -> Result<http::Request<Vec<u8>>> {
        json_request(http::Method::POST, self.path(opts)?, data)
    }

    /// Replace an instance of a resource
    ///
    /// Requires a name; `metadata.resourceVersion` in the body guards against lost updates.
    pub fn replace(&self, opts: &Options, data: Vec<u8>) -> Result<http::Request<Vec<u8>>> {
        if opts.object_name().is_none() {
            return Err(Error::Validation("an update requires a name".into()));
        }
        json_request(http::Method::PUT, self.path(opts)?, data)
    }

    /// Patch an instance of a resource with a JSON-Patch document
    ///
    /// Empty entries are dropped from the body. Callers short-circuit no-op patches
    /// before building a request.
    pub fn patch(&self, opts: &Options, patch: &Patch) -> Result<http::Request<Vec<u8>>> {
        if opts.object_name().is_none() {
            return Err(Error::Validation("a patch requires a name".into()));
        }
        http::Request::patch(self.path(opts)?)
            .header(ACCEPT, JSON)
            .header(CONTENT_TYPE, JSON_PATCH_CONTENT_TYPE)
            .body(patch.to_body()?)
            .map_err(Error::BuildRequest)
    }

    /// Delete an instance of a resource
    ///
    /// An explicit `json` body is sent as is. Otherwise the model's propagation policy,
    /// if any, is sent as [`DeleteOptions`]; with neither there is no body.
    pub fn delete(&self, opts: &Options, json: Option<&serde_json::Value>) -> Result<http::Request<Vec<u8>>> {
        if opts.object_name().is_none() {
            return Err(Error::Validation("a delete requires a name".into()));
        }
        let url = self.path(opts)?;
        let body = match json {
            Some(json) => Some(serde_json::to_vec(json).map_err(Error::SerializeBody)?),
            None => DeleteOptions::for_model(&self.model)
                .map(|options| serde_json::to_vec(&options))
                .transpose()
                .map_err(Error::SerializeBody)?,
        };
        match body {
            Some(body) => json_request(http::Method::DELETE, url, body),
            None => http::Request::delete(url)
                .header(ACCEPT, JSON)
                .body(vec![])
                .map_err(Error::BuildRequest),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{params::PropagationPolicy, patch::PatchOperation};
    use assert_json_diff::assert_json_eq;
    use k8s_openapi::api::{apps::v1 as appsv1, core::v1 as corev1, rbac::v1 as rbacv1};
    use serde_json::{json, Value};

    fn body(req: &http::Request<Vec<u8>>) -> Value {
        serde_json::from_slice(req.body()).unwrap()
    }

    #[test]
    fn api_url_secret() {
        let req = Request::new(K8sModel::of::<corev1::Secret>())
            .create(&Options::default().within("ns"), vec![])
            .unwrap();
        assert_eq!(req.uri(), "/api/v1/namespaces/ns/secrets");
        assert_eq!(req.method(), "POST");
        assert_eq!(req.headers()[CONTENT_TYPE], "application/json");
    }

    #[test]
    fn api_url_role() {
        let req = Request::new(K8sModel::of::<rbacv1::Role>())
            .create(&Options::default().within("ns"), vec![])
            .unwrap();
        assert_eq!(req.uri(), "/apis/rbac.authorization.k8s.io/v1/namespaces/ns/roles");
    }

    #[test]
    fn list_path() {
        let req = Request::new(K8sModel::of::<appsv1::Deployment>())
            .list(&ListParams::default().within("ns"))
            .unwrap();
        assert_eq!(req.uri(), "/apis/apps/v1/namespaces/ns/deployments");
    }

    #[test]
    fn list_query_excludes_namespace() {
        let lp = ListParams::default()
            .within("ns")
            .labels("app=myapp".parse().unwrap())
            .limit(250);
        let req = Request::new(K8sModel::of::<corev1::Pod>()).list(&lp).unwrap();
        assert_eq!(
            req.uri(),
            "/api/v1/namespaces/ns/pods?labelSelector=app%3Dmyapp&limit=250"
        );
    }

    #[test]
    fn namespace_path() {
        let req = Request::new(K8sModel::of::<corev1::Namespace>())
            .list(&ListParams::default())
            .unwrap();
        assert_eq!(req.uri(), "/api/v1/namespaces")
    }

    #[test]
    fn replace_path() {
        let opts = Options::named("myds").param("dryRun", "All");
        let req = Request::new(K8sModel::of::<appsv1::DaemonSet>())
            .replace(&opts, vec![])
            .unwrap();
        assert_eq!(req.uri(), "/apis/apps/v1/daemonsets/myds?dryRun=All");
        assert_eq!(req.method(), "PUT");
        assert!(Request::new(K8sModel::of::<appsv1::DaemonSet>())
            .replace(&Options::default(), vec![])
            .is_err());
    }

    #[test]
    fn patch_status_path() {
        let patch = Patch(vec![None, Some(PatchOperation::add("/status/ready", json!(true)))]);
        let req = Request::new(K8sModel::of::<corev1::Node>())
            .patch(&Options::named("mynode").path("status"), &patch)
            .unwrap();
        assert_eq!(req.uri(), "/api/v1/nodes/mynode/status");
        assert_eq!(req.headers()[CONTENT_TYPE], JSON_PATCH_CONTENT_TYPE);
        assert_eq!(req.method(), "PATCH");
        assert_json_eq!(body(&req), json!([{"op": "add", "path": "/status/ready", "value": true}]));
    }

    #[test]
    fn delete_without_policy_has_no_body() {
        let req = Request::new(K8sModel::of::<appsv1::ReplicaSet>())
            .delete(&Options::named("myrs").within("ns"), None)
            .unwrap();
        assert_eq!(req.uri(), "/apis/apps/v1/namespaces/ns/replicasets/myrs");
        assert_eq!(req.method(), "DELETE");
        assert!(req.body().is_empty());
    }

    #[test]
    fn delete_sends_model_policy() {
        let model = K8sModel::of::<appsv1::Deployment>().with_propagation_policy(PropagationPolicy::Foreground);
        let req = Request::new(model)
            .delete(&Options::named("web").within("ns"), None)
            .unwrap();
        assert_json_eq!(
            body(&req),
            json!({"kind": "DeleteOptions", "apiVersion": "v1", "propagationPolicy": "Foreground"})
        );
    }

    #[test]
    fn explicit_delete_body_wins() {
        let model = K8sModel::of::<appsv1::Deployment>().with_propagation_policy(PropagationPolicy::Foreground);
        let json = json!({"kind": "DeleteOptions", "apiVersion": "v1", "gracePeriodSeconds": 0});
        let req = Request::new(model)
            .delete(&Options::named("web").within("ns"), Some(&json))
            .unwrap();
        assert_json_eq!(body(&req), json);
    }

    #[test]
    fn cluster_scoped_with_namespace_is_rejected() {
        let err = Request::new(K8sModel::of::<corev1::Node>())
            .get(&Options::named("n1").within("default"))
            .unwrap_err();
        assert!(matches!(err, Error::NamespacedClusterResource { .. }));
    }
}

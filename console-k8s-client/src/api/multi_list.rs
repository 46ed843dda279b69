//! Concurrent fetch of every resource shown on a list page
use futures::future::try_join_all;

use crate::{
    api::{Api, Filters, K8sModel, Options, ResourceObject, ResourceRequest},
    Client, Error, Result,
};

/// The outcome of one [`ResourceRequest`]
#[derive(Debug)]
pub struct FetchedResource {
    /// Key of the results
    pub prop: String,
    /// Stable id of the query that produced the results
    pub query_id: String,
    /// The model fetched
    pub model: K8sModel,
    /// Whether the resource was listed rather than fetched by name
    pub is_list: bool,
    /// Whether a failure was tolerated
    pub optional: bool,
    /// Listed items, or the single object; empty when loading failed
    pub data: Vec<ResourceObject>,
    /// Why an optional resource could not be loaded
    pub load_error: Option<Error>,
}

impl FetchedResource {
    /// Whether the resource was fetched successfully
    pub fn loaded(&self) -> bool {
        self.load_error.is_none()
    }
}

/// Results of a multi-resource list page, in request order
///
/// A later request with the prop of an earlier one replaces its results.
#[derive(Debug, Default)]
pub struct MultiList {
    resources: Vec<FetchedResource>,
}

impl MultiList {
    fn insert(&mut self, fetched: FetchedResource) {
        match self.resources.iter_mut().find(|r| r.prop == fetched.prop) {
            Some(existing) => *existing = fetched,
            None => self.resources.push(fetched),
        }
    }

    /// Results keyed by `prop`
    pub fn get(&self, prop: &str) -> Option<&FetchedResource> {
        self.resources.iter().find(|r| r.prop == prop)
    }

    /// All results in request order
    pub fn iter(&self) -> impl Iterator<Item = &FetchedResource> {
        self.resources.iter()
    }

    /// Every loaded object, resource by resource
    pub fn flatten(&self) -> Vec<&ResourceObject> {
        self.resources.iter().flat_map(|r| r.data.iter()).collect()
    }

    /// Loaded objects passing `filters`, in the order of [`MultiList::flatten`]
    pub fn filtered(&self, filters: &Filters<ResourceObject>) -> Vec<&ResourceObject> {
        self.flatten().into_iter().filter(|obj| filters.matches(obj)).collect()
    }

    /// Props of the optional resources that failed to load
    pub fn failed(&self) -> Vec<&str> {
        self.resources
            .iter()
            .filter(|r| !r.loaded())
            .map(|r| r.prop.as_str())
            .collect()
    }
}

impl Client {
    /// Fetch the resources of a list page concurrently
    ///
    /// Each request is resolved against `page_namespace` first; a cluster-scoped
    /// model requested in a namespace fails the whole call. Lists are flattened
    /// and stamped like [`Api::list`]; single objects are fetched by name.
    /// A failing resource fails the call unless it is optional, in which case
    /// its error is kept on the result.
    pub async fn multi_list(
        &self,
        requests: Vec<ResourceRequest>,
        page_namespace: Option<&str>,
    ) -> Result<MultiList> {
        let resolved = requests
            .into_iter()
            .map(|r| r.resolve(page_namespace))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::BuildRequest)?;
        let fetched = try_join_all(resolved.into_iter().map(|r| self.fetch_resource(r))).await?;

        let mut list = MultiList::default();
        for resource in fetched {
            list.insert(resource);
        }
        Ok(list)
    }

    async fn fetch_resource(&self, request: ResourceRequest) -> Result<FetchedResource> {
        let query_id = request.query_id();
        let api: Api<ResourceObject> = Api::new(self.clone(), request.kind.clone());
        let result = if request.is_list {
            api.list(&request.query().list_params()).await
        } else {
            api.get(
                request.name.as_deref(),
                request.namespace.as_deref(),
                &Options::default(),
            )
            .await
            .map(|obj| vec![obj])
        };
        let (data, load_error) = match result {
            Ok(data) => (data, None),
            Err(err) if request.optional => {
                tracing::debug!("Optional resource {} failed to load: {}", request.prop, err);
                (vec![], Some(err))
            }
            Err(err) => return Err(err),
        };
        Ok(FetchedResource {
            prop: request.prop,
            query_id,
            model: request.kind,
            is_list: request.is_list,
            optional: request.optional,
            data,
            load_error,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        api::{RowFilter, Selector},
        client::Body,
    };
    use futures::pin_mut;
    use http::{Request, Response, StatusCode};
    use serde_json::{json, Value};
    use std::collections::BTreeMap;
    use tower_test::mock;

    fn pods() -> K8sModel {
        K8sModel::namespaced("", "v1", "Pod", "pods")
    }

    fn nodes() -> K8sModel {
        K8sModel::cluster("", "v1", "Node", "nodes")
    }

    fn list_of(api_version: &str, names: &[(&str, &str)]) -> Value {
        let items: Vec<Value> = names
            .iter()
            .map(|(name, phase)| {
                json!({
                    "metadata": {"name": name, "namespace": "web", "labels": {"app": "blog"}},
                    "status": {"phase": phase},
                })
            })
            .collect();
        json!({"apiVersion": api_version, "kind": "List", "metadata": {}, "items": items})
    }

    fn respond(status: StatusCode, body: Value) -> Response<Body> {
        Response::builder()
            .status(status)
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap()
    }

    // Requests race, so answer by path
    fn serve(routes: BTreeMap<String, (StatusCode, Value)>) -> (Client, tokio::task::JoinHandle<Vec<String>>) {
        let (mock_service, handle) = mock::pair::<Request<Body>, Response<Body>>();
        let spawned = tokio::spawn(async move {
            pin_mut!(handle);
            let mut seen = vec![];
            for _ in 0..routes.len() {
                let (request, send) = handle.next_request().await.expect("service not called");
                let uri = request.uri().to_string();
                let (status, body) = routes.get(&uri).cloned().unwrap_or_else(|| panic!("unexpected {uri}"));
                send.send_response(respond(status, body));
                seen.push(uri);
            }
            seen.sort();
            seen
        });
        (Client::new(mock_service, "default"), spawned)
    }

    #[tokio::test]
    async fn fetches_lists_and_singles_in_request_order() {
        let not_found = json!({"status": "Failure", "message": "gone", "reason": "NotFound", "code": 404});
        let routes = BTreeMap::from([
            (
                "/api/v1/namespaces/web/pods?labelSelector=app%3Dblog".to_string(),
                (StatusCode::OK, list_of("v1", &[("a", "Running"), ("b", "Pending")])),
            ),
            (
                "/api/v1/nodes/n1".to_string(),
                (StatusCode::OK, json!({"apiVersion": "v1", "kind": "Node", "metadata": {"name": "n1"}})),
            ),
            (
                "/apis/metrics.k8s.io/v1beta1/namespaces/web/pods".to_string(),
                (StatusCode::NOT_FOUND, not_found),
            ),
        ]);
        let (client, spawned) = serve(routes);

        let requests = vec![
            ResourceRequest::new(pods()).selector("app=blog".parse::<Selector>().unwrap()),
            ResourceRequest::new(nodes()).single("n1"),
            ResourceRequest::new(K8sModel::namespaced("metrics.k8s.io", "v1beta1", "PodMetrics", "pods"))
                .optional(),
        ];
        let list = client.multi_list(requests, Some("web")).await.unwrap();

        let props: Vec<&str> = list.iter().map(|r| r.prop.as_str()).collect();
        assert_eq!(props, ["Pod", "Node", "PodMetrics"]);
        assert_eq!(list.failed(), ["PodMetrics"]);

        let pods = list.get("Pod").unwrap();
        assert_eq!(pods.query_id, r#"core~v1~Pod---{"labelSelector":"app=blog","ns":"web"}"#);
        for pod in &pods.data {
            let types = pod.types.as_ref().unwrap();
            assert_eq!((types.kind.as_str(), types.api_version.as_str()), ("Pod", "v1"));
        }
        assert!(!list.get("Node").unwrap().is_list);

        let names: Vec<&str> = list.flatten().into_iter().filter_map(|o| o.metadata.name.as_deref()).collect();
        assert_eq!(names, ["a", "b", "n1"]);

        let mut filters = Filters::default().row_filter(RowFilter::new(
            "pod-status",
            ["Running", "Pending"],
            |obj: &ResourceObject| obj.data["status"]["phase"].as_str().unwrap_or_default().to_string(),
        ));
        filters.select("pod-status", ["Pending"]);
        let pending: Vec<&str> = list
            .filtered(&filters)
            .into_iter()
            .filter_map(|o| o.metadata.name.as_deref())
            .collect();
        // the node has no phase outside the known buckets, so it passes
        assert_eq!(pending, ["b", "n1"]);

        assert_eq!(spawned.await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn required_failures_and_bad_scopes_fail_the_page() {
        let forbidden = json!({"status": "Failure", "message": "no", "reason": "Forbidden", "code": 403});
        let routes = BTreeMap::from([(
            "/api/v1/namespaces/web/pods".to_string(),
            (StatusCode::FORBIDDEN, forbidden),
        )]);
        let (client, spawned) = serve(routes);

        let err = client
            .multi_list(vec![ResourceRequest::new(pods())], Some("web"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Api(ae) if ae.code == 403));
        spawned.await.unwrap();

        let err = client
            .multi_list(vec![ResourceRequest::new(nodes()).within("web")], Some("web"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::BuildRequest(console_k8s_core::Error::NamespacedClusterResource { .. })
        ));
    }

    #[tokio::test]
    async fn duplicate_props_keep_the_last_results() {
        let routes = BTreeMap::from([
            (
                "/api/v1/pods".to_string(),
                (StatusCode::OK, list_of("v1", &[("a", "Running")])),
            ),
            (
                "/api/v1/pods?limit=1".to_string(),
                (StatusCode::OK, list_of("v1", &[("b", "Running")])),
            ),
        ]);
        let (client, spawned) = serve(routes);
        let mut limited = ResourceRequest::new(pods());
        limited.limit = Some(1);
        let list = client
            .multi_list(vec![ResourceRequest::new(pods()), limited], None)
            .await
            .unwrap();
        assert_eq!(list.iter().count(), 1);
        let pods = list.get("Pod").unwrap();
        assert_eq!(pods.data[0].metadata.name.as_deref(), Some("b"));
        assert!(pods.query_id.ends_with(r#"{"limit":1}"#));
        spawned.await.unwrap();
    }
}

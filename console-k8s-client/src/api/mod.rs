//! API helpers for structured interaction with the Kubernetes API

mod core_methods;

mod adapter;
pub use adapter::{CreateResource, DeleteResource, GetResource, ListResource, PatchResource, UpdateResource};

mod multi_list;
pub use multi_list::{FetchedResource, MultiList};

use std::fmt::Debug;

// Re-exports from console-k8s-core
pub use console_k8s_core::{
    filter::{Filters, RowFilter},
    list_query::{ListQuery, ResourceRequest},
    metadata::{ListMeta, ObjectMeta, TypeMeta},
    model::K8sModel,
    object::{ObjectList, ResourceObject},
    params::{DeleteOptions, ListParams, Preconditions, PropagationPolicy, QueryParams},
    patch::{Patch, PatchOp, PatchOperation},
    request::Request,
    response::Status,
    selector::Selector,
    url::Options,
    Resource, ResourceExt,
};
use k8s_openapi::NamespaceResourceScope;

use crate::Client;
/// The generic Api abstraction
///
/// This abstracts over a [`Request`] for one [`K8sModel`] and a type `K` so that
/// we get automatic serialization/deserialization on the api calls.
///
/// The namespace an `Api` is created with is the lowest priority default of
/// every verb: namespaces passed to a verb, and those found on the objects it
/// is given, take precedence. It is ignored for cluster-scoped models.
#[cfg_attr(docsrs, doc(cfg(feature = "client")))]
#[derive(Clone)]
pub struct Api<K> {
    /// The request builder object with its model
    pub(crate) request: Request,
    /// The client to use (from this library)
    pub(crate) client: Client,
    namespace: Option<String>,
    /// Note: Using `iter::Empty` over `PhantomData`, because we never actually keep any
    /// `K` objects, so `Empty` better models our constraints (in particular, `Empty<K>`
    /// is `Send`, even if `K` may not be).
    pub(crate) _phantom: std::iter::Empty<K>,
}

/// Api constructors for any model
///
/// This generally means console models loaded at runtime, used with
/// [`ResourceObject`] or any other serde type.
impl<K> Api<K> {
    /// Resources of a model across all namespaces, or cluster-scoped ones
    pub fn new(client: Client, model: K8sModel) -> Self {
        Self {
            client,
            request: Request::new(model),
            namespace: None,
            _phantom: std::iter::empty(),
        }
    }

    /// Resources of a model within a given namespace
    pub fn namespaced_with(client: Client, ns: &str, model: K8sModel) -> Self {
        Self {
            namespace: Some(ns.to_string()),
            ..Self::new(client, model)
        }
    }

    /// Resources of a model within the default namespace of the client
    ///
    /// The namespace is either configured on `context` in the kubeconfig,
    /// taken from the console environment, or falls back to `default`.
    pub fn default_namespaced_with(client: Client, model: K8sModel) -> Self {
        let ns = client.default_namespace().to_string();
        Self::namespaced_with(client, &ns, model)
    }

    /// The model every verb of this `Api` is addressed to
    pub fn model(&self) -> &K8sModel {
        &self.request.model
    }

    /// The namespace used when a verb does not name one
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Consume self and return the [`Client`]
    pub fn into_client(self) -> Client {
        self.into()
    }

    /// Fill in the namespace of this `Api` where `opts` has none
    pub(crate) fn scoped(&self, opts: Options) -> Options {
        if self.request.model.namespaced {
            opts.or_defaults(self.namespace.as_deref(), None)
        } else {
            opts
        }
    }
}

/// Api constructors for the generated `k8s-openapi` types
///
/// The model is derived from the type with [`K8sModel::of`].
impl<K> Api<K>
where
    K: k8s_openapi::Resource,
    K::Scope: 'static,
{
    /// Cluster level resources, or resources viewed across all namespaces
    ///
    /// Namespace scoped resource allowing querying across all namespaces:
    ///
    /// ```no_run
    /// # use console_k8s_client::{Api, Client};
    /// # let client: Client = todo!();
    /// use k8s_openapi::api::core::v1::Pod;
    /// let api: Api<Pod> = Api::all(client);
    /// ```
    ///
    /// Cluster scoped resources also use this entrypoint:
    ///
    /// ```no_run
    /// # use console_k8s_client::{Api, Client};
    /// # let client: Client = todo!();
    /// use k8s_openapi::api::core::v1::Node;
    /// let api: Api<Node> = Api::all(client);
    /// ```
    pub fn all(client: Client) -> Self {
        Self::new(client, K8sModel::of::<K>())
    }

    /// Namespaced resource within a given namespace
    ///
    /// ```no_run
    /// # use console_k8s_client::{Api, Client};
    /// # let client: Client = todo!();
    /// use k8s_openapi::api::core::v1::Pod;
    /// let api: Api<Pod> = Api::namespaced(client, "default");
    /// ```
    ///
    /// This will ONLY work on namespaced resources as set by `Scope`:
    ///
    /// ```compile_fail
    /// # use console_k8s_client::{Api, Client};
    /// # let client: Client = todo!();
    /// use k8s_openapi::api::core::v1::Node;
    /// let api: Api<Node> = Api::namespaced(client, "default"); // resource not namespaced!
    /// ```
    ///
    /// For models loaded at runtime, use [`Api::namespaced_with`].
    pub fn namespaced(client: Client, ns: &str) -> Self
    where
        K: k8s_openapi::Resource<Scope = NamespaceResourceScope>,
    {
        Self::namespaced_with(client, ns, K8sModel::of::<K>())
    }

    /// Namespaced resource within the default namespace
    ///
    /// ```no_run
    /// # use console_k8s_client::{Api, Client};
    /// # let client: Client = todo!();
    /// use k8s_openapi::api::core::v1::Pod;
    /// let api: Api<Pod> = Api::default_namespaced(client);
    /// ```
    pub fn default_namespaced(client: Client) -> Self
    where
        K: k8s_openapi::Resource<Scope = NamespaceResourceScope>,
    {
        let ns = client.default_namespace().to_string();
        Self::namespaced(client, &ns)
    }
}

impl<K> From<Api<K>> for Client {
    fn from(api: Api<K>) -> Self {
        api.client
    }
}

impl<K> Debug for Api<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Intentionally destructuring, to cause compile errors when new fields are added
        let Self {
            request,
            client: _,
            namespace,
            _phantom,
        } = self;
        f.debug_struct("Api")
            .field("request", &request)
            .field("client", &"...")
            .field("namespace", &namespace)
            .finish()
    }
}

/// Sanity test on scope restrictions
#[cfg(test)]
mod test {
    use crate::{api::K8sModel, client::Body, Api, Client};
    use k8s_openapi::api::{apps::v1 as appsv1, core::v1 as corev1};

    use http::{Request, Response};
    use tower_test::mock;

    #[tokio::test]
    async fn scopes_should_allow_correct_interface() {
        let (mock_service, _handle) = mock::pair::<Request<Body>, Response<Body>>();
        let client = Client::new(mock_service, "default");

        let _: Api<corev1::Node> = Api::all(client.clone());
        let _: Api<corev1::Pod> = Api::default_namespaced(client.clone());
        let _: Api<corev1::PersistentVolume> = Api::all(client.clone());
        let _: Api<corev1::ConfigMap> = Api::namespaced(client, "default");
    }

    #[tokio::test]
    async fn models_and_namespaces() {
        let (mock_service, _handle) = mock::pair::<Request<Body>, Response<Body>>();
        let client = Client::new(mock_service, "console");

        let deploys: Api<appsv1::Deployment> = Api::default_namespaced(client.clone());
        assert_eq!(deploys.model().reference(), "apps~v1~Deployment");
        assert_eq!(deploys.namespace(), Some("console"));

        let nodes: Api<corev1::Node> = Api::all(client.clone());
        assert!(!nodes.model().namespaced);
        assert_eq!(nodes.namespace(), None);

        let model = K8sModel::namespaced("example.com", "v1", "Widget", "widgets");
        let widgets: Api<serde_json::Value> = Api::namespaced_with(client, "team-a", model);
        assert_eq!(widgets.model().api_path(), "/apis/example.com/v1");
        assert_eq!(widgets.namespace(), Some("team-a"));
    }
}

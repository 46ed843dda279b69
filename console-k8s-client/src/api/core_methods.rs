use either::Either;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::fmt::Debug;

use crate::{api::Api, Error, Result};
use console_k8s_core::{
    object::ObjectList, params::ListParams, patch::Patch, response::Status, url::Options, Resource,
    ResourceExt,
};

/// GET/LIST/POST/PUT/PATCH/DELETE abstractions
///
/// Every verb takes an [`Options`] bag last. Values set there win over the
/// positional arguments and over what the verb reads from the objects it is
/// given; the namespace of the `Api` is used only when none of them name one.
impl<K> Api<K>
where
    K: Clone + DeserializeOwned + Debug,
{
    /// Get a named resource
    ///
    /// ```no_run
    /// # use console_k8s_client::{Api, api::Options};
    /// use k8s_openapi::api::core::v1::Pod;
    ///
    /// # async fn wrapper() -> Result<(), Box<dyn std::error::Error>> {
    /// # let client: console_k8s_client::Client = todo!();
    /// let pods: Api<Pod> = Api::namespaced(client, "apps");
    /// let p: Pod = pods.get(Some("blog"), None, &Options::default()).await?;
    /// # Ok(())
    /// # }
    /// ```
    ///
    /// Without a name this fetches the raw collection, which only parses with an
    /// `Api<ObjectList<_>>` or an `Api<serde_json::Value>`. Use [`Api::list`]
    /// for flattened items.
    ///
    /// # Errors
    ///
    /// This function assumes that the object is expected to always exist, and returns [`Error`] if it does not.
    /// Consider using [`Api::get_opt`] if you need to handle missing objects.
    pub async fn get(&self, name: Option<&str>, ns: Option<&str>, opts: &Options) -> Result<K> {
        let opts = self.scoped(opts.clone().or_defaults(ns, name));
        let mut req = self.request.get(&opts).map_err(Error::BuildRequest)?;
        req.extensions_mut().insert("get");
        self.client.request::<K>(req).await
    }

    /// [Get](`Api::get`) a named resource if it exists, returns [`None`] if it doesn't exist
    ///
    /// ```no_run
    /// # use console_k8s_client::{Api, api::Options};
    /// use k8s_openapi::api::core::v1::Pod;
    ///
    /// # async fn wrapper() -> Result<(), Box<dyn std::error::Error>> {
    /// # let client: console_k8s_client::Client = todo!();
    /// let pods: Api<Pod> = Api::namespaced(client, "apps");
    /// if let Some(pod) = pods.get_opt("blog", &Options::default()).await? {
    ///     // Pod was found
    /// } else {
    ///     // Pod was not found
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub async fn get_opt(&self, name: &str, opts: &Options) -> Result<Option<K>> {
        match self.get(Some(name), None, opts).await {
            Ok(obj) => Ok(Some(obj)),
            Err(Error::Api(ae)) if ae.is_not_found() => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Get a list of resources
    ///
    /// The namespace comes from `lp.ns`, or from the `Api` when unset.
    /// Every item is stamped with the model's `kind` and the list's `apiVersion`,
    /// overwriting whatever the server sent on the item.
    ///
    /// ```no_run
    /// # use console_k8s_client::{Api, api::ListParams, ResourceExt};
    /// use k8s_openapi::api::core::v1::Pod;
    ///
    /// # async fn wrapper() -> Result<(), Box<dyn std::error::Error>> {
    /// # let client: console_k8s_client::Client = todo!();
    /// let pods: Api<Pod> = Api::namespaced(client, "apps");
    /// let lp = ListParams::default().labels("app=blog".parse()?);
    /// for p in pods.list(&lp).await? {
    ///     println!("Found Pod: {}", p.name_any());
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub async fn list(&self, lp: &ListParams) -> Result<Vec<K>> {
        self.list_raw(lp).await.map(|list| list.items)
    }

    /// Get a list of resources, keeping the list envelope
    ///
    /// Items are stamped like in [`Api::list`]; the envelope carries the
    /// `resourceVersion` and `continue` token of the list.
    pub async fn list_raw(&self, lp: &ListParams) -> Result<ObjectList<K>> {
        let mut lp = lp.clone();
        if self.request.model.namespaced && lp.ns.is_none() {
            lp.ns = self.namespace.clone();
        }
        let mut req = self.request.list(&lp).map_err(Error::BuildRequest)?;
        req.extensions_mut().insert("list");
        let list = self.client.request::<ObjectList<Value>>(req).await?;
        tracing::trace!(
            "Flattening {} {} items of {}",
            list.items.len(),
            self.request.model.kind,
            list.api_version
        );
        list.into_typed(&self.request.model).map_err(Error::SerdeError)
    }
}

impl<K> Api<K>
where
    K: Resource + Serialize + Clone + DeserializeOwned + Debug,
{
    /// Create a resource
    ///
    /// The namespace is taken from `data.metadata.namespace` unless `opts` sets one.
    ///
    /// ```no_run
    /// # use console_k8s_client::{Api, api::Options};
    /// use k8s_openapi::api::core::v1::ConfigMap;
    ///
    /// # async fn wrapper() -> Result<(), Box<dyn std::error::Error>> {
    /// # let client: console_k8s_client::Client = todo!();
    /// let cms: Api<ConfigMap> = Api::namespaced(client, "apps");
    /// let cm: ConfigMap = serde_json::from_value(serde_json::json!({
    ///     "metadata": { "name": "settings", "namespace": "apps" },
    ///     "data": { "theme": "dark" },
    /// }))?;
    /// let created = cms.create(&cm, &Options::default()).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn create(&self, data: &K, opts: &Options) -> Result<K> {
        let bytes = serde_json::to_vec(data).map_err(Error::SerdeError)?;
        let opts = self.scoped(opts.clone().or_defaults(data.namespace(), None));
        let mut req = self.request.create(&opts, bytes).map_err(Error::BuildRequest)?;
        req.extensions_mut().insert("create");
        self.client.request::<K>(req).await
    }

    /// Replace a resource entirely with a new one
    ///
    /// `ns` and `name` default to those found on `data`; `opts` overrides both.
    /// The `metadata.resourceVersion` of `data` must match the server's,
    /// otherwise the call fails with a `409 Conflict`.
    pub async fn update(&self, data: &K, ns: Option<&str>, name: Option<&str>, opts: &Options) -> Result<K> {
        let bytes = serde_json::to_vec(data).map_err(Error::SerdeError)?;
        let opts = self.scoped(
            opts.clone()
                .or_defaults(ns.or_else(|| data.namespace()), name.or_else(|| data.name())),
        );
        let mut req = self.request.replace(&opts, bytes).map_err(Error::BuildRequest)?;
        req.extensions_mut().insert("update");
        self.client.request::<K>(req).await
    }

    /// Patch a resource with a JSON-Patch document
    ///
    /// The object is addressed by the name and namespace of `resource`.
    /// Absent operations are dropped; when none remain, `resource` is
    /// returned as is and no request is made.
    ///
    /// ```no_run
    /// # use console_k8s_client::{Api, api::{Options, Patch, PatchOperation}};
    /// use k8s_openapi::api::apps::v1::Deployment;
    ///
    /// # async fn wrapper() -> Result<(), Box<dyn std::error::Error>> {
    /// # let client: console_k8s_client::Client = todo!();
    /// let deploys: Api<Deployment> = Api::namespaced(client, "apps");
    /// let blog = deploys.get(Some("blog"), None, &Options::default()).await?;
    /// let patch = Patch(vec![None, Some(PatchOperation::replace("/spec/paused", true.into()))]);
    /// let paused = deploys.patch(&blog, &patch, &Options::default()).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn patch(&self, resource: &K, patch: &Patch, opts: &Options) -> Result<K> {
        if patch.is_noop() {
            tracing::trace!("Skipping empty patch of {}", resource.name_any());
            return Ok(resource.clone());
        }
        let opts = self.scoped(opts.clone().or_defaults(resource.namespace(), resource.name()));
        let mut req = self.request.patch(&opts, patch).map_err(Error::BuildRequest)?;
        req.extensions_mut().insert("patch");
        self.client.request::<K>(req).await
    }

    /// Delete a resource
    ///
    /// The object is addressed by the name and namespace of `resource`.
    /// An explicit `json` body is sent verbatim; otherwise the model's
    /// propagation policy, if any, is sent as `DeleteOptions`.
    ///
    /// The server answers either with the object, when its deletion is pending
    /// on finalizers, or with a [`Status`] when it is gone.
    ///
    /// ```no_run
    /// # use console_k8s_client::{Api, api::Options};
    /// use k8s_openapi::api::core::v1::ConfigMap;
    ///
    /// # async fn wrapper() -> Result<(), Box<dyn std::error::Error>> {
    /// # let client: console_k8s_client::Client = todo!();
    /// let cms: Api<ConfigMap> = Api::namespaced(client, "apps");
    /// let cm = cms.get(Some("settings"), None, &Options::default()).await?;
    /// cms.delete(&cm, &Options::default(), None).await?.map_left(|o| {
    ///     println!("Deleting ConfigMap: {:?}", o.metadata.deletion_timestamp);
    /// }).map_right(|s| {
    ///     println!("Deleted ConfigMap: {}", s.message);
    /// });
    /// # Ok(())
    /// # }
    /// ```
    pub async fn delete(&self, resource: &K, opts: &Options, json: Option<&Value>) -> Result<Either<K, Status>> {
        let opts = self.scoped(opts.clone().or_defaults(resource.namespace(), resource.name()));
        let mut req = self.request.delete(&opts, json).map_err(Error::BuildRequest)?;
        req.extensions_mut().insert("delete");
        self.client.request_status::<K>(req).await
    }
}

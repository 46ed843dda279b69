//! Single-object variants of the verbs
//!
//! The console hands the verbs one options object instead of positional
//! arguments. Each type here deserializes such an object from its camelCase
//! JSON and maps it field by field onto the matching [`Api`] verb, so both
//! forms issue the same request. The `name`, `ns`, `path` and `queryParams`
//! keys double as the `opts` bag of the verb; missing or empty keys are left out.
use either::{Either, Left, Right};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use std::fmt::Debug;

use crate::{
    api::{Api, K8sModel, ListParams, ObjectList, Options, Patch, Status},
    Client, Resource, Result,
};

/// Options of [`Client::get_resource`]
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetResource {
    /// Model of the resource
    pub model: K8sModel,
    /// Name, namespace, path and query; a missing name gets the collection
    #[serde(flatten)]
    pub opts: Options,
}

/// Options of [`Client::create_resource`]
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateResource<K> {
    /// Model of the resource
    pub model: K8sModel,
    /// The object to create
    pub data: K,
    /// Addressing overrides
    #[serde(flatten)]
    pub opts: Options,
}

/// Options of [`Client::update_resource`]
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResource<K> {
    /// Model of the resource
    pub model: K8sModel,
    /// The full replacement object
    pub data: K,
    /// Addressing overrides; `name` and `ns` default to those of `data`
    #[serde(flatten)]
    pub opts: Options,
}

/// Options of [`Client::patch_resource`]
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchResource<K> {
    /// Model of the resource
    pub model: K8sModel,
    /// The object to patch, also the result of an empty patch
    pub resource: K,
    /// The JSON-Patch operations
    pub data: Patch,
    /// Addressing overrides
    #[serde(flatten)]
    pub opts: Options,
}

/// Options of [`Client::delete_resource`]
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResource<K> {
    /// Model of the resource
    pub model: K8sModel,
    /// The object to delete
    pub resource: K,
    /// Addressing overrides
    #[serde(flatten)]
    pub opts: Options,
    /// Explicit request body, sent instead of the model's `DeleteOptions`
    #[serde(default)]
    pub json: Option<Value>,
}

/// Options of [`Client::list_resource`]
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResource {
    /// Model of the resource
    pub model: K8sModel,
    /// Namespace and query of the list
    #[serde(default, alias = "params")]
    pub query_params: ListParams,
    /// Return the list envelope instead of the flattened items
    #[serde(default)]
    pub raw: bool,
}

/// Option object forms of the verbs
///
/// These build a throwaway [`Api`] without a namespace of its own, so
/// addressing comes only from the options and the objects passed in.
impl Client {
    fn api<K>(&self, model: K8sModel) -> Api<K> {
        Api::new(self.clone(), model)
    }

    /// [`Api::get`] with an options object
    pub async fn get_resource<K>(&self, options: GetResource) -> Result<K>
    where
        K: Clone + DeserializeOwned + Debug,
    {
        let GetResource { model, opts } = options;
        self.api::<K>(model)
            .get(opts.object_name(), opts.namespace(), &opts)
            .await
    }

    /// [`Api::create`] with an options object
    pub async fn create_resource<K>(&self, options: CreateResource<K>) -> Result<K>
    where
        K: Resource + Serialize + Clone + DeserializeOwned + Debug,
    {
        let CreateResource { model, data, opts } = options;
        self.api::<K>(model).create(&data, &opts).await
    }

    /// [`Api::update`] with an options object
    pub async fn update_resource<K>(&self, options: UpdateResource<K>) -> Result<K>
    where
        K: Resource + Serialize + Clone + DeserializeOwned + Debug,
    {
        let UpdateResource { model, data, opts } = options;
        self.api::<K>(model)
            .update(&data, opts.namespace(), opts.object_name(), &opts)
            .await
    }

    /// [`Api::patch`] with an options object
    pub async fn patch_resource<K>(&self, options: PatchResource<K>) -> Result<K>
    where
        K: Resource + Serialize + Clone + DeserializeOwned + Debug,
    {
        let PatchResource {
            model,
            resource,
            data,
            opts,
        } = options;
        self.api::<K>(model).patch(&resource, &data, &opts).await
    }

    /// [`Api::delete`] with an options object
    pub async fn delete_resource<K>(&self, options: DeleteResource<K>) -> Result<Either<K, Status>>
    where
        K: Resource + Serialize + Clone + DeserializeOwned + Debug,
    {
        let DeleteResource {
            model,
            resource,
            opts,
            json,
        } = options;
        self.api::<K>(model).delete(&resource, &opts, json.as_ref()).await
    }

    /// [`Api::list`] with an options object, or [`Api::list_raw`] when `raw` is set
    pub async fn list_resource<K>(&self, options: ListResource) -> Result<Either<Vec<K>, ObjectList<K>>>
    where
        K: Clone + DeserializeOwned + Debug,
    {
        let ListResource {
            model,
            query_params,
            raw,
        } = options;
        let api = self.api::<K>(model);
        if raw {
            api.list_raw(&query_params).await.map(Right)
        } else {
            api.list(&query_params).await.map(Left)
        }
    }
}

//! The resource access layer of the Kubernetes web console.
//!
//! # Overview
//!
//! Every page of the console reads and writes cluster resources through a
//! small set of model-driven verbs. This crate bundles them:
//!
//! - [`client`](crate::client) with the HTTP [`Client`](crate::Client) and its layers
//! - [`config`](crate::config) for cluster [`Config`](crate::Config)
//! - [`api`](crate::api) with the verbs of [`Api`](crate::Api), their option object forms
//!   and the multi-resource fetch of list pages
//! - [`core`](crate::core) with models, urls, patches, selectors and list filters
//!
//! # Using the Client
//! ```no_run
//! use console_k8s::{Client, api::{Api, K8sModel, ListParams, ResourceObject, ResourceExt}};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Infer the environment and try to create a Client
//!     let client = Client::try_default().await?;
//!
//!     // Models usually arrive at runtime, from the console's model registry
//!     let routes = K8sModel::namespaced("route.openshift.io", "v1", "Route", "routes");
//!     let api: Api<ResourceObject> = Api::default_namespaced_with(client, routes);
//!     for r in api.list(&ListParams::default()).await? {
//!         println!("found route {}", r.name_any());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Using a list page
//! ```no_run
//! use console_k8s::{Client, api::{Filters, K8sModel, ResourceRequest}};
//! use k8s_openapi::api::core::v1::{Pod, Service};
//!
//! # async fn wrapper() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Client::try_default().await?;
//! let page = client
//!     .multi_list(
//!         vec![
//!             ResourceRequest::new(K8sModel::of::<Pod>()),
//!             ResourceRequest::new(K8sModel::of::<Service>()).optional(),
//!         ],
//!         Some("demo"),
//!     )
//!     .await?;
//! let mut filters = Filters::default();
//! filters.set_name("web");
//! for obj in page.filtered(&filters) {
//!     println!("{:?}", obj.metadata.name);
//! }
//! # Ok(())
//! # }
//! ```
#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]
#![forbid(unsafe_code)]

macro_rules! cfg_client {
    ($($item:item)*) => {
        $(
            #[cfg_attr(docsrs, doc(cfg(feature = "client")))]
            #[cfg(feature = "client")]
            $item
        )*
    }
}
macro_rules! cfg_config {
    ($($item:item)*) => {
        $(
            #[cfg_attr(docsrs, doc(cfg(feature = "config")))]
            #[cfg(feature = "config")]
            $item
        )*
    }
}

macro_rules! cfg_error {
    ($($item:item)*) => {
        $(
            #[cfg_attr(docsrs, doc(cfg(any(feature = "config", feature = "client"))))]
            #[cfg(any(feature = "config", feature = "client"))]
            $item
        )*
    }
}

cfg_client! {
    pub use console_k8s_client::api;
    pub use console_k8s_client::client;

    #[doc(inline)]
    pub use api::Api;
    #[doc(inline)]
    pub use client::Client;
}

cfg_config! {
    pub use console_k8s_client::config;
    #[doc(inline)]
    pub use config::Config;
}

cfg_error! {
    pub use console_k8s_client::error;
    #[doc(inline)] pub use error::Error;
    /// Convient alias for `Result<T, Error>`
    pub use console_k8s_client::Result;
}

pub use crate::core::{Resource, ResourceExt};
/// Re-exports from console_k8s_core
pub use console_k8s_core as core;

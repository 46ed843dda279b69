//! Crate for the console's access to the Kubernetes API
//!
//! This crate holds the transport ([`Client`], [`Config`]) and the verbs of
//! the console's resource layer on top of it ([`Api`]).
//!
//! # Example
//!
//! The following example lists the deployments of a namespace and scales one
//! of them with a JSON patch.
//!
//! ```rust,no_run
//! use console_k8s_client::api::{Api, ListParams, Options, Patch, PatchOperation, ResourceExt};
//! use console_k8s_client::Client;
//! use k8s_openapi::api::apps::v1::Deployment;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Tries the console environment first, then falls back on a kubeconfig file.
//!     let client = Client::try_default().await?;
//!
//!     let deployments: Api<Deployment> = Api::namespaced(client, "demo");
//!     for d in deployments.list(&ListParams::default()).await? {
//!         println!("found deployment {}", d.name_any());
//!     }
//!
//!     let blog = deployments.get(Some("blog"), None, &Options::default()).await?;
//!     let patch = Patch::from(vec![PatchOperation::replace("/spec/replicas", 3.into())]);
//!     let blog = deployments.patch(&blog, &patch, &Options::default()).await?;
//!     println!("{} now wants 3 replicas", blog.name_any());
//!     Ok(())
//! }
//! ```
//!
//! For more details, see:
//!
//! - [`Client`](crate::client) for the extensible Kubernetes client
//! - [`Config`](crate::config) for the Kubernetes config abstraction
//! - [`Api`](crate::Api) for the verbs, the option adapters and multi-resource fetches
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
    pub mod api;
    pub mod client;

    #[doc(inline)]
    pub use api::Api;
    #[doc(inline)]
    pub use client::Client;
}

cfg_config! {
    pub mod config;
    #[doc(inline)]
    pub use config::Config;
}

cfg_error! {
    pub mod error;
    #[doc(inline)] pub use error::Error;
    /// Convient alias for `Result<T, Error>`
    pub type Result<T, E = Error> = std::result::Result<T, E>;
}

pub use crate::core::{Resource, ResourceExt};
/// Re-exports from console_k8s_core
pub use console_k8s_core as core;

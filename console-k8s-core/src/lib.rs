//! Types and request builders for the console's access to the Kubernetes API
//!
//! This crate is the client-less half of `console-k8s`: resource models, url
//! and request construction, list envelopes and flattening, selectors and the
//! filters of list pages. It performs no I/O.
//! The same types are re-exported from `console-k8s` under `console_k8s::core`.
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod filter;
pub use filter::{Filters, RowFilter};

pub mod list_query;
pub use list_query::{ListQuery, ResourceRequest};

pub mod metadata;

pub mod model;
pub use model::K8sModel;

pub mod object;
pub use object::{ObjectList, ResourceObject};

pub mod params;

pub mod patch;
pub use patch::{Patch, PatchOperation};

pub mod request;
pub use request::Request;

mod resource;
pub use resource::{Resource, ResourceExt};

pub mod response;

pub mod selector;
pub use selector::{Expression, Selector};

pub mod url;
pub use url::Options;

mod error;
pub use error::{Error, ErrorResponse, StatusCause, StatusDetails};

/// Convenient alias for `Result<T, Error>`
pub type Result<T, E = Error> = std::result::Result<T, E>;

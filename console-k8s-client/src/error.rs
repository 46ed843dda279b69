//! Error handling in [`console-k8s`][crate]
use http::Uri;
use thiserror::Error;

pub use console_k8s_core::ErrorResponse;

#[cfg(feature = "client")]
pub use crate::client::AuthError;
#[cfg(feature = "config")]
pub use crate::config::{EnvConfigError, InferConfigError, KubeconfigError};

/// Possible errors from the [`Client`](crate::Client)
#[cfg_attr(docsrs, doc(cfg(any(feature = "config", feature = "client"))))]
#[derive(Error, Debug)]
pub enum Error {
    /// ApiError for when things fail
    ///
    /// Carries the `Status` body of any non-2xx response, or one reconstructed
    /// from the status code when the body does not parse.
    /// A `409 Conflict` is common when updating with a stale `resourceVersion`.
    #[error("ApiError: {0} ({0:?})")]
    Api(#[source] ErrorResponse),

    /// Hyper error
    #[cfg(feature = "client")]
    #[error("HyperError: {0}")]
    HyperError(#[source] hyper::Error),

    /// Service error
    #[cfg(feature = "client")]
    #[error("ServiceError: {0}")]
    Service(#[source] tower::BoxError),

    /// UTF-8 Error
    #[error("UTF-8 Error: {0}")]
    FromUtf8(#[source] std::string::FromUtf8Error),

    /// Http based error
    #[error("HttpError: {0}")]
    HttpError(#[source] http::Error),

    /// Failed to construct a URI.
    #[error(transparent)]
    InvalidUri(#[from] http::uri::InvalidUri),

    /// Common error case when requesting parsing into own structs
    #[error("Error deserializing response: {0}")]
    SerdeError(#[source] serde_json::Error),

    /// Failed to build request
    #[error("Failed to build request: {0}")]
    BuildRequest(#[source] console_k8s_core::Error),

    /// Failed to infer config
    #[cfg(feature = "config")]
    #[error("Failed to infer configuration: {0}")]
    InferConfig(#[source] InferConfigError),

    /// The cluster url needs TLS, but the client was built without `rustls-tls`
    #[error("TLS required for cluster url {0}")]
    TlsRequired(Uri),

    /// Errors from the Rustls TLS setup
    #[cfg(feature = "rustls-tls")]
    #[cfg_attr(docsrs, doc(cfg(feature = "rustls-tls")))]
    #[error("rustls tls error: {0}")]
    RustlsTls(#[source] crate::client::tls::rustls_tls::Error),

    /// Errors related to client auth
    #[cfg(feature = "client")]
    #[error("auth error: {0}")]
    Auth(#[source] AuthError),
}

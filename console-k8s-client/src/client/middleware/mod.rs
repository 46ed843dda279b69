//! Middleware types returned from `ConfigExt` methods.
use tower::Layer;
pub(crate) use tower_http::auth::AddAuthorizationLayer;

mod base_uri;
mod headers;

pub use base_uri::{BaseUri, BaseUriLayer};
pub use headers::{ConsoleHeaders, ConsoleHeadersLayer};

/// Layer to set up `Authorization` header depending on the config.
pub struct AuthLayer(pub(crate) AddAuthorizationLayer);

impl<S> Layer<S> for AuthLayer {
    type Service = <AddAuthorizationLayer as Layer<S>>::Service;

    fn layer(&self, inner: S) -> Self::Service {
        self.0.layer(inner)
    }
}

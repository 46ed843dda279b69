use bytes::Bytes;
use http::{header::HeaderMap, Request, Response};
use hyper::body::Incoming;
use hyper_timeout::TimeoutConnector;
#[cfg(not(feature = "rustls-tls"))]
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;

use std::time::Duration;
use tower::{util::BoxService, BoxError, Layer, Service, ServiceBuilder};
use tower_http::{
    classify::ServerErrorsFailureClass, map_response_body::MapResponseBodyLayer, trace::TraceLayer,
};
use tracing::Span;

use super::body::Body;
use crate::{client::ConfigExt, Client, Config, Error, Result};

/// HTTP body of a dynamic backing type.
///
/// The suggested implementation type is [`crate::client::Body`].
pub type DynBody = dyn http_body::Body<Data = Bytes, Error = BoxError> + Send + Unpin;

/// Builder for [`Client`] instances with customized [tower](`Service`) middleware.
pub struct ClientBuilder<Svc> {
    service: Svc,
    default_ns: String,
}

impl<Svc> ClientBuilder<Svc> {
    /// Construct a [`ClientBuilder`] from scratch with a fully custom [`Service`] stack.
    ///
    /// This method is only intended for advanced use cases, most users will want to use [`ClientBuilder::try_from`] instead,
    /// which provides a default stack as a starting point.
    pub fn new(service: Svc, default_namespace: impl Into<String>) -> Self
    where
        Svc: Service<Request<Body>>,
    {
        Self {
            service,
            default_ns: default_namespace.into(),
        }
    }

    /// Add a [`Layer`] to the current [`Service`] stack.
    pub fn with_layer<L: Layer<Svc>>(self, layer: &L) -> ClientBuilder<L::Service> {
        let Self {
            service: stack,
            default_ns,
        } = self;
        ClientBuilder {
            service: layer.layer(stack),
            default_ns,
        }
    }

    /// Build a [`Client`] instance with the current [`Service`] stack.
    pub fn build<B>(self) -> Client
    where
        Svc: Service<Request<Body>, Response = Response<B>> + Send + 'static,
        Svc::Future: Send + 'static,
        Svc::Error: Into<BoxError>,
        B: http_body::Body<Data = bytes::Bytes> + Send + 'static,
        B::Error: Into<BoxError>,
    {
        Client::new(self.service, self.default_ns)
    }
}

/// The boxed default service stack
pub type GenericService = BoxService<Request<Body>, Response<Box<DynBody>>, BoxError>;

impl TryFrom<Config> for ClientBuilder<GenericService> {
    type Error = Error;

    /// Builds a default [`ClientBuilder`] stack from a given configuration
    ///
    /// Without the `rustls-tls` feature an `https` cluster url is rejected
    /// with [`Error::TlsRequired`].
    fn try_from(config: Config) -> Result<Self> {
        let default_ns = config.default_namespace.clone();
        let auth_layer = config.auth_layer()?;

        let client: hyper_util::client::legacy::Client<_, Body> = {
            #[cfg(feature = "rustls-tls")]
            let connector = config.rustls_https_connector()?;
            #[cfg(not(feature = "rustls-tls"))]
            let connector = {
                if config.cluster_url.scheme() == Some(&http::uri::Scheme::HTTPS) {
                    return Err(Error::TlsRequired(config.cluster_url));
                }
                HttpConnector::new()
            };

            let mut connector = TimeoutConnector::new(connector);

            // Set the timeouts for the client
            connector.set_connect_timeout(config.connect_timeout);
            connector.set_read_timeout(config.read_timeout);
            connector.set_write_timeout(config.write_timeout);

            hyper_util::client::legacy::Builder::new(TokioExecutor::new()).build(connector)
        };

        let service = ServiceBuilder::new()
            .layer(config.base_uri_layer())
            .option_layer(auth_layer)
            .layer(config.headers_layer()?)
            .layer(
                // Attribute names follow [Semantic Conventions].
                // [Semantic Conventions]: https://github.com/open-telemetry/opentelemetry-specification/blob/main/specification/trace/semantic_conventions/http.md
                TraceLayer::new_for_http()
                    .make_span_with(|req: &Request<Body>| {
                        tracing::debug_span!(
                            "HTTP",
                             http.method = %req.method(),
                             http.url = %req.uri(),
                             http.status_code = tracing::field::Empty,
                             otel.name = req.extensions().get::<&'static str>().unwrap_or(&"HTTP"),
                             otel.kind = "client",
                             otel.status_code = tracing::field::Empty,
                        )
                    })
                    .on_request(|_req: &Request<Body>, _span: &Span| {
                        tracing::debug!("requesting");
                    })
                    .on_response(|res: &Response<Incoming>, _latency: Duration, span: &Span| {
                        let status = res.status();
                        span.record("http.status_code", status.as_u16());
                        if status.is_client_error() || status.is_server_error() {
                            span.record("otel.status_code", "ERROR");
                        }
                    })
                    // Explicitly disable `on_body_chunk`. The default does nothing.
                    .on_body_chunk(())
                    .on_eos(|_: Option<&HeaderMap>, _duration: Duration, _span: &Span| {
                        tracing::debug!("stream closed");
                    })
                    .on_failure(|ec: ServerErrorsFailureClass, _latency: Duration, span: &Span| {
                        span.record("otel.status_code", "ERROR");
                        match ec {
                            ServerErrorsFailureClass::StatusCode(status) => {
                                span.record("http.status_code", status.as_u16());
                                tracing::error!("failed with status {}", status)
                            }
                            ServerErrorsFailureClass::Error(err) => {
                                tracing::error!("failed with error {}", err)
                            }
                        }
                    }),
            )
            .map_err(BoxError::from)
            .service(client);

        Ok(ClientBuilder::new(
            BoxService::new(
                MapResponseBodyLayer::new(|body| {
                    Box::new(http_body_util::BodyExt::map_err(body, BoxError::from)) as Box<DynBody>
                })
                .layer(service),
            ),
            default_ns,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(not(feature = "rustls-tls"))]
    #[tokio::test]
    async fn https_cluster_url_is_rejected() {
        let config = Config::new(http::Uri::from_static("https://api.example.com:6443"));
        assert!(matches!(
            ClientBuilder::<GenericService>::try_from(config),
            Err(Error::TlsRequired(uri)) if uri == "https://api.example.com:6443/"
        ));
    }

    #[cfg(feature = "rustls-tls")]
    #[tokio::test]
    async fn https_cluster_url_builds() {
        let mut config = Config::new(http::Uri::from_static("https://api.example.com:6443"));
        config.accept_invalid_certs = true;
        assert!(ClientBuilder::<GenericService>::try_from(config).is_ok());
    }

    #[tokio::test]
    async fn http_cluster_url_builds() {
        let mut config = Config::new(http::Uri::from_static("http://localhost:8001"));
        config.default_namespace = "console".into();
        let client = ClientBuilder::<GenericService>::try_from(config).unwrap().build();
        assert_eq!(client.default_namespace(), "console");
    }
}

use std::sync::Arc;

use http::{
    header::{HeaderName, InvalidHeaderValue},
    request::Request,
    HeaderMap, HeaderValue,
};
use tower::{Layer, Service};

use crate::config::Impersonation;

const IMPERSONATE_USER: HeaderName = HeaderName::from_static("impersonate-user");
const IMPERSONATE_GROUP: HeaderName = HeaderName::from_static("impersonate-group");

/// Layer that sets the configured impersonation and custom headers on each request
///
/// Every configured header name replaces whatever the request already carried
/// under that name, so a request can never act as a second identity.
#[derive(Clone, Debug, Default)]
pub struct ConsoleHeadersLayer {
    headers: Arc<HeaderMap>,
}

impl ConsoleHeadersLayer {
    /// Build the header set from an optional impersonation and custom headers
    pub fn new(
        impersonate: Option<&Impersonation>,
        custom: &[(HeaderName, HeaderValue)],
    ) -> Result<Self, InvalidHeaderValue> {
        let mut headers = HeaderMap::new();
        if let Some(identity) = impersonate {
            headers.insert(IMPERSONATE_USER, HeaderValue::try_from(identity.user.as_str())?);
            for group in &identity.groups {
                headers.append(IMPERSONATE_GROUP, HeaderValue::try_from(group.as_str())?);
            }
        }
        for (name, value) in custom {
            headers.append(name.clone(), value.clone());
        }
        Ok(Self {
            headers: Arc::new(headers),
        })
    }

    /// Values set for `name`, in order
    pub fn get_all(&self, name: &str) -> Vec<&HeaderValue> {
        self.headers.get_all(name).iter().collect()
    }
}

impl<S> Layer<S> for ConsoleHeadersLayer {
    type Service = ConsoleHeaders<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ConsoleHeaders {
            inner,
            headers: self.headers.clone(),
        }
    }
}

/// Service that sets the configured impersonation and custom headers on each request
#[derive(Clone, Debug)]
pub struct ConsoleHeaders<S> {
    inner: S,
    headers: Arc<HeaderMap>,
}

impl<S, ReqBody> Service<Request<ReqBody>> for ConsoleHeaders<S>
where
    S: Service<Request<ReqBody>>,
{
    type Error = S::Error;
    type Future = S::Future;
    type Response = S::Response;

    fn poll_ready(&mut self, cx: &mut std::task::Context<'_>) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<ReqBody>) -> Self::Future {
        let headers = req.headers_mut();
        for name in self.headers.keys() {
            headers.remove(name);
        }
        for (name, value) in self.headers.iter() {
            headers.append(name.clone(), value.clone());
        }
        self.inner.call(req)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use futures::pin_mut;
    use http::Response;
    use tokio_test::assert_ready_ok;
    use tower_test::{mock, mock::Handle};

    use crate::client::Body;

    #[tokio::test(flavor = "current_thread")]
    async fn repeated_groups_reach_the_service() {
        let identity = Impersonation::user("jane").with_groups(["ops", "dev"]);
        let layer = ConsoleHeadersLayer::new(Some(&identity), &[]).unwrap();
        let (mut service, handle): (_, Handle<Request<Body>, Response<Body>>) = mock::spawn_layer(layer);

        let spawned = tokio::spawn(async move {
            pin_mut!(handle);
            let (request, send) = handle.next_request().await.expect("service not called");
            let user: Vec<_> = request.headers().get_all("impersonate-user").iter().collect();
            assert_eq!(user, vec!["jane"]);
            let groups: Vec<_> = request.headers().get_all("impersonate-group").iter().collect();
            assert_eq!(groups, vec!["ops", "dev"]);
            assert_eq!(request.headers().get("x-request"), Some(&HeaderValue::from_static("kept")));
            send.send_response(Response::builder().body(Body::empty()).unwrap());
        });

        assert_ready_ok!(service.poll_ready());
        service
            .call(
                Request::builder()
                    .uri("/")
                    .header("impersonate-user", "system:admin")
                    .header("impersonate-group", "system:masters")
                    .header("x-request", "kept")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        spawned.await.unwrap();
    }

    #[test]
    fn custom_headers_follow_impersonation() {
        let identity = Impersonation::group("auditors");
        let custom = [(HeaderName::from_static("x-csrftoken"), HeaderValue::from_static("t"))];
        let layer = ConsoleHeadersLayer::new(Some(&identity), &custom).unwrap();
        assert_eq!(layer.get_all("impersonate-user"), vec!["auditors"]);
        assert_eq!(layer.get_all("impersonate-group"), vec!["auditors"]);
        assert_eq!(layer.get_all("x-csrftoken"), vec!["t"]);
    }

    #[test]
    fn invalid_identity_is_rejected() {
        let identity = Impersonation::user("bad\nuser");
        assert!(ConsoleHeadersLayer::new(Some(&identity), &[]).is_err());
        assert!(ConsoleHeadersLayer::new(None, &[]).unwrap().get_all("impersonate-user").is_empty());
    }
}

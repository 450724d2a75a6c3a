//! Delivery handler - the single HTTP route that hands out the secret.
//!
//! Exposes exactly one endpoint, `GET /{token}`. Every other path falls
//! through to axum's default 404 and never counts as a delivery attempt.

use crate::error::AppError;
use crate::share::arbiter::{DeliveryOutcome, SharedSignal};
use crate::share::secret::SharedSecret;
use crate::share::token::CapabilityToken;
use askama::Template;
use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use bytes::Bytes;
use http_body::{Frame, SizeHint};
use std::convert::Infallible;
use std::pin::Pin;
use std::task::{Context, Poll};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

/// Page shown to the recipient. Askama escapes `password` for HTML.
#[derive(Template)]
#[template(
    source = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <meta name="robots" content="noindex">
    <title>Shared password</title>
    <style>
        body {
            font-family: 'Segoe UI', Tahoma, Geneva, Verdana, sans-serif;
            background: #202225;
            color: #dcddde;
            display: flex;
            align-items: center;
            justify-content: center;
            height: 100vh;
            margin: 0;
        }
        main {
            background: #2f3136;
            border-radius: 8px;
            padding: 2rem;
            max-width: 40rem;
        }
        pre {
            font-size: 1.25rem;
            white-space: pre-wrap;
            word-break: break-all;
            user-select: all;
        }
        .note {
            color: #8e9297;
            font-size: 0.875rem;
        }
    </style>
</head>
<body>
    <main>
        <pre id="password">{{ password }}</pre>
        <p class="note">This link has now expired. Reloading the page will not show the password again.</p>
    </main>
</body>
</html>"#,
    ext = "html"
)]
struct PasswordPage<'a> {
    password: &'a str,
}

/// Render the delivery page for a secret.
pub fn render_page(password: &str) -> Result<String, askama::Error> {
    PasswordPage { password }.render()
}

/// Shared state for the delivery route. Read-only while serving.
#[derive(Clone)]
pub struct DeliveryState {
    pub secret: SharedSecret,
    pub signal: SharedSignal,
}

/// Response body that reports `Fulfilled` once the HTTP stack has taken
/// the whole page. It holds the delivery claim for as long as it lives.
///
/// Dropping it before the page was polled out means the requester went away
/// mid-response; that attempt does not consume the one-shot delivery.
struct DeliveryBody {
    page: Option<Bytes>,
    len: u64,
    handed_over: bool,
    signal: SharedSignal,
}

impl DeliveryBody {
    fn new(page: String, signal: SharedSignal) -> Self {
        let page = Bytes::from(page);
        Self {
            len: page.len() as u64,
            page: Some(page),
            handed_over: false,
            signal,
        }
    }
}

impl http_body::Body for DeliveryBody {
    type Data = Bytes;
    type Error = Infallible;

    fn poll_frame(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        match self.page.take() {
            Some(page) => {
                self.handed_over = true;
                Poll::Ready(Some(Ok(Frame::data(page))))
            }
            None => Poll::Ready(None),
        }
    }

    fn is_end_stream(&self) -> bool {
        self.page.is_none()
    }

    fn size_hint(&self) -> SizeHint {
        SizeHint::with_exact(if self.handed_over { 0 } else { self.len })
    }
}

impl Drop for DeliveryBody {
    fn drop(&mut self) {
        if self.handed_over {
            info!("Password delivered to recipient");
            self.signal.report(DeliveryOutcome::Fulfilled);
        } else {
            let err = AppError::DeliveryWrite("connection closed before the page was sent".into());
            warn!("{}", err);
            self.signal.release_claim();
        }
    }
}

/// Handler: GET /{token}
async fn deliver(State(state): State<DeliveryState>) -> Response {
    // While another attempt is in flight, or once terminated, the token
    // path behaves like any unknown path
    if !state.signal.try_claim() {
        return StatusCode::NOT_FOUND.into_response();
    }

    let page = match render_page(state.secret.expose()) {
        Ok(page) => page,
        Err(e) => {
            error!("{}", AppError::DeliveryWrite(e.to_string()));
            state.signal.release_claim();
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    (
        [
            (header::CONTENT_TYPE, "text/html; charset=utf-8"),
            (header::CACHE_CONTROL, "no-store"),
        ],
        Body::new(DeliveryBody::new(page, state.signal.clone())),
    )
        .into_response()
}

/// Create the delivery router with its single token route.
pub fn delivery_router(token: &CapabilityToken, state: DeliveryState) -> Router {
    Router::new()
        .route(&token.route_path(), get(deliver))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::share::arbiter::{ArbiterState, LifecycleArbiter};
    use crate::share::secret::Secret;
    use axum::http::Request;
    use tower::ServiceExt;

    fn setup(password: &str) -> (Router, CapabilityToken, LifecycleArbiter) {
        let token = CapabilityToken::generate().unwrap();
        let arbiter = LifecycleArbiter::new();
        let state = DeliveryState {
            secret: Secret::new(password.to_string()).into_shared(),
            signal: arbiter.signal(),
        };
        (delivery_router(&token, state), token, arbiter)
    }

    async fn get_path(router: Router, path: &str) -> (StatusCode, String) {
        let request = Request::builder().uri(path).body(Body::empty()).unwrap();
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[test]
    fn test_render_escapes_markup() {
        let page = render_page("<script>alert('x')</script>&").unwrap();
        assert!(!page.contains("<script>"));
        assert!(page.contains("&lt;script&gt;"));
        assert!(page.contains("&amp;"));
    }

    #[tokio::test]
    async fn test_token_path_delivers() {
        let (router, token, arbiter) = setup("s3cr3t pass");
        let signal = arbiter.signal();

        let (status, body) = get_path(router, &token.route_path()).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("s3cr3t pass"));
        assert_eq!(
            signal.state(),
            ArbiterState::Terminated(DeliveryOutcome::Fulfilled)
        );
    }

    #[tokio::test]
    async fn test_response_is_not_cacheable() {
        let (router, token, _arbiter) = setup("pw");
        let request = Request::builder()
            .uri(token.route_path())
            .body(Body::empty())
            .unwrap();
        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.headers()[header::CACHE_CONTROL], "no-store");
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/html; charset=utf-8"
        );
    }

    #[tokio::test]
    async fn test_other_paths_do_not_deliver() {
        let (router, token, arbiter) = setup("pw");
        let signal = arbiter.signal();
        let t = token.as_str();

        let variants = [
            "/".to_string(),
            format!("/{}", t.to_uppercase()),
            format!("/{}", t.to_lowercase()),
            format!("/{}", &t[..t.len() - 1]),
            format!("/{}x", t),
            format!("/x{}", t),
            format!("/{}/", t),
            format!("/{}/extra", t),
        ];
        for path in variants {
            // Skip case variants that happen to equal the token
            if path == token.route_path() {
                continue;
            }
            let (status, body) = get_path(router.clone(), &path).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "path {}", path);
            assert!(!body.contains("pw"));
        }
        assert_eq!(signal.state(), ArbiterState::Waiting);
    }

    #[tokio::test]
    async fn test_second_request_after_delivery_is_not_served() {
        let (router, token, arbiter) = setup("only once");
        let signal = arbiter.signal();

        let (status, _) = get_path(router.clone(), &token.route_path()).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = get_path(router, &token.route_path()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(!body.contains("only once"));
        assert_eq!(
            signal.state(),
            ArbiterState::Terminated(DeliveryOutcome::Fulfilled)
        );
    }

    #[tokio::test]
    async fn test_abandoned_response_does_not_fulfil() {
        let (router, token, arbiter) = setup("pw");
        let signal = arbiter.signal();

        let request = Request::builder()
            .uri(token.route_path())
            .body(Body::empty())
            .unwrap();
        let response = router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        drop(response);
        assert_eq!(signal.state(), ArbiterState::Waiting);

        // A later complete attempt still succeeds
        let (status, body) = get_path(router, &token.route_path()).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("pw"));
        assert!(signal.is_terminated());
    }

    #[tokio::test]
    async fn test_in_flight_delivery_blocks_other_requests() {
        let (router, token, arbiter) = setup("just one");
        let signal = arbiter.signal();

        // First response is produced but its body not yet consumed
        let request = Request::builder()
            .uri(token.route_path())
            .body(Body::empty())
            .unwrap();
        let first = router.clone().oneshot(request).await.unwrap();
        assert_eq!(first.status(), StatusCode::OK);

        let (status, body) = get_path(router, &token.route_path()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(!body.contains("just one"));

        let body = axum::body::to_bytes(first.into_body(), usize::MAX)
            .await
            .unwrap();
        assert!(String::from_utf8(body.to_vec()).unwrap().contains("just one"));
        assert!(signal.is_terminated());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_concurrent_requests_deliver_at_most_once() {
        for _ in 0..50 {
            let (router, token, _arbiter) = setup("race me");
            let tasks: Vec<_> = (0..6)
                .map(|_| {
                    let router = router.clone();
                    let path = token.route_path();
                    tokio::spawn(async move { get_path(router, &path).await })
                })
                .collect();

            let mut delivered = 0;
            for task in tasks {
                let (_, body) = task.await.unwrap();
                if body.contains("race me") {
                    delivered += 1;
                }
            }
            assert_eq!(delivered, 1);
        }
    }
}

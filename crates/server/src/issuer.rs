//! The issuer owns the OAuth protocol: authorize, token, login UI and the
//! password provider. Every request this server does not route itself is
//! handed to an [`Issuer`] and its response returned unchanged.

use crate::AppResources;
use crate::error::{AppError, IssuerError};
use crate::oauth2::session::SESSION_COOKIE;
use axum::{
    body::Body,
    extract::{Request, State},
    http::{
        HeaderMap, HeaderName, HeaderValue, Uri, Version,
        header::{self, COOKIE, HOST},
        uri::PathAndQuery,
    },
    response::{IntoResponse, Response},
};
use futures::future::BoxFuture;
use hyper_rustls::HttpsConnector;
use hyper_util::{
    client::legacy::{Client, connect::HttpConnector},
    rt::TokioExecutor,
};
use tower_sessions::cookie::Cookie;
use url::Url;

/// Something that can answer issuer requests.
pub trait Issuer: Send + Sync {
    fn fetch(&self, request: Request) -> BoxFuture<'_, Response>;
}

/// Headers that describe one hop and must not be forwarded.
static HOP_BY_HOP: [HeaderName; 8] = [
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

fn strip_hop_by_hop(headers: &mut HeaderMap) {
    // Connection may name further per-hop headers.
    let named: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();
    for name in named.iter().chain(HOP_BY_HOP.iter()) {
        headers.remove(name);
    }
}

/// Drop this server's session cookie; the issuer's own cookies pass through.
fn strip_session_cookie(headers: &mut HeaderMap) {
    let kept: Vec<String> = headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .filter(|cookie| cookie.name() != SESSION_COOKIE)
        .map(|cookie| format!("{}={}", cookie.name(), cookie.value()))
        .collect();
    headers.remove(COOKIE);
    if kept.is_empty() {
        return;
    }
    if let Ok(value) = HeaderValue::from_str(&kept.join("; ")) {
        headers.insert(COOKIE, value);
    }
}

/// Reverse proxy to an issuer running as its own HTTP service.
pub struct UpstreamIssuer {
    client: Client<HttpsConnector<HttpConnector>, Body>,
    upstream: Url,
    forwarded_host: Option<HeaderValue>,
    forwarded_proto: HeaderValue,
}

impl UpstreamIssuer {
    /// `upstream_url` is the issuer's base URL; `public_url` is how clients
    /// reach this server and is passed on as `X-Forwarded-*`.
    pub fn new(upstream_url: &str, public_url: &str) -> Result<Self, IssuerError> {
        let upstream = Url::parse(upstream_url)?;
        let public = Url::parse(public_url)?;

        let https = hyper_rustls::HttpsConnectorBuilder::new()
            .with_provider_and_webpki_roots(rustls::crypto::ring::default_provider())?
            .https_or_http()
            .enable_http1()
            .enable_http2()
            .build();
        let client = Client::builder(TokioExecutor::new()).build(https);

        let forwarded_host = public.host_str().and_then(|host| {
            let host = match public.port() {
                Some(port) => format!("{host}:{port}"),
                None => host.to_string(),
            };
            HeaderValue::from_str(&host).ok()
        });
        let forwarded_proto = HeaderValue::from_str(public.scheme())
            .unwrap_or_else(|_| HeaderValue::from_static("https"));

        Ok(Self {
            client,
            upstream,
            forwarded_host,
            forwarded_proto,
        })
    }

    /// Upstream URI for a request path and query.
    pub fn target(&self, path_and_query: Option<&PathAndQuery>) -> Result<Uri, AppError> {
        let base = self.upstream.as_str().trim_end_matches('/');
        let tail = path_and_query.map(PathAndQuery::as_str).unwrap_or("/");
        format!("{base}{tail}")
            .parse()
            .map_err(|e| AppError::Upstream(format!("bad upstream uri: {e}")))
    }

    async fn forward(&self, request: Request) -> Result<Response, AppError> {
        let (mut parts, body) = request.into_parts();
        parts.uri = self.target(parts.uri.path_and_query())?;
        // The inbound hop may be h2; the client picks the upstream protocol.
        parts.version = Version::HTTP_11;
        strip_hop_by_hop(&mut parts.headers);
        strip_session_cookie(&mut parts.headers);
        parts.headers.remove(HOST);
        if let Some(host) = &self.forwarded_host {
            parts
                .headers
                .insert(HeaderName::from_static("x-forwarded-host"), host.clone());
        }
        parts.headers.insert(
            HeaderName::from_static("x-forwarded-proto"),
            self.forwarded_proto.clone(),
        );

        tracing::debug!(method = %parts.method, uri = %parts.uri, "forwarding to issuer");
        let response = self
            .client
            .request(Request::from_parts(parts, body))
            .await
            .map_err(|e| AppError::Upstream(e.to_string()))?;

        let (mut parts, body) = response.into_parts();
        strip_hop_by_hop(&mut parts.headers);
        Ok(Response::from_parts(parts, Body::new(body)))
    }
}

impl Issuer for UpstreamIssuer {
    fn fetch(&self, request: Request) -> BoxFuture<'_, Response> {
        Box::pin(async move {
            match self.forward(request).await {
                Ok(response) => response,
                Err(e) => {
                    tracing::error!(error = %e, "issuer request failed");
                    e.into_response()
                }
            }
        })
    }
}

/// Router fallback: everything unmatched belongs to the issuer.
pub async fn delegate(State(resources): State<AppResources>, request: Request) -> Response {
    resources.issuer.fetch(request).await
}

//! Liveness of this front door only; the issuer is not consulted.

/// OpenAPI tag for routes that are neither login nor issuer traffic.
pub const MISC_TAG: &str = "Miscellaneous";

#[tracing::instrument]
#[utoipa::path(
    method(get, head),
    path = "/healthz",
    tag = MISC_TAG,
    operation_id = "Liveness",
    summary = "Front door liveness",
    description = "Answers `ok` once the server has started. Owned by this server, so it is \
                   never forwarded to the issuer and stays up when the issuer is down.",
    responses(
        (status = 200, description = "Server is accepting requests", body = str, content_type = "text/plain", example = "ok")
    )
)]
pub async fn health() -> &'static str {
    "ok"
}

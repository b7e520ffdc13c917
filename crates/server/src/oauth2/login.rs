//! Login entry, callback and success hand-off.
//!
//! - `GET /` starts a login by redirecting to the issuer's `/authorize`
//! - `GET /callback` checks the returned `state` against the session
//! - `GET /success` completes a login the issuer has already verified

use crate::AppResources;
use crate::error::AppError;
use crate::oauth2::{
    OAUTH2_TAG,
    hooks::HookAction,
    identity::{get_or_create_user, normalize_email, username_from_email},
    session,
    state::generate_state,
    subject::Subject,
};
use axum::{
    Json,
    extract::{Query, RawQuery, State},
    http::{HeaderValue, StatusCode, header::LOCATION},
    response::{IntoResponse, Response},
};
use sea_orm::ConnectionTrait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tower_sessions::Session;
use url::Url;
use utoipa::{IntoParams, ToSchema};
use utoipa_axum::{router::OpenApiRouter, routes};

/// Query keys `GET /` always sets on the authorize URL.
const AUTHORIZE_KEYS: [&str; 4] = ["state", "redirect_uri", "client_id", "response_type"];

pub fn router() -> OpenApiRouter<AppResources> {
    OpenApiRouter::new()
        .routes(routes!(start_login))
        .routes(routes!(callback))
        .routes(routes!(login_success))
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CallbackResponse {
    pub message: String,
    pub params: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SuccessQuery {
    /// Hook token minted by the issuer for `login-success`.
    pub token: String,
}

/// Build the issuer's authorize URL for `state`.
///
/// Existing query pairs are carried over; the four authorize keys are replaced.
pub fn authorize_url(
    origin: &str,
    client_id: &str,
    state: &str,
    incoming_query: Option<&str>,
) -> Result<Url, url::ParseError> {
    let mut url = Url::parse(origin)?.join("/authorize")?;
    {
        let mut pairs = url.query_pairs_mut();
        if let Some(query) = incoming_query {
            for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
                if !AUTHORIZE_KEYS.contains(&key.as_ref()) {
                    pairs.append_pair(&key, &value);
                }
            }
        }
        pairs
            .append_pair("state", state)
            .append_pair("redirect_uri", &format!("{origin}/callback"))
            .append_pair("client_id", client_id)
            .append_pair("response_type", "code");
    }
    Ok(url)
}

/// Split a callback query into the first `state` value and the echoed
/// parameters. The echo keeps the last value of a repeated key.
pub fn callback_params(query: Option<&str>) -> (Option<String>, BTreeMap<String, String>) {
    let mut state = None;
    let mut params = BTreeMap::new();
    for (key, value) in url::form_urlencoded::parse(query.unwrap_or_default().as_bytes()) {
        if key == "state" && state.is_none() {
            state = Some(value.to_string());
        }
        params.insert(key.into_owned(), value.into_owned());
    }
    (state, params)
}

/// `302 Found` to `location`. Falls back to 500 if the URL is not a valid header.
fn found(location: &str) -> Response {
    match HeaderValue::from_str(location) {
        Ok(value) => (StatusCode::FOUND, [(LOCATION, value)]).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "redirect target is not a valid header value");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Start a login.
#[tracing::instrument(skip(resources, session))]
#[utoipa::path(
    get,
    path = "/",
    tag = OAUTH2_TAG,
    operation_id = "Start Login",
    summary = "Redirect to the issuer's authorize endpoint",
    description = "Generates a fresh `state`, stores it in the session and redirects to `/authorize` \
                   with `state`, `redirect_uri`, `client_id` and `response_type=code`. Other query \
                   parameters are passed through.",
    responses(
        (status = 302, description = "Redirect to the authorize endpoint"),
        (status = 500, description = "Session or randomness failure"),
    )
)]
pub async fn start_login(
    State(resources): State<AppResources>,
    session: Session,
    RawQuery(query): RawQuery,
) -> Result<Response, AppError> {
    let state = generate_state().map_err(|e| AppError::Internal(format!("randomness: {e}")))?;
    let origin = resources.config.origin();
    let url = authorize_url(origin, &resources.config.client_id, &state, query.as_deref())
        .map_err(|e| AppError::Internal(format!("authorize url: {e}")))?;

    session::remember_state(&session, &state).await?;
    tracing::debug!(location = %url, "starting login");
    Ok(found(url.as_str()))
}

/// Finish the redirect round trip.
#[tracing::instrument(skip(session, query))]
#[utoipa::path(
    get,
    path = "/callback",
    tag = OAUTH2_TAG,
    operation_id = "Login Callback",
    summary = "Verify the returned state",
    description = "Compares the first `state` query parameter with the value stored by `GET /`. \
                   The stored value is consumed whether or not it matches.",
    params(
        ("state" = Option<String>, Query, description = "State value echoed by the issuer."),
    ),
    responses(
        (status = 200, description = "State matched; all query parameters echoed", body = CallbackResponse),
        (status = 400, description = "State missing or mismatched", content_type = "application/json"),
    )
)]
pub async fn callback(
    session: Session,
    RawQuery(query): RawQuery,
) -> Result<Json<CallbackResponse>, AppError> {
    let (returned, params) = callback_params(query.as_deref());
    let stored = session::take_state(&session).await?;
    match (stored, returned) {
        (Some(stored), Some(returned)) if stored.as_bytes() == returned.as_bytes() => {
            Ok(Json(CallbackResponse {
                message: "OAuth flow complete!".to_string(),
                params,
            }))
        }
        (stored, _) => {
            tracing::warn!(had_stored_state = stored.is_some(), "state mismatch on callback");
            Err(AppError::InvalidState)
        }
    }
}

/// Complete a login the issuer has verified.
///
/// Upserts the user, asserts the `user` subject, remembers the username and
/// redirects to `redirect`.
pub async fn complete_login<C>(
    db: &C,
    session: &Session,
    email: &str,
    redirect: &str,
) -> Result<Response, AppError>
where
    C: ConnectionTrait,
{
    let email = normalize_email(email).ok_or(AppError::InvalidEmail)?;
    let user_id = get_or_create_user(db, &email).await?;
    let subject = Subject::user(user_id)
        .ok_or_else(|| AppError::Internal("store returned an empty user id".into()))?;
    session::assert_subject(session, &subject).await?;
    session::remember_username(session, username_from_email(&email)).await?;
    Ok(found(redirect))
}

/// Success hand-off from the issuer.
#[tracing::instrument(skip(resources, session, query))]
#[utoipa::path(
    get,
    path = "/success",
    tag = OAUTH2_TAG,
    operation_id = "Login Success",
    summary = "Complete a login verified by the issuer",
    description = "The issuer redirects here with a `login-success` hook token once it has verified \
                   the user's credentials. The user row is created on first login.",
    params(SuccessQuery),
    responses(
        (status = 302, description = "Redirect to the post-login target"),
        (status = 400, description = "Token carries an unusable email", content_type = "application/json"),
        (status = 401, description = "Missing, invalid or expired hook token", content_type = "application/json"),
        (status = 500, description = "User could not be stored", content_type = "application/json"),
    )
)]
pub async fn login_success(
    State(resources): State<AppResources>,
    session: Session,
    Query(query): Query<SuccessQuery>,
) -> Result<Response, AppError> {
    let claims = resources
        .hook_keys
        .verify(&query.token, HookAction::LoginSuccess)?;
    complete_login(
        resources.db.as_ref(),
        &session,
        &claims.email,
        &resources.config.post_login_redirect,
    )
    .await
}

//! Login flow in front of the issuer.
//!
//! ## Endpoints
//!
//! - `GET /` - Start a login (redirect to `/authorize`)
//! - `GET /callback` - Verify the returned `state`
//! - `GET /success` - Login success hand-off from the issuer
//! - `POST /hooks/send-code` - Verification code delivery for the password provider

pub mod code;
pub mod hooks;
pub mod identity;
pub mod login;
pub mod session;
pub mod state;
pub mod subject;

pub use code::{CodeSender, LogCodeSender, SmtpCodeSender};
pub use hooks::{HookAction, HookKeys};
pub use identity::{get_or_create_user, username_from_email};
pub use state::generate_state;
pub use subject::Subject;

use crate::AppResources;
use utoipa_axum::{router::OpenApiRouter, routes};

/// OpenAPI tag for login endpoints
pub const OAUTH2_TAG: &str = "Login";

/// Login and hook routes.
pub fn router() -> OpenApiRouter<AppResources> {
    login::router().routes(routes!(code::send_code))
}

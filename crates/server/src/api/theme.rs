//! Branding the issuer's login pages render with.

use crate::AppResources;
use crate::api::health::MISC_TAG;
use crate::config::{PasswordCopy, ThemeConfig};
use axum::{Json, extract::State};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct ThemeDocument {
    pub theme: ThemeConfig,
    pub copy: PasswordCopy,
}

#[tracing::instrument(skip(resources))]
#[utoipa::path(
    get,
    path = "/theme",
    tag = MISC_TAG,
    operation_id = "Issuer Theme",
    summary = "Theme and UI copy for the issuer's login pages",
    responses(
        (status = 200, description = "Theme document", body = ThemeDocument)
    )
)]
pub async fn theme(State(resources): State<AppResources>) -> Json<ThemeDocument> {
    Json(ThemeDocument {
        theme: resources.config.issuer.theme.clone(),
        copy: resources.config.issuer.copy.clone(),
    })
}

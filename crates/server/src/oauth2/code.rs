//! Verification-code delivery for the password provider.
//!
//! The issuer calls `POST /hooks/send-code` whenever the password flow needs a
//! code delivered to an email address.

use crate::AppResources;
use crate::config::SmtpConfig;
use crate::error::{AppError, DeliveryError, HookError};
use crate::oauth2::{OAUTH2_TAG, hooks::HookAction};
use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
};
use futures::future::BoxFuture;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    transport::smtp::authentication::Credentials,
};
use serde::Deserialize;
use utoipa::ToSchema;

/// Delivers a verification code to an email address.
pub trait CodeSender: Send + Sync {
    fn send_code<'a>(
        &'a self,
        email: &'a str,
        code: &'a str,
    ) -> BoxFuture<'a, Result<(), DeliveryError>>;
}

/// Writes the code to the log. Suitable for development only.
#[derive(Debug, Default)]
pub struct LogCodeSender;

impl CodeSender for LogCodeSender {
    fn send_code<'a>(
        &'a self,
        email: &'a str,
        code: &'a str,
    ) -> BoxFuture<'a, Result<(), DeliveryError>> {
        Box::pin(async move {
            tracing::info!("Sending code {code} to {email}");
            Ok(())
        })
    }
}

/// Mails the code over SMTP.
pub struct SmtpCodeSender {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
    subject: String,
}

impl SmtpCodeSender {
    pub fn new(config: &SmtpConfig, title: &str) -> Result<Self, DeliveryError> {
        let creds = Credentials::new(config.username.clone(), config.password.clone());
        let mailer = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.server)?
            .port(config.port)
            .credentials(creds)
            .build();
        Ok(Self {
            mailer,
            from: config.from.clone(),
            subject: format!("Your {title} code"),
        })
    }
}

impl CodeSender for SmtpCodeSender {
    fn send_code<'a>(
        &'a self,
        email: &'a str,
        code: &'a str,
    ) -> BoxFuture<'a, Result<(), DeliveryError>> {
        Box::pin(async move {
            let message = Message::builder()
                .from(
                    self.from
                        .parse()
                        .map_err(|e| DeliveryError::Address(format!("{}: {e}", self.from)))?,
                )
                .to(email
                    .parse()
                    .map_err(|e| DeliveryError::Address(format!("{email}: {e}")))?)
                .subject(self.subject.clone())
                .body(format!("Your verification code is {code}\n"))?;
            self.mailer.send(message).await?;
            tracing::info!(%email, "Verification code mailed");
            Ok(())
        })
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SendCodeRequest {
    pub email: String,
    pub code: String,
}

/// Deliver a verification code on behalf of the issuer.
#[tracing::instrument(skip(resources, headers, body), fields(email = %body.email))]
#[utoipa::path(
    post,
    path = "/hooks/send-code",
    tag = OAUTH2_TAG,
    operation_id = "Send Verification Code",
    summary = "Deliver a password-flow verification code",
    request_body(content = SendCodeRequest, content_type = "application/json"),
    responses(
        (status = 204, description = "Code handed to the delivery backend"),
        (status = 401, description = "Missing, invalid or mismatched hook token"),
        (status = 502, description = "Delivery backend failed"),
    ),
    security(("HookToken" = []))
)]
pub async fn send_code(
    State(resources): State<AppResources>,
    headers: HeaderMap,
    Json(body): Json<SendCodeRequest>,
) -> Result<StatusCode, AppError> {
    let claims = resources
        .hook_keys
        .verify_bearer(&headers, HookAction::SendCode)?;
    if !claims.email.eq_ignore_ascii_case(body.email.trim()) {
        return Err(HookError::EmailMismatch.into());
    }
    resources
        .code_sender
        .send_code(body.email.trim(), &body.code)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

//! Front door for a hosted OAuth issuer.
//!
//! Starts logins with a CSRF-protected redirect to the issuer, checks the
//! callback, runs the hooks the issuer calls after a password login and
//! forwards everything else to the issuer itself.

use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::config::AppConfig;
use crate::issuer::Issuer;
use crate::oauth2::{CodeSender, HookKeys, session::SqlSessionStore};

pub mod api;
pub mod config;
pub mod entity;
pub mod error;
pub mod issuer;
pub mod oauth2;

#[derive(Clone)]
pub struct AppResources {
    pub db: Arc<DatabaseConnection>,
    pub config: Arc<AppConfig>,
    pub issuer: Arc<dyn Issuer>,
    pub code_sender: Arc<dyn CodeSender>,
    pub hook_keys: HookKeys,
    pub sessions: SqlSessionStore,
}

impl AppResources {
    pub fn new(
        db: Arc<DatabaseConnection>,
        config: Arc<AppConfig>,
        issuer: Arc<dyn Issuer>,
        code_sender: Arc<dyn CodeSender>,
        sessions: SqlSessionStore,
    ) -> Self {
        let hook_keys = HookKeys::new(&config.hook_secret);
        Self {
            db,
            config,
            issuer,
            code_sender,
            hook_keys,
            sessions,
        }
    }
}

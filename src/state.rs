//! Shared application state handed to every request.

use crate::{
    config::AppConfig,
    services::{
        credentials::CredentialIssuer,
        photos::{AccessLog, PhotoStore},
    },
    store::Store,
};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub issuer: CredentialIssuer,
    pub photos: PhotoStore,
    pub access_log: AccessLog,

    /// Path segment the API is mounted under
    pub base_path: Arc<str>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: &AppConfig) -> Self {
        Self {
            store,
            issuer: CredentialIssuer::new(&config.clave_credenciales),
            photos: PhotoStore::new(&config.fotos_dir),
            access_log: AccessLog::new(&config.log_accesos),
            base_path: Arc::from(config.base_path.as_str()),
        }
    }
}

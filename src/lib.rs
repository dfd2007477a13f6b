pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod repository;
pub mod routes;
pub mod services;

use std::sync::Arc;

use axum::extract::FromRef;

use crate::middleware::auth::AuthConfig;
use crate::repository::{ApplicationStore, JobDirectory, NotificationStore, UserDirectory};
use crate::services::{
    file_store::FileStore,
    lifecycle_service::LifecycleService,
    notification_service::{NotificationService, NotificationSink},
};

#[derive(Clone)]
pub struct AppState {
    pub lifecycle: LifecycleService,
    pub notifications: NotificationService,
    pub auth: AuthConfig,
}

impl AppState {
    pub fn new<S>(
        store: Arc<S>,
        files: Arc<dyn FileStore>,
        notifier: Arc<dyn NotificationSink>,
        auth: AuthConfig,
    ) -> Self
    where
        S: ApplicationStore + JobDirectory + UserDirectory + NotificationStore + 'static,
    {
        let lifecycle = LifecycleService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            files,
            notifier,
        );
        let notifications = NotificationService::new(store);

        Self {
            lifecycle,
            notifications,
            auth,
        }
    }
}

impl FromRef<AppState> for AuthConfig {
    fn from_ref(state: &AppState) -> Self {
        state.auth.clone()
    }
}

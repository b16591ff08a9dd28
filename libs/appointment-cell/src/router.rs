// libs/appointment-cell/src/router.rs
use std::sync::Arc;

use axum::{
    Router,
    routing::{delete, get, patch, post},
    middleware,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;
use shared_utils::jwt::{JwtVerifier, TokenVerifier};

use crate::handlers;
use crate::services::{store_from_config, AppointmentStore};

#[derive(Clone)]
pub struct AppointmentState {
    pub store: Arc<dyn AppointmentStore>,
    pub verifier: Arc<dyn TokenVerifier>,
}

impl AppointmentState {
    pub fn new(store: Arc<dyn AppointmentStore>, verifier: Arc<dyn TokenVerifier>) -> Self {
        Self { store, verifier }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            store_from_config(config),
            Arc::new(JwtVerifier::new(config.supabase_jwt_secret.clone())),
        )
    }
}

pub fn appointment_routes(state: AppointmentState) -> Router {
    // All appointment operations require authentication
    Router::new()
        .route("/get-all-appointments", get(handlers::get_all_appointments))
        .route("/create-appointment", post(handlers::create_appointment))
        .route("/update-appointment/{id}", patch(handlers::update_appointment))
        .route("/delete-appointment/{id}", delete(handlers::delete_appointment))
        .layer(middleware::from_fn_with_state(state.verifier.clone(), auth_middleware))
        .with_state(state)
}

// libs/appointment-cell/src/handlers.rs
use axum::{
    extract::{rejection::JsonRejection, Extension, Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{AppointmentError, AppointmentRequest};
use crate::router::AppointmentState;
use crate::services::booking::AppointmentBookingService;

#[axum::debug_handler]
pub async fn get_all_appointments(
    State(state): State<AppointmentState>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let booking_service = AppointmentBookingService::new(state.store);

    let appointments = booking_service.list_patient_appointments(user.id).await?;

    Ok(Json(json!({
        "status": "success",
        "message": format!("You have {} appointments", appointments.len()),
        "data": appointments
    })))
}

#[axum::debug_handler]
pub async fn create_appointment(
    State(state): State<AppointmentState>,
    Extension(user): Extension<User>,
    body: Result<Json<AppointmentRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let Json(request) = body.map_err(AppointmentError::from)?;
    let booking_service = AppointmentBookingService::new(state.store);

    let appointment = booking_service.book_appointment(user.id, request).await?;

    Ok((StatusCode::CREATED, Json(json!({
        "status": "success",
        "message": "You have successfully made an appointment.",
        "appointment": appointment
    }))))
}

#[axum::debug_handler]
pub async fn update_appointment(
    State(state): State<AppointmentState>,
    Extension(user): Extension<User>,
    Path(appointment_id): Path<String>,
    body: Result<Json<AppointmentRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let booking_service = AppointmentBookingService::new(state.store);
    let request = body.map(|Json(request)| request).map_err(AppointmentError::from);

    let appointment = booking_service
        .update_appointment(user.id, &appointment_id, request)
        .await?;

    Ok(Json(json!({
        "status": "success",
        "message": "You have successfully updated your appointment.",
        "appointment": appointment
    })))
}

#[axum::debug_handler]
pub async fn delete_appointment(
    State(state): State<AppointmentState>,
    Extension(user): Extension<User>,
    Path(appointment_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let booking_service = AppointmentBookingService::new(state.store);

    booking_service.delete_appointment(user.id, &appointment_id).await?;

    Ok(Json(json!({
        "status": "success",
        "message": "Appointment was successfully deleted."
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use assert_matches::assert_matches;
    use chrono::Utc;
    use shared_utils::jwt::JwtVerifier;
    use uuid::Uuid;

    use crate::services::store::{MockAppointmentStore, StoreError};

    fn state(store: MockAppointmentStore) -> State<AppointmentState> {
        State(AppointmentState::new(Arc::new(store), Arc::new(JwtVerifier::new("secret"))))
    }

    fn caller() -> Extension<User> {
        Extension(User {
            id: Uuid::new_v4(),
            email: Some("patient@example.com".to_string()),
            role: Some("authenticated".to_string()),
            metadata: None,
            created_at: Some(Utc::now()),
        })
    }

    #[tokio::test]
    async fn test_update_with_bad_id_is_bad_request() {
        let result = update_appointment(
            state(MockAppointmentStore::new()),
            caller(),
            Path("12345".to_string()),
            Ok(Json(AppointmentRequest::new("checkup", "2024-01-01T10:00:00Z"))),
        )
        .await;

        assert_matches!(result, Err(AppError::BadRequest(msg)) if msg == "Incorrect id format.");
    }

    #[tokio::test]
    async fn test_delete_with_bad_id_is_bad_request() {
        let result = delete_appointment(
            state(MockAppointmentStore::new()),
            caller(),
            Path("zzz".to_string()),
        )
        .await;

        assert_matches!(result, Err(AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_list_store_fault_is_reported() {
        let mut store = MockAppointmentStore::new();
        store
            .expect_find_by_patient()
            .returning(|_| Err(StoreError::Backend("socket closed".to_string())));

        let result = get_all_appointments(state(store), caller()).await;

        assert_matches!(result, Err(AppError::Database(detail)) if detail.contains("socket closed"));
    }

    #[tokio::test]
    async fn test_create_lost_race_is_conflict() {
        let mut store = MockAppointmentStore::new();
        store.expect_find_by_date().never();
        store.expect_insert().times(1).returning(|_| Err(StoreError::DateTaken));

        let result = create_appointment(
            state(store),
            caller(),
            Ok(Json(AppointmentRequest::new("checkup", "2024-01-01T10:00:00Z"))),
        )
        .await;

        assert_matches!(
            result,
            Err(AppError::Conflict(msg)) if msg == "Appointment is not available on this date"
        );
    }

    #[tokio::test]
    async fn test_create_missing_fields_is_internal_failure() {
        let result = create_appointment(
            state(MockAppointmentStore::new()),
            caller(),
            Ok(Json(AppointmentRequest { text: Some("checkup".to_string()), date: None })),
        )
        .await;

        assert_matches!(result, Err(AppError::Internal(detail)) if detail.contains("date is required"));
    }
}

// libs/appointment-cell/src/models.rs
use axum::extract::rejection::JsonRejection;
use chrono::{DateTime, NaiveDate, SubsecRound, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_models::error::AppError;

use crate::services::store::StoreError;

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

/// One booked slot. `date` is unique across every patient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub patient: Uuid,
    pub text: String,
    pub date: DateTime<Utc>,
    #[serde(rename = "createdAt", alias = "created_at")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt", alias = "updated_at")]
    pub updated_at: DateTime<Utc>,
}

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

/// Body of create and update requests. Fields are optional here so that a
/// missing value is reported by validation rather than by the JSON extractor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppointmentRequest {
    pub text: Option<String>,
    pub date: Option<String>,
}

impl AppointmentRequest {
    pub fn new(text: impl Into<String>, date: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            date: Some(date.into()),
        }
    }
}

/// A validated appointment ready to be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAppointment {
    pub patient: Uuid,
    pub text: String,
    pub date: DateTime<Utc>,
}

impl NewAppointment {
    pub fn new(patient: Uuid, request: AppointmentRequest) -> Result<Self, AppointmentError> {
        let (text, date) = validate_fields(request)?;
        Ok(Self { patient, text, date })
    }
}

/// Validated replacement values for an existing appointment. Carries no
/// owner: `patient` never changes after creation.
#[derive(Debug, Clone, PartialEq)]
pub struct AppointmentChanges {
    pub text: String,
    pub date: DateTime<Utc>,
}

impl AppointmentChanges {
    pub fn new(request: AppointmentRequest) -> Result<Self, AppointmentError> {
        let (text, date) = validate_fields(request)?;
        Ok(Self { text, date })
    }
}

fn validate_fields(request: AppointmentRequest) -> Result<(String, DateTime<Utc>), AppointmentError> {
    let text = request
        .text
        .filter(|text| !text.trim().is_empty())
        .ok_or_else(|| AppointmentError::ValidationError("text is required".to_string()))?;

    let raw_date = request
        .date
        .filter(|date| !date.trim().is_empty())
        .ok_or_else(|| AppointmentError::ValidationError("date is required".to_string()))?;

    Ok((text, parse_slot_date(&raw_date)?))
}

/// Parses an RFC 3339 timestamp, or a bare `YYYY-MM-DD` read as midnight UTC.
/// Slots are compared at millisecond precision; finer digits are dropped.
pub fn parse_slot_date(raw: &str) -> Result<DateTime<Utc>, AppointmentError> {
    let raw = raw.trim();

    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return Ok(timestamp.with_timezone(&Utc).trunc_subsecs(3));
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|day| day.and_hms_opt(0, 0, 0))
        .map(|midnight| Utc.from_utc_datetime(&midnight))
        .ok_or_else(|| AppointmentError::ValidationError(format!("date is not a valid timestamp: {}", raw)))
}

/// Path ids are checked before any lookup happens.
pub fn parse_appointment_id(raw: &str) -> Result<Uuid, AppointmentError> {
    Uuid::parse_str(raw).map_err(|_| AppointmentError::InvalidId)
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AppointmentError {
    #[error("Incorrect id format.")]
    InvalidId,

    #[error("Appointment with given id does not exist.")]
    NotFound,

    #[error("You can not {action} appointments that you do not own.")]
    NotOwner { action: String },

    #[error("Appointment is not available on this date")]
    DateTaken,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<StoreError> for AppointmentError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::DateTaken => AppointmentError::DateTaken,
            StoreError::Backend(message) => AppointmentError::DatabaseError(message),
        }
    }
}

/// A body the JSON extractor refused is treated like any other invalid field.
impl From<JsonRejection> for AppointmentError {
    fn from(rejection: JsonRejection) -> Self {
        AppointmentError::ValidationError(rejection.body_text())
    }
}

impl From<AppointmentError> for AppError {
    fn from(error: AppointmentError) -> Self {
        let message = error.to_string();
        match error {
            AppointmentError::InvalidId => AppError::BadRequest(message),
            AppointmentError::NotFound => AppError::NotFound(message),
            AppointmentError::NotOwner { .. } => AppError::Forbidden(message),
            AppointmentError::DateTaken => AppError::Conflict(message),
            // Validation failures are reported as 500.
            AppointmentError::ValidationError(_) => AppError::Internal(message),
            AppointmentError::DatabaseError(_) => AppError::Database(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::Timelike;
    use serde_json::json;

    #[test]
    fn test_parse_slot_date_normalises_offsets() {
        let utc = parse_slot_date("2024-01-01T10:00:00Z").unwrap();
        let shifted = parse_slot_date("2024-01-01T12:00:00+02:00").unwrap();

        assert_eq!(utc, shifted);
        assert_eq!(utc.hour(), 10);
    }

    #[test]
    fn test_parse_slot_date_accepts_bare_date() {
        let date = parse_slot_date("2024-03-15").unwrap();
        assert_eq!(date, Utc.with_ymd_and_hms(2024, 3, 15, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_slot_date_keeps_millisecond_precision() {
        let first = parse_slot_date("2024-01-01T10:00:00.0001Z").unwrap();
        let second = parse_slot_date("2024-01-01T10:00:00.0002Z").unwrap();
        assert_eq!(first, second);
        assert_eq!(first, Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap());

        let millis = parse_slot_date("2024-01-01T10:00:00.123456Z").unwrap();
        assert_eq!(millis.nanosecond(), 123_000_000);
        assert_ne!(millis, parse_slot_date("2024-01-01T10:00:00.124Z").unwrap());
    }

    #[test]
    fn test_parse_slot_date_rejects_garbage() {
        assert_matches!(parse_slot_date("next tuesday"), Err(AppointmentError::ValidationError(_)));
    }

    #[test]
    fn test_new_appointment_requires_text_and_date() {
        let patient = Uuid::new_v4();

        let missing_text = AppointmentRequest { text: None, date: Some("2024-01-01".into()) };
        assert_matches!(
            NewAppointment::new(patient, missing_text),
            Err(AppointmentError::ValidationError(msg)) if msg == "text is required"
        );

        let blank_text = AppointmentRequest::new("   ", "2024-01-01");
        assert_matches!(NewAppointment::new(patient, blank_text), Err(AppointmentError::ValidationError(_)));

        let missing_date = AppointmentRequest { text: Some("checkup".into()), date: None };
        assert_matches!(
            AppointmentChanges::new(missing_date),
            Err(AppointmentError::ValidationError(msg)) if msg == "date is required"
        );

        let valid = NewAppointment::new(patient, AppointmentRequest::new("checkup", "2024-01-01T10:00:00Z")).unwrap();
        assert_eq!(valid.patient, patient);
        assert_eq!(valid.text, "checkup");
    }

    #[test]
    fn test_parse_appointment_id() {
        let id = Uuid::new_v4();
        assert_eq!(parse_appointment_id(&id.to_string()), Ok(id));
        assert_eq!(parse_appointment_id("123"), Err(AppointmentError::InvalidId));
    }

    #[test]
    fn test_appointment_json_shape() {
        let appointment = Appointment {
            id: Uuid::new_v4(),
            patient: Uuid::new_v4(),
            text: "checkup".to_string(),
            date: Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let value = serde_json::to_value(&appointment).unwrap();
        assert!(value.get("createdAt").is_some());
        assert!(value.get("updatedAt").is_some());
        assert!(value.get("created_at").is_none());
    }

    #[test]
    fn test_appointment_decodes_storage_columns() {
        let row = json!({
            "id": Uuid::new_v4(),
            "patient": Uuid::new_v4(),
            "text": "checkup",
            "date": "2024-01-01T10:00:00+00:00",
            "created_at": "2024-01-01T00:00:00+00:00",
            "updated_at": "2024-01-01T00:00:00+00:00"
        });

        let appointment: Appointment = serde_json::from_value(row).unwrap();
        assert_eq!(appointment.date, Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap());
    }

    #[test]
    fn test_error_mapping() {
        use axum::http::StatusCode;

        let cases = [
            (AppointmentError::InvalidId, StatusCode::BAD_REQUEST),
            (AppointmentError::NotFound, StatusCode::NOT_FOUND),
            (AppointmentError::NotOwner { action: "delete".into() }, StatusCode::FORBIDDEN),
            (AppointmentError::DateTaken, StatusCode::CONFLICT),
            (AppointmentError::ValidationError("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (AppointmentError::DatabaseError("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (error, status) in cases {
            assert_eq!(AppError::from(error).status_code(), status);
        }
    }

    #[test]
    fn test_store_error_conversion() {
        assert_eq!(AppointmentError::from(StoreError::DateTaken), AppointmentError::DateTaken);
        assert_eq!(
            AppointmentError::from(StoreError::Backend("timeout".into())),
            AppointmentError::DatabaseError("timeout".into())
        );
    }
}

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Method;
use serde_json::json;
use tracing::{debug, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::{return_representation, SupabaseClient, SupabaseError};

use crate::models::{Appointment, AppointmentChanges, NewAppointment};
use crate::services::store::{AppointmentStore, StoreError};

const TABLE_PATH: &str = "/rest/v1/appointments";

/// Postgres SQLSTATE for a unique constraint violation.
const UNIQUE_VIOLATION: &str = "23505";

/// Appointments kept in the `appointments` table behind PostgREST. The table
/// carries a unique index on `date`, which is what makes inserts atomic
/// insert-if-absent.
pub struct SupabaseAppointmentStore {
    supabase: SupabaseClient,
    service_key: String,
}

impl SupabaseAppointmentStore {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            service_key: config.supabase_service_role_key.clone(),
        }
    }

    fn token(&self) -> Option<&str> {
        Some(self.service_key.as_str()).filter(|key| !key.is_empty())
    }

    async fn select(&self, query: &str) -> Result<Vec<Appointment>, StoreError> {
        let path = format!("{}?{}", TABLE_PATH, query);
        self.supabase
            .request(Method::GET, &path, self.token(), None)
            .await
            .map_err(map_supabase_error)
    }
}

fn encode_date(date: DateTime<Utc>) -> String {
    urlencoding::encode(&date.to_rfc3339()).into_owned()
}

fn map_supabase_error(error: SupabaseError) -> StoreError {
    match error {
        SupabaseError::Conflict(body) if body.contains(UNIQUE_VIOLATION) => StoreError::DateTaken,
        other => StoreError::Backend(other.to_string()),
    }
}

#[async_trait]
impl AppointmentStore for SupabaseAppointmentStore {
    async fn find_by_patient(&self, patient_id: Uuid) -> Result<Vec<Appointment>, StoreError> {
        debug!("Fetching appointments for patient {}", patient_id);
        self.select(&format!("patient=eq.{}&order=created_at.asc", patient_id)).await
    }

    async fn find_by_date(&self, date: DateTime<Utc>) -> Result<Option<Appointment>, StoreError> {
        debug!("Looking up appointment on {}", date);
        let rows = self.select(&format!("date=eq.{}&limit=1", encode_date(date))).await?;
        Ok(rows.into_iter().next())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Appointment>, StoreError> {
        debug!("Fetching appointment {}", id);
        let rows = self.select(&format!("id=eq.{}&limit=1", id)).await?;
        Ok(rows.into_iter().next())
    }

    async fn insert(&self, appointment: NewAppointment) -> Result<Appointment, StoreError> {
        let now = Utc::now().to_rfc3339();
        let row = json!({
            "id": Uuid::new_v4(),
            "patient": appointment.patient,
            "text": appointment.text,
            "date": appointment.date.to_rfc3339(),
            "created_at": now,
            "updated_at": now
        });

        let created: Vec<Appointment> = self
            .supabase
            .request_with_headers(
                Method::POST,
                TABLE_PATH,
                self.token(),
                Some(row),
                Some(return_representation()),
            )
            .await
            .map_err(|e| {
                let error = map_supabase_error(e);
                if error == StoreError::DateTaken {
                    warn!("Insert lost the race for {}", appointment.date);
                }
                error
            })?;

        created
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::Backend("Insert returned no rows".to_string()))
    }

    async fn update_by_id(
        &self,
        id: Uuid,
        changes: AppointmentChanges,
    ) -> Result<Option<Appointment>, StoreError> {
        let path = format!("{}?id=eq.{}", TABLE_PATH, id);
        let update = json!({
            "text": changes.text,
            "date": changes.date.to_rfc3339(),
            "updated_at": Utc::now().to_rfc3339()
        });

        let updated: Vec<Appointment> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &path,
                self.token(),
                Some(update),
                Some(return_representation()),
            )
            .await
            .map_err(map_supabase_error)?;

        Ok(updated.into_iter().next())
    }

    async fn delete_by_id(&self, id: Uuid, patient_id: Uuid) -> Result<bool, StoreError> {
        let path = format!("{}?id=eq.{}&patient=eq.{}", TABLE_PATH, id, patient_id);

        let deleted: Vec<Appointment> = self
            .supabase
            .request_with_headers(
                Method::DELETE,
                &path,
                self.token(),
                None,
                Some(return_representation()),
            )
            .await
            .map_err(map_supabase_error)?;

        Ok(!deleted.is_empty())
    }
}

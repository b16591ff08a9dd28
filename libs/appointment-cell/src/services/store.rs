use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Appointment, AppointmentChanges, NewAppointment};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    /// Another appointment already occupies the requested date.
    #[error("An appointment already exists on this date")]
    DateTaken,

    #[error("{0}")]
    Backend(String),
}

/// Durable collection of appointments with a unique index on `date`.
///
/// Implementations must make `insert` and `update_by_id` atomic with respect
/// to the date index: of two writes racing for the same date, one fails with
/// [`StoreError::DateTaken`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AppointmentStore: Send + Sync {
    /// Appointments owned by `patient_id`, oldest first.
    async fn find_by_patient(&self, patient_id: Uuid) -> Result<Vec<Appointment>, StoreError>;

    async fn find_by_date(&self, date: DateTime<Utc>) -> Result<Option<Appointment>, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Appointment>, StoreError>;

    /// Insert-if-absent on `date`.
    async fn insert(&self, appointment: NewAppointment) -> Result<Appointment, StoreError>;

    /// `Ok(None)` when no appointment has this id.
    async fn update_by_id(
        &self,
        id: Uuid,
        changes: AppointmentChanges,
    ) -> Result<Option<Appointment>, StoreError>;

    /// Removes the appointment only when both identifiers match.
    async fn delete_by_id(&self, id: Uuid, patient_id: Uuid) -> Result<bool, StoreError>;
}

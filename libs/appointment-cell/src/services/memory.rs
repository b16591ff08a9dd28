use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::models::{Appointment, AppointmentChanges, NewAppointment};
use crate::services::store::{AppointmentStore, StoreError};

#[derive(Default)]
struct Records {
    next_seq: u64,
    by_id: HashMap<Uuid, (u64, Appointment)>,
    by_date: HashMap<DateTime<Utc>, Uuid>,
}

/// Process-local store. The date index and the records share one lock, so
/// every write checks and claims its slot in a single critical section.
#[derive(Default)]
pub struct InMemoryAppointmentStore {
    records: RwLock<Records>,
}

impl InMemoryAppointmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.by_id.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl AppointmentStore for InMemoryAppointmentStore {
    async fn find_by_patient(&self, patient_id: Uuid) -> Result<Vec<Appointment>, StoreError> {
        let records = self.records.read().await;

        let mut owned: Vec<&(u64, Appointment)> = records
            .by_id
            .values()
            .filter(|(_, appointment)| appointment.patient == patient_id)
            .collect();
        owned.sort_by_key(|(seq, _)| *seq);

        Ok(owned.into_iter().map(|(_, appointment)| appointment.clone()).collect())
    }

    async fn find_by_date(&self, date: DateTime<Utc>) -> Result<Option<Appointment>, StoreError> {
        let records = self.records.read().await;

        Ok(records
            .by_date
            .get(&date)
            .and_then(|id| records.by_id.get(id))
            .map(|(_, appointment)| appointment.clone()))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Appointment>, StoreError> {
        let records = self.records.read().await;
        Ok(records.by_id.get(&id).map(|(_, appointment)| appointment.clone()))
    }

    async fn insert(&self, appointment: NewAppointment) -> Result<Appointment, StoreError> {
        let mut records = self.records.write().await;

        if records.by_date.contains_key(&appointment.date) {
            debug!("Date {} already booked", appointment.date);
            return Err(StoreError::DateTaken);
        }

        let now = Utc::now();
        let created = Appointment {
            id: Uuid::new_v4(),
            patient: appointment.patient,
            text: appointment.text,
            date: appointment.date,
            created_at: now,
            updated_at: now,
        };

        let seq = records.next_seq;
        records.next_seq += 1;
        records.by_date.insert(created.date, created.id);
        records.by_id.insert(created.id, (seq, created.clone()));

        debug!("Inserted appointment {} for patient {}", created.id, created.patient);
        Ok(created)
    }

    async fn update_by_id(
        &self,
        id: Uuid,
        changes: AppointmentChanges,
    ) -> Result<Option<Appointment>, StoreError> {
        let mut records = self.records.write().await;
        let Records { by_id, by_date, .. } = &mut *records;

        let Some((_, appointment)) = by_id.get_mut(&id) else {
            return Ok(None);
        };

        if changes.date != appointment.date {
            if by_date.get(&changes.date).is_some_and(|holder| *holder != id) {
                debug!("Cannot move appointment {} to booked date {}", id, changes.date);
                return Err(StoreError::DateTaken);
            }
            by_date.remove(&appointment.date);
            by_date.insert(changes.date, id);
        }

        appointment.text = changes.text;
        appointment.date = changes.date;
        appointment.updated_at = Utc::now();

        debug!("Updated appointment {}", id);
        Ok(Some(appointment.clone()))
    }

    async fn delete_by_id(&self, id: Uuid, patient_id: Uuid) -> Result<bool, StoreError> {
        let mut records = self.records.write().await;

        let owned = records
            .by_id
            .get(&id)
            .is_some_and(|(_, appointment)| appointment.patient == patient_id);
        if !owned {
            return Ok(false);
        }

        if let Some((_, removed)) = records.by_id.remove(&id) {
            records.by_date.remove(&removed.date);
        }

        debug!("Deleted appointment {}", id);
        Ok(true)
    }
}

use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::models::{
    parse_appointment_id, Appointment, AppointmentChanges, AppointmentError, AppointmentRequest,
    NewAppointment,
};
use crate::services::store::{AppointmentStore, StoreError};

/// Ownership and slot rules on top of an [`AppointmentStore`]. Each operation
/// issues at most one mutating store call.
pub struct AppointmentBookingService {
    store: Arc<dyn AppointmentStore>,
}

impl AppointmentBookingService {
    pub fn new(store: Arc<dyn AppointmentStore>) -> Self {
        Self { store }
    }

    pub async fn list_patient_appointments(
        &self,
        patient_id: Uuid,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        debug!("Listing appointments for patient {}", patient_id);
        Ok(self.store.find_by_patient(patient_id).await?)
    }

    /// Books the slot for `patient_id`. The store's insert-if-absent decides
    /// the outcome, so two callers racing for a date cannot both win.
    pub async fn book_appointment(
        &self,
        patient_id: Uuid,
        request: AppointmentRequest,
    ) -> Result<Appointment, AppointmentError> {
        let new_appointment = NewAppointment::new(patient_id, request)?;
        let date = new_appointment.date;

        match self.store.insert(new_appointment).await {
            Ok(appointment) => {
                info!("Patient {} booked appointment {} on {}", patient_id, appointment.id, date);
                Ok(appointment)
            }
            Err(StoreError::DateTaken) => {
                warn!("Patient {} requested already booked date {}", patient_id, date);
                Err(AppointmentError::DateTaken)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// `request` carries the body as decoded by the caller. A body that could
    /// not be decoded is only reported once the id and ownership checks pass.
    pub async fn update_appointment(
        &self,
        caller_id: Uuid,
        raw_id: &str,
        request: Result<AppointmentRequest, AppointmentError>,
    ) -> Result<Appointment, AppointmentError> {
        let appointment_id = parse_appointment_id(raw_id)?;
        self.load_owned(caller_id, appointment_id, "update").await?;

        let changes = AppointmentChanges::new(request?)?;
        let updated = self
            .store
            .update_by_id(appointment_id, changes)
            .await?
            .ok_or(AppointmentError::NotFound)?;

        info!("Patient {} updated appointment {}", caller_id, appointment_id);
        Ok(updated)
    }

    pub async fn delete_appointment(
        &self,
        caller_id: Uuid,
        raw_id: &str,
    ) -> Result<(), AppointmentError> {
        let appointment_id = parse_appointment_id(raw_id)?;
        self.load_owned(caller_id, appointment_id, "delete").await?;

        if !self.store.delete_by_id(appointment_id, caller_id).await? {
            // Removed between the lookup and the delete.
            return Err(AppointmentError::NotFound);
        }

        info!("Patient {} deleted appointment {}", caller_id, appointment_id);
        Ok(())
    }

    async fn load_owned(
        &self,
        caller_id: Uuid,
        appointment_id: Uuid,
        action: &str,
    ) -> Result<Appointment, AppointmentError> {
        let appointment = self
            .store
            .find_by_id(appointment_id)
            .await?
            .ok_or(AppointmentError::NotFound)?;

        if appointment.patient != caller_id {
            warn!(
                "Patient {} tried to {} appointment {} owned by {}",
                caller_id, action, appointment_id, appointment.patient
            );
            return Err(AppointmentError::NotOwner { action: action.to_string() });
        }

        Ok(appointment)
    }
}

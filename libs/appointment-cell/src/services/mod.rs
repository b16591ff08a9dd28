pub mod booking;
pub mod memory;
pub mod store;
pub mod supabase;

use std::sync::Arc;

use tracing::info;

use shared_config::{AppConfig, StoreBackend};

pub use booking::AppointmentBookingService;
pub use memory::InMemoryAppointmentStore;
pub use store::{AppointmentStore, StoreError};
pub use supabase::SupabaseAppointmentStore;

/// Builds the store selected by `APPOINTMENT_STORE`.
pub fn store_from_config(config: &AppConfig) -> Arc<dyn AppointmentStore> {
    info!("Using {} appointment store", config.store_backend);

    match config.store_backend {
        StoreBackend::Memory => Arc::new(InMemoryAppointmentStore::new()),
        StoreBackend::Supabase => Arc::new(SupabaseAppointmentStore::new(config)),
    }
}

pub mod conflict;
pub mod lifecycle;
pub mod ports;
pub mod store;
pub mod workflow;

pub use conflict::ConflictChecker;
pub use ports::{AppointmentStore, DentistLookup, Notifier, PatientLookup};
pub use store::SupabaseAppointmentStore;
pub use workflow::AppointmentWorkflow;

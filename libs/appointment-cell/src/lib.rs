pub mod handlers;
pub mod messages;
pub mod models;
pub mod router;
pub mod services;

pub use messages::MessageCode;
pub use models::*;
pub use router::appointment_routes;
pub use services::AppointmentWorkflow;

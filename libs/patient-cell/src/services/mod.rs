pub mod directory;

pub use directory::PatientService;

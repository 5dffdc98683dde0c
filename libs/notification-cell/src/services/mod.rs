pub mod dispatcher;

pub use dispatcher::NotificationService;

pub mod auth;
pub mod firestore;
pub mod image;
pub mod pricing;
pub mod reminders;

pub use auth::TokenVerifier;
pub use firestore::FirestoreService;
pub use reminders::{LoggingScheduler, ReminderScheduler};

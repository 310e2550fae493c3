pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::{ConfirmationOutcome, Recipient, Venue};
pub use router::email_confirmation_routes;
pub use services::ConfirmationService;

pub mod builder;
pub mod dispatch;

pub use builder::{build_confirmation_email, html_escape};
pub use dispatch::ConfirmationService;

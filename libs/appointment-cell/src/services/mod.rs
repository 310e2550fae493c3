pub mod lifecycle;
pub mod repository;
pub mod room;

pub use lifecycle::AppointmentLifecycle;
pub use repository::AppointmentRepository;

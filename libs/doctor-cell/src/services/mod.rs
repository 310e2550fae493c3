pub mod department;
pub mod doctor;

pub use department::DepartmentService;
pub use doctor::DoctorService;

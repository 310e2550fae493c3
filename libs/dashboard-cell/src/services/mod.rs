pub mod aggregate;

pub use aggregate::{doctor_dashboard, doctor_patients, filter_patient_appointments, patient_dashboard};

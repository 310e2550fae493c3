pub mod doctor_auth;
pub mod otp;
pub mod password;
pub mod user;

pub use doctor_auth::DoctorAuthService;
pub use password::PasswordService;
pub use user::UserService;

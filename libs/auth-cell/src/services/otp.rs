use rand::Rng;

use shared_utils::mailer::EmailMessage;

pub const OTP_LENGTH: usize = 4;

/// Numeric one-time code, fresh per call and never stored server-side.
pub fn generate_otp() -> String {
    let mut rng = rand::thread_rng();
    (0..OTP_LENGTH)
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect()
}

pub fn otp_email(sender: &str, recipient: &str, otp: &str) -> EmailMessage {
    EmailMessage {
        from: sender.to_string(),
        to: recipient.to_string(),
        subject: "Here is your OTP for iTABAZA Login".to_string(),
        html: None,
        text: Some(otp.to_string()),
    }
}

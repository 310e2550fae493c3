// libs/email-confirmation-cell/src/services/builder.rs
//! HTML confirmation mail. Every interpolated value goes through [`html_escape`].

use appointment_cell::models::{Appointment, AppointmentStatus};
use shared_utils::mailer::EmailMessage;

use crate::models::Venue;

pub const SUPPORT_EMAIL: &str = "support@itabaza.com";
pub const SUPPORT_PHONE: &str = "+250 123 456 789";
pub const SITE_URL: &str = "https://itabaza-2qjt.vercel.app";

pub fn html_escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

pub fn confirmation_subject(appointment: &Appointment) -> String {
    format!(
        "iTABAZA {} Appointment Confirmation",
        appointment.consultation_type.label()
    )
}

fn intro(appointment: &Appointment) -> String {
    let verb = if appointment.status == AppointmentStatus::Confirmed {
        "confirmed"
    } else {
        "received"
    };
    let mut line = format!(
        "Your {} appointment has been {}.",
        appointment.consultation_type.label().to_lowercase(),
        verb
    );
    if !appointment.payment_status {
        line.push_str(" It will be confirmed after completing payment.");
    }
    line
}

fn detail_row(label: &str, value: &str) -> String {
    format!(
        "<tr><td style=\"padding: 8px 0; border-bottom: 1px solid #eee;\"><strong>{}:</strong></td>\
         <td style=\"padding: 8px 0; border-bottom: 1px solid #eee;\">{}</td></tr>",
        label, value
    )
}

fn instructions(appointment: &Appointment, venue: &Venue) -> String {
    let items: Vec<String> = if appointment.is_video_call() {
        vec![
            "Make sure you have a stable internet connection".to_string(),
            "Find a quiet, well-lit room for the consultation".to_string(),
            "Keep your medical history and current medications ready".to_string(),
            "Join the call 5 minutes before the scheduled time".to_string(),
        ]
    } else {
        vec![
            "Arrive 15 minutes before your appointment time".to_string(),
            "Bring a valid ID and any relevant medical documents".to_string(),
            "Wear a mask while inside the hospital".to_string(),
            format!(
                "Your assigned room is: {}",
                html_escape(venue.room.as_deref().unwrap_or("To be assigned"))
            ),
        ]
    };

    let title = if appointment.is_video_call() {
        "Before your video consultation"
    } else {
        "Before your visit"
    };

    let list: String = items.iter().map(|item| format!("<li>{}</li>", item)).collect();
    format!("<h3>{}</h3><ul>{}</ul>", title, list)
}

/// Builds the confirmation mail for one appointment.
pub fn build_confirmation_email(
    patient_email: &str,
    patient_name: &str,
    doctor_name: &str,
    appointment: &Appointment,
    venue: &Venue,
    sender: &str,
) -> EmailMessage {
    let venue_cell = format!(
        "{}<br><a href=\"{}\">{}</a>",
        html_escape(&venue.display_location()),
        html_escape(&venue.url),
        html_escape(&venue.url)
    );
    let payment = if appointment.payment_status { "Paid" } else { "Pending" };
    let date = appointment.appointment_date.format("%Y-%m-%d").to_string();

    let rows = [
        detail_row("Patient", &html_escape(patient_name)),
        detail_row("Doctor", &format!("Dr. {}", html_escape(doctor_name))),
        detail_row(
            "Problem Description",
            &html_escape(
                appointment
                    .problem_description
                    .as_deref()
                    .filter(|p| !p.trim().is_empty())
                    .unwrap_or("Not specified"),
            ),
        ),
        detail_row("Date", &date),
        detail_row(
            "Time",
            &html_escape(appointment.appointment_time.as_deref().unwrap_or("To be confirmed")),
        ),
        detail_row("Type", &html_escape(&venue.kind)),
        detail_row("Status", appointment.status.as_str()),
        detail_row("Venue", &venue_cell),
        detail_row("Payment Status", payment),
    ]
    .concat();

    let html = format!(
        "<div style=\"font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;\">\
         <h2 style=\"color: #0077b6;\">Hello, {name}!</h2>\
         <p>{intro}</p>\
         <table style=\"width: 100%; border-collapse: collapse;\">{rows}</table>\
         {instructions}\
         <p>Thank you for choosing iTABAZA.</p>\
         <p>Best regards,<br>iTABAZA Team</p>\
         <p style=\"font-size: 12px; color: #666;\">{support_email} | {support_phone} | \
         <a href=\"{site}\">{site}</a></p>\
         </div>",
        name = html_escape(patient_name),
        intro = intro(appointment),
        rows = rows,
        instructions = instructions(appointment, venue),
        support_email = SUPPORT_EMAIL,
        support_phone = SUPPORT_PHONE,
        site = SITE_URL,
    );

    EmailMessage {
        from: sender.to_string(),
        to: patient_email.to_string(),
        subject: confirmation_subject(appointment),
        html: Some(html),
        text: None,
    }
}

// libs/dashboard-cell/src/services/aggregate.rs
//! Dashboard figures computed from already-fetched appointment rows.

use std::collections::{BTreeMap, HashSet};

use chrono::{Datelike, NaiveDate};

use appointment_cell::models::{Appointment, AppointmentStatus};

use crate::models::{DoctorDashboard, DoctorPatientSummary, PatientDashboard, StatusFilter};

fn count(appointments: &[Appointment], pred: impl Fn(&Appointment) -> bool) -> usize {
    appointments.iter().filter(|a| pred(*a)).count()
}

fn same_month(date: NaiveDate, today: NaiveDate) -> bool {
    date.year() == today.year() && date.month() == today.month()
}

pub fn patient_dashboard(appointments: &[Appointment], today: NaiveDate) -> PatientDashboard {
    PatientDashboard {
        total_appointments: appointments.len(),
        upcoming_appointments: count(appointments, |a| {
            a.appointment_date >= today && a.status != AppointmentStatus::Cancelled
        }),
        pending_appointments: count(appointments, |a| a.status == AppointmentStatus::Pending),
        completed_appointments: count(appointments, |a| a.status == AppointmentStatus::Completed),
        video_call_appointments: count(appointments, Appointment::is_video_call),
        total_documents: 0,
        support_tickets: 0,
    }
}

pub fn doctor_dashboard(appointments: &[Appointment], today: NaiveDate) -> DoctorDashboard {
    let patients: HashSet<&str> = appointments
        .iter()
        .filter_map(|a| a.patient_id.as_deref())
        .collect();

    let monthly_revenue = appointments
        .iter()
        .filter(|a| same_month(a.appointment_date, today))
        .filter_map(Appointment::paid_amount)
        .sum();

    DoctorDashboard {
        total_appointments: appointments.len(),
        total_patients: patients.len(),
        pending_appointments: count(appointments, |a| a.status == AppointmentStatus::Pending),
        completed_appointments: count(appointments, |a| a.status == AppointmentStatus::Completed),
        today_appointments: count(appointments, |a| a.appointment_date == today),
        upcoming_appointments: count(appointments, |a| a.appointment_date > today),
        video_call_appointments: count(appointments, Appointment::is_video_call),
        monthly_revenue,
    }
}

/// Groups a doctor's appointments by patient. Ties on the latest date keep
/// the first row seen. Output is ordered by patient id.
pub fn doctor_patients(appointments: &[Appointment]) -> Vec<DoctorPatientSummary> {
    let mut by_patient: BTreeMap<Option<&str>, DoctorPatientSummary> = BTreeMap::new();

    for appointment in appointments {
        let key = appointment.patient_id.as_deref();
        let summary = by_patient.entry(key).or_insert_with(|| DoctorPatientSummary {
            patient_id: appointment.patient_id.clone(),
            patient_first_name: appointment.patient_first_name.clone(),
            patient_email: appointment.patient_email.clone(),
            appointment_count: 0,
            last_appointment_date: None,
            last_problem_description: None,
        });

        summary.appointment_count += 1;
        if summary
            .last_appointment_date
            .map_or(true, |last| appointment.appointment_date > last)
        {
            summary.last_appointment_date = Some(appointment.appointment_date);
            summary.last_problem_description = appointment.problem_description.clone();
        }
    }

    by_patient.into_values().collect()
}

pub fn filter_patient_appointments(
    appointments: Vec<Appointment>,
    filter: StatusFilter,
    limit: Option<usize>,
) -> Vec<Appointment> {
    appointments
        .into_iter()
        .filter(|a| filter.matches(a.status))
        .take(limit.unwrap_or(usize::MAX))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn row(id: &str, patient: &str, day: &str, status: &str, kind: &str) -> Appointment {
        Appointment::from_row(json!({
            "id": id,
            "patient_id": patient,
            "doctor_id": "d-1",
            "appointment_date": day,
            "status": status,
            "consultation_type": kind,
            "problem_description": format!("problem {}", id)
        }))
        .unwrap()
    }

    fn paid(mut appointment: Appointment, amount: f64) -> Appointment {
        appointment.payment_status = true;
        appointment.payment_amount = Some(amount);
        appointment
    }

    #[test]
    fn patient_cards() {
        let today = date("2025-07-15");
        let rows = vec![
            row("1", "p-1", "2025-07-10", "completed", "in-person"),
            row("2", "p-1", "2025-07-15", "pending", "video-call"),
            row("3", "p-1", "2025-07-20", "cancelled", "in-person"),
            row("4", "p-1", "2025-08-01", "confirmed", "video-call"),
        ];

        let cards = patient_dashboard(&rows, today);
        assert_eq!(cards.total_appointments, 4);
        assert_eq!(cards.upcoming_appointments, 2);
        assert_eq!(cards.pending_appointments, 1);
        assert_eq!(cards.completed_appointments, 1);
        assert_eq!(cards.video_call_appointments, 2);
        assert_eq!(cards.total_documents, 0);
    }

    #[test]
    fn doctor_cards() {
        let today = date("2025-07-15");
        let rows = vec![
            paid(row("1", "p-1", "2025-07-02", "completed", "in-person"), 5000.0),
            paid(row("2", "p-2", "2025-07-15", "confirmed", "video-call"), 7000.0),
            paid(row("3", "p-1", "2025-06-30", "completed", "in-person"), 9000.0),
            row("4", "p-3", "2025-07-20", "pending", "in-person"),
        ];

        let cards = doctor_dashboard(&rows, today);
        assert_eq!(cards.total_appointments, 4);
        assert_eq!(cards.total_patients, 3);
        assert_eq!(cards.pending_appointments, 1);
        assert_eq!(cards.completed_appointments, 2);
        assert_eq!(cards.today_appointments, 1);
        assert_eq!(cards.upcoming_appointments, 1);
        assert_eq!(cards.video_call_appointments, 1);
        assert!((cards.monthly_revenue - 12000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn patients_keep_their_latest_visit() {
        let rows = vec![
            row("1", "p-1", "2025-07-02", "completed", "in-person"),
            row("2", "p-2", "2025-07-05", "pending", "in-person"),
            row("3", "p-1", "2025-07-09", "pending", "in-person"),
            row("4", "p-1", "2025-07-01", "completed", "in-person"),
        ];

        let patients = doctor_patients(&rows);
        assert_eq!(patients.len(), 2);
        assert_eq!(patients[0].patient_id.as_deref(), Some("p-1"));
        assert_eq!(patients[0].appointment_count, 3);
        assert_eq!(patients[0].last_appointment_date, Some(date("2025-07-09")));
        assert_eq!(patients[0].last_problem_description.as_deref(), Some("problem 3"));
        assert_eq!(patients[1].appointment_count, 1);
    }

    #[test]
    fn patient_list_filters_then_limits() {
        let rows = vec![
            row("1", "p-1", "2025-07-02", "cancelled", "in-person"),
            row("2", "p-1", "2025-07-05", "pending", "in-person"),
            row("3", "p-1", "2025-07-09", "confirmed", "in-person"),
        ];

        let booked = filter_patient_appointments(rows.clone(), StatusFilter::Booked, None);
        assert_eq!(booked.len(), 2);

        let limited = filter_patient_appointments(rows.clone(), StatusFilter::All, Some(1));
        assert_eq!(limited[0].id, "1");

        let pending = filter_patient_appointments(
            rows,
            StatusFilter::Only(AppointmentStatus::Pending),
            None,
        );
        assert_eq!(pending.len(), 1);
    }
}

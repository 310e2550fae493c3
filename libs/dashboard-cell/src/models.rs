// libs/dashboard-cell/src/models.rs
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use appointment_cell::models::{AppointmentStatistics, AppointmentStatus};
use shared_models::error::AppError;

pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const MAX_PAGE_SIZE: usize = 100;

// ==============================================================================
// DASHBOARD CARDS
// ==============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PatientDashboard {
    pub total_appointments: usize,
    pub upcoming_appointments: usize,
    pub pending_appointments: usize,
    pub completed_appointments: usize,
    pub video_call_appointments: usize,
    pub total_documents: usize,
    pub support_tickets: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DoctorDashboard {
    pub total_appointments: usize,
    pub total_patients: usize,
    pub pending_appointments: usize,
    pub completed_appointments: usize,
    pub today_appointments: usize,
    pub upcoming_appointments: usize,
    pub video_call_appointments: usize,
    pub monthly_revenue: f64,
}

/// One row of a doctor's patient list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DoctorPatientSummary {
    pub patient_id: Option<String>,
    pub patient_first_name: Option<String>,
    pub patient_email: Option<String>,
    pub appointment_count: usize,
    pub last_appointment_date: Option<NaiveDate>,
    pub last_problem_description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct AdminStats {
    pub appointments: AppointmentStatistics,
    pub pending_doctors: usize,
    pub registered_users: usize,
}

// ==============================================================================
// QUERY PARAMETERS
// ==============================================================================

/// Patient list filter: `all`, `booked` (anything not cancelled) or one status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Booked,
    Only(AppointmentStatus),
}

impl StatusFilter {
    pub fn matches(&self, status: AppointmentStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Booked => status != AppointmentStatus::Cancelled,
            StatusFilter::Only(wanted) => *wanted == status,
        }
    }
}

impl FromStr for StatusFilter {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "" | "all" => Ok(StatusFilter::All),
            "booked" => Ok(StatusFilter::Booked),
            other => other
                .parse::<AppointmentStatus>()
                .map(StatusFilter::Only)
                .map_err(|e| AppError::BadRequest(e.to_string())),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PatientAppointmentsQuery {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DoctorAppointmentsQuery {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub page: Option<usize>,
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct Page {
    pub page: usize,
    pub limit: usize,
}

impl Page {
    /// Pages start at 1; the size is kept within `1..=MAX_PAGE_SIZE`.
    pub fn new(page: Option<usize>, limit: Option<usize>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// Saturates instead of overflowing on absurd page numbers.
    pub fn offset(&self) -> usize {
        (self.page - 1).saturating_mul(self.limit)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VideoRoomQuery {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn status_filter_parsing() {
        assert_eq!("all".parse::<StatusFilter>().unwrap(), StatusFilter::All);
        assert_eq!("booked".parse::<StatusFilter>().unwrap(), StatusFilter::Booked);
        assert_eq!(
            "pending".parse::<StatusFilter>().unwrap(),
            StatusFilter::Only(AppointmentStatus::Pending)
        );
        assert_matches!("lost".parse::<StatusFilter>(), Err(AppError::BadRequest(_)));
    }

    #[test]
    fn booked_excludes_cancelled() {
        assert!(StatusFilter::Booked.matches(AppointmentStatus::Confirmed));
        assert!(!StatusFilter::Booked.matches(AppointmentStatus::Cancelled));
        assert!(StatusFilter::All.matches(AppointmentStatus::Cancelled));
    }

    #[test]
    fn paging_bounds() {
        let page = Page::new(None, None);
        assert_eq!((page.page, page.limit, page.offset()), (1, 10, 0));

        let page = Page::new(Some(3), Some(20));
        assert_eq!(page.offset(), 40);

        let page = Page::new(Some(0), Some(10_000));
        assert_eq!((page.page, page.limit), (1, MAX_PAGE_SIZE));
    }

    #[test]
    fn huge_page_numbers_saturate() {
        let page = Page::new(Some(usize::MAX), Some(10));
        assert_eq!(page.offset(), usize::MAX);
    }
}

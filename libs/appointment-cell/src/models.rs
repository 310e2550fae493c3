// libs/appointment-cell/src/models.rs
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use shared_database::DatabaseError;

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum ConsultationType {
    #[default]
    #[serde(alias = "in_person", alias = "inperson")]
    InPerson,
    #[serde(alias = "video_call", alias = "video")]
    VideoCall,
}

impl ConsultationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConsultationType::InPerson => "in-person",
            ConsultationType::VideoCall => "video-call",
        }
    }

    /// Human readable label used in mail and dashboards.
    pub fn label(&self) -> &'static str {
        match self {
            ConsultationType::InPerson => "In-Person",
            ConsultationType::VideoCall => "Video Call",
        }
    }
}

impl fmt::Display for ConsultationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Legacy rows store status as a boolean: `false` is pending, `true` completed.
#[derive(Deserialize)]
#[serde(untagged)]
enum StatusRepr {
    Flag(bool),
    Label(String),
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case", try_from = "StatusRepr")]
pub enum AppointmentStatus {
    #[default]
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppointmentStatus {
    type Err = AppointmentError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(AppointmentStatus::Pending),
            "confirmed" => Ok(AppointmentStatus::Confirmed),
            "completed" => Ok(AppointmentStatus::Completed),
            "cancelled" | "canceled" => Ok(AppointmentStatus::Cancelled),
            other => Err(AppointmentError::ValidationError(format!(
                "Unknown appointment status: {}",
                other
            ))),
        }
    }
}

impl TryFrom<StatusRepr> for AppointmentStatus {
    type Error = AppointmentError;

    fn try_from(repr: StatusRepr) -> Result<Self, Self::Error> {
        match repr {
            StatusRepr::Flag(false) => Ok(AppointmentStatus::Pending),
            StatusRepr::Flag(true) => Ok(AppointmentStatus::Completed),
            StatusRepr::Label(label) => label.parse(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Appointment {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub patient_id: Option<String>,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub doctor_id: Option<String>,
    #[serde(default)]
    pub patient_first_name: Option<String>,
    #[serde(default)]
    pub patient_email: Option<String>,
    #[serde(default)]
    pub doc_first_name: Option<String>,
    #[serde(default)]
    pub age_of_patient: Option<i32>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub problem_description: Option<String>,
    pub appointment_date: NaiveDate,
    #[serde(default)]
    pub appointment_time: Option<String>,
    #[serde(default)]
    pub consultation_type: ConsultationType,
    #[serde(default)]
    pub status: AppointmentStatus,
    #[serde(default, deserialize_with = "null_as_false")]
    pub payment_status: bool,
    #[serde(default)]
    pub payment_transaction_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub payment_amount: Option<f64>,
    #[serde(default)]
    pub payment_currency: Option<String>,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub video_call_room_id: Option<i64>,
    #[serde(default)]
    pub video_call_room_name: Option<String>,
    #[serde(default)]
    pub video_call_url: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    /// Columns this schema does not name, kept as returned.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Appointment {
    /// Builds an appointment from a raw row, reconciling legacy column names
    /// (`appointment_id`, `appointmentType`, `slot_time`, boolean/null status).
    pub fn from_row(row: Value) -> Result<Self, AppointmentError> {
        let Value::Object(mut map) = row else {
            return Err(AppointmentError::ValidationError(
                "Appointment row is not an object".to_string(),
            ));
        };
        normalize_row(&mut map);
        Ok(serde_json::from_value(Value::Object(map))?)
    }

    pub fn is_video_call(&self) -> bool {
        self.consultation_type == ConsultationType::VideoCall
    }

    pub fn belongs_to_patient(&self, patient_id: &str) -> bool {
        self.patient_id.as_deref() == Some(patient_id)
    }

    pub fn belongs_to_doctor(&self, doctor_id: &str) -> bool {
        self.doctor_id.as_deref() == Some(doctor_id)
    }

    /// Amount counted as revenue: only paid rows with a numeric amount.
    pub fn paid_amount(&self) -> Option<f64> {
        if self.payment_status {
            self.payment_amount
        } else {
            None
        }
    }
}

fn is_missing(map: &Map<String, Value>, key: &str) -> bool {
    map.get(key).map_or(true, Value::is_null)
}

fn adopt_legacy(map: &mut Map<String, Value>, canonical: &str, legacy: &str) {
    if is_missing(map, canonical) {
        if let Some(value) = map.remove(legacy) {
            if !value.is_null() {
                map.insert(canonical.to_string(), value);
            }
        }
    }
}

fn normalize_row(map: &mut Map<String, Value>) {
    adopt_legacy(map, "id", "appointment_id");
    adopt_legacy(map, "consultation_type", "appointmentType");
    adopt_legacy(map, "appointment_time", "slot_time");

    if is_missing(map, "consultation_type") {
        map.remove("consultation_type");
    }
    if is_missing(map, "status") {
        map.remove("status");
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number identifier, got {}",
            other
        ))),
    }
}

fn opt_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected string or number identifier, got {}",
            other
        ))),
    }
}

fn null_as_false<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}

/// Amounts arrive as numbers or numeric strings; anything else counts as absent.
fn lenient_amount<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    })
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewAppointment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_id: Option<String>,
    pub doctor_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc_first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age_of_patient: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub problem_description: Option<String>,
    pub appointment_date: NaiveDate,
    #[serde(default, alias = "slot_time", skip_serializing_if = "Option::is_none")]
    pub appointment_time: Option<String>,
    #[serde(default, alias = "appointmentType")]
    pub consultation_type: ConsultationType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
}

impl NewAppointment {
    pub fn validate(&self) -> Result<(), AppointmentError> {
        if self.doctor_id.trim().is_empty() {
            return Err(AppointmentError::ValidationError("doctor_id is required".to_string()));
        }
        if self.patient_id.as_deref().map_or(true, |id| id.trim().is_empty()) {
            return Err(AppointmentError::ValidationError("patient_id is required".to_string()));
        }
        if let Some(age) = self.age_of_patient {
            if !(0..=150).contains(&age) {
                return Err(AppointmentError::ValidationError(format!(
                    "age_of_patient out of range: {}",
                    age
                )));
            }
        }
        if let Some(amount) = self.payment_amount {
            if amount < 0.0 {
                return Err(AppointmentError::ValidationError(
                    "payment_amount cannot be negative".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Partial update; only present fields are written.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppointmentUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<AppointmentStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub appointment_date: Option<NaiveDate>,
    #[serde(default, alias = "slot_time", skip_serializing_if = "Option::is_none")]
    pub appointment_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub problem_description: Option<String>,
    #[serde(default, alias = "appointmentType", skip_serializing_if = "Option::is_none")]
    pub consultation_type: Option<ConsultationType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_status: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_transaction_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_call_room_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_call_room_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_call_url: Option<String>,
}

impl AppointmentUpdate {
    pub fn status(status: AppointmentStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PaymentConfirmation {
    #[serde(default, alias = "transactionId")]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub method: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VideoRoom {
    pub room_id: i64,
    pub room_name: String,
    pub url: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppointmentStatistics {
    pub total: usize,
    pub pending: usize,
    pub confirmed: usize,
    pub completed: usize,
    pub cancelled: usize,
    pub paid: usize,
    pub unpaid: usize,
    pub video_calls: usize,
    pub in_person: usize,
    pub total_revenue: f64,
}

impl AppointmentStatistics {
    pub fn from_appointments(appointments: &[Appointment]) -> Self {
        let mut stats = Self {
            total: appointments.len(),
            ..Self::default()
        };

        for appointment in appointments {
            match appointment.status {
                AppointmentStatus::Pending => stats.pending += 1,
                AppointmentStatus::Confirmed => stats.confirmed += 1,
                AppointmentStatus::Completed => stats.completed += 1,
                AppointmentStatus::Cancelled => stats.cancelled += 1,
            }

            if appointment.payment_status {
                stats.paid += 1;
            } else {
                stats.unpaid += 1;
            }

            match appointment.consultation_type {
                ConsultationType::VideoCall => stats.video_calls += 1,
                ConsultationType::InPerson => stats.in_person += 1,
            }

            if let Some(amount) = appointment.paid_amount() {
                stats.total_revenue += amount;
            }
        }

        stats
    }
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Error, Debug)]
pub enum AppointmentError {
    #[error("Appointment not found")]
    NotFound,

    #[error("Cannot move appointment from {from} to {to}")]
    InvalidStatusTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Malformed appointment row: {0}")]
    Decode(#[from] serde_json::Error),
}

impl From<AppointmentError> for shared_models::error::AppError {
    fn from(err: AppointmentError) -> Self {
        use shared_models::error::AppError;

        let message = err.to_string();
        match err {
            AppointmentError::NotFound => AppError::NotFound(message),
            AppointmentError::InvalidStatusTransition { .. } => AppError::Conflict(message),
            AppointmentError::ValidationError(msg) => AppError::ValidationError(msg),
            AppointmentError::Database(e) => AppError::Database(e.to_string()),
            AppointmentError::Decode(e) => AppError::Internal(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row() -> Value {
        json!({
            "id": "a-1",
            "patient_id": "p-1",
            "doctor_id": 7,
            "appointment_date": "2025-07-27",
            "consultation_type": "video-call",
            "status": "confirmed",
            "payment_status": true,
            "payment_amount": "1500.50",
            "clinic_notes": "bring x-ray"
        })
    }

    #[test]
    fn typed_row_keeps_unknown_columns() {
        let appointment = Appointment::from_row(row()).unwrap();
        assert_eq!(appointment.id, "a-1");
        assert_eq!(appointment.doctor_id.as_deref(), Some("7"));
        assert_eq!(appointment.consultation_type, ConsultationType::VideoCall);
        assert_eq!(appointment.status, AppointmentStatus::Confirmed);
        assert_eq!(appointment.payment_amount, Some(1500.5));
        assert_eq!(appointment.extra["clinic_notes"], "bring x-ray");
    }

    #[test]
    fn legacy_columns_are_normalised() {
        let appointment = Appointment::from_row(json!({
            "appointment_id": 42,
            "appointment_date": "2025-07-27",
            "appointmentType": "video-call",
            "slot_time": "2-3",
            "status": false,
            "payment_status": null
        }))
        .unwrap();

        assert_eq!(appointment.id, "42");
        assert_eq!(appointment.consultation_type, ConsultationType::VideoCall);
        assert_eq!(appointment.appointment_time.as_deref(), Some("2-3"));
        assert_eq!(appointment.status, AppointmentStatus::Pending);
        assert!(!appointment.payment_status);
    }

    #[test]
    fn boolean_true_status_means_completed() {
        let appointment = Appointment::from_row(json!({
            "id": "a",
            "appointment_date": "2025-07-27",
            "status": true
        }))
        .unwrap();
        assert_eq!(appointment.status, AppointmentStatus::Completed);
        assert_eq!(appointment.consultation_type, ConsultationType::InPerson);
    }

    #[test]
    fn non_numeric_amount_is_absent() {
        let appointment = Appointment::from_row(json!({
            "id": "a",
            "appointment_date": "2025-07-27",
            "payment_status": true,
            "payment_amount": "free"
        }))
        .unwrap();
        assert_eq!(appointment.paid_amount(), None);
    }

    #[test]
    fn unknown_status_is_rejected() {
        let err = Appointment::from_row(json!({
            "id": "a",
            "appointment_date": "2025-07-27",
            "status": "teleported"
        }));
        assert!(err.is_err());
    }

    #[test]
    fn statistics_partition_rows() {
        let rows = vec![
            json!({"id": "1", "appointment_date": "2025-07-01", "status": false, "payment_status": true, "payment_amount": 100}),
            json!({"id": "2", "appointment_date": "2025-07-02", "status": true, "payment_status": true, "payment_amount": "250.5", "consultation_type": "video-call"}),
            json!({"id": "3", "appointment_date": "2025-07-03", "status": false, "payment_status": false, "payment_amount": 999}),
            json!({"id": "4", "appointment_date": "2025-07-04", "status": true, "payment_status": true}),
        ];
        let appointments: Vec<Appointment> = rows
            .into_iter()
            .map(|r| Appointment::from_row(r).unwrap())
            .collect();

        let stats = AppointmentStatistics::from_appointments(&appointments);
        assert_eq!(stats.total, 4);
        assert_eq!(stats.pending + stats.completed, stats.total);
        assert_eq!(stats.paid + stats.unpaid, stats.total);
        assert_eq!(stats.paid, 3);
        assert_eq!(stats.video_calls, 1);
        assert_eq!(stats.in_person, 3);
        assert!((stats.total_revenue - 350.5).abs() < f64::EPSILON);
    }

    #[test]
    fn new_appointment_accepts_legacy_field_names() {
        let request: NewAppointment = serde_json::from_value(json!({
            "patient_id": "p-1",
            "doctor_id": "d-1",
            "appointment_date": "2025-08-01",
            "slot_time": "11-12",
            "appointmentType": "video-call"
        }))
        .unwrap();

        assert_eq!(request.appointment_time.as_deref(), Some("11-12"));
        assert_eq!(request.consultation_type, ConsultationType::VideoCall);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn new_appointment_requires_doctor_and_patient() {
        let mut request: NewAppointment = serde_json::from_value(json!({
            "doctor_id": " ",
            "appointment_date": "2025-08-01"
        }))
        .unwrap();
        assert!(request.validate().is_err());

        request.doctor_id = "d-1".into();
        assert!(request.validate().is_err());

        request.patient_id = Some("p-1".into());
        assert!(request.validate().is_ok());
    }

    #[test]
    fn update_serialises_only_present_fields() {
        let update = AppointmentUpdate::status(AppointmentStatus::Completed);
        assert_eq!(serde_json::to_value(&update).unwrap(), json!({"status": "completed"}));
        assert!(AppointmentUpdate::default().is_empty());
        assert!(!update.is_empty());
    }
}

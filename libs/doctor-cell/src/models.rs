use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Doctor {
    #[serde(deserialize_with = "id_as_string")]
    pub id: String,
    #[serde(default)]
    pub doctor_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub qualifications: Option<String>,
    #[serde(default)]
    pub experience: Option<String>,
    #[serde(default)]
    pub phone_no: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub department_id: Option<i64>,
    /// Approval flag: `true` once an admin has approved the application.
    #[serde(default, deserialize_with = "null_as_false")]
    pub status: bool,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub is_available: Option<bool>,
    #[serde(default, skip_serializing)]
    pub password_hash: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Doctor {
    pub fn is_approved(&self) -> bool {
        self.status
    }

    pub fn display_name(&self) -> &str {
        self.doctor_name.as_deref().unwrap_or("Doctor")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Department {
    pub id: i64,
    #[serde(default)]
    pub dept_name: Option<String>,
    #[serde(default)]
    pub about: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

fn id_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!("unexpected doctor id: {}", other))),
    }
}

fn null_as_false<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}

// ==============================================================================
// REQUESTS
// ==============================================================================

/// Admin-submitted doctor profile. Accepts the camelCase names the admin
/// console sends as well as the column names.
#[derive(Debug, Clone, Deserialize)]
pub struct NewDoctorRequest {
    #[serde(alias = "doctorName")]
    pub doctor_name: String,
    pub email: String,
    #[serde(default)]
    pub qualifications: Option<String>,
    #[serde(default)]
    pub experience: Option<String>,
    #[serde(default, alias = "phoneNo")]
    pub phone_no: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default, alias = "departmentId")]
    pub department_id: Option<i64>,
    #[serde(default)]
    pub status: Option<bool>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default, alias = "isAvailable")]
    pub is_available: Option<bool>,
    /// Optional login password for the doctor dashboard.
    #[serde(default)]
    pub password: Option<String>,
}

impl NewDoctorRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.doctor_name.trim().is_empty() {
            return Err("doctorName is required".to_string());
        }
        if !self.email.contains('@') {
            return Err("A valid email is required".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DoctorStatusRequest {
    pub status: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AvailabilityRequest {
    #[serde(alias = "isAvailable")]
    pub is_available: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: Option<String>,
}

/// Escapes the characters PostgREST treats specially inside an `ilike` pattern.
pub fn ilike_pattern(term: &str) -> String {
    let cleaned: String = term
        .trim()
        .chars()
        .filter(|c| !matches!(c, '*' | '%' | ',' | '(' | ')'))
        .collect();
    format!("*{}*", cleaned)
}

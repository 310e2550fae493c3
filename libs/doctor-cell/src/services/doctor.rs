use anyhow::{anyhow, Result};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info};

use auth_cell::services::PasswordService;
use shared_database::supabase::SupabaseClient;
use shared_utils::AppState;

use crate::models::{ilike_pattern, Doctor, NewDoctorRequest};

const DOCTORS: &str = "/rest/v1/doctors";

pub struct DoctorService {
    supabase: SupabaseClient,
}

fn enc(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

impl DoctorService {
    pub fn new(state: &AppState) -> Self {
        Self {
            supabase: state.supabase.clone(),
        }
    }

    async fn list(&self, filters: &str) -> Result<Vec<Doctor>> {
        let path = format!("{}?select=*{}", DOCTORS, filters);
        debug!("Fetching doctors: {}", path);
        Ok(self.supabase.request(Method::GET, &path, None).await?)
    }

    async fn patch(&self, doctor_id: &str, body: Value) -> Result<Option<Doctor>> {
        let path = format!("{}?id=eq.{}", DOCTORS, enc(doctor_id));
        let rows: Vec<Doctor> = self
            .supabase
            .request_returning(Method::PATCH, &path, body)
            .await?;
        Ok(rows.into_iter().next())
    }

    /// Approved doctors only.
    pub async fn list_approved(&self) -> Result<Vec<Doctor>> {
        self.list("&status=eq.true&order=doctor_name.asc").await
    }

    pub async fn list_by_department(&self, department_id: i64) -> Result<Vec<Doctor>> {
        self.list(&format!(
            "&department_id=eq.{}&status=eq.true&order=doctor_name.asc",
            department_id
        ))
        .await
    }

    pub async fn search_by_name(&self, term: &str) -> Result<Vec<Doctor>> {
        self.list(&format!(
            "&doctor_name=ilike.{}&status=eq.true&order=doctor_name.asc",
            enc(&ilike_pattern(term))
        ))
        .await
    }

    pub async fn list_pending(&self) -> Result<Vec<Doctor>> {
        self.list("&status=eq.false&order=doctor_name.asc").await
    }

    pub async fn find_by_id(&self, doctor_id: &str) -> Result<Option<Doctor>> {
        let path = format!("{}?select=*&id=eq.{}", DOCTORS, enc(doctor_id));
        Ok(self.supabase.request_single(&path).await?)
    }

    pub async fn create(&self, request: NewDoctorRequest) -> Result<Doctor> {
        request.validate().map_err(|e| anyhow!(e))?;

        let password_hash = request
            .password
            .as_deref()
            .map(PasswordService::hash_password)
            .transpose()
            .map_err(|e| anyhow!(e.to_string()))?;

        let mut body = json!({
            "doctor_name": request.doctor_name.trim(),
            "email": request.email.trim().to_lowercase(),
            "qualifications": request.qualifications,
            "experience": request.experience,
            "phone_no": request.phone_no,
            "city": request.city,
            "department_id": request.department_id,
            "status": request.status.unwrap_or(false),
            "image": request.image,
            "is_available": request.is_available.unwrap_or(true),
        });
        if let Some(hash) = password_hash {
            body["password_hash"] = json!(hash);
        }

        let rows: Vec<Doctor> = self
            .supabase
            .request_returning(Method::POST, DOCTORS, body)
            .await?;
        let doctor = rows
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("Insert returned no doctor"))?;

        info!("Created doctor {} ({})", doctor.id, doctor.display_name());
        Ok(doctor)
    }

    pub async fn delete(&self, doctor_id: &str) -> Result<()> {
        let path = format!("{}?id=eq.{}", DOCTORS, enc(doctor_id));
        self.supabase.execute(Method::DELETE, &path).await?;
        info!("Deleted doctor {}", doctor_id);
        Ok(())
    }

    pub async fn approve(&self, doctor_id: &str) -> Result<Option<Doctor>> {
        info!("Approving doctor {}", doctor_id);
        self.patch(doctor_id, json!({ "status": true })).await
    }

    pub async fn set_availability(&self, doctor_id: &str, is_available: bool) -> Result<Option<Doctor>> {
        self.patch(doctor_id, json!({ "is_available": is_available })).await
    }
}

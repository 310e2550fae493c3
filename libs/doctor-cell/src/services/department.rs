use anyhow::Result;
use reqwest::Method;

use shared_database::supabase::SupabaseClient;
use shared_utils::AppState;

use crate::models::Department;

pub struct DepartmentService {
    supabase: SupabaseClient,
}

impl DepartmentService {
    pub fn new(state: &AppState) -> Self {
        Self {
            supabase: state.supabase.clone(),
        }
    }

    pub async fn list(&self) -> Result<Vec<Department>> {
        Ok(self
            .supabase
            .request(Method::GET, "/rest/v1/departments?select=*&order=id.asc", None)
            .await?)
    }

    pub async fn find_by_id(&self, department_id: i64) -> Result<Option<Department>> {
        let path = format!("/rest/v1/departments?select=*&id=eq.{}", department_id);
        Ok(self.supabase.request_single(&path).await?)
    }
}

// libs/appointment-cell/src/services/repository.rs
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use shared_database::supabase::SupabaseClient;
use shared_utils::AppState;

use crate::models::{
    Appointment, AppointmentError, AppointmentStatistics, AppointmentStatus, AppointmentUpdate,
    ConsultationType, NewAppointment, VideoRoom,
};
use crate::services::lifecycle::video_room_update;

const TABLE: &str = "/rest/v1/appointments";

/// One PostgREST round trip per call. No transactions and no retries.
pub struct AppointmentRepository {
    supabase: SupabaseClient,
}

fn enc(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// List reads skip rows that fail to normalise so one bad record cannot sink
/// every listing; single-row reads stay strict.
fn decode_rows(rows: Vec<Value>) -> Vec<Appointment> {
    rows.into_iter()
        .filter_map(|row| {
            let id = row.get("id").map(Value::to_string).unwrap_or_default();
            match Appointment::from_row(row) {
                Ok(appointment) => Some(appointment),
                Err(e) => {
                    warn!("Skipping undecodable appointment row {}: {}", id, e);
                    None
                }
            }
        })
        .collect()
}

impl AppointmentRepository {
    pub fn new(state: &AppState) -> Self {
        Self {
            supabase: state.supabase.clone(),
        }
    }

    async fn select(&self, filters: &str) -> Result<Vec<Appointment>, AppointmentError> {
        let path = format!("{}?select=*{}", TABLE, filters);
        debug!("Fetching appointments: {}", path);
        let rows: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;
        Ok(decode_rows(rows))
    }

    pub async fn create(&self, appointment: &NewAppointment) -> Result<Appointment, AppointmentError> {
        let body = serde_json::to_value(appointment)?;
        let rows: Vec<Value> = self
            .supabase
            .request_returning(Method::POST, TABLE, body)
            .await?;

        let row = rows.into_iter().next().ok_or_else(|| {
            AppointmentError::ValidationError("Insert returned no appointment".to_string())
        })?;
        let created = Appointment::from_row(row)?;
        info!("Created appointment {} for doctor {}", created.id, appointment.doctor_id);
        Ok(created)
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Appointment>, AppointmentError> {
        let path = format!("{}?select=*&id=eq.{}", TABLE, enc(id));
        match self.supabase.request_single::<Value>(&path).await? {
            Some(row) => Ok(Some(Appointment::from_row(row)?)),
            None => Ok(None),
        }
    }

    pub async fn find_by_patient_id(&self, patient_id: &str) -> Result<Vec<Appointment>, AppointmentError> {
        self.select(&format!("&patient_id=eq.{}&order=created_at.desc", enc(patient_id)))
            .await
    }

    pub async fn find_by_doctor_id(&self, doctor_id: &str) -> Result<Vec<Appointment>, AppointmentError> {
        self.select(&format!("&doctor_id=eq.{}&order=appointment_date.desc", enc(doctor_id)))
            .await
    }

    pub async fn find_all(&self) -> Result<Vec<Appointment>, AppointmentError> {
        self.select("&order=created_at.desc").await
    }

    pub async fn find_pending(&self) -> Result<Vec<Appointment>, AppointmentError> {
        self.select("&status=eq.pending&order=created_at.desc").await
    }

    pub async fn find_by_date(&self, date: NaiveDate) -> Result<Vec<Appointment>, AppointmentError> {
        self.select(&format!("&appointment_date=eq.{}&order=created_at.desc", date))
            .await
    }

    pub async fn find_by_type_and_patient(
        &self,
        consultation_type: ConsultationType,
        patient_id: &str,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        self.select(&format!(
            "&consultation_type=eq.{}&patient_id=eq.{}&order=created_at.desc",
            consultation_type,
            enc(patient_id)
        ))
        .await
    }

    pub async fn find_by_doctor_and_date(
        &self,
        doctor_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        self.select(&format!(
            "&doctor_id=eq.{}&appointment_date=eq.{}&order=created_at.desc",
            enc(doctor_id),
            date
        ))
        .await
    }

    /// Most recent appointments booked under `email` since `since`, newest first.
    pub async fn find_recent_by_email(
        &self,
        email: &str,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        self.select(&format!(
            "&patient_email=eq.{}&created_at=gte.{}&order=created_at.desc&limit={}",
            enc(email),
            enc(&since.to_rfc3339()),
            limit
        ))
        .await
    }

    /// Doctor appointments page, newest date first, optionally filtered by status.
    pub async fn find_by_doctor_page(
        &self,
        doctor_id: &str,
        status: Option<AppointmentStatus>,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let status_filter = status
            .map(|s| format!("&status=eq.{}", s))
            .unwrap_or_default();
        self.select(&format!(
            "&doctor_id=eq.{}{}&order=appointment_date.desc&offset={}&limit={}",
            enc(doctor_id),
            status_filter,
            offset,
            limit
        ))
        .await
    }

    /// `Ok(None)` when no row has this id.
    pub async fn update(
        &self,
        id: &str,
        update: &AppointmentUpdate,
    ) -> Result<Option<Appointment>, AppointmentError> {
        let path = format!("{}?id=eq.{}", TABLE, enc(id));
        let body = serde_json::to_value(update)?;
        let rows: Vec<Value> = self
            .supabase
            .request_returning(Method::PATCH, &path, body)
            .await?;

        rows.into_iter().next().map(Appointment::from_row).transpose()
    }

    pub async fn delete(&self, id: &str) -> Result<(), AppointmentError> {
        let path = format!("{}?id=eq.{}", TABLE, enc(id));
        self.supabase.execute(Method::DELETE, &path).await?;
        info!("Deleted appointment {}", id);
        Ok(())
    }

    pub async fn get_statistics(&self) -> Result<AppointmentStatistics, AppointmentError> {
        let appointments = self.select("").await?;
        Ok(AppointmentStatistics::from_appointments(&appointments))
    }

    /// Video-call rows that already carry a meeting URL, earliest date first.
    pub async fn find_video_call_appointments(
        &self,
        patient_id: Option<&str>,
        doctor_id: Option<&str>,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let mut filters = format!(
            "&consultation_type=eq.{}&video_call_url=not.is.null",
            ConsultationType::VideoCall
        );
        if let Some(patient_id) = patient_id {
            filters.push_str(&format!("&patient_id=eq.{}", enc(patient_id)));
        }
        if let Some(doctor_id) = doctor_id {
            filters.push_str(&format!("&doctor_id=eq.{}", enc(doctor_id)));
        }
        filters.push_str("&order=appointment_date.asc");
        self.select(&filters).await
    }

    pub async fn assign_video_room(
        &self,
        id: &str,
        room: &VideoRoom,
    ) -> Result<Option<Appointment>, AppointmentError> {
        info!("Assigning {} to appointment {}", room.room_name, id);
        self.update(id, &video_room_update(room.clone())).await
    }

    /// Rooms the database reports free at the given slot.
    pub async fn get_available_video_rooms(
        &self,
        date: NaiveDate,
        time: &str,
    ) -> Result<Vec<Value>, AppointmentError> {
        let rooms: Vec<Value> = self
            .supabase
            .rpc(
                "get_available_video_rooms",
                json!({
                    "p_appointment_date": date,
                    "p_appointment_time": time,
                }),
            )
            .await?;
        Ok(rooms)
    }
}

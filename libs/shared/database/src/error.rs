use serde::Deserialize;
use thiserror::Error;

/// PostgREST code for "no (or more than one) row returned" on a single-object request.
pub const NO_ROWS_CODE: &str = "PGRST116";

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Authentication error ({status}): {message}")]
    Auth { status: u16, message: String },

    #[error("API error ({status}): {message}")]
    Api {
        status: u16,
        code: Option<String>,
        message: String,
    },

    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid response payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid header value: {0}")]
    InvalidHeader(String),
}

impl DatabaseError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, DatabaseError::Api { code: Some(code), .. } if code == NO_ROWS_CODE)
    }

    pub fn from_response(status: u16, body: &str) -> Self {
        #[derive(Deserialize)]
        struct PostgrestError {
            code: Option<String>,
            message: Option<String>,
        }

        let parsed = serde_json::from_str::<PostgrestError>(body).ok();
        let message = parsed
            .as_ref()
            .and_then(|e| e.message.clone())
            .unwrap_or_else(|| body.to_string());

        match status {
            401 | 403 => DatabaseError::Auth { status, message },
            _ => DatabaseError::Api {
                status,
                code: parsed.and_then(|e| e.code),
                message,
            },
        }
    }
}

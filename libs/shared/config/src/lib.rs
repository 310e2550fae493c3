use std::env;
use tracing::warn;

pub const DEFAULT_ALLOWED_ORIGINS: &[&str] = &[
    "https://itabaza-2qjt.vercel.app",
    "http://localhost:3000",
    "http://127.0.0.1:3000",
    "http://0.0.0.0:3000",
];

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_service_key: String,
    pub jwt_secret: String,
    pub mail_api_url: String,
    pub mail_user: String,
    pub mail_password: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,
    pub video_call_base_url: String,
    pub video_portal_url: String,
    pub strict_status_transitions: bool,
}

fn required(name: &str) -> String {
    env::var(name).unwrap_or_else(|_| {
        warn!("{} not set, using empty value", name);
        String::new()
    })
}

fn with_default(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| {
        warn!("{} not set, using default", name);
        default.to_string()
    })
}

impl AppConfig {
    pub fn from_env() -> Self {
        let port = env::var("PORT")
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or(8080);

        let allowed_origins = match env::var("CORS_ALLOWED_ORIGINS") {
            Ok(list) => parse_origins(&list),
            Err(_) => DEFAULT_ALLOWED_ORIGINS.iter().map(|o| o.to_string()).collect(),
        };

        let strict_status_transitions = env::var("STRICT_STATUS_TRANSITIONS")
            .map(|value| matches!(value.trim(), "1" | "true" | "TRUE" | "yes"))
            .unwrap_or(false);

        let config = Self {
            supabase_url: required("SUPABASE_URL"),
            supabase_service_key: required("SUPABASE_SERVICE_KEY"),
            jwt_secret: required("JWT_SECRET"),
            mail_api_url: required("MAIL_API_URL"),
            mail_user: required("EMAIL_USER"),
            mail_password: required("EMAIL_PASS"),
            port,
            allowed_origins,
            video_call_base_url: with_default("VIDEO_CALL_BASE_URL", "https://meet.jit.si"),
            video_portal_url: with_default(
                "VIDEO_PORTAL_URL",
                "https://itabaza-videocall.onrender.com/",
            ),
            strict_status_transitions,
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }
        if !config.is_mail_configured() {
            warn!("Mail transport not configured - confirmation emails will fail");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.supabase_url.is_empty()
            && !self.supabase_service_key.is_empty()
            && !self.jwt_secret.is_empty()
    }

    pub fn is_mail_configured(&self) -> bool {
        !self.mail_api_url.is_empty() && !self.mail_user.is_empty() && !self.mail_password.is_empty()
    }
}

/// Splits a comma separated origin list, dropping blanks and trailing slashes.
pub fn parse_origins(list: &str) -> Vec<String> {
    list.split(',')
        .map(|origin| origin.trim().trim_end_matches('/'))
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_origins_trims_entries() {
        let origins = parse_origins(" https://a.example/ ,http://localhost:3000,, ");
        assert_eq!(origins, vec!["https://a.example", "http://localhost:3000"]);
    }

    #[test]
    fn mail_readiness_requires_all_fields() {
        let config = AppConfig {
            supabase_url: "http://db".into(),
            supabase_service_key: "key".into(),
            jwt_secret: "secret".into(),
            mail_api_url: "http://mail".into(),
            mail_user: "clinic@example.com".into(),
            mail_password: String::new(),
            port: 8080,
            allowed_origins: vec![],
            video_call_base_url: "https://meet.jit.si".into(),
            video_portal_url: "https://portal".into(),
            strict_status_transitions: false,
        };
        assert!(config.is_configured());
        assert!(!config.is_mail_configured());
    }
}

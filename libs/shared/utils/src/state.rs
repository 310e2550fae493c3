use std::sync::Arc;

use shared_config::AppConfig;
use shared_database::SupabaseClient;

use crate::mailer::{HttpMailTransport, MailTransport};

/// Process-wide handles, built once at startup and shared by every request.
pub struct AppState {
    pub config: AppConfig,
    pub supabase: SupabaseClient,
    pub mailer: Arc<dyn MailTransport>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let mailer = Arc::new(HttpMailTransport::new(&config));
        Self::with_mailer(config, mailer)
    }

    pub fn with_mailer(config: AppConfig, mailer: Arc<dyn MailTransport>) -> Self {
        Self {
            supabase: SupabaseClient::new(&config),
            config,
            mailer,
        }
    }
}

use std::sync::Arc;
use std::time::Duration;

use crate::config::Settings;
use crate::db::Database;
use crate::session::SessionManager;

/// Upstream calls (NOAA) give up after this long and fall back to sample data
const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub session_manager: SessionManager,
    pub settings: Arc<Settings>,
    pub http: reqwest::Client,
}

impl AppState {
    pub fn new(db: Database, settings: Settings) -> Self {
        let session_manager = SessionManager::new(db.clone(), settings.auth.session_days);
        let http = reqwest::Client::builder()
            .timeout(UPSTREAM_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            db,
            session_manager,
            settings: Arc::new(settings),
            http,
        }
    }

    /// Get authenticated user ID from session token
    pub fn get_authenticated_user_id_from_token(
        &self,
        token: &str,
    ) -> anyhow::Result<Option<uuid::Uuid>> {
        self.session_manager.validate_session(token)
    }
}

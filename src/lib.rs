pub mod config;
pub mod dto;
pub mod error;
pub mod models;
pub mod services;

use crate::services::content_service::ContentService;
use crate::services::grading_service::AiGradingService;
use crate::services::session_service::SessionService;
use reqwest::Client;

/// Host-facing bundle of the two remote-service clients over one shared HTTP
/// client. The session runner, dialogue engine and report aggregator are
/// plain values and need no state here.
#[derive(Clone)]
pub struct AppState {
    pub session_service: SessionService,
    pub grading_service: AiGradingService,
}

impl AppState {
    pub fn new() -> Self {
        let config = crate::config::get_config();
        let http_client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.http_timeout_seconds))
            .build()
            .unwrap();

        let content_service = ContentService::new(
            config.content_api_url.clone(),
            config.content_api_key.clone(),
            http_client.clone(),
        );
        let session_service = SessionService::new(content_service);
        let grading_service = AiGradingService::new(
            config.grading_api_key.clone(),
            config.grading_model.clone(),
            http_client,
        );

        Self {
            session_service,
            grading_service,
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

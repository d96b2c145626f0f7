//! Health check endpoint.

use actix_web::{HttpResponse, web};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub timestamp: String,
    /// Which step scheduler the campaigns run on.
    pub campaign_backend: &'static str,
}

/// Health check endpoint - returns server status.
///
/// GET /api/health
pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    let response = HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: chrono::Utc::now().to_rfc3339(),
        campaign_backend: state.campaigns.backend(),
    };

    HttpResponse::Ok().json(response)
}

#[cfg(test)]
mod tests {
    use actix_web::{App, test};
    use serde_json::Value;

    use crate::handlers::configure_app;
    use crate::handlers::testing::RecordingMailer;
    use crate::state::AppState;

    #[actix_web::test]
    async fn reports_status_and_backend() {
        let state = AppState::in_memory(RecordingMailer::shared());
        let app = test::init_service(App::new().configure(|cfg| configure_app(cfg, state.clone())))
            .await;

        let res = test::call_service(&app, test::TestRequest::get().uri("/api/health").to_request())
            .await;
        assert!(res.status().is_success());

        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["campaignBackend"], "timer");
        assert!(body["timestamp"].is_string());
    }
}

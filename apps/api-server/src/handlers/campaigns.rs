//! Campaign trigger endpoints.

use actix_web::{HttpResponse, web};
use serde_json::json;

use sambal_core::domain::{
    CampaignKind, CampaignMode, CartItem, FormSubmission, Recipient, SubmissionKind,
};
use sambal_infra::ScheduledCampaign;
use sambal_shared::ApiResponse;
use sambal_shared::dto::{CampaignScheduled, CampaignTestTrigger, RecipientDto};

use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

fn recipient(dto: RecipientDto) -> Recipient {
    Recipient {
        email: dto.email,
        name: dto
            .name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty()),
        cart_items: dto
            .cart_items
            .into_iter()
            .map(|item| CartItem {
                name: item.name,
                quantity: item.quantity,
                unit_price: item.unit_price,
            })
            .collect(),
        cart_total: dto.cart_total,
        order_number: dto.order_number,
        products: dto.products,
    }
}

fn scheduled(message: impl Into<String>, outcome: ScheduledCampaign) -> HttpResponse {
    HttpResponse::Ok().json(ApiResponse::ok(
        message,
        CampaignScheduled {
            campaign: outcome.campaign.to_string(),
            mode: outcome.mode.as_str().to_string(),
            steps_armed: outcome.armed.len(),
            offsets_seconds: outcome.armed.iter().map(|d| d.as_secs()).collect(),
        },
    ))
}

/// POST /api/review-request
pub async fn review_request(
    state: web::Data<AppState>,
    body: web::Json<RecipientDto>,
) -> AppResult<HttpResponse> {
    let recipient = recipient(body.into_inner());
    let outcome = state
        .campaigns
        .schedule(CampaignKind::ReviewRequest, recipient.clone(), CampaignMode::Production)
        .await?;

    let record = FormSubmission::new(
        SubmissionKind::ReviewRequest,
        &recipient.email,
        json!({ "orderNumber": recipient.order_number, "products": recipient.products }),
    )
    .with_name(recipient.name);
    if let Err(e) = state.submissions.save(record).await {
        tracing::warn!(error = %e, "Review request scheduled but not recorded");
    }

    Ok(scheduled("Review request scheduled.", outcome))
}

/// POST /api/abandoned-cart
pub async fn abandoned_cart(
    state: web::Data<AppState>,
    body: web::Json<RecipientDto>,
) -> AppResult<HttpResponse> {
    let outcome = state
        .campaigns
        .schedule(
            CampaignKind::AbandonedCart,
            recipient(body.into_inner()),
            CampaignMode::Production,
        )
        .await?;

    Ok(scheduled("Cart reminders scheduled.", outcome))
}

/// POST /api/drip/subscribe
pub async fn drip_subscribe(
    state: web::Data<AppState>,
    body: web::Json<RecipientDto>,
) -> AppResult<HttpResponse> {
    let outcome = state
        .campaigns
        .schedule(
            CampaignKind::EducationalDrip,
            recipient(body.into_inner()),
            CampaignMode::Production,
        )
        .await?;

    Ok(scheduled(
        "You're subscribed! Your first sambal lesson is on its way.",
        outcome,
    ))
}

fn parse_mode(mode: Option<&str>) -> AppResult<CampaignMode> {
    match mode.map(str::trim) {
        None | Some("") | Some("quick_test") | Some("quick-test") => Ok(CampaignMode::QuickTest),
        Some("production") => Ok(CampaignMode::Production),
        Some(other) => Err(AppError::Validation(vec![format!(
            "Unknown mode '{}'. Use quick_test or production.",
            other
        )])),
    }
}

/// POST /api/test/campaigns/{campaign}
///
/// The only way to run a campaign in quick-test mode. 404 unless enabled.
pub async fn test_trigger(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<CampaignTestTrigger>,
) -> AppResult<HttpResponse> {
    if !state.campaign_test_endpoints {
        return Err(AppError::NotFound("Not found".to_string()));
    }

    let campaign: CampaignKind = path.into_inner().parse()?;
    let body = body.into_inner();
    let mode = parse_mode(body.mode.as_deref())?;

    tracing::info!(campaign = %campaign, mode = mode.as_str(), "Test campaign triggered");

    let outcome = state
        .campaigns
        .schedule(campaign, recipient(body.order_data), mode)
        .await?;

    Ok(scheduled(format!("{} scheduled ({}).", campaign, mode.as_str()), outcome))
}

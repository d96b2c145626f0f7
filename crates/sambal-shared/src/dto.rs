//! Data Transfer Objects - request/response types for the API.

use serde::{Deserialize, Serialize};

/// POST /api/contact
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub subject: Option<String>,
}

/// POST /api/newsletter
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsletterRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
}

/// POST /api/waitlist
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaitlistRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub product: String,
}

/// POST /api/interest
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterestRequest {
    #[serde(default)]
    pub product: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
}

/// POST /api/preorder
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreorderRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub product: String,
    #[serde(default)]
    pub quantity: u32,
}

/// POST /api/feedback
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub rating: u8,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub order_number: Option<String>,
}

/// Cart line as sent by the storefront; prices in pence.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemDto {
    pub name: String,
    #[serde(default = "one")]
    pub quantity: u32,
    #[serde(default)]
    pub unit_price: u32,
}

fn one() -> u32 {
    1
}

/// Recipient data for campaign triggers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipientDto {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub cart_items: Vec<CartItemDto>,
    #[serde(default)]
    pub cart_total: Option<u32>,
    #[serde(default)]
    pub order_number: Option<String>,
    #[serde(default)]
    pub products: Vec<String>,
}

/// POST /api/test/campaigns/{campaign}
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignTestTrigger {
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default, alias = "recipient")]
    pub order_data: RecipientDto,
}

/// Returned once a submission is accepted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionAccepted {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// True when the store was unreachable and the write was skipped.
    #[serde(skip_serializing_if = "std::ops::Not::not", default)]
    pub simulated: bool,
}

/// Returned once a campaign's steps are armed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignScheduled {
    pub campaign: String,
    pub mode: String,
    pub steps_armed: usize,
    pub offsets_seconds: Vec<u64>,
}

/// Price as shown on the storefront.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceDto {
    pub unit_amount: u32,
    pub currency: String,
    pub display: String,
    pub source: String,
}

/// Catalog entry with its current price.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductResponse {
    pub slug: String,
    pub name: String,
    pub description: String,
    pub heat_level: u8,
    pub size_grams: u32,
    pub price: PriceDto,
}

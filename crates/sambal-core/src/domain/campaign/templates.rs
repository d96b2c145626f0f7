//! Step tables and payload builders for each campaign.

use std::time::Duration;

use serde_json::{Value, json};

use super::{Recipient, StepContext, StepDefinition};
use crate::domain::product::format_gbp;

const HOUR: u64 = 60 * 60;
const DAY: u64 = 24 * HOUR;

const fn secs(value: u64) -> Duration {
    Duration::from_secs(value)
}

const fn step(
    template_id: &'static str,
    production: u64,
    quick_test: u64,
    build: fn(&Recipient, &StepContext) -> Value,
) -> StepDefinition {
    StepDefinition {
        template_id,
        production_offset: secs(production),
        quick_test_offset: secs(quick_test),
        build,
    }
}

pub(super) static ABANDONED_CART: [StepDefinition; 3] = [
    step("abandoned-cart-reminder", HOUR, 10, cart_payload),
    step("abandoned-cart-followup", 24 * HOUR, 20, cart_payload),
    step("abandoned-cart-last-chance", 72 * HOUR, 30, cart_last_chance_payload),
];

pub(super) static REVIEW_REQUEST: [StepDefinition; 2] = [
    step("review-request", 3 * DAY, 10, review_payload),
    step("review-request-reminder", 7 * DAY, 20, review_payload),
];

pub(super) static WELCOME_SERIES: [StepDefinition; 5] = [
    step("welcome-hello", 0, 5, welcome_payload),
    step("welcome-our-story", 2 * DAY, 10, welcome_payload),
    step("welcome-heat-guide", 4 * DAY, 15, welcome_payload),
    step("welcome-recipes", 7 * DAY, 20, welcome_payload),
    step("welcome-first-order", 10 * DAY, 25, welcome_offer_payload),
];

pub(super) static EDUCATIONAL_DRIP: [StepDefinition; 12] = [
    step("educational-drip-lesson", 0, 5, drip_payload),
    step("educational-drip-lesson", 7 * DAY, 10, drip_payload),
    step("educational-drip-lesson", 14 * DAY, 15, drip_payload),
    step("educational-drip-lesson", 21 * DAY, 20, drip_payload),
    step("educational-drip-lesson", 28 * DAY, 25, drip_payload),
    step("educational-drip-lesson", 35 * DAY, 30, drip_payload),
    step("educational-drip-lesson", 42 * DAY, 35, drip_payload),
    step("educational-drip-lesson", 49 * DAY, 40, drip_payload),
    step("educational-drip-lesson", 56 * DAY, 45, drip_payload),
    step("educational-drip-lesson", 63 * DAY, 50, drip_payload),
    step("educational-drip-lesson", 70 * DAY, 55, drip_payload),
    step("educational-drip-lesson", 77 * DAY, 60, drip_payload),
];

/// One topic per drip lesson.
pub static DRIP_TOPICS: [&str; 12] = [
    "What makes a sambal a sambal",
    "Chillies of the archipelago",
    "Terasi: the shrimp paste behind the depth",
    "Raw versus cooked sambal",
    "Sambal matah from Bali",
    "Sambal ijo and the green chilli tradition",
    "Balancing heat, sweetness and acidity",
    "Storing sambal the right way",
    "Sambal with British breakfasts",
    "Weeknight rice bowls",
    "Sambal in marinades and dressings",
    "Building your own house sambal",
];

const LAST_CHANCE_CODE: &str = "SAMBAL10";
const WELCOME_CODE: &str = "WELCOME10";

/// First word of the recipient's name, or a friendly default.
pub fn first_name(recipient: &Recipient) -> String {
    recipient
        .name
        .as_deref()
        .and_then(|name| name.split_whitespace().next())
        .map(str::to_string)
        .unwrap_or_else(|| "there".to_string())
}

fn cart_payload(recipient: &Recipient, _step: &StepContext) -> Value {
    let items: Vec<Value> = recipient
        .cart_items
        .iter()
        .map(|item| {
            json!({
                "name": item.name,
                "quantity": item.quantity,
                "lineTotal": format_gbp(item.line_total()),
            })
        })
        .collect();

    json!({
        "firstName": first_name(recipient),
        "cartItems": items,
        "cartTotal": format_gbp(recipient.cart_total()),
        "cartUrl": "/cart",
    })
}

fn cart_last_chance_payload(recipient: &Recipient, step: &StepContext) -> Value {
    let mut payload = cart_payload(recipient, step);
    if let Some(fields) = payload.as_object_mut() {
        fields.insert("discountCode".into(), json!(LAST_CHANCE_CODE));
        fields.insert("discountPercent".into(), json!(10));
    }
    payload
}

fn review_payload(recipient: &Recipient, step: &StepContext) -> Value {
    let order_number = recipient.order_number.clone().unwrap_or_default();
    json!({
        "firstName": first_name(recipient),
        "orderNumber": order_number,
        "products": recipient.products,
        "reviewUrl": format!("/reviews/new?order={}", order_number),
        "isReminder": step.step_number > 1,
    })
}

fn welcome_payload(recipient: &Recipient, step: &StepContext) -> Value {
    json!({
        "firstName": first_name(recipient),
        "emailNumber": step.step_number,
        "totalEmails": step.total_steps,
    })
}

fn welcome_offer_payload(recipient: &Recipient, step: &StepContext) -> Value {
    let mut payload = welcome_payload(recipient, step);
    if let Some(fields) = payload.as_object_mut() {
        fields.insert("discountCode".into(), json!(WELCOME_CODE));
        fields.insert("shopUrl".into(), json!("/shop"));
    }
    payload
}

fn drip_payload(recipient: &Recipient, step: &StepContext) -> Value {
    let topic = DRIP_TOPICS
        .get(step.step_number.saturating_sub(1))
        .copied()
        .unwrap_or("More from the sambal kitchen");
    json!({
        "firstName": first_name(recipient),
        "lesson": step.step_number,
        "totalLessons": step.total_steps,
        "topic": topic,
    })
}

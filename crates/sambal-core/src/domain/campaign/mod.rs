//! Campaign sequences - ordered templated emails sent at offsets after a trigger.
//!
//! A campaign is pure data: a static list of steps, each with a production
//! offset, a compressed quick-test offset, a template id and a payload builder.
//! Arming the steps is the job of a [`StepScheduler`](crate::ports::StepScheduler).

mod templates;

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::email::is_valid_email;
use crate::error::DomainError;

pub use templates::{DRIP_TOPICS, first_name};

/// The named campaign templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignKind {
    AbandonedCart,
    ReviewRequest,
    WelcomeSeries,
    EducationalDrip,
}

/// Offset regime, chosen per invocation and never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignMode {
    /// Real-world offsets (hours, days).
    Production,
    /// Offsets compressed to seconds for manual verification.
    QuickTest,
}

impl CampaignMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CampaignMode::Production => "production",
            CampaignMode::QuickTest => "quick_test",
        }
    }
}

/// One line of an abandoned cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub name: String,
    pub quantity: u32,
    /// Unit price in pence.
    pub unit_price: u32,
}

impl CartItem {
    pub fn line_total(&self) -> u32 {
        self.unit_price.saturating_mul(self.quantity)
    }
}

/// Who a sequence is sent to, plus the event data its templates personalise with.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipient {
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub cart_items: Vec<CartItem>,
    /// Cart total in pence; derived from the items when absent.
    #[serde(default)]
    pub cart_total: Option<u32>,
    #[serde(default)]
    pub order_number: Option<String>,
    #[serde(default)]
    pub products: Vec<String>,
}

impl Recipient {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            ..Self::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Saturates at `u32::MAX` rather than overflowing on absurd prices.
    pub fn cart_total(&self) -> u32 {
        self.cart_total.unwrap_or_else(|| {
            self.cart_items
                .iter()
                .fold(0u32, |total, item| total.saturating_add(item.line_total()))
        })
    }
}

/// Position of a step within its sequence, handed to payload builders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepContext {
    /// 1-based.
    pub step_number: usize,
    pub total_steps: usize,
}

/// Builds a template's dynamic data from the recipient.
pub type PayloadBuilder = fn(&Recipient, &StepContext) -> serde_json::Value;

/// Static definition of one campaign step.
#[derive(Clone, Copy)]
pub struct StepDefinition {
    pub template_id: &'static str,
    pub production_offset: Duration,
    pub quick_test_offset: Duration,
    pub build: PayloadBuilder,
}

impl StepDefinition {
    pub fn offset(&self, mode: CampaignMode) -> Duration {
        match mode {
            CampaignMode::Production => self.production_offset,
            CampaignMode::QuickTest => self.quick_test_offset,
        }
    }
}

impl fmt::Debug for StepDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepDefinition")
            .field("template_id", &self.template_id)
            .field("production_offset", &self.production_offset)
            .field("quick_test_offset", &self.quick_test_offset)
            .finish()
    }
}

/// A step resolved for one invocation: offset fixed by the mode.
#[derive(Clone, Copy)]
pub struct PlannedStep {
    pub campaign: CampaignKind,
    pub context: StepContext,
    pub offset: Duration,
    pub template_id: &'static str,
    build: PayloadBuilder,
}

impl PlannedStep {
    /// Render this step's payload for a recipient.
    pub fn payload(&self, recipient: &Recipient) -> serde_json::Value {
        (self.build)(recipient, &self.context)
    }
}

impl fmt::Debug for PlannedStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlannedStep")
            .field("campaign", &self.campaign)
            .field("step", &self.context.step_number)
            .field("offset", &self.offset)
            .field("template_id", &self.template_id)
            .finish()
    }
}

impl CampaignKind {
    pub const ALL: [CampaignKind; 4] = [
        CampaignKind::AbandonedCart,
        CampaignKind::ReviewRequest,
        CampaignKind::WelcomeSeries,
        CampaignKind::EducationalDrip,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CampaignKind::AbandonedCart => "abandoned_cart",
            CampaignKind::ReviewRequest => "review_request",
            CampaignKind::WelcomeSeries => "welcome_series",
            CampaignKind::EducationalDrip => "educational_drip",
        }
    }

    /// Static step list.
    pub fn steps(&self) -> &'static [StepDefinition] {
        match self {
            CampaignKind::AbandonedCart => &templates::ABANDONED_CART,
            CampaignKind::ReviewRequest => &templates::REVIEW_REQUEST,
            CampaignKind::WelcomeSeries => &templates::WELCOME_SERIES,
            CampaignKind::EducationalDrip => &templates::EDUCATIONAL_DRIP,
        }
    }

    /// Resolve every step's offset for `mode`, in sequence order.
    pub fn plan(&self, mode: CampaignMode) -> Vec<PlannedStep> {
        let steps = self.steps();
        steps
            .iter()
            .enumerate()
            .map(|(index, step)| PlannedStep {
                campaign: *self,
                context: StepContext {
                    step_number: index + 1,
                    total_steps: steps.len(),
                },
                offset: step.offset(mode),
                template_id: step.template_id,
                build: step.build,
            })
            .collect()
    }

    /// Check the recipient carries what this campaign's templates need.
    pub fn validate(&self, recipient: &Recipient) -> Result<(), DomainError> {
        let mut errors = Vec::new();

        if !is_valid_email(&recipient.email) {
            errors.push("A valid email address is required".to_string());
        }

        match self {
            CampaignKind::AbandonedCart => {
                if recipient.cart_items.is_empty() {
                    errors.push("Cart must contain at least one item".to_string());
                }
                if recipient.cart_items.iter().any(|item| item.quantity == 0) {
                    errors.push("Cart item quantities must be at least 1".to_string());
                }
            }
            CampaignKind::ReviewRequest => {
                let missing = recipient
                    .order_number
                    .as_deref()
                    .map(str::trim)
                    .is_none_or(str::is_empty);
                if missing {
                    errors.push("Order number is required".to_string());
                }
            }
            CampaignKind::WelcomeSeries | CampaignKind::EducationalDrip => {}
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(DomainError::Validation(errors))
        }
    }
}

impl fmt::Display for CampaignKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CampaignKind {
    type Err = DomainError;

    /// Accepts both `abandoned_cart` and `abandoned-cart`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        CampaignKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| DomainError::NotFound {
                entity_type: "campaign",
                key: s.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::product::format_gbp;

    fn secs(list: &[PlannedStep]) -> Vec<u64> {
        list.iter().map(|s| s.offset.as_secs()).collect()
    }

    #[test]
    fn abandoned_cart_offsets_per_mode() {
        let production = CampaignKind::AbandonedCart.plan(CampaignMode::Production);
        assert_eq!(secs(&production), vec![3600, 24 * 3600, 72 * 3600]);

        let quick = CampaignKind::AbandonedCart.plan(CampaignMode::QuickTest);
        assert_eq!(secs(&quick), vec![10, 20, 30]);
    }

    #[test]
    fn step_counts_match_campaign_shapes() {
        assert_eq!(CampaignKind::AbandonedCart.steps().len(), 3);
        assert_eq!(CampaignKind::ReviewRequest.steps().len(), 2);
        assert_eq!(CampaignKind::WelcomeSeries.steps().len(), 5);
        assert_eq!(CampaignKind::EducationalDrip.steps().len(), 12);
    }

    #[test]
    fn offsets_never_decrease() {
        for kind in CampaignKind::ALL {
            for mode in [CampaignMode::Production, CampaignMode::QuickTest] {
                let plan = kind.plan(mode);
                assert!(
                    plan.windows(2).all(|w| w[0].offset <= w[1].offset),
                    "{kind} {mode:?}"
                );
            }
        }
    }

    #[test]
    fn quick_test_finishes_within_a_minute_or_so() {
        for kind in CampaignKind::ALL {
            let plan = kind.plan(CampaignMode::QuickTest);
            let last = plan.last().map(|s| s.offset).unwrap_or_default();
            assert!(last <= Duration::from_secs(60), "{kind}");
        }
    }

    #[test]
    fn plan_numbers_steps_from_one() {
        let plan = CampaignKind::ReviewRequest.plan(CampaignMode::Production);
        assert_eq!(plan[0].context.step_number, 1);
        assert_eq!(plan[1].context.step_number, 2);
        assert!(plan.iter().all(|s| s.context.total_steps == 2));
    }

    #[test]
    fn parses_snake_and_kebab_names() {
        assert_eq!(
            "abandoned-cart".parse::<CampaignKind>().unwrap(),
            CampaignKind::AbandonedCart
        );
        assert_eq!(
            "educational_drip".parse::<CampaignKind>().unwrap(),
            CampaignKind::EducationalDrip
        );
        assert!("flash-sale".parse::<CampaignKind>().is_err());
    }

    #[test]
    fn abandoned_cart_requires_items() {
        let err = CampaignKind::AbandonedCart
            .validate(&Recipient::new("ana@example.com"))
            .unwrap_err();
        assert!(err.to_string().contains("at least one item"));
    }

    #[test]
    fn review_request_requires_order_number() {
        let mut recipient = Recipient::new("ana@example.com");
        recipient.order_number = Some("  ".to_string());
        assert!(CampaignKind::ReviewRequest.validate(&recipient).is_err());

        recipient.order_number = Some("SB-1042".to_string());
        assert!(CampaignKind::ReviewRequest.validate(&recipient).is_ok());
    }

    #[test]
    fn mode_round_trips_through_its_wire_name() {
        let mode: CampaignMode = serde_json::from_str("\"quick_test\"").unwrap();
        assert_eq!(mode, CampaignMode::QuickTest);
        assert_eq!(mode.as_str(), "quick_test");
    }

    #[test]
    fn cart_total_falls_back_to_item_sum() {
        let mut recipient = Recipient::new("ana@example.com");
        recipient.cart_items = vec![
            CartItem {
                name: "Sambal Matah".into(),
                quantity: 2,
                unit_price: 650,
            },
            CartItem {
                name: "Sambal Ijo".into(),
                quantity: 1,
                unit_price: 700,
            },
        ];
        assert_eq!(recipient.cart_total(), 2000);

        recipient.cart_total = Some(1800);
        assert_eq!(recipient.cart_total(), 1800);
    }

    #[test]
    fn huge_cart_prices_saturate_instead_of_overflowing() {
        let mut recipient = Recipient::new("ana@example.com");
        recipient.cart_items = vec![
            CartItem {
                name: "Sambal Terasi".into(),
                quantity: 1,
                unit_price: u32::MAX,
            },
            CartItem {
                name: "Sambal Ijo".into(),
                quantity: 1,
                unit_price: 2,
            },
            CartItem {
                name: "Sambal Bawang".into(),
                quantity: 3,
                unit_price: u32::MAX,
            },
        ];
        assert!(CampaignKind::AbandonedCart.validate(&recipient).is_ok());
        assert_eq!(recipient.cart_total(), u32::MAX);

        let plan = CampaignKind::AbandonedCart.plan(CampaignMode::Production);
        let payload = plan[0].payload(&recipient);
        assert_eq!(payload["cartTotal"], format_gbp(u32::MAX));
    }
}

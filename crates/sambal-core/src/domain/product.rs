//! Product catalog and prices.

use serde::{Deserialize, Serialize};

/// A jar in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub slug: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    /// 1 (mild) to 5 (very hot).
    pub heat_level: u8,
    pub size_grams: u32,
    /// Payments-provider price identifier.
    pub price_id: &'static str,
    /// Price in pence used when the live price is unavailable.
    pub fallback_price: u32,
}

/// Where a price came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceSource {
    Live,
    Fallback,
}

/// Unit price in minor units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Price {
    pub unit_amount: u32,
    pub currency: String,
    pub source: PriceSource,
}

impl Price {
    pub fn live(unit_amount: u32, currency: impl Into<String>) -> Self {
        Self {
            unit_amount,
            currency: currency.into().to_lowercase(),
            source: PriceSource::Live,
        }
    }

    pub fn fallback(product: &Product) -> Self {
        Self {
            unit_amount: product.fallback_price,
            currency: "gbp".to_string(),
            source: PriceSource::Fallback,
        }
    }

    /// Display form; only GBP gets a symbol.
    pub fn display(&self) -> String {
        if self.currency == "gbp" {
            format_gbp(self.unit_amount)
        } else {
            format!(
                "{}.{:02} {}",
                self.unit_amount / 100,
                self.unit_amount % 100,
                self.currency.to_uppercase()
            )
        }
    }
}

/// Format pence as `£12.50`.
pub fn format_gbp(pence: u32) -> String {
    format!("£{}.{:02}", pence / 100, pence % 100)
}

static CATALOG: [Product; 4] = [
    Product {
        slug: "sambal-bawang",
        name: "Sambal Bawang",
        description: "Fried shallot and garlic sambal, sweet and savoury with a slow burn.",
        heat_level: 3,
        size_grams: 190,
        price_id: "price_sambal_bawang_190",
        fallback_price: 599,
    },
    Product {
        slug: "sambal-matah",
        name: "Sambal Matah",
        description: "Balinese raw sambal of lemongrass, shallot and lime leaf.",
        heat_level: 2,
        size_grams: 170,
        price_id: "price_sambal_matah_170",
        fallback_price: 649,
    },
    Product {
        slug: "sambal-ijo",
        name: "Sambal Ijo",
        description: "Green chilli sambal from West Sumatra, bright and grassy.",
        heat_level: 3,
        size_grams: 190,
        price_id: "price_sambal_ijo_190",
        fallback_price: 649,
    },
    Product {
        slug: "sambal-terasi",
        name: "Sambal Terasi",
        description: "The classic: bird's eye chilli and toasted shrimp paste.",
        heat_level: 5,
        size_grams: 190,
        price_id: "price_sambal_terasi_190",
        fallback_price: 699,
    },
];

/// Every product, in display order.
pub fn catalog() -> &'static [Product] {
    &CATALOG
}

/// Look up a product by slug.
pub fn find_product(slug: &str) -> Option<&'static Product> {
    CATALOG.iter().find(|p| p.slug == slug.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_pence_as_pounds() {
        assert_eq!(format_gbp(599), "£5.99");
        assert_eq!(format_gbp(1200), "£12.00");
        assert_eq!(format_gbp(5), "£0.05");
    }

    #[test]
    fn finds_products_by_slug() {
        assert_eq!(find_product("sambal-matah").map(|p| p.heat_level), Some(2));
        assert!(find_product("ketchup").is_none());
    }

    #[test]
    fn slugs_are_unique() {
        let mut slugs: Vec<_> = catalog().iter().map(|p| p.slug).collect();
        slugs.sort_unstable();
        slugs.dedup();
        assert_eq!(slugs.len(), catalog().len());
    }

    #[test]
    fn non_gbp_prices_show_currency_code() {
        assert_eq!(Price::live(1099, "EUR").display(), "10.99 EUR");
        assert_eq!(Price::live(1099, "gbp").display(), "£10.99");
    }
}

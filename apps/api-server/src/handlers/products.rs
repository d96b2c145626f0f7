//! Product catalog endpoints.

use actix_web::{HttpResponse, web};

use sambal_core::domain::product::{catalog, find_product};
use sambal_core::domain::{Price, PriceSource, Product};
use sambal_infra::price_for;
use sambal_shared::dto::{PriceDto, ProductResponse};

use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

fn price_dto(price: &Price) -> PriceDto {
    PriceDto {
        unit_amount: price.unit_amount,
        currency: price.currency.clone(),
        display: price.display(),
        source: match price.source {
            PriceSource::Live => "live",
            PriceSource::Fallback => "fallback",
        }
        .to_string(),
    }
}

async fn product_response(state: &AppState, product: &Product) -> ProductResponse {
    let price = price_for(state.prices.as_ref(), product).await;
    ProductResponse {
        slug: product.slug.to_string(),
        name: product.name.to_string(),
        description: product.description.to_string(),
        heat_level: product.heat_level,
        size_grams: product.size_grams,
        price: price_dto(&price),
    }
}

/// GET /api/products
pub async fn list_products(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let mut products = Vec::with_capacity(catalog().len());
    for product in catalog() {
        products.push(product_response(&state, product).await);
    }
    Ok(HttpResponse::Ok().json(products))
}

/// GET /api/products/{slug}
pub async fn get_product(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let slug = path.into_inner();
    let product = find_product(&slug)
        .ok_or_else(|| AppError::NotFound(format!("Product '{}' not found", slug)))?;

    Ok(HttpResponse::Ok().json(product_response(&state, product).await))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::{App, http::StatusCode, test};
    use async_trait::async_trait;
    use sambal_core::ports::{PriceProvider, PricingError};
    use serde_json::Value;

    use crate::handlers::configure_app;
    use crate::handlers::testing::RecordingMailer;
    use crate::state::AppState;

    use super::*;

    /// Live price for one product, upstream failure for the rest.
    struct OneLivePrice;

    #[async_trait]
    impl PriceProvider for OneLivePrice {
        async fn price(&self, price_id: &str) -> Result<Price, PricingError> {
            if price_id == "price_sambal_terasi_190" {
                Ok(Price::live(750, "GBP"))
            } else {
                Err(PricingError::Upstream("503".into()))
            }
        }
    }

    async fn get(state: &AppState, uri: &str) -> (StatusCode, Value) {
        let app = test::init_service(App::new().configure(|cfg| configure_app(cfg, state.clone())))
            .await;
        let res = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
        let status = res.status();
        (status, test::read_body_json(res).await)
    }

    #[actix_web::test]
    async fn lists_catalog_with_fallback_prices() {
        let state = AppState::in_memory(RecordingMailer::shared());
        let (status, body) = get(&state, "/api/products").await;

        assert_eq!(status, StatusCode::OK);
        let products = body.as_array().unwrap();
        assert_eq!(products.len(), 4);
        assert_eq!(products[0]["slug"], "sambal-bawang");
        assert_eq!(products[0]["price"]["display"], "£5.99");
        assert_eq!(products[0]["price"]["source"], "fallback");
    }

    #[actix_web::test]
    async fn live_price_wins_when_available() {
        let mut state = AppState::in_memory(RecordingMailer::shared());
        state.prices = Arc::new(OneLivePrice);

        let (_, terasi) = get(&state, "/api/products/sambal-terasi").await;
        assert_eq!(terasi["price"]["unitAmount"], 750);
        assert_eq!(terasi["price"]["source"], "live");

        let (_, ijo) = get(&state, "/api/products/sambal-ijo").await;
        assert_eq!(ijo["price"]["unitAmount"], 649);
        assert_eq!(ijo["price"]["source"], "fallback");
    }

    #[actix_web::test]
    async fn unknown_slug_is_a_404() {
        let state = AppState::in_memory(RecordingMailer::shared());
        let (status, body) = get(&state, "/api/products/sambal-nanas").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Product 'sambal-nanas' not found");
    }
}

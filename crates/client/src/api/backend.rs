//! HTTP client for the storefront REST API.

use async_trait::async_trait;
use jiff::civil;
use reqwest::{Client, Response, StatusCode};
use rust_decimal::Decimal;
use serde::Deserialize;

use samagri::cart::CartId;
use samagri::catalog::{BundleId, ItemRef, Listing, ProductId};
use samagri::discounts::DiscountRate;

use crate::{
    api::{ApiError, CartsApi, CatalogApi, CatalogEntry, DiscountsApi, OrdersApi},
    cart::document::CartDocument,
    checkout::{NewOrder, OrderId},
    discounts::DiscountCode,
};

/// Configuration for connecting to the storefront backend.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Backend base URL, e.g. `"http://localhost:8081/api"`.
    pub base_url: String,
}

/// HTTP client implementing every backend API trait.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    config: ApiConfig,
    http: Client,
}

impl HttpBackend {
    /// Create a new client from the given configuration.
    #[must_use]
    pub fn new(config: ApiConfig) -> Self {
        Self {
            config,
            http: Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url)
    }
}

#[async_trait]
impl CatalogApi for HttpBackend {
    async fn product(&self, id: ProductId) -> Result<CatalogEntry, ApiError> {
        let response = self
            .http
            .get(self.url(&format!("/products/{id}")))
            .send()
            .await?;

        let parsed: ProductDto = check(&format!("product {id}"), response)
            .await?
            .json()
            .await?;

        Ok(CatalogEntry {
            name: parsed.name,
            listing: Listing::new(
                ItemRef::Product(parsed.product_id),
                parsed.price,
                Some(parsed.stock),
            ),
        })
    }

    async fn bundle(&self, id: BundleId) -> Result<CatalogEntry, ApiError> {
        let response = self
            .http
            .get(self.url(&format!("/bundles/{id}")))
            .send()
            .await?;

        let parsed: BundleDto = check(&format!("bundle {id}"), response)
            .await?
            .json()
            .await?;

        Ok(CatalogEntry {
            name: parsed.name,
            listing: Listing::new(ItemRef::Bundle(parsed.bundle_id), parsed.price, parsed.stock),
        })
    }
}

#[async_trait]
impl CartsApi for HttpBackend {
    async fn fetch_cart(&self, id: &CartId) -> Result<CartDocument, ApiError> {
        let response = self
            .http
            .get(self.url(&format!("/cart/{id}")))
            .send()
            .await?;

        Ok(check(&format!("cart {id}"), response).await?.json().await?)
    }

    async fn upsert_cart(&self, document: &CartDocument) -> Result<(), ApiError> {
        let response = self
            .http
            .post(self.url("/cart"))
            .json(document)
            .send()
            .await?;

        check("cart upsert", response).await?;

        Ok(())
    }

    async fn delete_cart(&self, id: &CartId) -> Result<(), ApiError> {
        let response = self
            .http
            .delete(self.url(&format!("/cart/{id}")))
            .send()
            .await?;

        check("cart delete", response).await?;

        Ok(())
    }
}

#[async_trait]
impl DiscountsApi for HttpBackend {
    async fn active_discounts(&self) -> Result<Vec<DiscountCode>, ApiError> {
        let response = self
            .http
            .get(self.url("/discounts/active"))
            .send()
            .await?;

        let parsed: Vec<DiscountDto> = check("active discounts", response)
            .await?
            .json()
            .await?;

        active_codes(parsed)
    }
}

#[async_trait]
impl OrdersApi for HttpBackend {
    async fn create_order(&self, order: &NewOrder) -> Result<OrderId, ApiError> {
        // The backend takes order parameters in the query string and answers
        // with the bare order id.
        let mut request = self.http.post(self.url("/orders")).query(&[
            ("userId", order.user_id.to_string()),
            ("addressId", order.address_id.to_string()),
            ("cartId", order.cart_id.as_str().to_owned()),
        ]);

        if let Some(code) = &order.discount_code {
            request = request.query(&[("discountCode", code)]);
        }

        let response = request.send().await?;

        Ok(check("order", response).await?.json().await?)
    }
}

async fn check(what: &str, response: Response) -> Result<Response, ApiError> {
    let status = response.status();

    if status == StatusCode::NOT_FOUND {
        return Err(ApiError::NotFound(what.to_owned()));
    }

    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();

        return Err(ApiError::UnexpectedResponse(format!(
            "{what} request failed with status {status}: {text}"
        )));
    }

    Ok(response)
}

fn active_codes(parsed: Vec<DiscountDto>) -> Result<Vec<DiscountCode>, ApiError> {
    parsed
        .into_iter()
        .filter(|dto| dto.is_active)
        .map(|dto| {
            Ok(DiscountCode {
                code: dto.code,
                rate: DiscountRate::new(dto.discount_rate)?,
                expires_on: dto.expiry_date,
            })
        })
        .collect()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductDto {
    product_id: ProductId,
    name: String,
    price: u64,
    stock: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BundleDto {
    bundle_id: BundleId,
    name: String,
    price: u64,
    #[serde(default)]
    stock: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DiscountDto {
    code: String,
    discount_rate: Decimal,
    is_active: bool,
    #[serde(default)]
    expiry_date: Option<civil::Date>,
}

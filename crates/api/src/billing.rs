//! Billing provider boundary (Stripe).
//!
//! The platform never stores card or subscription state itself; it only
//! creates checkout and customer-portal sessions and redirects the user to
//! the provider-hosted URL. [`BillingProvider`] is the seam; [`StripeClient`]
//! speaks Stripe's form-encoded REST API.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

/// Timeout for billing API calls.
const API_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors from the billing boundary.
#[derive(Debug, thiserror::Error)]
pub enum BillingError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The provider returned a non-2xx status code.
    #[error("Billing provider error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },
}

/// Boundary trait for the billing provider.
#[async_trait]
pub trait BillingProvider: Send + Sync {
    /// Create (or register) a billing customer for an email address,
    /// returning the provider's customer id.
    async fn create_customer(&self, email: &str) -> Result<String, BillingError>;

    /// Create a subscription checkout session for a price, returning the
    /// provider-hosted URL to redirect the user to.
    async fn create_checkout_session(
        &self,
        customer_id: &str,
        price_id: &str,
    ) -> Result<String, BillingError>;

    /// Create a customer-portal session, returning the provider-hosted URL.
    async fn create_portal_session(&self, customer_id: &str) -> Result<String, BillingError>;
}

/// Stripe configuration loaded from the environment.
#[derive(Debug, Clone)]
pub struct StripeConfig {
    /// Secret API key (`sk_...`).
    pub secret_key: String,
    /// Public base URL of the web app, used for success/cancel/return URLs.
    pub app_base_url: String,
}

impl StripeConfig {
    /// Load from `STRIPE_SECRET_KEY` and `APP_BASE_URL`.
    ///
    /// # Panics
    ///
    /// Panics when a variable is missing; misconfiguration should fail at
    /// startup.
    pub fn from_env() -> Self {
        let require = |name: &str| {
            std::env::var(name).unwrap_or_else(|_| panic!("{name} must be set"))
        };
        Self {
            secret_key: require("STRIPE_SECRET_KEY"),
            app_base_url: require("APP_BASE_URL"),
        }
    }
}

/// Response shape shared by Stripe session endpoints.
#[derive(Debug, Deserialize)]
struct SessionResponse {
    url: String,
}

/// Response shape of Stripe's customer endpoint.
#[derive(Debug, Deserialize)]
struct CustomerResponse {
    id: String,
}

/// [`BillingProvider`] implementation over Stripe's REST API.
pub struct StripeClient {
    client: reqwest::Client,
    config: StripeConfig,
}

/// Stripe API base URL.
const STRIPE_API_URL: &str = "https://api.stripe.com/v1";

impl StripeClient {
    /// Create a client for the configured Stripe account.
    ///
    /// # Panics
    ///
    /// Panics if the TLS backend cannot be initialised (startup-time only).
    pub fn new(config: StripeConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(API_TIMEOUT)
            .build()
            .expect("failed to build billing HTTP client");
        Self { client, config }
    }

    async fn post_form<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<T, BillingError> {
        let response = self
            .client
            .post(format!("{STRIPE_API_URL}{path}"))
            .basic_auth(&self.config.secret_key, None::<&str>)
            .form(params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BillingError::Api {
                status: status.as_u16(),
                body,
            });
        }
        response.json::<T>().await.map_err(BillingError::from)
    }
}

#[async_trait]
impl BillingProvider for StripeClient {
    async fn create_customer(&self, email: &str) -> Result<String, BillingError> {
        let customer: CustomerResponse =
            self.post_form("/customers", &[("email", email)]).await?;
        Ok(customer.id)
    }

    async fn create_checkout_session(
        &self,
        customer_id: &str,
        price_id: &str,
    ) -> Result<String, BillingError> {
        let success_url = format!("{}/account?checkout=success", self.config.app_base_url);
        let cancel_url = format!("{}/pricing", self.config.app_base_url);
        let session: SessionResponse = self
            .post_form(
                "/checkout/sessions",
                &[
                    ("customer", customer_id),
                    ("mode", "subscription"),
                    ("line_items[0][price]", price_id),
                    ("line_items[0][quantity]", "1"),
                    ("success_url", success_url.as_str()),
                    ("cancel_url", cancel_url.as_str()),
                ],
            )
            .await?;
        Ok(session.url)
    }

    async fn create_portal_session(&self, customer_id: &str) -> Result<String, BillingError> {
        let return_url = format!("{}/account", self.config.app_base_url);
        let session: SessionResponse = self
            .post_form(
                "/billing_portal/sessions",
                &[
                    ("customer", customer_id),
                    ("return_url", return_url.as_str()),
                ],
            )
            .await?;
        Ok(session.url)
    }
}

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::models::Installment;
use crate::payment::{PaymentAdapter, PaymentIntent, PaymentStatus};

type AdapterError = Box<dyn std::error::Error + Send + Sync>;

/// PayPal Checkout Orders v2 adapter. One PayPal order per installment; the
/// storefront redirects the buyer to `approve_url` and captures on return.
pub struct PayPalAdapter {
    http: reqwest::Client,
    base_url: String,
    client_id: String,
    client_secret: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct PayPalLink {
    rel: String,
    href: String,
}

#[derive(Debug, Deserialize)]
struct PayPalAmount {
    currency_code: String,
    value: String,
}

#[derive(Debug, Deserialize)]
struct PayPalPurchaseUnit {
    reference_id: Option<String>,
    amount: Option<PayPalAmount>,
}

#[derive(Debug, Deserialize)]
struct PayPalOrderResponse {
    id: String,
    status: String,
    #[serde(default)]
    links: Vec<PayPalLink>,
    #[serde(default)]
    purchase_units: Vec<PayPalPurchaseUnit>,
}

/// Format integer minor units as PayPal's decimal string ("123456" -> "1234.56").
fn format_minor(amount_minor: i64) -> String {
    format!("{}.{:02}", amount_minor / 100, (amount_minor % 100).abs())
}

/// Parse a PayPal decimal string back to minor units.
fn parse_minor(value: &str) -> i64 {
    match value.split_once('.') {
        Some((whole, frac)) => {
            let cents: i64 = format!("{:0<2}", frac).chars().take(2).collect::<String>().parse().unwrap_or(0);
            whole.parse::<i64>().unwrap_or(0) * 100 + cents
        }
        None => value.parse::<i64>().unwrap_or(0) * 100,
    }
}

fn map_status(status: &str) -> PaymentStatus {
    match status {
        "CREATED" => PaymentStatus::Created,
        "SAVED" | "PAYER_ACTION_REQUIRED" => PaymentStatus::ApprovalPending,
        "APPROVED" => PaymentStatus::Approved,
        "COMPLETED" => PaymentStatus::Captured,
        "VOIDED" => PaymentStatus::Denied,
        _ => PaymentStatus::Failed,
    }
}

impl PayPalAdapter {
    pub fn new(base_url: &str, client_id: &str, client_secret: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
        }
    }

    async fn access_token(&self) -> Result<String, AdapterError> {
        let response = self
            .http
            .post(format!("{}/v1/oauth2/token", self.base_url))
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?
            .error_for_status()?;

        let token: TokenResponse = response.json().await?;
        Ok(token.access_token)
    }

    fn to_intent(&self, response: PayPalOrderResponse) -> PaymentIntent {
        // order id and installment ride in the purchase unit reference: "{uuid}:{ADVANCE|BALANCE}"
        let (order_id, installment) = response
            .purchase_units
            .first()
            .and_then(|u| u.reference_id.as_deref())
            .and_then(|r| r.split_once(':'))
            .map(|(id, inst)| {
                (
                    Uuid::parse_str(id).unwrap_or_default(),
                    Installment::parse(inst).unwrap_or(Installment::Advance),
                )
            })
            .unwrap_or((Uuid::default(), Installment::Advance));

        let (amount_minor, currency) = response
            .purchase_units
            .first()
            .and_then(|u| u.amount.as_ref())
            .map(|a| (parse_minor(&a.value), a.currency_code.clone()))
            .unwrap_or((0, "INR".to_string()));

        let approve_url = response
            .links
            .iter()
            .find(|l| l.rel == "approve" || l.rel == "payer-action")
            .map(|l| l.href.clone());

        PaymentIntent {
            id: response.id,
            order_id,
            installment,
            amount_minor,
            currency,
            status: map_status(&response.status),
            approve_url,
            reference: None,
            created_at: Utc::now(),
        }
    }
}

#[async_trait]
impl PaymentAdapter for PayPalAdapter {
    async fn create_intent(
        &self,
        order_id: Uuid,
        installment: Installment,
        amount_minor: i64,
        currency: &str,
    ) -> Result<PaymentIntent, AdapterError> {
        let token = self.access_token().await?;

        let body = serde_json::json!({
            "intent": "CAPTURE",
            "purchase_units": [{
                "reference_id": format!("{}:{}", order_id, installment.as_str()),
                "amount": {
                    "currency_code": currency,
                    "value": format_minor(amount_minor),
                }
            }]
        });

        let response = self
            .http
            .post(format!("{}/v2/checkout/orders", self.base_url))
            .bearer_auth(&token)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;

        let paypal_order: PayPalOrderResponse = response.json().await?;
        tracing::info!(
            "PayPal order {} created for {} installment of order {}",
            paypal_order.id,
            installment.as_str(),
            order_id
        );

        Ok(self.to_intent(paypal_order))
    }

    async fn get_intent(&self, intent_id: &str) -> Result<PaymentIntent, AdapterError> {
        let token = self.access_token().await?;

        let response = self
            .http
            .get(format!("{}/v2/checkout/orders/{}", self.base_url, intent_id))
            .bearer_auth(&token)
            .send()
            .await?
            .error_for_status()?;

        Ok(self.to_intent(response.json().await?))
    }

    async fn capture(&self, intent_id: &str) -> Result<PaymentIntent, AdapterError> {
        let token = self.access_token().await?;

        let response = self
            .http
            .post(format!("{}/v2/checkout/orders/{}/capture", self.base_url, intent_id))
            .bearer_auth(&token)
            .header("Content-Type", "application/json")
            .send()
            .await?
            .error_for_status()?;

        let paypal_order: PayPalOrderResponse = response.json().await?;
        tracing::info!("PayPal capture {} -> {}", intent_id, paypal_order.status);

        let mut intent = self.to_intent(paypal_order);
        intent.reference = Some(intent.id.clone());
        Ok(intent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_minor_units() {
        assert_eq!(format_minor(123_456), "1234.56");
        assert_eq!(format_minor(100), "1.00");
        assert_eq!(format_minor(5), "0.05");
    }

    #[test]
    fn parses_minor_units() {
        assert_eq!(parse_minor("1234.56"), 123_456);
        assert_eq!(parse_minor("1.5"), 150);
        assert_eq!(parse_minor("42"), 4200);
    }

    #[test]
    fn maps_provider_statuses() {
        assert_eq!(map_status("CREATED"), PaymentStatus::Created);
        assert_eq!(map_status("APPROVED"), PaymentStatus::Approved);
        assert_eq!(map_status("COMPLETED"), PaymentStatus::Captured);
        assert_eq!(map_status("VOIDED"), PaymentStatus::Denied);
        assert_eq!(map_status("SOMETHING_ELSE"), PaymentStatus::Failed);
    }

    #[test]
    fn decodes_reference_from_purchase_unit() {
        let adapter = PayPalAdapter::new("https://api.sandbox.test", "id", "secret");
        let order_id = Uuid::new_v4();
        let response = PayPalOrderResponse {
            id: "5O190127TN364715T".to_string(),
            status: "APPROVED".to_string(),
            links: vec![PayPalLink {
                rel: "approve".to_string(),
                href: "https://paypal.test/approve".to_string(),
            }],
            purchase_units: vec![PayPalPurchaseUnit {
                reference_id: Some(format!("{}:BALANCE", order_id)),
                amount: Some(PayPalAmount {
                    currency_code: "USD".to_string(),
                    value: "250.00".to_string(),
                }),
            }],
        };

        let intent = adapter.to_intent(response);
        assert_eq!(intent.order_id, order_id);
        assert_eq!(intent.installment, Installment::Balance);
        assert_eq!(intent.amount_minor, 25_000);
        assert_eq!(intent.status, PaymentStatus::Approved);
        assert_eq!(intent.approve_url.as_deref(), Some("https://paypal.test/approve"));
    }
}

use aurelia_catalog::pricing::PriceBreakdown;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Order status in the lifecycle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    AdvancePaid,
    InProduction,
    Shipped,
    Delivered,
    Cancelled,
    Expired,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::AdvancePaid => "ADVANCE_PAID",
            OrderStatus::InProduction => "IN_PRODUCTION",
            OrderStatus::Shipped => "SHIPPED",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
            OrderStatus::Expired => "EXPIRED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(OrderStatus::Pending),
            "ADVANCE_PAID" => Some(OrderStatus::AdvancePaid),
            "IN_PRODUCTION" => Some(OrderStatus::InProduction),
            "SHIPPED" => Some(OrderStatus::Shipped),
            "DELIVERED" => Some(OrderStatus::Delivered),
            "CANCELLED" => Some(OrderStatus::Cancelled),
            "EXPIRED" => Some(OrderStatus::Expired),
            _ => None,
        }
    }

    /// Terminal states accept no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled | OrderStatus::Expired)
    }
}

/// The two installments of the split-payment plan.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Installment {
    Advance,
    Balance,
}

impl Installment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Installment::Advance => "ADVANCE",
            Installment::Balance => "BALANCE",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ADVANCE" | "advance" => Some(Installment::Advance),
            "BALANCE" | "balance" => Some(Installment::Balance),
            _ => None,
        }
    }
}

/// The 50/50 payment plan snapshotted from the quote at checkout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentPlan {
    pub grand_total_paise: i64,
    pub advance_due_paise: i64,
    pub remaining_due_paise: i64,
    pub grand_total_usd_cents: i64,
    pub inr_per_usd: f64,
    pub fx_fallback: bool,
    pub advance_paid_at: Option<DateTime<Utc>>,
    pub advance_reference: Option<String>,
    pub balance_paid_at: Option<DateTime<Utc>>,
    pub balance_reference: Option<String>,
}

impl PaymentPlan {
    pub fn from_breakdown(breakdown: &PriceBreakdown) -> Self {
        Self {
            grand_total_paise: breakdown.grand_total_paise,
            advance_due_paise: breakdown.advance_paise,
            remaining_due_paise: breakdown.remaining_paise,
            grand_total_usd_cents: breakdown.grand_total_usd_cents,
            inr_per_usd: breakdown.rates.inr_per_usd,
            fx_fallback: breakdown.fx_fallback,
            advance_paid_at: None,
            advance_reference: None,
            balance_paid_at: None,
            balance_reference: None,
        }
    }

    pub fn installment_amount_paise(&self, installment: Installment) -> i64 {
        match installment {
            Installment::Advance => self.advance_due_paise,
            Installment::Balance => self.remaining_due_paise,
        }
    }

    pub fn is_paid(&self, installment: Installment) -> bool {
        match installment {
            Installment::Advance => self.advance_paid_at.is_some(),
            Installment::Balance => self.balance_paid_at.is_some(),
        }
    }

    pub fn fully_paid(&self) -> bool {
        self.advance_paid_at.is_some() && self.balance_paid_at.is_some()
    }
}

/// The single source of truth for a customer's purchase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub customer_id: String,
    pub items: Vec<OrderItem>,
    pub status: OrderStatus,
    pub plan: PaymentPlan,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn update_status(&mut self, new_status: OrderStatus) {
        self.status = new_status;
        self.updated_at = Utc::now();
    }
}

/// A quoted piece inside an order. The breakdown snapshots the rates the price was
/// struck at so later rate movement never changes the owed amount.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Option<Uuid>,
    pub name: String,
    pub breakdown: PriceBreakdown,
    pub created_at: DateTime<Utc>,
}

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Installment, Order};

/// Ledger transaction types written against orders.
pub const TX_ADVANCE_RECEIVED: &str = "ADVANCE_RECEIVED";
pub const TX_BALANCE_RECEIVED: &str = "BALANCE_RECEIVED";
pub const TX_REFUND_DUE: &str = "REFUND_DUE";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: Uuid,
    pub order_id: Uuid,
    pub transaction_type: String,
    pub amount_paise: i64,
    pub currency: String,
    pub description: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Handles financial bookkeeping for orders
pub struct FinancialManager;

impl FinancialManager {
    pub fn new() -> Self {
        Self
    }

    /// Ledger entry for a captured installment.
    pub fn installment_received(
        &self,
        order: &Order,
        installment: Installment,
        reference: Option<&str>,
    ) -> LedgerEntry {
        let transaction_type = match installment {
            Installment::Advance => TX_ADVANCE_RECEIVED,
            Installment::Balance => TX_BALANCE_RECEIVED,
        };

        LedgerEntry {
            id: Uuid::new_v4(),
            order_id: order.id,
            transaction_type: transaction_type.to_string(),
            amount_paise: order.plan.installment_amount_paise(installment),
            currency: "INR".to_string(),
            description: reference.map(|r| format!("Captured via {}", r)),
            created_at: Utc::now(),
        }
    }

    /// Ledger entry owed back to the customer when a part-paid order is cancelled.
    /// Settlement is manual; no automated refund call is made.
    pub fn refund_due(&self, order: &Order) -> Option<LedgerEntry> {
        if order.plan.advance_paid_at.is_none() {
            return None;
        }

        let mut amount = order.plan.advance_due_paise;
        if order.plan.balance_paid_at.is_some() {
            amount += order.plan.remaining_due_paise;
        }

        Some(LedgerEntry {
            id: Uuid::new_v4(),
            order_id: order.id,
            transaction_type: TX_REFUND_DUE.to_string(),
            amount_paise: amount,
            currency: "INR".to_string(),
            description: Some("Order cancelled after payment".to_string()),
            created_at: Utc::now(),
        })
    }

    /// Aggregate settlement view across a set of orders.
    pub fn settlement_summary(&self, orders: &[Order]) -> serde_json::Value {
        let mut advance_collected: i64 = 0;
        let mut balance_collected: i64 = 0;
        let mut outstanding: i64 = 0;
        let mut order_count = 0;

        for order in orders {
            order_count += 1;
            if order.plan.advance_paid_at.is_some() {
                advance_collected += order.plan.advance_due_paise;
            }
            if order.plan.balance_paid_at.is_some() {
                balance_collected += order.plan.remaining_due_paise;
            } else if order.plan.advance_paid_at.is_some() && !order.status.is_terminal() {
                outstanding += order.plan.remaining_due_paise;
            }
        }

        serde_json::json!({
            "report_date": Utc::now().to_rfc3339(),
            "order_count": order_count,
            "metrics": {
                "advance_collected_paise": advance_collected,
                "balance_collected_paise": balance_collected,
                "outstanding_balance_paise": outstanding,
            }
        })
    }
}

impl Default for FinancialManager {
    fn default() -> Self {
        Self::new()
    }
}

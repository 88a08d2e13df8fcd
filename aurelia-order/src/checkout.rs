use aurelia_catalog::pricing::PriceBreakdown;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::finance::{FinancialManager, LedgerEntry};
use crate::models::{Installment, Order, OrderItem, OrderStatus, PaymentPlan};

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("Order not found: {0}")]
    NotFound(String),

    #[error("Invalid state transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Installment {0} already paid")]
    AlreadyPaid(String),

    #[error("Balance cannot be captured before the advance")]
    BalanceBeforeAdvance,

    #[error("Order has expired")]
    Expired,
}

/// Builds orders from quotes and enforces lifecycle and installment sequencing.
pub struct CheckoutManager {
    pending_ttl: Duration,
    finance: FinancialManager,
}

impl CheckoutManager {
    pub fn new(pending_ttl_seconds: i64) -> Self {
        Self {
            pending_ttl: Duration::seconds(pending_ttl_seconds),
            finance: FinancialManager::new(),
        }
    }

    /// Create a PENDING order from a server-side breakdown. The breakdown is
    /// snapshotted into the item so the owed amounts never move with the rates.
    pub fn build_order(
        &self,
        customer_id: &str,
        product_id: Option<Uuid>,
        item_name: &str,
        breakdown: PriceBreakdown,
    ) -> Order {
        let now = Utc::now();
        let order_id = Uuid::new_v4();

        let item = OrderItem {
            id: Uuid::new_v4(),
            order_id,
            product_id,
            name: item_name.to_string(),
            breakdown: breakdown.clone(),
            created_at: now,
        };

        Order {
            id: order_id,
            customer_id: customer_id.to_string(),
            items: vec![item],
            status: OrderStatus::Pending,
            plan: PaymentPlan::from_breakdown(&breakdown),
            expires_at: Some(now + self.pending_ttl),
            created_at: now,
            updated_at: now,
        }
    }

    /// Record a captured installment, transitioning the order where required.
    /// Returns the ledger entry to persist.
    pub fn record_installment(
        &self,
        order: &mut Order,
        installment: Installment,
        reference: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<LedgerEntry, OrderError> {
        if order.plan.is_paid(installment) {
            return Err(OrderError::AlreadyPaid(installment.as_str().to_string()));
        }

        match installment {
            Installment::Advance => {
                if order.status != OrderStatus::Pending {
                    return Err(OrderError::InvalidTransition {
                        from: order.status.as_str().to_string(),
                        to: OrderStatus::AdvancePaid.as_str().to_string(),
                    });
                }
                if let Some(expires_at) = order.expires_at {
                    if now > expires_at {
                        return Err(OrderError::Expired);
                    }
                }

                order.plan.advance_paid_at = Some(now);
                order.plan.advance_reference = reference.map(str::to_string);
                order.update_status(OrderStatus::AdvancePaid);
                // The quote hold served its purpose once the deposit lands.
                order.expires_at = None;
            }
            Installment::Balance => {
                if order.plan.advance_paid_at.is_none() {
                    return Err(OrderError::BalanceBeforeAdvance);
                }
                if !matches!(
                    order.status,
                    OrderStatus::AdvancePaid | OrderStatus::InProduction | OrderStatus::Shipped
                ) {
                    return Err(OrderError::InvalidTransition {
                        from: order.status.as_str().to_string(),
                        to: "BALANCE_PAID".to_string(),
                    });
                }

                order.plan.balance_paid_at = Some(now);
                order.plan.balance_reference = reference.map(str::to_string);
                order.updated_at = now;
            }
        }

        Ok(self.finance.installment_received(order, installment, reference))
    }

    /// Admin-driven production progress: ADVANCE_PAID → IN_PRODUCTION → SHIPPED →
    /// DELIVERED (delivery additionally requires the balance to be settled).
    pub fn advance_fulfilment(
        &self,
        order: &mut Order,
        target: OrderStatus,
    ) -> Result<(), OrderError> {
        let legal = matches!(
            (order.status, target),
            (OrderStatus::AdvancePaid, OrderStatus::InProduction)
                | (OrderStatus::InProduction, OrderStatus::Shipped)
                | (OrderStatus::Shipped, OrderStatus::Delivered)
        );

        if !legal || (target == OrderStatus::Delivered && !order.plan.fully_paid()) {
            return Err(OrderError::InvalidTransition {
                from: order.status.as_str().to_string(),
                to: target.as_str().to_string(),
            });
        }

        order.update_status(target);
        Ok(())
    }

    /// Cancel an order. Free before the advance; afterwards a REFUND_DUE ledger
    /// entry is returned for manual settlement. Terminal orders cannot be cancelled.
    pub fn cancel(&self, order: &mut Order) -> Result<Option<LedgerEntry>, OrderError> {
        if order.status.is_terminal() {
            return Err(OrderError::InvalidTransition {
                from: order.status.as_str().to_string(),
                to: OrderStatus::Cancelled.as_str().to_string(),
            });
        }

        let refund = self.finance.refund_due(order);
        order.update_status(OrderStatus::Cancelled);
        Ok(refund)
    }

    /// Worker sweep: expire a PENDING order past its quote TTL.
    pub fn expire_if_due(&self, order: &mut Order, now: DateTime<Utc>) -> bool {
        if order.status != OrderStatus::Pending {
            return false;
        }
        match order.expires_at {
            Some(expires_at) if now > expires_at => {
                order.update_status(OrderStatus::Expired);
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aurelia_catalog::materials::MetalType;
    use aurelia_catalog::pricing::{PricingRules, QuoteEngine, QuoteRequest};
    use aurelia_catalog::rates::RateSnapshot;

    fn breakdown() -> PriceBreakdown {
        let engine = QuoteEngine::new(PricingRules::default());
        let metal = MetalType {
            code: "GOLD_22K".to_string(),
            name: "Gold".to_string(),
            purity_label: "22kt".to_string(),
            price_modifier: 0.92,
            is_active: true,
        };
        let rates = RateSnapshot {
            gold_price_per_gram_paise: 600_000,
            inr_per_usd: 83.0,
            fx_fallback: false,
            fetched_at: Utc::now(),
        };
        let request = QuoteRequest {
            product_id: None,
            metal_weight_grams: 5.0,
            stones: vec![],
            price_override_paise: None,
        };
        engine.quote(&request, &metal, &rates).unwrap()
    }

    fn manager() -> CheckoutManager {
        CheckoutManager::new(3600)
    }

    #[test]
    fn checkout_snapshots_the_plan() {
        let b = breakdown();
        let order = manager().build_order("customer-1", None, "Bridal Necklace", b.clone());

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.plan.grand_total_paise, b.grand_total_paise);
        assert_eq!(
            order.plan.advance_due_paise + order.plan.remaining_due_paise,
            order.plan.grand_total_paise
        );
        assert!(order.expires_at.is_some());
    }

    #[test]
    fn advance_then_balance_happy_path() {
        let m = manager();
        let mut order = m.build_order("customer-1", None, "Ring", breakdown());
        let now = Utc::now();

        let entry = m
            .record_installment(&mut order, Installment::Advance, Some("pp-1"), now)
            .unwrap();
        assert_eq!(entry.transaction_type, "ADVANCE_RECEIVED");
        assert_eq!(entry.amount_paise, order.plan.advance_due_paise);
        assert_eq!(order.status, OrderStatus::AdvancePaid);
        assert!(order.expires_at.is_none());

        m.advance_fulfilment(&mut order, OrderStatus::InProduction).unwrap();
        m.advance_fulfilment(&mut order, OrderStatus::Shipped).unwrap();

        let entry = m
            .record_installment(&mut order, Installment::Balance, Some("pp-2"), now)
            .unwrap();
        assert_eq!(entry.transaction_type, "BALANCE_RECEIVED");
        assert!(order.plan.fully_paid());

        m.advance_fulfilment(&mut order, OrderStatus::Delivered).unwrap();
        assert_eq!(order.status, OrderStatus::Delivered);
    }

    #[test]
    fn balance_before_advance_is_rejected() {
        let m = manager();
        let mut order = m.build_order("customer-1", None, "Ring", breakdown());

        let err = m
            .record_installment(&mut order, Installment::Balance, None, Utc::now())
            .unwrap_err();
        assert!(matches!(err, OrderError::BalanceBeforeAdvance));
    }

    #[test]
    fn double_advance_is_rejected() {
        let m = manager();
        let mut order = m.build_order("customer-1", None, "Ring", breakdown());
        let now = Utc::now();

        m.record_installment(&mut order, Installment::Advance, None, now).unwrap();
        let err = m
            .record_installment(&mut order, Installment::Advance, None, now)
            .unwrap_err();
        assert!(matches!(err, OrderError::AlreadyPaid(_)));
    }

    #[test]
    fn expired_pending_order_rejects_advance() {
        let m = CheckoutManager::new(0);
        let mut order = m.build_order("customer-1", None, "Ring", breakdown());

        let later = Utc::now() + Duration::seconds(5);
        let err = m
            .record_installment(&mut order, Installment::Advance, None, later)
            .unwrap_err();
        assert!(matches!(err, OrderError::Expired));
    }

    #[test]
    fn delivery_requires_full_payment() {
        let m = manager();
        let mut order = m.build_order("customer-1", None, "Ring", breakdown());
        m.record_installment(&mut order, Installment::Advance, None, Utc::now()).unwrap();
        m.advance_fulfilment(&mut order, OrderStatus::InProduction).unwrap();
        m.advance_fulfilment(&mut order, OrderStatus::Shipped).unwrap();

        let err = m.advance_fulfilment(&mut order, OrderStatus::Delivered).unwrap_err();
        assert!(matches!(err, OrderError::InvalidTransition { .. }));
    }

    #[test]
    fn cancel_before_advance_has_no_refund() {
        let m = manager();
        let mut order = m.build_order("customer-1", None, "Ring", breakdown());

        let refund = m.cancel(&mut order).unwrap();
        assert!(refund.is_none());
        assert_eq!(order.status, OrderStatus::Cancelled);
    }

    #[test]
    fn cancel_after_advance_records_refund_due() {
        let m = manager();
        let mut order = m.build_order("customer-1", None, "Ring", breakdown());
        m.record_installment(&mut order, Installment::Advance, None, Utc::now()).unwrap();

        let refund = m.cancel(&mut order).unwrap().unwrap();
        assert_eq!(refund.transaction_type, "REFUND_DUE");
        assert_eq!(refund.amount_paise, order.plan.advance_due_paise);
    }

    #[test]
    fn cancelled_order_is_terminal() {
        let m = manager();
        let mut order = m.build_order("customer-1", None, "Ring", breakdown());
        m.cancel(&mut order).unwrap();

        assert!(m.cancel(&mut order).is_err());
        assert!(m
            .record_installment(&mut order, Installment::Advance, None, Utc::now())
            .is_err());
    }

    #[test]
    fn expiry_sweep_only_touches_pending() {
        let m = CheckoutManager::new(0);
        let mut pending = m.build_order("c", None, "Ring", breakdown());
        let mut paid = m.build_order("c", None, "Ring", breakdown());
        // Keep the second order alive long enough to take the deposit.
        paid.expires_at = Some(Utc::now() + Duration::seconds(3600));
        m.record_installment(&mut paid, Installment::Advance, None, Utc::now()).unwrap();

        let later = Utc::now() + Duration::seconds(5);
        assert!(m.expire_if_due(&mut pending, later));
        assert_eq!(pending.status, OrderStatus::Expired);
        assert!(!m.expire_if_due(&mut paid, later));
    }
}

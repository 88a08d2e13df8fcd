use chrono::Utc;
use tokio::time::{interval, Duration};
use tracing::{error, info};

use aurelia_catalog::rates::RateProvider;
use aurelia_order::models::OrderStatus;
use aurelia_order::repository::OrderRepository;

use crate::state::AppState;

/// Background loop: keeps the gold/FX cache warm and expires PENDING orders whose
/// quoted price is no longer honored.
pub async fn start_background_worker(state: AppState, tick_seconds: u64) {
    info!("Background worker started (tick every {}s)", tick_seconds);
    let mut ticker = interval(Duration::from_secs(tick_seconds));

    loop {
        ticker.tick().await;

        refresh_rates(&state).await;
        expire_stale_orders(&state).await;
    }
}

/// Refetch the feeds so storefront quotes rarely pay the fetch latency. Failures
/// are logged and retried next tick; quoting itself fetches on demand.
async fn refresh_rates(state: &AppState) {
    match state.rates.current_rates(true).await {
        Ok(snapshot) => {
            info!(
                "Rates refreshed: gold {} paise/g, {} INR/USD{}",
                snapshot.gold_price_per_gram_paise,
                snapshot.inr_per_usd,
                if snapshot.fx_fallback { " (fallback)" } else { "" }
            );
        }
        Err(e) => error!("Scheduled rate refresh failed: {}", e),
    }
}

/// Sweep PENDING orders past their quote TTL into EXPIRED.
async fn expire_stale_orders(state: &AppState) {
    let pending = match state.order_repo.list_orders_by_status(OrderStatus::Pending).await {
        Ok(orders) => orders,
        Err(e) => {
            error!("Expiry sweep failed to list pending orders: {}", e);
            return;
        }
    };

    let now = Utc::now();
    for mut order in pending {
        if state.checkout.expire_if_due(&mut order, now) {
            match state.order_repo.save_order(&order).await {
                Ok(()) => info!("Order {} expired (quote TTL elapsed)", order.id),
                Err(e) => error!("Failed to persist expiry for order {}: {}", order.id, e),
            }
        }
    }
}

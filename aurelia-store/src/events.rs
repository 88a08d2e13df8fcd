use aurelia_shared::models::events::{
    DesignSubmittedEvent, InstallmentPaidEvent, OrderPlacedEvent, QuoteComputedEvent,
};
use serde::Serialize;
use tracing::info;

/// Structured telemetry sink. Events are serialized to JSON and emitted under the
/// `telemetry` target so a log shipper can pick them up without a broker in the
/// deployment.
#[derive(Clone, Default)]
pub struct Telemetry;

impl Telemetry {
    pub fn new() -> Self {
        Self
    }

    fn emit<E: Serialize>(&self, event_type: &str, event: &E) {
        match serde_json::to_string(event) {
            Ok(payload) => {
                info!(target: "telemetry", event = event_type, payload = %payload);
            }
            Err(e) => {
                tracing::error!("Failed to serialize {} event: {}", event_type, e);
            }
        }
    }

    pub fn log_quote_computed(&self, event: QuoteComputedEvent) {
        self.emit("quote_computed", &event);
    }

    pub fn log_order_placed(&self, event: OrderPlacedEvent) {
        self.emit("order_placed", &event);
    }

    pub fn log_installment_paid(&self, event: InstallmentPaidEvent) {
        self.emit("installment_paid", &event);
    }

    pub fn log_design_submitted(&self, event: DesignSubmittedEvent) {
        self.emit("design_submitted", &event);
    }
}

use uuid::Uuid;

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct QuoteComputedEvent {
    pub product_id: Option<Uuid>,
    pub metal_type_code: String,
    pub grand_total_paise: i64,
    pub fx_fallback: bool,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct OrderPlacedEvent {
    pub order_id: Uuid,
    pub customer_id: String,
    pub grand_total_paise: i64,
    pub advance_due_paise: i64,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct InstallmentPaidEvent {
    pub order_id: Uuid,
    pub installment: String,
    pub amount_paise: i64,
    pub provider_reference: Option<String>,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct DesignSubmittedEvent {
    pub request_id: Uuid,
    pub customer_id: Option<String>,
    pub budget_max_paise: Option<i64>,
    pub timestamp: i64,
}

use async_trait::async_trait;
use uuid::Uuid;

use crate::finance::LedgerEntry;
use crate::models::{Order, OrderStatus};

type RepoError = Box<dyn std::error::Error + Send + Sync>;

/// Repository trait for order data access
#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn create_order(&self, order: &Order) -> Result<Uuid, RepoError>;

    async fn get_order(&self, id: Uuid) -> Result<Option<Order>, RepoError>;

    /// Persist status and payment-plan mutations made in-process.
    async fn save_order(&self, order: &Order) -> Result<(), RepoError>;

    async fn list_orders(&self, customer_id: Option<&str>) -> Result<Vec<Order>, RepoError>;

    async fn list_orders_by_status(&self, status: OrderStatus) -> Result<Vec<Order>, RepoError>;

    async fn add_ledger_entry(&self, entry: &LedgerEntry) -> Result<(), RepoError>;

    async fn list_ledger_entries(&self, order_id: Uuid) -> Result<Vec<LedgerEntry>, RepoError>;
}

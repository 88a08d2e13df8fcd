use async_trait::async_trait;
use aurelia_order::finance::LedgerEntry;
use aurelia_order::models::{Order, OrderItem, OrderStatus, PaymentPlan};
use aurelia_order::repository::OrderRepository;
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

type RepoError = Box<dyn std::error::Error + Send + Sync>;

pub struct StoreOrderRepository {
    pool: PgPool,
}

impl StoreOrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn load_items(&self, order_id: Uuid) -> Result<Vec<OrderItem>, RepoError> {
        let rows: Vec<OrderItemRow> = sqlx::query_as(
            "SELECT id, order_id, product_id, name, breakdown, created_at \
             FROM order_items WHERE order_id = $1 ORDER BY created_at",
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(OrderItemRow::into_item).collect()
    }

    async fn hydrate(&self, row: OrderRow) -> Result<Order, RepoError> {
        let items = self.load_items(row.id).await?;
        row.into_order(items)
    }
}

// Internal structs for type-safe querying
#[derive(sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    customer_id: String,
    status: String,
    plan: Value,
    expires_at: Option<chrono::DateTime<chrono::Utc>>,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderItem>) -> Result<Order, RepoError> {
        let status = OrderStatus::parse(&self.status)
            .ok_or_else(|| format!("unknown order status {}", self.status))?;
        let plan: PaymentPlan = serde_json::from_value(self.plan)?;

        Ok(Order {
            id: self.id,
            customer_id: self.customer_id,
            items,
            status,
            plan,
            expires_at: self.expires_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct OrderItemRow {
    id: Uuid,
    order_id: Uuid,
    product_id: Option<Uuid>,
    name: String,
    breakdown: Value,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl OrderItemRow {
    fn into_item(self) -> Result<OrderItem, RepoError> {
        Ok(OrderItem {
            id: self.id,
            order_id: self.order_id,
            product_id: self.product_id,
            name: self.name,
            breakdown: serde_json::from_value(self.breakdown)?,
            created_at: self.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct LedgerRow {
    id: Uuid,
    order_id: Uuid,
    transaction_type: String,
    amount_paise: i64,
    currency: String,
    description: Option<String>,
    created_at: chrono::DateTime<chrono::Utc>,
}

#[async_trait]
impl OrderRepository for StoreOrderRepository {
    async fn create_order(&self, order: &Order) -> Result<Uuid, RepoError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO orders (id, customer_id, status, plan, expires_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(order.id)
        .bind(&order.customer_id)
        .bind(order.status.as_str())
        .bind(serde_json::to_value(&order.plan)?)
        .bind(order.expires_at)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *tx)
        .await?;

        for item in &order.items {
            sqlx::query(
                r#"
                INSERT INTO order_items (id, order_id, product_id, name, breakdown, created_at)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(item.id)
            .bind(order.id)
            .bind(item.product_id)
            .bind(&item.name)
            .bind(serde_json::to_value(&item.breakdown)?)
            .bind(item.created_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(order.id)
    }

    async fn get_order(&self, id: Uuid) -> Result<Option<Order>, RepoError> {
        let row: Option<OrderRow> = sqlx::query_as(
            "SELECT id, customer_id, status, plan, expires_at, created_at, updated_at \
             FROM orders WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(self.hydrate(row).await?)),
            None => Ok(None),
        }
    }

    async fn save_order(&self, order: &Order) -> Result<(), RepoError> {
        sqlx::query(
            r#"
            UPDATE orders
            SET status = $1, plan = $2, expires_at = $3, updated_at = $4
            WHERE id = $5
            "#,
        )
        .bind(order.status.as_str())
        .bind(serde_json::to_value(&order.plan)?)
        .bind(order.expires_at)
        .bind(order.updated_at)
        .bind(order.id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_orders(&self, customer_id: Option<&str>) -> Result<Vec<Order>, RepoError> {
        let rows: Vec<OrderRow> = if let Some(customer_id) = customer_id {
            sqlx::query_as(
                "SELECT id, customer_id, status, plan, expires_at, created_at, updated_at \
                 FROM orders WHERE customer_id = $1 ORDER BY created_at DESC",
            )
            .bind(customer_id)
            .fetch_all(&self.pool)
            .await?
        } else {
            sqlx::query_as(
                "SELECT id, customer_id, status, plan, expires_at, created_at, updated_at \
                 FROM orders ORDER BY created_at DESC",
            )
            .fetch_all(&self.pool)
            .await?
        };

        let mut orders = Vec::with_capacity(rows.len());
        for row in rows {
            orders.push(self.hydrate(row).await?);
        }
        Ok(orders)
    }

    async fn list_orders_by_status(&self, status: OrderStatus) -> Result<Vec<Order>, RepoError> {
        let rows: Vec<OrderRow> = sqlx::query_as(
            "SELECT id, customer_id, status, plan, expires_at, created_at, updated_at \
             FROM orders WHERE status = $1 ORDER BY created_at",
        )
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await?;

        let mut orders = Vec::with_capacity(rows.len());
        for row in rows {
            orders.push(self.hydrate(row).await?);
        }
        Ok(orders)
    }

    async fn add_ledger_entry(&self, entry: &LedgerEntry) -> Result<(), RepoError> {
        sqlx::query(
            r#"
            INSERT INTO order_ledger (id, order_id, transaction_type, amount_paise, currency, description, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(entry.id)
        .bind(entry.order_id)
        .bind(&entry.transaction_type)
        .bind(entry.amount_paise)
        .bind(&entry.currency)
        .bind(&entry.description)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_ledger_entries(&self, order_id: Uuid) -> Result<Vec<LedgerEntry>, RepoError> {
        let rows: Vec<LedgerRow> = sqlx::query_as(
            "SELECT id, order_id, transaction_type, amount_paise, currency, description, created_at \
             FROM order_ledger WHERE order_id = $1 ORDER BY created_at",
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| LedgerEntry {
                id: row.id,
                order_id: row.order_id,
                transaction_type: row.transaction_type,
                amount_paise: row.amount_paise,
                currency: row.currency,
                description: row.description,
                created_at: row.created_at,
            })
            .collect())
    }
}

use async_trait::async_trait;
use aurelia_catalog::materials::{MetalType, StoneType};
use aurelia_catalog::product::{Product, ProductCategory, StoneSetting};
use aurelia_catalog::repository::{MaterialRepository, ProductRepository};
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

type RepoError = Box<dyn std::error::Error + Send + Sync>;

pub struct StoreProductRepository {
    pool: PgPool,
}

impl StoreProductRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Internal struct for type-safe querying
#[derive(sqlx::FromRow)]
struct ProductRow {
    id: Uuid,
    sku: String,
    category: String,
    name: String,
    description: Option<String>,
    image_urls: Value,
    metal_type_code: String,
    metal_weight_grams: f64,
    stones: Value,
    price_override_paise: Option<i64>,
    is_active: bool,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl ProductRow {
    fn into_product(self) -> Result<Product, RepoError> {
        let category: ProductCategory =
            serde_json::from_value(Value::String(self.category.clone()))
                .map_err(|_| format!("unknown product category {}", self.category))?;
        let image_urls: Vec<String> = serde_json::from_value(self.image_urls)?;
        let stones: Vec<StoneSetting> = serde_json::from_value(self.stones)?;

        Ok(Product {
            id: self.id,
            sku: self.sku,
            category,
            name: self.name,
            description: self.description,
            image_urls,
            metal_type_code: self.metal_type_code,
            metal_weight_grams: self.metal_weight_grams,
            stones,
            price_override_paise: self.price_override_paise,
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn category_str(category: ProductCategory) -> Result<String, RepoError> {
    match serde_json::to_value(category)? {
        Value::String(s) => Ok(s),
        other => Err(format!("unexpected category encoding {}", other).into()),
    }
}

#[async_trait]
impl ProductRepository for StoreProductRepository {
    async fn create_product(&self, product: &Product) -> Result<Uuid, RepoError> {
        sqlx::query(
            r#"
            INSERT INTO products (id, sku, category, name, description, image_urls, metal_type_code,
                                  metal_weight_grams, stones, price_override_paise, is_active,
                                  created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(product.id)
        .bind(&product.sku)
        .bind(category_str(product.category)?)
        .bind(&product.name)
        .bind(&product.description)
        .bind(serde_json::to_value(&product.image_urls)?)
        .bind(&product.metal_type_code)
        .bind(product.metal_weight_grams)
        .bind(serde_json::to_value(&product.stones)?)
        .bind(product.price_override_paise)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(product.id)
    }

    async fn get_product(&self, id: Uuid) -> Result<Option<Product>, RepoError> {
        let row: Option<ProductRow> = sqlx::query_as(
            "SELECT id, sku, category, name, description, image_urls, metal_type_code, \
             metal_weight_grams, stones, price_override_paise, is_active, created_at, updated_at \
             FROM products WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(ProductRow::into_product).transpose()
    }

    async fn list_products(
        &self,
        category: Option<&str>,
        only_active: bool,
    ) -> Result<Vec<Product>, RepoError> {
        let rows: Vec<ProductRow> = if let Some(category) = category {
            sqlx::query_as(
                "SELECT id, sku, category, name, description, image_urls, metal_type_code, \
                 metal_weight_grams, stones, price_override_paise, is_active, created_at, updated_at \
                 FROM products WHERE category = $1 AND (is_active OR NOT $2) ORDER BY name",
            )
            .bind(category)
            .bind(only_active)
            .fetch_all(&self.pool)
            .await?
        } else {
            sqlx::query_as(
                "SELECT id, sku, category, name, description, image_urls, metal_type_code, \
                 metal_weight_grams, stones, price_override_paise, is_active, created_at, updated_at \
                 FROM products WHERE (is_active OR NOT $1) ORDER BY name",
            )
            .bind(only_active)
            .fetch_all(&self.pool)
            .await?
        };

        rows.into_iter().map(ProductRow::into_product).collect()
    }

    async fn update_product(&self, id: Uuid, product: &Product) -> Result<(), RepoError> {
        sqlx::query(
            r#"
            UPDATE products
            SET sku = $1, category = $2, name = $3, description = $4, image_urls = $5,
                metal_type_code = $6, metal_weight_grams = $7, stones = $8,
                price_override_paise = $9, is_active = $10, updated_at = NOW()
            WHERE id = $11
            "#,
        )
        .bind(&product.sku)
        .bind(category_str(product.category)?)
        .bind(&product.name)
        .bind(&product.description)
        .bind(serde_json::to_value(&product.image_urls)?)
        .bind(&product.metal_type_code)
        .bind(product.metal_weight_grams)
        .bind(serde_json::to_value(&product.stones)?)
        .bind(product.price_override_paise)
        .bind(product.is_active)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn deactivate_product(&self, id: Uuid) -> Result<(), RepoError> {
        sqlx::query("UPDATE products SET is_active = FALSE, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

pub struct StoreMaterialRepository {
    pool: PgPool,
}

impl StoreMaterialRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct MetalTypeRow {
    code: String,
    name: String,
    purity_label: String,
    price_modifier: f64,
    is_active: bool,
}

#[derive(sqlx::FromRow)]
struct StoneTypeRow {
    code: String,
    name: String,
    price_per_carat_paise: i64,
    is_active: bool,
}

impl From<MetalTypeRow> for MetalType {
    fn from(row: MetalTypeRow) -> Self {
        MetalType {
            code: row.code,
            name: row.name,
            purity_label: row.purity_label,
            price_modifier: row.price_modifier,
            is_active: row.is_active,
        }
    }
}

impl From<StoneTypeRow> for StoneType {
    fn from(row: StoneTypeRow) -> Self {
        StoneType {
            code: row.code,
            name: row.name,
            price_per_carat_paise: row.price_per_carat_paise,
            is_active: row.is_active,
        }
    }
}

#[async_trait]
impl MaterialRepository for StoreMaterialRepository {
    async fn get_metal_type(&self, code: &str) -> Result<Option<MetalType>, RepoError> {
        let row: Option<MetalTypeRow> = sqlx::query_as(
            "SELECT code, name, purity_label, price_modifier, is_active FROM metal_types WHERE code = $1",
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn list_metal_types(&self) -> Result<Vec<MetalType>, RepoError> {
        let rows: Vec<MetalTypeRow> = sqlx::query_as(
            "SELECT code, name, purity_label, price_modifier, is_active FROM metal_types \
             WHERE is_active ORDER BY code",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn upsert_metal_type(&self, metal: &MetalType) -> Result<(), RepoError> {
        sqlx::query(
            r#"
            INSERT INTO metal_types (code, name, purity_label, price_modifier, is_active)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (code) DO UPDATE
            SET name = $2, purity_label = $3, price_modifier = $4, is_active = $5
            "#,
        )
        .bind(&metal.code)
        .bind(&metal.name)
        .bind(&metal.purity_label)
        .bind(metal.price_modifier)
        .bind(metal.is_active)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_stone_type(&self, code: &str) -> Result<Option<StoneType>, RepoError> {
        let row: Option<StoneTypeRow> = sqlx::query_as(
            "SELECT code, name, price_per_carat_paise, is_active FROM stone_types WHERE code = $1",
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn list_stone_types(&self) -> Result<Vec<StoneType>, RepoError> {
        let rows: Vec<StoneTypeRow> = sqlx::query_as(
            "SELECT code, name, price_per_carat_paise, is_active FROM stone_types \
             WHERE is_active ORDER BY code",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn upsert_stone_type(&self, stone: &StoneType) -> Result<(), RepoError> {
        sqlx::query(
            r#"
            INSERT INTO stone_types (code, name, price_per_carat_paise, is_active)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (code) DO UPDATE
            SET name = $2, price_per_carat_paise = $3, is_active = $4
            "#,
        )
        .bind(&stone.code)
        .bind(&stone.name)
        .bind(stone.price_per_carat_paise)
        .bind(stone.is_active)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

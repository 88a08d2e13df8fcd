use async_trait::async_trait;
use uuid::Uuid;

use crate::materials::{MetalType, StoneType};
use crate::product::Product;

type RepoError = Box<dyn std::error::Error + Send + Sync>;

/// Repository trait for catalog product access
#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn create_product(&self, product: &Product) -> Result<Uuid, RepoError>;

    async fn get_product(&self, id: Uuid) -> Result<Option<Product>, RepoError>;

    async fn list_products(
        &self,
        category: Option<&str>,
        only_active: bool,
    ) -> Result<Vec<Product>, RepoError>;

    async fn update_product(&self, id: Uuid, product: &Product) -> Result<(), RepoError>;

    /// Soft delete: flips `is_active` off, rows are never removed.
    async fn deactivate_product(&self, id: Uuid) -> Result<(), RepoError>;
}

/// Repository trait for metal/stone rate tables
#[async_trait]
pub trait MaterialRepository: Send + Sync {
    async fn get_metal_type(&self, code: &str) -> Result<Option<MetalType>, RepoError>;

    async fn list_metal_types(&self) -> Result<Vec<MetalType>, RepoError>;

    async fn upsert_metal_type(&self, metal: &MetalType) -> Result<(), RepoError>;

    async fn get_stone_type(&self, code: &str) -> Result<Option<StoneType>, RepoError>;

    async fn list_stone_types(&self) -> Result<Vec<StoneType>, RepoError>;

    async fn upsert_stone_type(&self, stone: &StoneType) -> Result<(), RepoError>;
}

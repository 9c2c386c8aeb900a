use thiserror::Error;

use crate::db_types::{OutletProductView, OutletView, ProductId};

#[derive(Debug, Clone, Error)]
pub enum CatalogError {
    #[error("Catalog lookup failed: {0}")]
    DatabaseError(String),
}

impl From<sqlx::Error> for CatalogError {
    fn from(e: sqlx::Error) -> Self {
        CatalogError::DatabaseError(e.to_string())
    }
}

/// Read-only access to the outlet catalog. Outlet and product management live outside the engine; order placement
/// only needs to know whether an outlet is open and what it charges for a product.
#[allow(async_fn_in_trait)]
pub trait CatalogLookup: Clone {
    async fn fetch_outlet(&self, outlet_id: i64) -> Result<Option<OutletView>, CatalogError>;

    /// Fetches the outlet-specific view of a product. Returns `None` if the outlet does not list the product.
    async fn fetch_outlet_product(
        &self,
        outlet_id: i64,
        product_id: &ProductId,
    ) -> Result<Option<OutletProductView>, CatalogError>;
}

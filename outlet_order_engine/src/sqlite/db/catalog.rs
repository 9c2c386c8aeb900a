use sqlx::SqliteConnection;

use crate::db_types::{OutletProductView, OutletView, ProductId};

pub async fn fetch_outlet(outlet_id: i64, conn: &mut SqliteConnection) -> Result<Option<OutletView>, sqlx::Error> {
    sqlx::query_as("SELECT id, name, is_active FROM outlets WHERE id = $1").bind(outlet_id).fetch_optional(conn).await
}

pub async fn fetch_outlet_product(
    outlet_id: i64,
    product_id: &ProductId,
    conn: &mut SqliteConnection,
) -> Result<Option<OutletProductView>, sqlx::Error> {
    sqlx::query_as(
        r#"
        SELECT
            outlet_id,
            product_id,
            product_name,
            base_price,
            outlet_price,
            is_available,
            minimum_order_quantity
        FROM outlet_products
        WHERE outlet_id = $1 AND product_id = $2
        "#,
    )
    .bind(outlet_id)
    .bind(product_id.as_str())
    .fetch_optional(conn)
    .await
}

/// Adds an outlet to the catalog, or replaces it. The engine never calls this; it exists for seeding and tooling.
pub async fn upsert_outlet(outlet: &OutletView, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO outlets (id, name, is_active) VALUES ($1, $2, $3) ON CONFLICT(id) DO UPDATE SET name = \
         excluded.name, is_active = excluded.is_active",
    )
    .bind(outlet.id)
    .bind(&outlet.name)
    .bind(outlet.is_active)
    .execute(conn)
    .await?;
    Ok(())
}

/// Adds a product listing to an outlet, or replaces it.
pub async fn upsert_outlet_product(product: &OutletProductView, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO outlet_products (
            outlet_id,
            product_id,
            product_name,
            base_price,
            outlet_price,
            is_available,
            minimum_order_quantity
        ) VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT(outlet_id, product_id) DO UPDATE SET
            product_name = excluded.product_name,
            base_price = excluded.base_price,
            outlet_price = excluded.outlet_price,
            is_available = excluded.is_available,
            minimum_order_quantity = excluded.minimum_order_quantity
        "#,
    )
    .bind(product.outlet_id)
    .bind(product.product_id.as_str())
    .bind(&product.product_name)
    .bind(product.base_price)
    .bind(product.outlet_price)
    .bind(product.is_available)
    .bind(product.minimum_order_quantity)
    .execute(conn)
    .await?;
    Ok(())
}

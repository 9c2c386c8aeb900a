//! A small, fixed catalog that the engine tests place orders against.
use crate::{
    db_types::{Money, OutletProductView, OutletView, ProductId},
    SqliteDatabase,
};

pub const OPEN_OUTLET: i64 = 1;
pub const CLOSED_OUTLET: i64 = 2;
pub const OTHER_OUTLET: i64 = 3;

fn money(s: &str) -> Money {
    s.parse().expect("valid amount")
}

pub fn outlet_product(
    outlet_id: i64,
    product_id: &str,
    name: &str,
    base_price: &str,
    outlet_price: Option<&str>,
) -> OutletProductView {
    OutletProductView {
        outlet_id,
        product_id: ProductId::from(product_id),
        product_name: name.to_string(),
        base_price: money(base_price),
        outlet_price: outlet_price.map(money),
        is_available: true,
        minimum_order_quantity: None,
    }
}

/// Seeds three outlets:
/// * outlet 1 is open and sells `thali` (99.00 at this outlet, 120.00 base), `lassi` (33.33), `samosa` (15.00,
///   minimum 4), and `kulfi` (unavailable).
/// * outlet 2 is closed.
/// * outlet 3 is open and sells `thali` at its base price.
pub async fn seed_catalog(db: &SqliteDatabase) {
    let outlets = [
        OutletView { id: OPEN_OUTLET, name: "Koramangala".into(), is_active: true },
        OutletView { id: CLOSED_OUTLET, name: "Indiranagar".into(), is_active: false },
        OutletView { id: OTHER_OUTLET, name: "Whitefield".into(), is_active: true },
    ];
    for outlet in &outlets {
        db.upsert_outlet(outlet).await.expect("Error seeding outlet");
    }
    let mut samosa = outlet_product(OPEN_OUTLET, "samosa", "Samosa", "15.00", None);
    samosa.minimum_order_quantity = Some(4);
    let mut kulfi = outlet_product(OPEN_OUTLET, "kulfi", "Kulfi", "45.00", None);
    kulfi.is_available = false;
    let products = [
        outlet_product(OPEN_OUTLET, "thali", "Veg Thali", "120.00", Some("99.00")),
        outlet_product(OPEN_OUTLET, "lassi", "Sweet Lassi", "33.33", None),
        samosa,
        kulfi,
        outlet_product(CLOSED_OUTLET, "thali", "Veg Thali", "120.00", None),
        outlet_product(OTHER_OUTLET, "thali", "Veg Thali", "120.00", None),
    ];
    for product in &products {
        db.upsert_outlet_product(product).await.expect("Error seeding product");
    }
}

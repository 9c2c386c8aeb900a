use std::{
    collections::HashMap,
    fmt::{Debug, Formatter},
};

use cucumber::World;
use outlet_order_engine::{
    db_types::OrderId,
    payment_objects::{PaymentInitiation, WebhookOutcome},
    OrderFlowApi,
    OrderPortsAdapter,
    PaymentFlowApi,
    SqliteDatabase,
};

use crate::support::{seeded_db, FakeGateway, GatewayMode};

pub type Payments = PaymentFlowApi<SqliteDatabase, OrderPortsAdapter<SqliteDatabase>, FakeGateway>;

/// Orders and payments are referred to by the aliases the feature files give them, e.g. `[lunch]`.
#[derive(Default, Debug, World)]
pub struct OutletWorld {
    pub system: Option<OutletSystem>,
    pub orders: HashMap<String, OrderId>,
    pub payments: HashMap<String, PaymentInitiation>,
    pub last_outcome: Option<WebhookOutcome>,
    pub last_error: Option<String>,
}

pub struct OutletSystem {
    pub db: SqliteDatabase,
    pub gateway: FakeGateway,
    pub orders: OrderFlowApi<SqliteDatabase, SqliteDatabase>,
    pub payments: Payments,
}

impl Debug for OutletSystem {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "OutletSystem({})", self.db.url())
    }
}

impl OutletSystem {
    pub async fn new() -> Self {
        let db = seeded_db().await;
        let gateway = FakeGateway::new(GatewayMode::Working);
        let orders = OrderFlowApi::new(db.clone(), db.clone());
        let payments = payment_api(&db, &gateway, false);
        Self { db, gateway, orders, payments }
    }
}

pub fn payment_api(db: &SqliteDatabase, gateway: &FakeGateway, fallback: bool) -> Payments {
    let ports = OrderPortsAdapter::new(db.clone(), "INR");
    PaymentFlowApi::new(db.clone(), ports, gateway.clone()).with_test_mode_fallback(fallback)
}

impl OutletWorld {
    pub fn system(&self) -> &OutletSystem {
        self.system.as_ref().expect("System not initialised. Start the scenario with 'Given a fresh install'")
    }

    pub fn order_id(&self, alias: &str) -> OrderId {
        self.orders.get(alias).cloned().unwrap_or_else(|| panic!("No order called [{alias}]"))
    }

    pub fn payment(&self, alias: &str) -> &PaymentInitiation {
        self.payments.get(alias).unwrap_or_else(|| panic!("No payment started for order [{alias}]"))
    }
}

#![allow(dead_code)]
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use outlet_order_engine::{
    db_types::{OrderId, ProductId},
    test_utils::{
        prepare_env::{prepare_test_env, random_db_path},
        seed::seed_catalog,
    },
    traits::{InventoryDeductionPort, InventoryError},
    GatewayError,
    PaymentGatewayPort,
    SqliteDatabase,
};

pub const GOOD_SIGNATURE: &str = "valid-signature";

pub async fn seeded_db() -> SqliteDatabase {
    let url = random_db_path();
    let db = prepare_test_env(&url).await;
    seed_catalog(&db).await;
    db
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayMode {
    Working,
    NotConfigured,
    Timeout,
}

/// A gateway double that hands out sequential references and records every refund it is asked for.
#[derive(Debug, Clone)]
pub struct FakeGateway {
    mode: Arc<Mutex<GatewayMode>>,
    orders: Arc<Mutex<Vec<(i64, String, String)>>>,
    refunds: Arc<Mutex<Vec<(String, Option<i64>)>>>,
}

impl FakeGateway {
    pub fn new(mode: GatewayMode) -> Self {
        Self { mode: Arc::new(Mutex::new(mode)), orders: Arc::default(), refunds: Arc::default() }
    }

    pub fn set_mode(&self, mode: GatewayMode) {
        *self.mode.lock().unwrap() = mode;
    }

    pub fn orders(&self) -> Vec<(i64, String, String)> {
        self.orders.lock().unwrap().clone()
    }

    pub fn refunds(&self) -> Vec<(String, Option<i64>)> {
        self.refunds.lock().unwrap().clone()
    }

    fn fail(&self) -> Option<GatewayError> {
        match *self.mode.lock().unwrap() {
            GatewayMode::Working => None,
            GatewayMode::NotConfigured => Some(GatewayError::NotConfigured("no keys".into())),
            GatewayMode::Timeout => Some(GatewayError::Timeout),
        }
    }
}

impl PaymentGatewayPort for FakeGateway {
    fn key_id(&self) -> String {
        "rzp_test_fake".into()
    }

    async fn create_gateway_order(&self, amount_minor: i64, currency: &str, receipt: &str) -> Result<String, GatewayError> {
        if let Some(e) = self.fail() {
            return Err(e);
        }
        let mut orders = self.orders.lock().unwrap();
        orders.push((amount_minor, currency.to_string(), receipt.to_string()));
        Ok(format!("order_fake{}", orders.len()))
    }

    fn verify_webhook_signature(&self, _body: &str, signature: &str) -> bool {
        signature == GOOD_SIGNATURE
    }

    async fn create_refund(&self, gateway_payment_id: &str, amount_minor: Option<i64>) -> Result<String, GatewayError> {
        if let Some(e) = self.fail() {
            return Err(e);
        }
        let mut refunds = self.refunds.lock().unwrap();
        refunds.push((gateway_payment_id.to_string(), amount_minor));
        Ok(format!("rfnd_fake{}", refunds.len()))
    }
}

/// Records every deduction request, and optionally fails all of them.
#[derive(Debug, Clone, Default)]
pub struct RecordingInventory {
    pub fail: bool,
    calls: Arc<Mutex<Vec<(OrderId, i64, HashMap<ProductId, u32>)>>>,
}

impl RecordingInventory {
    pub fn failing() -> Self {
        Self { fail: true, ..Default::default() }
    }

    pub fn calls(&self) -> Vec<(OrderId, i64, HashMap<ProductId, u32>)> {
        self.calls.lock().unwrap().clone()
    }
}

impl InventoryDeductionPort for RecordingInventory {
    async fn deduct_for_order(
        &self,
        order_id: &OrderId,
        outlet_id: i64,
        quantities: &HashMap<ProductId, u32>,
    ) -> Result<(), InventoryError> {
        self.calls.lock().unwrap().push((order_id.clone(), outlet_id, quantities.clone()));
        if self.fail {
            Err(InventoryError("warehouse offline".into()))
        } else {
            Ok(())
        }
    }
}

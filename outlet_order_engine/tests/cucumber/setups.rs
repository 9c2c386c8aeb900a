use cucumber::given;

use crate::{
    cucumber::{
        outlet_world::{payment_api, OutletSystem},
        OutletWorld,
    },
    support::GatewayMode,
};

#[given("a fresh install")]
async fn fresh_database(world: &mut OutletWorld) {
    let system = OutletSystem::new().await;
    world.system = Some(system);
}

#[given("the payment gateway is not configured")]
async fn gateway_not_configured(world: &mut OutletWorld) {
    world.system().gateway.set_mode(GatewayMode::NotConfigured);
}

#[given("the payment gateway times out")]
async fn gateway_times_out(world: &mut OutletWorld) {
    world.system().gateway.set_mode(GatewayMode::Timeout);
}

#[given("the test-mode fallback is enabled")]
async fn fallback_enabled(world: &mut OutletWorld) {
    let system = world.system.as_mut().expect("System not initialised");
    system.payments = payment_api(&system.db, &system.gateway, true);
}

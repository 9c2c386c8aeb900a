use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use log::*;
use outlet_order_engine::{OrderFlowApi, OrderPortsAdapter, PaymentFlowApi, SqliteDatabase};

use crate::{
    config::ServerConfig,
    errors::ServerError,
    integrations::razorpay::ConfiguredGateway,
    routes::{
        health,
        CreatePaymentRoute,
        CustomerOrderByIdRoute,
        CustomerPaymentByIdRoute,
        OrderByIdRoute,
        OutletOrderByIdRoute,
        PaymentByIdRoute,
        PlaceOrderRoute,
        RefundPaymentRoute,
        RevenueSummaryRoute,
        SearchOrdersRoute,
        SearchPaymentsRoute,
        UpdateOrderStatusRoute,
        UpdateOutletOrderStatusRoute,
        WebhookRoute,
    },
};

const MAX_DB_CONNECTIONS: u32 = 25;

type Ports = OrderPortsAdapter<SqliteDatabase>;

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, MAX_DB_CONNECTIONS)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.migrate().await.map_err(|e| ServerError::InitializeError(format!("Could not run migrations. {e}")))?;
    info!("🗃️ Database at {} is ready", db.url());
    // The gateway strategy is fixed for the lifetime of the process
    let gateway = ConfiguredGateway::from_config(&config.razorpay);
    let srv = create_server_instance(config, db, gateway)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    gateway: ConfiguredGateway,
) -> Result<Server, ServerError> {
    let currency = config.default_currency.clone();
    let fallback = config.gateway_test_mode_fallback;
    let srv = HttpServer::new(move || {
        let orders_api = OrderFlowApi::new(db.clone(), db.clone());
        let ports = OrderPortsAdapter::new(db.clone(), currency.clone());
        let payments_api = PaymentFlowApi::new(db.clone(), ports, gateway.clone()).with_test_mode_fallback(fallback);
        let api_scope = web::scope("/api")
            // revenue_summary must be registered before the /orders/{id} route
            .service(RevenueSummaryRoute::<SqliteDatabase, SqliteDatabase>::new())
            .service(PlaceOrderRoute::<SqliteDatabase, SqliteDatabase>::new())
            .service(SearchOrdersRoute::<SqliteDatabase, SqliteDatabase>::new())
            .service(OrderByIdRoute::<SqliteDatabase, SqliteDatabase>::new())
            .service(UpdateOrderStatusRoute::<SqliteDatabase, SqliteDatabase>::new())
            .service(CustomerOrderByIdRoute::<SqliteDatabase, SqliteDatabase>::new())
            .service(OutletOrderByIdRoute::<SqliteDatabase, SqliteDatabase>::new())
            .service(UpdateOutletOrderStatusRoute::<SqliteDatabase, SqliteDatabase>::new())
            .service(WebhookRoute::<SqliteDatabase, Ports, ConfiguredGateway>::new())
            .service(CreatePaymentRoute::<SqliteDatabase, Ports, ConfiguredGateway>::new())
            .service(SearchPaymentsRoute::<SqliteDatabase, Ports, ConfiguredGateway>::new())
            .service(PaymentByIdRoute::<SqliteDatabase, Ports, ConfiguredGateway>::new())
            .service(RefundPaymentRoute::<SqliteDatabase, Ports, ConfiguredGateway>::new())
            .service(CustomerPaymentByIdRoute::<SqliteDatabase, Ports, ConfiguredGateway>::new());
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("oos::access_log"))
            .app_data(web::Data::new(orders_api))
            .app_data(web::Data::new(payments_api))
            .service(health)
            .service(api_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}

//! Request handler definitions
//!
//! Define each route and its handler here. Handlers should stay thin: unpack the request, call the relevant flow API
//! and let [`ServerError`] take care of the error responses.
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests. Every database and gateway call below is async, so keep it that way.
//!
//! Authentication and role checks happen upstream of this server. Where an operation is scoped to a customer or an
//! outlet, the scope is part of the path, and a resource outside that scope is reported as not found.
use actix_web::{get, web, HttpRequest, HttpResponse, Responder};
use log::*;
use outlet_order_engine::{
    db_types::{OrderId, PaymentId},
    order_objects::{PlaceOrderRequest, UpdateOrderStatusRequest},
    payment_objects::RefundRequest,
    traits::{CatalogLookup, OrderManagement, OrderPorts, PaymentGatewayPort, PaymentManagement},
    OrderFlowApi,
    PaymentFlowApi,
};

use crate::{
    data_objects::{OrderSearchParams, PaymentSearchParams, RevenueParams},
    errors::ServerError,
};

pub const SIGNATURE_HEADER: &str = "X-Razorpay-Signature";

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(place_order => Post "/orders" impl OrderManagement, CatalogLookup);
/// Places a new order at an outlet.
///
/// Every line is priced from the outlet's catalog at the moment of placement. The order starts out `PENDING` and
/// `UNPAID`. Returns `201 Created` with the order and its items.
pub async fn place_order<B: OrderManagement, C: CatalogLookup>(
    body: web::Json<PlaceOrderRequest>,
    api: web::Data<OrderFlowApi<B, C>>,
) -> Result<HttpResponse, ServerError> {
    let request = body.into_inner();
    debug!("💻️ POST place order at outlet {} with {} lines", request.outlet_id, request.items.len());
    let order = api.place_order(request).await.map_err(|e| {
        debug!("💻️ Could not place order. {e}");
        e
    })?;
    Ok(HttpResponse::Created().json(order))
}

route!(search_orders => Get "/orders" impl OrderManagement, CatalogLookup);
/// Searches all orders. Supported query parameters are `outlet_id`, `customer_id`, `status`, `since`, `until`, `page`
/// and `size`. Results are newest first.
pub async fn search_orders<B: OrderManagement, C: CatalogLookup>(
    query: web::Query<OrderSearchParams>,
    api: web::Data<OrderFlowApi<B, C>>,
) -> Result<HttpResponse, ServerError> {
    let (filter, pagination) = query.into_inner().into_query();
    debug!("💻️ GET search orders. {filter}");
    let page = api.search_orders(filter, pagination).await?;
    Ok(HttpResponse::Ok().json(page))
}

route!(revenue_summary => Get "/orders/revenue_summary" impl OrderManagement, CatalogLookup);
/// Revenue from delivered and paid orders, optionally restricted to `from` and `to` (RFC 3339 timestamps).
pub async fn revenue_summary<B: OrderManagement, C: CatalogLookup>(
    query: web::Query<RevenueParams>,
    api: web::Data<OrderFlowApi<B, C>>,
) -> Result<HttpResponse, ServerError> {
    let RevenueParams { from, to } = query.into_inner();
    debug!("💻️ GET revenue summary from {from:?} to {to:?}");
    let summary = api.revenue_summary(from, to).await?;
    Ok(HttpResponse::Ok().json(summary))
}

route!(order_by_id => Get "/orders/{id}" impl OrderManagement, CatalogLookup);
pub async fn order_by_id<B: OrderManagement, C: CatalogLookup>(
    path: web::Path<OrderId>,
    api: web::Data<OrderFlowApi<B, C>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    debug!("💻️ GET order {order_id}");
    let order = api.fetch_order(&order_id).await?;
    Ok(HttpResponse::Ok().json(order))
}

route!(update_order_status => Patch "/orders/{id}/status" impl OrderManagement, CatalogLookup);
/// Moves an order to a new lifecycle status on behalf of an administrator. Ownership is not checked, but the status
/// rules are: terminal orders never change, and cancellation is only possible from `PENDING` or `CONFIRMED`.
pub async fn update_order_status<B: OrderManagement, C: CatalogLookup>(
    path: web::Path<OrderId>,
    body: web::Json<UpdateOrderStatusRequest>,
    api: web::Data<OrderFlowApi<B, C>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    let status = body.into_inner().status;
    info!("💻️ PATCH order {order_id} status to {status}");
    let order = api.update_status(&order_id, status).await.map_err(|e| {
        debug!("💻️ Could not update status of order {order_id}. {e}");
        e
    })?;
    Ok(HttpResponse::Ok().json(order))
}

route!(customer_order_by_id => Get "/customers/{customer_id}/orders/{id}" impl OrderManagement, CatalogLookup);
pub async fn customer_order_by_id<B: OrderManagement, C: CatalogLookup>(
    path: web::Path<(i64, OrderId)>,
    api: web::Data<OrderFlowApi<B, C>>,
) -> Result<HttpResponse, ServerError> {
    let (customer_id, order_id) = path.into_inner();
    debug!("💻️ GET order {order_id} for customer {customer_id}");
    let order = api.fetch_order_for_customer(&order_id, customer_id).await?;
    Ok(HttpResponse::Ok().json(order))
}

route!(outlet_order_by_id => Get "/outlets/{outlet_id}/orders/{id}" impl OrderManagement, CatalogLookup);
pub async fn outlet_order_by_id<B: OrderManagement, C: CatalogLookup>(
    path: web::Path<(i64, OrderId)>,
    api: web::Data<OrderFlowApi<B, C>>,
) -> Result<HttpResponse, ServerError> {
    let (outlet_id, order_id) = path.into_inner();
    debug!("💻️ GET order {order_id} for outlet {outlet_id}");
    let order = api.fetch_order_for_outlet(&order_id, outlet_id).await?;
    Ok(HttpResponse::Ok().json(order))
}

route!(update_outlet_order_status => Patch "/outlets/{outlet_id}/orders/{id}/status" impl OrderManagement, CatalogLookup);
/// Same as [`update_order_status`], except that the order must belong to the outlet in the path.
pub async fn update_outlet_order_status<B: OrderManagement, C: CatalogLookup>(
    path: web::Path<(i64, OrderId)>,
    body: web::Json<UpdateOrderStatusRequest>,
    api: web::Data<OrderFlowApi<B, C>>,
) -> Result<HttpResponse, ServerError> {
    let (outlet_id, order_id) = path.into_inner();
    let status = body.into_inner().status;
    info!("💻️ PATCH order {order_id} status to {status} for outlet {outlet_id}");
    let order = api.update_status_for_outlet(outlet_id, &order_id, status).await.map_err(|e| {
        debug!("💻️ Outlet {outlet_id} could not update status of order {order_id}. {e}");
        e
    })?;
    Ok(HttpResponse::Ok().json(order))
}

//----------------------------------------------   Payments  ----------------------------------------------------
route!(create_payment => Post "/payments/create/{order_id}" impl PaymentManagement, OrderPorts, PaymentGatewayPort);
/// Opens a payment for an order with the gateway. Returns `201 Created` with what the client needs to launch the
/// gateway checkout.
pub async fn create_payment<B, O, G>(
    path: web::Path<OrderId>,
    api: web::Data<PaymentFlowApi<B, O, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: PaymentManagement,
    O: OrderPorts,
    G: PaymentGatewayPort,
{
    let order_id = path.into_inner();
    debug!("💻️ POST create payment for order {order_id}");
    let initiation = api.create_payment(&order_id).await.map_err(|e| {
        warn!("💻️ Could not create a payment for order {order_id}. {e}");
        e
    })?;
    Ok(HttpResponse::Created().json(initiation))
}

route!(webhook => Post "/payments/webhook" impl PaymentManagement, OrderPorts, PaymentGatewayPort);
/// Receives gateway event notifications.
///
/// The raw body is passed through untouched, since the signature in the `X-Razorpay-Signature` header is computed
/// over the exact bytes that were sent. Every delivery that passes verification is acknowledged with `200 OK`,
/// including duplicates and events that are not handled.
pub async fn webhook<B, O, G>(
    req: HttpRequest,
    body: web::Bytes,
    api: web::Data<PaymentFlowApi<B, O, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: PaymentManagement,
    O: OrderPorts,
    G: PaymentGatewayPort,
{
    trace!("💻️ Received webhook delivery ({} bytes)", body.len());
    let body = std::str::from_utf8(&body).map_err(|e| {
        warn!("🪝️ Webhook body is not valid UTF-8. {e}");
        ServerError::InvalidWebhook("The body is not valid UTF-8".into())
    })?;
    let signature = req.headers().get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok());
    let outcome = api.process_webhook(body, signature).await.map_err(|e| {
        info!("🪝️ Webhook delivery rejected. {e}");
        e
    })?;
    Ok(HttpResponse::Ok().json(outcome))
}

route!(payment_by_id => Get "/payments/{id}" impl PaymentManagement, OrderPorts, PaymentGatewayPort);
pub async fn payment_by_id<B, O, G>(
    path: web::Path<PaymentId>,
    api: web::Data<PaymentFlowApi<B, O, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: PaymentManagement,
    O: OrderPorts,
    G: PaymentGatewayPort,
{
    let payment_id = path.into_inner();
    debug!("💻️ GET payment {payment_id}");
    let payment = api.fetch_payment(&payment_id).await?;
    Ok(HttpResponse::Ok().json(payment))
}

route!(search_payments => Get "/payments" impl PaymentManagement, OrderPorts, PaymentGatewayPort);
/// Searches payments by `status`, `since` and `until`, newest first.
pub async fn search_payments<B, O, G>(
    query: web::Query<PaymentSearchParams>,
    api: web::Data<PaymentFlowApi<B, O, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: PaymentManagement,
    O: OrderPorts,
    G: PaymentGatewayPort,
{
    let (filter, pagination) = query.into_inner().into_query();
    debug!("💻️ GET search payments. {filter:?}");
    let page = api.search_payments(filter, pagination).await?;
    Ok(HttpResponse::Ok().json(page))
}

route!(customer_payment_by_id => Get "/customers/{customer_id}/payments/{id}" impl PaymentManagement, OrderPorts, PaymentGatewayPort);
pub async fn customer_payment_by_id<B, O, G>(
    path: web::Path<(i64, PaymentId)>,
    api: web::Data<PaymentFlowApi<B, O, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: PaymentManagement,
    O: OrderPorts,
    G: PaymentGatewayPort,
{
    let (customer_id, payment_id) = path.into_inner();
    debug!("💻️ GET payment {payment_id} for customer {customer_id}");
    let payment = api.fetch_payment_for_customer(&payment_id, customer_id).await?;
    Ok(HttpResponse::Ok().json(payment))
}

route!(refund_payment => Post "/payments/{id}/refund" impl PaymentManagement, OrderPorts, PaymentGatewayPort);
/// Refunds a captured payment. The body is optional: leave out `amount` (or send zero) for a full refund.
pub async fn refund_payment<B, O, G>(
    path: web::Path<PaymentId>,
    body: web::Bytes,
    api: web::Data<PaymentFlowApi<B, O, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: PaymentManagement,
    O: OrderPorts,
    G: PaymentGatewayPort,
{
    let payment_id = path.into_inner();
    let request = refund_request_from_body(&body)?;
    info!("💻️ POST refund for payment {payment_id}. Amount: {:?}", request.amount);
    let result = api.refund(&payment_id, request).await.map_err(|e| {
        warn!("💻️ Could not refund payment {payment_id}. {e}");
        e
    })?;
    Ok(HttpResponse::Ok().json(result))
}

/// An empty body is a full refund. Anything else must be a valid [`RefundRequest`]; a malformed body is never
/// mistaken for a full refund.
fn refund_request_from_body(body: &[u8]) -> Result<RefundRequest, ServerError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(RefundRequest::default());
    }
    serde_json::from_slice(body).map_err(|e| ServerError::InvalidRequestBody(e.to_string()))
}

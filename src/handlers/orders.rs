use actix_web::{web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::application::{Caller, PlaceOrder, Quote};
use crate::domain::errors::DomainError;
use crate::domain::money::{format_money, format_quantity, parse_decimal};
use crate::domain::order::{
    CancellationRequest, Order, OrderDetail, OrderItem, OrderReceipt, ShippingAddress,
};
use crate::domain::pricing::{LineRequest, Totals};
use crate::errors::AppError;

use super::AppService;

pub const IDEMPOTENCY_KEY_HEADER: &str = "idempotency-key";

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct OrderItemRequest {
    pub product_id: Uuid,
    /// Decimal quantity as a string, e.g. "2.5" (meters)
    pub quantity: String,
    /// Unit hint from the cart; the product's own unit is used
    #[serde(default)]
    pub unit: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ShippingAddressDto {
    pub name: String,
    pub phone: String,
    pub address_line1: String,
    #[serde(default)]
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    pub pincode: String,
}

impl From<ShippingAddressDto> for ShippingAddress {
    fn from(dto: ShippingAddressDto) -> Self {
        ShippingAddress {
            name: dto.name,
            phone: dto.phone,
            address_line1: dto.address_line1,
            address_line2: dto.address_line2,
            city: dto.city,
            state: dto.state,
            pincode: dto.pincode,
        }
    }
}

impl From<ShippingAddress> for ShippingAddressDto {
    fn from(address: ShippingAddress) -> Self {
        ShippingAddressDto {
            name: address.name,
            phone: address.phone,
            address_line1: address.address_line1,
            address_line2: address.address_line2,
            city: address.city,
            state: address.state,
            pincode: address.pincode,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    pub items: Vec<OrderItemRequest>,
    pub shipping_address: ShippingAddressDto,
    /// "cod" or "online"
    pub payment_method: String,
    #[serde(default)]
    pub customer_note: Option<String>,
    #[serde(default)]
    pub coupon_code: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct QuoteRequest {
    pub items: Vec<OrderItemRequest>,
    #[serde(default)]
    pub coupon_code: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CancellationRequestBody {
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TotalsResponse {
    pub subtotal: String,
    pub shipping_cost: String,
    pub discount: String,
    pub total: String,
}

impl From<Totals> for TotalsResponse {
    fn from(t: Totals) -> Self {
        TotalsResponse {
            subtotal: format_money(&t.subtotal),
            shipping_cost: format_money(&t.shipping_cost),
            discount: format_money(&t.discount),
            total: format_money(&t.total),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CreateOrderResponse {
    pub order_id: Uuid,
    pub order_number: String,
    pub totals: TotalsResponse,
    pub coupon_code: Option<String>,
}

impl From<OrderReceipt> for CreateOrderResponse {
    fn from(r: OrderReceipt) -> Self {
        CreateOrderResponse {
            order_id: r.order_id,
            order_number: r.order_number,
            totals: r.totals.into(),
            coupon_code: r.coupon_code,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct QuoteLineResponse {
    pub product_id: Uuid,
    pub product_name: String,
    pub product_sku: Option<String>,
    pub unit_price: String,
    pub quantity: String,
    pub unit: String,
    pub line_total: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct QuoteResponse {
    pub lines: Vec<QuoteLineResponse>,
    pub totals: TotalsResponse,
    pub coupon_code: Option<String>,
}

impl From<Quote> for QuoteResponse {
    fn from(q: Quote) -> Self {
        QuoteResponse {
            lines: q
                .lines
                .into_iter()
                .map(|l| QuoteLineResponse {
                    product_id: l.product_id,
                    product_name: l.product_name,
                    product_sku: l.product_sku,
                    unit_price: format_money(&l.unit_price),
                    quantity: format_quantity(&l.quantity),
                    unit: l.unit,
                    line_total: format_money(&l.line_total),
                })
                .collect(),
            totals: q.totals.into(),
            coupon_code: q.coupon.map(|c| c.code),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderItemResponse {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub product_sku: Option<String>,
    pub price: String,
    pub quantity: String,
    pub unit: String,
    pub total: String,
}

impl From<OrderItem> for OrderItemResponse {
    fn from(i: OrderItem) -> Self {
        OrderItemResponse {
            id: i.id,
            product_id: i.product_id,
            product_name: i.product_name,
            product_sku: i.product_sku,
            price: format_money(&i.price),
            quantity: format_quantity(&i.quantity),
            unit: i.unit,
            total: format_money(&i.total),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderResponse {
    pub id: Uuid,
    pub order_number: String,
    pub user_id: Uuid,
    pub status: String,
    pub payment_status: String,
    pub payment_method: String,
    pub shipping_address: ShippingAddressDto,
    pub totals: TotalsResponse,
    pub coupon_code: Option<String>,
    pub customer_note: Option<String>,
    pub tracking_number: Option<String>,
    pub shipped_at: Option<String>,
    pub delivered_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Order> for OrderResponse {
    fn from(o: Order) -> Self {
        OrderResponse {
            id: o.id,
            order_number: o.order_number,
            user_id: o.user_id,
            status: o.status.to_string(),
            payment_status: o.payment_status.to_string(),
            payment_method: o.payment_method.to_string(),
            shipping_address: o.shipping_address.into(),
            totals: o.totals.into(),
            coupon_code: o.coupon_code,
            customer_note: o.customer_note,
            tracking_number: o.tracking_number,
            shipped_at: o.shipped_at.map(|t| t.to_rfc3339()),
            delivered_at: o.delivered_at.map(|t| t.to_rfc3339()),
            created_at: o.created_at.to_rfc3339(),
            updated_at: o.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CancellationRequestResponse {
    pub id: Uuid,
    pub order_id: Uuid,
    pub status: String,
    pub reason: Option<String>,
    pub created_at: String,
    pub resolved_at: Option<String>,
}

impl From<CancellationRequest> for CancellationRequestResponse {
    fn from(r: CancellationRequest) -> Self {
        CancellationRequestResponse {
            id: r.id,
            order_id: r.order_id,
            status: r.status.to_string(),
            reason: r.reason,
            created_at: r.created_at.to_rfc3339(),
            resolved_at: r.resolved_at.map(|t| t.to_rfc3339()),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderDetailResponse {
    pub order: OrderResponse,
    pub items: Vec<OrderItemResponse>,
    pub cancellation_request: Option<CancellationRequestResponse>,
}

impl From<OrderDetail> for OrderDetailResponse {
    fn from(d: OrderDetail) -> Self {
        OrderDetailResponse {
            order: d.order.into(),
            items: d.items.into_iter().map(Into::into).collect(),
            cancellation_request: d.cancellation_request.map(Into::into),
        }
    }
}

// ── Pagination ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct ListOrdersParams {
    /// Page number (1-based). Defaults to 1.
    #[serde(default = "default_page")]
    pub page: i64,
    /// Number of items per page. Defaults to 20, maximum 100.
    #[serde(default = "default_limit")]
    pub limit: i64,
}

pub(crate) fn default_page() -> i64 {
    1
}

pub(crate) fn default_limit() -> i64 {
    20
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListOrdersResponse {
    pub items: Vec<OrderResponse>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

pub(crate) fn to_line_requests(
    items: Vec<OrderItemRequest>,
) -> Result<Vec<LineRequest>, DomainError> {
    items
        .into_iter()
        .map(|item| {
            Ok(LineRequest {
                product_id: item.product_id,
                quantity: parse_decimal("quantity", &item.quantity)?,
                unit: item.unit,
            })
        })
        .collect()
}

fn idempotency_key(req: &HttpRequest) -> Result<Option<String>, AppError> {
    req.headers()
        .get(IDEMPOTENCY_KEY_HEADER)
        .map(|v| {
            v.to_str()
                .map(str::to_string)
                .map_err(|_| AppError::BadRequest("Invalid Idempotency-Key header".to_string()))
        })
        .transpose()
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /orders
///
/// Places an order. Prices, quantity bounds, stock and coupon eligibility are
/// re-derived from the database; order, items, stock decrements and coupon
/// usage commit in one transaction. The returned totals are authoritative.
#[utoipa::path(
    post,
    path = "/orders",
    request_body = CreateOrderRequest,
    params(
        ("Idempotency-Key" = Option<String>, Header, description = "Repeat-safe submission token"),
    ),
    responses(
        (status = 201, description = "Order placed", body = CreateOrderResponse),
        (status = 400, description = "Invalid items, stock, coupon or address"),
        (status = 401, description = "Missing caller identity"),
        (status = 404, description = "Invalid or expired coupon code"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn create_order(
    service: web::Data<AppService>,
    caller: Caller,
    req: HttpRequest,
    body: web::Json<CreateOrderRequest>,
) -> Result<HttpResponse, AppError> {
    let idempotency_key = idempotency_key(&req)?;
    let body = body.into_inner();
    let request = PlaceOrder {
        items: to_line_requests(body.items)?,
        shipping_address: body.shipping_address.into(),
        payment_method: body.payment_method.parse()?,
        customer_note: body.customer_note,
        coupon_code: body.coupon_code,
        idempotency_key,
    };

    let receipt = web::block(move || service.place_order(&caller, request))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Created().json(CreateOrderResponse::from(receipt)))
}

/// POST /orders/quote
///
/// Prices a cart exactly like order placement would, without writing.
#[utoipa::path(
    post,
    path = "/orders/quote",
    request_body = QuoteRequest,
    responses(
        (status = 200, description = "Authoritative totals for the cart", body = QuoteResponse),
        (status = 400, description = "Invalid items, stock or coupon"),
        (status = 404, description = "Invalid or expired coupon code"),
    ),
    tag = "orders"
)]
pub async fn quote_order(
    service: web::Data<AppService>,
    _caller: Caller,
    body: web::Json<QuoteRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let items = to_line_requests(body.items)?;
    let quote = web::block(move || service.quote(items, body.coupon_code))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;
    Ok(HttpResponse::Ok().json(QuoteResponse::from(quote)))
}

/// GET /orders
///
/// The caller's own orders, newest first (without their items).
#[utoipa::path(
    get,
    path = "/orders",
    params(
        ("page" = Option<i64>, Query, description = "Page number (1-based, default 1)"),
        ("limit" = Option<i64>, Query, description = "Items per page (default 20, max 100)"),
    ),
    responses(
        (status = 200, description = "Paginated list of orders", body = ListOrdersResponse),
        (status = 401, description = "Missing caller identity"),
    ),
    tag = "orders"
)]
pub async fn list_orders(
    service: web::Data<AppService>,
    caller: Caller,
    query: web::Query<ListOrdersParams>,
) -> Result<HttpResponse, AppError> {
    let params = query.into_inner();
    let page = params.page.max(1);
    let limit = params.limit.clamp(1, 100);

    let result = web::block(move || service.list_orders(&caller, page, limit))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(ListOrdersResponse {
        items: result.items.into_iter().map(Into::into).collect(),
        total: result.total,
        page,
        limit,
    }))
}

/// GET /orders/{id}
///
/// The order with its items and cancellation request.
#[utoipa::path(
    get,
    path = "/orders/{id}",
    params(
        ("id" = Uuid, Path, description = "Order UUID"),
    ),
    responses(
        (status = 200, description = "Order found", body = OrderDetailResponse),
        (status = 404, description = "Order not found"),
    ),
    tag = "orders"
)]
pub async fn get_order(
    service: web::Data<AppService>,
    caller: Caller,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();
    let detail = web::block(move || service.get_order(&caller, order_id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;
    Ok(HttpResponse::Ok().json(OrderDetailResponse::from(detail)))
}

/// POST /orders/{id}/cancel
///
/// Cancels the caller's pending, unpaid order and restores stock.
#[utoipa::path(
    post,
    path = "/orders/{id}/cancel",
    params(
        ("id" = Uuid, Path, description = "Order UUID"),
    ),
    responses(
        (status = 200, description = "Order cancelled", body = OrderResponse),
        (status = 400, description = "Order is not pending or already paid"),
        (status = 404, description = "Order not found"),
    ),
    tag = "orders"
)]
pub async fn cancel_order(
    service: web::Data<AppService>,
    caller: Caller,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();
    let order = web::block(move || service.cancel_order(&caller, order_id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;
    Ok(HttpResponse::Ok().json(OrderResponse::from(order)))
}

/// POST /orders/{id}/cancellation-request
///
/// Asks back office to cancel a paid order.
#[utoipa::path(
    post,
    path = "/orders/{id}/cancellation-request",
    params(
        ("id" = Uuid, Path, description = "Order UUID"),
    ),
    request_body = CancellationRequestBody,
    responses(
        (status = 201, description = "Cancellation requested", body = CancellationRequestResponse),
        (status = 400, description = "Order not paid, already terminal, or already requested"),
        (status = 404, description = "Order not found"),
    ),
    tag = "orders"
)]
pub async fn request_cancellation(
    service: web::Data<AppService>,
    caller: Caller,
    path: web::Path<Uuid>,
    body: Option<web::Json<CancellationRequestBody>>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();
    let reason = body.and_then(|b| b.into_inner().reason);
    let request = web::block(move || service.request_cancellation(&caller, order_id, reason))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;
    Ok(HttpResponse::Created().json(CancellationRequestResponse::from(request)))
}

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::application::Caller;
use crate::domain::order::{CancellationStatus, OrderStatus, PaymentStatus};
use crate::errors::AppError;

use super::orders::{
    default_limit, default_page, CancellationRequestResponse, ListOrdersResponse, OrderResponse,
};
use super::AppService;

#[derive(Debug, Deserialize, ToSchema)]
pub struct AdminListOrdersParams {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
    /// Only orders in this status
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateStatusRequest {
    pub status: String,
    #[serde(default)]
    pub tracking_number: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdatePaymentStatusRequest {
    pub payment_status: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ResolveCancellationRequest {
    /// "approved" or "rejected"
    pub status: String,
}

/// GET /admin/orders
#[utoipa::path(
    get,
    path = "/admin/orders",
    params(
        ("page" = Option<i64>, Query, description = "Page number (1-based, default 1)"),
        ("limit" = Option<i64>, Query, description = "Items per page (default 20, max 100)"),
        ("status" = Option<String>, Query, description = "Filter by order status"),
    ),
    responses(
        (status = 200, description = "Paginated list of all orders", body = ListOrdersResponse),
        (status = 403, description = "Admin access required"),
    ),
    tag = "admin"
)]
pub async fn list_orders(
    service: web::Data<AppService>,
    caller: Caller,
    query: web::Query<AdminListOrdersParams>,
) -> Result<HttpResponse, AppError> {
    let params = query.into_inner();
    let status = params
        .status
        .as_deref()
        .map(|s| s.parse::<OrderStatus>())
        .transpose()?;
    let page = params.page.max(1);
    let limit = params.limit.clamp(1, 100);

    let result = web::block(move || service.admin_list_orders(&caller, status, page, limit))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(ListOrdersResponse {
        items: result.items.into_iter().map(Into::into).collect(),
        total: result.total,
        page,
        limit,
    }))
}

/// PATCH /admin/orders/{id}/status
///
/// Moving to `cancelled` restores stock; `delivered` also marks the order paid.
#[utoipa::path(
    patch,
    path = "/admin/orders/{id}/status",
    params(("id" = Uuid, Path, description = "Order UUID")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = OrderResponse),
        (status = 400, description = "Transition not allowed"),
        (status = 403, description = "Admin access required"),
        (status = 404, description = "Order not found"),
    ),
    tag = "admin"
)]
pub async fn update_status(
    service: web::Data<AppService>,
    caller: Caller,
    path: web::Path<Uuid>,
    body: web::Json<UpdateStatusRequest>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();
    let body = body.into_inner();
    let status: OrderStatus = body.status.parse()?;
    let order = web::block(move || {
        service.admin_update_status(&caller, order_id, status, body.tracking_number)
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;
    Ok(HttpResponse::Ok().json(OrderResponse::from(order)))
}

/// PATCH /admin/orders/{id}/payment-status
#[utoipa::path(
    patch,
    path = "/admin/orders/{id}/payment-status",
    params(("id" = Uuid, Path, description = "Order UUID")),
    request_body = UpdatePaymentStatusRequest,
    responses(
        (status = 200, description = "Payment status updated", body = OrderResponse),
        (status = 400, description = "Order is cancelled or refunded"),
        (status = 403, description = "Admin access required"),
        (status = 404, description = "Order not found"),
    ),
    tag = "admin"
)]
pub async fn update_payment_status(
    service: web::Data<AppService>,
    caller: Caller,
    path: web::Path<Uuid>,
    body: web::Json<UpdatePaymentStatusRequest>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();
    let payment_status: PaymentStatus = body.into_inner().payment_status.parse()?;
    let order =
        web::block(move || service.admin_update_payment_status(&caller, order_id, payment_status))
            .await
            .map_err(|e| AppError::Internal(e.to_string()))??;
    Ok(HttpResponse::Ok().json(OrderResponse::from(order)))
}

/// PATCH /admin/orders/{id}/cancellation-request
///
/// Approving cancels the order and restores its stock.
#[utoipa::path(
    patch,
    path = "/admin/orders/{id}/cancellation-request",
    params(("id" = Uuid, Path, description = "Order UUID")),
    request_body = ResolveCancellationRequest,
    responses(
        (status = 200, description = "Request resolved", body = CancellationRequestResponse),
        (status = 400, description = "Request already resolved or decision invalid"),
        (status = 403, description = "Admin access required"),
        (status = 404, description = "Order or request not found"),
    ),
    tag = "admin"
)]
pub async fn resolve_cancellation(
    service: web::Data<AppService>,
    caller: Caller,
    path: web::Path<Uuid>,
    body: web::Json<ResolveCancellationRequest>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();
    let decision: CancellationStatus = body.into_inner().status.parse()?;
    let request =
        web::block(move || service.admin_resolve_cancellation(&caller, order_id, decision))
            .await
            .map_err(|e| AppError::Internal(e.to_string()))??;
    Ok(HttpResponse::Ok().json(CancellationRequestResponse::from(request)))
}

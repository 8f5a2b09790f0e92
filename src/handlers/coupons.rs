use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::application::Caller;
use crate::domain::coupon::AppliedCoupon;
use crate::domain::money::{format_money, parse_decimal};
use crate::errors::AppError;

use super::AppService;

#[derive(Debug, Deserialize, ToSchema)]
pub struct ValidateCouponRequest {
    pub code: String,
    /// Cart subtotal as a decimal string
    pub subtotal: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ValidateCouponResponse {
    pub valid: bool,
    pub coupon_id: Uuid,
    pub code: String,
    pub discount_type: String,
    pub discount_value: String,
    pub discount: String,
    pub description: Option<String>,
}

impl From<AppliedCoupon> for ValidateCouponResponse {
    fn from(c: AppliedCoupon) -> Self {
        ValidateCouponResponse {
            valid: true,
            coupon_id: c.coupon_id,
            code: c.code,
            discount_type: c.discount_type.as_str().to_string(),
            discount_value: format_money(&c.discount_value),
            discount: format_money(&c.discount),
            description: c.description,
        }
    }
}

/// POST /coupons/validate
///
/// Checks a code against a subtotal and reports the discount it would grant.
/// Usage is never consumed here; placement re-checks against its own subtotal.
#[utoipa::path(
    post,
    path = "/coupons/validate",
    request_body = ValidateCouponRequest,
    responses(
        (status = 200, description = "Coupon is applicable", body = ValidateCouponResponse),
        (status = 400, description = "Usage limit reached, minimum purchase not met, or bad subtotal"),
        (status = 404, description = "Invalid or expired coupon code"),
    ),
    tag = "coupons"
)]
pub async fn validate_coupon(
    service: web::Data<AppService>,
    _caller: Caller,
    body: web::Json<ValidateCouponRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let subtotal = parse_decimal("subtotal", &body.subtotal)?;
    let applied = web::block(move || service.validate_coupon(&body.code, &subtotal))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;
    Ok(HttpResponse::Ok().json(ValidateCouponResponse::from(applied)))
}

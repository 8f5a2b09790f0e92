use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;
use uuid::Uuid;

use crate::domain::coupon::Coupon;
use crate::domain::errors::DomainError;
use crate::domain::order::{CancellationRequest, Order, OrderItem, ShippingAddress};
use crate::domain::pricing::Totals;
use crate::domain::product::ProductSnapshot;
use crate::schema::{cancellation_requests, coupons, order_items, order_outbox, orders, products};

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = products)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ProductRow {
    pub id: Uuid,
    pub name: String,
    pub sku: Option<String>,
    pub price: BigDecimal,
    pub stock_quantity: BigDecimal,
    pub min_order_quantity: BigDecimal,
    pub max_order_quantity: Option<BigDecimal>,
    pub quantity_step: BigDecimal,
    pub unit: String,
    pub track_quantity: bool,
    pub allow_backorder: bool,
}

impl From<ProductRow> for ProductSnapshot {
    fn from(row: ProductRow) -> Self {
        ProductSnapshot {
            id: row.id,
            name: row.name,
            sku: row.sku,
            price: row.price,
            stock_quantity: row.stock_quantity,
            min_order_quantity: row.min_order_quantity,
            max_order_quantity: row.max_order_quantity,
            quantity_step: row.quantity_step,
            unit: row.unit,
            track_quantity: row.track_quantity,
            allow_backorder: row.allow_backorder,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = coupons)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CouponRow {
    pub id: Uuid,
    pub code: String,
    pub discount_type: String,
    pub discount_value: BigDecimal,
    pub min_purchase: Option<BigDecimal>,
    pub max_discount: Option<BigDecimal>,
    pub usage_limit: Option<i32>,
    pub usage_count: i32,
    pub is_active: bool,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub description: Option<String>,
}

impl TryFrom<CouponRow> for Coupon {
    type Error = DomainError;

    fn try_from(row: CouponRow) -> Result<Self, Self::Error> {
        Ok(Coupon {
            id: row.id,
            code: row.code,
            discount_type: row.discount_type.parse()?,
            discount_value: row.discount_value,
            min_purchase: row.min_purchase,
            max_discount: row.max_discount,
            usage_limit: row.usage_limit,
            usage_count: row.usage_count,
            is_active: row.is_active,
            start_date: row.start_date,
            end_date: row.end_date,
            description: row.description,
        })
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Insertable)]
#[diesel(table_name = orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderRow {
    pub id: Uuid,
    pub order_number: String,
    pub user_id: Uuid,
    pub status: String,
    pub payment_status: String,
    pub payment_method: String,
    pub shipping_name: String,
    pub shipping_phone: String,
    pub shipping_address_line1: String,
    pub shipping_address_line2: Option<String>,
    pub shipping_city: String,
    pub shipping_state: String,
    pub shipping_pincode: String,
    pub subtotal: BigDecimal,
    pub shipping_cost: BigDecimal,
    pub discount: BigDecimal,
    pub total: BigDecimal,
    pub coupon_code: Option<String>,
    pub customer_note: Option<String>,
    pub tracking_number: Option<String>,
    pub idempotency_key: Option<String>,
    pub shipped_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Order> for OrderRow {
    fn from(order: &Order) -> Self {
        let address = &order.shipping_address;
        OrderRow {
            id: order.id,
            order_number: order.order_number.clone(),
            user_id: order.user_id,
            status: order.status.as_str().to_string(),
            payment_status: order.payment_status.as_str().to_string(),
            payment_method: order.payment_method.as_str().to_string(),
            shipping_name: address.name.clone(),
            shipping_phone: address.phone.clone(),
            shipping_address_line1: address.address_line1.clone(),
            shipping_address_line2: address.address_line2.clone(),
            shipping_city: address.city.clone(),
            shipping_state: address.state.clone(),
            shipping_pincode: address.pincode.clone(),
            subtotal: order.totals.subtotal.clone(),
            shipping_cost: order.totals.shipping_cost.clone(),
            discount: order.totals.discount.clone(),
            total: order.totals.total.clone(),
            coupon_code: order.coupon_code.clone(),
            customer_note: order.customer_note.clone(),
            tracking_number: order.tracking_number.clone(),
            idempotency_key: order.idempotency_key.clone(),
            shipped_at: order.shipped_at,
            delivered_at: order.delivered_at,
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}

impl TryFrom<OrderRow> for Order {
    type Error = DomainError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        Ok(Order {
            id: row.id,
            order_number: row.order_number,
            user_id: row.user_id,
            status: row.status.parse()?,
            payment_status: row.payment_status.parse()?,
            payment_method: row.payment_method.parse()?,
            shipping_address: ShippingAddress {
                name: row.shipping_name,
                phone: row.shipping_phone,
                address_line1: row.shipping_address_line1,
                address_line2: row.shipping_address_line2,
                city: row.shipping_city,
                state: row.shipping_state,
                pincode: row.shipping_pincode,
            },
            totals: Totals {
                subtotal: row.subtotal,
                shipping_cost: row.shipping_cost,
                discount: row.discount,
                total: row.total,
            },
            coupon_code: row.coupon_code,
            customer_note: row.customer_note,
            tracking_number: row.tracking_number,
            idempotency_key: row.idempotency_key,
            shipped_at: row.shipped_at,
            delivered_at: row.delivered_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Associations)]
#[diesel(table_name = order_items)]
#[diesel(belongs_to(OrderRow, foreign_key = order_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderItemRow {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub product_sku: Option<String>,
    pub price: BigDecimal,
    pub quantity: BigDecimal,
    pub unit: String,
    pub total: BigDecimal,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = order_items)]
pub struct NewOrderItemRow<'a> {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub product_name: &'a str,
    pub product_sku: Option<&'a str>,
    pub price: &'a BigDecimal,
    pub quantity: &'a BigDecimal,
    pub unit: &'a str,
    pub total: &'a BigDecimal,
}

impl<'a> From<&'a OrderItem> for NewOrderItemRow<'a> {
    fn from(item: &'a OrderItem) -> Self {
        NewOrderItemRow {
            id: item.id,
            order_id: item.order_id,
            product_id: item.product_id,
            product_name: &item.product_name,
            product_sku: item.product_sku.as_deref(),
            price: &item.price,
            quantity: &item.quantity,
            unit: &item.unit,
            total: &item.total,
        }
    }
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        OrderItem {
            id: row.id,
            order_id: row.order_id,
            product_id: row.product_id,
            product_name: row.product_name,
            product_sku: row.product_sku,
            price: row.price,
            quantity: row.quantity,
            unit: row.unit,
            total: row.total,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Insertable)]
#[diesel(table_name = cancellation_requests)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CancellationRequestRow {
    pub id: Uuid,
    pub order_id: Uuid,
    pub status: String,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl From<&CancellationRequest> for CancellationRequestRow {
    fn from(request: &CancellationRequest) -> Self {
        CancellationRequestRow {
            id: request.id,
            order_id: request.order_id,
            status: request.status.as_str().to_string(),
            reason: request.reason.clone(),
            created_at: request.created_at,
            resolved_at: request.resolved_at,
        }
    }
}

impl TryFrom<CancellationRequestRow> for CancellationRequest {
    type Error = DomainError;

    fn try_from(row: CancellationRequestRow) -> Result<Self, Self::Error> {
        Ok(CancellationRequest {
            id: row.id,
            order_id: row.order_id,
            status: row.status.parse()?,
            reason: row.reason,
            created_at: row.created_at,
            resolved_at: row.resolved_at,
        })
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = order_outbox)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OutboxEventRow {
    pub id: Uuid,
    pub aggregate_type: String,
    pub aggregate_id: String,
    pub event_type: String,
    pub payload: Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = order_outbox)]
pub struct NewOutboxEventRow<'a> {
    pub id: Uuid,
    pub aggregate_type: &'a str,
    pub aggregate_id: String,
    pub event_type: &'a str,
    pub payload: &'a Value,
}

/// Status update; `None` fields are left out of the `SET` clause.
#[derive(Debug, AsChangeset)]
#[diesel(table_name = orders)]
pub struct OrderStatusChangeset<'a> {
    pub status: &'a str,
    pub payment_status: Option<&'a str>,
    pub tracking_number: Option<&'a str>,
    pub shipped_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

use serde_json::{json, Value};
use uuid::Uuid;

use super::money::{format_money, format_quantity};
use super::order::{CancellationStatus, Order, OrderStatus, PaymentStatus};
use super::pricing::{PricedLine, Totals};

pub const AGGREGATE_TYPE: &str = "Order";

/// An outbox entry, written in the same transaction as the change it
/// describes.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderEvent {
    pub order_id: Uuid,
    pub event_type: &'static str,
    pub payload: Value,
}

fn totals_json(totals: &Totals) -> Value {
    json!({
        "subtotal": format_money(&totals.subtotal),
        "shipping_cost": format_money(&totals.shipping_cost),
        "discount": format_money(&totals.discount),
        "total": format_money(&totals.total),
    })
}

impl OrderEvent {
    pub fn placed(order: &Order, lines: &[PricedLine]) -> Self {
        let lines: Vec<Value> = lines
            .iter()
            .map(|l| {
                json!({
                    "product_id": l.product_id,
                    "quantity": format_quantity(&l.quantity),
                    "unit_price": format_money(&l.unit_price),
                    "total": format_money(&l.line_total),
                })
            })
            .collect();
        Self {
            order_id: order.id,
            event_type: "OrderPlaced",
            payload: json!({
                "order_id": order.id,
                "order_number": order.order_number,
                "user_id": order.user_id,
                "status": order.status.as_str(),
                "payment_method": order.payment_method.as_str(),
                "coupon_code": order.coupon_code,
                "totals": totals_json(&order.totals),
                "lines": lines,
            }),
        }
    }

    pub fn cancelled(order: &Order, restocked: usize) -> Self {
        Self {
            order_id: order.id,
            event_type: "OrderCancelled",
            payload: json!({
                "order_id": order.id,
                "order_number": order.order_number,
                "previous_status": order.status.as_str(),
                "restocked_items": restocked,
            }),
        }
    }

    pub fn status_changed(order: &Order, to: OrderStatus, tracking_number: Option<&str>) -> Self {
        Self {
            order_id: order.id,
            event_type: "OrderStatusChanged",
            payload: json!({
                "order_id": order.id,
                "order_number": order.order_number,
                "from": order.status.as_str(),
                "to": to.as_str(),
                "tracking_number": tracking_number,
            }),
        }
    }

    pub fn payment_status_changed(order: &Order, to: PaymentStatus) -> Self {
        Self {
            order_id: order.id,
            event_type: "PaymentStatusChanged",
            payload: json!({
                "order_id": order.id,
                "from": order.payment_status.as_str(),
                "to": to.as_str(),
            }),
        }
    }

    pub fn cancellation_requested(order: &Order, reason: Option<&str>) -> Self {
        Self {
            order_id: order.id,
            event_type: "CancellationRequested",
            payload: json!({
                "order_id": order.id,
                "order_number": order.order_number,
                "reason": reason,
            }),
        }
    }

    pub fn cancellation_resolved(order: &Order, status: CancellationStatus) -> Self {
        Self {
            order_id: order.id,
            event_type: "CancellationRequestResolved",
            payload: json!({
                "order_id": order.id,
                "order_number": order.order_number,
                "status": status.as_str(),
            }),
        }
    }
}

//! Status transitions after an order is placed.
//!
//! Every path into `cancelled` goes through `cancel_in`, which restores stock
//! for each line and settles any open cancellation request.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::errors::{DomainError, UniqueKey};
use crate::domain::events::OrderEvent;
use crate::domain::order::{
    check_admin_transition, CancellationRequest, CancellationStatus, Order, OrderStatus,
    PaymentStatus, StatusChange,
};
use crate::domain::ports::{OrderStore, StoreTx};

use super::order_service::{normalize_text, Caller, OrderService};

pub const ONLY_PENDING_CANCELLABLE: &str = "Only pending orders can be cancelled";
pub const PAID_NEEDS_REQUEST: &str =
    "Paid orders cannot be cancelled directly, please submit a cancellation request";
pub const REQUEST_EXISTS: &str = "A cancellation request already exists for this order";
const MAX_TRACKING_NUMBER_LEN: usize = 100;

fn locked_order(tx: &mut dyn StoreTx, order_id: Uuid) -> Result<Order, DomainError> {
    tx.find_order(order_id, true)?
        .ok_or_else(|| DomainError::not_found("Order not found"))
}

fn owned_order(tx: &mut dyn StoreTx, caller: &Caller, order_id: Uuid) -> Result<Order, DomainError> {
    let order = locked_order(tx, order_id)?;
    if order.user_id != caller.user_id {
        return Err(DomainError::not_found("Order not found"));
    }
    Ok(order)
}

fn reloaded(tx: &mut dyn StoreTx, order_id: Uuid) -> Result<Order, DomainError> {
    tx.find_order(order_id, false)?
        .ok_or_else(|| DomainError::Internal(format!("order {order_id} vanished mid-transaction")))
}

/// Move `order` into `cancelled`: put every line's quantity back on its
/// product, settle a pending cancellation request as approved and record
/// the event.
fn cancel_in(
    tx: &mut dyn StoreTx,
    order: &Order,
    tracking_number: Option<String>,
    now: DateTime<Utc>,
) -> Result<(), DomainError> {
    let mut items = tx.order_items(order.id)?;
    // Product rows are locked in id order, as placement locks them.
    items.sort_by_key(|item| item.product_id);
    for item in &items {
        tx.restore_stock(item.product_id, &item.quantity)?;
    }

    let mut change = StatusChange::to(OrderStatus::Cancelled, now);
    change.tracking_number = tracking_number;
    tx.update_order_status(order.id, &change)?;

    if let Some(request) = tx.find_cancellation_request(order.id)? {
        if request.status == CancellationStatus::Pending {
            tx.resolve_cancellation_request(request.id, CancellationStatus::Approved, now)?;
            tx.record_event(&OrderEvent::cancellation_resolved(
                order,
                CancellationStatus::Approved,
            ))?;
        }
    }
    tx.record_event(&OrderEvent::cancelled(order, items.len()))
}

fn normalize_tracking_number(raw: Option<String>) -> Result<Option<String>, DomainError> {
    let tracking = raw.map(|t| t.trim().to_string()).filter(|t| !t.is_empty());
    match tracking {
        Some(t) if t.len() > MAX_TRACKING_NUMBER_LEN => Err(DomainError::bad_request(format!(
            "Tracking number cannot be longer than {MAX_TRACKING_NUMBER_LEN} characters"
        ))),
        other => Ok(other),
    }
}

impl<S: OrderStore> OrderService<S> {
    /// Self-service cancellation of the caller's own pending, unpaid order.
    pub fn cancel_order(&self, caller: &Caller, order_id: Uuid) -> Result<Order, DomainError> {
        let now = Utc::now();
        let order = self.store.transaction(|tx| {
            let order = owned_order(tx, caller, order_id)?;
            if order.status != OrderStatus::Pending {
                return Err(DomainError::bad_request(ONLY_PENDING_CANCELLABLE));
            }
            if order.payment_status == PaymentStatus::Paid {
                return Err(DomainError::bad_request(PAID_NEEDS_REQUEST));
            }
            cancel_in(tx, &order, None, now)?;
            reloaded(tx, order_id)
        })?;
        log::info!("Order {} cancelled by its owner {}", order.order_number, caller.user_id);
        Ok(order)
    }

    /// Ask back office to cancel a paid order.
    pub fn request_cancellation(
        &self,
        caller: &Caller,
        order_id: Uuid,
        reason: Option<String>,
    ) -> Result<CancellationRequest, DomainError> {
        let reason = normalize_text("Reason", reason)?;
        let now = Utc::now();
        let request = self
            .store
            .transaction(|tx| {
                let order = owned_order(tx, caller, order_id)?;
                if order.status.is_terminal() {
                    return Err(DomainError::bad_request(format!(
                        "Order is already {}",
                        order.status
                    )));
                }
                if order.payment_status != PaymentStatus::Paid {
                    return Err(DomainError::bad_request(
                        "Cancellation requests are only accepted for paid orders",
                    ));
                }
                if tx.find_cancellation_request(order_id)?.is_some() {
                    return Err(DomainError::bad_request(REQUEST_EXISTS));
                }
                let request = CancellationRequest {
                    id: Uuid::new_v4(),
                    order_id,
                    status: CancellationStatus::Pending,
                    reason: reason.clone(),
                    created_at: now,
                    resolved_at: None,
                };
                tx.insert_cancellation_request(&request)?;
                tx.record_event(&OrderEvent::cancellation_requested(
                    &order,
                    reason.as_deref(),
                ))?;
                Ok(request)
            })
            .map_err(|e| match e {
                DomainError::Duplicate(UniqueKey::CancellationRequest) => {
                    DomainError::bad_request(REQUEST_EXISTS)
                }
                other => other,
            })?;
        log::info!("Cancellation requested for order {order_id} by {}", caller.user_id);
        Ok(request)
    }

    /// Admin status change. Moving to `shipped` stamps `shipped_at`; moving to
    /// `delivered` stamps `delivered_at` and marks the order paid.
    pub fn admin_update_status(
        &self,
        caller: &Caller,
        order_id: Uuid,
        status: OrderStatus,
        tracking_number: Option<String>,
    ) -> Result<Order, DomainError> {
        caller.require_admin()?;
        let tracking_number = normalize_tracking_number(tracking_number)?;
        let now = Utc::now();
        let order = self.store.transaction(|tx| {
            let order = locked_order(tx, order_id)?;
            check_admin_transition(order.status, status)?;

            if status == OrderStatus::Cancelled {
                cancel_in(tx, &order, tracking_number.clone(), now)?;
            } else {
                let mut change = StatusChange::to(status, now);
                change.tracking_number = tracking_number.clone();
                if status != order.status {
                    match status {
                        OrderStatus::Shipped => change.shipped_at = Some(now),
                        OrderStatus::Delivered => {
                            change.delivered_at = Some(now);
                            change.payment_status = Some(PaymentStatus::Paid);
                        }
                        _ => {}
                    }
                }
                tx.update_order_status(order_id, &change)?;
                tx.record_event(&OrderEvent::status_changed(
                    &order,
                    status,
                    tracking_number.as_deref(),
                ))?;
            }
            reloaded(tx, order_id)
        })?;
        log::info!(
            "Order {} moved to {} by admin {}",
            order.order_number,
            order.status,
            caller.user_id
        );
        Ok(order)
    }

    /// Admin record of payment, e.g. an online payment settled out of band.
    pub fn admin_update_payment_status(
        &self,
        caller: &Caller,
        order_id: Uuid,
        payment_status: PaymentStatus,
    ) -> Result<Order, DomainError> {
        caller.require_admin()?;
        let now = Utc::now();
        self.store.transaction(|tx| {
            let order = locked_order(tx, order_id)?;
            if order.status.is_terminal() {
                return Err(DomainError::bad_request(format!(
                    "Cannot change the payment status of a {} order",
                    order.status
                )));
            }
            if order.payment_status != payment_status {
                tx.update_payment_status(order_id, payment_status, now)?;
                tx.record_event(&OrderEvent::payment_status_changed(&order, payment_status))?;
            }
            reloaded(tx, order_id)
        })
    }

    /// Approve or reject a customer's cancellation request. Approval cancels
    /// the order, restoring stock like any other cancellation.
    pub fn admin_resolve_cancellation(
        &self,
        caller: &Caller,
        order_id: Uuid,
        decision: CancellationStatus,
    ) -> Result<CancellationRequest, DomainError> {
        caller.require_admin()?;
        if decision == CancellationStatus::Pending {
            return Err(DomainError::bad_request(
                "A cancellation request can only be approved or rejected",
            ));
        }
        let now = Utc::now();
        let resolved = self.store.transaction(|tx| {
            let order = locked_order(tx, order_id)?;
            let request = tx
                .find_cancellation_request(order_id)?
                .ok_or_else(|| DomainError::not_found("Cancellation request not found"))?;
            if request.status != CancellationStatus::Pending {
                return Err(DomainError::bad_request(format!(
                    "Cancellation request has already been {}",
                    request.status
                )));
            }

            match decision {
                CancellationStatus::Approved => {
                    if order.status.is_terminal() {
                        return Err(DomainError::bad_request(format!(
                            "Order is already {}",
                            order.status
                        )));
                    }
                    cancel_in(tx, &order, None, now)?;
                }
                _ => {
                    tx.resolve_cancellation_request(request.id, decision, now)?;
                    tx.record_event(&OrderEvent::cancellation_resolved(&order, decision))?;
                }
            }
            tx.find_cancellation_request(order_id)?.ok_or_else(|| {
                DomainError::Internal(format!("cancellation request for {order_id} vanished"))
            })
        })?;
        log::info!(
            "Cancellation request for order {order_id} {} by admin {}",
            resolved.status,
            caller.user_id
        );
        Ok(resolved)
    }
}

use std::collections::HashMap;

use bigdecimal::{BigDecimal, Zero};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::coupon::{self, normalize_code, AppliedCoupon, INVALID_COUPON, USAGE_LIMIT_REACHED};
use crate::domain::errors::{DomainError, UniqueKey};
use crate::domain::events::OrderEvent;
use crate::domain::order::{
    generate_order_number, ListResult, Order, OrderDetail, OrderFilter, OrderItem, OrderReceipt,
    OrderStatus, PaymentMethod, PaymentStatus, ShippingAddress,
};
use crate::domain::ports::{OrderStore, StockDecrement, StoreTx};
use crate::domain::pricing::{distinct_product_ids, price_lines, LineRequest, PricedCart, PricedLine, Totals};
use crate::domain::settings::StoreSettings;

const MAX_PLACEMENT_ATTEMPTS: usize = 3;
const MAX_IDEMPOTENCY_KEY_LEN: usize = 100;
pub(crate) const MAX_TEXT_LEN: usize = 1000;
const MAX_PAGE_SIZE: i64 = 100;

/// The authenticated identity behind a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub user_id: Uuid,
    pub is_admin: bool,
}

impl Caller {
    pub fn customer(user_id: Uuid) -> Self {
        Self {
            user_id,
            is_admin: false,
        }
    }

    pub fn admin(user_id: Uuid) -> Self {
        Self {
            user_id,
            is_admin: true,
        }
    }

    pub(crate) fn require_admin(&self) -> Result<(), DomainError> {
        if self.is_admin {
            Ok(())
        } else {
            Err(DomainError::Forbidden("Admin access required".to_string()))
        }
    }
}

#[derive(Debug, Clone)]
pub struct PlaceOrder {
    pub items: Vec<LineRequest>,
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    pub customer_note: Option<String>,
    pub coupon_code: Option<String>,
    pub idempotency_key: Option<String>,
}

impl PlaceOrder {
    fn normalized(self) -> Result<Self, DomainError> {
        let idempotency_key = match self.idempotency_key {
            Some(key) => Some(validate_idempotency_key(key)?),
            None => None,
        };
        Ok(Self {
            items: self.items,
            shipping_address: self.shipping_address.normalized()?,
            payment_method: self.payment_method,
            customer_note: normalize_text("Customer note", self.customer_note)?,
            coupon_code: requested_coupon(self.coupon_code)?,
            idempotency_key,
        })
    }
}

/// Authoritative pricing of a cart without placing it.
#[derive(Debug, Clone)]
pub struct Quote {
    pub lines: Vec<PricedLine>,
    pub totals: Totals,
    pub coupon: Option<AppliedCoupon>,
}

fn validate_idempotency_key(key: String) -> Result<String, DomainError> {
    let key = key.trim().to_string();
    let well_formed = !key.is_empty()
        && key.len() <= MAX_IDEMPOTENCY_KEY_LEN
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if well_formed {
        Ok(key)
    } else {
        Err(DomainError::bad_request(format!(
            "Idempotency key must be 1-{MAX_IDEMPOTENCY_KEY_LEN} characters of letters, digits, '-' or '_'"
        )))
    }
}

/// A coupon the caller asked for. A code that normalizes to nothing is
/// treated as an unknown code, as coupon validation does.
fn requested_coupon(raw: Option<String>) -> Result<Option<String>, DomainError> {
    raw.map(|code| normalize_code(&code).ok_or_else(|| DomainError::not_found(INVALID_COUPON)))
        .transpose()
}

/// Trim free text; blank becomes absent.
pub(crate) fn normalize_text(
    field: &str,
    text: Option<String>,
) -> Result<Option<String>, DomainError> {
    let Some(text) = text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty()) else {
        return Ok(None);
    };
    if text.chars().count() > MAX_TEXT_LEN {
        return Err(DomainError::bad_request(format!(
            "{field} cannot be longer than {MAX_TEXT_LEN} characters"
        )));
    }
    Ok(Some(text))
}

/// Load settings and a product snapshot, validate and price the lines, then
/// resolve the coupon against the server-computed subtotal.
fn price_in(
    tx: &mut dyn StoreTx,
    items: &[LineRequest],
    coupon_code: Option<&str>,
    for_update: bool,
    now: DateTime<Utc>,
) -> Result<(PricedCart, Option<AppliedCoupon>), DomainError> {
    let settings = StoreSettings::from_pairs(tx.load_settings()?);
    let ids = distinct_product_ids(items);
    let products: HashMap<Uuid, _> = tx
        .load_products(&ids, for_update)?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();
    let cart = price_lines(items, &products, &settings)?;

    let applied = match coupon_code {
        Some(code) => Some(coupon::resolve(
            tx.find_coupon(code, for_update)?,
            &cart.subtotal,
            now,
        )?),
        None => None,
    };
    Ok((cart, applied))
}

fn place_in(
    tx: &mut dyn StoreTx,
    user_id: Uuid,
    request: &PlaceOrder,
    now: DateTime<Utc>,
) -> Result<OrderReceipt, DomainError> {
    if let Some(key) = &request.idempotency_key {
        if let Some(existing) = tx.find_order_by_idempotency_key(user_id, key)? {
            log::info!(
                "Repeated submission for order {} (user {})",
                existing.order_number,
                user_id
            );
            return Ok(existing.receipt());
        }
    }

    let (cart, applied) = price_in(tx, &request.items, request.coupon_code.as_deref(), true, now)?;
    let discount = applied
        .as_ref()
        .map(|c| c.discount.clone())
        .unwrap_or_else(BigDecimal::zero);

    let order = Order {
        id: Uuid::new_v4(),
        order_number: generate_order_number(now),
        user_id,
        status: OrderStatus::Pending,
        payment_status: PaymentStatus::Pending,
        payment_method: request.payment_method,
        shipping_address: request.shipping_address.clone(),
        totals: cart.totals(discount),
        coupon_code: applied.as_ref().map(|c| c.code.clone()),
        customer_note: request.customer_note.clone(),
        tracking_number: None,
        idempotency_key: request.idempotency_key.clone(),
        shipped_at: None,
        delivered_at: None,
        created_at: now,
        updated_at: now,
    };
    let items: Vec<OrderItem> = cart
        .lines
        .iter()
        .map(|line| OrderItem {
            id: Uuid::new_v4(),
            order_id: order.id,
            product_id: line.product_id,
            product_name: line.product_name.clone(),
            product_sku: line.product_sku.clone(),
            price: line.unit_price.clone(),
            quantity: line.quantity.clone(),
            unit: line.unit.clone(),
            total: line.line_total.clone(),
        })
        .collect();
    tx.insert_order(&order, &items)?;

    for line in cart.lines.iter().filter(|l| l.track_quantity) {
        let mode = if line.allow_backorder {
            StockDecrement::Floored
        } else {
            StockDecrement::Guarded
        };
        if !tx.decrement_stock(line.product_id, &line.quantity, mode)? {
            return Err(DomainError::bad_request(format!(
                "Insufficient stock: {}",
                line.product_name
            )));
        }
    }

    if let Some(coupon) = &applied {
        if !tx.increment_coupon_usage(coupon.coupon_id)? {
            return Err(DomainError::bad_request(USAGE_LIMIT_REACHED));
        }
    }

    tx.record_event(&OrderEvent::placed(&order, &cart.lines))?;
    Ok(order.receipt())
}

/// Order placement, pricing previews, coupon checks and reads. The
/// lifecycle operations live in `lifecycle.rs`.
pub struct OrderService<S> {
    pub(crate) store: S,
}

impl<S: OrderStore> OrderService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Price the cart from trusted state and commit order, items, stock
    /// decrements and coupon usage atomically.
    pub fn place_order(
        &self,
        caller: &Caller,
        request: PlaceOrder,
    ) -> Result<OrderReceipt, DomainError> {
        let request = request.normalized()?;
        let user_id = caller.user_id;

        for attempt in 1..=MAX_PLACEMENT_ATTEMPTS {
            let now = Utc::now();
            match self
                .store
                .transaction(|tx| place_in(tx, user_id, &request, now))
            {
                Ok(receipt) => {
                    log::info!(
                        "Placed order {} for user {}: subtotal={} shipping={} discount={} total={}",
                        receipt.order_number,
                        user_id,
                        receipt.totals.subtotal,
                        receipt.totals.shipping_cost,
                        receipt.totals.discount,
                        receipt.totals.total
                    );
                    return Ok(receipt);
                }
                Err(DomainError::Duplicate(UniqueKey::IdempotencyKey)) => {
                    // A concurrent submission with the same key won the race.
                    let key = request.idempotency_key.as_deref().unwrap_or_default();
                    let existing = self
                        .store
                        .transaction(|tx| tx.find_order_by_idempotency_key(user_id, key))?;
                    return existing.map(|order| order.receipt()).ok_or_else(|| {
                        DomainError::Internal(
                            "idempotency key collided but no order holds it".to_string(),
                        )
                    });
                }
                Err(DomainError::Duplicate(UniqueKey::OrderNumber))
                    if attempt < MAX_PLACEMENT_ATTEMPTS =>
                {
                    log::warn!("Order number collision on attempt {attempt}, retrying");
                }
                Err(e) => return Err(e),
            }
        }
        Err(DomainError::Internal(
            "could not allocate a unique order number".to_string(),
        ))
    }

    /// Checkout preview: same validation and totals as `place_order`, no
    /// locks and no writes.
    pub fn quote(
        &self,
        items: Vec<LineRequest>,
        coupon_code: Option<String>,
    ) -> Result<Quote, DomainError> {
        let code = requested_coupon(coupon_code)?;
        let now = Utc::now();
        let (cart, applied) = self
            .store
            .transaction(|tx| price_in(tx, &items, code.as_deref(), false, now))?;
        let discount = applied
            .as_ref()
            .map(|c| c.discount.clone())
            .unwrap_or_else(BigDecimal::zero);
        Ok(Quote {
            totals: cart.totals(discount),
            lines: cart.lines,
            coupon: applied,
        })
    }

    /// Check a coupon for a subtotal. Never consumes usage.
    pub fn validate_coupon(
        &self,
        code: &str,
        subtotal: &BigDecimal,
    ) -> Result<AppliedCoupon, DomainError> {
        let code = normalize_code(code).ok_or_else(|| DomainError::not_found(INVALID_COUPON))?;
        if subtotal <= &BigDecimal::zero() {
            return Err(DomainError::bad_request("Subtotal must be greater than 0"));
        }
        let found = self.store.transaction(|tx| tx.find_coupon(&code, false))?;
        coupon::resolve(found, subtotal, Utc::now())
    }

    /// An order with its items and cancellation request. Orders belonging to
    /// someone else look missing unless the caller is an admin.
    pub fn get_order(&self, caller: &Caller, order_id: Uuid) -> Result<OrderDetail, DomainError> {
        self.store.transaction(|tx| {
            let order = tx
                .find_order(order_id, false)?
                .filter(|o| caller.is_admin || o.user_id == caller.user_id)
                .ok_or_else(|| DomainError::not_found("Order not found"))?;
            let items = tx.order_items(order_id)?;
            let cancellation_request = tx.find_cancellation_request(order_id)?;
            Ok(OrderDetail {
                order,
                items,
                cancellation_request,
            })
        })
    }

    pub fn list_orders(
        &self,
        caller: &Caller,
        page: i64,
        limit: i64,
    ) -> Result<ListResult, DomainError> {
        let filter = OrderFilter {
            user_id: Some(caller.user_id),
            status: None,
        };
        self.list_filtered(&filter, page, limit)
    }

    pub fn admin_list_orders(
        &self,
        caller: &Caller,
        status: Option<OrderStatus>,
        page: i64,
        limit: i64,
    ) -> Result<ListResult, DomainError> {
        caller.require_admin()?;
        let filter = OrderFilter {
            user_id: None,
            status,
        };
        self.list_filtered(&filter, page, limit)
    }

    fn list_filtered(
        &self,
        filter: &OrderFilter,
        page: i64,
        limit: i64,
    ) -> Result<ListResult, DomainError> {
        let page = page.max(1);
        let limit = limit.clamp(1, MAX_PAGE_SIZE);
        self.store
            .transaction(|tx| tx.list_orders(filter, page, limit))
    }
}

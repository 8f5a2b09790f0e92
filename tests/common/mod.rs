//! In-memory `OrderStore` for exercising the services without Postgres.
//!
//! A transaction works on a copy of the state taken under a mutex and swaps
//! it back only when the closure succeeds, so an `Err` leaves nothing behind
//! and concurrent callers are serialized the way row locks would serialize
//! them.
#![allow(dead_code)]

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use bigdecimal::BigDecimal;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use fabric_orders::application::{Caller, OrderService, PlaceOrder};
use fabric_orders::domain::coupon::{Coupon, DiscountType};
use fabric_orders::domain::errors::{DomainError, UniqueKey};
use fabric_orders::domain::events::OrderEvent;
use fabric_orders::domain::order::{
    CancellationRequest, CancellationStatus, ListResult, Order, OrderFilter, OrderItem,
    OrderReceipt, PaymentMethod, PaymentStatus, ShippingAddress, StatusChange,
};
use fabric_orders::domain::ports::{OrderStore, StockDecrement, StoreTx};
use fabric_orders::domain::pricing::LineRequest;
use fabric_orders::domain::product::ProductSnapshot;

#[derive(Debug, Clone, Default)]
pub struct State {
    pub settings: Vec<(String, String)>,
    pub products: HashMap<Uuid, ProductSnapshot>,
    pub coupons: HashMap<String, Coupon>,
    pub orders: Vec<Order>,
    pub items: Vec<OrderItem>,
    pub cancellation_requests: Vec<CancellationRequest>,
    pub events: Vec<OrderEvent>,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
    fail_on_event: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn snapshot(&self) -> State {
        self.state.lock().expect("state lock").clone()
    }

    pub fn with_state(&self, f: impl FnOnce(&mut State)) {
        f(&mut self.state.lock().expect("state lock"));
    }

    /// Make the next outbox write fail, aborting whatever transaction it is in.
    pub fn fail_next_event(&self) {
        self.fail_on_event.store(true, Ordering::SeqCst);
    }

    pub fn add_product(&self, product: ProductSnapshot) {
        self.with_state(|s| {
            s.products.insert(product.id, product);
        });
    }

    pub fn add_coupon(&self, coupon: Coupon) {
        self.with_state(|s| {
            s.coupons.insert(coupon.code.clone(), coupon);
        });
    }

    pub fn set_setting(&self, key: &str, value: &str) {
        self.with_state(|s| {
            s.settings.retain(|(k, _)| k != key);
            s.settings.push((key.to_string(), value.to_string()));
        });
    }

    pub fn stock(&self, product_id: Uuid) -> BigDecimal {
        self.snapshot().products[&product_id].stock_quantity.clone()
    }

    pub fn usage_count(&self, code: &str) -> i32 {
        self.snapshot().coupons[code].usage_count
    }

    pub fn event_types(&self) -> Vec<&'static str> {
        self.snapshot().events.iter().map(|e| e.event_type).collect()
    }

    pub fn mark_paid(&self, order_id: Uuid) {
        self.with_state(|s| {
            if let Some(order) = s.orders.iter_mut().find(|o| o.id == order_id) {
                order.payment_status = PaymentStatus::Paid;
            }
        });
    }
}

impl OrderStore for MemoryStore {
    fn transaction<T, F>(&self, f: F) -> Result<T, DomainError>
    where
        F: FnOnce(&mut dyn StoreTx) -> Result<T, DomainError>,
    {
        let mut guard = self
            .state
            .lock()
            .map_err(|e| DomainError::Internal(e.to_string()))?;
        let mut tx = MemoryTx {
            state: guard.clone(),
            fail_on_event: &self.fail_on_event,
        };
        let result = f(&mut tx)?;
        *guard = tx.state;
        Ok(result)
    }
}

struct MemoryTx<'a> {
    state: State,
    fail_on_event: &'a AtomicBool,
}

impl MemoryTx<'_> {
    fn order_mut(&mut self, order_id: Uuid) -> Result<&mut Order, DomainError> {
        self.state
            .orders
            .iter_mut()
            .find(|o| o.id == order_id)
            .ok_or_else(|| DomainError::Internal(format!("order {order_id} missing")))
    }
}

impl StoreTx for MemoryTx<'_> {
    fn load_settings(&mut self) -> Result<Vec<(String, String)>, DomainError> {
        Ok(self.state.settings.clone())
    }

    fn load_products(
        &mut self,
        ids: &[Uuid],
        _for_update: bool,
    ) -> Result<Vec<ProductSnapshot>, DomainError> {
        Ok(ids
            .iter()
            .filter_map(|id| self.state.products.get(id).cloned())
            .collect())
    }

    fn find_coupon(
        &mut self,
        code: &str,
        _for_update: bool,
    ) -> Result<Option<Coupon>, DomainError> {
        Ok(self.state.coupons.get(code).cloned())
    }

    fn find_order_by_idempotency_key(
        &mut self,
        user_id: Uuid,
        key: &str,
    ) -> Result<Option<Order>, DomainError> {
        Ok(self
            .state
            .orders
            .iter()
            .find(|o| o.user_id == user_id && o.idempotency_key.as_deref() == Some(key))
            .cloned())
    }

    fn insert_order(&mut self, order: &Order, items: &[OrderItem]) -> Result<(), DomainError> {
        if self
            .state
            .orders
            .iter()
            .any(|o| o.order_number == order.order_number)
        {
            return Err(DomainError::Duplicate(UniqueKey::OrderNumber));
        }
        if let Some(key) = &order.idempotency_key {
            if self.find_order_by_idempotency_key(order.user_id, key)?.is_some() {
                return Err(DomainError::Duplicate(UniqueKey::IdempotencyKey));
            }
        }
        self.state.orders.push(order.clone());
        self.state.items.extend_from_slice(items);
        Ok(())
    }

    fn decrement_stock(
        &mut self,
        product_id: Uuid,
        quantity: &BigDecimal,
        mode: StockDecrement,
    ) -> Result<bool, DomainError> {
        let Some(product) = self.state.products.get_mut(&product_id) else {
            return Ok(false);
        };
        let zero = BigDecimal::from(0);
        match mode {
            StockDecrement::Guarded if &product.stock_quantity < quantity => Ok(false),
            StockDecrement::Guarded => {
                product.stock_quantity = &product.stock_quantity - quantity;
                Ok(true)
            }
            StockDecrement::Floored => {
                let left = &product.stock_quantity - quantity;
                product.stock_quantity = if left < zero { zero } else { left };
                Ok(true)
            }
        }
    }

    fn restore_stock(
        &mut self,
        product_id: Uuid,
        quantity: &BigDecimal,
    ) -> Result<(), DomainError> {
        if let Some(product) = self
            .state
            .products
            .get_mut(&product_id)
            .filter(|p| p.track_quantity)
        {
            product.stock_quantity = &product.stock_quantity + quantity;
        }
        Ok(())
    }

    fn increment_coupon_usage(&mut self, coupon_id: Uuid) -> Result<bool, DomainError> {
        let Some(coupon) = self.state.coupons.values_mut().find(|c| c.id == coupon_id) else {
            return Ok(false);
        };
        if coupon.usage_limit.is_some_and(|limit| coupon.usage_count >= limit) {
            return Ok(false);
        }
        coupon.usage_count += 1;
        Ok(true)
    }

    fn find_order(
        &mut self,
        order_id: Uuid,
        _for_update: bool,
    ) -> Result<Option<Order>, DomainError> {
        Ok(self.state.orders.iter().find(|o| o.id == order_id).cloned())
    }

    fn order_items(&mut self, order_id: Uuid) -> Result<Vec<OrderItem>, DomainError> {
        Ok(self
            .state
            .items
            .iter()
            .filter(|i| i.order_id == order_id)
            .cloned()
            .collect())
    }

    fn update_order_status(
        &mut self,
        order_id: Uuid,
        change: &StatusChange,
    ) -> Result<(), DomainError> {
        let order = self.order_mut(order_id)?;
        order.status = change.status;
        if let Some(payment_status) = change.payment_status {
            order.payment_status = payment_status;
        }
        if let Some(tracking) = &change.tracking_number {
            order.tracking_number = Some(tracking.clone());
        }
        if let Some(at) = change.shipped_at {
            order.shipped_at = Some(at);
        }
        if let Some(at) = change.delivered_at {
            order.delivered_at = Some(at);
        }
        order.updated_at = change.at;
        Ok(())
    }

    fn update_payment_status(
        &mut self,
        order_id: Uuid,
        status: PaymentStatus,
        at: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        let order = self.order_mut(order_id)?;
        order.payment_status = status;
        order.updated_at = at;
        Ok(())
    }

    fn list_orders(
        &mut self,
        filter: &OrderFilter,
        page: i64,
        limit: i64,
    ) -> Result<ListResult, DomainError> {
        let mut matching: Vec<Order> = self
            .state
            .orders
            .iter()
            .filter(|o| filter.user_id.map_or(true, |u| o.user_id == u))
            .filter(|o| filter.status.map_or(true, |s| o.status == s))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let total = matching.len() as i64;
        let items = matching
            .into_iter()
            .skip(((page - 1) * limit) as usize)
            .take(limit as usize)
            .collect();
        Ok(ListResult { items, total })
    }

    fn find_cancellation_request(
        &mut self,
        order_id: Uuid,
    ) -> Result<Option<CancellationRequest>, DomainError> {
        Ok(self
            .state
            .cancellation_requests
            .iter()
            .find(|r| r.order_id == order_id)
            .cloned())
    }

    fn insert_cancellation_request(
        &mut self,
        request: &CancellationRequest,
    ) -> Result<(), DomainError> {
        if self.find_cancellation_request(request.order_id)?.is_some() {
            return Err(DomainError::Duplicate(UniqueKey::CancellationRequest));
        }
        self.state.cancellation_requests.push(request.clone());
        Ok(())
    }

    fn resolve_cancellation_request(
        &mut self,
        request_id: Uuid,
        status: CancellationStatus,
        at: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        let request = self
            .state
            .cancellation_requests
            .iter_mut()
            .find(|r| r.id == request_id)
            .ok_or_else(|| DomainError::Internal(format!("request {request_id} missing")))?;
        request.status = status;
        request.resolved_at = Some(at);
        Ok(())
    }

    fn record_event(&mut self, event: &OrderEvent) -> Result<(), DomainError> {
        if self.fail_on_event.swap(false, Ordering::SeqCst) {
            return Err(DomainError::Internal("outbox unavailable".to_string()));
        }
        self.state.events.push(event.clone());
        Ok(())
    }
}

// ── Fixtures ─────────────────────────────────────────────────────────────────

pub fn dec(s: &str) -> BigDecimal {
    BigDecimal::from_str(s).expect("valid decimal")
}

pub fn product(name: &str, price: &str, stock: &str) -> ProductSnapshot {
    ProductSnapshot {
        id: Uuid::new_v4(),
        name: name.to_string(),
        sku: Some(format!("SKU-{}", name.to_uppercase().replace(' ', "-"))),
        price: dec(price),
        stock_quantity: dec(stock),
        min_order_quantity: dec("0.5"),
        max_order_quantity: None,
        quantity_step: dec("0.5"),
        unit: "meter".to_string(),
        track_quantity: true,
        allow_backorder: false,
    }
}

pub fn percentage_coupon(code: &str, percent: &str, max_discount: Option<&str>) -> Coupon {
    let now = Utc::now();
    Coupon {
        id: Uuid::new_v4(),
        code: code.to_string(),
        discount_type: DiscountType::Percentage,
        discount_value: dec(percent),
        min_purchase: None,
        max_discount: max_discount.map(dec),
        usage_limit: None,
        usage_count: 0,
        is_active: true,
        start_date: now - Duration::days(1),
        end_date: now + Duration::days(30),
        description: Some(format!("{percent}% off")),
    }
}

pub fn address() -> ShippingAddress {
    ShippingAddress {
        name: "Asha Patel".to_string(),
        phone: "9876543210".to_string(),
        address_line1: "12 Loom Street".to_string(),
        address_line2: None,
        city: "Surat".to_string(),
        state: "Gujarat".to_string(),
        pincode: "395003".to_string(),
    }
}

pub fn line(product_id: Uuid, quantity: &str) -> LineRequest {
    LineRequest {
        product_id,
        quantity: dec(quantity),
        unit: Some("meter".to_string()),
    }
}

pub fn order_request(items: Vec<LineRequest>, coupon_code: Option<&str>) -> PlaceOrder {
    PlaceOrder {
        items,
        shipping_address: address(),
        payment_method: PaymentMethod::Cod,
        customer_note: None,
        coupon_code: coupon_code.map(str::to_string),
        idempotency_key: None,
    }
}

pub fn setup() -> (MemoryStore, OrderService<MemoryStore>) {
    let store = MemoryStore::default();
    let service = OrderService::new(store.clone());
    (store, service)
}

pub fn place(
    service: &OrderService<MemoryStore>,
    caller: &Caller,
    items: Vec<LineRequest>,
    coupon_code: Option<&str>,
) -> Result<OrderReceipt, DomainError> {
    service.place_order(caller, order_request(items, coupon_code))
}

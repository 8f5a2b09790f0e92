use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::coupon::Coupon;
use super::errors::DomainError;
use super::events::OrderEvent;
use super::order::{
    CancellationRequest, CancellationStatus, ListResult, Order, OrderFilter, OrderItem,
    PaymentStatus, StatusChange,
};
use super::product::ProductSnapshot;

/// How a stock decrement treats the current level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockDecrement {
    /// Only applies when stock covers the quantity; reports `false` otherwise.
    Guarded,
    /// Always applies, never leaving stock below zero.
    Floored,
}

/// Operations available inside one storage transaction.
pub trait StoreTx {
    fn load_settings(&mut self) -> Result<Vec<(String, String)>, DomainError>;

    /// Products for `ids`; with `for_update` the rows stay locked until the
    /// transaction ends.
    fn load_products(
        &mut self,
        ids: &[Uuid],
        for_update: bool,
    ) -> Result<Vec<ProductSnapshot>, DomainError>;

    fn find_coupon(&mut self, code: &str, for_update: bool)
        -> Result<Option<Coupon>, DomainError>;

    fn find_order_by_idempotency_key(
        &mut self,
        user_id: Uuid,
        key: &str,
    ) -> Result<Option<Order>, DomainError>;

    fn insert_order(&mut self, order: &Order, items: &[OrderItem]) -> Result<(), DomainError>;

    /// Returns whether the decrement was applied.
    fn decrement_stock(
        &mut self,
        product_id: Uuid,
        quantity: &BigDecimal,
        mode: StockDecrement,
    ) -> Result<bool, DomainError>;

    /// Adds `quantity` back to a product that tracks stock.
    fn restore_stock(&mut self, product_id: Uuid, quantity: &BigDecimal)
        -> Result<(), DomainError>;

    /// Returns `false` when the usage limit is already reached.
    fn increment_coupon_usage(&mut self, coupon_id: Uuid) -> Result<bool, DomainError>;

    fn find_order(&mut self, order_id: Uuid, for_update: bool)
        -> Result<Option<Order>, DomainError>;

    fn order_items(&mut self, order_id: Uuid) -> Result<Vec<OrderItem>, DomainError>;

    fn update_order_status(
        &mut self,
        order_id: Uuid,
        change: &StatusChange,
    ) -> Result<(), DomainError>;

    fn update_payment_status(
        &mut self,
        order_id: Uuid,
        status: PaymentStatus,
        at: DateTime<Utc>,
    ) -> Result<(), DomainError>;

    fn list_orders(
        &mut self,
        filter: &OrderFilter,
        page: i64,
        limit: i64,
    ) -> Result<ListResult, DomainError>;

    fn find_cancellation_request(
        &mut self,
        order_id: Uuid,
    ) -> Result<Option<CancellationRequest>, DomainError>;

    fn insert_cancellation_request(
        &mut self,
        request: &CancellationRequest,
    ) -> Result<(), DomainError>;

    fn resolve_cancellation_request(
        &mut self,
        request_id: Uuid,
        status: CancellationStatus,
        at: DateTime<Utc>,
    ) -> Result<(), DomainError>;

    fn record_event(&mut self, event: &OrderEvent) -> Result<(), DomainError>;
}

/// Storage that runs a closure atomically: every write made through the
/// `StoreTx` commits together when the closure returns `Ok`, and none
/// survive when it returns `Err`.
pub trait OrderStore: Send + Sync + 'static {
    fn transaction<T, F>(&self, f: F) -> Result<T, DomainError>
    where
        F: FnOnce(&mut dyn StoreTx) -> Result<T, DomainError>;
}

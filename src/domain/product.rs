use bigdecimal::BigDecimal;
use uuid::Uuid;

/// Product state as read at order time. Owned by the catalog, never cached
/// across the pricing/commit boundary.
#[derive(Debug, Clone)]
pub struct ProductSnapshot {
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

impl ProductSnapshot {
    /// Whether an order must be refused when stock cannot cover it.
    pub fn enforces_stock(&self) -> bool {
        self.track_quantity && !self.allow_backorder
    }
}

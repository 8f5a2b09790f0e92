//! Order pricing: line validation, stock sufficiency and the totals
//! breakdown. Every monetary input is re-derived from the product snapshot;
//! the cart only contributes product ids and requested quantities.

use std::collections::HashMap;

use bigdecimal::{BigDecimal, Zero};
use uuid::Uuid;

use super::errors::DomainError;
use super::money::{
    fits_scale, format_money, format_quantity, round_money, AMOUNT_LIMIT, QUANTITY_LIMIT,
    QUANTITY_SCALE,
};
use super::product::ProductSnapshot;
use super::settings::StoreSettings;

pub const MAX_LINES: usize = 100;

/// One requested cart line. The unit hint from the client is not trusted.
#[derive(Debug, Clone)]
pub struct LineRequest {
    pub product_id: Uuid,
    pub quantity: BigDecimal,
    pub unit: Option<String>,
}

/// A validated line with product data captured at order time.
#[derive(Debug, Clone)]
pub struct PricedLine {
    pub product_id: Uuid,
    pub product_name: String,
    pub product_sku: Option<String>,
    pub unit_price: BigDecimal,
    pub quantity: BigDecimal,
    pub unit: String,
    pub line_total: BigDecimal,
    pub track_quantity: bool,
    pub allow_backorder: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Totals {
    pub subtotal: BigDecimal,
    pub shipping_cost: BigDecimal,
    pub discount: BigDecimal,
    pub total: BigDecimal,
}

/// Priced lines before any coupon is considered.
#[derive(Debug, Clone)]
pub struct PricedCart {
    pub lines: Vec<PricedLine>,
    pub subtotal: BigDecimal,
    pub shipping_cost: BigDecimal,
}

impl PricedCart {
    pub fn totals(&self, discount: BigDecimal) -> Totals {
        let total = &self.subtotal + &self.shipping_cost - &discount;
        Totals {
            subtotal: self.subtotal.clone(),
            shipping_cost: self.shipping_cost.clone(),
            discount,
            total,
        }
    }
}

/// Distinct product ids referenced by `requests`, in first-seen order.
pub fn distinct_product_ids(requests: &[LineRequest]) -> Vec<Uuid> {
    let mut ids: Vec<Uuid> = Vec::with_capacity(requests.len());
    for request in requests {
        if !ids.contains(&request.product_id) {
            ids.push(request.product_id);
        }
    }
    ids
}

fn quantity_problem(request: &LineRequest, product: &ProductSnapshot) -> Option<String> {
    let qty = &request.quantity;
    if qty <= &BigDecimal::zero() {
        return Some(format!("{}: quantity must be greater than 0", product.name));
    }
    if !fits_scale(qty, QUANTITY_SCALE) {
        return Some(format!(
            "{}: quantity cannot have more than {QUANTITY_SCALE} decimal places",
            product.name
        ));
    }
    if qty >= &BigDecimal::from(QUANTITY_LIMIT) {
        return Some(format!(
            "{}: quantity must be less than {QUANTITY_LIMIT}",
            product.name
        ));
    }
    if qty < &product.min_order_quantity {
        return Some(format!(
            "{}: minimum order quantity is {} {}",
            product.name,
            format_quantity(&product.min_order_quantity),
            product.unit
        ));
    }
    match &product.max_order_quantity {
        Some(max) if qty > max => Some(format!(
            "{}: maximum order quantity is {} {}",
            product.name,
            format_quantity(max),
            product.unit
        )),
        _ => None,
    }
}

/// Validate every line against the snapshot and compute subtotal and
/// shipping. Quantity problems are reported together, then stock shortfalls
/// together, then the minimum order amount.
pub fn price_lines(
    requests: &[LineRequest],
    products: &HashMap<Uuid, ProductSnapshot>,
    settings: &StoreSettings,
) -> Result<PricedCart, DomainError> {
    if requests.is_empty() {
        return Err(DomainError::bad_request("Order must contain at least one item"));
    }
    if requests.len() > MAX_LINES {
        return Err(DomainError::bad_request(format!(
            "Order cannot contain more than {MAX_LINES} items"
        )));
    }

    let mut problems = Vec::new();
    let mut valid: Vec<(&LineRequest, &ProductSnapshot)> = Vec::with_capacity(requests.len());
    for request in requests {
        let Some(product) = products.get(&request.product_id) else {
            problems.push(format!("Product {} not found", request.product_id));
            continue;
        };
        match quantity_problem(request, product) {
            Some(problem) => problems.push(problem),
            None => valid.push((request, product)),
        }
    }
    if !problems.is_empty() {
        return Err(DomainError::bad_request(format!(
            "Invalid items: {}",
            problems.join("; ")
        )));
    }

    // Stock is checked per product against the sum of all its lines.
    let mut requested: Vec<(&ProductSnapshot, BigDecimal)> = Vec::new();
    for &(request, product) in &valid {
        match requested.iter_mut().find(|(p, _)| p.id == product.id) {
            Some((_, sum)) => *sum += &request.quantity,
            None => requested.push((product, request.quantity.clone())),
        }
    }
    let shortfalls: Vec<String> = requested
        .iter()
        .filter(|(product, qty)| product.enforces_stock() && &product.stock_quantity < qty)
        .map(|(product, qty)| {
            format!(
                "{} (available: {} {}, requested: {})",
                product.name,
                format_quantity(&product.stock_quantity),
                product.unit,
                format_quantity(qty)
            )
        })
        .collect();
    if !shortfalls.is_empty() {
        return Err(DomainError::bad_request(format!(
            "Insufficient stock: {}",
            shortfalls.join("; ")
        )));
    }

    let lines: Vec<PricedLine> = valid
        .into_iter()
        .map(|(request, product)| PricedLine {
            product_id: product.id,
            product_name: product.name.clone(),
            product_sku: product.sku.clone(),
            unit_price: product.price.clone(),
            quantity: request.quantity.clone(),
            unit: product.unit.clone(),
            line_total: round_money(&(&product.price * &request.quantity)),
            track_quantity: product.track_quantity,
            allow_backorder: product.allow_backorder,
        })
        .collect();

    let subtotal = lines
        .iter()
        .fold(BigDecimal::zero(), |acc, line| acc + &line.line_total);
    // Covers every line total too: none is larger than the subtotal.
    if &subtotal + &settings.shipping_rate >= BigDecimal::from(AMOUNT_LIMIT) {
        return Err(DomainError::bad_request(format!(
            "Order total must be less than {}",
            format_money(&BigDecimal::from(AMOUNT_LIMIT))
        )));
    }
    if subtotal < settings.min_order_amount {
        return Err(DomainError::bad_request(format!(
            "Minimum order amount is {}",
            format_money(&settings.min_order_amount)
        )));
    }
    let shipping_cost = settings.shipping_cost_for(&subtotal);

    Ok(PricedCart {
        lines,
        subtotal,
        shipping_cost,
    })
}

use std::fmt;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::errors::DomainError;
use super::pricing::Totals;

macro_rules! string_enum {
    ($name:ident, $what:literal { $($variant:ident => $text:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(DomainError::bad_request(format!(
                        concat!("Invalid ", $what, " '{}'"),
                        other
                    ))),
                }
            }
        }
    };
}

string_enum!(OrderStatus, "order status" {
    Pending => "pending",
    Confirmed => "confirmed",
    Processing => "processing",
    Shipped => "shipped",
    Delivered => "delivered",
    Cancelled => "cancelled",
    Refunded => "refunded",
});

string_enum!(PaymentStatus, "payment status" {
    Pending => "pending",
    Paid => "paid",
});

string_enum!(PaymentMethod, "payment method" {
    Cod => "cod",
    Online => "online",
});

string_enum!(CancellationStatus, "cancellation request status" {
    Pending => "pending",
    Approved => "approved",
    Rejected => "rejected",
});

impl OrderStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Cancelled | OrderStatus::Refunded)
    }

    /// Position on the happy path; `None` for the terminal exits.
    fn progress(&self) -> Option<u8> {
        match self {
            OrderStatus::Pending => Some(0),
            OrderStatus::Confirmed => Some(1),
            OrderStatus::Processing => Some(2),
            OrderStatus::Shipped => Some(3),
            OrderStatus::Delivered => Some(4),
            OrderStatus::Cancelled | OrderStatus::Refunded => None,
        }
    }
}

/// Check an admin-initiated status change. Terminal orders never move, the
/// happy path only moves forward (staying put is allowed so a tracking
/// number can be attached), and cancel/refund are open to any live order.
pub fn check_admin_transition(from: OrderStatus, to: OrderStatus) -> Result<(), DomainError> {
    if from.is_terminal() {
        return Err(DomainError::bad_request(format!(
            "Cannot change the status of a {from} order"
        )));
    }
    match (from.progress(), to.progress()) {
        (Some(current), Some(next)) if next < current => Err(DomainError::bad_request(format!(
            "Cannot move an order from {from} back to {to}"
        ))),
        _ => Ok(()),
    }
}

/// Address copied onto the order; later address-book edits never touch it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShippingAddress {
    pub name: String,
    pub phone: String,
    pub address_line1: String,
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    pub pincode: String,
}

impl ShippingAddress {
    /// Trim every field and reject blanks among the required ones.
    pub fn normalized(self) -> Result<Self, DomainError> {
        let address = ShippingAddress {
            name: self.name.trim().to_string(),
            phone: self.phone.trim().to_string(),
            address_line1: self.address_line1.trim().to_string(),
            address_line2: self
                .address_line2
                .map(|l| l.trim().to_string())
                .filter(|l| !l.is_empty()),
            city: self.city.trim().to_string(),
            state: self.state.trim().to_string(),
            pincode: self.pincode.trim().to_string(),
        };
        let missing: Vec<&str> = [
            ("name", &address.name),
            ("phone", &address.phone),
            ("address line 1", &address.address_line1),
            ("city", &address.city),
            ("state", &address.state),
            ("pincode", &address.pincode),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(field, _)| field)
        .collect();
        if !missing.is_empty() {
            return Err(DomainError::bad_request(format!(
                "Shipping address is incomplete: missing {}",
                missing.join(", ")
            )));
        }
        Ok(address)
    }
}

#[derive(Debug, Clone)]
pub struct Order {
    pub id: Uuid,
    pub order_number: String,
    pub user_id: Uuid,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub payment_method: PaymentMethod,
    pub shipping_address: ShippingAddress,
    pub totals: Totals,
    pub coupon_code: Option<String>,
    pub customer_note: Option<String>,
    pub tracking_number: Option<String>,
    pub idempotency_key: Option<String>,
    pub shipped_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn receipt(&self) -> OrderReceipt {
        OrderReceipt {
            order_id: self.id,
            order_number: self.order_number.clone(),
            totals: self.totals.clone(),
            coupon_code: self.coupon_code.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OrderItem {
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

#[derive(Debug, Clone)]
pub struct CancellationRequest {
    pub id: Uuid,
    pub order_id: Uuid,
    pub status: CancellationStatus,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct OrderDetail {
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub cancellation_request: Option<CancellationRequest>,
}

/// What `order.create` hands back; the caller treats these totals as the
/// source of truth.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderReceipt {
    pub order_id: Uuid,
    pub order_number: String,
    pub totals: Totals,
    pub coupon_code: Option<String>,
}

/// Status change applied by the lifecycle manager. `None` fields leave the
/// stored value untouched.
#[derive(Debug, Clone)]
pub struct StatusChange {
    pub status: OrderStatus,
    pub payment_status: Option<PaymentStatus>,
    pub tracking_number: Option<String>,
    pub shipped_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub at: DateTime<Utc>,
}

impl StatusChange {
    pub fn to(status: OrderStatus, at: DateTime<Utc>) -> Self {
        Self {
            status,
            payment_status: None,
            tracking_number: None,
            shipped_at: None,
            delivered_at: None,
            at,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub user_id: Option<Uuid>,
    pub status: Option<OrderStatus>,
}

#[derive(Debug, Clone)]
pub struct ListResult {
    pub items: Vec<Order>,
    pub total: i64,
}

const ORDER_NUMBER_SUFFIX_LEN: usize = 10;
const ORDER_NUMBER_ALPHABET: &[u8] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ";

/// `ORD-YYYYMMDD-XXXXXXXXXX`, the suffix drawn from a v4 UUID's random bits
/// in Crockford base32.
pub fn generate_order_number(now: DateTime<Utc>) -> String {
    let mut bits = Uuid::new_v4().as_u128();
    let mut suffix = String::with_capacity(ORDER_NUMBER_SUFFIX_LEN);
    for _ in 0..ORDER_NUMBER_SUFFIX_LEN {
        suffix.push(ORDER_NUMBER_ALPHABET[(bits & 0x1f) as usize] as char);
        bits >>= 5;
    }
    format!("ORD-{}-{}", now.format("%Y%m%d"), suffix)
}

//! Coupon resolution: eligibility checks and discount computation.
//!
//! Resolution has no side effects. Usage is consumed only when an order
//! commits, so a customer can preview the same code any number of times.

use std::fmt;
use std::str::FromStr;

use bigdecimal::{BigDecimal, Zero};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::errors::DomainError;
use super::money::{format_money, round_money};

pub const INVALID_COUPON: &str = "Invalid or expired coupon code";
pub const USAGE_LIMIT_REACHED: &str = "Coupon usage limit reached";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscountType {
    Percentage,
    Fixed,
}

impl DiscountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscountType::Percentage => "percentage",
            DiscountType::Fixed => "fixed",
        }
    }
}

impl fmt::Display for DiscountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DiscountType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "percentage" => Ok(DiscountType::Percentage),
            "fixed" => Ok(DiscountType::Fixed),
            other => Err(DomainError::Internal(format!(
                "unknown discount type '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Coupon {
    pub id: Uuid,
    pub code: String,
    pub discount_type: DiscountType,
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

/// A coupon that passed every check, with the discount it grants.
#[derive(Debug, Clone)]
pub struct AppliedCoupon {
    pub coupon_id: Uuid,
    pub code: String,
    pub discount_type: DiscountType,
    pub discount_value: BigDecimal,
    pub discount: BigDecimal,
    pub description: Option<String>,
}

/// The one canonical form of a coupon code: whitespace removed, uppercase.
/// Returns `None` when nothing is left.
pub fn normalize_code(raw: &str) -> Option<String> {
    let code: String = raw
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase();
    (!code.is_empty()).then_some(code)
}

impl Coupon {
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.start_date <= now && now <= self.end_date
    }

    pub fn usage_exhausted(&self) -> bool {
        self.usage_limit
            .is_some_and(|limit| self.usage_count >= limit)
    }

    /// Discount for `subtotal`, clamped to `[0, subtotal]` and rounded to cents.
    pub fn discount_for(&self, subtotal: &BigDecimal) -> BigDecimal {
        let raw = match self.discount_type {
            DiscountType::Percentage => {
                let pct = subtotal * &self.discount_value / BigDecimal::from(100);
                match &self.max_discount {
                    Some(cap) if cap > &BigDecimal::zero() && &pct > cap => cap.clone(),
                    _ => pct,
                }
            }
            DiscountType::Fixed => self.discount_value.clone(),
        };
        let clamped = if raw < BigDecimal::zero() {
            BigDecimal::zero()
        } else if &raw > subtotal {
            subtotal.clone()
        } else {
            raw
        };
        round_money(&clamped)
    }
}

/// Run the eligibility checks in order, first failure wins, and compute the
/// discount. `found` is the result of looking the normalized code up.
pub fn resolve(
    found: Option<Coupon>,
    subtotal: &BigDecimal,
    now: DateTime<Utc>,
) -> Result<AppliedCoupon, DomainError> {
    let coupon = match found {
        Some(coupon) if coupon.is_live(now) => coupon,
        _ => return Err(DomainError::not_found(INVALID_COUPON)),
    };
    if coupon.usage_exhausted() {
        return Err(DomainError::bad_request(USAGE_LIMIT_REACHED));
    }
    let min_purchase = coupon.min_purchase.clone().unwrap_or_else(BigDecimal::zero);
    if subtotal < &min_purchase {
        return Err(DomainError::bad_request(format!(
            "Minimum purchase of {} required for this coupon",
            format_money(&min_purchase)
        )));
    }

    let discount = coupon.discount_for(subtotal);
    Ok(AppliedCoupon {
        coupon_id: coupon.id,
        code: coupon.code,
        discount_type: coupon.discount_type,
        discount_value: coupon.discount_value,
        discount,
        description: coupon.description,
    })
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).expect("valid decimal")
    }

    fn coupon(discount_type: DiscountType, value: &str) -> Coupon {
        let now = Utc::now();
        Coupon {
            id: Uuid::new_v4(),
            code: "SAVE10".to_string(),
            discount_type,
            discount_value: dec(value),
            min_purchase: None,
            max_discount: None,
            usage_limit: None,
            usage_count: 0,
            is_active: true,
            start_date: now - Duration::days(1),
            end_date: now + Duration::days(1),
            description: Some("Ten percent off".to_string()),
        }
    }

    #[test]
    fn normalize_strips_whitespace_and_uppercases() {
        assert_eq!(normalize_code(" save 10\t").as_deref(), Some("SAVE10"));
        assert_eq!(normalize_code("   "), None);
    }

    #[test]
    fn percentage_discount_is_capped_by_max_discount() {
        let mut c = coupon(DiscountType::Percentage, "10");
        c.max_discount = Some(dec("50"));
        assert_eq!(c.discount_for(&dec("600")), dec("50"));
        assert_eq!(c.discount_for(&dec("400")), dec("40"));
    }

    #[test]
    fn zero_max_discount_means_uncapped() {
        let mut c = coupon(DiscountType::Percentage, "10");
        c.max_discount = Some(dec("0"));
        assert_eq!(c.discount_for(&dec("600")), dec("60"));
    }

    #[test]
    fn fixed_discount_never_exceeds_subtotal() {
        let c = coupon(DiscountType::Fixed, "150");
        assert_eq!(c.discount_for(&dec("120")), dec("120"));
        assert_eq!(c.discount_for(&dec("300")), dec("150"));
    }

    #[test]
    fn percentage_discount_rounds_half_up() {
        let c = coupon(DiscountType::Percentage, "12.5");
        // 12.5% of 10.02 = 1.2525
        assert_eq!(c.discount_for(&dec("10.02")), dec("1.25"));
        // 12.5% of 0.1 = 0.0125
        assert_eq!(c.discount_for(&dec("0.10")), dec("0.01"));
        // 10% of 0.05 = 0.005
        let ten = coupon(DiscountType::Percentage, "10");
        assert_eq!(ten.discount_for(&dec("0.05")), dec("0.01"));
    }

    #[test]
    fn missing_coupon_is_not_found() {
        let err = resolve(None, &dec("100"), Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::NotFound(ref m) if m == INVALID_COUPON));
    }

    #[test]
    fn inactive_and_expired_coupons_look_missing() {
        let mut inactive = coupon(DiscountType::Fixed, "10");
        inactive.is_active = false;
        assert!(matches!(
            resolve(Some(inactive), &dec("100"), Utc::now()),
            Err(DomainError::NotFound(_))
        ));

        let mut expired = coupon(DiscountType::Fixed, "10");
        expired.end_date = Utc::now() - Duration::hours(1);
        assert!(matches!(
            resolve(Some(expired), &dec("100"), Utc::now()),
            Err(DomainError::NotFound(_))
        ));

        let mut upcoming = coupon(DiscountType::Fixed, "10");
        upcoming.start_date = Utc::now() + Duration::hours(1);
        assert!(matches!(
            resolve(Some(upcoming), &dec("100"), Utc::now()),
            Err(DomainError::NotFound(_))
        ));
    }

    #[test]
    fn window_is_inclusive() {
        let c = coupon(DiscountType::Fixed, "10");
        assert!(c.is_live(c.start_date));
        assert!(c.is_live(c.end_date));
    }

    #[test]
    fn exhausted_usage_is_checked_before_min_purchase() {
        let mut c = coupon(DiscountType::Fixed, "10");
        c.usage_limit = Some(3);
        c.usage_count = 3;
        c.min_purchase = Some(dec("1000"));
        let err = resolve(Some(c), &dec("100"), Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::BadRequest(ref m) if m == USAGE_LIMIT_REACHED));
    }

    #[test]
    fn min_purchase_is_inclusive() {
        let mut c = coupon(DiscountType::Fixed, "10");
        c.min_purchase = Some(dec("500"));
        let err = resolve(Some(c.clone()), &dec("499.99"), Utc::now()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Minimum purchase of 500.00 required for this coupon"
        );
        let applied = resolve(Some(c), &dec("500"), Utc::now()).expect("eligible");
        assert_eq!(applied.discount, dec("10"));
    }

    #[test]
    fn resolve_reports_coupon_details() {
        let mut c = coupon(DiscountType::Percentage, "10");
        c.max_discount = Some(dec("50"));
        c.usage_limit = Some(5);
        c.usage_count = 4;
        let id = c.id;
        let applied = resolve(Some(c), &dec("600"), Utc::now()).expect("eligible");
        assert_eq!(applied.coupon_id, id);
        assert_eq!(applied.code, "SAVE10");
        assert_eq!(applied.discount_type, DiscountType::Percentage);
        assert_eq!(applied.discount, dec("50"));
    }
}

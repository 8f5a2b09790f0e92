pub mod coupon;
pub mod errors;
pub mod events;
pub mod money;
pub mod order;
pub mod ports;
pub mod pricing;
pub mod product;
pub mod settings;

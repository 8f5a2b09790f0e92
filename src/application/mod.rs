pub mod lifecycle;
pub mod order_service;

pub use order_service::{Caller, OrderService, PlaceOrder, Quote};

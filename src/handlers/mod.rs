pub mod admin;
pub mod auth;
pub mod coupons;
pub mod orders;

use crate::application::OrderService;
use crate::infrastructure::DieselOrderStore;

pub type AppService = OrderService<DieselOrderStore>;

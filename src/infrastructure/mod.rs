pub mod models;
pub mod order_store;

pub use order_store::DieselOrderStore;

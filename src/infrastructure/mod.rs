pub mod models;
pub mod order_repo;
pub mod payment_gateway;

// Command implementations, one module per admin page group

pub mod auth;
pub mod businesses;
pub mod catalog;
pub mod events;
pub mod users;

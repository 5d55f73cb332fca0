//! API handlers

pub mod extract;
pub mod health;

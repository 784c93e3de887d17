//! Marketplace REST adapter.

mod client;
pub mod dto;

pub use client::{DEFAULT_API_BASE, MarketplaceClient};

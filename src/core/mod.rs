//! Core business logic abstractions

pub mod allocation;
pub mod cache;
pub mod config;
pub mod log;
pub mod price;

// Re-export main types for cleaner imports
pub use allocation::{AllocationPlan, AllocationResult, Allocator, Category, TotalFundsPolicy};
pub use cache::QuoteCache;
pub use price::{PriceSource, Quote, QuoteProvider};

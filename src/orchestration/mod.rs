//! Request orchestration: multi-chain fetch, price lookup and settlement.

pub mod aggregator;
pub mod pricing;
pub mod service;

pub use aggregator::{AggregationError, Aggregator, ChainFunding};
pub use pricing::{PriceResolver, PricingRequest};
pub use service::{FundingRequest, FundingService};

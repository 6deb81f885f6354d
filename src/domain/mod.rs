//! Domain types for stream accounting.
//!
//! This module provides:
//! - Lossless numerics: `Decimal` for prices, `Amount` for token and fiat totals
//! - Primitives: UnixTime, Address, ChainId
//! - Calendar `Granularity` rules
//! - Funding intervals, virtual periods and price series
//! - The immutable network registry

pub mod amount;
pub mod currency;
pub mod decimal;
pub mod granularity;
pub mod interval;
pub mod network;
pub mod period;
pub mod price;
pub mod primitives;

pub use amount::Amount;
pub use currency::Currency;
pub use decimal::Decimal;
pub use granularity::{Granularity, GranularityParseError};
pub use interval::{FundingInterval, IntervalKind, TokenKey, TokenRef, DEFAULT_TOKEN_DECIMALS};
pub use network::{Network, NetworkRegistry};
pub use period::{FundingRecord, VirtualPeriod};
pub use price::{PriceObservation, PricePoint, PriceSeries};
pub use primitives::{Address, AddressParseError, ChainId, UnixTime, MAX_UNIX_TIME};

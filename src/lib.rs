pub mod api;
pub mod config;
pub mod datasource;
pub mod domain;
pub mod engine;
pub mod error;
pub mod orchestration;

pub use config::Config;
pub use datasource::{
    CoingeckoPriceSource, DataSourceError, FundingSource, MockFundingSource, MockPriceSource,
    PriceSource, SubgraphFundingSource,
};
pub use domain::{
    Address, Amount, ChainId, Currency, Decimal, FundingInterval, FundingRecord, Granularity,
    NetworkRegistry, UnixTime, VirtualPeriod,
};
pub use error::AppError;
pub use orchestration::{FundingRequest, FundingService};

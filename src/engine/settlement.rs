//! Token amounts per period and the sign convention relative to queried addresses.

use super::virtualizer::PeriodSpan;
use crate::domain::{Address, Amount, FundingInterval};
use std::collections::HashSet;

/// Direction of value relative to the queried address set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Inflow,
    Outflow,
}

/// How to sign intervals whose sender and receiver are both queried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignPolicy {
    /// Report self-transfers as inflows (positive amounts).
    #[default]
    SelfTransferAsInflow,
}

impl Direction {
    pub fn of(interval: &FundingInterval, queried: &HashSet<Address>, policy: SignPolicy) -> Self {
        let receives = queried.contains(&interval.receiver);
        match policy {
            SignPolicy::SelfTransferAsInflow if receives => Direction::Inflow,
            SignPolicy::SelfTransferAsInflow => Direction::Outflow,
        }
    }

    pub fn apply(&self, magnitude: Amount) -> Amount {
        match self {
            Direction::Inflow => magnitude,
            Direction::Outflow => -magnitude,
        }
    }
}

/// Unsigned token amount moved during `span`, in the token's base units.
///
/// Flows settle `flow_rate × duration`; transfers settle their fixed value
/// regardless of span length.
pub fn token_amount(interval: &FundingInterval, span: &PeriodSpan) -> Amount {
    if interval.is_transfer() {
        return interval.amount.clone().unwrap_or_default();
    }
    &interval.flow_rate * &Amount::from_i64(span.duration())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ChainId, IntervalKind, TokenRef, UnixTime};

    fn interval(sender: &str, receiver: &str, flow_rate: &str) -> FundingInterval {
        FundingInterval {
            id: "p".to_string(),
            chain_id: ChainId(1),
            kind: IntervalKind::Stream,
            token: TokenRef {
                id: Address::new("0x01"),
                symbol: String::new(),
                name: String::new(),
                underlying_address: Address::new("0x00"),
                decimals: 18,
            },
            sender: Address::new(sender),
            receiver: Address::new(receiver),
            flow_rate: Amount::from_str_canonical(flow_rate).unwrap(),
            started_at: UnixTime::new(0),
            stopped_at: None,
            amount: None,
            started_at_block: None,
            started_at_tx: None,
            stopped_at_block: None,
            stopped_at_tx: None,
        }
    }

    fn span(start: i64, end: i64) -> PeriodSpan {
        PeriodSpan {
            start: UnixTime::new(start),
            end: UnixTime::new(end),
        }
    }

    #[test]
    fn test_token_amount_is_rate_times_duration() {
        let stream = interval("0xa", "0xb", "385802469135802469135802469");
        let amount = token_amount(&stream, &span(0, 31_536_000 * 40));
        assert_eq!(
            amount.to_string(),
            "486666666666666666666666666495360000"
        );
    }

    #[test]
    fn test_transfer_amount_ignores_duration() {
        let mut transfer = interval("0xa", "0xb", "0");
        transfer.kind = IntervalKind::Transfer;
        transfer.amount = Some(Amount::from_i64(500));

        assert_eq!(token_amount(&transfer, &span(10, 10)).to_string(), "500");
    }

    #[test]
    fn test_direction_sign_policy() {
        let queried: HashSet<Address> = [Address::new("0xa"), Address::new("0xb")].into();
        let policy = SignPolicy::SelfTransferAsInflow;

        let self_stream = interval("0xa", "0xb", "1");
        assert_eq!(Direction::of(&self_stream, &queried, policy), Direction::Inflow);

        let outgoing = interval("0xa", "0xc", "1");
        let direction = Direction::of(&outgoing, &queried, policy);
        assert_eq!(direction, Direction::Outflow);
        assert_eq!(direction.apply(Amount::from_i64(7)).to_string(), "-7");

        let incoming = interval("0xc", "0xb", "1");
        assert_eq!(Direction::of(&incoming, &queried, policy), Direction::Inflow);
    }
}

//! Fiat quote currencies accepted by the price backend.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Currency {
    Usd,
    Eur,
    Gbp,
    Jpy,
    Chf,
    Cad,
    Aud,
    Cny,
    Inr,
    Krw,
    Brl,
    Sgd,
}

impl Currency {
    /// Lowercase ISO code, as used in price API query strings.
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Usd => "usd",
            Currency::Eur => "eur",
            Currency::Gbp => "gbp",
            Currency::Jpy => "jpy",
            Currency::Chf => "chf",
            Currency::Cad => "cad",
            Currency::Aud => "aud",
            Currency::Cny => "cny",
            Currency::Inr => "inr",
            Currency::Krw => "krw",
            Currency::Brl => "brl",
            Currency::Sgd => "sgd",
        }
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "usd" => Ok(Currency::Usd),
            "eur" => Ok(Currency::Eur),
            "gbp" => Ok(Currency::Gbp),
            "jpy" => Ok(Currency::Jpy),
            "chf" => Ok(Currency::Chf),
            "cad" => Ok(Currency::Cad),
            "aud" => Ok(Currency::Aud),
            "cny" => Ok(Currency::Cny),
            "inr" => Ok(Currency::Inr),
            "krw" => Ok(Currency::Krw),
            "brl" => Ok(Currency::Brl),
            "sgd" => Ok(Currency::Sgd),
            _ => Err(s.to_string()),
        }
    }
}

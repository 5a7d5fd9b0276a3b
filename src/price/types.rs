use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Currencies a price can be quoted in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Currency {
    Sgd,
    Myr,
    Usd,
}

impl Currency {
    /// Returns the ISO 4217 code
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Sgd => "SGD",
            Currency::Myr => "MYR",
            Currency::Usd => "USD",
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown currency code: '{0}'")]
pub struct UnknownCurrency(pub String);

impl FromStr for Currency {
    type Err = UnknownCurrency;

    /// Parses an upper-case ISO 4217 code, ignoring surrounding whitespace
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "SGD" => Ok(Currency::Sgd),
            "MYR" => Ok(Currency::Myr),
            "USD" => Ok(Currency::Usd),
            other => Err(UnknownCurrency(other.to_string())),
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid price amount: '{0}'")]
pub struct InvalidAmount(pub String);

/// A per-item price found on a page
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Price {
    pub amount: f64,
    pub currency: Option<Currency>,
}

impl Price {
    pub fn new(amount: f64, currency: Option<Currency>) -> Self {
        Self { amount, currency }
    }

    /// Parses a displayed amount such as `"2,000,900.00 "`
    ///
    /// Surrounding whitespace and thousands separators are ignored.
    /// Only finite amounts are accepted: `NaN` and `inf` parse as floats but
    /// are not prices.
    pub fn parse_amount(text: &str) -> Result<f64, InvalidAmount> {
        let cleaned = text.trim().replace(',', "");
        let amount: f64 = cleaned
            .parse()
            .map_err(|_| InvalidAmount(cleaned.clone()))?;

        if amount.is_finite() {
            Ok(amount)
        } else {
            Err(InvalidAmount(cleaned))
        }
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.currency {
            Some(currency) => write!(f, "{:.2} {}", self.amount, currency),
            None => write!(f, "{:.2}", self.amount),
        }
    }
}

/// Outcome of checking a price against the configured range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    InRange,
    OutOfRange,
}

/// Inclusive range of plausible prices
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceRange {
    pub min: f64,
    pub max: f64,
}

impl PriceRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Checks an amount; both bounds are inside the range
    pub fn check(&self, amount: f64) -> Verdict {
        if amount < self.min || amount > self.max {
            Verdict::OutOfRange
        } else {
            Verdict::InRange
        }
    }
}

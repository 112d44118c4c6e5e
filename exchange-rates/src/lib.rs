//! Currency codes and base-pivoted exchange rate tables.
//!
//! This crate is the leaf of the workspace: it knows how to name a currency,
//! how to hold a table of rates relative to one base currency, and how to
//! convert between two codes through that base. It does no IO; fetching
//! rates is the job of a `RateSource` adapter further up the stack.
//!
//! # Adding a New Currency
//! Known currencies only carry display metadata and a reference rate used by
//! the offline rate source. Any three-letter code can still be converted when
//! a fetched table contains it. To add one, extend the macro invocation:
//! ```ignore
//! define_currencies! {
//!     // ... existing currencies ...
//!     SEK => (b"SEK", "kr", 2, 10.45),
//! }
//! ```
//!
//! # Example
//! ```
//! use exchange_rates::{CurrencyCode, RateTable};
//!
//! let table = RateTable::from_rates(CurrencyCode::USD, [(CurrencyCode::EUR, 0.9)]);
//! let converted = table.convert(100.0, CurrencyCode::USD, CurrencyCode::EUR);
//! assert_eq!(converted.value, 90.0);
//! assert!(!converted.approximated);
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Rounding
// ─────────────────────────────────────────────────────────────────────────────

/// Rounds `value` to `places` decimal places, half away from zero.
pub fn round_dp(value: f64, places: u32) -> f64 {
    let factor = 10f64.powi(places as i32);
    let rounded = (value * factor).round() / factor;
    // Avoid handing out negative zero, it prints as "-0.00".
    if rounded == 0.0 { 0.0 } else { rounded }
}

/// Rounds to the two-decimal minor unit used for amounts.
pub fn round_amount(value: f64) -> f64 {
    round_dp(value, 2)
}

/// Rounds to the four decimals used for quoted rates.
pub fn round_rate(value: f64) -> f64 {
    round_dp(value, 4)
}

// ─────────────────────────────────────────────────────────────────────────────
// Currency Code
// ─────────────────────────────────────────────────────────────────────────────

/// Error returned when a string is not a usable currency code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CurrencyError {
    #[error("Invalid currency code: {0:?} (expected three letters)")]
    InvalidCode(String),
}

/// A three-letter ISO-4217 style currency code, always upper case.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode([u8; 3]);

impl CurrencyCode {
    /// Parses a code, accepting any letter case.
    pub fn parse(s: &str) -> Result<Self, CurrencyError> {
        let trimmed = s.trim();
        let bytes = trimmed.as_bytes();
        if bytes.len() != 3 || !bytes.iter().all(u8::is_ascii_alphabetic) {
            return Err(CurrencyError::InvalidCode(s.to_string()));
        }
        Ok(Self([
            bytes[0].to_ascii_uppercase(),
            bytes[1].to_ascii_uppercase(),
            bytes[2].to_ascii_uppercase(),
        ]))
    }

    pub fn as_str(&self) -> &str {
        // Only ASCII letters are ever stored.
        std::str::from_utf8(&self.0).unwrap_or("???")
    }

    /// Formats an amount with the currency symbol when the code is known,
    /// otherwise as `"12.50 XYZ"`.
    pub fn format_amount(&self, amount: f64) -> String {
        let places = self.decimal_places() as usize;
        match self.symbol() {
            Some(symbol) if amount < 0.0 => {
                format!("-{}{:.*}", symbol, places, amount.abs())
            }
            Some(symbol) => format!("{}{:.*}", symbol, places, amount),
            None => format!("{:.*} {}", places, amount, self),
        }
    }
}

impl fmt::Debug for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CurrencyCode({})", self.as_str())
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CurrencyCode {
    type Err = CurrencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = CurrencyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.as_str().to_string()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// THE MACRO: Defines known currencies with display metadata and reference rates
// ─────────────────────────────────────────────────────────────────────────────

/// Defines the known currencies.
///
/// # Syntax
/// ```ignore
/// define_currencies! {
///     NAME => (b"CODE", "symbol", decimal_places, units_per_usd),
/// }
/// ```
macro_rules! define_currencies {
    (
        $(
            $name:ident => ($code:literal, $symbol:literal, $places:expr, $per_usd:expr)
        ),* $(,)?
    ) => {
        impl CurrencyCode {
            $(
                pub const $name: CurrencyCode = CurrencyCode(*$code);
            )*

            /// Display symbol for known currencies.
            pub fn symbol(&self) -> Option<&'static str> {
                match &self.0 {
                    $($code => Some($symbol),)*
                    _ => None,
                }
            }

            /// Number of minor-unit decimals; unknown codes use two.
            pub fn decimal_places(&self) -> u32 {
                match &self.0 {
                    $($code => $places,)*
                    _ => 2,
                }
            }

            /// Reference rate in units of this currency per one US dollar.
            pub fn reference_rate(&self) -> Option<f64> {
                match &self.0 {
                    $($code => Some($per_usd),)*
                    _ => None,
                }
            }

            pub fn known() -> &'static [CurrencyCode] {
                &[$(CurrencyCode::$name),*]
            }
        }
    };
}

// ─────────────────────────────────────────────────────────────────────────────
// CURRENCY DEFINITIONS - Add new currencies here!
// ─────────────────────────────────────────────────────────────────────────────

define_currencies! {
    USD => (b"USD", "$", 2, 1.0),
    EUR => (b"EUR", "€", 2, 0.92),
    GBP => (b"GBP", "£", 2, 0.79),
    INR => (b"INR", "₹", 2, 83.12),
    JPY => (b"JPY", "¥", 0, 149.50),
    CAD => (b"CAD", "C$", 2, 1.36),
    AUD => (b"AUD", "A$", 2, 1.52),
    CHF => (b"CHF", "CHF ", 2, 0.88),
    CNY => (b"CNY", "CN¥", 2, 7.24),
    MXN => (b"MXN", "MX$", 2, 17.05),
    THB => (b"THB", "฿", 2, 35.60),
    BRL => (b"BRL", "R$", 2, 4.97),
}

// ─────────────────────────────────────────────────────────────────────────────
// Rate Table
// ─────────────────────────────────────────────────────────────────────────────

/// Result of a conversion or rate lookup.
///
/// `approximated` is set whenever a missing or unusable rate forced a
/// one-to-one passthrough for part of the route.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Conversion {
    pub value: f64,
    pub approximated: bool,
}

impl Conversion {
    pub fn exact(value: f64) -> Self {
        Self {
            value,
            approximated: false,
        }
    }

    pub fn approximate(value: f64) -> Self {
        Self {
            value,
            approximated: true,
        }
    }
}

/// Rates expressed as units of each currency per one unit of `base`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateTable {
    base: CurrencyCode,
    rates: BTreeMap<CurrencyCode, f64>,
}

impl RateTable {
    /// Creates an empty table. Every conversion through it is a passthrough.
    pub fn new(base: CurrencyCode) -> Self {
        Self {
            base,
            rates: BTreeMap::new(),
        }
    }

    pub fn from_rates(
        base: CurrencyCode,
        rates: impl IntoIterator<Item = (CurrencyCode, f64)>,
    ) -> Self {
        Self {
            base,
            rates: rates.into_iter().collect(),
        }
    }

    /// Builds a table from the built-in reference rates, pivoted to `base`.
    ///
    /// An unknown base yields an empty table.
    pub fn reference(base: CurrencyCode) -> Self {
        let Some(base_per_usd) = base.reference_rate() else {
            return Self::new(base);
        };
        let rates = CurrencyCode::known().iter().filter_map(|code| {
            code.reference_rate()
                .map(|per_usd| (*code, per_usd / base_per_usd))
        });
        Self::from_rates(base, rates)
    }

    pub fn base(&self) -> CurrencyCode {
        self.base
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    pub fn insert(&mut self, code: CurrencyCode, rate: f64) {
        self.rates.insert(code, rate);
    }

    pub fn rates(&self) -> &BTreeMap<CurrencyCode, f64> {
        &self.rates
    }

    /// Usable rate for `code` relative to the base.
    ///
    /// The base itself is always 1. Zero, negative and non-finite entries
    /// are treated as missing.
    pub fn rate_of(&self, code: CurrencyCode) -> Option<f64> {
        match self.rates.get(&code) {
            Some(rate) if rate.is_finite() && *rate > 0.0 => Some(*rate),
            _ if code == self.base => Some(1.0),
            _ => None,
        }
    }

    /// Converts `amount` from one currency to another through the base.
    ///
    /// The result is rounded to two decimals, except for same-currency
    /// requests and empty tables which hand the amount back untouched.
    pub fn convert(&self, amount: f64, from: CurrencyCode, to: CurrencyCode) -> Conversion {
        if from == to {
            return Conversion::exact(amount);
        }
        if self.is_empty() {
            return Conversion::approximate(amount);
        }

        let (from_rate, from_missing) = self.rate_or_one(from);
        let (to_rate, to_missing) = self.rate_or_one(to);

        let in_base = amount / from_rate;
        let value = round_amount(in_base * to_rate);
        Conversion {
            value,
            approximated: from_missing || to_missing,
        }
    }

    /// Units of `to` per one unit of `from`, rounded to four decimals.
    pub fn rate(&self, from: CurrencyCode, to: CurrencyCode) -> Conversion {
        if from == to {
            return Conversion::exact(1.0);
        }
        if self.is_empty() {
            return Conversion::approximate(1.0);
        }

        let (from_rate, from_missing) = self.rate_or_one(from);
        let (to_rate, to_missing) = self.rate_or_one(to);
        Conversion {
            value: round_rate(to_rate / from_rate),
            approximated: from_missing || to_missing,
        }
    }

    fn rate_or_one(&self, code: CurrencyCode) -> (f64, bool) {
        match self.rate_of(code) {
            Some(rate) => (rate, false),
            None => (1.0, true),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

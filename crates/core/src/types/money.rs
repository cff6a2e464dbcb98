//! Money helpers built on decimal arithmetic.
//!
//! Amounts are stored and computed as [`Decimal`] in the currency's standard
//! unit (naira, not kobo). Payment gateways want integer minor units, so the
//! only place a decimal leaves this representation is [`to_minor_units`].

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

/// Number of decimal places kept on every stored amount.
pub const MONEY_SCALE: u32 = 2;

/// Errors converting amounts for a gateway.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoneyError {
    /// The amount is below zero.
    #[error("amount cannot be negative: {0}")]
    Negative(Decimal),
    /// The amount does not fit in minor units.
    #[error("amount is too large: {0}")]
    Overflow(Decimal),
}

/// Round an amount to two decimal places using banker's rounding.
#[must_use]
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp(MONEY_SCALE)
}

/// Convert a standard-unit amount into integer minor units (e.g. kobo).
///
/// ```
/// use luxuffy_core::to_minor_units;
/// use rust_decimal::Decimal;
///
/// assert_eq!(to_minor_units(Decimal::new(1050, 2)), Ok(1050));
/// ```
///
/// # Errors
///
/// Returns [`MoneyError::Negative`] for negative amounts and
/// [`MoneyError::Overflow`] when the result does not fit in an `i64`.
pub fn to_minor_units(amount: Decimal) -> Result<i64, MoneyError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(MoneyError::Negative(amount));
    }
    round_money(amount)
        .checked_mul(Decimal::ONE_HUNDRED)
        .and_then(|minor| minor.to_i64())
        .ok_or(MoneyError::Overflow(amount))
}

/// ISO 4217 currencies accepted by the payment gateway.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Currency {
    #[default]
    NGN,
    GHS,
    ZAR,
    KES,
    USD,
}

impl Currency {
    /// ISO code as sent to the gateway.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::NGN => "NGN",
            Self::GHS => "GHS",
            Self::ZAR => "ZAR",
            Self::KES => "KES",
            Self::USD => "USD",
        }
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl std::str::FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "NGN" => Ok(Self::NGN),
            "GHS" => Ok(Self::GHS),
            "ZAR" => Ok(Self::ZAR),
            "KES" => Ok(Self::KES),
            "USD" => Ok(Self::USD),
            _ => Err(format!("unsupported currency: {s}")),
        }
    }
}

use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, AddAssign, Mul},
    str::FromStr,
};

use rust_decimal::{prelude::ToPrimitive, Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use sqlx::{
    encode::IsNull,
    error::BoxDynError,
    sqlite::{SqliteArgumentValue, SqliteTypeInfo, SqliteValueRef},
    Decode,
    Encode,
    Sqlite,
    Type,
};
use thiserror::Error;

use crate::op;

pub const DEFAULT_CURRENCY_CODE: &str = "INR";
/// Number of fractional digits carried by every stored amount.
pub const MONEY_SCALE: u32 = 2;

//--------------------------------------       Money         ---------------------------------------------------------
/// A currency amount in major units (e.g. rupees), backed by an exact decimal.
///
/// Arithmetic is exact. Rounding to [`MONEY_SCALE`] digits only happens when you ask for it via [`Money::rounded`] or
/// [`Money::line_total`], and always rounds half away from zero (i.e. `0.005` becomes `0.01`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

op!(binary Money, Add, add);
op!(inplace Money, AddAssign, add_assign);

impl Mul<u32> for Money {
    type Output = Self;

    fn mul(self, rhs: u32) -> Self::Output {
        Self(self.0 * Decimal::from(rhs))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error)]
pub enum MoneyConversionError {
    #[error("Value is not a valid amount: {0}")]
    InvalidAmount(String),
    #[error("Value cannot be represented in minor units: {0}")]
    OutOfRange(String),
}

impl From<Decimal> for Money {
    fn from(value: Decimal) -> Self {
        Self(value)
    }
}

impl From<i64> for Money {
    fn from(value: i64) -> Self {
        Self(Decimal::from(value))
    }
}

impl FromStr for Money {
    type Err = MoneyConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s.trim()).map(Self).map_err(|e| MoneyConversionError::InvalidAmount(format!("{s}. {e}")))
    }
}

impl Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl Money {
    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Rounds half-up (away from zero) to exactly two decimal places. `99` becomes `99.00`.
    pub fn rounded(self) -> Self {
        let mut value = self.0.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero);
        value.rescale(MONEY_SCALE);
        Self(value)
    }

    /// `unit_price × quantity`, rounded half-up to two decimal places.
    pub fn line_total(unit_price: Money, quantity: u32) -> Self {
        (unit_price * quantity).rounded()
    }

    /// Converts the amount into the smallest currency unit (paise, cents), rounding half-up.
    pub fn to_minor_units(&self) -> Result<i64, MoneyConversionError> {
        (self.0 * Decimal::ONE_HUNDRED)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_i64()
            .ok_or_else(|| MoneyConversionError::OutOfRange(self.0.to_string()))
    }
}

// Amounts are persisted as TEXT so that SQLite never coerces them into floating point.
impl Type<Sqlite> for Money {
    fn type_info() -> SqliteTypeInfo {
        <String as Type<Sqlite>>::type_info()
    }

    fn compatible(ty: &SqliteTypeInfo) -> bool {
        <String as Type<Sqlite>>::compatible(ty)
    }
}

impl<'q> Encode<'q, Sqlite> for Money {
    fn encode_by_ref(&self, buf: &mut Vec<SqliteArgumentValue<'q>>) -> IsNull {
        <String as Encode<'q, Sqlite>>::encode(self.0.to_string(), buf)
    }
}

impl<'r> Decode<'r, Sqlite> for Money {
    fn decode(value: SqliteValueRef<'r>) -> Result<Self, BoxDynError> {
        let s = <&str as Decode<'r, Sqlite>>::decode(value)?;
        let amount = Decimal::from_str(s)?;
        Ok(Self(amount))
    }
}

//! Black-Scholes delta model.
//!
//! The only pricing math in the system: first-order sensitivity of one option
//! to the underlying. Inputs and outputs are `Decimal`; the interior is
//! evaluated in `f64` because the log/sqrt/CDF chain has no exact decimal
//! form, then converted back at the boundary.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};
use std::fmt;
use std::str::FromStr;

use crate::engine::error::EngineError;

/// Side of the straddle an option belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionType {
    Call,
    Put,
}

impl FromStr for OptionType {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "call" => Ok(OptionType::Call),
            "put" => Ok(OptionType::Put),
            other => Err(EngineError::InvalidOptionType(other.to_string())),
        }
    }
}

impl fmt::Display for OptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionType::Call => write!(f, "call"),
            OptionType::Put => write!(f, "put"),
        }
    }
}

/// Black-Scholes delta of a European option.
///
/// Returns exactly zero when `time_to_expiry_years` or `implied_vol` is
/// non-positive. That is deliberate policy for degenerate rows near expiry,
/// not an approximation of the true limit.
pub fn delta(
    spot: Decimal,
    strike: Decimal,
    time_to_expiry_years: Decimal,
    risk_free_rate: Decimal,
    implied_vol: Decimal,
    option_type: OptionType,
) -> Result<Decimal, EngineError> {
    if time_to_expiry_years <= Decimal::ZERO || implied_vol <= Decimal::ZERO {
        return Ok(Decimal::ZERO);
    }
    if spot <= Decimal::ZERO || strike <= Decimal::ZERO {
        return Err(EngineError::DeltaFailed(format!(
            "spot {spot} and strike {strike} must both be positive"
        )));
    }

    let s = to_f64(spot, "spot")?;
    let k = to_f64(strike, "strike")?;
    let t = to_f64(time_to_expiry_years, "time to expiry")?;
    let r = to_f64(risk_free_rate, "risk-free rate")?;
    let iv = to_f64(implied_vol, "implied vol")?;

    let d1 = ((s / k).ln() + (r + 0.5 * iv * iv) * t) / (iv * t.sqrt());
    if !d1.is_finite() {
        return Err(EngineError::DeltaFailed(format!(
            "d1 is not finite for spot {spot}, strike {strike}, T {time_to_expiry_years}, iv {implied_vol}"
        )));
    }

    let normal = Normal::new(0.0, 1.0)
        .map_err(|e| EngineError::DeltaFailed(format!("standard normal: {e}")))?;
    let n_d1 = Decimal::from_f64(normal.cdf(d1))
        .ok_or_else(|| EngineError::DeltaFailed(format!("N(d1) for d1 {d1} is not representable")))?;

    // Subtracting in decimal keeps put-call delta parity exact.
    Ok(match option_type {
        OptionType::Call => n_d1,
        OptionType::Put => n_d1 - Decimal::ONE,
    })
}

fn to_f64(value: Decimal, name: &str) -> Result<f64, EngineError> {
    value
        .to_f64()
        .filter(|v| v.is_finite())
        .ok_or_else(|| EngineError::DeltaFailed(format!("{name} {value} is not representable")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn call_delta(spot: Decimal, strike: Decimal, t: Decimal, iv: Decimal) -> Decimal {
        delta(spot, strike, t, Decimal::ZERO, iv, OptionType::Call).unwrap()
    }

    fn put_delta(spot: Decimal, strike: Decimal, t: Decimal, iv: Decimal) -> Decimal {
        delta(spot, strike, t, Decimal::ZERO, iv, OptionType::Put).unwrap()
    }

    #[test]
    fn test_call_delta_in_unit_interval() {
        for spot in [dec!(50), dec!(90), dec!(100), dec!(110), dec!(200)] {
            let d = call_delta(spot, dec!(100), dec!(0.25), dec!(0.6));
            assert!(d >= Decimal::ZERO && d <= Decimal::ONE, "call delta {d} for spot {spot}");
        }
    }

    #[test]
    fn test_put_delta_in_negative_unit_interval() {
        for spot in [dec!(50), dec!(90), dec!(100), dec!(110), dec!(200)] {
            let d = put_delta(spot, dec!(100), dec!(0.25), dec!(0.6));
            assert!(d >= dec!(-1) && d <= Decimal::ZERO, "put delta {d} for spot {spot}");
        }
    }

    #[test]
    fn test_put_call_delta_parity() {
        let call = call_delta(dec!(123.45), dec!(100), dec!(0.1), dec!(0.8));
        let put = put_delta(dec!(123.45), dec!(100), dec!(0.1), dec!(0.8));
        assert_eq!(call - put, Decimal::ONE);
    }

    #[test]
    fn test_atm_call_delta_near_half() {
        // At the money with modest vol and time, delta sits just above 0.5.
        let d = call_delta(dec!(100), dec!(100), dec!(0.0822), dec!(0.5));
        assert!(d > dec!(0.5) && d < dec!(0.56), "got {d}");
    }

    #[test]
    fn test_degenerate_time_and_vol_return_exact_zero() {
        assert_eq!(call_delta(dec!(100), dec!(100), Decimal::ZERO, dec!(0.5)), Decimal::ZERO);
        assert_eq!(put_delta(dec!(100), dec!(100), dec!(-0.1), dec!(0.5)), Decimal::ZERO);
        assert_eq!(call_delta(dec!(100), dec!(100), dec!(0.25), Decimal::ZERO), Decimal::ZERO);
        assert_eq!(put_delta(dec!(100), dec!(100), dec!(0.25), dec!(-0.2)), Decimal::ZERO);
    }

    #[test]
    fn test_deep_itm_call_approaches_one() {
        let d = call_delta(dec!(1000), dec!(100), dec!(0.05), dec!(0.3));
        assert!(d > dec!(0.999), "got {d}");
    }

    #[test]
    fn test_non_positive_spot_is_error() {
        let err = delta(
            Decimal::ZERO,
            dec!(100),
            dec!(0.25),
            Decimal::ZERO,
            dec!(0.5),
            OptionType::Call,
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::DeltaFailed(_)));
    }

    #[test]
    fn test_option_type_parsing() {
        assert_eq!("call".parse::<OptionType>().unwrap(), OptionType::Call);
        assert_eq!("PUT".parse::<OptionType>().unwrap(), OptionType::Put);
        assert_eq!(" Call ".parse::<OptionType>().unwrap(), OptionType::Call);

        let err = "straddle".parse::<OptionType>().unwrap_err();
        assert_eq!(err, EngineError::InvalidOptionType("straddle".to_string()));
    }
}

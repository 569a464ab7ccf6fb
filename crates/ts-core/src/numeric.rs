use crate::{TsError, TsResult};

pub fn ensure_finite(v: f64, what: &'static str) -> TsResult<f64> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(TsError::NonFinite { what, value: v })
    }
}

/// Finite and strictly greater than zero.
pub fn ensure_positive(v: f64, what: &'static str) -> TsResult<f64> {
    let v = ensure_finite(v, what)?;
    if v > 0.0 {
        Ok(v)
    } else {
        Err(TsError::NotPositive { what, value: v })
    }
}

/// Finite and not below zero.
pub fn ensure_non_negative(v: f64, what: &'static str) -> TsResult<f64> {
    let v = ensure_finite(v, what)?;
    if v >= 0.0 {
        Ok(v)
    } else {
        Err(TsError::Negative { what, value: v })
    }
}

/// Clamp that maps NaN to `fallback` instead of propagating it.
pub fn clamp_or(v: f64, lo: f64, hi: f64, fallback: f64) -> f64 {
    if v.is_nan() { fallback } else { v.clamp(lo, hi) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_finite_detects_nan() {
        let err = ensure_finite(f64::NAN, "test").unwrap_err();
        let msg = format!("{err}");
        assert!(msg.contains("Non-finite"));
    }

    #[test]
    fn ensure_positive_rejects_zero_and_negative() {
        assert!(ensure_positive(0.1, "c").is_ok());
        assert!(matches!(
            ensure_positive(0.0, "c"),
            Err(TsError::NotPositive { .. })
        ));
        assert!(ensure_positive(-1.0, "c").is_err());
        assert!(matches!(
            ensure_positive(f64::INFINITY, "c"),
            Err(TsError::NonFinite { .. })
        ));
    }

    #[test]
    fn ensure_non_negative_allows_zero() {
        assert_eq!(ensure_non_negative(0.0, "v").unwrap(), 0.0);
        assert!(matches!(
            ensure_non_negative(-1e-9, "v"),
            Err(TsError::Negative { .. })
        ));
    }

    #[test]
    fn clamp_or_handles_nan() {
        assert_eq!(clamp_or(f64::NAN, 0.0, 14.0, 7.0), 7.0);
        assert_eq!(clamp_or(-3.0, 0.0, 14.0, 7.0), 0.0);
        assert_eq!(clamp_or(f64::INFINITY, 0.0, 14.0, 7.0), 14.0);
    }
}

//! Math functions

use crate::error::{FormulaError, FormulaResult};

/// ABS(x)
pub fn fn_abs(args: &[f64]) -> FormulaResult<f64> {
    Ok(args[0].abs())
}

/// ROUND(x, [digits]) - Rounds half away from zero
///
/// `digits` defaults to 0 and may be negative (`round(1234, -2)` is 1200).
pub fn fn_round(args: &[f64]) -> FormulaResult<f64> {
    let value = args[0];
    let digits = args.get(1).copied().unwrap_or(0.0);

    if digits.fract() != 0.0 || digits.abs() > 15.0 {
        return Err(FormulaError::Argument {
            function: "round".to_string(),
            message: format!("digits must be a whole number between -15 and 15, got {}", digits),
        });
    }

    let factor = 10f64.powi(digits as i32);
    Ok((value * factor).round() / factor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round() {
        assert_eq!(fn_round(&[2.5]).unwrap(), 3.0);
        assert_eq!(fn_round(&[-2.5]).unwrap(), -3.0);
        assert_eq!(fn_round(&[12.346, 1.0]).unwrap(), 12.3);
        assert_eq!(fn_round(&[1234.0, -2.0]).unwrap(), 1200.0);
        assert!(fn_round(&[1.0, 0.5]).is_err());
    }
}

//! Aggregate functions over their arguments

use crate::error::FormulaResult;

/// AVG(a, b, ...) - Arithmetic mean of the arguments
pub fn fn_avg(args: &[f64]) -> FormulaResult<f64> {
    let sum: f64 = args.iter().sum();
    Ok(sum / args.len() as f64)
}

/// MIN(a, b, ...)
pub fn fn_min(args: &[f64]) -> FormulaResult<f64> {
    Ok(args.iter().copied().fold(f64::INFINITY, f64::min))
}

/// MAX(a, b, ...)
pub fn fn_max(args: &[f64]) -> FormulaResult<f64> {
    Ok(args.iter().copied().fold(f64::NEG_INFINITY, f64::max))
}

/// SUM(a, b, ...)
pub fn fn_sum(args: &[f64]) -> FormulaResult<f64> {
    Ok(args.iter().sum())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_avg() {
        assert_eq!(fn_avg(&[2.0, 4.0, 6.0]).unwrap(), 4.0);
        assert_eq!(fn_avg(&[7.5]).unwrap(), 7.5);
    }

    #[test]
    fn test_min_max() {
        assert_eq!(fn_min(&[1.0, 9.0, 3.0]).unwrap(), 1.0);
        assert_eq!(fn_max(&[1.0, 9.0, 3.0]).unwrap(), 9.0);
        assert_eq!(fn_max(&[-4.0, -2.0]).unwrap(), -2.0);
    }
}

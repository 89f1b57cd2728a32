//! Numerically stable primitives for softmax-style normalizers.

/// Stable log(sum(exp(values))).
///
/// Returns NEG_INFINITY for empty input or all -inf inputs.
pub fn log_sum_exp(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NEG_INFINITY;
    }
    if values.iter().any(|v| v.is_nan()) {
        return f64::NAN;
    }
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if max == f64::NEG_INFINITY {
        return f64::NEG_INFINITY;
    }
    if max == f64::INFINITY {
        return f64::INFINITY;
    }
    let mut sum = 0.0;
    for v in values {
        sum += (*v - max).exp();
    }
    max + sum.ln()
}

/// Stable log(exp(a) + exp(b)).
pub fn log_add_exp(a: f64, b: f64) -> f64 {
    if a.is_nan() || b.is_nan() {
        return f64::NAN;
    }
    if a == f64::NEG_INFINITY {
        return b;
    }
    if b == f64::NEG_INFINITY {
        return a;
    }
    if a == f64::INFINITY || b == f64::INFINITY {
        return f64::INFINITY;
    }
    let m = a.max(b);
    let diff = (a - b).abs();
    m + (-diff).exp().ln_1p()
}

/// Exponentiate `scores` in place with max-subtraction and return the sum.
///
/// The returned sum is the partition value rescaled by exp(-max); ratios
/// exp[i]/sum are unchanged, which is all a softmax consumer ever reads.
/// Returns 0.0 for empty input.
pub fn softmax_shifted(scores: &[f64], out: &mut [f64]) -> f64 {
    debug_assert_eq!(scores.len(), out.len());
    if scores.is_empty() {
        return 0.0;
    }
    let max = scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let mut sum = 0.0;
    for (o, s) in out.iter_mut().zip(scores.iter()) {
        *o = (s - max).exp();
        sum += *o;
    }
    sum
}

/// Squared L2 norm.
pub fn two_norm_squared(v: &[f64]) -> f64 {
    v.iter().map(|x| x * x).sum()
}

/// Dot product of two equal-length slices.
pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
        if a.is_nan() || b.is_nan() {
            return false;
        }
        (a - b).abs() <= tol
    }

    #[test]
    fn log_sum_exp_basic() {
        let v = [0.0, 0.0];
        assert!(approx_eq(log_sum_exp(&v), 2.0f64.ln(), 1e-12));
    }

    #[test]
    fn log_sum_exp_dominance() {
        let v = [-1000.0, 0.0];
        assert!(approx_eq(log_sum_exp(&v), 0.0, 1e-12));
    }

    #[test]
    fn log_sum_exp_all_neg_inf() {
        let v = [f64::NEG_INFINITY, f64::NEG_INFINITY];
        let out = log_sum_exp(&v);
        assert!(out.is_infinite() && out.is_sign_negative());
    }

    #[test]
    fn log_add_exp_matches_lse() {
        let a = 1.234;
        let b = -0.75;
        assert!(approx_eq(log_add_exp(a, b), log_sum_exp(&[a, b]), 1e-12));
    }

    #[test]
    fn softmax_shifted_handles_overflow_scale() {
        let scores = [800.0, 801.0, 799.0];
        let mut out = [0.0; 3];
        let sum = softmax_shifted(&scores, &mut out);
        assert!(sum.is_finite() && sum > 0.0);
        // Ratios must match the unshifted softmax computed in log space.
        let p1 = out[1] / sum;
        let expected = (801.0 - log_sum_exp(&scores)).exp();
        assert!(approx_eq(p1, expected, 1e-12));
    }

    #[test]
    fn softmax_shifted_empty() {
        let mut out = [];
        assert_eq!(softmax_shifted(&[], &mut out), 0.0);
    }

    #[test]
    fn dot_and_norm() {
        assert!(approx_eq(dot(&[1.0, 2.0], &[3.0, 4.0]), 11.0, 1e-12));
        assert!(approx_eq(two_norm_squared(&[3.0, 4.0]), 25.0, 1e-12));
    }

    proptest! {
        #[test]
        fn log_sum_exp_ge_max(v in proptest::collection::vec(-500.0f64..500.0, 1..20)) {
            let max = v.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            let lse = log_sum_exp(&v);
            prop_assert!(lse >= max - 1e-9);
            prop_assert!(lse <= max + (v.len() as f64).ln() + 1e-9);
        }

        #[test]
        fn softmax_shifted_sums_to_one(v in proptest::collection::vec(-50.0f64..50.0, 1..20)) {
            let mut out = vec![0.0; v.len()];
            let sum = softmax_shifted(&v, &mut out);
            let total: f64 = out.iter().map(|e| e / sum).sum();
            prop_assert!((total - 1.0).abs() < 1e-9);
        }
    }
}

//! Sum and threshold-filter kernels over `f64` slices, with an AVX2 path on
//! x86_64 and a scalar fallback everywhere else.

#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::{
    _CMP_GT_OQ, _mm256_add_pd, _mm256_cmp_pd, _mm256_loadu_pd, _mm256_movemask_pd,
    _mm256_set1_pd, _mm256_setzero_pd, _mm256_storeu_pd,
};

/// Sum of `values` using AVX2 or scalar fallback
pub fn sum_f64(values: &[f64]) -> f64 {
    #[cfg(target_arch = "x86_64")]
    {
        if is_x86_feature_detected!("avx2") {
            return unsafe { sum_f64_avx2(values) };
        }
    }
    sum_f64_scalar(values)
}

fn sum_f64_scalar(values: &[f64]) -> f64 {
    values.iter().sum()
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
unsafe fn sum_f64_avx2(values: &[f64]) -> f64 {
    const LANES: usize = 4; // __m256d holds 4 f64s
    let mut sum = _mm256_setzero_pd();

    let chunks = values.chunks_exact(LANES);
    let remainder = chunks.remainder();

    for chunk in chunks {
        let v = unsafe { _mm256_loadu_pd(chunk.as_ptr()) };
        sum = _mm256_add_pd(sum, v);
    }

    let mut sum_arr = [0f64; LANES];
    unsafe { _mm256_storeu_pd(sum_arr.as_mut_ptr(), sum) };

    sum_arr.iter().sum::<f64>() + remainder.iter().sum::<f64>()
}

/// Indices of the values strictly greater than `threshold`, each shifted by
/// `base`. NaN never matches.
pub fn filter_gt_f64(values: &[f64], threshold: f64, base: usize) -> Vec<usize> {
    #[cfg(target_arch = "x86_64")]
    {
        if is_x86_feature_detected!("avx2") {
            return unsafe { filter_gt_f64_avx2(values, threshold, base) };
        }
    }
    filter_gt_f64_scalar(values, threshold, base)
}

fn filter_gt_f64_scalar(values: &[f64], threshold: f64, base: usize) -> Vec<usize> {
    values
        .iter()
        .enumerate()
        .filter_map(|(i, &v)| (v > threshold).then_some(base + i))
        .collect()
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
unsafe fn filter_gt_f64_avx2(values: &[f64], threshold: f64, base: usize) -> Vec<usize> {
    const LANES: usize = 4; // __m256d holds 4 f64
    let mut out = Vec::new();

    let chunks = values.chunks_exact(LANES);
    let remainder = chunks.remainder();
    let t = _mm256_set1_pd(threshold);

    for (chunk_idx, chunk) in chunks.enumerate() {
        let v = unsafe { _mm256_loadu_pd(chunk.as_ptr()) };
        let mask_bits = _mm256_movemask_pd(_mm256_cmp_pd(v, t, _CMP_GT_OQ));
        for i in 0..LANES {
            if (mask_bits & (1 << i)) != 0 {
                out.push(base + chunk_idx * LANES + i);
            }
        }
    }

    let tail_start = values.len() - remainder.len();
    for (i, &v) in remainder.iter().enumerate() {
        if v > threshold {
            out.push(base + tail_start + i);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<f64> {
        (0..37).map(|i| (i as f64) * 2.75 - 10.0).collect()
    }

    #[test]
    fn test_filter_matches_scalar() {
        let values = sample();
        for threshold in [-20.0, 0.0, 12.5, 13.0, 200.0] {
            assert_eq!(
                filter_gt_f64(&values, threshold, 100),
                filter_gt_f64_scalar(&values, threshold, 100)
            );
        }
    }

    #[test]
    fn test_filter_is_strict_and_offset() {
        assert_eq!(filter_gt_f64(&[1.0, 4.0, 5.0, 9.0, 4.0], 4.0, 10), vec![12, 13]);
    }

    #[test]
    fn test_filter_skips_nan() {
        assert_eq!(
            filter_gt_f64(&[f64::NAN, 5.0, f64::NAN, 6.0, 7.0], 0.0, 0),
            vec![1, 3, 4]
        );
    }

    #[test]
    fn test_sum_matches_scalar() {
        let values = sample();
        let fast = sum_f64(&values);
        let slow = sum_f64_scalar(&values);
        assert!((fast - slow).abs() < 1e-9, "{fast} vs {slow}");
        assert_eq!(sum_f64(&[]), 0.0);
        assert_eq!(sum_f64(&[3.0, 1.0]), 4.0);
    }
}

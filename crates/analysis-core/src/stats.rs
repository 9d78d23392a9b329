//! Small numeric helpers shared by every engine.
//!
//! All helpers are total: degenerate inputs (empty slices, zero denominators)
//! map to a documented safe value instead of NaN or infinity.

use statrs::statistics::Statistics;

/// Arithmetic mean, 0.0 for an empty slice.
pub fn mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    data.iter().mean()
}

/// Sample standard deviation (Bessel's correction), 0.0 for fewer than two values.
pub fn std_dev(data: &[f64]) -> f64 {
    if data.len() < 2 {
        return 0.0;
    }
    data.iter().std_dev()
}

/// Peer-universe standard deviation used as a z-score denominator.
///
/// A single-element universe or a zero spread yields 1.0 so the z-score
/// degenerates to a plain distance from the mean.
pub fn peer_std_dev(data: &[f64]) -> f64 {
    let sd = std_dev(data);
    if data.len() < 2 || sd == 0.0 || !sd.is_finite() {
        1.0
    } else {
        sd
    }
}

/// Standardize `value` against a precomputed mean and deviation.
/// Returns 0.0 if `std_dev` is zero.
pub fn z_score(value: f64, mean: f64, std_dev: f64) -> f64 {
    if std_dev == 0.0 {
        return 0.0;
    }
    (value - mean) / std_dev
}

/// Divide, falling back to `default` when the denominator is zero.
pub fn safe_divide(numerator: f64, denominator: f64, default: f64) -> f64 {
    if denominator == 0.0 {
        return default;
    }
    numerator / denominator
}

/// Percentage growth from `previous` to `current`; 0.0 when `previous` is zero.
pub fn growth_rate(current: f64, previous: f64) -> f64 {
    if previous == 0.0 {
        return 0.0;
    }
    ((current - previous) / previous) * 100.0
}

/// Percentage change that reports `None` instead of dividing by zero.
pub fn percent_change(current: f64, base: f64) -> Option<f64> {
    if base == 0.0 {
        None
    } else {
        Some(((current - base) / base) * 100.0)
    }
}

/// Linearly rescale `value` from `[min_val, max_val]` onto 0-100, clamped.
/// A degenerate range maps to the neutral midpoint 50.
pub fn normalize_score(value: f64, min_val: f64, max_val: f64) -> f64 {
    if max_val == min_val {
        return 50.0;
    }
    let normalized = ((value - min_val) / (max_val - min_val)) * 100.0;
    normalized.clamp(0.0, 100.0)
}

/// Coefficient of variation (sample std-dev / mean).
/// 0.0 when fewer than two values or the mean is zero.
pub fn coefficient_of_variation(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    if m == 0.0 {
        return 0.0;
    }
    std_dev(values) / m
}

/// Round to `places` decimal places for presentation.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

//! GHI banding.

use crate::domain::GhiBand;

/// Upper (exclusive) thresholds for `VeryLow`, `Low`, `High`.
pub const GHI_BAND_THRESHOLDS: [f64; 3] = [2.0, 4.0, 6.0];

/// Categorize a GHI value; first matching threshold wins.
///
/// Missing or non-numeric (`NaN`) values are `Unknown`.
pub fn ghi_band(ghi: Option<f64>) -> GhiBand {
    let Some(v) = ghi.filter(|v| !v.is_nan()) else {
        return GhiBand::Unknown;
    };
    let [very_low, low, high] = GHI_BAND_THRESHOLDS;
    if v < very_low {
        GhiBand::VeryLow
    } else if v < low {
        GhiBand::Low
    } else if v < high {
        GhiBand::High
    } else {
        GhiBand::VeryHigh
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thresholds_are_lower_inclusive() {
        assert_eq!(ghi_band(Some(1.999)), GhiBand::VeryLow);
        assert_eq!(ghi_band(Some(2.0)), GhiBand::Low);
        assert_eq!(ghi_band(Some(4.0)), GhiBand::High);
        assert_eq!(ghi_band(Some(6.0)), GhiBand::VeryHigh);
        assert_eq!(ghi_band(Some(11.5)), GhiBand::VeryHigh);
        assert_eq!(ghi_band(Some(-0.5)), GhiBand::VeryLow);
    }

    #[test]
    fn missing_is_unknown() {
        assert_eq!(ghi_band(None), GhiBand::Unknown);
        assert_eq!(ghi_band(Some(f64::NAN)), GhiBand::Unknown);
    }
}

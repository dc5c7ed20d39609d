// =============================================================================
// Volume Trend
// =============================================================================
//
// Classifies the latest volume against its 7-period simple average (a window
// that includes the latest point itself):
//
//   ratio > 1.2  => INCREASING
//   ratio < 0.8  => DECREASING
//   otherwise    => STABLE
//
// Rising volume confirms whichever direction price is moving; the analyzer
// uses the classification as a score modifier, not a signal of its own.
// =============================================================================

use serde::{Deserialize, Serialize};

use super::moving_average;
use crate::types::VolumeTrend;

/// Window for the volume average.
const PERIOD: usize = 7;

/// Latest volume, its recent average, and the resulting classification.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct VolumeAnalysis {
    pub current_volume: f64,
    pub average_volume: f64,
    pub trend: VolumeTrend,
}

impl VolumeAnalysis {
    /// Neutral analysis used when no volume series is available.
    pub fn absent() -> Self {
        Self {
            current_volume: 0.0,
            average_volume: 0.0,
            trend: VolumeTrend::Stable,
        }
    }
}

/// Classify the latest volume against its trailing average.
///
/// # Edge cases
/// - fewer than 7 points => STABLE, with the latest value (0.0 when empty)
///   reported as both current and average
/// - zero average (all-zero window) => STABLE, division guard
pub fn analyze(volumes: &[f64]) -> VolumeAnalysis {
    if volumes.len() < PERIOD {
        let last = volumes.last().copied().unwrap_or(0.0);
        return VolumeAnalysis {
            current_volume: last,
            average_volume: last,
            trend: VolumeTrend::Stable,
        };
    }

    let current_volume = volumes[volumes.len() - 1];
    let average_volume = moving_average::simple(volumes, PERIOD);

    let trend = if average_volume == 0.0 {
        VolumeTrend::Stable
    } else {
        let ratio = current_volume / average_volume;
        if ratio > 1.2 {
            VolumeTrend::Increasing
        } else if ratio < 0.8 {
            VolumeTrend::Decreasing
        } else {
            VolumeTrend::Stable
        }
    };

    VolumeAnalysis {
        current_volume,
        average_volume,
        trend,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analyze_empty_input() {
        let v = analyze(&[]);
        assert_eq!(v.current_volume, 0.0);
        assert_eq!(v.average_volume, 0.0);
        assert_eq!(v.trend, VolumeTrend::Stable);
    }

    #[test]
    fn analyze_short_series_is_stable() {
        let v = analyze(&[100.0, 300.0]);
        assert_eq!(v.current_volume, 300.0);
        assert_eq!(v.average_volume, 300.0);
        assert_eq!(v.trend, VolumeTrend::Stable);
    }

    #[test]
    fn analyze_spike_is_increasing() {
        // Average over [100 x6, 200] is 700/7 = 114.3; ratio ≈ 1.75.
        let volumes = vec![100.0, 100.0, 100.0, 100.0, 100.0, 100.0, 200.0];
        let v = analyze(&volumes);
        assert_eq!(v.trend, VolumeTrend::Increasing);
        assert_eq!(v.current_volume, 200.0);
    }

    #[test]
    fn analyze_dropoff_is_decreasing() {
        let volumes = vec![100.0, 100.0, 100.0, 100.0, 100.0, 100.0, 50.0];
        let v = analyze(&volumes);
        assert_eq!(v.trend, VolumeTrend::Decreasing);
    }

    #[test]
    fn analyze_steady_is_stable() {
        let volumes = vec![100.0; 10];
        let v = analyze(&volumes);
        assert_eq!(v.trend, VolumeTrend::Stable);
        assert!((v.average_volume - 100.0).abs() < 1e-10);
    }

    #[test]
    fn analyze_zero_volume_is_stable() {
        let volumes = vec![0.0; 10];
        assert_eq!(analyze(&volumes).trend, VolumeTrend::Stable);
    }
}

//! Distance metrics over correction samples.
//!
//! Both metrics are weighted Euclidean distances. Corrections are scaled by
//! one week and slopes by one week squared so that, with unit weights, a
//! correction step of one second weighs like a week of time separation.

use super::types::{MetricWeights, WEEK_SECONDS};

/// A correction sample projected into clustering feature space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeaturePoint {
    /// Seconds since the Unix epoch.
    pub time: f64,
    /// Clock error in seconds.
    pub value: f64,
    /// Local slope, seconds per second.
    pub slope: f64,
}

impl FeaturePoint {
    /// Create a feature point.
    pub fn new(time: f64, value: f64, slope: f64) -> Self {
        Self { time, value, slope }
    }
}

/// Trait for clustering distance metrics.
pub trait DistanceMetric: Send + Sync {
    /// Name of this metric.
    fn name(&self) -> &str;

    /// Distance between two points, in weighted seconds.
    fn distance(&self, a: &FeaturePoint, b: &FeaturePoint) -> f64;
}

/// Time and correction separation.
#[derive(Debug, Clone, Copy)]
pub struct TimeValueMetric {
    weights: MetricWeights,
}

impl TimeValueMetric {
    pub fn new(weights: MetricWeights) -> Self {
        Self { weights }
    }
}

impl DistanceMetric for TimeValueMetric {
    fn name(&self) -> &str {
        "time-value"
    }

    fn distance(&self, a: &FeaturePoint, b: &FeaturePoint) -> f64 {
        let dt = self.weights.time * (a.time - b.time);
        let dv = self.weights.value * WEEK_SECONDS * (a.value - b.value);
        dt.hypot(dv)
    }
}

/// Time, correction and local-slope separation.
#[derive(Debug, Clone, Copy)]
pub struct TimeValueSlopeMetric {
    weights: MetricWeights,
}

impl TimeValueSlopeMetric {
    pub fn new(weights: MetricWeights) -> Self {
        Self { weights }
    }
}

impl DistanceMetric for TimeValueSlopeMetric {
    fn name(&self) -> &str {
        "time-value-slope"
    }

    fn distance(&self, a: &FeaturePoint, b: &FeaturePoint) -> f64 {
        let dt = self.weights.time * (a.time - b.time);
        let dv = self.weights.value * WEEK_SECONDS * (a.value - b.value);
        let ds = self.weights.slope * WEEK_SECONDS * WEEK_SECONDS * (a.slope - b.slope);
        (dt * dt + dv * dv + ds * ds).sqrt()
    }
}

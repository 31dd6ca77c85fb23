//! Image severity estimation.
//!
//! The engine never fetches or decodes images. An [`ImageSeverityEstimator`] looks at the opaque
//! image reference and returns a bounded boost; the random estimator stands in for a vision
//! classifier until one is integrated.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// Bounded score boost attributed to a report's image.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageBoost {
    None,
    Moderate,
    High,
}

impl ImageBoost {
    pub fn value(self) -> f64 {
        match self {
            ImageBoost::None => 0.0,
            ImageBoost::Moderate => 0.5,
            ImageBoost::High => 1.0,
        }
    }

    /// Map a uniform draw in [0, 1) to a boost: above 0.7 is high, above 0.4 moderate.
    pub fn from_draw(draw: f64) -> Self {
        if draw > 0.7 {
            ImageBoost::High
        } else if draw > 0.4 {
            ImageBoost::Moderate
        } else {
            ImageBoost::None
        }
    }
}

/// Replaceable strategy for the image term of the severity score.
pub trait ImageSeverityEstimator: Send + Sync + std::fmt::Debug {
    fn estimate(&self, image_ref: &str) -> ImageBoost;
}

/// Deterministic default: images never change the score.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoImageBoost;

impl ImageSeverityEstimator for NoImageBoost {
    fn estimate(&self, _image_ref: &str) -> ImageBoost {
        ImageBoost::None
    }
}

/// Always returns the same boost.
#[derive(Clone, Copy, Debug)]
pub struct FixedImageBoost(pub ImageBoost);

impl ImageSeverityEstimator for FixedImageBoost {
    fn estimate(&self, _image_ref: &str) -> ImageBoost {
        self.0
    }
}

/// Simulated vision classifier drawing a uniform random number per image.
#[derive(Debug)]
pub struct RandomImageEstimator {
    rng: Mutex<StdRng>,
}

impl RandomImageEstimator {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Reproducible sequence of draws, for replays.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Default for RandomImageEstimator {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageSeverityEstimator for RandomImageEstimator {
    fn estimate(&self, image_ref: &str) -> ImageBoost {
        let draw: f64 = {
            let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            rng.gen()
        };
        let boost = ImageBoost::from_draw(draw);
        tracing::debug!(image_ref, draw, ?boost, "simulated image severity");
        boost
    }
}

/// Pick an estimator by name: `none` (default) or `random`.
///
/// # Errors
///
/// Returns `IntakeError::Config` for any other name.
pub fn estimator_from_env_value(
    value: Option<String>,
) -> crate::IntakeResult<std::sync::Arc<dyn ImageSeverityEstimator>> {
    let name = value
        .map(|v| v.trim().to_lowercase())
        .filter(|v| !v.is_empty());
    match name.as_deref() {
        None | Some("none") => Ok(std::sync::Arc::new(NoImageBoost)),
        Some("random") => Ok(std::sync::Arc::new(RandomImageEstimator::new())),
        Some(other) => Err(crate::IntakeError::Config(format!(
            "unknown image estimator '{other}' (expected 'none' or 'random')"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draw_thresholds() {
        assert_eq!(ImageBoost::from_draw(0.0), ImageBoost::None);
        assert_eq!(ImageBoost::from_draw(0.4), ImageBoost::None);
        assert_eq!(ImageBoost::from_draw(0.41), ImageBoost::Moderate);
        assert_eq!(ImageBoost::from_draw(0.7), ImageBoost::Moderate);
        assert_eq!(ImageBoost::from_draw(0.71), ImageBoost::High);
    }

    #[test]
    fn test_seeded_estimator_is_reproducible() {
        let a = RandomImageEstimator::seeded(7);
        let b = RandomImageEstimator::seeded(7);
        let first: Vec<_> = (0..20).map(|_| a.estimate("img")).collect();
        let second: Vec<_> = (0..20).map(|_| b.estimate("img")).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_random_estimator_stays_bounded() {
        let estimator = RandomImageEstimator::seeded(42);
        for _ in 0..200 {
            let v = estimator.estimate("img").value();
            assert!((0.0..=1.0).contains(&v));
        }
    }

    #[test]
    fn test_estimator_from_env_value() {
        assert!(estimator_from_env_value(None).is_ok());
        assert!(estimator_from_env_value(Some("Random".into())).is_ok());
        assert!(estimator_from_env_value(Some("vision".into())).is_err());
    }
}

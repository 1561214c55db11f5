//! Color quantization: reduce a [`SampleCollection`] to a handful of
//! representative colors.
//!
//! Both quantizers sit behind the narrow [`Quantizer`] trait so callers (and
//! tests) can swap a seeded variant in without touching the renderer.

mod kmeans;
mod lab;

pub use kmeans::KMeans;
pub use lab::LabKMeans;

use crate::color::Color;
use crate::config::{ColorSpace, Config};
use crate::error::Result;
use crate::sampler::SampleCollection;

/// Ordered representative colors. Order is cluster index order, not sorted
/// by population or luminance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Palette {
    colors: Vec<Color>,
    populations: Vec<usize>,
}

impl Palette {
    /// Palette with unknown populations (all zero).
    pub fn from_colors(colors: Vec<Color>) -> Self {
        let populations = vec![0; colors.len()];
        Self { colors, populations }
    }

    pub(crate) fn with_populations(colors: Vec<Color>, populations: Vec<usize>) -> Self {
        debug_assert_eq!(colors.len(), populations.len());
        Self { colors, populations }
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn colors(&self) -> &[Color] {
        &self.colors
    }

    pub fn iter(&self) -> impl Iterator<Item = &Color> {
        self.colors.iter()
    }

    /// Number of samples assigned to the color at `index`.
    pub fn population(&self, index: usize) -> usize {
        self.populations.get(index).copied().unwrap_or(0)
    }

    /// Share of all samples represented by the color at `index`, in `[0, 1]`.
    pub fn share(&self, index: usize) -> f32 {
        let total: usize = self.populations.iter().sum();
        if total == 0 {
            0.0
        } else {
            self.population(index) as f32 / total as f32
        }
    }

    /// Copy of this palette ordered by descending population.
    pub fn sorted_by_population(&self) -> Self {
        let mut order: Vec<usize> = (0..self.len()).collect();
        order.sort_by(|&a, &b| self.populations[b].cmp(&self.populations[a]));
        Self {
            colors: order.iter().map(|&i| self.colors[i]).collect(),
            populations: order.iter().map(|&i| self.populations[i]).collect(),
        }
    }
}

/// `cluster(samples, k) -> centroids`.
///
/// Implementations return at most `k` colors. A shorter palette means some
/// clusters ended up empty and were dropped; the length always equals the
/// number of non-empty clusters.
pub trait Quantizer: Send + Sync {
    fn cluster(&self, samples: &SampleCollection, k: usize) -> Result<Palette>;
}

/// Build the quantizer selected by `config.color_space`.
pub fn quantizer_for(config: &Config) -> Box<dyn Quantizer> {
    match config.color_space {
        ColorSpace::Rgb => Box::new(
            KMeans::new(config.clustering_max_iterations, config.max_reseed_attempts)
                .with_seed(config.seed),
        ),
        ColorSpace::Lab => Box::new(
            LabKMeans::new(config.clustering_max_iterations).with_seed(config.seed),
        ),
    }
}

/// Seed from `seed`, or draw one when absent.
fn resolve_seed(seed: Option<u64>) -> u64 {
    seed.unwrap_or_else(rand::random)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sorted_by_population() {
        let palette = Palette::with_populations(
            vec![Color::new(1, 1, 1), Color::new(2, 2, 2), Color::new(3, 3, 3)],
            vec![5, 50, 20],
        );
        let sorted = palette.sorted_by_population();
        assert_eq!(
            sorted.colors(),
            &[Color::new(2, 2, 2), Color::new(3, 3, 3), Color::new(1, 1, 1)]
        );
        assert_eq!(sorted.population(0), 50);
        assert!((palette.share(1) - 50.0 / 75.0).abs() < 1e-6);
    }

    #[test]
    fn test_share_without_populations() {
        let palette = Palette::from_colors(vec![Color::new(0, 0, 0)]);
        assert_eq!(palette.share(0), 0.0);
        assert_eq!(palette.population(7), 0);
    }
}

use std::collections::HashSet;

use kmeans_colors::get_kmeans;
use palette::{IntoColor, Lab, Srgb};

use super::{Palette, Quantizer, resolve_seed};
use crate::color::Color;
use crate::error::{PaletteError, Result};
use crate::sampler::SampleCollection;

const CONVERGE: f32 = 1e-4;

/// k-means in CIE Lab using `kmeans_colors`.
///
/// `k` is first clamped to the number of distinct colors. Clusters the
/// library leaves empty are dropped from the result, so the palette length
/// still equals the number of non-empty clusters.
#[derive(Clone, Debug)]
pub struct LabKMeans {
    max_iterations: usize,
    seed: Option<u64>,
}

impl LabKMeans {
    pub fn new(max_iterations: usize) -> Self {
        Self {
            max_iterations: max_iterations.max(1),
            seed: None,
        }
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }
}

impl Default for LabKMeans {
    fn default() -> Self {
        Self::new(300)
    }
}

impl Quantizer for LabKMeans {
    fn cluster(&self, samples: &SampleCollection, k: usize) -> Result<Palette> {
        if k < 1 {
            return Err(PaletteError::InvalidArgument(
                "palette size must be at least 1".to_string(),
            ));
        }
        if k > u8::MAX as usize + 1 {
            return Err(PaletteError::ResourceExceeded {
                what: "palette size",
                actual: k as u64,
                max: u8::MAX as u64 + 1,
            });
        }
        if samples.is_empty() {
            return Err(PaletteError::InvalidArgument(
                "cannot cluster an empty sample collection".to_string(),
            ));
        }

        let distinct = samples.iter().collect::<HashSet<_>>().len();
        let effective_k = k.min(distinct);
        if effective_k < k {
            tracing::warn!(requested = k, distinct, "Fewer distinct colors than requested");
        }

        let lab_pixels: Vec<Lab> = samples
            .iter()
            .map(|&c| Srgb::<u8>::from(c).into_linear().into_color())
            .collect();

        let kmeans = get_kmeans(
            effective_k,
            self.max_iterations,
            CONVERGE,
            false,
            &lab_pixels,
            resolve_seed(self.seed),
        );

        let mut counts = vec![0usize; kmeans.centroids.len()];
        for &idx in &kmeans.indices {
            counts[idx as usize] += 1;
        }

        let (colors, populations): (Vec<Color>, Vec<usize>) = kmeans
            .centroids
            .iter()
            .zip(counts)
            .filter(|&(_, n)| n > 0)
            .map(|(&lab, n)| {
                let rgb_f32: Srgb<f32> = Srgb::from_linear(lab.into_color());
                (Color::from(rgb_f32.into_format::<u8>()), n)
            })
            .unzip();

        tracing::debug!(score = kmeans.score, colors = colors.len(), "Lab k-means finished");
        Ok(Palette::with_populations(colors, populations))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Color, b: Color) -> bool {
        (a.r as i32 - b.r as i32).abs() <= 2
            && (a.g as i32 - b.g as i32).abs() <= 2
            && (a.b as i32 - b.b as i32).abs() <= 2
    }

    #[test]
    fn test_recovers_distinct_colors_approximately() {
        let targets = [Color::new(220, 40, 40), Color::new(30, 160, 60), Color::new(250, 240, 200)];
        let samples: SampleCollection = targets
            .iter()
            .flat_map(|&c| std::iter::repeat_n(c, 100))
            .collect();
        let palette = LabKMeans::default()
            .with_seed(Some(5))
            .cluster(&samples, 3)
            .unwrap();
        assert_eq!(palette.len(), 3);
        for t in targets {
            assert!(palette.iter().any(|&c| close(c, t)), "{t} missing from {palette:?}");
        }
    }

    #[test]
    fn test_single_color_clamps_k() {
        let samples: SampleCollection = std::iter::repeat_n(Color::new(12, 34, 56), 50).collect();
        let palette = LabKMeans::default()
            .with_seed(Some(1))
            .cluster(&samples, 5)
            .unwrap();
        assert_eq!(palette.len(), 1);
        assert!(close(palette.colors()[0], Color::new(12, 34, 56)));
        assert_eq!(palette.population(0), 50);
    }

    #[test]
    fn test_k0_is_invalid() {
        let samples: SampleCollection = std::iter::repeat_n(Color::new(0, 0, 0), 4).collect();
        assert!(LabKMeans::default().cluster(&samples, 0).is_err());
    }
}

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
#[cfg(feature = "parallel")]
use rayon::prelude::*;

use super::{Palette, Quantizer, resolve_seed};
use crate::color::Color;
use crate::error::{PaletteError, Result};
use crate::sampler::SampleCollection;

type Point = [f32; 3];

/// Iterative relocation (k-means) clustering in RGB space.
///
/// Seeding spreads the initial centroids over the observed colors (k-means++).
/// A cluster that goes empty is moved onto the sample farthest from every
/// other centroid; after `max_reseed_attempts` tries, or as soon as no sample
/// lies off the existing centroids, the cluster is dropped and the palette
/// comes back shorter than `k`.
#[derive(Clone, Debug)]
pub struct KMeans {
    max_iterations: usize,
    max_reseed_attempts: usize,
    seed: Option<u64>,
}

impl KMeans {
    pub fn new(max_iterations: usize, max_reseed_attempts: usize) -> Self {
        Self {
            max_iterations: max_iterations.max(1),
            max_reseed_attempts,
            seed: None,
        }
    }

    /// Fix the RNG seed so repeated runs give identical palettes.
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn seeded(seed: u64) -> Self {
        Self::default().with_seed(Some(seed))
    }
}

impl Default for KMeans {
    fn default() -> Self {
        Self::new(300, 10)
    }
}

impl Quantizer for KMeans {
    fn cluster(&self, samples: &SampleCollection, k: usize) -> Result<Palette> {
        if k < 1 {
            return Err(PaletteError::InvalidArgument(
                "palette size must be at least 1".to_string(),
            ));
        }
        if samples.is_empty() {
            return Err(PaletteError::InvalidArgument(
                "cannot cluster an empty sample collection".to_string(),
            ));
        }

        let points: Vec<Point> = samples.iter().map(|c| to_point(*c)).collect();
        let mut rng = StdRng::seed_from_u64(resolve_seed(self.seed));
        let centroids = seed_centroids(&points, k, &mut rng);
        Ok(self.run(&points, centroids))
    }
}

impl KMeans {
    /// Lloyd iterations from the given starting centroids, one cluster per
    /// centroid. `points` must not be empty.
    fn run(&self, points: &[Point], mut centroids: Vec<Point>) -> Palette {
        let k = centroids.len();
        let mut active = vec![true; k];
        let mut reseeds = vec![0usize; k];
        let mut assignments = vec![usize::MAX; points.len()];
        let mut stats = ClusterStats::default();

        for iteration in 0..self.max_iterations {
            let changed = assign(points, &centroids, &active, &mut assignments);
            stats = ClusterStats::accumulate(points, &assignments, k);

            let mut reseeded = false;
            for c in 0..k {
                if !active[c] {
                    continue;
                }
                if stats.counts[c] > 0 {
                    centroids[c] = stats.mean(c);
                    continue;
                }
                let candidate = if reseeds[c] < self.max_reseed_attempts {
                    farthest_sample(points, &centroids, &active, c)
                } else {
                    None
                };
                match candidate {
                    Some(p) => {
                        reseeds[c] += 1;
                        centroids[c] = p;
                        reseeded = true;
                        tracing::debug!(cluster = c, attempt = reseeds[c], "Reseeded empty cluster");
                    }
                    None => {
                        active[c] = false;
                        tracing::debug!(cluster = c, attempts = reseeds[c], "Dropped empty cluster");
                    }
                }
            }

            if changed == 0 && !reseeded {
                tracing::debug!(iterations = iteration + 1, "k-means converged");
                break;
            }
        }

        let (colors, populations): (Vec<Color>, Vec<usize>) = (0..k)
            .filter(|&c| active[c] && stats.counts[c] > 0)
            .map(|c| (Color::from_f32_clamped(stats.mean(c)), stats.counts[c]))
            .unzip();

        if colors.len() < k {
            tracing::warn!(
                requested = k,
                returned = colors.len(),
                "Fewer distinct clusters than requested, palette shortened"
            );
        }
        Palette::with_populations(colors, populations)
    }
}

fn to_point(c: Color) -> Point {
    [c.r as f32, c.g as f32, c.b as f32]
}

#[inline(always)]
fn dist2(a: &Point, b: &Point) -> f32 {
    let dr = a[0] - b[0];
    let dg = a[1] - b[1];
    let db = a[2] - b[2];
    dr * dr + dg * dg + db * db
}

/// k-means++: each further centroid is drawn with probability proportional to
/// its squared distance from the nearest centroid chosen so far. When every
/// sample already coincides with a centroid the first centroid is repeated;
/// the duplicate goes empty during iteration and is handled there.
fn seed_centroids(points: &[Point], k: usize, rng: &mut impl Rng) -> Vec<Point> {
    let mut centroids = Vec::with_capacity(k);
    centroids.push(points[rng.random_range(0..points.len())]);
    let mut nearest: Vec<f32> = points.iter().map(|p| dist2(p, &centroids[0])).collect();

    while centroids.len() < k {
        let total: f64 = nearest.iter().map(|&d| d as f64).sum();
        let next = if total > 0.0 {
            let mut target = rng.random::<f64>() * total;
            let mut chosen = nearest.iter().rposition(|&d| d > 0.0).unwrap_or(0);
            for (i, &d) in nearest.iter().enumerate() {
                target -= d as f64;
                if target < 0.0 {
                    chosen = i;
                    break;
                }
            }
            points[chosen]
        } else {
            centroids[0]
        };

        for (d, p) in nearest.iter_mut().zip(points) {
            *d = d.min(dist2(p, &next));
        }
        centroids.push(next);
    }
    centroids
}

fn nearest_centroid(p: &Point, centroids: &[Point], active: &[bool]) -> usize {
    let mut best = 0;
    let mut best_dist = f32::INFINITY;
    for (i, c) in centroids.iter().enumerate() {
        if !active[i] {
            continue;
        }
        let d = dist2(p, c);
        if d < best_dist {
            best_dist = d;
            best = i;
        }
    }
    best
}

/// Assign every point to its nearest active centroid, returning how many
/// assignments changed.
fn assign(points: &[Point], centroids: &[Point], active: &[bool], assignments: &mut [usize]) -> usize {
    let update = |(slot, p): (&mut usize, &Point)| {
        let nearest = nearest_centroid(p, centroids, active);
        let changed = *slot != nearest;
        *slot = nearest;
        changed as usize
    };

    #[cfg(feature = "parallel")]
    {
        assignments.par_iter_mut().zip(points.par_iter()).map(update).sum()
    }
    #[cfg(not(feature = "parallel"))]
    {
        assignments.iter_mut().zip(points.iter()).map(update).sum()
    }
}

/// Sample with the largest squared distance to its nearest active centroid,
/// ignoring cluster `skip`. `None` when every sample sits on a centroid.
fn farthest_sample(points: &[Point], centroids: &[Point], active: &[bool], skip: usize) -> Option<Point> {
    let mut best: Option<(f32, Point)> = None;
    for p in points {
        let d = centroids
            .iter()
            .enumerate()
            .filter(|&(i, _)| i != skip && active[i])
            .map(|(_, c)| dist2(p, c))
            .fold(f32::INFINITY, f32::min);
        if d > 0.0 && best.is_none_or(|(bd, _)| d > bd) {
            best = Some((d, *p));
        }
    }
    best.map(|(_, p)| p)
}

#[derive(Default)]
struct ClusterStats {
    sums: Vec<[f64; 3]>,
    counts: Vec<usize>,
}

impl ClusterStats {
    fn accumulate(points: &[Point], assignments: &[usize], k: usize) -> Self {
        let mut sums = vec![[0.0f64; 3]; k];
        let mut counts = vec![0usize; k];
        for (p, &a) in points.iter().zip(assignments) {
            let s = &mut sums[a];
            s[0] += p[0] as f64;
            s[1] += p[1] as f64;
            s[2] += p[2] as f64;
            counts[a] += 1;
        }
        Self { sums, counts }
    }

    fn mean(&self, c: usize) -> Point {
        let n = self.counts[c].max(1) as f64;
        let s = self.sums[c];
        [(s[0] / n) as f32, (s[1] / n) as f32, (s[2] / n) as f32]
    }
}

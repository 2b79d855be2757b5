use log::{debug, trace};
use nalgebra::DMatrix;
use rand::Rng;

use crate::error::{FunsetError, Result};

const DEFAULT_MAX_ITER: usize = 100;

/// When to stop refining centers within one attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TermCriteria {
    pub max_iter: Option<usize>,
    /// Stop once no center moves further than this (Euclidean distance).
    pub epsilon: Option<f64>,
}

impl TermCriteria {
    pub fn new(max_iter: usize, epsilon: f64) -> Self {
        Self {
            max_iter: Some(max_iter),
            epsilon: Some(epsilon),
        }
    }

    fn resolve(&self) -> Result<(usize, f64)> {
        match (self.max_iter, self.epsilon) {
            (None, None) => Err(FunsetError::InvalidArgument(
                "termination criteria need an iteration count or an epsilon".into(),
            )),
            (iters, eps) => Ok((
                iters.unwrap_or(DEFAULT_MAX_ITER).max(1),
                eps.unwrap_or(0.0).max(0.0),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KMeansInit {
    /// Distinct samples picked uniformly.
    Random,
    /// k-means++ seeding (Arthur & Vassilvitskii).
    #[default]
    PlusPlus,
}

#[derive(Debug, Clone)]
pub struct KMeansResult {
    /// Cluster index for every sample row.
    pub labels: Vec<usize>,
    /// One center per row.
    pub centers: DMatrix<f64>,
    /// Sum of squared distances from each sample to its center.
    pub compactness: f64,
}

/// Clusters the rows of `data` into `k` groups, keeping the best of `attempts` runs.
pub fn kmeans<R: Rng + ?Sized>(
    data: &DMatrix<f64>,
    k: usize,
    criteria: TermCriteria,
    attempts: usize,
    init: KMeansInit,
    rng: &mut R,
) -> Result<KMeansResult> {
    let samples = data.nrows();
    if k == 0 || k > samples {
        return Err(FunsetError::InvalidArgument(format!(
            "cluster count {k} must be in 1..={samples}"
        )));
    }
    if attempts == 0 {
        return Err(FunsetError::InvalidArgument("attempts must be at least 1".into()));
    }
    let (max_iter, epsilon) = criteria.resolve()?;

    let mut best: Option<KMeansResult> = None;
    for attempt in 0..attempts {
        let result = run_attempt(data, k, max_iter, epsilon, init, rng);
        debug!("kmeans attempt {attempt}: compactness {:.3}", result.compactness);
        if best
            .as_ref()
            .is_none_or(|b| result.compactness < b.compactness)
        {
            best = Some(result);
        }
    }
    best.ok_or_else(|| FunsetError::InvalidArgument("kmeans produced no result".into()))
}

fn sq_dist(data: &DMatrix<f64>, row: usize, centers: &DMatrix<f64>, center: usize) -> f64 {
    (0..data.ncols())
        .map(|c| (data[(row, c)] - centers[(center, c)]).powi(2))
        .sum()
}

fn nearest(data: &DMatrix<f64>, row: usize, centers: &DMatrix<f64>) -> (usize, f64) {
    let mut best = (0, f64::INFINITY);
    for center in 0..centers.nrows() {
        let d = sq_dist(data, row, centers, center);
        if d < best.1 {
            best = (center, d);
        }
    }
    best
}

fn seed_centers<R: Rng + ?Sized>(
    data: &DMatrix<f64>,
    k: usize,
    init: KMeansInit,
    rng: &mut R,
) -> DMatrix<f64> {
    let n = data.nrows();
    let picks: Vec<usize> = match init {
        KMeansInit::Random => rand::seq::index::sample(rng, n, k).into_vec(),
        KMeansInit::PlusPlus => {
            let mut picks = vec![rng.gen_range(0..n)];
            let mut dist: Vec<f64> = (0..n)
                .map(|r| {
                    (0..data.ncols())
                        .map(|c| (data[(r, c)] - data[(picks[0], c)]).powi(2))
                        .sum()
                })
                .collect();
            while picks.len() < k {
                let total: f64 = dist.iter().sum();
                let next = if total <= 0.0 {
                    rng.gen_range(0..n)
                } else {
                    let mut target = rng.gen_range(0.0..total);
                    let mut chosen = n - 1;
                    for (i, d) in dist.iter().enumerate() {
                        if target < *d {
                            chosen = i;
                            break;
                        }
                        target -= d;
                    }
                    chosen
                };
                picks.push(next);
                for (r, d) in dist.iter_mut().enumerate() {
                    let candidate: f64 = (0..data.ncols())
                        .map(|c| (data[(r, c)] - data[(next, c)]).powi(2))
                        .sum();
                    *d = d.min(candidate);
                }
            }
            picks
        }
    };
    DMatrix::from_fn(k, data.ncols(), |r, c| data[(picks[r], c)])
}

/// Moves the worst-fitting sample into each empty cluster.
///
/// A sample is moved at most once per call, and only out of a cluster that
/// keeps at least one other member. `sums` and `counts` follow every move.
fn reseed_empty_clusters(
    data: &DMatrix<f64>,
    centers: &DMatrix<f64>,
    labels: &mut [usize],
    sums: &mut DMatrix<f64>,
    counts: &mut [usize],
) {
    let mut moved = vec![false; labels.len()];
    for cluster in 0..counts.len() {
        if counts[cluster] > 0 {
            continue;
        }
        let far_row = (0..labels.len())
            .filter(|&row| !moved[row] && counts[labels[row]] > 1)
            .map(|row| (row, sq_dist(data, row, centers, labels[row])))
            .fold(None, |best: Option<(usize, f64)>, cur| match best {
                Some(b) if b.1 >= cur.1 => Some(b),
                _ => Some(cur),
            });
        let Some((far_row, _)) = far_row else {
            trace!("kmeans: no sample left to reseed cluster {cluster}");
            continue;
        };
        trace!("kmeans: cluster {cluster} empty, reseeding from sample {far_row}");

        let old = labels[far_row];
        for c in 0..data.ncols() {
            sums[(old, c)] -= data[(far_row, c)];
            sums[(cluster, c)] = data[(far_row, c)];
        }
        counts[old] -= 1;
        counts[cluster] = 1;
        labels[far_row] = cluster;
        moved[far_row] = true;
    }
}

fn run_attempt<R: Rng + ?Sized>(
    data: &DMatrix<f64>,
    k: usize,
    max_iter: usize,
    epsilon: f64,
    init: KMeansInit,
    rng: &mut R,
) -> KMeansResult {
    let n = data.nrows();
    let dims = data.ncols();
    let mut centers = seed_centers(data, k, init, rng);
    let mut labels = vec![0usize; n];

    for iter in 0..max_iter {
        for (row, label) in labels.iter_mut().enumerate() {
            *label = nearest(data, row, &centers).0;
        }

        let mut sums = DMatrix::<f64>::zeros(k, dims);
        let mut counts = vec![0usize; k];
        for (row, &label) in labels.iter().enumerate() {
            counts[label] += 1;
            for c in 0..dims {
                sums[(label, c)] += data[(row, c)];
            }
        }

        reseed_empty_clusters(data, &centers, &mut labels, &mut sums, &mut counts);

        let mut updated = centers.clone();
        for cluster in 0..k {
            if counts[cluster] == 0 {
                continue;
            }
            for c in 0..dims {
                updated[(cluster, c)] = sums[(cluster, c)] / counts[cluster] as f64;
            }
        }

        let shift = (0..k)
            .map(|cluster| sq_dist(&updated, cluster, &centers, cluster).sqrt())
            .fold(0.0, f64::max);
        centers = updated;
        trace!("kmeans iter {iter}: max center shift {shift:.4}");
        if shift <= epsilon {
            break;
        }
    }

    let mut compactness = 0.0;
    for (row, label) in labels.iter_mut().enumerate() {
        let (center, d) = nearest(data, row, &centers);
        *label = center;
        compactness += d;
    }

    KMeansResult {
        labels,
        centers,
        compactness,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn two_groups() -> DMatrix<f64> {
        let pts = [
            [0.0, 0.0],
            [0.5, 0.2],
            [0.1, 0.6],
            [10.0, 10.0],
            [10.4, 9.7],
            [9.8, 10.3],
        ];
        DMatrix::from_fn(pts.len(), 2, |r, c| pts[r][c])
    }

    #[test]
    fn separates_obvious_groups() {
        let mut rng = StdRng::seed_from_u64(7);
        let res = kmeans(
            &two_groups(),
            2,
            TermCriteria::new(10, 1.0),
            3,
            KMeansInit::PlusPlus,
            &mut rng,
        )
        .unwrap();
        assert_eq!(res.labels[0], res.labels[1]);
        assert_eq!(res.labels[1], res.labels[2]);
        assert_eq!(res.labels[3], res.labels[4]);
        assert_eq!(res.labels[4], res.labels[5]);
        assert_ne!(res.labels[0], res.labels[3]);
        assert!(res.compactness < 2.0);
    }

    #[test]
    fn random_init_also_converges() {
        let mut rng = StdRng::seed_from_u64(3);
        let res = kmeans(
            &two_groups(),
            2,
            TermCriteria::new(20, 0.0),
            5,
            KMeansInit::Random,
            &mut rng,
        )
        .unwrap();
        assert_ne!(res.labels[0], res.labels[5]);
        assert_eq!(res.centers.shape(), (2, 2));
    }

    #[test]
    fn k_equal_to_samples_gives_zero_compactness() {
        let mut rng = StdRng::seed_from_u64(1);
        let res = kmeans(
            &two_groups(),
            6,
            TermCriteria::new(10, 0.0),
            1,
            KMeansInit::PlusPlus,
            &mut rng,
        )
        .unwrap();
        assert!(res.compactness < 1e-12);
    }

    #[test]
    fn duplicate_seeds_still_fill_every_cluster() {
        // Eight identical points make random seeding pick the same center often.
        let mut pts = vec![[0.0, 0.0]; 8];
        pts.push([10.0, 0.0]);
        pts.push([20.0, 0.0]);
        let data = DMatrix::from_fn(pts.len(), 2, |r, c| pts[r][c]);

        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let res = kmeans(
                &data,
                3,
                TermCriteria::new(2, 0.0),
                1,
                KMeansInit::Random,
                &mut rng,
            )
            .unwrap();
            for cluster in 0..3 {
                assert!(
                    res.labels.contains(&cluster),
                    "seed {seed}: cluster {cluster} unused in {:?}",
                    res.labels
                );
            }
            assert!(res.compactness < 1e-9, "seed {seed}: {}", res.compactness);
        }
    }

    #[test]
    fn reseeding_moves_distinct_samples() {
        let data = DMatrix::from_row_slice(4, 1, &[0.0, 0.0, 5.0, 9.0]);
        let centers = DMatrix::from_row_slice(3, 1, &[0.0, 0.0, 0.0]);
        let mut labels = vec![0; 4];
        let mut sums = DMatrix::from_row_slice(3, 1, &[14.0, 0.0, 0.0]);
        let mut counts = vec![4, 0, 0];

        reseed_empty_clusters(&data, &centers, &mut labels, &mut sums, &mut counts);

        assert_eq!(labels, vec![0, 0, 2, 1]);
        assert_eq!(counts, vec![2, 1, 1]);
        assert_eq!(sums.as_slice(), &[0.0, 9.0, 5.0]);
    }

    #[test]
    fn invalid_arguments() {
        let mut rng = StdRng::seed_from_u64(1);
        let data = two_groups();
        let crit = TermCriteria::new(10, 1.0);
        assert!(kmeans(&data, 0, crit, 1, KMeansInit::Random, &mut rng).is_err());
        assert!(kmeans(&data, 7, crit, 1, KMeansInit::Random, &mut rng).is_err());
        assert!(kmeans(&data, 2, crit, 0, KMeansInit::Random, &mut rng).is_err());
        let none = TermCriteria {
            max_iter: None,
            epsilon: None,
        };
        assert!(kmeans(&data, 2, none, 1, KMeansInit::Random, &mut rng).is_err());
    }
}

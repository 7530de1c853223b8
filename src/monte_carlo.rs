use log::debug;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::Serialize;

use crate::core::error::SimError;
use crate::core::process::ProcessRuntime;
use crate::core::resources::ResourcePool;
use crate::core::types::SimTime;
use crate::model::config::SupermarketConfig;
use crate::model::processes::CustomerArrivals;
use crate::model::supermarket::SupermarketModel;

/// Simulated-time length of one replication.
pub const DEFAULT_HORIZON: SimTime = 200.0;
/// Replications per `simulate` call in the reference experiments.
pub const DEFAULT_NUM_RUNS: usize = 30;

const Z_95: f64 = 1.96;

/// How replications are fanned out across host threads. Replications own
/// disjoint state, so the two modes produce identical results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConcurrencyMode {
    /// Replications run one after another on the calling thread.
    Sequential,
    /// Replications run on the rayon thread pool.
    Rayon,
}

impl Default for ConcurrencyMode {
    fn default() -> Self {
        ConcurrencyMode::Sequential
    }
}

/// Summary scalars of one replication.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplicationResult {
    pub profit: f64,
    pub lost_customers: u64,
    pub served_customers: u64,
    /// Completed overflow windows.
    pub activations: u64,
    /// Mean observed waiting time; absent when nobody was served.
    pub mean_waiting_time: Option<f64>,
}

/// Sample mean and 95% confidence half-width across replications.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Statistic {
    pub mean: f64,
    pub half_width: f64,
}

impl Statistic {
    /// Mean and `1.96 * s / sqrt(n)` over `samples`, with `s` the sample
    /// (n - 1) standard deviation. The half-width is zero for fewer than
    /// two samples; an empty slice has no statistic at all.
    pub fn from_samples(samples: &[f64]) -> Option<Statistic> {
        if samples.is_empty() {
            return None;
        }
        let n = samples.len() as f64;
        let mean = samples.iter().sum::<f64>() / n;
        let half_width = if samples.len() < 2 {
            0.0
        } else {
            let variance = samples
                .iter()
                .map(|sample| (sample - mean).powi(2))
                .sum::<f64>()
                / (n - 1.0);
            Z_95 * variance.sqrt() / n.sqrt()
        };
        Some(Statistic { mean, half_width })
    }
}

/// Aggregate statistics for one configuration across all replications.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationSummary {
    pub profit: Statistic,
    pub lost_customers: Statistic,
    /// Absent when no replication served a single customer. Replications
    /// without served customers are excluded from this aggregate; its
    /// confidence interval divides by `wait_samples`.
    pub mean_waiting_time: Option<Statistic>,
    pub replications: usize,
    /// Replications that served at least one customer.
    pub wait_samples: usize,
}

/// Run one replication to `horizon` with its own random stream.
pub fn run_replication(
    config: &SupermarketConfig,
    seed: u64,
    horizon: SimTime,
) -> Result<ReplicationResult, SimError> {
    config.validate()?;

    let mut pool = ResourcePool::new();
    let model = SupermarketModel::new(config.clone(), &mut pool);
    let rng = StdRng::seed_from_u64(seed);
    let mut runtime = ProcessRuntime::new(model, pool, rng);

    runtime.spawn(Box::new(CustomerArrivals::new(config.lambda_rate)?), 0.0)?;
    runtime.run_until(horizon)?;

    let model = runtime.into_model();
    debug!(
        "replication seed={} served={} lost={} profit={:.1}",
        seed,
        model.served_customers(),
        model.lost_customers(),
        model.profit()
    );
    Ok(ReplicationResult {
        profit: model.profit(),
        lost_customers: model.lost_customers(),
        served_customers: model.served_customers(),
        activations: model.activations(),
        mean_waiting_time: model.mean_waiting_time(),
    })
}

/// Run `num_runs` independent replications of `config` and aggregate them.
///
/// Replication `i` is seeded with `base_seed + i`, so a fixed base seed
/// reproduces the exact same summary. Fails atomically on an invalid
/// configuration: no partial results.
pub fn simulate(
    config: &SupermarketConfig,
    num_runs: usize,
    base_seed: u64,
) -> Result<SimulationSummary, SimError> {
    simulate_with_mode(config, num_runs, base_seed, ConcurrencyMode::default())
}

/// [`simulate`] with an explicit [`ConcurrencyMode`]. Results are
/// identical in either mode; replications are aggregated in index order.
pub fn simulate_with_mode(
    config: &SupermarketConfig,
    num_runs: usize,
    base_seed: u64,
    mode: ConcurrencyMode,
) -> Result<SimulationSummary, SimError> {
    config.validate()?;
    if num_runs == 0 {
        return Err(SimError::NoReplications);
    }

    let run = |index: usize| {
        run_replication(config, base_seed.wrapping_add(index as u64), DEFAULT_HORIZON)
    };
    let results: Result<Vec<ReplicationResult>, SimError> = match mode {
        ConcurrencyMode::Sequential => (0..num_runs).map(run).collect(),
        ConcurrencyMode::Rayon => (0..num_runs).into_par_iter().map(run).collect(),
    };

    aggregate(&results?)
}

fn aggregate(results: &[ReplicationResult]) -> Result<SimulationSummary, SimError> {
    let profits: Vec<f64> = results.iter().map(|r| r.profit).collect();
    let losses: Vec<f64> = results.iter().map(|r| r.lost_customers as f64).collect();
    let waits: Vec<f64> = results.iter().filter_map(|r| r.mean_waiting_time).collect();

    let profit = Statistic::from_samples(&profits).ok_or(SimError::NoReplications)?;
    let lost_customers = Statistic::from_samples(&losses).ok_or(SimError::NoReplications)?;
    let mean_waiting_time = Statistic::from_samples(&waits);

    Ok(SimulationSummary {
        profit,
        lost_customers,
        mean_waiting_time,
        replications: results.len(),
        wait_samples: waits.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confidence_interval_matches_the_formula() {
        // mean 12, sample std 2 => half-width 1.96 * 2 / sqrt(3)
        let stat = Statistic::from_samples(&[10.0, 12.0, 14.0]).unwrap();
        assert!((stat.mean - 12.0).abs() < 1e-12);
        let expected = 1.96 * 2.0 / 3.0_f64.sqrt();
        assert!((stat.half_width - expected).abs() < 1e-12);
    }

    #[test]
    fn single_sample_has_zero_half_width() {
        let stat = Statistic::from_samples(&[5.0]).unwrap();
        assert_eq!(stat.mean, 5.0);
        assert_eq!(stat.half_width, 0.0);
    }

    #[test]
    fn no_samples_no_statistic() {
        assert_eq!(Statistic::from_samples(&[]), None);
    }

    #[test]
    fn identical_samples_have_zero_half_width() {
        let stat = Statistic::from_samples(&[3.0, 3.0, 3.0, 3.0]).unwrap();
        assert_eq!(stat.mean, 3.0);
        assert_eq!(stat.half_width, 0.0);
    }

    #[test]
    fn zero_replications_is_an_error() {
        let config = SupermarketConfig::default();
        assert_eq!(simulate(&config, 0, 1).unwrap_err(), SimError::NoReplications);
    }

    #[test]
    fn invalid_config_fails_atomically() {
        let config = SupermarketConfig::default().with_lambda_rate(-1.0);
        assert!(matches!(
            simulate(&config, 10, 1),
            Err(SimError::NonPositiveArrivalRate { .. })
        ));
    }

    #[test]
    fn fixed_seed_reproduces_the_summary() {
        let config = SupermarketConfig::default();
        let first = simulate(&config, 5, 42).unwrap();
        let second = simulate(&config, 5, 42).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn sequential_and_rayon_agree() {
        let config = SupermarketConfig::default();
        let sequential =
            simulate_with_mode(&config, 6, 9, ConcurrencyMode::Sequential).unwrap();
        let parallel = simulate_with_mode(&config, 6, 9, ConcurrencyMode::Rayon).unwrap();
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn replication_seeds_differ_by_index() {
        let config = SupermarketConfig::default();
        let a = run_replication(&config, 100, DEFAULT_HORIZON).unwrap();
        let b = run_replication(&config, 101, DEFAULT_HORIZON).unwrap();
        // Two different streams virtually never produce the same profit
        // trajectory over 200 time units at the default arrival rate.
        assert_ne!(a, b);
    }

    #[test]
    fn wait_aggregate_excludes_empty_replications() {
        let results = vec![
            ReplicationResult {
                profit: 20.0,
                lost_customers: 0,
                served_customers: 2,
                activations: 0,
                mean_waiting_time: Some(0.5),
            },
            ReplicationResult {
                profit: 0.0,
                lost_customers: 0,
                served_customers: 0,
                activations: 0,
                mean_waiting_time: None,
            },
            ReplicationResult {
                profit: 10.0,
                lost_customers: 1,
                served_customers: 1,
                activations: 0,
                mean_waiting_time: Some(1.5),
            },
        ];

        let summary = aggregate(&results).unwrap();
        assert_eq!(summary.replications, 3);
        assert_eq!(summary.wait_samples, 2);
        let wait = summary.mean_waiting_time.unwrap();
        assert!((wait.mean - 1.0).abs() < 1e-12);
    }

    #[test]
    fn all_empty_replications_leave_the_wait_aggregate_absent() {
        let results = vec![ReplicationResult {
            profit: 0.0,
            lost_customers: 0,
            served_customers: 0,
            activations: 0,
            mean_waiting_time: None,
        }];

        let summary = aggregate(&results).unwrap();
        assert_eq!(summary.mean_waiting_time, None);
        assert_eq!(summary.wait_samples, 0);
    }
}

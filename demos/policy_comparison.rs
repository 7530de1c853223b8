use marketsim::monte_carlo::DEFAULT_NUM_RUNS;
use marketsim::{simulate_with_mode, ConcurrencyMode, SupermarketConfig};

/// Sweeps the overflow activation policies over a range of arrival rates
/// and prints mean profit and waiting time with 95% confidence intervals.
/// This plays the role of the external sweep driver; the core itself is
/// stateless between `simulate` calls.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Warn)
        .format_timestamp(None)
        .init();

    let policies = [0usize, 2, 4, 6];
    let num_runs = DEFAULT_NUM_RUNS;
    let base_seed = 1000;

    for activation_cost in [1.0, 3.0, 5.0] {
        println!("Activation cost C = {}", activation_cost);
        println!(
            "{:>8} {:>8} {:>22} {:>22}",
            "policy", "lambda", "profit (95% CI)", "mean wait (95% CI)"
        );
        for policy in policies {
            for lambda in 1..10 {
                let config = SupermarketConfig::default()
                    .with_extra_cashier_policy(policy)
                    .with_lambda_rate(lambda as f64)
                    .with_activation_cost(activation_cost);
                let summary =
                    simulate_with_mode(&config, num_runs, base_seed, ConcurrencyMode::Rayon)?;

                let wait = match summary.mean_waiting_time {
                    Some(stat) => format!("{:8.3} +/- {:.3}", stat.mean, stat.half_width),
                    None => "no customers served".to_string(),
                };
                println!(
                    "{:>8} {:>8} {:>12.1} +/- {:>5.1} {:>22}",
                    policy, lambda, summary.profit.mean, summary.profit.half_width, wait
                );
            }
        }
        println!();
    }

    Ok(())
}

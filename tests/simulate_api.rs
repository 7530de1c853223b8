use marketsim::{
    simulate, simulate_with_mode, ConcurrencyMode, SimError, SupermarketConfig,
};

#[test]
fn simulate_returns_a_summary_for_a_valid_config() {
    let config = SupermarketConfig::default();
    let summary = simulate(&config, 10, 1234).unwrap();

    assert_eq!(summary.replications, 10);
    assert!(summary.profit.mean.is_finite());
    assert!(summary.profit.half_width >= 0.0);
    assert!(summary.lost_customers.mean >= 0.0);

    // At the default arrival rate every replication serves customers, so
    // the waiting-time aggregate is present and fed by all of them.
    assert_eq!(summary.wait_samples, 10);
    let wait = summary.mean_waiting_time.expect("wait statistic");
    assert!(wait.mean >= 0.0);
    assert!(wait.half_width >= 0.0);
}

#[test]
fn simulate_is_deterministic_for_a_fixed_seed() {
    let config = SupermarketConfig::default()
        .with_num_cashiers(2)
        .with_lambda_rate(6.0);

    let first = simulate(&config, 8, 99).unwrap();
    let second = simulate(&config, 8, 99).unwrap();
    assert_eq!(first, second);
}

#[test]
fn concurrency_mode_does_not_change_the_results() {
    let config = SupermarketConfig::default();
    let sequential = simulate_with_mode(&config, 8, 7, ConcurrencyMode::Sequential).unwrap();
    let parallel = simulate_with_mode(&config, 8, 7, ConcurrencyMode::Rayon).unwrap();
    assert_eq!(sequential, parallel);
}

#[test]
fn invalid_configurations_are_rejected_before_any_replication() {
    let no_cashiers = SupermarketConfig::default().with_num_cashiers(0);
    assert_eq!(
        simulate(&no_cashiers, 10, 1).unwrap_err(),
        SimError::TooFewCashiers { num_cashiers: 0 }
    );

    let bad_rate = SupermarketConfig::default().with_lambda_rate(0.0);
    assert!(matches!(
        simulate(&bad_rate, 10, 1),
        Err(SimError::NonPositiveArrivalRate { .. })
    ));

    let bad_cost = SupermarketConfig::default().with_activation_cost(-1.0);
    assert!(matches!(
        simulate(&bad_cost, 10, 1),
        Err(SimError::NegativeActivationCost { .. })
    ));
}

#[test]
fn a_quiet_store_reports_no_wait_statistic() {
    let config = SupermarketConfig::default().with_lambda_rate(1e-9);
    let summary = simulate(&config, 5, 1).unwrap();

    assert_eq!(summary.profit.mean, 0.0);
    assert_eq!(summary.lost_customers.mean, 0.0);
    assert_eq!(summary.mean_waiting_time, None);
    assert_eq!(summary.wait_samples, 0);
}

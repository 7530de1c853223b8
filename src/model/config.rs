use serde::{Deserialize, Serialize};

use crate::core::error::SimError;

/// Parameters of one supermarket scenario.
///
/// The remaining model constants (patience, service mean, overflow window
/// duration, saturation threshold, revenue) are fixed; see
/// [`supermarket`](super::supermarket).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupermarketConfig {
    /// Number of regular cashiers.
    pub num_cashiers: usize,
    /// Minimum queue length that triggers the overflow cashier.
    pub extra_cashier_policy: usize,
    /// Customer arrival rate (customers per time unit).
    pub lambda_rate: f64,
    /// Cost coefficient: each overflow activation window costs `2 * C`.
    pub activation_cost: f64,
}

impl Default for SupermarketConfig {
    fn default() -> Self {
        Self {
            num_cashiers: 4,
            extra_cashier_policy: 4,
            lambda_rate: 4.0,
            activation_cost: 3.0,
        }
    }
}

impl SupermarketConfig {
    pub fn new(
        num_cashiers: usize,
        extra_cashier_policy: usize,
        lambda_rate: f64,
        activation_cost: f64,
    ) -> Self {
        Self {
            num_cashiers,
            extra_cashier_policy,
            lambda_rate,
            activation_cost,
        }
    }

    /// Set the number of regular cashiers
    pub fn with_num_cashiers(mut self, num_cashiers: usize) -> Self {
        self.num_cashiers = num_cashiers;
        self
    }

    /// Set the overflow trigger threshold
    pub fn with_extra_cashier_policy(mut self, extra_cashier_policy: usize) -> Self {
        self.extra_cashier_policy = extra_cashier_policy;
        self
    }

    /// Set the arrival rate
    pub fn with_lambda_rate(mut self, lambda_rate: f64) -> Self {
        self.lambda_rate = lambda_rate;
        self
    }

    /// Set the overflow cost coefficient
    pub fn with_activation_cost(mut self, activation_cost: f64) -> Self {
        self.activation_cost = activation_cost;
        self
    }

    /// Reject invalid parameter combinations before a run starts.
    pub fn validate(&self) -> Result<(), SimError> {
        if self.num_cashiers < 1 {
            return Err(SimError::TooFewCashiers {
                num_cashiers: self.num_cashiers,
            });
        }
        if !self.lambda_rate.is_finite() || self.lambda_rate <= 0.0 {
            return Err(SimError::NonPositiveArrivalRate {
                lambda_rate: self.lambda_rate,
            });
        }
        if !(self.activation_cost >= 0.0) {
            return Err(SimError::NegativeActivationCost {
                activation_cost: self.activation_cost,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(SupermarketConfig::default().validate().is_ok());
    }

    #[test]
    fn config_builder() {
        let config = SupermarketConfig::default()
            .with_num_cashiers(2)
            .with_extra_cashier_policy(0)
            .with_lambda_rate(7.5)
            .with_activation_cost(1.0);

        assert_eq!(config.num_cashiers, 2);
        assert_eq!(config.extra_cashier_policy, 0);
        assert_eq!(config.lambda_rate, 7.5);
        assert_eq!(config.activation_cost, 1.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_zero_cashiers() {
        let err = SupermarketConfig::default()
            .with_num_cashiers(0)
            .validate()
            .unwrap_err();
        assert_eq!(err, SimError::TooFewCashiers { num_cashiers: 0 });
    }

    #[test]
    fn rejects_non_positive_arrival_rate() {
        let config = SupermarketConfig::default().with_lambda_rate(0.0);
        assert!(matches!(
            config.validate(),
            Err(SimError::NonPositiveArrivalRate { .. })
        ));

        let config = SupermarketConfig::default().with_lambda_rate(-2.0);
        assert!(config.validate().is_err());

        let config = SupermarketConfig::default().with_lambda_rate(f64::NAN);
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_negative_activation_cost() {
        let config = SupermarketConfig::default().with_activation_cost(-0.1);
        assert!(matches!(
            config.validate(),
            Err(SimError::NegativeActivationCost { .. })
        ));

        let config = SupermarketConfig::default().with_activation_cost(f64::NAN);
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_policy_and_zero_cost_are_valid() {
        let config = SupermarketConfig::default()
            .with_extra_cashier_policy(0)
            .with_activation_cost(0.0);
        assert!(config.validate().is_ok());
    }
}

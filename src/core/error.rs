use super::types::SimTime;

/// Errors surfaced by the simulation core.
///
/// Configuration variants are rejected before any replication starts; a
/// failed configuration produces no partial results.
#[derive(Debug, Clone, PartialEq)]
pub enum SimError {
    /// An event was scheduled with a negative or non-finite delay.
    InvalidDelay { delay: SimTime },
    /// `num_cashiers` must be at least 1.
    TooFewCashiers { num_cashiers: usize },
    /// `lambda_rate` must be positive and finite.
    NonPositiveArrivalRate { lambda_rate: f64 },
    /// The overflow activation cost must be non-negative.
    NegativeActivationCost { activation_cost: f64 },
    /// `simulate` was asked for zero replications.
    NoReplications,
}

impl std::fmt::Display for SimError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SimError::InvalidDelay { delay } => {
                write!(f, "event delay must be finite and non-negative, got {}", delay)
            }
            SimError::TooFewCashiers { num_cashiers } => {
                write!(f, "at least one regular cashier is required, got {}", num_cashiers)
            }
            SimError::NonPositiveArrivalRate { lambda_rate } => {
                write!(f, "arrival rate must be positive and finite, got {}", lambda_rate)
            }
            SimError::NegativeActivationCost { activation_cost } => {
                write!(f, "activation cost must be non-negative, got {}", activation_cost)
            }
            SimError::NoReplications => {
                write!(f, "at least one replication is required")
            }
        }
    }
}

impl std::error::Error for SimError {}

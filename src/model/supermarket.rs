use crate::core::resources::ResourcePool;
use crate::core::types::{ResourceId, SimTime};

use super::config::SupermarketConfig;

/// Revenue credited per completed service.
pub const SERVICE_REVENUE: f64 = 10.0;
/// Mean service duration.
pub const SERVICE_MEAN: f64 = 1.0;
/// How long a customer waits in a queue before giving up.
pub const PATIENCE: f64 = 1.0;
/// Queue length at which an arriving customer refuses to queue at all.
pub const SATURATION_THRESHOLD: usize = 5;
/// How long the overflow cashier stays open per activation.
pub const OVERFLOW_DURATION: f64 = 2.0;

/// Where an arriving customer is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Routing {
    /// Join this cashier's queue.
    Queue(ResourceId),
    /// Every regular queue is saturated and the overflow window is closed;
    /// the customer leaves without queueing.
    Balk,
}

/// Result of [`SupermarketModel::choose_cashier`]. `trigger_overflow` asks
/// the caller to start the overflow activation process, fire-and-forget;
/// it never blocks the routing of the current customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoutingDecision {
    pub routing: Routing,
    pub trigger_overflow: bool,
}

/// Shared state of one replication: cashier handles, the overflow window
/// flag and the revenue/loss accounting.
///
/// Mutated only by the process the runtime is currently resuming.
#[derive(Debug)]
pub struct SupermarketModel {
    config: SupermarketConfig,
    cashiers: Vec<ResourceId>,
    overflow_cashier: ResourceId,
    overflow_open: bool,
    profit: f64,
    lost_customers: u64,
    served_customers: u64,
    balked_customers: u64,
    reneged_customers: u64,
    activations: u64,
    waiting_times: Vec<SimTime>,
}

impl SupermarketModel {
    /// Register one resource per regular cashier plus the overflow cashier
    /// in `pool`. Callers validate `config` first.
    pub fn new(config: SupermarketConfig, pool: &mut ResourcePool) -> Self {
        let cashiers = (0..config.num_cashiers)
            .map(|_| pool.add_resource())
            .collect();
        let overflow_cashier = pool.add_resource();
        Self {
            config,
            cashiers,
            overflow_cashier,
            overflow_open: false,
            profit: 0.0,
            lost_customers: 0,
            served_customers: 0,
            balked_customers: 0,
            reneged_customers: 0,
            activations: 0,
            waiting_times: Vec::new(),
        }
    }

    pub fn config(&self) -> &SupermarketConfig {
        &self.config
    }

    /// Regular cashier handles in pool-index order.
    pub fn cashiers(&self) -> &[ResourceId] {
        &self.cashiers
    }

    pub fn overflow_cashier(&self) -> ResourceId {
        self.overflow_cashier
    }

    pub fn overflow_open(&self) -> bool {
        self.overflow_open
    }

    /// Pick a queue for an arriving customer.
    ///
    /// While the overflow window is open every customer is routed to the
    /// overflow cashier unconditionally, with no saturation check on that
    /// path. Otherwise the regular cashier with the shortest queue wins,
    /// ties going to the lowest pool index; a shortest queue at or past
    /// the activation policy asks for an overflow trigger, and one at or
    /// past [`SATURATION_THRESHOLD`] makes the customer balk.
    pub fn choose_cashier(&self, pool: &ResourcePool) -> RoutingDecision {
        if self.overflow_open {
            return RoutingDecision {
                routing: Routing::Queue(self.overflow_cashier),
                trigger_overflow: false,
            };
        }

        let mut best = self.cashiers[0];
        let mut best_len = pool.queue_len(best);
        for &cashier in &self.cashiers[1..] {
            let len = pool.queue_len(cashier);
            if len < best_len {
                best = cashier;
                best_len = len;
            }
        }

        let trigger_overflow = best_len >= self.config.extra_cashier_policy;
        let routing = if best_len >= SATURATION_THRESHOLD {
            Routing::Balk
        } else {
            Routing::Queue(best)
        };
        RoutingDecision {
            routing,
            trigger_overflow,
        }
    }

    /// A customer refused to join a saturated queue.
    pub fn record_balk(&mut self) {
        self.balked_customers += 1;
        self.lost_customers += 1;
    }

    /// A customer abandoned its queue after waiting out its patience.
    pub fn record_renege(&mut self) {
        self.reneged_customers += 1;
        self.lost_customers += 1;
    }

    /// A customer reached a cashier; `wait` is its time spent queueing.
    pub fn record_wait(&mut self, wait: SimTime) {
        self.waiting_times.push(wait);
    }

    /// A service completed: credit the revenue.
    pub fn record_service(&mut self) {
        self.served_customers += 1;
        self.profit += SERVICE_REVENUE;
    }

    /// Open the overflow window. Returns false when it is already open:
    /// re-triggering an open window is a no-op.
    pub fn open_overflow(&mut self) -> bool {
        if self.overflow_open {
            return false;
        }
        self.overflow_open = true;
        true
    }

    /// Close the overflow window and charge its activation cost, once per
    /// window.
    pub fn close_overflow(&mut self) {
        self.overflow_open = false;
        self.profit -= 2.0 * self.config.activation_cost;
        self.activations += 1;
    }

    pub fn profit(&self) -> f64 {
        self.profit
    }

    pub fn lost_customers(&self) -> u64 {
        self.lost_customers
    }

    pub fn served_customers(&self) -> u64 {
        self.served_customers
    }

    pub fn balked_customers(&self) -> u64 {
        self.balked_customers
    }

    pub fn reneged_customers(&self) -> u64 {
        self.reneged_customers
    }

    /// Completed overflow windows, i.e. windows whose cost was charged.
    pub fn activations(&self) -> u64 {
        self.activations
    }

    /// Queue waits of customers that reached a cashier, in service order.
    pub fn waiting_times(&self) -> &[SimTime] {
        &self.waiting_times
    }

    /// Mean observed waiting time; `None` when nobody was served.
    pub fn mean_waiting_time(&self) -> Option<f64> {
        if self.waiting_times.is_empty() {
            return None;
        }
        Some(self.waiting_times.iter().sum::<f64>() / self.waiting_times.len() as f64)
    }
}

use log::{debug, warn};
use rand::Rng;
use rand_distr::{Distribution, Exp, Exp1};

use crate::core::error::SimError;
use crate::core::process::{Context, Directive, Process, Wake};
use crate::core::types::{ResourceId, SimTime};

use super::supermarket::{
    Routing, SupermarketModel, OVERFLOW_DURATION, PATIENCE, SERVICE_MEAN,
};

/// Generates the Poisson arrival stream. The only entry point creating
/// customers: each wake-up spawns the customer whose arrival the previous
/// sleep represented, then draws the next interarrival gap.
pub struct CustomerArrivals {
    interarrival: Exp<f64>,
    primed: bool,
}

impl CustomerArrivals {
    pub fn new(lambda_rate: f64) -> Result<Self, SimError> {
        let interarrival =
            Exp::new(lambda_rate).map_err(|_| SimError::NonPositiveArrivalRate { lambda_rate })?;
        Ok(Self {
            interarrival,
            primed: false,
        })
    }
}

impl Process<SupermarketModel> for CustomerArrivals {
    fn resume(&mut self, wake: Wake, ctx: &mut Context<'_, SupermarketModel>) -> Directive {
        if wake != Wake::Timer {
            warn!("arrival generator resumed with {:?}", wake);
            return Directive::Halt;
        }
        if self.primed {
            ctx.spawn(Box::new(Customer::new(ctx.now())), 0.0);
        } else {
            // First wake-up is the activation at time zero; the first
            // customer arrives one gap later.
            self.primed = true;
        }
        Directive::Sleep(self.interarrival.sample(ctx.rng))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CustomerPhase {
    Arrived,
    Waiting { cashier: ResourceId },
    InService { cashier: ResourceId },
}

/// Lifecycle of a single customer: route to a queue (or balk), race the
/// cashier grant against patience (or renege), then get served.
pub struct Customer {
    arrival_time: SimTime,
    phase: CustomerPhase,
}

impl Customer {
    pub fn new(arrival_time: SimTime) -> Self {
        Self {
            arrival_time,
            phase: CustomerPhase::Arrived,
        }
    }

    fn on_arrival(&mut self, ctx: &mut Context<'_, SupermarketModel>) -> Directive {
        let decision = ctx.model.choose_cashier(ctx.resources);
        if decision.trigger_overflow {
            ctx.spawn(Box::new(OverflowWindow::new()), 0.0);
        }
        match decision.routing {
            Routing::Queue(cashier) => {
                self.phase = CustomerPhase::Waiting { cashier };
                Directive::AwaitOrTimeout {
                    resource: cashier,
                    timeout: PATIENCE,
                }
            }
            Routing::Balk => {
                debug!("t={:.4} customer balked", ctx.now());
                ctx.model.record_balk();
                Directive::Halt
            }
        }
    }

    fn on_granted(
        &mut self,
        cashier: ResourceId,
        ctx: &mut Context<'_, SupermarketModel>,
    ) -> Directive {
        let wait = ctx.now() - self.arrival_time;
        ctx.model.record_wait(wait);
        self.phase = CustomerPhase::InService { cashier };
        let service_time = SERVICE_MEAN * ctx.rng.sample::<f64, _>(Exp1);
        Directive::Sleep(service_time)
    }

    fn on_reneged(&mut self, ctx: &mut Context<'_, SupermarketModel>) -> Directive {
        debug!("t={:.4} customer reneged", ctx.now());
        ctx.model.record_renege();
        Directive::Halt
    }

    fn on_service_done(
        &mut self,
        cashier: ResourceId,
        ctx: &mut Context<'_, SupermarketModel>,
    ) -> Directive {
        ctx.release(cashier);
        ctx.model.record_service();
        Directive::Halt
    }
}

impl Process<SupermarketModel> for Customer {
    fn resume(&mut self, wake: Wake, ctx: &mut Context<'_, SupermarketModel>) -> Directive {
        match (self.phase, wake) {
            (CustomerPhase::Arrived, Wake::Timer) => self.on_arrival(ctx),
            (CustomerPhase::Waiting { cashier }, Wake::Granted) => self.on_granted(cashier, ctx),
            (CustomerPhase::Waiting { .. }, Wake::TimedOut) => self.on_reneged(ctx),
            (CustomerPhase::InService { cashier }, Wake::Timer) => {
                self.on_service_done(cashier, ctx)
            }
            (phase, wake) => {
                warn!("customer in {:?} resumed with {:?}", phase, wake);
                Directive::Halt
            }
        }
    }
}

/// Opens the overflow cashier for a fixed window, then closes it and
/// charges the activation cost. Windows never overlap: a trigger landing
/// while one is open folds immediately.
pub struct OverflowWindow {
    open: bool,
}

impl OverflowWindow {
    pub fn new() -> Self {
        Self { open: false }
    }
}

impl Default for OverflowWindow {
    fn default() -> Self {
        Self::new()
    }
}

impl Process<SupermarketModel> for OverflowWindow {
    fn resume(&mut self, wake: Wake, ctx: &mut Context<'_, SupermarketModel>) -> Directive {
        if wake != Wake::Timer {
            warn!("overflow window resumed with {:?}", wake);
            return Directive::Halt;
        }
        if !self.open {
            if !ctx.model.open_overflow() {
                // Another trigger opened a window first.
                return Directive::Halt;
            }
            debug!("t={:.4} overflow window opened", ctx.now());
            self.open = true;
            Directive::Sleep(OVERFLOW_DURATION)
        } else {
            ctx.model.close_overflow();
            debug!("t={:.4} overflow window closed", ctx.now());
            Directive::Halt
        }
    }
}

use std::collections::HashMap;

use log::{debug, warn};
use rand::rngs::StdRng;

use super::error::SimError;
use super::resources::{Acquire, ResourcePool};
use super::scheduler::EventScheduler;
use super::types::{ProcessId, ResourceId, SimTime, TicketId};

/// Why a suspended process is being resumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wake {
    /// Initial activation, or expiry of a `Sleep` delay.
    Timer,
    /// The raced resource was acquired before the timeout.
    Granted,
    /// The timeout elapsed before the resource was acquired.
    TimedOut,
}

/// What a process asks the runtime to do at its next suspension point.
pub enum Directive {
    /// Suspend for a fixed simulated delay.
    Sleep(SimTime),
    /// Suspend on a race between acquiring `resource` and `timeout`
    /// elapsing. Whichever signal is dispatched first wins; the losing
    /// branch is cancelled.
    AwaitOrTimeout {
        resource: ResourceId,
        timeout: SimTime,
    },
    /// Terminate the process.
    Halt,
}

/// A suspendable unit of logical execution.
///
/// `resume` runs the process up to its next suspension point and returns
/// the directive describing it. Only one process executes at any simulated
/// instant, so everything reachable through the context may be mutated
/// without synchronization.
pub trait Process<M> {
    fn resume(&mut self, wake: Wake, ctx: &mut Context<'_, M>) -> Directive;
}

/// Execution context handed to a process while it runs.
pub struct Context<'a, M> {
    now: SimTime,
    pub model: &'a mut M,
    pub resources: &'a mut ResourcePool,
    pub rng: &'a mut StdRng,
    spawned: &'a mut Vec<(Box<dyn Process<M>>, SimTime)>,
    released: &'a mut Vec<ResourceId>,
}

impl<'a, M> Context<'a, M> {
    /// Current simulated time.
    pub fn now(&self) -> SimTime {
        self.now
    }

    /// Spawn another process, first resumed `delay` time units from now.
    pub fn spawn(&mut self, process: Box<dyn Process<M>>, delay: SimTime) {
        self.spawned.push((process, delay));
    }

    /// Release a resource slot held by this process. Applied when the
    /// process suspends; the next queued request is granted at the current
    /// instant.
    pub fn release(&mut self, resource: ResourceId) {
        self.released.push(resource);
    }
}

#[derive(Debug, Clone, Copy)]
enum Signal {
    Resume(ProcessId),
    Grant { process: ProcessId, ticket: TicketId },
    Patience { process: ProcessId, ticket: TicketId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TicketState {
    /// Waiting in the resource's FIFO queue.
    Waiting,
    /// Slot granted; the grant signal is in flight but not yet dispatched.
    Holding,
}

#[derive(Debug, Clone, Copy)]
struct Ticket {
    process: ProcessId,
    resource: ResourceId,
    state: TicketState,
}

/// Cooperative scheduler for logical processes.
///
/// Drives an [`EventScheduler`] and resumes one process per dispatched
/// signal. Races between resource acquisition and a timeout are resolved
/// by dispatch order: the first of the two signals to be dispatched wins,
/// and the losing branch is cancelled on the spot. A queued request is
/// withdrawn from the resource queue, a granted-but-undispatched slot is
/// handed to the next waiter, and a stale timer is ignored when it
/// eventually surfaces.
pub struct ProcessRuntime<M> {
    scheduler: EventScheduler<Signal>,
    processes: HashMap<ProcessId, Box<dyn Process<M>>>,
    tickets: HashMap<TicketId, Ticket>,
    pool: ResourcePool,
    model: M,
    rng: StdRng,
    next_process: u64,
    next_ticket: u64,
}

impl<M> ProcessRuntime<M> {
    /// Create a runtime over `model` and `pool`, drawing randomness from
    /// the caller-supplied generator only.
    pub fn new(model: M, pool: ResourcePool, rng: StdRng) -> Self {
        Self {
            scheduler: EventScheduler::new(),
            processes: HashMap::new(),
            tickets: HashMap::new(),
            pool,
            model,
            rng,
            next_process: 0,
            next_ticket: 0,
        }
    }

    /// Current simulated time.
    pub fn now(&self) -> SimTime {
        self.scheduler.now()
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn resources(&self) -> &ResourcePool {
        &self.pool
    }

    /// Consume the runtime and hand back the model for inspection.
    pub fn into_model(self) -> M {
        self.model
    }

    /// Register a process; its first resume happens `delay` units from now
    /// with [`Wake::Timer`].
    pub fn spawn(
        &mut self,
        process: Box<dyn Process<M>>,
        delay: SimTime,
    ) -> Result<ProcessId, SimError> {
        let pid = ProcessId(self.next_process);
        self.scheduler.schedule(delay, Signal::Resume(pid))?;
        self.next_process += 1;
        self.processes.insert(pid, process);
        Ok(pid)
    }

    /// Dispatch events until the queue is empty or the next event lies
    /// beyond `horizon`, then advance the clock to the horizon. Both are
    /// normal termination. Repeated calls continue from where the previous
    /// run stopped.
    pub fn run_until(&mut self, horizon: SimTime) -> Result<(), SimError> {
        while let Some(signal) = self.scheduler.pop_due(horizon) {
            self.dispatch(signal)?;
        }
        self.scheduler.advance_to(horizon);
        Ok(())
    }

    fn dispatch(&mut self, signal: Signal) -> Result<(), SimError> {
        match signal {
            Signal::Resume(process) => self.resume(process, Wake::Timer),
            Signal::Grant { process, ticket } => {
                // Stale when the patience timer dispatched first at the
                // same instant and already resolved the race.
                if self.tickets.remove(&ticket).is_none() {
                    return Ok(());
                }
                self.resume(process, Wake::Granted)
            }
            Signal::Patience { process, ticket } => {
                let pending = match self.tickets.remove(&ticket) {
                    Some(pending) => pending,
                    // The grant was dispatched earlier; nothing to cancel.
                    None => return Ok(()),
                };
                match pending.state {
                    TicketState::Waiting => self.pool.withdraw(pending.resource, ticket),
                    // The slot was granted but the grant signal has not
                    // been dispatched yet: the timer wins the race, the
                    // slot goes straight to the next waiter and the grant
                    // signal dies as stale.
                    TicketState::Holding => self.grant_next(pending.resource)?,
                }
                self.resume(process, Wake::TimedOut)
            }
        }
    }

    fn resume(&mut self, pid: ProcessId, wake: Wake) -> Result<(), SimError> {
        let mut process = match self.processes.remove(&pid) {
            Some(process) => process,
            None => {
                warn!("dropping signal for unknown {}", pid);
                return Ok(());
            }
        };

        debug!("t={:.4} resume {} ({:?})", self.scheduler.now(), pid, wake);

        let mut spawned = Vec::new();
        let mut released = Vec::new();
        let directive = {
            let mut ctx = Context {
                now: self.scheduler.now(),
                model: &mut self.model,
                resources: &mut self.pool,
                rng: &mut self.rng,
                spawned: &mut spawned,
                released: &mut released,
            };
            process.resume(wake, &mut ctx)
        };

        for (child, delay) in spawned {
            self.spawn(child, delay)?;
        }
        for resource in released {
            self.grant_next(resource)?;
        }

        match directive {
            Directive::Sleep(delay) => {
                self.scheduler.schedule(delay, Signal::Resume(pid))?;
                self.processes.insert(pid, process);
            }
            Directive::AwaitOrTimeout { resource, timeout } => {
                let ticket = TicketId(self.next_ticket);
                self.next_ticket += 1;
                match self.pool.request(resource, ticket) {
                    Acquire::Granted => {
                        // Free slot: the grant resolves at this same
                        // instant, so no patience timer is ever created.
                        self.tickets.insert(
                            ticket,
                            Ticket {
                                process: pid,
                                resource,
                                state: TicketState::Holding,
                            },
                        );
                        self.scheduler
                            .schedule(0.0, Signal::Grant { process: pid, ticket })?;
                    }
                    Acquire::Queued => {
                        self.tickets.insert(
                            ticket,
                            Ticket {
                                process: pid,
                                resource,
                                state: TicketState::Waiting,
                            },
                        );
                        self.scheduler
                            .schedule(timeout, Signal::Patience { process: pid, ticket })?;
                    }
                }
                self.processes.insert(pid, process);
            }
            Directive::Halt => {
                debug!("t={:.4} halt {}", self.scheduler.now(), pid);
            }
        }
        Ok(())
    }

    /// Hand a freed slot to the head of the queue and put its grant signal
    /// in flight.
    fn grant_next(&mut self, resource: ResourceId) -> Result<(), SimError> {
        let next = match self.pool.release(resource) {
            Some(next) => next,
            None => return Ok(()),
        };
        let ticket = match self.tickets.get_mut(&next) {
            Some(ticket) => ticket,
            None => {
                warn!("granted {} on {} has no pending race", next, resource);
                return Ok(());
            }
        };
        ticket.state = TicketState::Holding;
        let process = ticket.process;
        self.scheduler
            .schedule(0.0, Signal::Grant { process, ticket: next })
    }
}

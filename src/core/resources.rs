use std::collections::VecDeque;

use super::types::{ResourceId, TicketId};

/// Outcome of a resource request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acquire {
    /// The slot was free; the requester holds it immediately.
    Granted,
    /// The slot is busy; the request joined the FIFO queue.
    Queued,
}

/// A single-capacity service channel with a FIFO queue of waiting tickets.
#[derive(Debug, Default)]
struct Resource {
    holder: Option<TicketId>,
    queue: VecDeque<TicketId>,
}

/// Collection of finite-capacity resources addressed by [`ResourceId`].
///
/// Queue lengths change only as a side effect of `request`, `release` and
/// `withdraw`; observers never mutate them.
#[derive(Debug, Default)]
pub struct ResourcePool {
    resources: Vec<Resource>,
}

impl ResourcePool {
    pub fn new() -> Self {
        Self {
            resources: Vec::new(),
        }
    }

    /// Add a resource and return its handle.
    pub fn add_resource(&mut self) -> ResourceId {
        self.resources.push(Resource::default());
        ResourceId(self.resources.len() - 1)
    }

    /// Number of resources in the pool.
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Number of requests waiting on `resource`. The current holder is not
    /// counted.
    pub fn queue_len(&self, resource: ResourceId) -> usize {
        self.resources[resource.0].queue.len()
    }

    /// Current holder of `resource`, if any.
    pub fn holder(&self, resource: ResourceId) -> Option<TicketId> {
        self.resources[resource.0].holder
    }

    /// Request the slot for `ticket`: grants immediately when free,
    /// otherwise appends the ticket to the FIFO queue.
    pub fn request(&mut self, resource: ResourceId, ticket: TicketId) -> Acquire {
        let res = &mut self.resources[resource.0];
        if res.holder.is_none() {
            res.holder = Some(ticket);
            Acquire::Granted
        } else {
            res.queue.push_back(ticket);
            Acquire::Queued
        }
    }

    /// Release the slot on `resource`. The head of the queue, if any,
    /// becomes the new holder and is returned.
    pub fn release(&mut self, resource: ResourceId) -> Option<TicketId> {
        let res = &mut self.resources[resource.0];
        res.holder = res.queue.pop_front();
        res.holder
    }

    /// Withdraw a queued request that lost its race. A ticket that is not
    /// queued on `resource` is left untouched.
    pub fn withdraw(&mut self, resource: ResourceId, ticket: TicketId) {
        let res = &mut self.resources[resource.0];
        if let Some(pos) = res.queue.iter().position(|queued| *queued == ticket) {
            res.queue.remove(pos);
        }
    }
}

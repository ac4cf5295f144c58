//! Shared simulation context handed to every role.

use crate::customer_queue::CustomerQueue;
use crate::events::EventLog;
use crate::types::Customer;

/// The two shared stages plus the event record, constructed once per run.
pub struct CallCenter {
    /// Customers who have arrived but not been greeted.
    pub arrivals: CustomerQueue<Customer>,
    /// Greeted customers waiting for an agent.
    pub dispatch: CustomerQueue<Customer>,
    pub events: EventLog,
}

impl CallCenter {
    pub fn new(echo: bool) -> Self {
        Self {
            arrivals: CustomerQueue::new(),
            dispatch: CustomerQueue::new(),
            events: EventLog::new(echo),
        }
    }

    /// Drain both queues; a finished run should find nothing left.
    pub fn drain_leftovers(&self) -> usize {
        let mut leftover = 0usize;
        while self.arrivals.try_pop().is_some() {
            leftover += 1;
        }
        while self.dispatch.try_pop().is_some() {
            leftover += 1;
        }
        leftover
    }
}

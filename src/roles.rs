//! The three thread roles: customer arrival, the greeter, and agents.
//!
//! Every loop here ends on a count, never on an empty queue: a consumer
//! cannot tell "empty because done" from "empty because the next producer
//! has not run yet".

use std::thread;

use crate::call_center::CallCenter;
use crate::config::DelayRange;
use crate::log_dev;
use crate::types::{AgentId, Customer, CustomerId};

/// A customer walks in: enqueue and leave without waiting for service.
pub fn arrive(center: &CallCenter, id: CustomerId) {
    center.arrivals.push(Customer::new(id));
    log_dev!("[ARRIVAL] customer {id} queued");
}

/// Single relay moving customers from arrivals to dispatch.
pub struct Greeter {
    total_customers: usize,
    greeted: usize,
}

impl Greeter {
    pub fn new(total_customers: usize) -> Self {
        Self {
            total_customers,
            greeted: 0,
        }
    }

    /// Greet until the configured total is reached; returns the count.
    pub fn run(mut self, center: &CallCenter) -> usize {
        while self.greeted < self.total_customers {
            let customer = center.arrivals.pop_blocking();
            // Position and greet line are produced under the dispatch lock,
            // before any agent can take this customer.
            let position = center.dispatch.push_placed(customer, |customer, position| {
                center.events.record_greet(customer.id, position);
            });
            self.greeted += 1;
            log_dev!(
                "[GREETER] greeted {}/{} position={position}",
                self.greeted,
                self.total_customers
            );
        }
        self.greeted
    }
}

/// One member of the serving pool.
pub struct Agent {
    id: AgentId,
    quota: usize,
    served: usize,
    service_delay: DelayRange,
}

impl Agent {
    pub fn new(id: AgentId, quota: usize, service_delay: DelayRange) -> Self {
        Self {
            id,
            quota,
            served: 0,
            service_delay,
        }
    }

    /// Serve until this agent's quota is met; returns the count.
    pub fn run(mut self, center: &CallCenter) -> usize {
        while self.served < self.quota {
            let customer = center.dispatch.pop_blocking();
            self.serve(center, customer);
            self.served += 1;
        }
        log_dev!("[AGENT] agent {} done served={}", self.id, self.served);
        self.served
    }

    // No queue lock is held here; agents serve independently.
    fn serve(&self, center: &CallCenter, customer: Customer) {
        center.events.record_serve(self.id, customer.id);
        let delay = self.service_delay.sample();
        if !delay.is_zero() {
            thread::sleep(delay);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Event;
    use std::collections::HashSet;
    use std::sync::{mpsc, Arc};
    use std::time::Duration;

    #[test]
    fn arrival_enqueues_and_returns() {
        let center = CallCenter::new(false);
        arrive(&center, 1);
        arrive(&center, 2);
        assert_eq!(center.arrivals.len(), 2);
        assert_eq!(center.arrivals.pop_blocking().id, 1);
    }

    #[test]
    fn simultaneous_arrivals_keep_order_and_positions() {
        let center = CallCenter::new(false);
        // Both arrive before the greeter ever wakes.
        arrive(&center, 1);
        arrive(&center, 2);

        let greeted = Greeter::new(2).run(&center);
        assert_eq!(greeted, 2);
        assert_eq!(
            center.events.snapshot(),
            vec![
                Event::Greeted {
                    customer: 1,
                    position: 1
                },
                Event::Greeted {
                    customer: 2,
                    position: 2
                },
            ]
        );
        assert_eq!(center.dispatch.len(), 2);
        assert!(center.arrivals.is_empty());
    }

    #[test]
    fn greeter_blocks_until_customers_arrive() {
        let center = Arc::new(CallCenter::new(false));
        let (tx, rx) = mpsc::channel();
        let handle = {
            let center = Arc::clone(&center);
            thread::spawn(move || {
                let greeted = Greeter::new(3).run(&center);
                tx.send(greeted).expect("send greeted");
            })
        };

        for id in 1..=2 {
            arrive(&center, id);
        }
        // Two of three customers are not enough to finish.
        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());

        arrive(&center, 3);
        let greeted = rx
            .recv_timeout(Duration::from_secs(1))
            .expect("greeter finished");
        assert_eq!(greeted, 3);
        handle.join().expect("greeter thread panicked");
        assert_eq!(center.dispatch.len(), 3);
    }

    #[test]
    fn agent_stops_at_quota() {
        let center = CallCenter::new(false);
        for id in 1..=5 {
            center.dispatch.push(Customer::new(id));
        }
        let served = Agent::new(1, 3, DelayRange::none()).run(&center);
        assert_eq!(served, 3);
        // Two customers remain for other agents.
        assert_eq!(center.dispatch.len(), 2);
        assert_eq!(
            center.events.snapshot(),
            vec![
                Event::Serving {
                    agent: 1,
                    customer: 1
                },
                Event::Serving {
                    agent: 1,
                    customer: 2
                },
                Event::Serving {
                    agent: 1,
                    customer: 3
                },
            ]
        );
    }

    #[test]
    fn agents_share_dispatch_without_duplicates() {
        let center = Arc::new(CallCenter::new(false));
        let agents = 3u64;
        let quota = 4usize;
        let mut handles = Vec::new();
        for agent_id in 1..=agents {
            let center = Arc::clone(&center);
            handles.push(thread::spawn(move || {
                Agent::new(agent_id, quota, DelayRange::new(0, 2)).run(&center)
            }));
        }
        for id in 1..=agents * quota as u64 {
            center.dispatch.push(Customer::new(id));
        }

        let served: usize = handles
            .into_iter()
            .map(|handle| handle.join().expect("agent thread panicked"))
            .sum();
        assert_eq!(served, agents as usize * quota);

        let mut seen = HashSet::new();
        for event in center.events.snapshot() {
            if let Event::Serving { customer, .. } = event {
                assert!(seen.insert(customer), "customer {customer} served twice");
            }
        }
        assert_eq!(seen.len(), served);
    }
}

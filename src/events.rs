//! Ordered record of greet/serve events and the post-run audit over it.

use std::collections::HashSet;
use std::fmt;
use std::io::{self, Write};
use std::sync::Mutex;

use crate::log_dev;
use crate::types::{AgentId, CustomerId};

/// Observable per-customer event, in the order it happened.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    Greeted {
        customer: CustomerId,
        position: usize,
    },
    Serving {
        agent: AgentId,
        customer: CustomerId,
    },
}

/// Append-only event sequence shared by the greeter and agents.
///
/// Its lock is a leaf: callers may hold a queue lock while recording, but
/// never take a queue lock while holding this one.
pub struct EventLog {
    state: Mutex<LogState>,
}

struct LogState {
    events: Vec<Event>,
    /// Where echoed lines go; dropped after the first failed write.
    sink: Option<Box<dyn Write + Send>>,
}

impl LogState {
    fn echo(&mut self, line: fmt::Arguments<'_>) {
        let Some(sink) = self.sink.as_mut() else {
            return;
        };
        if let Err(err) = writeln!(sink, "{line}") {
            // A closed stdout must not take a role down with it.
            log_dev!("[EVENTS] echo disabled: {err}");
            self.sink = None;
        }
    }
}

impl EventLog {
    pub fn new(echo: bool) -> Self {
        let sink = echo.then(|| Box::new(io::stdout()) as Box<dyn Write + Send>);
        Self::with_sink(sink)
    }

    fn with_sink(sink: Option<Box<dyn Write + Send>>) -> Self {
        Self {
            state: Mutex::new(LogState {
                events: Vec::new(),
                sink,
            }),
        }
    }

    pub fn record_greet(&self, customer: CustomerId, position: usize) {
        let mut guard = self.state.lock().expect("event log mutex poisoned");
        guard.events.push(Event::Greeted { customer, position });
        guard.echo(format_args!(
            "Greeting customer {customer}: your place in queue is {position}"
        ));
    }

    pub fn record_serve(&self, agent: AgentId, customer: CustomerId) {
        let mut guard = self.state.lock().expect("event log mutex poisoned");
        guard.events.push(Event::Serving { agent, customer });
        guard.echo(format_args!("Agent {agent} is serving customer {customer}"));
    }

    pub fn snapshot(&self) -> Vec<Event> {
        let guard = self.state.lock().expect("event log mutex poisoned");
        guard.events.clone()
    }
}

/// Invariant violations found in one run's event sequence.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Audit {
    pub duplicate_greets: usize,
    pub duplicate_serves: usize,
    /// Serve events with no earlier greet for the same customer.
    pub served_before_greeted: usize,
    /// Customers in `1..=total` never greeted.
    pub missing_greets: usize,
    /// Customers in `1..=total` never served.
    pub missing_serves: usize,
    /// Positions below 1 or above what the dispatch queue could hold.
    pub position_violations: usize,
}

impl Audit {
    pub fn from_events(events: &[Event], total_customers: usize) -> Self {
        let mut audit = Audit::default();
        let mut greeted = HashSet::new();
        let mut served = HashSet::new();
        let mut prior_greets = 0usize;
        let mut prior_serves = 0usize;

        for event in events {
            match *event {
                Event::Greeted { customer, position } => {
                    // Pops happen before their serve event is recorded, so
                    // the dispatch queue held at most greets minus serves.
                    let upper = prior_greets.saturating_sub(prior_serves) + 1;
                    if position == 0 || position > upper {
                        audit.position_violations += 1;
                    }
                    if !greeted.insert(customer) {
                        audit.duplicate_greets += 1;
                    }
                    prior_greets += 1;
                }
                Event::Serving { customer, .. } => {
                    if !greeted.contains(&customer) {
                        audit.served_before_greeted += 1;
                    }
                    if !served.insert(customer) {
                        audit.duplicate_serves += 1;
                    }
                    prior_serves += 1;
                }
            }
        }

        for id in 1..=total_customers as CustomerId {
            if !greeted.contains(&id) {
                audit.missing_greets += 1;
            }
            if !served.contains(&id) {
                audit.missing_serves += 1;
            }
        }
        audit
    }

    pub fn is_clean(&self) -> bool {
        *self == Audit::default()
    }

    /// `(name, count)` for every non-zero violation, for reporting.
    pub fn violations(&self) -> Vec<(&'static str, usize)> {
        [
            ("duplicate_greets", self.duplicate_greets),
            ("duplicate_serves", self.duplicate_serves),
            ("served_before_greeted", self.served_before_greeted),
            ("missing_greets", self.missing_greets),
            ("missing_serves", self.missing_serves),
            ("position_bound", self.position_violations),
        ]
        .into_iter()
        .filter(|(_, count)| *count > 0)
        .collect()
    }
}

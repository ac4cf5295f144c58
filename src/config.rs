//! Run configuration and startup validation.

use std::time::Duration;

use rand::Rng;

use crate::error::ConfigError;

/// Inclusive millisecond range sampled uniformly for simulated delays.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DelayRange {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl DelayRange {
    pub const fn new(min_ms: u64, max_ms: u64) -> Self {
        Self { min_ms, max_ms }
    }

    pub const fn none() -> Self {
        Self::new(0, 0)
    }

    /// Draw one delay; a degenerate range always yields its single value.
    pub fn sample(&self) -> Duration {
        if self.max_ms <= self.min_ms {
            return Duration::from_millis(self.min_ms);
        }
        let ms = rand::rng().random_range(self.min_ms..=self.max_ms);
        Duration::from_millis(ms)
    }

    fn check(&self, name: &'static str) -> Result<(), ConfigError> {
        if self.min_ms > self.max_ms {
            return Err(ConfigError::InvertedDelay {
                name,
                min_ms: self.min_ms,
                max_ms: self.max_ms,
            });
        }
        Ok(())
    }
}

/// Everything a run needs, fixed at startup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SimConfig {
    pub agents: usize,
    pub customers_per_agent: usize,
    /// Number of customers the arrival generator creates.
    pub total_customers: usize,
    /// Size of the fixed worker pool running every role.
    pub workers: usize,
    /// Pause between submitting consecutive customers.
    pub arrival_delay: DelayRange,
    /// Time an agent spends with each customer.
    pub service_delay: DelayRange,
    /// Print the per-customer greet and serve lines.
    pub echo: bool,
}

impl SimConfig {
    /// Quiet config with no delays and the smallest pool that can run.
    pub fn new(agents: usize, customers_per_agent: usize) -> Self {
        Self {
            agents,
            customers_per_agent,
            total_customers: agents.saturating_mul(customers_per_agent),
            workers: agents.saturating_add(2),
            arrival_delay: DelayRange::none(),
            service_delay: DelayRange::none(),
            echo: false,
        }
    }

    /// 3 agents x 5 customers on 8 workers with human-scale delays.
    pub fn demo() -> Self {
        Self::new(3, 5)
            .with_workers(8)
            .with_arrival_delay(DelayRange::new(0, 149))
            .with_service_delay(DelayRange::new(10, 999))
            .with_echo(true)
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_total_customers(mut self, total: usize) -> Self {
        self.total_customers = total;
        self
    }

    pub fn with_arrival_delay(mut self, delay: DelayRange) -> Self {
        self.arrival_delay = delay;
        self
    }

    pub fn with_service_delay(mut self, delay: DelayRange) -> Self {
        self.service_delay = delay;
        self
    }

    pub fn with_echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }

    /// Reject any configuration that would hang or leave quotas unmet.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.agents == 0 {
            return Err(ConfigError::NoAgents);
        }
        if self.customers_per_agent == 0 {
            return Err(ConfigError::NoCustomersPerAgent);
        }
        let expected = self
            .agents
            .checked_mul(self.customers_per_agent)
            .ok_or(ConfigError::TotalOverflow {
                agents: self.agents,
                per_agent: self.customers_per_agent,
            })?;
        if self.total_customers != expected {
            return Err(ConfigError::QuotaMismatch {
                total: self.total_customers,
                agents: self.agents,
                per_agent: self.customers_per_agent,
            });
        }
        // Greeter plus every agent may be parked at once; customers still
        // need a free worker to arrive.
        let busy_roles = self.agents.saturating_add(1);
        if self.workers <= busy_roles {
            return Err(ConfigError::PoolTooSmall {
                workers: self.workers,
                required_over: busy_roles,
            });
        }
        self.arrival_delay.check("arrival")?;
        self.service_delay.check("service")?;
        Ok(())
    }
}

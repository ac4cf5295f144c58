//! Shared identifiers and the customer model used across the call center.

/// Sequential, 1-based identifier assigned to a customer at arrival.
pub type CustomerId = u64;
/// 1-based identifier for an agent.
pub type AgentId = u64;

/// A caller moving through the arrival and dispatch stages.
#[derive(Debug, PartialEq, Eq)]
pub struct Customer {
    /// Stable identity used in output and audits.
    pub id: CustomerId,
}

impl Customer {
    pub fn new(id: CustomerId) -> Self {
        Self { id }
    }
}

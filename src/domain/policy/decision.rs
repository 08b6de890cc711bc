use std::fmt;

use crate::domain::network::network_model::BlockingResource;
use crate::domain::network::topology::NetworkPath;
use crate::domain::outcome::Decision;
use crate::domain::utils::id::NodeId;

/// Route of an offload candidate. Inside an `Offload` decision its reservations are committed.
#[derive(Debug, Clone, PartialEq)]
pub struct OffloadRoute {
    pub access_node: NodeId,
    pub destination: NodeId,
    pub path: NetworkPath,
    pub size_bits: f64,
    /// Serial relay transfer time over the path links.
    pub transfer_time_s: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionReason {
    LowerLocalScore,
    LowerOffloadScore,
    NoDestination,
    NoPath,
    LinkCapacity,
    Explore,
    Exploit,
}

impl fmt::Display for DecisionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            DecisionReason::LowerLocalScore => "score_local",
            DecisionReason::LowerOffloadScore => "score_offload",
            DecisionReason::NoDestination => "no_server",
            DecisionReason::NoPath => "no_path",
            DecisionReason::LinkCapacity => "link_capacity",
            DecisionReason::Explore => "explore",
            DecisionReason::Exploit => "exploit",
        };
        write!(f, "{}", text)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DecisionOutcome {
    Local,
    /// Admitted offload; its reservations are committed.
    Offload(OffloadRoute),
    /// Admission failed on `blocking`; nothing was committed.
    DropByCapacity { blocking: BlockingResource, destination: NodeId },
}

/// What the policy decided for one task, before execution.
#[derive(Debug, Clone, PartialEq)]
pub struct PolicyDecision {
    pub outcome: DecisionOutcome,
    pub reason: DecisionReason,
}

impl PolicyDecision {
    pub fn local(reason: DecisionReason) -> Self {
        Self { outcome: DecisionOutcome::Local, reason }
    }

    pub fn offload(route: OffloadRoute, reason: DecisionReason) -> Self {
        Self { outcome: DecisionOutcome::Offload(route), reason }
    }

    pub fn drop_by_capacity(blocking: BlockingResource, destination: NodeId) -> Self {
        Self { outcome: DecisionOutcome::DropByCapacity { blocking, destination }, reason: DecisionReason::LinkCapacity }
    }

    pub fn decision(&self) -> Decision {
        match self.outcome {
            DecisionOutcome::Local => Decision::Local,
            DecisionOutcome::Offload(_) => Decision::Offload,
            DecisionOutcome::DropByCapacity { .. } => Decision::DropByCapacity,
        }
    }
}

//! Lifecycle phases and the participant capabilities bound to them.

use std::fmt;

/// One stage of the startup/shutdown protocol.
///
/// The declaration order is the execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Phase {
    PreStart,
    Start,
    PostStart,
    Run,
    PreStop,
    Stop,
    PostStop,
}

impl Phase {
    /// Every phase, in execution order.
    pub const ALL: [Phase; 7] = [
        Phase::PreStart,
        Phase::Start,
        Phase::PostStart,
        Phase::Run,
        Phase::PreStop,
        Phase::Stop,
        Phase::PostStop,
    ];

    /// Stable label used in logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::PreStart => "pre_start",
            Phase::Start => "start",
            Phase::PostStart => "post_start",
            Phase::Run => "run",
            Phase::PreStop => "pre_stop",
            Phase::Stop => "stop",
            Phase::PostStop => "post_stop",
        }
    }

    /// The participant capability fanned out in this phase, if any.
    pub fn capability(&self) -> Option<Capability> {
        match self {
            Phase::PreStart => Some(Capability::PreStart),
            Phase::Start => Some(Capability::Start),
            Phase::PostStart => Some(Capability::PostStart),
            Phase::Run => None,
            Phase::PreStop => Some(Capability::PreStop),
            Phase::Stop => Some(Capability::Stop),
            Phase::PostStop => Some(Capability::PostStop),
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A participant contract resolved from the registry for one phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    PreStart,
    Start,
    PostStart,
    PreStop,
    Stop,
    PostStop,
}

impl Capability {
    pub const ALL: [Capability; 6] = [
        Capability::PreStart,
        Capability::Start,
        Capability::PostStart,
        Capability::PreStop,
        Capability::Stop,
        Capability::PostStop,
    ];

    /// Capabilities implemented by a plain hosted service.
    pub const HOSTED_SERVICE: [Capability; 2] = [Capability::Start, Capability::Stop];

    /// The phase this capability is invoked in.
    pub fn phase(&self) -> Phase {
        match self {
            Capability::PreStart => Phase::PreStart,
            Capability::Start => Phase::Start,
            Capability::PostStart => Phase::PostStart,
            Capability::PreStop => Phase::PreStop,
            Capability::Stop => Phase::Stop,
            Capability::PostStop => Phase::PostStop,
        }
    }

    /// Name of the participant method dispatched for this capability.
    pub fn method_name(&self) -> &'static str {
        match self {
            Capability::PreStart => "Participant::pre_start",
            Capability::Start => "Participant::start",
            Capability::PostStart => "Participant::post_start",
            Capability::PreStop => "Participant::pre_stop",
            Capability::Stop => "Participant::stop",
            Capability::PostStop => "Participant::post_stop",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.method_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_order_is_total() {
        let mut sorted = Phase::ALL;
        sorted.sort();
        assert_eq!(sorted, Phase::ALL);
        assert!(Phase::PostStart < Phase::Run);
        assert!(Phase::Run < Phase::PreStop);
    }

    #[test]
    fn test_capability_phase_mapping() {
        for capability in Capability::ALL {
            assert_eq!(capability.phase().capability(), Some(capability));
        }
        assert_eq!(Phase::Run.capability(), None);
    }
}

//! Connection state tracking.

/// Where the connection stands in its request/response cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProtocolState {
    /// Idle and able to send the next request group.
    #[default]
    Ready,
    /// A request group has been written; its reply chain is being read.
    AwaitingResponse,
    /// A transport or framing error left the byte stream out of sync.
    Poisoned,
}

impl ProtocolState {
    /// Whether a new request can be sent.
    #[must_use]
    pub fn is_usable(&self) -> bool {
        matches!(self, Self::Ready)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_ready_is_usable() {
        assert!(ProtocolState::Ready.is_usable());
        assert!(!ProtocolState::AwaitingResponse.is_usable());
        assert!(!ProtocolState::Poisoned.is_usable());
        assert_eq!(ProtocolState::default(), ProtocolState::Ready);
    }
}

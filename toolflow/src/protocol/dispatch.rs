//! Protocol dispatch: protocol id -> adapter.

use std::collections::BTreeSet;

use tokio::sync::{mpsc, oneshot};

use super::{
    DispatchError, DuplexAdapter, ProtocolAdapter, ProtocolKind, ResponseAdapter,
    ResponseMode, SseAdapter,
};
use crate::filter::ProtocolFilter;
use crate::wire::AgentResponse;

/// Writer side of a client connection, handed to [`ProtocolDispatcher::open_session`].
#[derive(Debug)]
pub enum Transport {
    /// Single aggregated response.
    Response(oneshot::Sender<AgentResponse>),
    /// One-way push of text frames (SSE body).
    Push(mpsc::Sender<String>),
    /// Outbound half of a bidirectional connection.
    Duplex(mpsc::Sender<String>),
}

impl Transport {
    pub fn name(&self) -> &'static str {
        match self {
            Transport::Response(_) => "response",
            Transport::Push(_) => "push",
            Transport::Duplex(_) => "duplex",
        }
    }
}

/// Enabled protocols plus a [`ProtocolFilter`]; a protocol is available only when it is
/// enabled and the filter allows it.
#[derive(Clone, Debug)]
pub struct ProtocolDispatcher {
    enabled: BTreeSet<ProtocolKind>,
    filter: ProtocolFilter,
}

impl Default for ProtocolDispatcher {
    fn default() -> Self {
        Self {
            enabled: ProtocolKind::ALL.into_iter().collect(),
            filter: ProtocolFilter::AllowAll,
        }
    }
}

impl ProtocolDispatcher {
    /// All protocols enabled, no filter.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_enabled(kinds: impl IntoIterator<Item = ProtocolKind>) -> Self {
        Self {
            enabled: kinds.into_iter().collect(),
            filter: ProtocolFilter::AllowAll,
        }
    }

    pub fn with_filter(mut self, filter: ProtocolFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn enable(&mut self, kind: ProtocolKind) {
        self.enabled.insert(kind);
    }

    pub fn disable(&mut self, kind: ProtocolKind) {
        self.enabled.remove(&kind);
    }

    pub fn is_available(&self, kind: ProtocolKind) -> bool {
        self.enabled.contains(&kind) && self.filter.allows(kind)
    }

    pub fn available(&self) -> Vec<ProtocolKind> {
        ProtocolKind::ALL
            .into_iter()
            .filter(|k| self.is_available(*k))
            .collect()
    }

    /// Maps a protocol id to its kind.
    ///
    /// # Errors
    ///
    /// `UnsupportedProtocol` for an unknown id, `ProtocolDisabled` for a known one that
    /// is not available.
    pub fn resolve_adapter(&self, protocol_id: &str) -> Result<ProtocolKind, DispatchError> {
        let kind: ProtocolKind = protocol_id.parse()?;
        if !self.is_available(kind) {
            return Err(DispatchError::ProtocolDisabled(kind));
        }
        Ok(kind)
    }

    /// Resolves the protocol and checks the requested mode against it. An absent mode
    /// takes the protocol's own.
    pub fn check(&self, protocol_id: &str, mode: Option<&str>) -> Result<ProtocolKind, DispatchError> {
        let kind = self.resolve_adapter(protocol_id)?;
        if let Some(mode) = mode {
            let mode: ResponseMode = mode.parse()?;
            if mode != kind.mode() {
                return Err(DispatchError::IncompatibleMode {
                    protocol: kind,
                    mode,
                });
            }
        }
        Ok(kind)
    }

    /// Creates the adapter for `kind` over `transport`.
    pub fn open_session(
        &self,
        kind: ProtocolKind,
        transport: Transport,
    ) -> Result<Box<dyn ProtocolAdapter>, DispatchError> {
        if !self.is_available(kind) {
            return Err(DispatchError::ProtocolDisabled(kind));
        }
        match (kind, transport) {
            (ProtocolKind::Http, Transport::Response(tx)) => Ok(Box::new(ResponseAdapter::new(tx))),
            (ProtocolKind::Sse, Transport::Push(tx)) => Ok(Box::new(SseAdapter::new(tx))),
            (ProtocolKind::WebSocket, Transport::Duplex(tx)) => Ok(Box::new(DuplexAdapter::new(tx))),
            (protocol, transport) => Err(DispatchError::TransportMismatch {
                protocol,
                transport: transport.name(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::SessionState;

    #[test]
    fn resolves_known_ids() {
        let d = ProtocolDispatcher::new();
        assert_eq!(d.resolve_adapter("http").unwrap(), ProtocolKind::Http);
        assert_eq!(d.resolve_adapter("sse").unwrap(), ProtocolKind::Sse);
        assert_eq!(d.resolve_adapter("websocket").unwrap(), ProtocolKind::WebSocket);
        assert_eq!(
            d.resolve_adapter("grpc"),
            Err(DispatchError::UnsupportedProtocol("grpc".into()))
        );
    }

    /// **Scenario**: http with stream mode is incompatible; absent mode is derived.
    #[test]
    fn checks_mode_compatibility() {
        let d = ProtocolDispatcher::new();
        assert_eq!(
            d.check("http", Some("stream")),
            Err(DispatchError::IncompatibleMode {
                protocol: ProtocolKind::Http,
                mode: ResponseMode::Stream,
            })
        );
        assert_eq!(d.check("http", None).unwrap(), ProtocolKind::Http);
        assert_eq!(d.check("sse", Some("stream")).unwrap(), ProtocolKind::Sse);
        assert!(d.check("websocket", Some("sync")).is_err());
    }

    /// **Scenario**: disabled or filtered protocols are reported as disabled.
    #[test]
    fn disabled_and_filtered() {
        let mut d = ProtocolDispatcher::new();
        d.disable(ProtocolKind::Sse);
        assert_eq!(
            d.resolve_adapter("sse"),
            Err(DispatchError::ProtocolDisabled(ProtocolKind::Sse))
        );
        d.enable(ProtocolKind::Sse);
        assert!(d.resolve_adapter("sse").is_ok());

        let d = ProtocolDispatcher::new().with_filter(ProtocolFilter::named("http_only").unwrap());
        assert_eq!(d.available(), vec![ProtocolKind::Http]);
        assert!(d.resolve_adapter("websocket").is_err());
    }

    #[test]
    fn open_session_matches_transport() {
        let d = ProtocolDispatcher::new();
        let (tx, _rx) = mpsc::channel(1);
        let adapter = d.open_session(ProtocolKind::Sse, Transport::Push(tx)).unwrap();
        assert_eq!(adapter.kind(), ProtocolKind::Sse);
        assert_eq!(adapter.state(), SessionState::Idle);

        let (tx, _rx) = oneshot::channel();
        assert_eq!(
            d.open_session(ProtocolKind::Sse, Transport::Response(tx)).err(),
            Some(DispatchError::TransportMismatch {
                protocol: ProtocolKind::Sse,
                transport: "response",
            })
        );
    }
}

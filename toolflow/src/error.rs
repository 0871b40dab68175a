//! Top-level error type for the request pipeline.
//!
//! Each module keeps its own error enum; [`GatewayError`] wraps them so callers can use `?`
//! across the pipeline, and maps every variant to a stable wire error code.

use thiserror::Error;

use crate::config::ConfigError;
use crate::filter::PolicyError;
use crate::orchestrator::OrchestrationError;
use crate::protocol::{DispatchError, SessionError};
use crate::tool::RegistryError;
use crate::wire::CODE_EXECUTION_ERROR;

/// Any failure surfaced by the gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Policy(#[from] PolicyError),
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Orchestration(#[from] OrchestrationError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl GatewayError {
    /// Stable error code written into `{"error": {"code": ..}}`.
    pub fn code(&self) -> &'static str {
        match self {
            GatewayError::Registry(RegistryError::DuplicateName(_)) => "DUPLICATE_NAME",
            GatewayError::Registry(RegistryError::NotFound(_)) => "NOT_FOUND",
            GatewayError::Policy(PolicyError::InvalidPolicy(_)) => "INVALID_POLICY",
            GatewayError::Policy(PolicyError::UnknownPolicy(_)) => "UNKNOWN_POLICY",
            GatewayError::Dispatch(DispatchError::UnsupportedProtocol(_)) => "UNSUPPORTED_PROTOCOL",
            GatewayError::Dispatch(DispatchError::UnsupportedMode(_)) => "UNSUPPORTED_MODE",
            GatewayError::Dispatch(DispatchError::IncompatibleMode { .. })
            | GatewayError::Dispatch(DispatchError::TransportMismatch { .. }) => "INCOMPATIBLE_MODE",
            GatewayError::Dispatch(DispatchError::ProtocolDisabled(_)) => "PROTOCOL_DISABLED",
            GatewayError::Session(SessionError::InvalidRequest(_)) => "INVALID_REQUEST",
            GatewayError::Session(_) => "SESSION_CLOSED",
            GatewayError::Orchestration(_) => CODE_EXECUTION_ERROR,
            GatewayError::Config(_) => "CONFIG_ERROR",
            GatewayError::InvalidRequest(_) => "INVALID_REQUEST",
        }
    }

    /// True for errors caused by the request rather than the server.
    pub fn is_client_error(&self) -> bool {
        !matches!(
            self,
            GatewayError::Orchestration(_) | GatewayError::Config(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{ProtocolKind, ResponseMode};

    /// **Scenario**: each module error maps to its wire code.
    #[test]
    fn codes_per_variant() {
        let cases: Vec<(GatewayError, &str)> = vec![
            (RegistryError::DuplicateName("a".into()).into(), "DUPLICATE_NAME"),
            (RegistryError::NotFound("a".into()).into(), "NOT_FOUND"),
            (PolicyError::InvalidPolicy("x".into()).into(), "INVALID_POLICY"),
            (PolicyError::UnknownPolicy("x".into()).into(), "UNKNOWN_POLICY"),
            (
                DispatchError::UnsupportedProtocol("grpc".into()).into(),
                "UNSUPPORTED_PROTOCOL",
            ),
            (
                DispatchError::IncompatibleMode {
                    protocol: ProtocolKind::Http,
                    mode: ResponseMode::Stream,
                }
                .into(),
                "INCOMPATIBLE_MODE",
            ),
            (SessionError::Closed.into(), "SESSION_CLOSED"),
            (
                OrchestrationError::failed("model down").into(),
                "EXECUTION_ERROR",
            ),
            (GatewayError::InvalidRequest("empty".into()), "INVALID_REQUEST"),
        ];
        for (err, code) in cases {
            assert_eq!(err.code(), code, "{}", err);
        }
    }

    /// **Scenario**: Display of wrapped errors is the inner message.
    #[test]
    fn display_is_transparent() {
        let err: GatewayError = PolicyError::UnknownPolicy("p".into()).into();
        assert_eq!(err.to_string(), "unknown filter policy: p");
        assert!(err.is_client_error());
        let err: GatewayError = OrchestrationError::failed("x").into();
        assert!(!err.is_client_error());
    }
}

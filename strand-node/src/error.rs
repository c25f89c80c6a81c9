use thiserror::Error;

/// Errors that can occur in a chain instance.
#[derive(Debug, Error)]
pub enum NodeError {
    #[error("config error: {reason}")]
    ConfigError { reason: String },

    #[error("not authorized: {reason}")]
    NotAuthorized { reason: String },

    #[error("gauge error: {0}")]
    Gauge(#[from] strand_gauge::error::GaugeError),

    #[error("bridge error: {0}")]
    Bridge(#[from] strand_bridge::error::BridgeError),

    #[error("staking error: {0}")]
    Staking(#[from] strand_staking::error::StakingError),

    #[error("{0}")]
    Strand(#[from] strand_types::error::StrandError),

    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = NodeError::ConfigError {
            reason: "missing field".to_string(),
        };
        assert!(err.to_string().contains("missing field"));
    }

    #[test]
    fn test_io_error_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let node_err: NodeError = io_err.into();
        assert!(matches!(node_err, NodeError::IoError(_)));
    }

    #[test]
    fn test_gauge_error_from() {
        let err: NodeError = strand_gauge::error::GaugeError::GenesisNotSet.into();
        assert!(err.to_string().contains("genesis"));
    }
}

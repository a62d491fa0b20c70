use serde::Serialize;
use tracing::{info, info_span};

/// Server lifecycle event for audit logging.
/// Structured for JSON serialization to enable machine-readable audit trails.
#[derive(Debug, Serialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum AuditEvent {
    /// A caller asked the server to start.
    StartRequested {
        /// Configured gRPC port.
        grpc_port: u16,
        /// Configured REST port, `0` if disabled.
        rest_port: u16,
        /// Repository descriptor path.
        config_path: String,
    },
    /// Transports are bound and serving.
    ServerLive {
        /// Bound gRPC address.
        grpc_address: String,
        /// Bound REST address, if any.
        rest_address: Option<String>,
    },
    /// A start attempt failed.
    StartFailed {
        /// Symbolic status code.
        code: String,
        /// Failure detail.
        reason: String,
    },
    /// Transports stopped.
    ServerStopped {
        /// Why the server stopped.
        reason: String,
    },
}

/// Logs an audit event to the dedicated audit channel as structured JSON.
/// This uses a specific `target` which can be filtered by the subscriber to redirect to a secure file.
pub fn log_audit(event: &AuditEvent) {
    let span = info_span!(target: "audit", "audit_event");
    let _enter = span.enter();

    let json = serde_json::to_string(event).unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}"));
    info!(target: "audit", audit_json = %json, "Server Audit Event");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_audit_variants() {
        log_audit(&AuditEvent::StartRequested {
            grpc_port: 9178,
            rest_port: 0,
            config_path: "/tmp/config.yml".into(),
        });
        log_audit(&AuditEvent::ServerLive {
            grpc_address: "0.0.0.0:9178".into(),
            rest_address: None,
        });
        log_audit(&AuditEvent::StartFailed {
            code: "CONFIG_FILE_MISSING".into(),
            reason: "not found".into(),
        });
        log_audit(&AuditEvent::ServerStopped {
            reason: "shutdown".into(),
        });
    }

    #[test]
    fn test_audit_event_json_shape() {
        let json = serde_json::to_value(AuditEvent::StartFailed {
            code: "PORT_IN_USE".into(),
            reason: "0.0.0.0:9178".into(),
        })
        .unwrap();
        assert_eq!(json["event_type"], "start_failed");
        assert_eq!(json["code"], "PORT_IN_USE");
    }
}

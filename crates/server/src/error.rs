//! Structured errors for the frost-sw host.

use rmcp::model::{ErrorCode, ErrorData as McpError};

/// Errors raised by the host surface itself rather than the cache.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    /// Tool output could not be encoded.
    #[error("OUTPUT_ENCODING_FAILED: {0}")]
    OutputEncoding(String),
}

impl From<HostError> for McpError {
    fn from(err: HostError) -> Self {
        let (code, message) = match &err {
            HostError::OutputEncoding(msg) => (-32603, msg.clone()),
        };

        McpError { code: ErrorCode(code), message: message.into(), data: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_encoding_code() {
        let err: McpError = HostError::OutputEncoding("bad float".into()).into();
        assert_eq!(err.code.0, -32603);
        assert_eq!(err.message, "bad float");
    }
}

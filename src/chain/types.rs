//! Chain-specific types and error definitions.

use alloy::primitives::{Address, TxHash, U256};
use thiserror::Error;

/// JSON-RPC error code for an unknown method.
pub const METHOD_NOT_FOUND_CODE: i64 = -32601;

/// JSON-RPC error code nodes use for EVM execution errors.
pub const EXECUTION_ERROR_CODE: i64 = 3;

/// Errors that can occur during chain operations.
#[derive(Debug, Error)]
pub enum ChainError {
    /// The node lacks the impersonation or balance-override extensions.
    #[error("Node does not support {method}: {message}")]
    UnsupportedNode { method: String, message: String },

    /// RPC connection or request failed.
    #[error("RPC error in {method}: {message}")]
    Rpc { method: String, message: String },

    /// RPC request timed out.
    #[error("RPC timeout in {method} after {secs} seconds")]
    Timeout { method: String, secs: u64 },

    /// A call or transaction reverted; not yet attributed to a cause.
    #[error("Execution reverted: {reason}")]
    Reverted { reason: String, data: Option<String> },

    /// The token holder cannot cover the transfer.
    #[error("Insufficient balance: {holder} cannot cover {required} of token {token}")]
    InsufficientBalance {
        holder: Address,
        token: Address,
        required: U256,
        available: Option<U256>,
    },

    /// The token contract rejected the transfer for another reason.
    #[error("Transfer of {amount} of token {token} from {from} to {to} reverted: {reason}")]
    TransferReverted {
        token: Address,
        from: Address,
        to: Address,
        amount: U256,
        reason: String,
    },

    /// Impersonation handle was already released or belongs to another address.
    #[error("Impersonation of {0} is not active")]
    NotActive(Address),

    /// Transaction was not mined within the allowed time.
    #[error("Transaction {tx_hash} not mined after {secs} seconds")]
    ConfirmationTimeout { tx_hash: TxHash, secs: u64 },

    /// Chain configuration mismatch.
    #[error("Chain ID mismatch: expected {expected}, got {actual}")]
    ChainMismatch { expected: u64, actual: u64 },

    /// A value could not be parsed as an address.
    #[error("Invalid address '{0}'")]
    InvalidAddress(String),
}

impl ChainError {
    /// Transport-level failures that are safe to retry with backoff.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ChainError::Rpc { .. } | ChainError::Timeout { .. })
    }

    /// Build an [`ChainError::Rpc`] for the given method.
    pub fn rpc(method: &str, message: impl Into<String>) -> Self {
        ChainError::Rpc {
            method: method.to_string(),
            message: message.into(),
        }
    }
}

/// Result type for chain operations.
pub type ChainResult<T> = Result<T, ChainError>;

/// Map a JSON-RPC error payload onto the error taxonomy.
///
/// `data` is the raw JSON of the payload's `data` member, if any.
pub fn classify_error_payload(
    method: &str,
    code: i64,
    message: &str,
    data: Option<&str>,
) -> ChainError {
    let lower = message.to_lowercase();

    if code == METHOD_NOT_FOUND_CODE
        || lower.contains("method not found")
        || lower.contains("not supported")
        || lower.contains("unsupported method")
    {
        return ChainError::UnsupportedNode {
            method: method.to_string(),
            message: message.to_string(),
        };
    }

    if code == EXECUTION_ERROR_CODE || lower.contains("revert") {
        return ChainError::Reverted {
            reason: message.to_string(),
            data: data.map(|d| d.trim_matches('"').to_string()),
        };
    }

    ChainError::rpc(method, format!("{} (code {})", message, code))
}

/// Minimal view of a mined transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptSummary {
    /// Transaction hash.
    pub tx_hash: TxHash,
    /// Block the transaction was included in.
    pub block_number: Option<u64>,
    /// Whether execution succeeded.
    pub status: bool,
    /// Gas consumed by the transaction.
    pub gas_used: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_not_found_is_unsupported() {
        let err = classify_error_payload(
            "hardhat_impersonateAccount",
            -32601,
            "Method hardhat_impersonateAccount not found",
            None,
        );
        assert!(matches!(err, ChainError::UnsupportedNode { .. }));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_revert_message() {
        let err = classify_error_payload(
            "eth_sendTransaction",
            -32603,
            "Error: VM Exception while processing transaction: reverted with reason string 'ERC20: transfer amount exceeds balance'",
            None,
        );
        match err {
            ChainError::Reverted { reason, data } => {
                assert!(reason.contains("exceeds balance"));
                assert!(data.is_none());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_execution_error_code_keeps_data() {
        let err = classify_error_payload(
            "eth_estimateGas",
            3,
            "execution reverted",
            Some("\"0xe450d38c\""),
        );
        match err {
            ChainError::Reverted { data, .. } => assert_eq!(data.as_deref(), Some("0xe450d38c")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_other_errors_are_retryable_rpc() {
        let err = classify_error_payload("eth_call", -32000, "header not found", None);
        assert!(err.is_retryable());
        assert!(err.to_string().contains("code -32000"));
    }

    #[test]
    fn test_error_display() {
        let err = ChainError::Timeout {
            method: "eth_getBalance".to_string(),
            secs: 10,
        };
        assert_eq!(err.to_string(), "RPC timeout in eth_getBalance after 10 seconds");

        let err = ChainError::NotActive(Address::ZERO);
        assert!(err.to_string().contains("not active"));
    }
}

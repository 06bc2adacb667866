//! Error types for the Tessera ledger core.
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransactionError {
    #[error("serialization: {0}")] Serialization(String),
    #[error("value overflow")] ValueOverflow,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    #[error("source unavailable: {0}")] Unavailable(String),
    #[error("cell query failed: {0}")] Query(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignError {
    #[error("unknown lock script: {0}")] UnknownLock(String),
    #[error("signing failed: {0}")] Failed(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BroadcastError {
    #[error("rejected by node: {0}")] Rejected(String),
    #[error("transport: {0}")] Transport(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_serialization() {
        let e = TransactionError::Serialization("bad".into());
        assert_eq!(e.to_string(), "serialization: bad");
    }

    #[test]
    fn display_source_query() {
        let e = SourceError::Query("timeout".into());
        assert_eq!(e.to_string(), "cell query failed: timeout");
    }
}

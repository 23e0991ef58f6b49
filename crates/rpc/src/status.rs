//! Structured call status classes and the RPC error type.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Per-call status class, carried in the wire error envelope.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Code {
    Ok,
    InvalidArgument,
    NotFound,
    AlreadyExists,
    Unauthenticated,
    Aborted,
    DeadlineExceeded,
    Internal,
    Unavailable,
    Cancelled,
}

/// Status classes eligible for automatic re-attempt by the fabric.
///
/// Fixed by design; everything else is terminal on first failure.
pub const RETRYABLE_CODES: &[Code] = &[Code::NotFound, Code::Aborted, Code::DeadlineExceeded];

impl Code {
    /// Whether this class belongs to the fixed retryable set.
    pub fn is_retryable(self) -> bool {
        RETRYABLE_CODES.contains(&self)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Code::Ok => "ok",
            Code::InvalidArgument => "invalid_argument",
            Code::NotFound => "not_found",
            Code::AlreadyExists => "already_exists",
            Code::Unauthenticated => "unauthenticated",
            Code::Aborted => "aborted",
            Code::DeadlineExceeded => "deadline_exceeded",
            Code::Internal => "internal",
            Code::Unavailable => "unavailable",
            Code::Cancelled => "cancelled",
        }
    }
}

impl core::fmt::Display for Code {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An RPC call failure: a status class plus a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code}: {message}")]
pub struct RpcError {
    pub code: Code,
    pub message: String,
}

impl RpcError {
    pub fn new(code: Code, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Terminal errors are surfaced to the caller unchanged; retryable ones
    /// may be re-attempted within the channel's budget first.
    pub fn is_retryable(&self) -> bool {
        self.code.is_retryable()
    }
}

//! Error codes for the points API.
//!
//! Add new codes here; never pass ad-hoc strings as error codes.
//! All error codes are SCREAMING_SNAKE_CASE and map 1:1 to the strings
//! that appear in HTTP responses.

use core::fmt;

/// Centralized error codes for the points API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Authentication & Authorization
    /// Authentication required
    Unauthorized,
    /// Missing or malformed Bearer token
    UnauthorizedMissingBearer,
    /// Access denied by the hosted service
    Forbidden,
    /// Operation is reserved for teachers
    InsufficientRole,
    /// Authenticated user has no profile (and so no role)
    NoProfile,

    // Request Validation
    /// General validation error
    ValidationError,
    /// General bad request error
    BadRequest,
    /// Student identifier missing or malformed
    InvalidIdentifier,
    /// Point delta zero or out of range
    InvalidDelta,
    /// Award reason missing or too long
    InvalidReason,
    /// History limit out of range
    InvalidLimit,
    /// Student id is not a UUID
    InvalidStudentId,
    /// Hosted service rejected the arguments
    Rejected,

    // Resource Not Found
    /// General not found error
    NotFound,
    /// Caller has no local team, so there is no game to play
    NoTeam,

    // System Errors
    /// Hosted service unreachable or failing
    UpstreamUnavailable,
    /// Hosted service timed out (gateway timeout)
    UpstreamTimeout,
    /// Internal server error
    InternalError,
    /// Configuration error
    ConfigError,
    /// Hosted service returned data we could not read
    DataCorruption,
}

impl ErrorCode {
    /// Returns the canonical SCREAMING_SNAKE_CASE string for this error code.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Unauthorized => "UNAUTHORIZED",
            Self::UnauthorizedMissingBearer => "UNAUTHORIZED_MISSING_BEARER",
            Self::Forbidden => "FORBIDDEN",
            Self::InsufficientRole => "INSUFFICIENT_ROLE",
            Self::NoProfile => "NO_PROFILE",

            Self::ValidationError => "VALIDATION_ERROR",
            Self::BadRequest => "BAD_REQUEST",
            Self::InvalidIdentifier => "INVALID_IDENTIFIER",
            Self::InvalidDelta => "INVALID_DELTA",
            Self::InvalidReason => "INVALID_REASON",
            Self::InvalidLimit => "INVALID_LIMIT",
            Self::InvalidStudentId => "INVALID_STUDENT_ID",
            Self::Rejected => "REJECTED",

            Self::NotFound => "NOT_FOUND",
            Self::NoTeam => "NO_TEAM",

            Self::UpstreamUnavailable => "UPSTREAM_UNAVAILABLE",
            Self::UpstreamTimeout => "UPSTREAM_TIMEOUT",
            Self::InternalError => "INTERNAL_ERROR",
            Self::ConfigError => "CONFIG_ERROR",
            Self::DataCorruption => "DATA_CORRUPTION",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

use tracing::warn;

use crate::domain::UserId;
use crate::trace_ctx;

/// A request arrived without a usable session.
pub fn unauthenticated(reason: &str) {
    let trace_id = trace_ctx::trace_id();

    warn!(
        event = "SECURITY_UNAUTHENTICATED",
        %trace_id,
        reason,
        "Request without a valid session"
    );
}

/// A non-teacher tried to use the award panel.
pub fn award_denied(user_id: UserId) {
    let trace_id = trace_ctx::trace_id();

    warn!(
        event = "SECURITY_AWARD_DENIED",
        %trace_id,
        %user_id,
        "Award attempted without teacher role"
    );
}

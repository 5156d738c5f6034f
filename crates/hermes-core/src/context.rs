//! Request context types.
//!
//! A [`RequestContext`] is created once per request by the dispatcher and
//! threaded explicitly through parameter extraction, pre-execution hooks and
//! the handler call. It is also stored in the request's extension map so
//! middleware and custom extractors can find it.

use crate::logger::ScopedLogger;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// The response header carrying the trace id.
pub const TRACE_ID_HEADER: &str = "x-trace-id";

const TIME_DIGITS: usize = 8;
const RANDOM_DIGITS: usize = 12;
const GROUP_LEN: usize = 4;
const MAX_TRACE_ID_LEN: usize = 128;

/// A per-request correlation token.
///
/// Generated ids are built from the current time in milliseconds and a
/// random suffix, both base-36 encoded and upper-cased, then grouped in
/// blocks of four characters: `L9XK-2M0Q-7ZC4-F1AA-K3PD`.
///
/// Ids are unique with overwhelming probability within a process; they are
/// not cryptographic tokens.
///
/// # Example
///
/// ```
/// use hermes_core::TraceId;
///
/// let id = TraceId::generate();
/// assert_eq!(id.as_str().len(), 24);
/// assert_eq!(id.as_str().split('-').count(), 5);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TraceId(Arc<str>);

impl TraceId {
    /// Synthesizes a new trace id from the clock and a random suffix.
    #[must_use]
    pub fn generate() -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_millis());
        let random = Uuid::new_v4().as_u64_pair().1;

        let time = fixed_width(&to_base36(millis), TIME_DIGITS);
        let suffix = fixed_width(&to_base36(u128::from(random)), RANDOM_DIGITS);
        let raw = format!("{time}{suffix}").to_ascii_uppercase();

        let grouped = raw
            .as_bytes()
            .chunks(GROUP_LEN)
            .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
            .collect::<Vec<_>>()
            .join("-");
        Self(grouped.into())
    }

    /// Accepts an externally supplied trace id if it is well formed.
    ///
    /// A well-formed id is 1 to 128 characters of ASCII alphanumerics,
    /// `-`, `_` or `.`.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let valid = !value.is_empty()
            && value.len() <= MAX_TRACE_ID_LEN
            && value
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.'));
        valid.then(|| Self(value.into()))
    }

    /// Wraps a host-supplied trace id without validation.
    #[must_use]
    pub fn from_raw(value: impl Into<String>) -> Self {
        Self(value.into().into())
    }

    /// Returns the trace id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn to_base36(mut value: u128) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}

// Left-pads with zeros, or keeps the least significant digits.
fn fixed_width(digits: &str, width: usize) -> String {
    if digits.len() >= width {
        digits[digits.len() - width..].to_string()
    } else {
        format!("{digits:0>width$}")
    }
}

/// Per-request state owned by one dispatcher invocation.
///
/// # Example
///
/// ```
/// use hermes_core::{RequestContext, TraceId};
///
/// let ctx = RequestContext::new(TraceId::generate())
///     .with_bundle("admin")
///     .with_handler("UserController.get_user");
///
/// assert_eq!(ctx.bundle(), Some("admin"));
/// assert_eq!(ctx.handler(), "UserController.get_user");
/// ```
#[derive(Debug, Clone)]
pub struct RequestContext {
    trace_id: TraceId,
    bundle: Option<Arc<str>>,
    handler: Arc<str>,
    started_at: Instant,
}

impl RequestContext {
    /// Creates a context for the given trace id.
    #[must_use]
    pub fn new(trace_id: TraceId) -> Self {
        Self {
            trace_id,
            bundle: None,
            handler: Arc::from("anonymous"),
            started_at: Instant::now(),
        }
    }

    /// Creates a context with a freshly generated trace id.
    #[must_use]
    pub fn mock() -> Self {
        Self::new(TraceId::generate())
    }

    /// Tags the context with the bundle that served the request.
    #[must_use]
    pub fn with_bundle(mut self, bundle: impl Into<Arc<str>>) -> Self {
        self.bundle = Some(bundle.into());
        self
    }

    /// Sets the `<Controller>.<method>` label.
    #[must_use]
    pub fn with_handler(mut self, handler: impl Into<Arc<str>>) -> Self {
        self.handler = handler.into();
        self
    }

    /// Returns the trace id.
    #[must_use]
    pub const fn trace_id(&self) -> &TraceId {
        &self.trace_id
    }

    /// Returns the bundle name, if the endpoint belongs to one.
    #[must_use]
    pub fn bundle(&self) -> Option<&str> {
        self.bundle.as_deref()
    }

    /// Returns the `<Controller>.<method>` label.
    #[must_use]
    pub fn handler(&self) -> &str {
        &self.handler
    }

    /// Returns a logger scoped to this request's handler and trace id.
    #[must_use]
    pub fn logger(&self) -> ScopedLogger {
        ScopedLogger::new(Arc::clone(&self.handler)).with_trace_id(self.trace_id.clone())
    }

    /// Returns the elapsed time since the context was created.
    #[must_use]
    pub fn elapsed(&self) -> std::time::Duration {
        self.started_at.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    #[test]
    fn test_generated_ids_are_grouped_and_uppercase() {
        let id = TraceId::generate();
        let groups: Vec<&str> = id.as_str().split('-').collect();
        assert_eq!(groups.len(), 5);
        assert!(groups.iter().all(|g| g.len() == 4));
        assert!(id
            .as_str()
            .chars()
            .all(|c| c == '-' || c.is_ascii_digit() || c.is_ascii_uppercase()));
    }

    #[test]
    fn test_generated_ids_are_unique() {
        let ids: HashSet<TraceId> = (0..10_000).map(|_| TraceId::generate()).collect();
        assert_eq!(ids.len(), 10_000);
    }

    #[test]
    fn test_parse_accepts_well_formed_ids() {
        assert!(TraceId::parse("abc-123_DEF.4").is_some());
        assert!(TraceId::parse("").is_none());
        assert!(TraceId::parse("has space").is_none());
        assert!(TraceId::parse(&"a".repeat(129)).is_none());
    }

    #[test]
    fn test_base36_encoding() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
        assert_eq!(fixed_width("1z", 4), "001z");
        assert_eq!(fixed_width("123456", 4), "3456");
    }

    #[test]
    fn test_context_builder() {
        let ctx = RequestContext::new(TraceId::from_raw("T-1"))
            .with_bundle("public")
            .with_handler("Health.ping");
        assert_eq!(ctx.trace_id().as_str(), "T-1");
        assert_eq!(ctx.bundle(), Some("public"));
        assert_eq!(ctx.handler(), "Health.ping");
        assert_eq!(ctx.logger().label(), "Health.ping");
    }

    proptest! {
        #[test]
        fn prop_parse_accepts_token_charset(raw in "[A-Za-z0-9_.-]{1,128}") {
            let parsed = TraceId::parse(&raw).map(|t| t.as_str().to_string());
            prop_assert_eq!(parsed, Some(raw));
        }
    }
}

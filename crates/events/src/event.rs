use chrono::{DateTime, Utc};

/// A fact emitted by a committed call.
///
/// Payloads are never edited once emitted. A change to a payload's shape bumps
/// its `version` instead of reusing the old one.
pub trait Event: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Dotted type name, e.g. `"vending.product.purchased"`.
    fn event_type(&self) -> &'static str;

    fn version(&self) -> u32;

    /// Business time supplied by the caller, not the time of publication.
    fn occurred_at(&self) -> DateTime<Utc>;

    /// `event_type` with its schema version, e.g. `"vending.refund.sent/v1"`.
    fn schema(&self) -> String {
        format!("{}/v{}", self.event_type(), self.version())
    }
}

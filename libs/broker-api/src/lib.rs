use std::future::Future;
use std::pin::Pin;

// ════════════════════════════════════════════════════════════════
//  Delivery
// ════════════════════════════════════════════════════════════════

/// Position assigned by the broker to an acknowledged message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReceipt {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
}

// ════════════════════════════════════════════════════════════════
//  Publisher capability
// ════════════════════════════════════════════════════════════════

/// Broker client capability: `publish(topic, key, value) -> receipt`.
///
/// The returned future completes once the broker acknowledges the message
/// or the delivery fails. Dropping the future abandons the wait; callers
/// rely on this to honour cancellation.
///
/// Implementations are owned by exactly one publishing loop.
pub trait Publisher: Send + Sync {
    /// Submit `value` to `topic`. `key = None` lets the broker pick the
    /// partition.
    fn publish<'a>(
        &'a self,
        topic: &'a str,
        key: Option<&'a [u8]>,
        value: &'a [u8],
    ) -> Pin<Box<dyn Future<Output = Result<DeliveryReceipt, PublishError>> + Send + 'a>>;

    /// Flush outstanding messages and release broker resources.
    /// Called once, right before the publisher is dropped.
    fn close(&self) -> Pin<Box<dyn Future<Output = Result<(), PublishError>> + Send + '_>>;
}

// ════════════════════════════════════════════════════════════════
//  Error Types
// ════════════════════════════════════════════════════════════════

/// Error category for `PublishError`.
///
/// Callers use the kind to pick a recovery strategy:
/// `Config` aborts startup, `Transient` is retried after a backoff,
/// `Format` drops the message. `Cancelled` stops the loop only when
/// shutdown was requested; otherwise it is retried like `Transient`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Invalid client configuration: permanent, fail at startup.
    Config,
    /// Network, timeout, broker unavailable: retry later.
    Transient,
    /// Message could not be encoded or was rejected as malformed.
    Format,
    /// The operation was abandoned because shutdown was requested.
    Cancelled,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::Config => f.write_str("config"),
            ErrorKind::Transient => f.write_str("transient"),
            ErrorKind::Format => f.write_str("format"),
            ErrorKind::Cancelled => f.write_str("cancelled"),
        }
    }
}

/// Unified error type for `Publisher` implementations.
#[derive(Clone, PartialEq, Eq)]
pub struct PublishError {
    kind: ErrorKind,
    message: String,
}

impl PublishError {
    pub fn new(kind: ErrorKind, msg: impl Into<String>) -> Self {
        Self { kind, message: msg.into() }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Config, msg)
    }

    pub fn transient(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Transient, msg)
    }

    pub fn format_err(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Format, msg)
    }

    pub fn cancelled() -> Self {
        Self::new(ErrorKind::Cancelled, "operation cancelled")
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn is_cancelled(&self) -> bool {
        self.kind == ErrorKind::Cancelled
    }
}

impl std::fmt::Debug for PublishError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}

impl std::fmt::Display for PublishError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for PublishError {}

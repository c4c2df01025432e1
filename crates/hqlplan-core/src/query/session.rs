//! Execution context handed through to translators.

/// A session against which translators execute their SQL.
///
/// The plan layer never inspects the session; it only passes it along. Row
/// identity, and with it the deduplication of merged results, is scoped to
/// one session's identity map.
pub trait Session: Send + Sync {
    /// Identifier of this session, for logging.
    fn session_id(&self) -> u64;
}

//! Error types for the session layer.

/// Precondition failures for *locally* triggered actions.
///
/// Only user actions can produce these — the UI is expected to disable
/// the triggering control, so hitting one is a programming error worth
/// logging, not a user-visible fault. Peer-sourced problems are never
/// errors at all: the machine logs and drops them.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The action requires no session, but one exists.
    #[error("already in a session")]
    AlreadyInSession,

    /// The action requires an active session.
    #[error("no active session")]
    NoSession,

    /// The action is reserved to the host.
    #[error("only the host may do this")]
    NotHost,

    /// The action requires an active game.
    #[error("no active game")]
    NoActiveGame,

    /// The selected troupe exceeds the per-player cap for the current
    /// player count.
    #[error("troupe has {size} characters, cap is {cap}")]
    RosterTooLarge { size: usize, cap: usize },
}

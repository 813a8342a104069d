//! Error types for the cachesim library.
//!
//! ## Key Components
//!
//! - [`SimError`]: Returned by constructors and by `access`/`batch`. Carries
//!   the configuration or address problem that was rejected before any
//!   simulator state changed.
//! - [`InvariantError`]: Returned when internal data-structure invariants are
//!   violated (`check_invariants` methods). Reaching one is a bug, not a user
//!   error.
//!
//! ## Example Usage
//!
//! ```
//! use cachesim::error::SimError;
//! use cachesim::policy::lru::LruSim;
//! use cachesim::traits::{ReadOnlySimulator, Simulator};
//!
//! // Zero capacity is rejected at construction
//! assert!(matches!(LruSim::new(0), Err(SimError::InvalidConfiguration(_))));
//!
//! // Negative addresses are rejected before any state changes
//! let mut sim = LruSim::new(4).unwrap();
//! assert!(matches!(sim.access(-1), Err(SimError::InvalidAddress { addr: -1, .. })));
//! assert_eq!(sim.stats().access_count, 0);
//! ```

use thiserror::Error;

// ---------------------------------------------------------------------------
// InvariantError
// ---------------------------------------------------------------------------

/// Error returned when internal simulator invariants are violated.
///
/// Produced by `check_invariants` on every simulator, and wrapped in
/// [`SimError::Internal`] if a state update detects an impossible state.
/// Carries a human-readable description of which invariant failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct InvariantError(String);

impl InvariantError {
    /// Creates a new `InvariantError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// SimError
// ---------------------------------------------------------------------------

/// Errors surfaced at the simulator boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimError {
    /// Bad capacity or list-size vector at construction.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A negative address was supplied. `position` is set when the address
    /// came from a batch, and is the index of the offending element.
    #[error("invalid address {addr}{}", fmt_position(.position))]
    InvalidAddress {
        /// The rejected input.
        addr: i64,
        /// Index inside the batch, if any.
        position: Option<usize>,
    },

    /// Internal state was found inconsistent. Always a bug.
    #[error("internal invariant violated: {0}")]
    Internal(#[from] InvariantError),
}

impl SimError {
    /// Shorthand for [`SimError::InvalidConfiguration`].
    #[inline]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }

    /// Shorthand for an internal invariant failure.
    #[inline]
    pub(crate) fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(InvariantError::new(msg))
    }

    /// Attaches a batch position to an [`SimError::InvalidAddress`].
    pub(crate) fn at_position(self, position: usize) -> Self {
        match self {
            Self::InvalidAddress { addr, .. } => Self::InvalidAddress {
                addr,
                position: Some(position),
            },
            other => other,
        }
    }
}

fn fmt_position(position: &Option<usize>) -> String {
    position
        .map(|p| format!(" at trace position {p}"))
        .unwrap_or_default()
}

/// Validates a boundary address, returning it as `u64`.
#[inline]
pub(crate) fn check_address(addr: i64) -> Result<u64, SimError> {
    u64::try_from(addr).map_err(|_| SimError::InvalidAddress {
        addr,
        position: None,
    })
}

/// Validates a capacity argument.
#[inline]
pub(crate) fn check_capacity(capacity: usize) -> Result<usize, SimError> {
    if capacity == 0 {
        return Err(SimError::config("capacity must be > 0"));
    }
    Ok(capacity)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Basic type definitions for the chat relay
//!
//! Provides the `Identity` newtype and the counter that hands identities out.

/// Display identity of a connected peer (newtype pattern)
///
/// Assigned once at accept time and never changed for the connection's
/// lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity(pub String);

impl Identity {
    /// Get the identity as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Monotonic identity source
///
/// Yields `user1`, `user2`, ... Owned by the accept loop, so no
/// synchronization is needed and identities never repeat within a process.
#[derive(Debug, Default)]
pub struct IdentityGenerator {
    issued: u64,
}

impl IdentityGenerator {
    /// Create a generator starting at `user1`
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue the next identity
    pub fn next_identity(&mut self) -> Identity {
        self.issued += 1;
        Identity(format!("user{}", self.issued))
    }
}

//! Platform capability resolved once at startup.

/// What the host platform can do, injected into the service constructor
/// instead of being detected ad hoc.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    /// Browser client: reads and writes go straight to the remote API.
    Web,
    /// Client with durable local storage: writes land locally first and
    /// sync opportunistically.
    OfflineCapable,
}

impl Platform {
    #[must_use]
    pub const fn is_offline_capable(self) -> bool {
        matches!(self, Self::OfflineCapable)
    }
}

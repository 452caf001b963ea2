//! Port for resolving the actor recorded in audit fields.

/// Supplies the identity stamped into `created_by`/`updated_by`.
#[cfg_attr(test, mockall::automock)]
pub trait ActorProvider: Send + Sync {
    /// Identity of the actor performing the current change.
    fn current_actor(&self) -> String;
}

/// Provider that always reports the same actor.
///
/// Used for system-initiated work and as the default when no authenticated
/// caller is available.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticActorProvider {
    actor: String,
}

impl StaticActorProvider {
    /// Actor name used when nothing else is configured.
    pub const SYSTEM: &'static str = "System";

    /// Report `actor` for every change.
    pub fn new(actor: impl Into<String>) -> Self {
        Self {
            actor: actor.into(),
        }
    }

    /// Report the [`Self::SYSTEM`] actor.
    pub fn system() -> Self {
        Self::new(Self::SYSTEM)
    }
}

impl Default for StaticActorProvider {
    fn default() -> Self {
        Self::system()
    }
}

impl ActorProvider for StaticActorProvider {
    fn current_actor(&self) -> String {
        self.actor.clone()
    }
}

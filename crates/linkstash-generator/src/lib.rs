//! Short identifier generators.

pub mod random;
pub mod seq;

pub use random::RandomGenerator;
pub use seq::SeqGenerator;

/// Trait for generating short identifiers.
///
/// Implementations are pure generators that don't interact with storage;
/// uniqueness across the store is enforced by the storage backend.
pub trait Generator: Send + Sync + 'static {
    /// Produces the next identifier.
    fn generate(&self) -> String;
}

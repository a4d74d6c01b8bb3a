use crate::Generator;
use typed_builder::TypedBuilder;

/// Decimal digits, the charset used for ids by default.
pub const DIGITS: &[u8] = b"0123456789";

/// Upper- and lower-case letters plus digits.
pub const ALPHANUMERIC: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

pub const DEFAULT_LENGTH: usize = 10;

/// Generates fixed-length identifiers drawn uniformly from a charset.
///
/// Collisions are possible; a clashing id is rejected by the store with
/// `StorageError::IdTaken`.
///
/// ```
/// use linkstash_generator::{Generator, RandomGenerator};
///
/// let generator = RandomGenerator::builder().length(6).build();
/// assert_eq!(generator.generate().len(), 6);
/// ```
#[derive(Debug, Clone, TypedBuilder)]
pub struct RandomGenerator {
    #[builder(default = DEFAULT_LENGTH)]
    length: usize,
    /// Must not be empty.
    #[builder(default = DIGITS)]
    charset: &'static [u8],
}

impl Default for RandomGenerator {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl Generator for RandomGenerator {
    fn generate(&self) -> String {
        std::iter::repeat_with(|| self.charset[rand::random_range(0..self.charset.len())] as char)
            .take(self.length)
            .collect()
    }
}

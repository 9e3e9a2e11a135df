use rand::distributions::Alphanumeric;
use rand::rngs::ThreadRng;
use rand::{Rng, thread_rng};

/// Source of names for `$defs` entries synthesized by the map transform.
///
/// Callers check returned names for collisions and ask again when needed.
pub trait IdGenerator {
    fn next_id(&mut self) -> String;
}

/// `prefix` followed by an increasing counter: `mapEntry1`, `mapEntry2`, ...
#[derive(Debug, Clone)]
pub struct SequentialIds {
    prefix: String,
    next: u64,
}

impl SequentialIds {
    pub const DEFAULT_PREFIX: &'static str = "mapEntry";

    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: 1,
        }
    }
}

impl Default for SequentialIds {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PREFIX)
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&mut self) -> String {
        let id = format!("{}{}", self.prefix, self.next);
        self.next += 1;
        id
    }
}

const RANDOM_ID_LEN: usize = 8;

/// Short random alphanumeric identifiers, optionally prefixed.
#[derive(Debug)]
pub struct RandomIds<R = ThreadRng> {
    rng: R,
    prefix: String,
    len: usize,
}

impl RandomIds {
    pub fn new() -> Self {
        Self::with_rng(thread_rng())
    }
}

impl Default for RandomIds {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> RandomIds<R> {
    pub fn with_rng(rng: R) -> Self {
        Self {
            rng,
            prefix: String::new(),
            len: RANDOM_ID_LEN,
        }
    }

    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }
}

impl<R: Rng> IdGenerator for RandomIds<R> {
    fn next_id(&mut self) -> String {
        let mut id = self.prefix.clone();
        id.extend(
            core::iter::repeat_with(|| self.rng.sample(Alphanumeric))
                .take(self.len)
                .map(char::from),
        );
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn sequential_ids_count_up() {
        let mut ids = SequentialIds::default();
        assert_eq!(ids.next_id(), "mapEntry1");
        assert_eq!(ids.next_id(), "mapEntry2");

        let mut ids = SequentialIds::new("Pool");
        assert_eq!(ids.next_id(), "Pool1");
    }

    #[test]
    fn random_ids_are_alphanumeric() {
        let mut ids = RandomIds::with_rng(StdRng::seed_from_u64(7)).with_prefix("x");
        let first = ids.next_id();
        let second = ids.next_id();
        assert_eq!(first.len(), 1 + RANDOM_ID_LEN);
        assert!(first.starts_with('x'));
        assert!(first.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(first, second);
    }

    #[test]
    fn seeded_random_ids_are_reproducible() {
        let mut a = RandomIds::with_rng(StdRng::seed_from_u64(42));
        let mut b = RandomIds::with_rng(StdRng::seed_from_u64(42));
        assert_eq!(a.next_id(), b.next_id());
    }
}

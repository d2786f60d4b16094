//! Shared test infrastructure for the catalog crates.
//!
//! - `TestDatabase`: a throwaway PostgreSQL container with the catalog schema applied
//! - `TestDataBuilder`: deterministic names derived from the test name
//!
//! ```rust,no_run
//! use test_utils::{TestDatabase, TestDataBuilder};
//!
//! #[tokio::test]
//! async fn my_postgres_test() {
//!     let db = TestDatabase::new().await;
//!     let data = TestDataBuilder::from_test_name("my_postgres_test");
//!     let name = data.name("product", "root");
//! }
//! ```

mod postgres;

pub use postgres::TestDatabase;

/// Deterministic test data keyed by a seed.
pub struct TestDataBuilder {
    seed: u64,
}

impl TestDataBuilder {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Seed from the hash of the test name, so reruns produce the same data.
    pub fn from_test_name(name: &str) -> Self {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        name.hash(&mut hasher);
        Self::new(hasher.finish())
    }

    /// `test-{prefix}-{seed}-{suffix}`
    pub fn name(&self, prefix: &str, suffix: &str) -> String {
        format!("test-{}-{}-{}", prefix, self.seed, suffix)
    }

    pub fn description(&self, suffix: &str) -> String {
        format!("Generated description {} for seed {}", suffix, self.seed)
    }

    /// An id guaranteed not to be issued by a fresh `bigserial` sequence.
    pub fn missing_id(&self) -> i64 {
        -1 - (self.seed % 1000) as i64
    }
}

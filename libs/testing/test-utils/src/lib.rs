//! Shared test infrastructure
//!
//! - `TestDatabase`: PostgreSQL container with the workspace migrations applied
//! - `TestDataBuilder`: deterministic identifiers and timestamps
//! - `assertions`: ordering checks for aggregated results
//!
//! ```rust,no_run
//! use test_utils::{TestDatabase, TestDataBuilder};
//!
//! #[tokio::test]
//! async fn my_postgres_test() {
//!     let db = TestDatabase::new().await;
//!     let builder = TestDataBuilder::from_test_name("my_test");
//!
//!     let user_id = builder.user_id("alice");
//!     let event_type = builder.event_type("login");
//! }
//! ```

use chrono::{DateTime, Duration, TimeZone, Utc};

mod postgres;

pub use postgres::TestDatabase;

/// Deterministic test data, seeded from the test name.
///
/// Two builders with the same seed produce identical values, so failures
/// reproduce exactly.
pub struct TestDataBuilder {
    seed: u64,
}

impl TestDataBuilder {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    pub fn from_test_name(name: &str) -> Self {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        name.hash(&mut hasher);
        Self::new(hasher.finish())
    }

    /// `user-<seed>-<label>`
    pub fn user_id(&self, label: &str) -> String {
        format!("user-{:x}-{}", self.seed, label)
    }

    /// `<kind>-<seed>`
    pub fn event_type(&self, kind: &str) -> String {
        format!("{}-{:x}", kind, self.seed)
    }

    /// A fixed UTC instant, `2024-01-<day> <hour>:<minute>`, for date-bucket tests
    pub fn day_at(&self, day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, hour, minute, 0)
            .single()
            .unwrap_or_else(|| panic!("invalid test instant 2024-01-{day} {hour}:{minute}"))
    }

    /// `Utc::now()` shifted back by `minutes`
    pub fn minutes_ago(&self, minutes: i64) -> DateTime<Utc> {
        Utc::now() - Duration::minutes(minutes)
    }
}

pub mod assertions {
    /// Assert counts are non-increasing and equal counts are ordered by key.
    pub fn assert_ranked<T>(items: &[T], key: impl Fn(&T) -> (&str, u64), context: &str) {
        for pair in items.windows(2) {
            let (a_key, a_count) = key(&pair[0]);
            let (b_key, b_count) = key(&pair[1]);
            assert!(
                a_count > b_count || (a_count == b_count && a_key < b_key),
                "{context}: ({a_key}, {a_count}) must rank before ({b_key}, {b_count})"
            );
        }
    }

    /// Assert that an optional value is Some
    pub fn assert_some<T>(value: Option<T>, context: &str) -> T {
        value.unwrap_or_else(|| panic!("{}: expected Some, got None", context))
    }
}

//! Random member source for exercising the sync loop without a directory
//!
//! Each call returns a random prefix of a fixed list of test addresses, so
//! consecutive passes invite, disable and re-enable the same few accounts.

use std::collections::BTreeSet;
use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

use vwsync_core::ports::IEmailSource;

/// Addresses handed out by [`RandomEmailSource`]
pub const TEST_EMAILS: [&str; 6] = [
    "tester_1@example.com",
    "tester_2@example.com",
    "tester_3@example.com",
    "tester_4@example.com",
    "tester_5@example.com",
    "tester_6@example.com",
];

pub struct RandomEmailSource {
    rng: Mutex<StdRng>,
}

impl RandomEmailSource {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Deterministic variant for tests
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    fn prefix_len(&self) -> usize {
        match self.rng.lock() {
            Ok(mut rng) => rng.gen_range(0..=TEST_EMAILS.len()),
            Err(poisoned) => poisoned.into_inner().gen_range(0..=TEST_EMAILS.len()),
        }
    }
}

impl Default for RandomEmailSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl IEmailSource for RandomEmailSource {
    fn name(&self) -> &str {
        "random"
    }

    async fn list_member_emails(&self) -> anyhow::Result<BTreeSet<String>> {
        let len = self.prefix_len();
        let emails: BTreeSet<String> = TEST_EMAILS[..len].iter().map(|e| e.to_string()).collect();
        info!(source = self.name(), count = emails.len(), "Generated member emails");
        Ok(emails)
    }
}

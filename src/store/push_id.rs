//! Time-ordered push keys.
//!
//! A key is 20 characters: 8 encode the millisecond timestamp, 12 are random.
//! The alphabet is in ASCII order, so keys sort by creation time. Keys minted
//! within the same millisecond reuse the previous random part incremented by
//! one, which keeps them ordered and unique.

use std::sync::Mutex;

const PUSH_CHARS: &[u8; 64] = b"-0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ_abcdefghijklmnopqrstuvwxyz";
const TIMESTAMP_LEN: usize = 8;
const RANDOM_LEN: usize = 12;

pub const PUSH_ID_LEN: usize = TIMESTAMP_LEN + RANDOM_LEN;

#[derive(Default)]
struct LastPush {
    timestamp_ms: i64,
    random: [u8; RANDOM_LEN],
}

/// Generates push keys; shareable across handlers
#[derive(Default)]
pub struct PushIdGenerator {
    last: Mutex<LastPush>,
}

impl PushIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint a key for the current wall-clock time.
    pub fn next_id(&self) -> String {
        self.next_id_at(chrono::Utc::now().timestamp_millis())
    }

    /// Mint a key for the given millisecond timestamp.
    pub fn next_id_at(&self, timestamp_ms: i64) -> String {
        let random = {
            // The guarded state is two plain values; a poisoned lock is still usable.
            let mut last = self.last.lock().unwrap_or_else(|e| e.into_inner());
            if timestamp_ms == last.timestamp_ms {
                increment(&mut last.random);
            } else {
                last.timestamp_ms = timestamp_ms;
                for digit in last.random.iter_mut() {
                    *digit = fastrand::u8(0..64);
                }
            }
            last.random
        };

        let mut id = String::with_capacity(PUSH_ID_LEN);
        let mut remaining = timestamp_ms.max(0) as u64;
        let mut timestamp_chars = [0u8; TIMESTAMP_LEN];
        for slot in timestamp_chars.iter_mut().rev() {
            *slot = PUSH_CHARS[(remaining % 64) as usize];
            remaining /= 64;
        }
        id.extend(timestamp_chars.iter().map(|&c| c as char));
        id.extend(random.iter().map(|&d| PUSH_CHARS[d as usize] as char));
        id
    }
}

/// Add one to a base-64 digit string, carrying from the right.
fn increment(digits: &mut [u8; RANDOM_LEN]) {
    for digit in digits.iter_mut().rev() {
        if *digit == 63 {
            *digit = 0;
        } else {
            *digit += 1;
            return;
        }
    }
}

//! Surrogate key generation.
//!
//! Every record in Bankbook is keyed by an application-generated, time-sorted
//! identifier encoded as 13 characters of Crockford Base32. Sorting keys
//! lexicographically therefore sorts records by creation time, which is what
//! the client list endpoint relies on. The same scheme is used for both the
//! document and the relational store so identity handling is backend-agnostic.

use std::sync::atomic::{AtomicU16, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Crockford Base32 alphabet (I, L, O, U excluded).
const ALPHABET: &[u8] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ";

static COUNTER: AtomicU16 = AtomicU16::new(0);

/// Generator for unique, time-sorted surrogate keys.
pub struct SurrogateKey;

impl SurrogateKey {
    /// Generate a new key, e.g. `"0HZXEQ5Y8JY5Z"`.
    ///
    /// Layout of the underlying 64 bits:
    /// - 42 bits of millisecond timestamp (wraps after ~139 years)
    /// - 12 bits of per-process counter (4096 keys per millisecond)
    /// - 10 bits of entropy
    ///
    /// The counter sits directly below the timestamp so keys generated within
    /// the same millisecond still sort in creation order.
    pub fn generate() -> String {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system clock before Unix epoch")
            .as_millis() as u64;

        let counter = COUNTER.fetch_add(1, Ordering::SeqCst) as u64;
        let entropy = cheap_entropy() as u64 & 0x3FF;

        let key = ((millis & 0x3FF_FFFF_FFFF) << 22) | ((counter & 0xFFF) << 10) | entropy;
        encode(key)
    }

    /// Whether a string has the shape of a generated key.
    pub fn looks_valid(s: &str) -> bool {
        s.len() == 13 && s.bytes().all(|b| ALPHABET.contains(&b.to_ascii_uppercase()))
    }
}

fn encode(mut value: u64) -> String {
    let mut out = [b'0'; 13];
    for slot in out.iter_mut().rev() {
        *slot = ALPHABET[(value & 0x1F) as usize];
        value >>= 5;
    }
    String::from_utf8(out.to_vec()).expect("alphabet is ASCII")
}

/// Cheap non-cryptographic entropy from the clock and counter.
fn cheap_entropy() -> u16 {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0);
    let counter = COUNTER.load(Ordering::Relaxed) as u64;
    ((nanos ^ counter.wrapping_mul(0x5851_F42D_4C95_7F2D)) & 0xFFFF) as u16
}

use std::collections::HashSet;
use std::sync::LazyLock;

use parking_lot::Mutex;

use crate::block::BlockKey;

const KEY_SPACE: u128 = 1 << 24;
const DIGITS: &[u8; 32] = b"0123456789abcdefghijklmnopqrstuv";

static SEEN_KEYS: LazyLock<Mutex<HashSet<BlockKey>>> =
    LazyLock::new(|| Mutex::new(HashSet::new()));

/// Returns a short block key that has never been handed out by this process.
///
/// Keys that would read as numbers are skipped so they can never be confused
/// with the numeric indices used by the raw entity map.
pub fn generate_random_key() -> BlockKey {
    let mut seen = SEEN_KEYS.lock();
    loop {
        let key = to_base32(uuid::Uuid::new_v4().as_u128() % KEY_SPACE);
        if key.parse::<f64>().is_ok() {
            continue;
        }
        if seen.insert(key.clone()) {
            return key;
        }
    }
}

fn to_base32(mut value: u128) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 32) as usize]);
        value /= 32;
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base32_matches_radix_digits() {
        assert_eq!(to_base32(0), "0");
        assert_eq!(to_base32(31), "v");
        assert_eq!(to_base32(32), "10");
    }

    #[test]
    fn generated_keys_are_unique_and_non_numeric() {
        let keys: HashSet<_> = (0..500).map(|_| generate_random_key()).collect();
        assert_eq!(keys.len(), 500);
        assert!(keys.iter().all(|k| k.parse::<f64>().is_err()));
    }
}

//! Short display identifiers
//!
//! A short id is the base-62 rendering of a millisecond Unix timestamp,
//! most-significant digit first. Seven characters cover every instant
//! between 1970 and roughly 2081.
//!
//! Short ids are not fixed width, so their lexical order does not follow
//! chronology across digit-length boundaries. Sort by `created_at` instead.
//! Two conversations created in the same millisecond receive the same short
//! id; nothing detects or repairs that.

const ALPHABET: &[u8; 62] = b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Encode a millisecond timestamp as a base-62 string
///
/// Negative timestamps encode their magnitude.
///
/// # Examples
///
/// ```
/// use pplx::storage::short_id::encode;
///
/// assert_eq!(encode(0), "0");
/// assert_eq!(encode(61), "Z");
/// assert_eq!(encode(62), "10");
/// ```
pub fn encode(timestamp_millis: i64) -> String {
    let mut n = timestamp_millis.unsigned_abs();
    if n == 0 {
        return "0".to_string();
    }

    let mut digits = Vec::with_capacity(11);
    while n > 0 {
        digits.push(ALPHABET[(n % 62) as usize]);
        n /= 62;
    }
    digits.reverse();

    // Every byte comes from ALPHABET, which is ASCII.
    digits.into_iter().map(char::from).collect()
}

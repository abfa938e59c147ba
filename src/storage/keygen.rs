//! Short key generation.
//!
//! Keys are the base-62 rendering of the allocation counter, most significant
//! digit first. The mapping is a bijection on `u64`, so distinct counter values
//! always produce distinct keys.

/// The key alphabet: digits, then lowercase, then uppercase.
pub const KEY_ALPHABET: &[u8; 62] =
    b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

// 62^11 > u64::MAX, so eleven digits always suffice.
const MAX_KEY_LEN: usize = 11;

/// Encodes `n` as a key. `gen_key(0)` is `"0"`.
pub fn gen_key(mut n: u64) -> String {
    let base = KEY_ALPHABET.len() as u64;
    let mut buf = [0u8; MAX_KEY_LEN];
    let mut i = buf.len();

    loop {
        i -= 1;
        buf[i] = KEY_ALPHABET[(n % base) as usize];
        n /= base;
        if n == 0 {
            break;
        }
    }

    buf[i..].iter().map(|&b| b as char).collect()
}

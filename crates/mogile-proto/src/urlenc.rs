//! URL-form encoding as the tracker expects it.
//!
//! Both parameter keys and values travel through [`encode`] on the way
//! out; response values come back through [`decode`]. The alphabet is
//! the unreserved set (`A-Z a-z 0-9 - _ . ~`), space maps to `+`, and
//! everything else becomes a lowercase `%xx` escape.

const HEX: &[u8; 16] = b"0123456789abcdef";

/// Encode a string for use as a request key or value.
pub fn encode(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for &b in raw.as_bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char);
            }
            b' ' => out.push('+'),
            _ => {
                out.push('%');
                out.push(HEX[usize::from(b >> 4)] as char);
                out.push(HEX[usize::from(b & 0x0f)] as char);
            }
        }
    }
    out
}

/// Decode a response value.
///
/// Lenient on malformed input: a `%` that is not followed by two hex
/// digits is dropped and scanning continues, and invalid UTF-8 after
/// unescaping is replaced rather than rejected.
pub fn decode(encoded: &str) -> String {
    let bytes = encoded.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'%' => match hex_pair(bytes.get(i + 1).copied(), bytes.get(i + 2).copied()) {
                Some(b) => {
                    out.push(b);
                    i += 3;
                }
                None => i += 1,
            },
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_pair(hi: Option<u8>, lo: Option<u8>) -> Option<u8> {
    let hi = (hi? as char).to_digit(16)?;
    let lo = (lo? as char).to_digit(16)?;
    Some((hi as u8) << 4 | lo as u8)
}

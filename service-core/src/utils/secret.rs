use subtle::ConstantTimeEq;

/// Compare a presented credential against the expected one in constant time.
///
/// Lengths are not secret; only the byte content comparison is constant time.
pub fn secrets_match(presented: &str, expected: &str) -> bool {
    presented.as_bytes().ct_eq(expected.as_bytes()).into()
}

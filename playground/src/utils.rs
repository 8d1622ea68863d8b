//! Small helpers shared by the binary and tests.

use std::fmt;

/// Length of the random suffix appended by [`unique_name`].
const SUFFIX_LEN: usize = 8;

/// Characters Docker accepts anywhere in a network name, lowercase only.
const NAME_ALPHABET: [char; 36] = {
    let mut alphabet = ['0'; 36];
    let mut i = 0;
    while i < 26 {
        alphabet[i] = (b'a' + i as u8) as char;
        i += 1;
    }
    while i < 36 {
        alphabet[i] = (b'0' + (i - 26) as u8) as char;
        i += 1;
    }
    alphabet
};

/// Returns `<prefix>-<suffix>` with a random lowercase alphanumeric suffix.
///
/// Used as the default network name so that concurrent runs on one host never
/// join each other's network.
pub fn unique_name(prefix: impl fmt::Display) -> String {
    format!("{prefix}-{}", nanoid::nanoid!(SUFFIX_LEN, &NAME_ALPHABET))
}

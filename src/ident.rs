//! Fixed 8-byte, space-padded, case-insensitive identifiers.
//!
//! Every name in a COS loader table — block name, module name, entry name,
//! external reference name — is exactly 8 ASCII bytes, right-padded with
//! spaces. Representing them as a `Copy` value rather than a `String` keeps
//! equality, ordering, and hashing total and allocation-free, the same way
//! the teacher represents fixed binary-format fields as plain structs
//! instead of heap strings.

use core::fmt;
use core::hash::{Hash, Hasher};

/// Number of bytes in a COS identifier field.
pub const SIZEOF_IDENT: usize = 8;

/// An 8-byte, space-padded, case-insensitive COS identifier.
///
/// Two idents compare equal if their uppercased bytes match, so `"foo"` and
/// `"FOO     "` are the same identifier.
#[derive(Clone, Copy)]
pub struct Ident(pub [u8; SIZEOF_IDENT]);

impl Ident {
    /// Builds an identifier from raw bytes, right-padding with spaces and
    /// truncating anything past 8 bytes.
    pub fn new(name: &[u8]) -> Self {
        let mut bytes = [b' '; SIZEOF_IDENT];
        let n = name.len().min(SIZEOF_IDENT);
        bytes[..n].copy_from_slice(&name[..n]);
        Ident(bytes)
    }

    /// Builds an identifier from the raw 8-byte field as stored in a word.
    pub const fn from_bytes(bytes: [u8; SIZEOF_IDENT]) -> Self {
        Ident(bytes)
    }

    /// The raw, space-padded bytes.
    pub fn as_bytes(&self) -> &[u8; SIZEOF_IDENT] {
        &self.0
    }

    /// The identifier as a string slice, space padding included.
    ///
    /// Returns `None` if the bytes are not valid ASCII/UTF-8; COS identifiers
    /// are always 7-bit ASCII, so this should never happen for well-formed
    /// input.
    pub fn as_str(&self) -> Option<&str> {
        core::str::from_utf8(&self.0).ok()
    }

    /// The identifier with trailing space padding trimmed.
    pub fn trimmed(&self) -> &str {
        self.as_str().unwrap_or("").trim_end_matches(' ')
    }

    fn folded(&self) -> [u8; SIZEOF_IDENT] {
        let mut out = self.0;
        for b in &mut out {
            b.make_ascii_uppercase();
        }
        out
    }
}

impl PartialEq for Ident {
    fn eq(&self, other: &Self) -> bool {
        self.folded() == other.folded()
    }
}

impl Eq for Ident {}

impl PartialOrd for Ident {
    fn partial_cmp(&self, other: &Self) -> Option<core::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Ident {
    fn cmp(&self, other: &Self) -> core::cmp::Ordering {
        self.folded().cmp(&other.folded())
    }
}

impl Hash for Ident {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.folded().hash(state)
    }
}

impl fmt::Debug for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ident({:?})", self.trimmed())
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.trimmed())
    }
}

impl Default for Ident {
    fn default() -> Self {
        Ident([b' '; SIZEOF_IDENT])
    }
}

impl From<&str> for Ident {
    fn from(s: &str) -> Self {
        Ident::new(s.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pads_and_trims() {
        let id = Ident::from("FOO");
        assert_eq!(id.as_bytes(), b"FOO     ");
        assert_eq!(id.trimmed(), "FOO");
    }

    #[test]
    fn truncates_long_names() {
        let id = Ident::new(b"ABCDEFGHIJK");
        assert_eq!(id.as_bytes(), b"ABCDEFGH");
    }

    #[test]
    fn case_insensitive_eq_and_hash() {
        let a = Ident::from("sub001");
        let b = Ident::from("SUB001");
        assert_eq!(a, b);

        use std::collections::HashSet;
        let mut set = HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
    }

    #[test]
    fn ordering_is_total_and_folded() {
        let lower = Ident::from("abc");
        let upper = Ident::from("ABD");
        assert!(lower < upper);
    }

    #[test]
    fn display_strips_padding() {
        let id = Ident::from("MAIN");
        assert_eq!(format!("{}", id), "MAIN");
    }
}

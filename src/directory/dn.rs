//! Distinguished names and their relative components.

use crate::error::{IdentityError, IdentityResult};
use std::fmt;

/// One `key=value` component of a distinguished name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rdn {
    pub key: String,
    pub value: String,
}

impl Rdn {
    fn same_as(&self, other: &Rdn) -> bool {
        self.key.eq_ignore_ascii_case(&other.key)
            && self.value.to_lowercase() == other.value.to_lowercase()
    }
}

impl fmt::Display for Rdn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}=", self.key)?;
        for c in self.value.chars() {
            if matches!(c, ',' | '+' | '"' | '\\' | '<' | '>' | ';' | '=') {
                write!(f, "\\")?;
            }
            write!(f, "{}", c)?;
        }
        Ok(())
    }
}

/// A parsed distinguished name, most specific component first.
///
/// Multi-valued RDNs (`cn=a+sn=b`) are kept as a single component whose value
/// carries the remainder verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DistinguishedName {
    components: Vec<Rdn>,
}

impl DistinguishedName {
    /// Parse a DN string. The empty string is the root DN.
    pub fn parse(input: &str) -> IdentityResult<Self> {
        let input = input.trim();
        if input.is_empty() {
            return Ok(Self::default());
        }

        let mut components = Vec::new();
        for raw in split_unescaped(input, ',') {
            let raw = raw.trim();
            let eq = find_unescaped(raw, '=').ok_or_else(|| {
                IdentityError::malformed_reference(input, format!("component '{}' has no '='", raw))
            })?;
            let key = raw[..eq].trim();
            if key.is_empty()
                || !key
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.')
            {
                return Err(IdentityError::malformed_reference(
                    input,
                    format!("invalid attribute type '{}'", key),
                ));
            }
            let value = unescape(raw[eq + 1..].trim())
                .ok_or_else(|| IdentityError::malformed_reference(input, "invalid escape sequence"))?;
            components.push(Rdn {
                key: key.to_string(),
                value,
            });
        }

        Ok(Self { components })
    }

    pub fn components(&self) -> &[Rdn] {
        &self.components
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// The most specific component.
    pub fn rdn(&self) -> Option<&Rdn> {
        self.components.first()
    }

    /// Whether `base` is a (case-insensitive) suffix of this name.
    pub fn ends_with(&self, base: &DistinguishedName) -> bool {
        if base.components.len() > self.components.len() {
            return false;
        }
        let offset = self.components.len() - base.components.len();
        self.components[offset..]
            .iter()
            .zip(&base.components)
            .all(|(a, b)| a.same_as(b))
    }

    /// The name relative to `base`. Names outside `base` are returned unchanged.
    pub fn strip_suffix(&self, base: &DistinguishedName) -> DistinguishedName {
        if base.is_empty() || !self.ends_with(base) {
            return self.clone();
        }
        let keep = self.components.len() - base.components.len();
        DistinguishedName {
            components: self.components[..keep].to_vec(),
        }
    }

    /// This name placed below `base`.
    pub fn join(&self, base: &DistinguishedName) -> DistinguishedName {
        let mut components = self.components.clone();
        components.extend(base.components.iter().cloned());
        DistinguishedName { components }
    }

    /// Case-insensitive equality of two names.
    pub fn same_as(&self, other: &DistinguishedName) -> bool {
        self.components.len() == other.components.len() && self.ends_with(other)
    }

    /// Value of the first component whose key matches `key` (case-insensitive).
    pub fn value_of(&self, key: &str) -> Option<&str> {
        self.components
            .iter()
            .find(|rdn| rdn.key.eq_ignore_ascii_case(key))
            .map(|rdn| rdn.value.as_str())
    }
}

impl fmt::Display for DistinguishedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, rdn) in self.components.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", rdn)?;
        }
        Ok(())
    }
}

fn find_unescaped(input: &str, delimiter: char) -> Option<usize> {
    let mut escaped = false;
    for (i, c) in input.char_indices() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == delimiter {
            return Some(i);
        }
    }
    None
}

fn split_unescaped(input: &str, delimiter: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut rest = input;
    while let Some(idx) = find_unescaped(rest, delimiter) {
        parts.push(&rest[..idx]);
        rest = &rest[idx + delimiter.len_utf8()..];
    }
    parts.push(rest);
    parts
}

/// Resolve `\c` and `\XX` escapes. `None` for a dangling or invalid escape.
fn unescape(raw: &str) -> Option<String> {
    let bytes = raw.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != b'\\' {
            out.push(bytes[i]);
            i += 1;
            continue;
        }
        let next = *bytes.get(i + 1)?;
        let hex = raw
            .get(i + 1..i + 3)
            .and_then(|h| u8::from_str_radix(h, 16).ok());
        match hex {
            Some(byte) if next.is_ascii_hexdigit() => {
                out.push(byte);
                i += 3;
            }
            _ => {
                out.push(next);
                i += 2;
            }
        }
    }
    String::from_utf8(out).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_components() {
        let dn = DistinguishedName::parse("cn=Bob Smith,ou=people,dc=example,dc=com").unwrap();
        assert_eq!(dn.components().len(), 4);
        assert_eq!(dn.rdn().unwrap().key, "cn");
        assert_eq!(dn.value_of("CN"), Some("Bob Smith"));
        assert_eq!(dn.value_of("uid"), None);
        assert_eq!(dn.to_string(), "cn=Bob Smith,ou=people,dc=example,dc=com");
    }

    #[test]
    fn test_escaped_comma_in_value() {
        let dn = DistinguishedName::parse("cn=Smith\\, Bob,dc=example").unwrap();
        assert_eq!(dn.value_of("cn"), Some("Smith, Bob"));
        assert_eq!(dn.components().len(), 2);
        assert_eq!(dn.to_string(), "cn=Smith\\, Bob,dc=example");

        let hex = DistinguishedName::parse("cn=a\\2cb").unwrap();
        assert_eq!(hex.value_of("cn"), Some("a,b"));
    }

    #[test]
    fn test_strip_suffix() {
        let base = DistinguishedName::parse("dc=Example,dc=COM").unwrap();
        let dn = DistinguishedName::parse("uid=bob,ou=people,dc=example,dc=com").unwrap();
        assert!(dn.ends_with(&base));
        assert_eq!(dn.strip_suffix(&base).to_string(), "uid=bob,ou=people");

        let outside = DistinguishedName::parse("uid=bob,dc=other").unwrap();
        assert_eq!(outside.strip_suffix(&base), outside);

        let root = DistinguishedName::default();
        assert_eq!(dn.strip_suffix(&root), dn);
    }

    #[test]
    fn test_malformed() {
        assert!(matches!(
            DistinguishedName::parse("not a dn"),
            Err(IdentityError::MalformedReference { .. })
        ));
        assert!(DistinguishedName::parse("=bob,dc=example").is_err());
        assert!(DistinguishedName::parse("cn=bob\\").is_err());
        assert!(DistinguishedName::parse("").unwrap().is_empty());
    }
}

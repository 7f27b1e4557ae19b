//! Hierarchical derivation paths such as `m/44'/0'/0`.
//!
//! Parsing never fails loudly: malformed text yields an empty [`Path`], and callers are
//! expected to treat an empty path as "do not continue".

use core::fmt;

/// Offset added to an index to mark it as hardened.
pub const HARDENED_OFFSET: u32 = 0x8000_0000;

const ROOT_MARKER: char = 'm';
const SEPARATOR: char = '/';
const HARDENED_MARK: char = '\'';

/// Ordered sequence of derivation indices.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Path(Vec<u32>);

impl Path {
    pub fn new(indices: Vec<u32>) -> Self {
        Self(indices)
    }

    /// Parse path text. Returns an empty path when the text is malformed.
    pub fn parse(text: &str) -> Self {
        parse(text)
    }

    pub fn indices(&self) -> &[u32] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> Vec<u32> {
        self.0
    }
}

impl From<Vec<u32>> for Path {
    fn from(value: Vec<u32>) -> Self {
        Self(value)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{ROOT_MARKER}")?;
        for index in &self.0 {
            if *index >= HARDENED_OFFSET {
                write!(f, "{SEPARATOR}{}{HARDENED_MARK}", index - HARDENED_OFFSET)?;
            } else {
                write!(f, "{SEPARATOR}{index}")?;
            }
        }
        Ok(())
    }
}

/// Harden an index.
pub const fn hardened(index: u32) -> u32 {
    index | HARDENED_OFFSET
}

/// Collapse runs of separators into a single separator.
pub fn normalize(text: &str) -> String {
    let mut output = String::with_capacity(text.len());
    let mut previous_separator = false;
    for ch in text.chars() {
        let is_separator = ch == SEPARATOR;
        if !(is_separator && previous_separator) {
            output.push(ch);
        }
        previous_separator = is_separator;
    }
    output
}

/// Structural check: root marker followed by `/digits` segments, each optionally hardened.
///
/// Index magnitude is not bounded here.
pub fn validate(text: &str) -> bool {
    let normalized = normalize(text);
    let Some(rest) = normalized.strip_prefix(ROOT_MARKER) else {
        return false;
    };
    if rest.is_empty() {
        return true;
    }
    let Some(rest) = rest.strip_prefix(SEPARATOR) else {
        return false;
    };

    rest.split(SEPARATOR).all(|segment| {
        let digits = segment.strip_suffix(HARDENED_MARK).unwrap_or(segment);
        !digits.is_empty() && digits.bytes().all(|byte| byte.is_ascii_digit())
    })
}

/// Parse path text into indices; malformed or out-of-range input yields an empty path.
pub fn parse(text: &str) -> Path {
    if !validate(text) {
        return Path::default();
    }

    let normalized = normalize(text);
    let mut indices = Vec::new();
    for segment in normalized.split(SEPARATOR).skip(1) {
        let (digits, is_hardened) = match segment.strip_suffix(HARDENED_MARK) {
            Some(digits) => (digits, true),
            None => (segment, false),
        };
        let Ok(value) = digits.parse::<u32>() else {
            return Path::default();
        };
        if is_hardened {
            if value >= HARDENED_OFFSET {
                return Path::default();
            }
            indices.push(hardened(value));
        } else {
            indices.push(value);
        }
    }

    Path(indices)
}

/// Render indices back to text.
pub fn format(path: &Path) -> String {
    path.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn parses_vault_path() {
        let path = parse("m/10016'/0");
        assert_eq!(path.indices(), &[HARDENED_OFFSET + 10016, 0]);
        assert_eq!(format(&path), "m/10016'/0");
    }

    #[test]
    fn collapses_repeated_separators() {
        let path = parse("m//44'///0'/1");
        assert_eq!(path.indices(), &[hardened(44), hardened(0), 1]);
        assert_eq!(format(&path), normalize("m//44'///0'/1"));
    }

    #[test]
    fn malformed_text_yields_empty_path() {
        for text in ["", "44'/0", "m/a", "m/1''", "m/'", "m/0/", "n/0", "m0", "m/1'2", "m/-1"] {
            assert!(parse(text).is_empty(), "{text} should be rejected");
            assert!(!validate(text), "{text} should be invalid");
        }
    }

    #[test]
    fn root_only_is_valid_and_empty() {
        assert!(validate("m"));
        assert!(parse("m").is_empty());
        assert_eq!(format(&Path::default()), "m");
    }

    #[test]
    fn validate_does_not_bound_magnitude() {
        let text = "m/99999999999";
        assert!(validate(text));
        assert!(parse(text).is_empty());
        assert!(parse("m/2147483648'").is_empty());
        assert_eq!(parse("m/2147483648").indices(), &[HARDENED_OFFSET]);
    }

    proptest! {
        #[test]
        fn format_inverts_parse(segments in proptest::collection::vec((0u32..HARDENED_OFFSET, any::<bool>(), 1usize..3), 0..8)) {
            let mut text = String::from("m");
            for (value, is_hardened, separators) in &segments {
                text.push_str(&"/".repeat(*separators));
                text.push_str(&value.to_string());
                if *is_hardened {
                    text.push('\'');
                }
            }

            let parsed = parse(&text);
            prop_assert_eq!(parsed.indices().len(), segments.len());
            prop_assert_eq!(format(&parsed), normalize(&text));
        }

        #[test]
        fn foreign_characters_are_rejected(prefix in "[0-9/']{0,6}", bad in "[a-zA-Z .,;:_-]", suffix in "[0-9/']{0,6}") {
            let text = format!("m/{prefix}{bad}{suffix}");
            prop_assert!(parse(&text).is_empty());
        }
    }
}

//! Authentication-exempt path list.
//!
//! Patterns are either a literal path (exact match) or a subtree pattern
//! ending in `/**`, which exempts the prefix itself and everything nested
//! under it on a segment boundary: `/views/**` matches `/views` and
//! `/views/42`, never `/views-internal`.
//!
//! Matching runs on the raw request path handed over by the host. Paths a
//! downstream service could decode into something else (dot segments, encoded
//! separators) are never exempt.

use std::fmt;
use std::str::FromStr;

const SUBTREE_SUFFIX: &str = "/**";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatternError {
    #[error("empty exemption pattern")]
    Empty,
    #[error("exemption pattern must start with '/': {0}")]
    NotAbsolute(String),
    #[error("'**' is only allowed as the final '/**' segment: {0}")]
    MisplacedWildcard(String),
    #[error("exemption pattern contains an empty segment: {0}")]
    EmptySegment(String),
}

/// Why a request path was refused for exemption. Such paths still go through
/// token validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MalformedPath {
    #[error("empty path")]
    Empty,
    #[error("path is not absolute")]
    NotAbsolute,
    #[error("path contains a dot segment")]
    DotSegment,
    #[error("path contains an encoded or alternate separator")]
    EncodedSeparator,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathPattern {
    Exact(String),
    /// Prefix without the trailing `/**`. Empty for the catch-all `/**`.
    Subtree(String),
}

impl PathPattern {
    pub fn matches(&self, path: &str) -> bool {
        match self {
            PathPattern::Exact(literal) => path == literal,
            PathPattern::Subtree(prefix) => match path.strip_prefix(prefix.as_str()) {
                Some(rest) => rest.is_empty() || rest.starts_with('/'),
                None => false,
            },
        }
    }

    pub fn is_catch_all(&self) -> bool {
        matches!(self, PathPattern::Subtree(prefix) if prefix.is_empty())
    }
}

impl FromStr for PathPattern {
    type Err = PatternError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(PatternError::Empty);
        }
        if !raw.starts_with('/') {
            return Err(PatternError::NotAbsolute(raw.to_string()));
        }

        let (fixed, subtree) = match raw.strip_suffix(SUBTREE_SUFFIX) {
            Some(prefix) => (prefix, true),
            None => (raw, false),
        };

        if fixed.contains('*') || fixed.contains('?') {
            return Err(PatternError::MisplacedWildcard(raw.to_string()));
        }
        if fixed.contains("//") {
            return Err(PatternError::EmptySegment(raw.to_string()));
        }

        Ok(if subtree {
            PathPattern::Subtree(fixed.to_string())
        } else {
            PathPattern::Exact(fixed.to_string())
        })
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathPattern::Exact(literal) => f.write_str(literal),
            PathPattern::Subtree(prefix) => write!(f, "{}{}", prefix, SUBTREE_SUFFIX),
        }
    }
}

/// Ordered, immutable list of exemption patterns. Built once at startup.
#[derive(Debug, Clone, Default)]
pub struct ExemptPaths {
    patterns: Vec<PathPattern>,
}

impl ExemptPaths {
    pub fn new<I, S>(patterns: I) -> Result<Self, PatternError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|p| p.as_ref().parse())
            .collect::<Result<Vec<PathPattern>, _>>()?;

        Ok(Self { patterns })
    }

    /// `Ok(true)` when some pattern matches, `Ok(false)` when none does, and
    /// `Err` when the path is not eligible for exemption at all.
    pub fn classify(&self, path: &str) -> Result<bool, MalformedPath> {
        check_path(path)?;
        Ok(self.patterns.iter().any(|p| p.matches(path)))
    }

    /// Fail-closed view of [`ExemptPaths::classify`].
    #[cfg(test)]
    fn is_exempt(&self, path: &str) -> bool {
        self.classify(path).unwrap_or(false)
    }

    pub fn patterns(&self) -> &[PathPattern] {
        &self.patterns
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

fn check_path(path: &str) -> Result<(), MalformedPath> {
    if path.is_empty() {
        return Err(MalformedPath::Empty);
    }
    if !path.starts_with('/') {
        return Err(MalformedPath::NotAbsolute);
    }
    if path.split('/').any(|seg| seg == "." || seg == "..") {
        return Err(MalformedPath::DotSegment);
    }
    if path.contains('\\') || has_encoded_separator(path.as_bytes()) {
        return Err(MalformedPath::EncodedSeparator);
    }
    Ok(())
}

// %2F, %2E, %5C in any case
fn has_encoded_separator(bytes: &[u8]) -> bool {
    bytes.windows(3).any(|w| {
        w[0] == b'%'
            && matches!(
                (w[1], w[2].to_ascii_lowercase()),
                (b'2', b'f') | (b'2', b'e') | (b'5', b'c')
            )
    })
}

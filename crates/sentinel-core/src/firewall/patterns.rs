//! Pattern tables shared by both firewall stages.
//!
//! The default tables are compiled once per process and never mutated; every
//! [`KeywordSet`] built from them is a cheap handle onto the same regexes.

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;

/// Data-destroying and privilege-altering verbs blocked unconditionally.
pub const DESTRUCTIVE_KEYWORDS: &[&str] = &[
    "DROP", "DELETE", "UPDATE", "TRUNCATE", "ALTER", "GRANT", "REVOKE",
];

/// Heuristic shapes associated with statement injection, checked in this order.
const INJECTION_PATTERNS: &[(&str, &str)] = &[
    ("comment_after_separator", r";\s*--"),
    ("always_true_or", r"'\s*OR\s+'1'\s*=\s*'1"),
    ("union_select", r"UNION\s+ALL\s+SELECT"),
    ("file_write", r"INTO\s+OUTFILE"),
    ("file_read", r"LOAD_FILE"),
    ("schema_enumeration", r"INFORMATION_SCHEMA"),
];

static DEFAULT_KEYWORDS: Lazy<KeywordSet> = Lazy::new(|| {
    KeywordSet::new(DESTRUCTIVE_KEYWORDS.iter().copied()).unwrap_or_else(|e| {
        log::error!("Invalid destructive keyword table: {}", e);
        KeywordSet::empty()
    })
});

static DEFAULT_INJECTION: Lazy<InjectionSet> = Lazy::new(|| {
    let patterns = INJECTION_PATTERNS
        .iter()
        .filter_map(|&(name, pattern)| match Regex::new(&format!("(?i){pattern}")) {
            Ok(regex) => Some(InjectionPattern { name, regex }),
            Err(e) => {
                log::error!("Invalid injection pattern '{}': {}", name, e);
                None
            }
        })
        .collect();
    InjectionSet {
        patterns: Arc::new(patterns),
    }
});

/// Ordered, immutable set of whole-word, case-insensitive keywords.
#[derive(Debug, Clone)]
pub struct KeywordSet {
    patterns: Arc<Vec<Regex>>,
}

impl KeywordSet {
    /// Compile a keyword set. Terms are escaped, so they match literally.
    pub fn new<I, S>(terms: I) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = terms
            .into_iter()
            .map(|term| Regex::new(&format!(r"(?i)\b{}\b", regex::escape(term.as_ref()))))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            patterns: Arc::new(patterns),
        })
    }

    pub fn empty() -> Self {
        Self {
            patterns: Arc::new(Vec::new()),
        }
    }

    /// Handle onto the process-wide destructive-keyword table.
    pub fn destructive() -> Self {
        DEFAULT_KEYWORDS.clone()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Returns the first keyword (in set order) found in `text`, uppercased as it
    /// appeared.
    pub fn first_match(&self, text: &str) -> Option<String> {
        self.patterns
            .iter()
            .find_map(|pattern| pattern.find(text))
            .map(|m| m.as_str().to_uppercase())
    }
}

#[derive(Debug)]
struct InjectionPattern {
    name: &'static str,
    regex: Regex,
}

/// Ordered, immutable set of injection heuristics.
#[derive(Debug, Clone)]
pub struct InjectionSet {
    patterns: Arc<Vec<InjectionPattern>>,
}

impl InjectionSet {
    /// Handle onto the process-wide injection table.
    pub fn standard() -> Self {
        DEFAULT_INJECTION.clone()
    }

    pub fn empty() -> Self {
        Self {
            patterns: Arc::new(Vec::new()),
        }
    }

    /// Name of the first heuristic that matches `text`.
    pub fn first_match(&self, text: &str) -> Option<&'static str> {
        self.patterns
            .iter()
            .find(|p| p.regex.is_match(text))
            .map(|p| p.name)
    }
}

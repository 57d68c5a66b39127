//! Slug domain types
//!
//! A slug is the single naming key of a run: the repository name, the
//! container image tag, the CI environment variable and the deployed
//! service name are all taken from the same [`Slug`] value.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

/// Longest slug accepted as a deployed service name
pub const MAX_SLUG_LEN: usize = 49;

/// Base used when a name has no usable characters left
const FALLBACK_BASE: &str = "app";

/// Longest suffix that still leaves room for `{FALLBACK_BASE}-` in front
pub const MAX_SUFFIX_LEN: usize = MAX_SLUG_LEN - FALLBACK_BASE.len() - 1;

static INVALID_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9-]+").expect("static regex"));

static DASH_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-{2,}").expect("static regex"));

/// Derive a canonical identifier from a free-text name
///
/// Steps, in order: lowercase, replace every maximal run of characters
/// outside `[a-z0-9-]` with a single `-`, strip leading/trailing `-`,
/// collapse any remaining run of `-` into one.
///
/// The function is total and idempotent but not injective: distinct names
/// may collapse to the same slug, and a name without any ASCII letters or
/// digits yields an empty string. Use [`Slug::generate`] when the result
/// has to be unique.
///
/// # Example
/// ```
/// use launchpad_core::domain::slug::slugify;
///
/// assert_eq!(slugify("My Cool App!!"), "my-cool-app");
/// assert_eq!(slugify("--A--B--"), "a-b");
/// ```
pub fn slugify(name: &str) -> String {
    let lowered = name.to_lowercase();
    let replaced = INVALID_RUN.replace_all(&lowered, "-");
    let trimmed = replaced.trim_matches('-');
    DASH_RUN.replace_all(trimmed, "-").into_owned()
}

/// Uniqueness suffix appended to every run slug
///
/// Time-derived (UTC, second resolution) with a short random tail so two
/// submissions of the same name within one second still differ.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniqueSuffix(String);

impl UniqueSuffix {
    /// Creates a suffix from the current time
    pub fn now() -> Self {
        let stamp = chrono::Utc::now().format("%Y%m%d%H%M%S");
        let tail: String = uuid::Uuid::new_v4()
            .simple()
            .to_string()
            .chars()
            .take(4)
            .collect();
        Self(format!("{stamp}-{tail}"))
    }

    /// Creates a suffix from a caller-chosen value
    ///
    /// The value is slugified and cut to [`MAX_SUFFIX_LEN`]; returns `None`
    /// if nothing usable remains.
    pub fn new(value: &str) -> Option<Self> {
        let value = slugify(value);
        let value = if value.len() > MAX_SUFFIX_LEN {
            value[..MAX_SUFFIX_LEN].trim_end_matches('-')
        } else {
            value.as_str()
        };
        if value.is_empty() {
            None
        } else {
            Some(Self(value.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Run-unique slug
///
/// Always non-empty, starts with a letter, matches
/// `^[a-z0-9]+(-[a-z0-9]+)*$` and is at most [`MAX_SLUG_LEN`] characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Slug(String);

impl Slug {
    /// Builds the slug for one run from an application name and a suffix
    ///
    /// The base is truncated (on a `-` boundary when possible) so the full
    /// slug fits [`MAX_SLUG_LEN`]. An empty base becomes `app`, and a base
    /// starting with a digit gets an `app-` prefix since service names must
    /// start with a letter.
    pub fn generate(name: &str, suffix: &UniqueSuffix) -> Self {
        let suffix = suffix.as_str();
        // never below FALLBACK_BASE.len(), suffixes are capped
        let budget = MAX_SLUG_LEN.saturating_sub(suffix.len() + 1);

        let mut base = slugify(name);
        if base.is_empty() {
            base = FALLBACK_BASE.to_string();
        } else if base.starts_with(|c: char| c.is_ascii_digit()) {
            base = format!("{FALLBACK_BASE}-{base}");
        }

        let base = match truncate_base(&base, budget) {
            "" => FALLBACK_BASE,
            cut => cut,
        };
        Self(format!("{base}-{suffix}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Slug {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Cuts an ASCII slug base to at most `budget` characters
fn truncate_base(base: &str, budget: usize) -> &str {
    if base.len() <= budget {
        return base;
    }

    let cut = &base[..budget];
    if base.as_bytes()[budget] == b'-' {
        return cut.trim_end_matches('-');
    }

    match cut.rfind('-') {
        Some(pos) if pos > 0 => &cut[..pos],
        _ => cut.trim_end_matches('-'),
    }
}

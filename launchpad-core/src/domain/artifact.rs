//! Generated artifact types and the completion-text extractor

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

pub const MARKUP_FILE: &str = "index.html";
pub const STYLE_FILE: &str = "styles.css";
pub const SCRIPT_FILE: &str = "script.js";

pub const MARKUP_PLACEHOLDER: &str = "<!DOCTYPE html><html><body>HTML not found</body></html>";
pub const STYLE_PLACEHOLDER: &str = "/* CSS not found */";
pub const SCRIPT_PLACEHOLDER: &str = "console.warn('JS not found');";

/// Front-end source produced for one run
///
/// Every field is non-empty: content the extractor could not find is
/// replaced by the placeholder of its kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedArtifact {
    pub markup: String,
    pub style: String,
    pub script: String,
}

impl GeneratedArtifact {
    pub fn get(&self, kind: ContentKind) -> &str {
        match kind {
            ContentKind::Markup => &self.markup,
            ContentKind::Style => &self.style,
            ContentKind::Script => &self.script,
        }
    }

    /// File name and content pairs, in staging order
    pub fn files(&self) -> [(&'static str, &str); 3] {
        ContentKind::ALL.map(|kind| (kind.file_name(), self.get(kind)))
    }
}

/// Content type targeted by the extractor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContentKind {
    Markup,
    Style,
    Script,
}

impl ContentKind {
    pub const ALL: [ContentKind; 3] = [Self::Markup, Self::Style, Self::Script];

    pub fn file_name(self) -> &'static str {
        match self {
            Self::Markup => MARKUP_FILE,
            Self::Style => STYLE_FILE,
            Self::Script => SCRIPT_FILE,
        }
    }

    pub fn placeholder(self) -> &'static str {
        match self {
            Self::Markup => MARKUP_PLACEHOLDER,
            Self::Style => STYLE_PLACEHOLDER,
            Self::Script => SCRIPT_PLACEHOLDER,
        }
    }

    /// Ordered extraction strategies, first success wins
    ///
    /// The placeholder is not part of the list; it applies once every
    /// strategy has returned `None`.
    pub fn strategies(self) -> &'static [Strategy] {
        match self {
            Self::Markup => &MARKUP_STRATEGIES,
            Self::Style => &STYLE_STRATEGIES,
            Self::Script => &SCRIPT_STRATEGIES,
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Markup => "markup",
            Self::Style => "style",
            Self::Script => "script",
        };
        f.write_str(name)
    }
}

/// Which rung of the fallback chain produced a buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArtifactSource {
    FencedBlock,
    InlineTag,
    Placeholder,
}

/// A single extraction strategy: a pure function over the completion text
pub type Strategy = (ArtifactSource, fn(&str) -> Option<String>);

static MARKUP_STRATEGIES: [Strategy; 2] = [
    (ArtifactSource::FencedBlock, fenced_markup),
    (ArtifactSource::InlineTag, inline_document),
];

static STYLE_STRATEGIES: [Strategy; 2] = [
    (ArtifactSource::FencedBlock, fenced_style),
    (ArtifactSource::InlineTag, inline_style),
];

static SCRIPT_STRATEGIES: [Strategy; 2] = [
    (ArtifactSource::FencedBlock, fenced_script),
    (ArtifactSource::InlineTag, inline_script),
];

// ============================================================================
// Strategies
// ============================================================================

static FENCED_HTML: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)```html\b\s*(.*?)```").expect("static regex"));

static FENCED_CSS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)```css\b\s*(.*?)```").expect("static regex"));

static FENCED_JS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)```(?:javascript|js)\b\s*(.*?)```").expect("static regex")
});

static INLINE_DOCUMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)(?:<!doctype\s+html[^>]*>\s*)?<html\b.*?</html\s*>").expect("static regex")
});

static INLINE_STYLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<style\b[^>]*>(.*?)</style\s*>").expect("static regex"));

static INLINE_SCRIPT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script\b[^>]*>(.*?)</script\s*>").expect("static regex"));

/// First fenced block only; an empty first block falls through
fn first_fenced(re: &Regex, text: &str) -> Option<String> {
    let inner = re.captures(text)?.get(1)?.as_str().trim();
    (!inner.is_empty()).then(|| inner.to_string())
}

/// First tag region with a non-empty body
fn first_tag_body(re: &Regex, text: &str) -> Option<String> {
    re.captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .find(|body| !body.is_empty())
        .map(str::to_string)
}

pub fn fenced_markup(text: &str) -> Option<String> {
    first_fenced(&FENCED_HTML, text)
}

pub fn fenced_style(text: &str) -> Option<String> {
    first_fenced(&FENCED_CSS, text)
}

pub fn fenced_script(text: &str) -> Option<String> {
    first_fenced(&FENCED_JS, text)
}

/// Root document region, kept whole so the result is still a document
pub fn inline_document(text: &str) -> Option<String> {
    let doc = INLINE_DOCUMENT.find(text)?.as_str().trim();
    (!doc.is_empty()).then(|| doc.to_string())
}

pub fn inline_style(text: &str) -> Option<String> {
    first_tag_body(&INLINE_STYLE, text)
}

/// Body of the first inline script; `<script src=..></script>` has none
pub fn inline_script(text: &str) -> Option<String> {
    first_tag_body(&INLINE_SCRIPT, text)
}

// ============================================================================
// Extraction
// ============================================================================

/// Extraction result with the rung used for each buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub artifact: GeneratedArtifact,
    pub markup: ArtifactSource,
    pub style: ArtifactSource,
    pub script: ArtifactSource,
}

impl Extraction {
    pub fn source(&self, kind: ContentKind) -> ArtifactSource {
        match kind {
            ContentKind::Markup => self.markup,
            ContentKind::Style => self.style,
            ContentKind::Script => self.script,
        }
    }

    /// Kinds that fell back to their placeholder
    pub fn degraded(&self) -> Vec<ContentKind> {
        ContentKind::ALL
            .into_iter()
            .filter(|kind| self.source(*kind) == ArtifactSource::Placeholder)
            .collect()
    }
}

/// Runs the fallback chain of one content kind
pub fn extract_kind(kind: ContentKind, text: &str) -> (String, ArtifactSource) {
    kind.strategies()
        .iter()
        .find_map(|(source, apply)| apply(text).map(|content| (content, *source)))
        .unwrap_or_else(|| (kind.placeholder().to_string(), ArtifactSource::Placeholder))
}

/// Parses a completion into the three content buffers
///
/// Never fails: unrecognizable content degrades to placeholders.
pub fn extract(text: &str) -> GeneratedArtifact {
    extract_detailed(text).artifact
}

/// Same as [`extract`], also reporting which rung matched per buffer
pub fn extract_detailed(text: &str) -> Extraction {
    let (markup, markup_source) = extract_kind(ContentKind::Markup, text);
    let (style, style_source) = extract_kind(ContentKind::Style, text);
    let (script, script_source) = extract_kind(ContentKind::Script, text);

    Extraction {
        artifact: GeneratedArtifact {
            markup,
            style,
            script,
        },
        markup: markup_source,
        style: style_source,
        script: script_source,
    }
}

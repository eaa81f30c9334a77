//! Reference parser: one document-order pass over wikitext.
//!
//! The grammar is deliberately small. Reference bodies end at the first
//! closing tag and may not span lines. Template parameters are split on
//! every `|`, and nested templates or links are not understood.
//!
//! A template name only matches as a whole word: it must be followed by `|`
//! or `}}`. A body such as `{{Cite bookish|...}}` is therefore raw, where a
//! bare prefix match (`{{(names).*}}`) would have classified it as
//! `Cite book`. Documents relying on prefix matches classify differently.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::catalog::Catalog;
use crate::types::{Citation, Params, Reference, ReferenceKind, TemplateReference};

/// `name=` attribute in its double-quoted, single-quoted and bare forms.
const NAME_ATTRIBUTE: &str = r#"name\s*=\s*(?:"([^"]*)"|'([^']*)'|([^"'\s/>]+))"#;

/// Paired `<ref ...>BODY</ref>` spans. The last non-blank character of the
/// opening tag may not be `/`, so a citation (`/>` or `/ >`) is never
/// mistaken for the start of a block.
#[allow(clippy::expect_used, reason = "pattern is a compile-time constant")]
static BLOCK_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    return Regex::new(r"(?i)(<\s*ref(?:\s+[^>]*[^/>\s])?\s*>)(.*?)<\s*/\s*ref\s*>")
        .expect("valid block regex");
});

/// Self-closing `<ref name=... />` citations.
#[allow(clippy::expect_used, reason = "pattern is a compile-time constant")]
static CITATION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    return Regex::new(&format!(r"(?i)<\s*ref\s+{NAME_ATTRIBUTE}\s*/\s*>"))
        .expect("valid citation regex");
});

/// `name=` attribute inside a block's opening tag.
#[allow(clippy::expect_used, reason = "pattern is a compile-time constant")]
static OPENING_NAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    return Regex::new(&format!(r"(?i)\b{NAME_ATTRIBUTE}")).expect("valid name regex");
});

/// Scanner bound to one catalog and its compiled [`TemplatePattern`].
pub struct ReferenceParser<'a> {
    /// Catalog used to recognize and normalize template names.
    catalog: &'a Catalog,
    /// Matcher for the catalog's template names.
    template_pattern: TemplatePattern,
}

/// Result of scanning a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    /// At least one reference block, in document order.
    Found(Vec<Reference>),
    /// The document has no reference blocks at all.
    NoReferences,
}

/// `{{(name1|name2|...) |...}}` compiled for one catalog.
///
/// Compiling is the costly part of a scan setup; holders of a long-lived
/// catalog build this once and reuse it for every rescan. Clones share the
/// compiled program.
#[derive(Debug, Clone)]
pub struct TemplatePattern {
    /// `None` when no template is known or the pattern was rejected.
    regex: Option<Regex>,
}

impl<'a> ReferenceParser<'a> {
    /// Classify one matched block and fill in its name and parameters.
    fn build_reference(&self, text: &str, block: &Captures<'_>) -> Reference {
        let source_text = block.get(0).map_or("", |m| return m.as_str()).to_string();
        let opening = block.get(1).map_or("", |m| return m.as_str());
        let body = block.get(2).map_or("", |m| return m.as_str());

        let kind = self
            .template_pattern
            .captures(body)
            .map_or(ReferenceKind::Raw, |template| {
                return ReferenceKind::Template(self.build_template(&template));
            });

        // Ambiguous when the same markup appears more than once.
        let offset = text
            .find(&source_text)
            .unwrap_or_else(|| return block.get(0).map_or(0, |m| return m.start()));

        return Reference {
            citations: Vec::new(),
            kind,
            name: extract_name(opening),
            offset,
            source_text,
        };
    }

    /// Build the template variant from a template-pattern match.
    fn build_template(&self, template: &Captures<'_>) -> TemplateReference {
        let matched_name = template.get(1).map_or("", |m| return m.as_str());
        let params = template
            .get(2)
            .map(|m| return split_params(m.as_str()))
            .unwrap_or_default();
        return TemplateReference {
            params,
            template_name: self.catalog.canonical_name(matched_name),
        };
    }

    /// Compile the template pattern for `catalog` and bind both.
    pub fn new(catalog: &'a Catalog) -> Self {
        return Self::with_pattern(catalog, TemplatePattern::for_catalog(catalog));
    }

    /// Scan `text` for citations and references and link them by name.
    pub fn parse(&self, text: &str) -> ScanOutcome {
        let citations = scan_citations(text);

        let mut references: Vec<Reference> = BLOCK_PATTERN
            .captures_iter(text)
            .map(|block| return self.build_reference(text, &block))
            .collect();

        if references.is_empty() {
            tracing::debug!(citations = citations.len(), "no reference blocks found");
            return ScanOutcome::NoReferences;
        }

        attach_citations(&mut references, &citations);

        tracing::debug!(
            references = references.len(),
            citations = citations.len(),
            "scanned document"
        );
        return ScanOutcome::Found(references);
    }

    /// Bind an already compiled pattern. `pattern` must come from
    /// [`TemplatePattern::for_catalog`] on the same catalog.
    pub const fn with_pattern(catalog: &'a Catalog, template_pattern: TemplatePattern) -> Self {
        return Self { catalog, template_pattern };
    }
}

impl ScanOutcome {
    /// Consume the outcome, yielding the references (empty when none).
    pub fn into_references(self) -> Vec<Reference> {
        return match self {
            Self::Found(references) => references,
            Self::NoReferences => Vec::new(),
        };
    }

    /// Whether the document had no reference blocks.
    pub const fn is_empty(&self) -> bool {
        return matches!(self, Self::NoReferences);
    }

    /// The references found, empty when none.
    pub fn references(&self) -> &[Reference] {
        return match self {
            Self::Found(references) => references,
            Self::NoReferences => &[],
        };
    }

    /// Mutable access to the references found.
    pub fn references_mut(&mut self) -> &mut [Reference] {
        return match self {
            Self::Found(references) => references,
            Self::NoReferences => &mut [],
        };
    }
}

impl TemplatePattern {
    /// Match a reference body against the known template names.
    fn captures<'t>(&self, body: &'t str) -> Option<Captures<'t>> {
        return self.regex.as_ref().and_then(|regex| return regex.captures(body));
    }

    /// Compile the pattern for `catalog`.
    ///
    /// Names are tried longest first so `Cite` never shadows `Cite book`.
    /// A name only matches when followed by `|` or `}}`.
    pub fn for_catalog(catalog: &Catalog) -> Self {
        let mut names: Vec<&str> = catalog.template_names().filter(|n| return !n.is_empty()).collect();
        names.sort_by_key(|n| return std::cmp::Reverse(n.len()));
        if names.is_empty() {
            return Self { regex: None };
        }

        let alternation = names.iter().map(|n| return regex::escape(n)).collect::<Vec<_>>().join("|");
        let regex = match Regex::new(&format!(r"(?i)\{{\{{\s*({alternation})\s*(\|.*)?\}}\}}")) {
            Ok(pattern) => Some(pattern),
            Err(e) => {
                tracing::warn!(error = %e, "template pattern rejected; every reference will be raw");
                None
            },
        };
        return Self { regex };
    }
}

/// Attach every citation to every reference carrying the same name.
///
/// Matching is by equality, not uniqueness: when malformed input has two
/// references named alike, both receive the same citations. Citations that
/// match nothing are dropped.
fn attach_citations(references: &mut [Reference], citations: &[Citation]) {
    for reference in references.iter_mut() {
        let Some(name) = reference.name.as_deref() else {
            continue;
        };
        reference.citations = citations
            .iter()
            .filter(|c| return c.name == name)
            .cloned()
            .collect();
    }

    let orphans = citations
        .iter()
        .filter(|c| return !references.iter().any(|r| return r.name.as_deref() == Some(c.name.as_str())))
        .count();
    if orphans > 0 {
        tracing::trace!(orphans, "dropped citations without a matching reference");
    }
    return;
}

/// First non-empty capture among the three quoting styles.
fn attribute_value(cap: &Captures<'_>) -> Option<String> {
    return (1..=3)
        .filter_map(|group| return cap.get(group))
        .map(|m| return m.as_str().trim())
        .find(|value| return !value.is_empty())
        .map(str::to_string);
}

/// Read the `name` attribute of a block's opening tag.
fn extract_name(opening_tag: &str) -> Option<String> {
    return OPENING_NAME_PATTERN
        .captures(opening_tag)
        .and_then(|cap| return attribute_value(&cap));
}

/// Parse a standalone document with a catalog.
///
/// Convenience over [`ReferenceParser`] for one-off scans.
pub fn parse(text: &str, catalog: &Catalog) -> ScanOutcome {
    return ReferenceParser::new(catalog).parse(text);
}

/// Find every citation in document order.
fn scan_citations(text: &str) -> Vec<Citation> {
    return CITATION_PATTERN
        .captures_iter(text)
        .filter_map(|cap| {
            let whole = cap.get(0)?;
            let name = attribute_value(&cap)?;
            return Some(Citation {
                name,
                offset: whole.start(),
                source_text: whole.as_str().to_string(),
            });
        })
        .collect();
}

/// Split the text after a template name into parameters.
///
/// Drops the leading `|`, splits on every `|`, then splits each piece once
/// on `=`. Pieces missing a name or a value after trimming are discarded,
/// which also drops positional parameters.
fn split_params(raw: &str) -> Params {
    let inner = raw.strip_prefix('|').unwrap_or(raw);
    let mut params = Params::default();
    for piece in inner.split('|') {
        let Some((name, value)) = piece.split_once('=') else {
            tracing::trace!(piece, "discarded parameter without `=`");
            continue;
        };
        let name = name.trim();
        let value = value.trim();
        if name.is_empty() || value.is_empty() {
            tracing::trace!(piece, "discarded parameter with empty name or value");
            continue;
        }
        params.insert(name, value);
    }
    return params;
}

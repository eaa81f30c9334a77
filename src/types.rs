/// Core domain types for references, citations, and their parameters.
use std::ops::Range;

/// A self-closing `<ref name="..." />` marker pointing at a named reference.
/// Recreated on every scan and never edited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Citation {
    /// Name of the reference this citation points to.
    pub name: String,
    /// Byte offset of `source_text` in the document at scan time.
    pub offset: usize,
    /// Exact matched markup.
    pub source_text: String,
}

/// Parameter name/value pairs of a template invocation.
///
/// Keys are unique. Iteration follows insertion order; re-inserting an
/// existing key replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    /// Pairs in insertion order.
    entries: Vec<(String, String)>,
}

impl Params {
    /// Whether a parameter with this name is present.
    pub fn contains(&self, name: &str) -> bool {
        return self.entries.iter().any(|(key, _)| return key == name);
    }

    /// Value of the named parameter, if present.
    pub fn get(&self, name: &str) -> Option<&str> {
        return self
            .entries
            .iter()
            .find(|(key, _)| return key == name)
            .map(|(_, value)| return value.as_str());
    }

    /// Set a parameter, replacing the value of an existing key in place.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        if let Some(slot) = self.entries.iter_mut().find(|(key, _)| return *key == name) {
            slot.1 = value;
            return;
        }
        self.entries.push((name, value));
        return;
    }

    /// Whether there are no parameters.
    pub fn is_empty(&self) -> bool {
        return self.entries.is_empty();
    }

    /// Iterate pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        return self
            .entries
            .iter()
            .map(|(key, value)| return (key.as_str(), value.as_str()));
    }

    /// Number of parameters.
    pub fn len(&self) -> usize {
        return self.entries.len();
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::default();
        for (key, value) in iter {
            params.insert(key, value);
        }
        return params;
    }
}

/// A `<ref>...</ref>` block found in the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    /// Citations whose name equals this reference's name, by ascending offset.
    pub citations: Vec<Citation>,
    /// Raw text or a template invocation.
    pub kind: ReferenceKind,
    /// Value of the `name` attribute; `None` when absent or empty.
    pub name: Option<String>,
    /// Byte offset of the first occurrence of `source_text` in the document.
    pub offset: usize,
    /// Exact matched markup, or the regenerated markup after an edit.
    pub source_text: String,
}

/// What a reference body contains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceKind {
    /// Free text, or a template the catalog does not know. Never rewritten.
    Raw,
    /// A single invocation of a catalog template.
    Template(TemplateReference),
}

/// Structured data of a template-based reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateReference {
    /// Parameters in parse order, or schema order after an edit.
    pub params: Params,
    /// Canonical catalog spelling of the template name, without namespace.
    pub template_name: String,
}

/// Half-open byte range `[start, end)` in the document text.
pub type TextRange = Range<usize>;

//! Template catalog: the parameter schema of every known citation template.
//!
//! The catalog is read-only once built. It is usually loaded from a saved
//! TemplateData API response (`action=templatedata`), whose pages are keyed
//! by title (`Template:Cite book`). Titles are stored without their namespace
//! prefix, and both template order and parameter order follow the dump.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::Error;

/// Language used when a label has no entry for the requested one.
const FALLBACK_LANGUAGE: &str = "en";

/// Input type used when the schema declares none.
const DEFAULT_INPUT_TYPE: &str = "text";

/// Known templates, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    /// Template schemas keyed by position; names are unique.
    templates: Vec<TemplateSchema>,
}

/// Text that may be given once or per language.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum LocalizedText {
    /// One translation per language code.
    PerLanguage(BTreeMap<String, String>),
    /// The same text for every language.
    Plain(String),
}

/// Schema of one template parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamDef {
    /// Help text shown next to the field.
    pub description: Option<LocalizedText>,
    /// Declared TemplateData type (`string`, `date`, `url`, ...).
    pub input_type: Option<String>,
    /// Human label for the field.
    pub label: Option<LocalizedText>,
    /// Parameter name as written in wikitext.
    pub name: String,
    /// Whether the template needs this parameter.
    pub required: bool,
    /// Whether editors are encouraged to fill this parameter.
    pub suggested: bool,
}

/// One page of the TemplateData response.
#[derive(Deserialize)]
struct RawPage {
    /// Explicit parameter order; overrides the object order of `params`.
    #[serde(default, rename = "paramOrder")]
    param_order: Vec<String>,
    /// Parameter definitions keyed by name.
    #[serde(default)]
    params: Map<String, Value>,
    /// Page title including namespace.
    title: String,
}

/// One parameter entry of a TemplateData page.
#[derive(Deserialize)]
struct RawParam {
    /// Help text.
    #[serde(default)]
    description: Option<LocalizedText>,
    /// Human label.
    #[serde(default)]
    label: Option<LocalizedText>,
    /// Required flag.
    #[serde(default)]
    required: bool,
    /// Suggested flag.
    #[serde(default)]
    suggested: bool,
    /// Declared type.
    #[serde(default, rename = "type")]
    value_type: Option<String>,
}

/// Parameter definitions of one template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateSchema {
    /// Canonical template name without namespace.
    pub name: String,
    /// Parameter definitions in declared order.
    pub params: Vec<ParamDef>,
}

impl Catalog {
    /// Map a template name as matched in wikitext to its catalog spelling.
    ///
    /// The first character is upper-cased, then the name is compared
    /// case-insensitively against every registered template. Falls back to
    /// the capitalized form when nothing matches.
    pub fn canonical_name(&self, matched: &str) -> String {
        let capitalized = capitalize_first(matched.trim());
        let lowered = capitalized.to_lowercase();
        return self
            .templates
            .iter()
            .rev()
            .find(|t| return t.name.to_lowercase() == lowered)
            .map_or(capitalized, |t| return t.name.clone());
    }

    /// The template a brand-new reference starts with.
    pub fn first_template(&self) -> Option<&str> {
        return self.templates.first().map(|t| return t.name.as_str());
    }

    /// Parse a TemplateData API response.
    ///
    /// Accepts both the keyed (`"pages": {"123": {...}}`) and the list
    /// (`"pages": [{...}]`) response layouts.
    ///
    /// # Errors
    ///
    /// Returns `Error::Json` if the content is not JSON, or
    /// `Error::CatalogInvalid` if a page or parameter has the wrong shape.
    pub fn from_templatedata_json(path: &Path, content: &str) -> Result<Self, Error> {
        let root: Value = serde_json::from_str(content)?;
        let pages: Vec<Value> = match root.get("pages") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(list)) => list.clone(),
            Some(Value::Object(keyed)) => keyed.values().cloned().collect(),
            Some(_) => {
                return Err(Error::CatalogInvalid {
                    path: path.to_path_buf(),
                    reason: "`pages` must be an object or an array".to_string(),
                });
            },
        };

        let mut templates = Vec::with_capacity(pages.len());
        for page in pages {
            let raw: RawPage = serde_json::from_value(page).map_err(|e| {
                return Error::CatalogInvalid {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                };
            })?;
            templates.push(schema_from_raw_page(path, raw)?);
        }

        tracing::debug!(templates = templates.len(), path = %path.display(), "loaded template catalog");
        return Ok(Self::new(templates));
    }

    /// Whether the catalog knows no templates.
    pub fn is_empty(&self) -> bool {
        return self.templates.is_empty();
    }

    /// Read and parse a TemplateData dump from disk.
    ///
    /// # Errors
    ///
    /// Returns `Error::CatalogNotFound` if the file does not exist,
    /// `Error::Io` for other read failures, or the parse errors of
    /// [`Catalog::from_templatedata_json`].
    pub fn load(path: &Path) -> Result<Self, Error> {
        let content = match std::fs::read_to_string(path) {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::CatalogNotFound { path: path.to_path_buf() });
            },
            Err(e) => return Err(Error::Io(e)),
            Ok(c) => c,
        };
        return Self::from_templatedata_json(path, &content);
    }

    /// Parameter definitions of a template, by canonical name.
    pub fn lookup(&self, name: &str) -> Option<&TemplateSchema> {
        return self.templates.iter().find(|t| return t.name == name);
    }

    /// Build a catalog from schemas. Namespace prefixes are stripped and a
    /// later schema with an already-seen name replaces the earlier one.
    pub fn new(schemas: Vec<TemplateSchema>) -> Self {
        let mut templates: Vec<TemplateSchema> = Vec::with_capacity(schemas.len());
        for mut schema in schemas {
            schema.name = strip_namespace(&schema.name).to_string();
            if let Some(existing) = templates.iter_mut().find(|t| return t.name == schema.name) {
                *existing = schema;
            } else {
                templates.push(schema);
            }
        }
        return Self { templates };
    }

    /// Canonical template names in declaration order.
    pub fn template_names(&self) -> impl Iterator<Item = &str> {
        return self.templates.iter().map(|t| return t.name.as_str());
    }

    /// All schemas in declaration order.
    pub fn templates(&self) -> &[TemplateSchema] {
        return &self.templates;
    }
}

impl LocalizedText {
    /// Text for `language`, falling back to English, then to any entry.
    pub fn get(&self, language: &str) -> Option<&str> {
        return match self {
            Self::Plain(text) => Some(text.as_str()),
            Self::PerLanguage(map) => map
                .get(language)
                .or_else(|| return map.get(FALLBACK_LANGUAGE))
                .or_else(|| return map.values().next())
                .map(String::as_str),
        };
    }
}

impl ParamDef {
    /// Localized description, empty when the schema has none.
    pub fn description_in(&self, language: &str) -> String {
        return self
            .description
            .as_ref()
            .and_then(|d| return d.get(language))
            .unwrap_or("")
            .to_string();
    }

    /// Declared input type, `text` when the schema has none.
    pub fn input_type_or_default(&self) -> &str {
        return self.input_type.as_deref().unwrap_or(DEFAULT_INPUT_TYPE);
    }

    /// Whether the parameter is neither required nor suggested.
    pub const fn is_optional(&self) -> bool {
        return !self.required && !self.suggested;
    }

    /// Localized label, the parameter name when the schema has none.
    pub fn label_in(&self, language: &str) -> String {
        return self
            .label
            .as_ref()
            .and_then(|l| return l.get(language))
            .unwrap_or(&self.name)
            .to_string();
    }

    /// A plain optional parameter with no label, type, or description.
    pub fn named(name: impl Into<String>) -> Self {
        return Self {
            description: None,
            input_type: None,
            label: None,
            name: name.into(),
            required: false,
            suggested: false,
        };
    }
}

/// Upper-case the first character, leaving the rest untouched.
fn capitalize_first(name: &str) -> String {
    let mut chars = name.chars();
    return match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().chain(chars).collect(),
    };
}

/// Convert a TemplateData page into a schema, applying `paramOrder`.
///
/// # Errors
///
/// Returns `Error::CatalogInvalid` if a parameter entry has the wrong shape.
fn schema_from_raw_page(path: &Path, page: RawPage) -> Result<TemplateSchema, Error> {
    let mut params: Vec<ParamDef> = Vec::with_capacity(page.params.len());
    for (name, value) in page.params {
        // TemplateData allows `null` for parameters that only exist as aliases.
        if value.is_null() {
            continue;
        }
        let raw: RawParam = serde_json::from_value(value).map_err(|e| {
            return Error::CatalogInvalid {
                path: path.to_path_buf(),
                reason: format!("{}: parameter `{name}`: {e}", page.title),
            };
        })?;
        params.push(ParamDef {
            description: raw.description,
            input_type: raw.value_type,
            label: raw.label,
            name,
            required: raw.required,
            suggested: raw.suggested,
        });
    }

    if !page.param_order.is_empty() {
        let rank = |p: &ParamDef| {
            return page
                .param_order
                .iter()
                .position(|n| return *n == p.name)
                .unwrap_or(usize::MAX);
        };
        params.sort_by_key(rank);
    }

    return Ok(TemplateSchema {
        name: page.title,
        params,
    });
}

/// Drop the namespace prefix (`Template:`) from a page title.
fn strip_namespace(title: &str) -> &str {
    return title.split_once(':').map_or(title, |(_, rest)| return rest);
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc, reason = "test code")]
mod tests {
    use super::*;

    const DUMP: &str = r#"{
        "pages": {
            "101": {
                "title": "Template:Cite web",
                "params": {
                    "url": {"label": {"en": "URL", "es": "Dirección"}, "required": true, "type": "url"},
                    "title": {"label": "Title", "required": true},
                    "date": {"suggested": true, "type": "date"},
                    "archive-url": {"description": {"en": "Archived copy"}}
                }
            },
            "57": {
                "title": "Template:Cite book",
                "params": {"title": {"required": true}, "author": {"suggested": true}},
                "paramOrder": ["author", "title"]
            }
        }
    }"#;

    fn catalog() -> Catalog {
        return Catalog::from_templatedata_json(Path::new("templates.json"), DUMP).unwrap();
    }

    #[test]
    fn keeps_page_and_parameter_order() {
        let catalog = catalog();
        let names: Vec<&str> = catalog.template_names().collect();
        assert_eq!(names, vec!["Cite web", "Cite book"]);

        let web = catalog.lookup("Cite web").unwrap();
        let params: Vec<&str> = web.params.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(params, vec!["url", "title", "date", "archive-url"]);
    }

    #[test]
    fn param_order_overrides_object_order() {
        let catalog = catalog();
        let book = catalog.lookup("Cite book").unwrap();
        let params: Vec<&str> = book.params.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(params, vec!["author", "title"]);
    }

    #[test]
    fn canonical_name_is_case_insensitive() {
        let catalog = catalog();
        assert_eq!(catalog.canonical_name("cite WEB"), "Cite web");
        assert_eq!(catalog.canonical_name("cite book"), "Cite book");
        assert_eq!(catalog.canonical_name("unknown thing"), "Unknown thing");
    }

    #[test]
    fn labels_fall_back_to_english_then_name() {
        let catalog = catalog();
        let web = catalog.lookup("Cite web").unwrap();
        let url = web.params.first().unwrap();
        assert_eq!(url.label_in("es"), "Dirección");
        assert_eq!(url.label_in("fr"), "URL");
        assert_eq!(url.input_type_or_default(), "url");

        let date = web.params.get(2).unwrap();
        assert_eq!(date.label_in("en"), "date");
        assert_eq!(date.input_type_or_default(), "date");

        let archive = web.params.get(3).unwrap();
        assert_eq!(archive.description_in("de"), "Archived copy");
        assert_eq!(archive.input_type_or_default(), "text");
        assert!(archive.is_optional());
    }

    #[test]
    fn accepts_list_layout_and_null_params() {
        let dump = r#"{"pages": [{"title": "Template:Citation", "params": {"title": {}, "1": null}}]}"#;
        let catalog = Catalog::from_templatedata_json(Path::new("t.json"), dump).unwrap();
        let citation = catalog.lookup("Citation").unwrap();
        assert_eq!(citation.params.len(), 1);
    }

    #[test]
    fn rejects_malformed_parameter() {
        let dump = r#"{"pages": {"1": {"title": "Template:X", "params": {"a": {"required": "yes"}}}}}"#;
        let result = Catalog::from_templatedata_json(Path::new("t.json"), dump);
        assert!(matches!(result, Err(Error::CatalogInvalid { .. })));
    }

    #[test]
    fn missing_file_is_reported() {
        let result = Catalog::load(Path::new("/nonexistent/templates.json"));
        assert!(matches!(result, Err(Error::CatalogNotFound { .. })));
    }

    #[test]
    fn new_strips_namespace_and_dedups() {
        let catalog = Catalog::new(vec![
            TemplateSchema { name: "Template:Cite news".to_string(), params: vec![] },
            TemplateSchema { name: "Plantilla:Cite news".to_string(), params: vec![ParamDef::named("title")] },
        ]);
        assert_eq!(catalog.templates().len(), 1);
        assert_eq!(catalog.lookup("Cite news").unwrap().params.len(), 1);
        assert_eq!(catalog.first_template(), Some("Cite news"));
    }
}

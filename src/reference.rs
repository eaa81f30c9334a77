//! Behavior of parsed references: serialization, parameter classes, and
//! the ranges used to highlight them in the editor.

use crate::catalog::{Catalog, ParamDef};
use crate::types::{Citation, Params, Reference, ReferenceKind, TemplateReference, TextRange};

impl Citation {
    /// Range of this citation in the text it was scanned from.
    ///
    /// Stale once the buffer changes; rescan before highlighting again.
    pub fn highlight(&self) -> TextRange {
        return self.offset..self.offset.saturating_add(self.source_text.len());
    }
}

impl Reference {
    /// Template data, if this reference wraps a template.
    pub const fn as_template(&self) -> Option<&TemplateReference> {
        return match &self.kind {
            ReferenceKind::Raw => None,
            ReferenceKind::Template(template) => Some(template),
        };
    }

    /// Mutable template data, if this reference wraps a template.
    pub const fn as_template_mut(&mut self) -> Option<&mut TemplateReference> {
        return match &mut self.kind {
            ReferenceKind::Raw => None,
            ReferenceKind::Template(template) => Some(template),
        };
    }

    /// Range of this reference in the text it was scanned from.
    ///
    /// Stale once the buffer changes; rescan before highlighting again.
    pub fn highlight(&self) -> TextRange {
        return self.offset..self.offset.saturating_add(self.source_text.len());
    }

    /// An unnamed, parameterless reference to `template_name`, not yet
    /// part of any document.
    pub fn new_template(template_name: impl Into<String>) -> Self {
        let template = TemplateReference {
            params: Params::default(),
            template_name: template_name.into(),
        };
        let source_text = template.to_wikitext(None);
        return Self {
            citations: Vec::new(),
            kind: ReferenceKind::Template(template),
            name: None,
            offset: 0,
            source_text,
        };
    }

    /// Wikitext for this reference.
    ///
    /// Raw references return their matched text unchanged; template
    /// references are regenerated from name, template and parameters.
    pub fn to_wikitext(&self) -> String {
        return match &self.kind {
            ReferenceKind::Raw => self.source_text.clone(),
            ReferenceKind::Template(template) => template.to_wikitext(self.name.as_deref()),
        };
    }
}

impl TemplateReference {
    /// Schema parameters that are neither required nor suggested.
    pub fn optional_params<'c>(&self, catalog: &'c Catalog) -> Vec<&'c ParamDef> {
        return self
            .registered_params(catalog)
            .iter()
            .filter(|p| return p.is_optional())
            .collect();
    }

    /// All schema parameters of the current template, empty when the
    /// catalog has no entry for it.
    pub fn registered_params<'c>(&self, catalog: &'c Catalog) -> &'c [ParamDef] {
        return catalog
            .lookup(&self.template_name)
            .map_or(&[], |schema| return schema.params.as_slice());
    }

    /// Schema parameters flagged required.
    pub fn required_params<'c>(&self, catalog: &'c Catalog) -> Vec<&'c ParamDef> {
        return self
            .registered_params(catalog)
            .iter()
            .filter(|p| return p.required)
            .collect();
    }

    /// Schema parameters flagged suggested.
    pub fn suggested_params<'c>(&self, catalog: &'c Catalog) -> Vec<&'c ParamDef> {
        return self
            .registered_params(catalog)
            .iter()
            .filter(|p| return p.suggested)
            .collect();
    }

    /// Point this reference at another template.
    ///
    /// Parameters are left alone; the ones the new schema does not know are
    /// only dropped when an edit is loaded from the form.
    pub fn switch_template(&mut self, template_name: impl Into<String>) {
        self.template_name = template_name.into();
        return;
    }

    /// Serialize as `<ref name="..">{{Template |k=v ...}}</ref>`.
    pub fn to_wikitext(&self, name: Option<&str>) -> String {
        let mut out = match name.filter(|n| return !n.is_empty()) {
            Some(name) => format!("<ref name={}>", quote_attribute(name)),
            None => "<ref>".to_string(),
        };
        out.push_str("{{");
        out.push_str(&self.template_name);
        for (key, value) in self.params.iter() {
            out.push_str(" |");
            out.push_str(key);
            out.push('=');
            out.push_str(value);
        }
        out.push_str("}}</ref>");
        return out;
    }
}

/// Quote an attribute value so the tag stays well formed: double quotes
/// unless the value holds one, then single quotes. A value holding both
/// keeps double quotes and escapes its own as `&quot;`.
fn quote_attribute(value: &str) -> String {
    if !value.contains('"') {
        return format!("\"{value}\"");
    }
    if !value.contains('\'') {
        return format!("'{value}'");
    }
    return format!("\"{}\"", value.replace('"', "&quot;"));
}

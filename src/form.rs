//! Editable fields of a template reference.
//!
//! An `EditForm` is what an editor shows for one reference: the reference
//! name, the template, and one field per schema parameter. It carries no
//! rendering; hosts decide how fields look.

use serde::Serialize;

use crate::catalog::Catalog;
use crate::types::{Params, Reference, ReferenceKind, TemplateReference};

/// Fields for editing one template reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EditForm {
    /// One field per schema parameter, in schema order.
    pub fields: Vec<FormField>,
    /// Reference name; empty for an unnamed reference.
    pub name: String,
    /// Template the fields were derived from.
    pub template_name: String,
}

/// One parameter input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormField {
    /// Localized help text.
    pub description: String,
    /// Hidden until "show all" because it is optional and empty.
    pub hidden: bool,
    /// Input type declared by the schema.
    pub input_type: String,
    /// Localized label.
    pub label: String,
    /// Parameter name written to wikitext.
    pub param: String,
    /// Current value; empty when unset.
    pub value: String,
}

impl EditForm {
    /// Fields for `template_name`, taking values from `params`.
    fn build(name: &str, template_name: &str, params: &Params, catalog: &Catalog, language: &str) -> Self {
        let schema = catalog.lookup(template_name).map_or(&[][..], |s| return s.params.as_slice());
        let fields = schema
            .iter()
            .map(|def| {
                let value = params.get(&def.name).unwrap_or("").to_string();
                return FormField {
                    description: def.description_in(language),
                    hidden: def.is_optional() && value.is_empty(),
                    input_type: def.input_type_or_default().to_string(),
                    label: def.label_in(language),
                    param: def.name.clone(),
                    value,
                };
            })
            .collect();
        return Self {
            fields,
            name: name.to_string(),
            template_name: template_name.to_string(),
        };
    }

    /// The field for `param`, if the schema has one.
    pub fn field(&self, param: &str) -> Option<&FormField> {
        return self.fields.iter().find(|f| return f.param == param);
    }

    /// Name/value pairs that would be written, in field order.
    pub fn pairs(&self) -> Params {
        return self
            .fields
            .iter()
            .map(|f| return (f.param.trim(), f.value.trim()))
            .filter(|(param, value)| return !param.is_empty() && !value.is_empty())
            .collect();
    }

    /// Set the value of `param`. Returns `false` when the form has no such
    /// field, in which case nothing changes.
    pub fn set(&mut self, param: &str, value: impl Into<String>) -> bool {
        let Some(field) = self.fields.iter_mut().find(|f| return f.param == param) else {
            return false;
        };
        field.value = value.into();
        return true;
    }

    /// Reveal every field.
    pub fn show_all(&mut self) {
        for field in &mut self.fields {
            field.hidden = false;
        }
        return;
    }

    /// Re-derive the fields for another template.
    ///
    /// Values of fields the new schema also has are carried over; the rest
    /// are dropped from the form.
    pub fn switch_template(&mut self, template_name: &str, catalog: &Catalog, language: &str) {
        let carried: Params = self
            .fields
            .iter()
            .map(|f| return (f.param.as_str(), f.value.as_str()))
            .collect();
        *self = Self::build(&self.name, template_name, &carried, catalog, language);
        return;
    }
}

impl Reference {
    /// Rebuild this reference from edited fields and regenerate its markup.
    ///
    /// Only pairs with a non-empty name and value (after trimming) are kept,
    /// in field order, so parameters end up in schema order. A raw
    /// reference becomes a template reference.
    pub fn load_from_form(&mut self, form: &EditForm) {
        let name = form.name.trim();
        self.name = (!name.is_empty()).then(|| return name.to_string());
        self.kind = ReferenceKind::Template(TemplateReference {
            params: form.pairs(),
            template_name: form.template_name.trim().to_string(),
        });
        self.source_text = self.to_wikitext();
        return;
    }
}

impl TemplateReference {
    /// The edit form for this reference, labels in `language`.
    ///
    /// Parameters the schema does not declare get no field.
    pub fn to_form(&self, name: Option<&str>, catalog: &Catalog, language: &str) -> EditForm {
        return EditForm::build(name.unwrap_or(""), &self.template_name, &self.params, catalog, language);
    }
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc, reason = "test code")]
mod tests {
    use super::*;
    use crate::catalog::{LocalizedText, ParamDef, TemplateSchema};
    use crate::parser::parse;

    fn catalog() -> Catalog {
        let mut title = ParamDef::named("title");
        title.required = true;
        title.label = Some(LocalizedText::Plain("Title".to_string()));
        let mut author = ParamDef::named("author");
        author.suggested = true;
        let mut url = ParamDef::named("url");
        url.required = true;
        url.input_type = Some("url".to_string());
        return Catalog::new(vec![
            TemplateSchema {
                name: "Template:Cite book".to_string(),
                params: vec![title.clone(), author, ParamDef::named("isbn"), ParamDef::named("year")],
            },
            TemplateSchema {
                name: "Template:Cite web".to_string(),
                params: vec![url, title],
            },
        ]);
    }

    fn first_reference(text: &str) -> Reference {
        return parse(text, &catalog()).into_references().remove(0);
    }

    fn form_of(reference: &Reference) -> EditForm {
        return reference
            .as_template()
            .unwrap()
            .to_form(reference.name.as_deref(), &catalog(), "en");
    }

    #[test]
    fn form_follows_schema_and_hides_empty_optionals() {
        let reference = first_reference(r#"<ref name="r">{{Cite book|year=1859|title=Origin}}</ref>"#);
        let form = form_of(&reference);
        assert_eq!(form.name, "r");
        assert_eq!(form.template_name, "Cite book");
        let params: Vec<&str> = form.fields.iter().map(|f| f.param.as_str()).collect();
        assert_eq!(params, vec!["title", "author", "isbn", "year"]);

        let title = form.field("title").unwrap();
        assert_eq!(title.label, "Title");
        assert_eq!(title.value, "Origin");
        assert_eq!(title.input_type, "text");
        assert!(!title.hidden);
        assert!(!form.field("author").unwrap().hidden);
        assert!(form.field("isbn").unwrap().hidden);
        assert!(!form.field("year").unwrap().hidden);
    }

    #[test]
    fn show_all_reveals_fields() {
        let mut form = form_of(&first_reference("<ref>{{Cite book|title=T}}</ref>"));
        form.show_all();
        assert!(form.fields.iter().all(|f| !f.hidden));
    }

    #[test]
    fn load_writes_schema_order_and_drops_empty() {
        let mut reference = first_reference("<ref>{{Cite book|year=1859|title=Origin|publisher=Murray}}</ref>");
        let mut form = form_of(&reference);
        assert!(form.set("author", "  Darwin "));
        assert!(form.set("isbn", "   "));
        assert!(!form.set("publisher", "Murray"));
        reference.load_from_form(&form);
        assert_eq!(
            reference.source_text,
            "<ref>{{Cite book |title=Origin |author=Darwin |year=1859}}</ref>"
        );
    }

    #[test]
    fn load_then_serialize_is_idempotent() {
        let mut reference = first_reference(r#"<ref name="x">{{Cite book|title=A|author=B}}</ref>"#);
        let form = form_of(&reference);
        reference.load_from_form(&form);
        let first = reference.to_wikitext();
        reference.load_from_form(&form);
        let second = reference.to_wikitext();
        assert_eq!(first, second);
        assert_eq!(first, reference.source_text);
    }

    #[test]
    fn switch_template_carries_shared_values_only() {
        let reference = first_reference("<ref>{{Cite book|title=T|author=A}}</ref>");
        let mut form = form_of(&reference);
        form.switch_template("Cite web", &catalog(), "en");
        let params: Vec<&str> = form.fields.iter().map(|f| f.param.as_str()).collect();
        assert_eq!(params, vec!["url", "title"]);
        assert_eq!(form.field("title").unwrap().value, "T");
        assert_eq!(form.field("url").unwrap().input_type, "url");
        assert!(form.field("author").is_none());
    }

    #[test]
    fn unknown_schema_form_has_only_name_and_template() {
        let mut reference = Reference::new_template("Cite nothing");
        reference.as_template_mut().unwrap().params.insert("title", "Lost");
        let mut form = reference.as_template().unwrap().to_form(None, &catalog(), "en");
        assert!(form.fields.is_empty());
        form.name = " keep ".to_string();
        reference.load_from_form(&form);
        assert_eq!(reference.name.as_deref(), Some("keep"));
        assert_eq!(reference.source_text, r#"<ref name="keep">{{Cite nothing}}</ref>"#);
    }
}

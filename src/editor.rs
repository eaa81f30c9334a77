//! Editing session over one text buffer.
//!
//! The session keeps only the latest scan. Every write to the buffer is
//! followed by a full rescan, so the model never drifts from the text.

use crate::buffer::TextBuffer;
use crate::catalog::Catalog;
use crate::error::Error;
use crate::form::EditForm;
use crate::parser::{ReferenceParser, ScanOutcome, TemplatePattern};
use crate::types::{Reference, TextRange};

/// A buffer, the catalog used to read it, and the references found in it.
pub struct Editor<B: TextBuffer> {
    /// The document being edited.
    buffer: B,
    /// Template schemas.
    catalog: Catalog,
    /// Tag to record once the session writes to the buffer.
    change_tag: Option<String>,
    /// Language for labels and descriptions.
    language: String,
    /// Tags recorded so far.
    recorded_tags: Vec<String>,
    /// Result of the latest scan.
    scan: ScanOutcome,
    /// Template matcher compiled once for `catalog`.
    template_pattern: TemplatePattern,
}

impl<B: TextBuffer> Editor<B> {
    /// The underlying buffer.
    pub const fn buffer(&self) -> &B {
        return &self.buffer;
    }

    /// The catalog references are classified against.
    pub const fn catalog(&self) -> &Catalog {
        return &self.catalog;
    }

    /// Tags recorded by writes in this session, each at most once.
    pub fn change_tags(&self) -> &[String] {
        return &self.recorded_tags;
    }

    /// Place a freshly written reference at `offset`, highlight it, and rescan.
    fn commit(&mut self, reference: &mut Reference, offset: usize) {
        reference.offset = offset;
        let range = reference.highlight();
        self.select(&range);
        self.record_change_tag();
        self.rescan();
        return;
    }

    /// The edit form of the reference at `index`.
    ///
    /// # Errors
    ///
    /// Returns `Error::ReferenceOutOfRange` for a bad index, or
    /// `Error::NotATemplateReference` for a raw reference.
    pub fn form_for(&self, index: usize) -> Result<EditForm, Error> {
        let reference = self.reference(index)?;
        let Some(template) = reference.as_template() else {
            return Err(Error::NotATemplateReference { index: index.saturating_add(1) });
        };
        return Ok(template.to_form(reference.name.as_deref(), &self.catalog, &self.language));
    }

    /// Select and reveal citation `citation` of reference `index`.
    ///
    /// # Errors
    ///
    /// Returns `Error::ReferenceOutOfRange` or `Error::CitationOutOfRange`
    /// for bad indices.
    pub fn highlight_citation(&mut self, index: usize, citation: usize) -> Result<TextRange, Error> {
        let reference = self.reference(index)?;
        let Some(found) = reference.citations.get(citation) else {
            return Err(Error::CitationOutOfRange {
                count: reference.citations.len(),
                index: citation.saturating_add(1),
                reference: index.saturating_add(1),
            });
        };
        let range = found.highlight();
        self.select(&range);
        return Ok(range);
    }

    /// Select and reveal the reference at `index`.
    ///
    /// # Errors
    ///
    /// Returns `Error::ReferenceOutOfRange` for a bad index.
    pub fn highlight_reference(&mut self, index: usize) -> Result<TextRange, Error> {
        let range = self.reference(index)?.highlight();
        self.select(&range);
        return Ok(range);
    }

    /// Write a new reference built from `form` over the current selection,
    /// or at the caret when nothing is selected. Returns the reference as
    /// written.
    ///
    /// # Errors
    ///
    /// Returns `Error::UnknownTemplate` when the form names no template,
    /// leaving the buffer untouched.
    pub fn insert(&mut self, form: &EditForm) -> Result<Reference, Error> {
        require_template(form)?;
        let mut reference = Reference::new_template(form.template_name.as_str());
        reference.load_from_form(form);
        self.buffer.replace_selection(&reference.source_text, false);
        let offset = self.buffer.selection().start;
        tracing::debug!(offset, wikitext = %reference.source_text, "inserted reference");
        self.commit(&mut reference, offset);
        return Ok(reference);
    }

    /// Consume the session, returning the buffer.
    pub fn into_buffer(self) -> B {
        return self.buffer;
    }

    /// Start a session and scan the buffer once.
    pub fn new(buffer: B, catalog: Catalog, language: impl Into<String>, change_tag: Option<String>) -> Self {
        let template_pattern = TemplatePattern::for_catalog(&catalog);
        let mut editor = Self {
            buffer,
            catalog,
            change_tag,
            language: language.into(),
            recorded_tags: Vec::new(),
            scan: ScanOutcome::NoReferences,
            template_pattern,
        };
        editor.rescan();
        return editor;
    }

    /// An empty form for a new reference using the catalog's first template.
    pub fn new_form(&self) -> EditForm {
        let template = self.catalog.first_template().unwrap_or("");
        let reference = Reference::new_template(template);
        return reference
            .as_template()
            .map(|t| return t.to_form(None, &self.catalog, &self.language))
            .unwrap_or_else(|| {
                return EditForm {
                    fields: Vec::new(),
                    name: String::new(),
                    template_name: template.to_string(),
                };
            });
    }

    /// Record the configured change tag unless already recorded.
    fn record_change_tag(&mut self) {
        let Some(tag) = self.change_tag.as_ref() else {
            return;
        };
        if !self.recorded_tags.contains(tag) {
            self.recorded_tags.push(tag.clone());
        }
        return;
    }

    /// The reference at `index` in the latest scan.
    ///
    /// # Errors
    ///
    /// Returns `Error::ReferenceOutOfRange` for a bad index.
    pub fn reference(&self, index: usize) -> Result<&Reference, Error> {
        let references = self.scan.references();
        return references.get(index).ok_or(Error::ReferenceOutOfRange {
            count: references.len(),
            index: index.saturating_add(1),
        });
    }

    /// References of the latest scan, in document order.
    pub fn references(&self) -> &[Reference] {
        return self.scan.references();
    }

    /// Re-read the buffer and rebuild every reference from scratch.
    pub fn rescan(&mut self) -> &ScanOutcome {
        let text = self.buffer.text();
        self.scan = ReferenceParser::with_pattern(&self.catalog, self.template_pattern.clone()).parse(&text);
        return &self.scan;
    }

    /// Latest scan result.
    pub const fn scan(&self) -> &ScanOutcome {
        return &self.scan;
    }

    /// Select `range` in the buffer and scroll to it.
    fn select(&mut self, range: &TextRange) {
        self.buffer.set_selection_range(range.start, range.end);
        self.buffer.scroll_selection_into_view();
        return;
    }

    /// Rewrite the reference at `index` from `form`.
    ///
    /// The first occurrence of the reference's previous markup in the buffer
    /// is replaced; later identical copies are left untouched. The written
    /// reference's offset is the first occurrence of its new markup.
    ///
    /// # Errors
    ///
    /// Returns `Error::ReferenceOutOfRange` for a bad index,
    /// `Error::NotATemplateReference` for a raw reference, or
    /// `Error::UnknownTemplate` when the form names no template.
    pub fn update(&mut self, index: usize, form: &EditForm) -> Result<Reference, Error> {
        let mut reference = self.reference(index)?.clone();
        if reference.as_template().is_none() {
            return Err(Error::NotATemplateReference { index: index.saturating_add(1) });
        }
        require_template(form)?;

        let previous = reference.source_text.clone();
        reference.load_from_form(form);

        let text = self.buffer.text();
        let occurrences = text.matches(previous.as_str()).count();
        if occurrences > 1 {
            tracing::warn!(occurrences, markup = %previous, "reference markup repeats; only the first copy is updated");
        }
        let updated = text.replacen(previous.as_str(), &reference.source_text, 1);
        let offset = updated.find(reference.source_text.as_str()).unwrap_or(0);
        self.buffer.set_text(updated);
        tracing::debug!(from = %previous, to = %reference.source_text, "updated reference");

        self.commit(&mut reference, offset);
        return Ok(reference);
    }
}

/// Refuse forms that would serialize as `{{}}`.
///
/// # Errors
///
/// Returns `Error::UnknownTemplate` with an empty name.
fn require_template(form: &EditForm) -> Result<(), Error> {
    if form.template_name.trim().is_empty() {
        return Err(Error::UnknownTemplate { name: String::new() });
    }
    return Ok(());
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc, reason = "test code")]
mod tests {
    use super::*;
    use crate::buffer::MemoryBuffer;
    use crate::catalog::{ParamDef, TemplateSchema};

    fn catalog() -> Catalog {
        let mut title = ParamDef::named("title");
        title.required = true;
        let mut url = ParamDef::named("url");
        url.required = true;
        return Catalog::new(vec![
            TemplateSchema {
                name: "Template:Cite book".to_string(),
                params: vec![title.clone(), ParamDef::named("author")],
            },
            TemplateSchema {
                name: "Template:Cite web".to_string(),
                params: vec![url, title],
            },
        ]);
    }

    fn editor(text: &str) -> Editor<MemoryBuffer> {
        return Editor::new(MemoryBuffer::new(text), catalog(), "en", Some("ProveIt".to_string()));
    }

    #[test]
    fn scans_on_creation() {
        let editor = editor("A<ref>{{Cite book|title=T}}</ref>");
        assert_eq!(editor.references().len(), 1);
        assert!(editor.change_tags().is_empty());
    }

    #[test]
    fn update_replaces_first_occurrence_only() {
        let duplicated = "<ref>{{Cite book|title=T}}</ref>";
        let text = format!("{duplicated} middle {duplicated}");
        let mut editor = editor(&text);
        let mut form = editor.form_for(0).unwrap();
        form.set("title", "New");

        let written = editor.update(0, &form).unwrap();
        let expected_new = "<ref>{{Cite book |title=New}}</ref>";
        assert_eq!(written.source_text, expected_new);
        assert_eq!(editor.buffer().text(), format!("{expected_new} middle {duplicated}"));
        assert_eq!(written.offset, 0);
        assert_eq!(editor.references().len(), 2);
    }

    #[test]
    fn update_selects_written_reference_and_tags_once() {
        let mut editor = editor(r#"Intro <ref name="a">{{Cite book|title=T}}</ref> then <ref name="a" />"#);
        let form = editor.form_for(0).unwrap();
        let written = editor.update(0, &form).unwrap();
        let text = editor.buffer().text();
        assert_eq!(text.get(editor.buffer().selection()), Some(written.source_text.as_str()));
        assert_eq!(editor.buffer().scrolled_to(), Some(6));

        let again = editor.form_for(0).unwrap();
        editor.update(0, &again).unwrap();
        assert_eq!(editor.change_tags(), ["ProveIt".to_string()]);
        assert_eq!(editor.references().first().unwrap().citations.len(), 1);
    }

    #[test]
    fn update_after_template_switch_drops_unknown_params() {
        let mut editor = editor("<ref>{{Cite book|title=T|author=A}}</ref>");
        let mut form = editor.form_for(0).unwrap();
        form.switch_template("Cite web", &catalog(), "en");
        form.set("url", "http://example.org");
        editor.update(0, &form).unwrap();
        assert_eq!(editor.buffer().text(), "<ref>{{Cite web |url=http://example.org |title=T}}</ref>");
    }

    #[test]
    fn insert_at_caret_and_over_selection() {
        let mut editor = editor("Claim. More.");
        let mut form = editor.new_form();
        assert_eq!(form.template_name, "Cite book");
        form.set("title", "Origin");
        form.name = "origin".to_string();

        editor.buffer.set_selection_range(6, 6);
        let written = editor.insert(&form).unwrap();
        assert_eq!(editor.buffer().text(), r#"Claim.<ref name="origin">{{Cite book |title=Origin}}</ref> More."#);
        assert_eq!(written.offset, 6);
        assert_eq!(editor.references().len(), 1);
        assert_eq!(editor.change_tags().len(), 1);

        editor.buffer.set_selection_range(0, 5);
        editor.insert(&form).unwrap();
        assert!(editor.buffer().text().starts_with(r#"<ref name="origin">"#));
        assert_eq!(editor.references().len(), 2);
    }

    #[test]
    fn raw_references_are_not_editable() {
        let mut editor = editor("<ref>plain text</ref>");
        assert!(matches!(editor.form_for(0), Err(Error::NotATemplateReference { index: 1 })));
        let form = editor.new_form();
        assert!(matches!(editor.update(0, &form), Err(Error::NotATemplateReference { .. })));
        assert_eq!(editor.buffer().text(), "<ref>plain text</ref>");
    }

    #[test]
    fn highlight_addresses_references_and_citations() {
        let text = r#"<ref name="n" /> <ref name="n">x</ref>"#;
        let mut editor = editor(text);
        let range = editor.highlight_reference(0).unwrap();
        assert_eq!(text.get(range), Some(r#"<ref name="n">x</ref>"#));
        let range = editor.highlight_citation(0, 0).unwrap();
        assert_eq!(range, 0..16);
        assert_eq!(editor.buffer().selection(), 0..16);
        assert!(matches!(editor.highlight_citation(0, 1), Err(Error::CitationOutOfRange { count: 1, .. })));
        assert!(matches!(editor.highlight_reference(3), Err(Error::ReferenceOutOfRange { count: 1, index: 4 })));
    }

    #[test]
    fn insert_without_any_template_leaves_buffer_alone() {
        let mut editor = Editor::new(MemoryBuffer::new("Claim."), Catalog::default(), "en", None);
        let form = editor.new_form();
        assert_eq!(form.template_name, "");
        assert!(matches!(editor.insert(&form), Err(Error::UnknownTemplate { .. })));
        assert_eq!(editor.buffer().text(), "Claim.");
        assert!(editor.scan().is_empty());
    }

    #[test]
    fn update_to_empty_template_is_refused() {
        let text = "<ref>{{Cite book|title=T}}</ref>";
        let mut editor = editor(text);
        let mut form = editor.form_for(0).unwrap();
        form.template_name = "  ".to_string();
        assert!(matches!(editor.update(0, &form), Err(Error::UnknownTemplate { .. })));
        assert_eq!(editor.buffer().text(), text);
    }

    #[test]
    fn rescan_picks_up_external_edits() {
        let mut editor = editor("nothing yet");
        assert!(editor.scan().is_empty());
        editor.buffer.set_text("now <ref>one</ref>".to_string());
        assert_eq!(editor.rescan().references().len(), 1);
    }

    #[test]
    fn without_change_tag_nothing_is_recorded() {
        let mut editor = Editor::new(MemoryBuffer::new(""), catalog(), "en", None);
        let form = editor.new_form();
        editor.insert(&form).unwrap();
        assert!(editor.change_tags().is_empty());
        assert_eq!(editor.buffer().text(), "<ref>{{Cite book}}</ref>");
    }
}

//! Command-line commands: list, show, highlight, update, insert, templates.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use wikiref::buffer::{MemoryBuffer, TextBuffer as _};
use wikiref::catalog::Catalog;
use wikiref::config::Config;
use wikiref::editor::Editor;
use wikiref::form::EditForm;
use wikiref::parser::ScanOutcome;
use wikiref::types::{Reference, ReferenceKind};
use wikiref::Error;

/// Field changes requested on the command line.
pub struct EditArgs {
    /// New reference name, if given.
    pub name: Option<String>,
    /// `param=value` assignments in the order given.
    pub set: Vec<String>,
    /// Template to switch to, if given.
    pub template: Option<String>,
}

/// Apply command-line edits to a form.
///
/// # Errors
///
/// Returns `Error::UnknownTemplate` if `--template` names no catalog entry,
/// or `Error::InvalidAssignment` for a malformed `--set`.
fn apply_edits(form: &mut EditForm, edits: &EditArgs, catalog: &Catalog, language: &str) -> Result<(), Error> {
    if let Some(requested) = edits.template.as_deref() {
        let canonical = catalog.canonical_name(requested);
        if catalog.lookup(&canonical).is_none() {
            return Err(Error::UnknownTemplate { name: requested.to_string() });
        }
        form.switch_template(&canonical, catalog, language);
    }

    if let Some(name) = edits.name.as_deref() {
        form.name = name.to_string();
    }

    for assignment in &edits.set {
        let Some((param, value)) = assignment.split_once('=') else {
            return Err(Error::InvalidAssignment { input: assignment.clone() });
        };
        let param = param.trim();
        if param.is_empty() {
            return Err(Error::InvalidAssignment { input: assignment.clone() });
        }
        if !form.set(param, value) {
            eprintln!(
                "warning: template `{}` has no parameter `{param}`; ignored",
                form.template_name
            );
        }
    }

    return Ok(());
}

/// One-line summary of a reference for `list`.
fn describe_reference(position: usize, reference: &Reference, catalog: &Catalog, language: &str) -> String {
    let name = reference.name.as_deref().unwrap_or("-");
    let mut line = match &reference.kind {
        ReferenceKind::Raw => format!("{position:>3}  raw       name={name}  {}", reference.source_text),
        ReferenceKind::Template(template) => {
            let mut summary = format!("{position:>3}  template  name={name}  {{{{{}}}}}", template.template_name);
            for param in template.required_params(catalog) {
                let value = template.params.get(&param.name).unwrap_or("");
                let _ = write!(summary, "  {}: {value}", param.label_in(language));
            }
            summary
        },
    };
    let count = reference.citations.len();
    if count > 0 {
        let _ = write!(line, "  ({count} citation{})", if count == 1 { "" } else { "s" });
    }
    return line;
}

/// Scan a file and print the range of one reference or citation.
///
/// # Errors
///
/// Returns errors from config, catalog, or file loading, or addressing errors.
pub fn highlight(file: &Path, index: usize, citation: Option<usize>) -> Result<(), Error> {
    let mut editor = open_session(file, load_config()?)?;
    let reference = locate(file, &editor, index)?;
    let range = match citation {
        None => editor.highlight_reference(reference)?,
        Some(number) => {
            let Some(zero_based) = number.checked_sub(1) else {
                return Err(Error::CitationOutOfRange {
                    count: editor.reference(reference)?.citations.len(),
                    index: number,
                    reference: index,
                });
            };
            editor.highlight_citation(reference, zero_based)?
        },
    };

    let text = editor.buffer().text();
    let selected = text.get(range.clone()).unwrap_or("");
    println!("{}..{}  {selected}", range.start, range.end);
    return Ok(());
}

/// Insert a new template reference into a file.
///
/// # Errors
///
/// Returns errors from config, catalog, or file loading, edit parsing, or writing.
pub fn insert(file: &Path, at: Option<usize>, edits: &EditArgs) -> Result<(), Error> {
    let config = load_config()?;
    let text = read_document(file)?;
    let caret = at.unwrap_or(text.len());
    let mut buffer = MemoryBuffer::new(text);
    buffer.set_selection_range(caret, caret);

    let language = config.language.clone();
    let mut editor = start_session(buffer, config)?;
    let mut form = editor.new_form();
    apply_edits(&mut form, edits, editor.catalog(), &language)?;

    let written = editor.insert(&form)?;
    write_session(file, &editor)?;
    eprintln!("Inserted at {}: {}", written.offset, written.source_text);
    return Ok(());
}

/// Scan a file and print one line per reference.
///
/// # Errors
///
/// Returns errors from config, catalog, or file loading.
pub fn list(file: &Path) -> Result<(), Error> {
    let config = load_config()?;
    let catalog = load_catalog(&config)?;
    let text = read_document(file)?;
    print_references(&wikiref::parse(&text, &catalog), &catalog, &config.language);
    return Ok(());
}

/// Load the catalog named by the config. A missing catalog is not fatal:
/// every reference is then read as raw text.
///
/// # Errors
///
/// Returns `Error::Io`, `Error::Json`, or `Error::CatalogInvalid` when the
/// catalog exists but cannot be read.
fn load_catalog(config: &Config) -> Result<Catalog, Error> {
    return match Catalog::load(&config.catalog) {
        Err(Error::CatalogNotFound { path }) => {
            tracing::warn!(path = %path.display(), "catalog not found; all references will be raw");
            Ok(Catalog::default())
        },
        other => other,
    };
}

/// Load `.wikiref.toml` from the working directory.
///
/// # Errors
///
/// Returns config loading errors.
fn load_config() -> Result<Config, Error> {
    return Config::load(&PathBuf::from("."));
}

/// Turn a one-based reference number into an index into the session's scan.
///
/// # Errors
///
/// Returns `Error::NoReferences` when the document has none, or
/// `Error::ReferenceOutOfRange` for zero or numbers past the end.
fn locate(file: &Path, editor: &Editor<MemoryBuffer>, number: usize) -> Result<usize, Error> {
    if editor.scan().is_empty() {
        return Err(Error::NoReferences { path: file.to_path_buf() });
    }
    return to_zero_based(number, editor.references().len());
}

/// Open an editing session over a file.
///
/// # Errors
///
/// Returns errors from catalog or file loading.
fn open_session(file: &Path, config: Config) -> Result<Editor<MemoryBuffer>, Error> {
    let text = read_document(file)?;
    return start_session(MemoryBuffer::new(text), config);
}

/// Print a scan the way `list` and `watch` show it.
pub fn print_references(scan: &ScanOutcome, catalog: &Catalog, language: &str) {
    match scan {
        ScanOutcome::NoReferences => println!("No references found"),
        ScanOutcome::Found(references) => {
            for (i, reference) in references.iter().enumerate() {
                println!("{}", describe_reference(i.saturating_add(1), reference, catalog, language));
            }
        },
    }
    return;
}

/// Read a document, mapping a missing file to `Error::FileNotFound`.
///
/// # Errors
///
/// Returns `Error::FileNotFound` or `Error::Io`.
pub fn read_document(file: &Path) -> Result<String, Error> {
    return match std::fs::read_to_string(file) {
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(Error::FileNotFound { path: file.to_path_buf() })
        },
        Err(e) => Err(Error::Io(e)),
        Ok(text) => Ok(text),
    };
}

/// Print the edit form of one reference.
///
/// # Errors
///
/// Returns errors from config, catalog, or file loading, addressing errors,
/// or `Error::Json` when JSON output fails.
pub fn show(file: &Path, index: usize, all: bool, json: bool) -> Result<(), Error> {
    let editor = open_session(file, load_config()?)?;
    let reference = locate(file, &editor, index)?;
    let mut form = editor.form_for(reference)?;
    if all {
        form.show_all();
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&form)?);
        return Ok(());
    }

    let name = if form.name.is_empty() { "-" } else { form.name.as_str() };
    println!("name:     {name}");
    println!("template: {}", form.template_name);
    let hidden = form.fields.iter().filter(|f| return f.hidden).count();
    for field in form.fields.iter().filter(|f| return !f.hidden) {
        println!("  {:<20} {:<24} {}", field.param, field.label, field.value);
    }
    if hidden > 0 {
        println!("  ({hidden} empty optional parameters hidden, use --all)");
    }
    return Ok(());
}

/// Start a session over a buffer with the configured catalog.
///
/// # Errors
///
/// Returns errors from catalog loading.
fn start_session(buffer: MemoryBuffer, config: Config) -> Result<Editor<MemoryBuffer>, Error> {
    let catalog = load_catalog(&config)?;
    return Ok(Editor::new(buffer, catalog, config.language, config.tag));
}

/// List catalog templates and their parameter classes.
///
/// # Errors
///
/// Returns errors from config or catalog loading.
pub fn templates() -> Result<(), Error> {
    let config = load_config()?;
    let catalog = Catalog::load(&config.catalog)?;
    if catalog.is_empty() {
        println!("No templates in {}", config.catalog.display());
        return Ok(());
    }
    for schema in catalog.templates() {
        println!("{}", schema.name);
        for param in &schema.params {
            let class = if param.required {
                "required"
            } else if param.suggested {
                "suggested"
            } else {
                "optional"
            };
            println!("  {:<20} {:<10} {}", param.name, class, param.label_in(&config.language));
        }
    }
    return Ok(());
}

/// Convert a one-based reference number to an index.
///
/// # Errors
///
/// Returns `Error::ReferenceOutOfRange` for zero or numbers past the end.
fn to_zero_based(number: usize, count: usize) -> Result<usize, Error> {
    return match number.checked_sub(1) {
        Some(index) if index < count => Ok(index),
        _ => Err(Error::ReferenceOutOfRange { count, index: number }),
    };
}

/// Rewrite one template reference of a file in place.
///
/// # Errors
///
/// Returns errors from config, catalog, or file loading, addressing or
/// edit errors, or `Error::Io` when writing fails.
pub fn update(file: &Path, index: usize, edits: &EditArgs) -> Result<(), Error> {
    let config = load_config()?;
    let language = config.language.clone();
    let mut editor = open_session(file, config)?;
    let reference = locate(file, &editor, index)?;
    let mut form = editor.form_for(reference)?;
    apply_edits(&mut form, edits, editor.catalog(), &language)?;

    let written = editor.update(reference, &form)?;
    write_session(file, &editor)?;
    eprintln!("Updated reference {index}: {}", written.source_text);
    return Ok(());
}

/// Write the session's buffer back to `file` and report change tags.
///
/// # Errors
///
/// Returns `Error::Io` if the file cannot be written.
fn write_session(file: &Path, editor: &Editor<MemoryBuffer>) -> Result<(), Error> {
    std::fs::write(file, editor.buffer().text())?;
    for tag in editor.change_tags() {
        eprintln!("tag: {tag}");
    }
    return Ok(());
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc, reason = "test code")]
mod tests {
    use super::*;
    use wikiref::catalog::{ParamDef, TemplateSchema};

    fn catalog() -> Catalog {
        let mut title = ParamDef::named("title");
        title.required = true;
        return Catalog::new(vec![
            TemplateSchema { name: "Template:Cite book".to_string(), params: vec![title, ParamDef::named("year")] },
            TemplateSchema { name: "Template:Cite web".to_string(), params: vec![ParamDef::named("url")] },
        ]);
    }

    fn book_form() -> EditForm {
        return Reference::new_template("Cite book").as_template().unwrap().to_form(None, &catalog(), "en");
    }

    #[test]
    fn apply_edits_sets_fields_and_name() {
        let mut form = book_form();
        let edits = EditArgs {
            name: Some("n".to_string()),
            set: vec!["title=A = B".to_string(), "year=1900".to_string()],
            template: None,
        };
        apply_edits(&mut form, &edits, &catalog(), "en").unwrap();
        assert_eq!(form.name, "n");
        assert_eq!(form.field("title").unwrap().value, "A = B");
        assert_eq!(form.field("year").unwrap().value, "1900");
    }

    #[test]
    fn apply_edits_normalizes_template() {
        let mut form = book_form();
        let edits = EditArgs { name: None, set: vec!["url=u".to_string()], template: Some("cite web".to_string()) };
        apply_edits(&mut form, &edits, &catalog(), "en").unwrap();
        assert_eq!(form.template_name, "Cite web");
        assert_eq!(form.field("url").unwrap().value, "u");
    }

    #[test]
    fn apply_edits_rejects_bad_input() {
        let mut form = book_form();
        let unknown = EditArgs { name: None, set: vec![], template: Some("Cite nothing".to_string()) };
        assert!(matches!(apply_edits(&mut form, &unknown, &catalog(), "en"), Err(Error::UnknownTemplate { .. })));
        let malformed = EditArgs { name: None, set: vec!["title".to_string()], template: None };
        assert!(matches!(apply_edits(&mut form, &malformed, &catalog(), "en"), Err(Error::InvalidAssignment { .. })));
    }

    #[test]
    fn describe_shows_required_values_and_citations() {
        let text = r#"<ref name="a">{{Cite book|title=Origin}}</ref><ref name="a"/><ref>plain</ref>"#;
        let references = wikiref::parse(text, &catalog()).into_references();
        let first = describe_reference(1, references.first().unwrap(), &catalog(), "en");
        assert_eq!(first, "  1  template  name=a  {{Cite book}}  title: Origin  (1 citation)");
        let second = describe_reference(2, references.get(1).unwrap(), &catalog(), "en");
        assert_eq!(second, "  2  raw       name=-  <ref>plain</ref>");
    }

    #[test]
    fn one_based_numbers_are_checked() {
        assert_eq!(to_zero_based(1, 2).unwrap(), 0);
        assert!(matches!(to_zero_based(0, 2), Err(Error::ReferenceOutOfRange { index: 0, count: 2 })));
        assert!(matches!(to_zero_based(3, 2), Err(Error::ReferenceOutOfRange { index: 3, .. })));
    }
}

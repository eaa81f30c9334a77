use std::fmt::Write as _;
use std::path::Path;

use wikiref::Error;
use wikiref::config::CONFIG_FILE;

const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// Render an error as valid markdown with bold headings and print to stderr.
pub fn print_error(e: &Error) {
    let md = render_error(e);
    for line in md.lines() {
        if line.starts_with('#') {
            eprintln!("{BOLD}{line}{RESET}");
        } else {
            eprintln!("{line}");
        }
    }
}

/// Render an error as a structured markdown diagnostic.
///
/// Each variant produces a block with what happened and, where there is
/// one, how to fix it.
pub fn render_error(e: &Error) -> String {
    match e {
        Error::CatalogNotFound { path } => render_catalog_not_found(path),
        Error::CatalogInvalid { path, reason } => render_catalog_invalid(path, reason),
        Error::ReferenceOutOfRange { index, count } => render_reference_out_of_range(*index, *count),
        Error::CitationOutOfRange { reference, index, count } => {
            render_citation_out_of_range(*reference, *index, *count)
        },
        Error::NotATemplateReference { index } => render_not_a_template(*index),
        Error::UnknownTemplate { name } => render_unknown_template(name),
        _ => render_generic(e),
    }
}

fn render_generic(e: &Error) -> String {
    match e {
        Error::FileNotFound { path } => format!("\
# Error: File Not Found

`{}` does not exist.
", path.display()),

        Error::InvalidAssignment { input } => format!("\
# Error: Invalid Assignment

`{input}` is not of the form `param=value`.

## Fix

    wikiref update page.wiki 1 --set title=Example
"),

        Error::NoReferences { path } => format!("\
# Error: No References

`{}` contains no `<ref>...</ref>` blocks.
", path.display()),

        Error::Io(e) => format!("\
# Error: I/O

{e}
"),
        Error::Json(e) => format!("\
# Error: Invalid JSON

{e}
"),
        Error::TomlDe(e) => format!("\
# Error: Invalid Config

{e}

## Fix

Check `{CONFIG_FILE}`. Known keys: `catalog`, `language`, `tag`.
"),
        Error::Watch(e) => format!("\
# Error: Watch Failed

{e}
"),
        // Already handled in render_error, but need exhaustive match.
        _ => format!("\
# Error

{e}
"),
    }
}

fn render_catalog_invalid(path: &Path, reason: &str) -> String {
    format!("\
# Error: Catalog Invalid

`{}` is not a usable TemplateData response: {reason}

## Fix

Save the output of `api.php?action=templatedata&titles=...&format=json`
and point `catalog` in `{CONFIG_FILE}` at it.
", path.display())
}

fn render_catalog_not_found(path: &Path) -> String {
    format!("\
# Error: Catalog Not Found

`{}` does not exist.

## Fix

Set `catalog` in `{CONFIG_FILE}` to a saved TemplateData response.
", path.display())
}

fn render_citation_out_of_range(reference: usize, index: usize, count: usize) -> String {
    let mut out = format!("\
# Error: Citation Out Of Range

Reference {reference} has {count} citation(s); citation {index} does not exist.
");
    if count > 0 {
        let _ = write!(out, "\n## Fix\n\nUse a citation number between 1 and {count}.\n");
    }
    out
}

fn render_not_a_template(index: usize) -> String {
    format!("\
# Error: Raw Reference

Reference {index} does not wrap a known citation template, so it has no
fields to edit. Raw references are always written back unchanged.
")
}

fn render_reference_out_of_range(index: usize, count: usize) -> String {
    let mut out = format!("\
# Error: Reference Out Of Range

The document has {count} reference(s); reference {index} does not exist.
");
    out.push_str("\
\n## Fix

List the references and their numbers:

    wikiref list <file>
");
    out
}

fn render_unknown_template(name: &str) -> String {
    if name.is_empty() {
        return "\
# Error: No Template

A reference needs a template, and none was chosen. The catalog may be
missing or empty.

## Fix

Check `catalog` in `.wikiref.toml`, then name a template:

    wikiref insert page.wiki --template \"Cite book\"
".to_string();
    }
    format!("\
# Error: Unknown Template

`{name}` is not in the template catalog.

## Fix

List the known templates:

    wikiref templates
")
}

/// Crate-level error types for the fallible host surface.
///
/// The scanning and serialization engine never fails; these errors come from
/// reading files, loading config or the template catalog, and addressing
/// references from the command line.
use std::path::PathBuf;

/// Every variant names the file, index, or reason for failure so a
/// diagnostic can be rendered without a debugger.
#[allow(clippy::error_impl_error, reason = "crate-level error type re-exported from lib")]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The TemplateData dump exists but does not have the expected shape.
    #[error("catalog invalid: {}: {reason}", path.display())]
    CatalogInvalid {
        /// Catalog file that failed validation.
        path: PathBuf,
        /// Description of what was wrong.
        reason: String,
    },

    /// The configured TemplateData dump does not exist on disk.
    #[error("catalog not found: {}", path.display())]
    CatalogNotFound {
        /// Path to the missing catalog file.
        path: PathBuf,
    },

    /// A citation index is past the end of a reference's citation list.
    #[error("citation {index} out of range: reference {reference} has {count} citations")]
    CitationOutOfRange {
        /// Number of citations attached to the reference.
        count: usize,
        /// One-based citation index that was requested.
        index: usize,
        /// One-based reference index.
        reference: usize,
    },

    /// A referenced document does not exist on disk.
    #[error("file not found: {}", path.display())]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// A `--set` argument was not of the form `param=value`.
    #[error("invalid assignment `{input}`: expected param=value")]
    InvalidAssignment {
        /// The raw argument.
        input: String,
    },

    /// Underlying I/O error from the filesystem.
    #[error("io: {0}")]
    Io(
        /// The wrapped I/O error.
        #[from]
        std::io::Error,
    ),

    /// JSON deserialization or serialization failed.
    #[error("json: {0}")]
    Json(
        /// The wrapped JSON error.
        #[from]
        serde_json::Error,
    ),

    /// The document contains no reference blocks at all.
    #[error("no references found in {}", path.display())]
    NoReferences {
        /// Document that was scanned.
        path: PathBuf,
    },

    /// An edit was requested on a reference that does not wrap a template.
    #[error("reference {index} is a raw reference and cannot be edited field by field")]
    NotATemplateReference {
        /// One-based reference index.
        index: usize,
    },

    /// A reference index is past the end of the scanned reference list.
    #[error("reference {index} out of range: document has {count} references")]
    ReferenceOutOfRange {
        /// Number of references in the document.
        count: usize,
        /// One-based index that was requested.
        index: usize,
    },

    /// TOML deserialization failed.
    #[error("toml deserialize: {0}")]
    TomlDe(
        /// The wrapped TOML deserialization error.
        #[from]
        toml::de::Error,
    ),

    /// The requested template is not registered in the catalog.
    #[error("unknown template: `{name}`")]
    UnknownTemplate {
        /// Template name as given by the user.
        name: String,
    },

    /// The file watcher could not be set up.
    #[error("watch: {0}")]
    Watch(
        /// The wrapped notify error.
        #[from]
        notify::Error,
    ),
}

//! Common types for the compilation pipeline.

use std::path::PathBuf;

use serde::Serialize;

/// Source extension the engines consume.
pub const SOURCE_EXTENSION: &str = ".tex";

/// Fixed output filename for docx conversion.
pub const DOCX_OUTPUT: &str = "output.docx";

/// Default entry filename when the caller does not supply one.
pub const DEFAULT_ENTRY: &str = "main.tex";

/// A single compilation request.
#[derive(Debug, Clone)]
pub struct CompilationRequest {
    /// The markup text to compile. May be empty or malformed; that is
    /// a compilation failure, not an input error.
    pub source_text: String,

    /// The file the toolchain is told to treat as the compilation
    /// root. Must be a relative filename without traversal segments.
    pub entry_filename: String,

    /// Which artifact to produce.
    pub output_kind: OutputKind,
}

impl CompilationRequest {
    /// Create a request with the default entry filename.
    pub fn new(source_text: impl Into<String>, output_kind: OutputKind) -> Self {
        Self {
            source_text: source_text.into(),
            entry_filename: DEFAULT_ENTRY.to_string(),
            output_kind,
        }
    }
}

/// Supported output artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    /// Fixed-layout, page-faithful document (render engine, 2 passes).
    Pdf,

    /// Word-processor-compatible document (conversion engine, 1 pass).
    Docx,
}

impl OutputKind {
    /// Media type for the produced artifact.
    pub fn media_type(self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
        }
    }

    /// Suggested download filename for the artifact.
    pub fn download_filename(self) -> &'static str {
        match self {
            Self::Pdf => "output.pdf",
            Self::Docx => DOCX_OUTPUT,
        }
    }

    /// Name of the artifact the engine is expected to leave in the
    /// workspace for the given entry filename.
    pub fn artifact_name(self, entry_filename: &str) -> String {
        match self {
            Self::Pdf => format!("{}.pdf", entry_stem(entry_filename)),
            Self::Docx => DOCX_OUTPUT.to_string(),
        }
    }
}

/// Jobname for an entry filename: the final path component with the
/// known source extension stripped.
///
/// Engines write their outputs into the working directory named after
/// the jobname, so `"chapters/intro.tex"` yields `"intro"` and the
/// artifact lands at the workspace root, not in the subdirectory.
/// A stem that collides with a reserved output name (`"output.tex"`)
/// still works, and anything not ending in the source extension is
/// returned unchanged.
pub fn entry_stem(entry_filename: &str) -> &str {
    let name = entry_filename
        .rsplit('/')
        .next()
        .unwrap_or(entry_filename);
    name.strip_suffix(SOURCE_EXTENSION).unwrap_or(name)
}

/// Result of driving one compilation to completion.
#[derive(Debug)]
pub enum CompilationOutcome {
    /// The artifact exists in the workspace and the final pass
    /// reported success.
    Success {
        /// Absolute path to the artifact inside the workspace.
        artifact_path: PathBuf,
    },

    /// Compilation failed; everything a human needs to self-diagnose.
    Failure(DiagnosticBundle),
}

impl CompilationOutcome {
    /// Returns true if compilation produced an artifact.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Get the artifact path if successful.
    pub fn artifact_path(&self) -> Option<&PathBuf> {
        match self {
            Self::Success { artifact_path } => Some(artifact_path),
            Self::Failure(_) => None,
        }
    }
}

/// Diagnostic material assembled from a failed compilation.
///
/// Immutable after construction; serialized as the failure payload.
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticBundle {
    /// Exit code of the final engine invocation (-1 when the process
    /// was killed or timed out before reporting a status).
    pub exit_code: i32,

    /// Whether the invocation exceeded its wall-clock budget.
    pub timed_out: bool,

    /// First fatal-error region of the engine log, or the log tail
    /// when no fatal marker was found. Empty when no log exists.
    pub log_excerpt: String,

    /// Numbered source lines around the cited error line, when the
    /// log cites one. `None` means "no snippet available", which is
    /// distinct from an empty snippet.
    pub source_snippet: Option<String>,

    /// Sorted names of every file in the workspace after the failed
    /// run. Confirms whether expected auxiliary files were produced.
    pub file_listing: Vec<String>,

    /// Bounded tail of the process's standard output.
    pub stdout_tail: String,

    /// Bounded tail of the process's standard error.
    pub stderr_tail: String,
}

impl DiagnosticBundle {
    /// Render the bundle as the human-readable block shown to users.
    pub fn render_text(&self) -> String {
        let mut out = String::new();

        if self.timed_out {
            out.push_str(&format!(
                "Compile failed (timed out, rc={}).\n\n",
                self.exit_code
            ));
        } else {
            out.push_str(&format!("Compile failed (rc={}).\n\n", self.exit_code));
        }

        if !self.log_excerpt.is_empty() {
            out.push_str(&format!("ENGINE LOG:\n{}\n\n", self.log_excerpt));
        }
        if let Some(snippet) = &self.source_snippet {
            out.push_str(&format!("SOURCE SNIPPET:\n{}\n\n", snippet));
        }
        out.push_str(&format!("FILES:\n{:?}\n\n", self.file_listing));
        out.push_str(&format!("STDOUT TAIL:\n{}\n\n", self.stdout_tail));
        out.push_str(&format!("STDERR TAIL:\n{}", self.stderr_tail));

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_stem() {
        assert_eq!(entry_stem("main.tex"), "main");
        assert_eq!(entry_stem("thesis.tex"), "thesis");
        // Reserved output name as stem still works.
        assert_eq!(entry_stem("output.tex"), "output");
        // Only the known source extension is stripped.
        assert_eq!(entry_stem("notes.txt"), "notes.txt");
    }

    #[test]
    fn test_entry_stem_uses_final_component() {
        // Outputs are named after the jobname regardless of where the
        // entry file itself lives.
        assert_eq!(entry_stem("chapters/intro.tex"), "intro");
        assert_eq!(entry_stem("a/b.tex"), "b");
    }

    #[test]
    fn test_artifact_names() {
        assert_eq!(OutputKind::Pdf.artifact_name("main.tex"), "main.pdf");
        assert_eq!(OutputKind::Pdf.artifact_name("output.tex"), "output.pdf");
        assert_eq!(OutputKind::Pdf.artifact_name("chapters/intro.tex"), "intro.pdf");
        assert_eq!(OutputKind::Docx.artifact_name("main.tex"), "output.docx");
    }

    #[test]
    fn test_media_types() {
        assert_eq!(OutputKind::Pdf.media_type(), "application/pdf");
        assert!(OutputKind::Docx.media_type().contains("wordprocessingml"));
    }

    #[test]
    fn test_render_text_includes_sections() {
        let bundle = DiagnosticBundle {
            exit_code: 1,
            timed_out: false,
            log_excerpt: "! Undefined control sequence.".to_string(),
            source_snippet: Some("0006: \\badmacro".to_string()),
            file_listing: vec!["main.log".to_string(), "main.tex".to_string()],
            stdout_tail: "out".to_string(),
            stderr_tail: "err".to_string(),
        };

        let text = bundle.render_text();
        assert!(text.starts_with("Compile failed (rc=1)."));
        assert!(text.contains("! Undefined control sequence."));
        assert!(text.contains("SOURCE SNIPPET"));
        assert!(text.contains("main.log"));
    }

    #[test]
    fn test_render_text_omits_absent_snippet() {
        let bundle = DiagnosticBundle {
            exit_code: 1,
            timed_out: true,
            log_excerpt: String::new(),
            source_snippet: None,
            file_listing: vec![],
            stdout_tail: String::new(),
            stderr_tail: String::new(),
        };

        let text = bundle.render_text();
        assert!(text.contains("timed out"));
        assert!(!text.contains("SOURCE SNIPPET"));
        assert!(!text.contains("ENGINE LOG"));
    }
}

//! Engine configuration and toolchain resolution.
//!
//! All external-tool coupling lives here: program names come from the
//! environment (or defaults), and [`Toolchain::resolve`] locates the
//! binaries exactly once at startup. A missing binary is a
//! startup-fatal [`Error::ToolUnavailable`], never a per-request
//! surprise.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use crate::error::{Error, Result};

/// Default wall-clock budget for a single engine invocation.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(240);

/// Default number of render passes (second pass resolves
/// cross-references such as tables of contents and citations).
pub const DEFAULT_RENDER_PASSES: u32 = 2;

/// Configuration for the compilation engines.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Program name or path for the TeX render engine.
    pub xelatex_program: String,

    /// Program name or path for the docx conversion engine.
    pub pandoc_program: String,

    /// Directory under which per-request workspaces are created.
    pub spool_dir: PathBuf,

    /// Hard wall-clock budget per engine invocation.
    pub timeout: Duration,

    /// Number of sequential render passes.
    ///
    /// A fixed pass count, not a fixpoint: documents needing 3+
    /// passes (e.g. bibliographies) may under-resolve at the default
    /// of 2.
    pub render_passes: u32,

    /// Maximum number of concurrently running compilations.
    pub max_concurrent_jobs: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            xelatex_program: "xelatex".to_string(),
            pandoc_program: "pandoc".to_string(),
            spool_dir: std::env::temp_dir().join("texforge"),
            timeout: DEFAULT_TIMEOUT,
            render_passes: DEFAULT_RENDER_PASSES,
            max_concurrent_jobs: 4,
        }
    }
}

impl EngineConfig {
    /// Build a config from the environment, falling back to defaults.
    ///
    /// Recognized variables: `TEXFORGE_XELATEX`, `TEXFORGE_PANDOC`,
    /// `TEXFORGE_SPOOL_DIR`, `TEXFORGE_TIMEOUT_SECS`,
    /// `TEXFORGE_PASSES`, `TEXFORGE_MAX_JOBS`.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(program) = std::env::var("TEXFORGE_XELATEX") {
            config.xelatex_program = program;
        }
        if let Ok(program) = std::env::var("TEXFORGE_PANDOC") {
            config.pandoc_program = program;
        }
        if let Ok(dir) = std::env::var("TEXFORGE_SPOOL_DIR") {
            config.spool_dir = PathBuf::from(dir);
        }
        if let Ok(secs) = std::env::var("TEXFORGE_TIMEOUT_SECS")
            && let Ok(secs) = secs.parse::<u64>()
        {
            config.timeout = Duration::from_secs(secs.max(1));
        }
        if let Ok(passes) = std::env::var("TEXFORGE_PASSES")
            && let Ok(passes) = passes.parse::<u32>()
        {
            config.render_passes = passes.max(1);
        }
        if let Ok(jobs) = std::env::var("TEXFORGE_MAX_JOBS")
            && let Ok(jobs) = jobs.parse::<usize>()
        {
            config.max_concurrent_jobs = jobs.max(1);
        }

        config
    }
}

/// Resolved paths to the external engines.
#[derive(Debug, Clone)]
pub struct Toolchain {
    /// Absolute path to the render engine.
    pub xelatex: PathBuf,

    /// Absolute path to the conversion engine.
    pub pandoc: PathBuf,
}

impl Toolchain {
    /// Resolve both engine binaries, failing fast if either is missing.
    pub fn resolve(config: &EngineConfig) -> Result<Self> {
        let xelatex = Self::find_tool("render engine", &config.xelatex_program)?;
        let pandoc = Self::find_tool("conversion engine", &config.pandoc_program)?;

        tracing::info!(
            xelatex = %xelatex.display(),
            pandoc = %pandoc.display(),
            "resolved toolchain"
        );

        Ok(Self { xelatex, pandoc })
    }

    /// Probe a tool's version banner (first line of `--version`).
    ///
    /// Used by diagnostics and the `check` command; failure to probe
    /// is not fatal once the binary itself has been located.
    pub fn probe_version(program: &Path) -> Option<String> {
        let output = Command::new(program).arg("--version").output().ok()?;
        if !output.status.success() {
            return None;
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        stdout.lines().next().map(|line| line.trim().to_string())
    }

    /// Find a tool in PATH (or verify an explicit path).
    fn find_tool(tool: &'static str, program: &str) -> Result<PathBuf> {
        which::which(program).map_err(|_| Error::ToolUnavailable {
            tool,
            program: program.to_string(),
        })
    }
}

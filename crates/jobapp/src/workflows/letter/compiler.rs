use std::fmt::Debug;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::runtime::Runtime;
use tracing::{debug, info};

use super::renderer::{RenderError, RenderedBody};
use crate::config::{BuilderConfig, WriterConfig};

/// Location of a compiled letter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactRef {
    path: PathBuf,
}

impl ArtifactRef {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "attachment".to_string())
    }
}

/// Produces a document from rendered template definitions.
pub trait ArtifactCompiler: Debug {
    fn compile(&self, body: &RenderedBody) -> Result<ArtifactRef, CompileError>;
}

#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("failed to prepare {}: {source}", .path.display())]
    Prepare {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to run `{program}`: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },
    #[error("`{program}` exited with {status}")]
    Failed { program: String, status: ExitStatus },
    #[error("`{program}` did not finish within {}s", .timeout.as_secs())]
    TimedOut { program: String, timeout: Duration },
    #[error("compiler finished but produced no artifact at {}", .path.display())]
    MissingArtifact { path: PathBuf },
    #[error("failed to move artifact from {} to {}: {source}", .from.display(), .to.display())]
    Relocate {
        from: PathBuf,
        to: PathBuf,
        source: std::io::Error,
    },
    #[error("compiler runtime unavailable: {0}")]
    Runtime(std::io::Error),
}

/// Runs a LaTeX engine over the letter template, bounded by a timeout.
///
/// The rendered definitions are written to the writer path first so the
/// template can `\input` them.
pub struct PdfLatexCompiler {
    builder: BuilderConfig,
    texvars_path: PathBuf,
    runtime: Runtime,
}

impl PdfLatexCompiler {
    pub fn new(builder: BuilderConfig, writer: &WriterConfig) -> Result<Self, CompileError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(CompileError::Runtime)?;

        Ok(Self {
            builder,
            texvars_path: writer.texvars_path.clone(),
            runtime,
        })
    }

    fn command_args(&self) -> Vec<String> {
        vec![
            "-interaction=nonstopmode".to_string(),
            format!("-output-directory={}", self.builder.output_dir.display()),
            format!("-jobname={}", self.builder.output_filename),
            self.builder.texfile.clone(),
        ]
    }

    fn run_engine(&self) -> Result<(), CompileError> {
        let program = self.builder.compiler.clone();
        let timeout = self.builder.timeout();

        let mut command = tokio::process::Command::new(&program);
        command
            .args(self.command_args())
            .current_dir(&self.builder.texfile_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        let status = self.runtime.block_on(async {
            let mut child = command.spawn().map_err(|source| CompileError::Spawn {
                program: program.clone(),
                source,
            })?;

            match tokio::time::timeout(timeout, child.wait()).await {
                Ok(waited) => waited.map_err(|source| CompileError::Spawn {
                    program: program.clone(),
                    source,
                }),
                Err(_) => {
                    let _ = child.kill().await;
                    Err(CompileError::TimedOut {
                        program: program.clone(),
                        timeout,
                    })
                }
            }
        })?;

        if status.success() {
            Ok(())
        } else {
            Err(CompileError::Failed { program, status })
        }
    }

    fn relocate(&self, compiled: PathBuf) -> Result<PathBuf, CompileError> {
        let Some(builds_dir) = self.builder.builds_dir() else {
            return Ok(compiled);
        };

        std::fs::create_dir_all(builds_dir).map_err(|source| CompileError::Prepare {
            path: builds_dir.to_path_buf(),
            source,
        })?;

        let target = self.builder.final_artifact_path();
        let relocate_err = |source| CompileError::Relocate {
            from: compiled.clone(),
            to: target.clone(),
            source,
        };

        // rename fails across filesystems; fall back to copy + remove
        if std::fs::rename(&compiled, &target).is_err() {
            std::fs::copy(&compiled, &target).map_err(relocate_err)?;
            std::fs::remove_file(&compiled).map_err(relocate_err)?;
        }

        debug!(from = %compiled.display(), to = %target.display(), "artifact moved to builds");
        Ok(target)
    }
}

impl Debug for PdfLatexCompiler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PdfLatexCompiler")
            .field("compiler", &self.builder.compiler)
            .field("texfile", &self.builder.texfile)
            .finish_non_exhaustive()
    }
}

impl ArtifactCompiler for PdfLatexCompiler {
    fn compile(&self, body: &RenderedBody) -> Result<ArtifactRef, CompileError> {
        body.persist(&self.texvars_path)?;

        let output_dir = self.builder.resolved_output_dir();
        std::fs::create_dir_all(&output_dir).map_err(|source| CompileError::Prepare {
            path: output_dir.clone(),
            source,
        })?;

        let compiled = self.builder.compiled_artifact_path();
        // a stale artifact from an earlier run must not pass for this one
        if compiled.exists() {
            std::fs::remove_file(&compiled).map_err(|source| CompileError::Prepare {
                path: compiled.clone(),
                source,
            })?;
        }

        info!(
            texfile = %self.builder.texfile,
            jobname = %self.builder.output_filename,
            "compiling letter"
        );
        self.run_engine()?;

        if !compiled.exists() {
            return Err(CompileError::MissingArtifact { path: compiled });
        }

        let location = self.relocate(compiled)?;
        Ok(ArtifactRef::new(location))
    }
}

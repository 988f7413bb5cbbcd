//! Letter content: template variables, rendering, and artifact compilation.

pub mod compiler;
pub mod details;
pub mod renderer;
pub mod variables;

pub use compiler::{ArtifactCompiler, ArtifactRef, CompileError, PdfLatexCompiler};
pub use details::ApplicationDetails;
pub use renderer::{EscapePolicy, RenderError, RenderedBody, TemplateRenderer};
pub use variables::TemplateVariables;

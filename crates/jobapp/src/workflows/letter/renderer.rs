use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::variables::TemplateVariables;
use crate::config::TemplateConfig;

/// Characters with special meaning inside a LaTeX macro body.
const LATEX_SPECIALS: &[char] = &['\\', '{', '}', '$', '&', '#', '^', '_', '%', '~'];

/// How values containing template syntax are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscapePolicy {
    /// Rewrite special characters into their LaTeX-safe spelling.
    #[default]
    Latex,
    /// Refuse any value containing a special character.
    Reject,
    /// Pass values through untouched; callers own the consequences.
    Verbatim,
}

impl EscapePolicy {
    pub fn apply(&self, name: &str, value: &str) -> Result<String, RenderError> {
        match self {
            EscapePolicy::Latex => Ok(escape_latex(value)),
            EscapePolicy::Reject => match value.chars().find(|ch| LATEX_SPECIALS.contains(ch)) {
                Some(character) => Err(RenderError::UnsafeValue {
                    name: name.to_string(),
                    character,
                }),
                None => Ok(value.to_string()),
            },
            EscapePolicy::Verbatim => Ok(value.to_string()),
        }
    }
}

fn escape_latex(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\\' => escaped.push_str(r"\textbackslash{}"),
            '~' => escaped.push_str(r"\textasciitilde{}"),
            '^' => escaped.push_str(r"\textasciicircum{}"),
            '{' | '}' | '$' | '&' | '#' | '_' | '%' => {
                escaped.push('\\');
                escaped.push(ch);
            }
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// TeX control words are letters only.
fn is_macro_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|ch| ch.is_ascii_alphabetic())
}

/// Macro definitions ready to be included by the letter template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedBody(String);

impl RenderedBody {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Write the rendered definitions where the template expects them.
    pub fn persist(&self, path: impl AsRef<Path>) -> Result<(), RenderError> {
        let path = path.as_ref();
        std::fs::write(path, &self.0).map_err(|source| RenderError::Persist {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Turns template variables into `\newcommand` definitions.
#[derive(Debug, Clone)]
pub struct TemplateRenderer {
    required: Vec<String>,
    policy: EscapePolicy,
}

impl TemplateRenderer {
    pub fn new(required: Vec<String>, policy: EscapePolicy) -> Self {
        Self { required, policy }
    }

    pub fn from_config(config: &TemplateConfig) -> Self {
        Self::new(config.required.clone(), config.escape)
    }

    pub fn required(&self) -> &[String] {
        &self.required
    }

    pub fn render(&self, variables: &TemplateVariables) -> Result<RenderedBody, RenderError> {
        for name in &self.required {
            variables.require(name)?;
        }

        let mut body = String::new();
        for (name, value) in variables.iter() {
            if !is_macro_name(name) {
                return Err(RenderError::InvalidName {
                    name: name.to_string(),
                });
            }
            let value = self.policy.apply(name, value)?;
            body.push_str(&format!("\\newcommand{{\\{name}}}{{{value}}}\n"));
        }

        Ok(RenderedBody(body))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("template variable `{name}` is required but missing")]
    MissingVariable { name: String },
    #[error("template variable `{name}` is blank")]
    EmptyValue { name: String },
    #[error("template variable `{name}` contains `{character}` which the template cannot accept")]
    UnsafeValue { name: String, character: char },
    #[error("`{name}` is not a valid template variable name (letters only)")]
    InvalidName { name: String },
    #[error("failed to write rendered template to {}: {source}", .path.display())]
    Persist {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to read template variables from {}: {source}", .path.display())]
    VariablesFile {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("template variables in {} must be a flat object of strings: {source}", .path.display())]
    VariablesFormat {
        path: PathBuf,
        source: serde_json::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn letter_variables() -> TemplateVariables {
        [
            ("vacancyTitle", "Budget Analyst"),
            ("stateAgency", "Dept of X"),
            ("vacancyID", "55555"),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn render_emits_sorted_directives() {
        let renderer = TemplateRenderer::new(Vec::new(), EscapePolicy::Latex);
        let body = renderer.render(&letter_variables()).expect("renders");

        assert_eq!(
            body.as_str(),
            "\\newcommand{\\stateAgency}{Dept of X}\n\
             \\newcommand{\\vacancyID}{55555}\n\
             \\newcommand{\\vacancyTitle}{Budget Analyst}\n"
        );
    }

    #[test]
    fn render_fails_on_missing_required_variable() {
        let renderer = TemplateRenderer::new(
            vec!["vacancyID".to_string(), "hiringManager".to_string()],
            EscapePolicy::Latex,
        );

        match renderer.render(&letter_variables()) {
            Err(RenderError::MissingVariable { name }) => assert_eq!(name, "hiringManager"),
            other => panic!("expected missing variable, got {other:?}"),
        }
    }

    #[test]
    fn latex_policy_escapes_special_characters() {
        let policy = EscapePolicy::Latex;
        assert_eq!(
            policy.apply("stateAgency", "Parks & Rec 100%").expect("escaped"),
            r"Parks \& Rec 100\%"
        );
        assert_eq!(
            policy.apply("note", r"a\b~c^d").expect("escaped"),
            r"a\textbackslash{}b\textasciitilde{}c\textasciicircum{}d"
        );
        assert_eq!(
            policy.apply("note", "{x}_#$").expect("escaped"),
            r"\{x\}\_\#\$"
        );
    }

    #[test]
    fn reject_policy_names_the_offending_character() {
        match EscapePolicy::Reject.apply("stateAgency", "Parks & Rec") {
            Err(RenderError::UnsafeValue { name, character }) => {
                assert_eq!(name, "stateAgency");
                assert_eq!(character, '&');
            }
            other => panic!("expected unsafe value, got {other:?}"),
        }
        assert_eq!(
            EscapePolicy::Reject
                .apply("stateAgency", "Dept of X")
                .expect("plain value accepted"),
            "Dept of X"
        );
    }

    #[test]
    fn verbatim_policy_passes_values_through() {
        assert_eq!(
            EscapePolicy::Verbatim
                .apply("signature", r"\textbf{Me}")
                .expect("verbatim"),
            r"\textbf{Me}"
        );
    }

    #[test]
    fn render_rejects_names_that_are_not_control_words() {
        let renderer = TemplateRenderer::new(Vec::new(), EscapePolicy::Latex);
        let vars: TemplateVariables = [("vacancy_id", "1")].into_iter().collect();
        assert!(matches!(
            renderer.render(&vars),
            Err(RenderError::InvalidName { .. })
        ));
    }

    #[test]
    fn persist_writes_body_and_surfaces_io_errors() {
        let dir = tempfile::tempdir().expect("tempdir");
        let renderer = TemplateRenderer::new(Vec::new(), EscapePolicy::Latex);
        let body = renderer.render(&letter_variables()).expect("renders");

        let target = dir.path().join("texvars.tex");
        body.persist(&target).expect("persisted");
        assert_eq!(
            std::fs::read_to_string(&target).expect("readable"),
            body.as_str()
        );

        let missing_dir = dir.path().join("missing").join("texvars.tex");
        assert!(matches!(
            body.persist(&missing_dir),
            Err(RenderError::Persist { .. })
        ));
    }
}

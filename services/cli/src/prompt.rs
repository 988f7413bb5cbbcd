use std::io::{self, BufRead, Write};

use jobapp::workflows::letter::TemplateVariables;

/// Read one trimmed answer; `None` once input is exhausted.
pub(crate) fn ask(
    label: &str,
    input: &mut dyn BufRead,
    out: &mut dyn Write,
) -> io::Result<Option<String>> {
    write!(out, "{label}: ")?;
    out.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

pub(crate) fn confirm(
    question: &str,
    input: &mut dyn BufRead,
    out: &mut dyn Write,
) -> io::Result<bool> {
    let answer = ask(&format!("{question} (y/N)"), input, out)?;
    Ok(matches!(
        answer.as_deref().map(str::to_ascii_lowercase).as_deref(),
        Some("y" | "yes")
    ))
}

/// Ask for every known variable plus any required one that is missing,
/// keeping the current value when the answer is blank.
pub(crate) fn fill_in(
    variables: &mut TemplateVariables,
    required: &[String],
    input: &mut dyn BufRead,
    out: &mut dyn Write,
) -> io::Result<()> {
    let mut names: Vec<String> = variables.names().map(str::to_string).collect();
    for name in required {
        if !names.contains(name) {
            names.push(name.clone());
        }
    }

    for name in names {
        let current = variables.get(&name).unwrap_or_default().to_string();
        let Some(answer) = ask(&format!("{name} [{current}]"), input, out)? else {
            break;
        };
        if !answer.is_empty() {
            variables.insert(name, answer);
        }
    }
    Ok(())
}

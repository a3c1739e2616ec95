use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use itertools::Itertools;
use regex_lite::Regex;
use tracing::{debug, trace};

use crate::error::CompileError;

/// Sources with this suffix (any case) are paths to a script file.
pub const SCRIPT_EXTENSION: &str = ".py";

/// Leading indentation of the first line that is neither blank nor a comment.
static CODE_INDENTATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^([ \t\x0C]*)[^#\s]").unwrap());

pub fn is_script_path(source: &str) -> bool {
    source
        .len()
        .checked_sub(SCRIPT_EXTENSION.len())
        .and_then(|start| source.get(start..))
        .is_some_and(|suffix| suffix.eq_ignore_ascii_case(SCRIPT_EXTENSION))
}

/// Resolves the script text for `source`.
///
/// A path ending in `.py` is read and returned verbatim. Anything else is
/// treated as inline code and dedented by the indentation of its first code
/// line.
pub fn normalize(source: &str) -> Result<String, CompileError> {
    if is_script_path(source) {
        debug!(path = %source, "Reading script file");
        return fs::read_to_string(source).map_err(|e| CompileError::SourceRead {
            path: Path::new(source).to_path_buf(),
            source: e,
        });
    }

    Ok(dedent(source))
}

/// Removes the indentation of the first code line from the start of every
/// line that begins with exactly that indentation. Other lines are kept as is.
pub fn dedent(code: &str) -> String {
    let prefix = match code_indentation(code) {
        Some(prefix) if !prefix.is_empty() => prefix,
        _ => return code.to_string(),
    };

    trace!(prefix = ?prefix, "Stripping inline script indentation");
    code.split('\n')
        .map(|line| line.strip_prefix(prefix).unwrap_or(line))
        .join("\n")
}

fn code_indentation(code: &str) -> Option<&str> {
    CODE_INDENTATION
        .captures(code)
        .and_then(|captures| captures.get(1))
        .map(|prefix| prefix.as_str())
}

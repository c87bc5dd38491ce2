//! File-path resolution.
//!
//! Path-typed operands (`cd`, `mkdir`, writer files, build-style call
//! targets) go through a [`PathResolver`]. The default one substitutes
//! `${name}` from the scope, anchors relative paths at the scope's current
//! directory and expands `*`/`?` in the last component.

use std::fmt;
use std::path::{Path, PathBuf};

use regex::Regex;

use crate::errors::{file_error, EvalResult};
use crate::scope::{normalize, Scope};

pub trait PathResolver: Send + Sync + fmt::Debug {
    /// Resolve `pattern` to zero or more paths.
    fn resolve(&self, pattern: &str, scope: &Scope) -> EvalResult<Vec<PathBuf>>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultPathResolver;

impl PathResolver for DefaultPathResolver {
    fn resolve(&self, pattern: &str, scope: &Scope) -> EvalResult<Vec<PathBuf>> {
        let text = substitute(pattern, scope)?;
        let path = scope.resolve_path(Path::new(&text));
        let Some(last) = path.file_name().and_then(|n| n.to_str()) else {
            return Ok(vec![path]);
        };
        if !has_wildcard(last) {
            return Ok(vec![path]);
        }
        let dir = path.parent().map_or_else(|| PathBuf::from("/"), Path::to_path_buf);
        let matcher = wildcard_regex(last)?;
        expand(&dir, &matcher)
    }
}

#[inline]
fn has_wildcard(component: &str) -> bool {
    component.contains(['*', '?'])
}

/// Replace `${name}` with the text of the scope variable `name`.
/// An unterminated `${` is kept literally.
pub fn substitute(pattern: &str, scope: &Scope) -> EvalResult<String> {
    let mut out = String::with_capacity(pattern.len());
    let mut rest = pattern;
    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start..][2..];
        let Some(end) = after.find('}') else {
            out.push_str(&rest[start..]);
            return Ok(out);
        };
        let var = scope.lookup(&after[..end])?;
        out.push_str(&var.get().to_text());
        rest = &after[end..][1..];
    }
    out.push_str(rest);
    Ok(out)
}

/// Compile a `*`/`?` wildcard into an anchored regex.
pub fn wildcard_regex(component: &str) -> EvalResult<Regex> {
    let mut source = String::from("^");
    for ch in component.chars() {
        match ch {
            '*' => source.push_str(".*"),
            '?' => source.push('.'),
            other => source.push_str(&regex::escape(other.encode_utf8(&mut [0; 4]))),
        }
    }
    source.push('$');
    Regex::new(&source).map_err(|e| file_error(component, e))
}

fn expand(dir: &Path, matcher: &Regex) -> EvalResult<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir).map_err(|e| file_error(dir.display(), e))?;
    let mut matches = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| file_error(dir.display(), e))?;
        let name = entry.file_name();
        if name.to_str().is_some_and(|n| matcher.is_match(n)) {
            matches.push(normalize(&entry.path()));
        }
    }
    matches.sort();
    Ok(matches)
}

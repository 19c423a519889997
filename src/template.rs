//! Template expansion
//!
//! Templates interpolate `{column}` cell references and `{$name}` binding
//! variables into static text, e.g. `{$baseIRI}person/{id}`. A placeholder
//! whose value is blank makes the whole template produce no value.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{EvaluationError, EvaluationResult};

static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([^{}]*)\}").expect("valid regex"));

/// A single placeholder found in a template
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder<'a> {
    Column(&'a str),
    Variable(&'a str),
}

/// Check a template for unbalanced braces and empty placeholders
pub fn validate_template(template: &str) -> EvaluationResult<Vec<Placeholder<'_>>> {
    let invalid = |message: &str| EvaluationError::InvalidTemplate {
        template: template.to_string(),
        message: message.to_string(),
    };

    let mut placeholders = Vec::new();
    let mut last_end = 0;
    for cap in PLACEHOLDER_RE.captures_iter(template) {
        let (Some(whole), Some(name)) = (cap.get(0), cap.get(1)) else {
            continue;
        };
        if template[last_end..whole.start()].contains(&['{', '}'][..]) {
            return Err(invalid("unbalanced brace"));
        }
        last_end = whole.end();

        let name = name.as_str().trim();
        let placeholder = match name.strip_prefix('$') {
            Some(var) => Placeholder::Variable(var.trim()),
            None => Placeholder::Column(name),
        };
        if matches!(placeholder, Placeholder::Column("") | Placeholder::Variable("")) {
            return Err(invalid("empty placeholder"));
        }
        placeholders.push(placeholder);
    }
    if template[last_end..].contains(&['{', '}'][..]) {
        return Err(invalid("unbalanced brace"));
    }

    Ok(placeholders)
}

/// Expand a template, asking `lookup` for each placeholder value.
///
/// Column values are IRI-escaped when `escape_columns` is set. Variables are
/// inserted verbatim since they usually carry IRI prefixes such as the base
/// IRI. Returns `Ok(None)` as soon as one placeholder has no value.
pub fn expand_template<F>(
    template: &str,
    escape_columns: bool,
    mut lookup: F,
) -> EvaluationResult<Option<String>>
where
    F: FnMut(Placeholder<'_>) -> EvaluationResult<Option<String>>,
{
    let placeholders = validate_template(template)?;
    let mut values = Vec::with_capacity(placeholders.len());
    for placeholder in placeholders {
        let Some(value) = lookup(placeholder)? else {
            return Ok(None);
        };
        let value = match placeholder {
            Placeholder::Column(_) if escape_columns => iri_escape(&value),
            _ => value,
        };
        values.push(value);
    }

    let mut values = values.into_iter();
    let expanded = PLACEHOLDER_RE.replace_all(template, |_: &regex::Captures<'_>| {
        values.next().unwrap_or_default()
    });
    Ok(Some(expanded.into_owned()))
}

/// IRI-escape a cell value for use inside a template
fn iri_escape(value: &str) -> String {
    let mut result = String::with_capacity(value.len());

    for c in value.chars() {
        match c {
            'A'..='Z' | 'a'..='z' | '0'..='9' | '-' | '.' | '_' | '~' => result.push(c),
            '!' | '$' | '&' | '\'' | '(' | ')' | '*' | '+' | ',' | ';' | '=' | ':' | '@' => {
                result.push(c)
            }
            ' ' => result.push_str("%20"),
            _ => {
                let mut buf = [0u8; 4];
                for byte in c.encode_utf8(&mut buf).as_bytes() {
                    result.push_str(&format!("%{:02X}", byte));
                }
            }
        }
    }

    result
}

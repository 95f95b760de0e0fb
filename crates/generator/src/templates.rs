//! Docstring template loading and rendering

use protoc_docs_common::{DocumentedStructure, PluginError, Result};
use serde::Serialize;
use std::collections::HashMap;
use tera::{Context, Tera, Value};

/// Header introducing the member list
pub const ATTRIBUTES_HEADER: &str = "Attributes:";

const DOCSTRING_TEMPLATE: &str = "\
{% if summary %}{{ summary }}{% if members %}\n\n{% endif %}{% endif %}\
{% if members %}{{ header }}\n\
{% for member in members %}    {{ member.name }}:\n{{ member.doc | indent_by(width=8) }}\n{% endfor %}\
{% endif %}";

#[derive(Debug, Serialize)]
struct MemberDoc<'a> {
    name: &'a str,
    doc: String,
}

/// Load all templates
pub fn load_templates() -> Result<Tera> {
    let mut tera = Tera::default();

    tera.register_filter("indent_by", indent_filter);

    tera.add_raw_template("docstring", DOCSTRING_TEMPLATE)
        .map_err(|e| PluginError::Render(format!("Failed to load docstring template: {}", e)))?;

    Ok(tera)
}

/// Render the docstring body of a structure
///
/// Returns an empty string when the structure has no documentation at all.
pub fn render_docstring(tera: &Tera, structure: &DocumentedStructure) -> Result<String> {
    let members: Vec<MemberDoc<'_>> = structure
        .members()
        .map(|(name, doc)| MemberDoc {
            name,
            doc: dedent(doc),
        })
        .collect();

    let mut context = Context::new();
    context.insert("summary", &dedent(structure.summary()));
    context.insert("members", &members);
    context.insert("header", ATTRIBUTES_HEADER);

    let rendered = tera
        .render("docstring", &context)
        .map_err(|e| PluginError::Render(format!("Template error: {:?}", e)))?;

    Ok(rendered.trim_end().to_string())
}

/// Wrap a docstring body in a Python triple-quoted string literal
///
/// Backslashes and double quotes are escaped, so rst escapes such as `\*`
/// survive unchanged and a body ending in `"` cannot close the literal early.
pub fn python_docstring(body: &str) -> String {
    let escaped = body.replace('\\', "\\\\").replace('"', "\\\"");
    if escaped.contains('\n') {
        format!("\"\"\"{}\n\"\"\"", escaped)
    } else {
        format!("\"\"\"{}\"\"\"", escaped)
    }
}

/// `__doc__` entry for the class dict at a `class_scope` insertion point
///
/// protoc places the insertion point right after the `'__module__'` entry,
/// which has no trailing comma, so the entry starts with one.
pub fn class_doc_entry(body: &str) -> String {
    format!(",'__doc__': {}\n", python_docstring(body))
}

/// Strip blank edges and the indentation common to all non-blank lines
pub fn dedent(text: &str) -> String {
    let lines: Vec<&str> = text.lines().map(str::trim_end).collect();

    let Some(first) = lines.iter().position(|l| !l.is_empty()) else {
        return String::new();
    };
    let last = lines.iter().rposition(|l| !l.is_empty()).unwrap_or(first);
    let lines = &lines[first..=last];

    let margin = lines
        .iter()
        .filter(|l| !l.is_empty())
        .map(|l| l.len() - l.trim_start_matches([' ', '\t']).len())
        .min()
        .unwrap_or(0);

    lines
        .iter()
        .map(|l| l.get(margin..).unwrap_or(""))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Filter indenting every non-blank line by `width` spaces (default 4)
fn indent_filter(value: &Value, args: &HashMap<String, Value>) -> tera::Result<Value> {
    let text = value
        .as_str()
        .ok_or_else(|| tera::Error::msg("indent_by filter expects a string"))?;

    let width = args.get("width").and_then(Value::as_u64).unwrap_or(4) as usize;
    let pad = " ".repeat(width);

    let indented = text
        .lines()
        .map(|line| {
            if line.is_empty() {
                String::new()
            } else {
                format!("{}{}", pad, line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n");

    Ok(Value::String(indented))
}

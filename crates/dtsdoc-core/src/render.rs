//! Markdown rendering of document records.
//!
//! Rendering is a pure function of the record. The cache store persists the
//! output of [`render_views`] so later lookups can serve text without
//! re-rendering.

use std::fmt::Write as _;
use std::str::FromStr;

use crate::types::{DocumentRecord, MethodRecord, RenderedViews};

/// View key for the whole-class rendering.
pub const FULL_VIEW: &str = "full";

/// Methods listed by the compact overview.
const COMPACT_METHOD_LIMIT: usize = 10;

/// Description length in the compact overview, in characters.
const COMPACT_DESCRIPTION_CHARS: usize = 80;

/// View key for a single method's rendering.
#[must_use]
pub fn method_view_key(name: &str) -> String {
    format!("method:{name}")
}

/// Turns a record into human-readable text.
pub trait Renderer {
    /// Render `record`, or only the method named `focus` when given.
    fn render(&self, record: &DocumentRecord, focus: Option<&str>) -> String;
}

/// Amount of detail in rendered output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Style {
    /// Everything, examples included.
    #[default]
    Detailed,
    /// No examples; the overview lists a truncated method index.
    Compact,
    /// Example code blocks only.
    CodeOnly,
}

impl FromStr for Style {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "detailed" => Ok(Self::Detailed),
            "compact" => Ok(Self::Compact),
            "code-only" | "code" => Ok(Self::CodeOnly),
            other => Err(format!(
                "unknown format '{other}', expected detailed, compact or code-only"
            )),
        }
    }
}

/// GitHub-flavored markdown renderer.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownRenderer {
    style: Style,
}

impl MarkdownRenderer {
    /// Create a renderer with the given style.
    #[must_use]
    pub const fn new(style: Style) -> Self {
        Self { style }
    }

    /// The style this renderer uses.
    #[must_use]
    pub const fn style(&self) -> Style {
        self.style
    }
}

impl Renderer for MarkdownRenderer {
    fn render(&self, record: &DocumentRecord, focus: Option<&str>) -> String {
        match (self.style, focus) {
            (Style::CodeOnly, Some(name)) => match record.find_method(name) {
                Some(method) => render_examples(&method.examples),
                None => missing_method(record, name),
            },
            (Style::CodeOnly, None) => render_all_examples(record),
            (style, Some(name)) => match record.find_method(name) {
                Some(method) => render_method(
                    &record.identifier,
                    method,
                    style == Style::Detailed,
                ),
                None => missing_method(record, name),
            },
            (Style::Compact, None) => render_compact_overview(record),
            (Style::Detailed, None) => render_full(record),
        }
    }
}

/// Pre-render the `full` view and one view per method.
///
/// When a page documents two methods with the same name (overloads), the
/// first one wins, matching method focus.
pub fn render_views(renderer: &impl Renderer, record: &DocumentRecord) -> RenderedViews {
    let mut views = RenderedViews::new();
    views.insert(FULL_VIEW.to_string(), renderer.render(record, None));
    for method in &record.methods {
        views
            .entry(method_view_key(&method.name))
            .or_insert_with(|| renderer.render(record, Some(&method.name)));
    }
    views
}

fn render_full(record: &DocumentRecord) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# {}\n", record.identifier);
    if !record.description.is_empty() {
        let _ = writeln!(out, "{}\n", record.description);
    }

    if record.methods.is_empty() {
        out.push_str("_No documented methods._\n");
        return out;
    }

    out.push_str("## Methods\n\n");
    for method in &record.methods {
        let _ = writeln!(out, "- `{}`", method.signature);
    }
    out.push('\n');

    for method in &record.methods {
        let _ = writeln!(out, "### {}\n", method.signature);
        write_method_body(&mut out, method, true);
    }

    out
}

fn render_compact_overview(record: &DocumentRecord) -> String {
    let mut lines = vec![format!("# {}", record.identifier), String::new()];
    if !record.description.is_empty() {
        lines.push(record.description.clone());
        lines.push(String::new());
    }
    lines.push(format!("**Methods**: {}", record.methods.len()));
    lines.push(String::new());

    for method in record.methods.iter().take(COMPACT_METHOD_LIMIT) {
        if method.description.is_empty() {
            lines.push(format!("- **{}**", method.signature));
        } else {
            lines.push(format!(
                "- **{}**: {}",
                method.signature,
                truncate(&method.description, COMPACT_DESCRIPTION_CHARS)
            ));
        }
    }

    let remaining = record.methods.len().saturating_sub(COMPACT_METHOD_LIMIT);
    if remaining > 0 {
        lines.push(String::new());
        lines.push(format!("... and {remaining} more methods"));
    }

    lines.join("\n") + "\n"
}

fn render_method(identifier: &str, method: &MethodRecord, with_examples: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# {identifier}.{}\n", method.name);
    write_method_body(&mut out, method, with_examples);
    out
}

fn write_method_body(out: &mut String, method: &MethodRecord, with_examples: bool) {
    let _ = writeln!(out, "**Signature**: `{}`\n", method.signature);
    if !method.description.is_empty() {
        let _ = writeln!(out, "{}\n", method.description);
    }

    if !method.parameters.is_empty() {
        out.push_str("**Parameters**:\n\n");
        for param in &method.parameters {
            if param.description.is_empty() {
                let _ = writeln!(out, "- `{}` ({})", param.name, param.param_type);
            } else {
                let _ = writeln!(
                    out,
                    "- `{}` ({}): {}",
                    param.name, param.param_type, param.description
                );
            }
        }
        out.push('\n');
    }

    if let Some(returns) = method.returns.as_deref().filter(|r| !r.is_empty()) {
        let _ = writeln!(out, "**Returns**: {returns}\n");
    }

    if with_examples && !method.examples.is_empty() {
        out.push_str("**Examples**:\n\n");
        for example in &method.examples {
            write_fence(out, example);
            out.push('\n');
        }
    }
}

fn render_examples(examples: &[String]) -> String {
    if examples.is_empty() {
        return "_No code examples._\n".to_string();
    }
    let mut out = String::new();
    for (i, example) in examples.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        write_fence(&mut out, example);
    }
    out
}

fn render_all_examples(record: &DocumentRecord) -> String {
    let mut out = String::new();
    for method in record.methods.iter().filter(|m| !m.examples.is_empty()) {
        let _ = writeln!(out, "## {}.{}\n", record.identifier, method.name);
        out.push_str(&render_examples(&method.examples));
        out.push('\n');
    }
    if out.is_empty() {
        out.push_str("_No code examples._\n");
    }
    out
}

fn write_fence(out: &mut String, code: &str) {
    let code = code.trim_end_matches('\n');
    let _ = writeln!(out, "```javascript\n{code}\n```");
}

fn missing_method(record: &DocumentRecord, name: &str) -> String {
    format!(
        "_Method `{name}` is not documented in {}._\n",
        record.identifier
    )
}

/// Truncate to `max` characters, marking the cut with `...`.
fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::Parameter;

    fn marker() -> DocumentRecord {
        let mut add = MethodRecord::new("add", "(x, y)");
        add.description = "Adds a marker.".into();
        add.parameters = vec![
            Parameter {
                name: "x".into(),
                param_type: "Number".into(),
                description: "Horizontal.".into(),
            },
            Parameter {
                name: "y".into(),
                param_type: "unknown".into(),
                description: String::new(),
            },
        ];
        add.returns = Some("The id.".into());
        add.examples = vec!["marker.add(1, 2);\n".into()];

        let clear = MethodRecord::new("clear", "()");

        DocumentRecord {
            identifier: "Marker".into(),
            description: "Point markers.".into(),
            methods: vec![add, clear],
            source_locator: String::new(),
        }
    }

    #[test]
    fn test_full_render_contains_every_method() {
        let text = MarkdownRenderer::default().render(&marker(), None);
        assert!(text.starts_with("# Marker\n"));
        assert!(text.contains("Point markers."));
        assert!(text.contains("### add(x, y)"));
        assert!(text.contains("### clear()"));
        assert!(text.contains("- `x` (Number): Horizontal."));
        assert!(text.contains("- `y` (unknown)\n"));
        assert!(text.contains("```javascript\nmarker.add(1, 2);\n```"));
    }

    #[test]
    fn test_focused_render() {
        let text = MarkdownRenderer::default().render(&marker(), Some("add"));
        assert!(text.starts_with("# Marker.add\n"));
        assert!(text.contains("**Returns**: The id."));
        assert!(!text.contains("clear"));
    }

    #[test]
    fn test_compact_omits_examples() {
        let text = MarkdownRenderer::new(Style::Compact).render(&marker(), Some("add"));
        assert!(text.contains("**Signature**: `add(x, y)`"));
        assert!(!text.contains("```"));
    }

    #[test]
    fn test_compact_overview_limits_and_truncates() {
        let mut record = DocumentRecord::new("Big");
        for i in 0..12 {
            let mut m = MethodRecord::new(format!("m{i}"), "()");
            m.description = "x".repeat(100);
            record.methods.push(m);
        }
        let text = MarkdownRenderer::new(Style::Compact).render(&record, None);
        assert!(text.contains("**Methods**: 12"));
        assert!(text.contains("- **m9()**"));
        assert!(!text.contains("- **m10()**"));
        assert!(text.contains(&format!("{}...", "x".repeat(80))));
        assert!(!text.contains(&"x".repeat(81)));
        assert!(text.contains("... and 2 more methods"));
    }

    #[test]
    fn test_code_only() {
        let renderer = MarkdownRenderer::new(Style::CodeOnly);
        assert_eq!(
            renderer.render(&marker(), Some("add")),
            "```javascript\nmarker.add(1, 2);\n```\n"
        );
        assert_eq!(renderer.render(&marker(), Some("clear")), "_No code examples._\n");
        assert!(renderer.render(&marker(), None).contains("## Marker.add"));
    }

    #[test]
    fn test_render_tolerates_empty_record() {
        let record = DocumentRecord::new("Empty");
        for style in [Style::Detailed, Style::Compact, Style::CodeOnly] {
            let text = MarkdownRenderer::new(style).render(&record, None);
            assert!(!text.is_empty());
        }
        let text = MarkdownRenderer::default().render(&record, Some("nope"));
        assert!(text.contains("nope"));
    }

    #[test]
    fn test_render_views_keys() {
        let views = render_views(&MarkdownRenderer::default(), &marker());
        let keys: Vec<_> = views.keys().cloned().collect();
        assert_eq!(keys, vec!["full", "method:add", "method:clear"]);
        assert_eq!(
            views["method:add"],
            MarkdownRenderer::default().render(&marker(), Some("add"))
        );
    }

    #[test]
    fn test_render_views_is_deterministic() {
        let renderer = MarkdownRenderer::default();
        assert_eq!(render_views(&renderer, &marker()), render_views(&renderer, &marker()));
    }

    #[test]
    fn test_style_from_str() {
        assert_eq!("compact".parse::<Style>().unwrap(), Style::Compact);
        assert_eq!("code-only".parse::<Style>().unwrap(), Style::CodeOnly);
        assert!("fancy".parse::<Style>().is_err());
    }

    #[test]
    fn test_truncate_is_char_safe() {
        assert_eq!(truncate("héllo", 2), "hé...");
        assert_eq!(truncate("short", 80), "short");
    }
}

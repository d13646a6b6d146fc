//! Structural extraction of class documentation from generator markup.
//!
//! The pages follow JSDoc's default layout:
//!
//! ```text
//! h1.page-title            "Class: Marker"
//! div.class-description    class summary
//! h4.name#add              one anchor per member, signature in span.signature
//! dd                       member details, somewhere after its anchor
//!   div.description
//!   table.params > tbody > tr > td.name / td.type / td.last
//!   h5 "Returns:"  + next sibling element
//!   h5 "Example:"  + pre > code
//! ```
//!
//! Only the page title is mandatory. Every other piece degrades to an empty
//! value when missing.
//!
//! A member's detail block is not nested inside its anchor, so it is found by
//! scanning forward from the anchor to the first `dd`, stopping at the next
//! anchor. A member without details therefore never borrows its neighbour's.

use std::collections::HashSet;

use thiserror::Error;
use tracing::debug;

use crate::markup::{Element, Markup, collapse_whitespace};
use crate::types::{DocumentRecord, MethodRecord, Parameter, UNKNOWN_TYPE};

/// Kind labels that prefix the page title.
const TITLE_LABELS: &[&str] = &["Class:", "Namespace:", "Module:", "Interface:", "Mixin:"];

/// Why a page could not be turned into a [`DocumentRecord`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    /// No `h1.page-title` element.
    #[error("page has no class title element (h1.page-title)")]
    MissingClassTitle,
    /// The title holds nothing but a kind label.
    #[error("class title is empty")]
    EmptyClassTitle,
}

/// Extract a [`DocumentRecord`] from raw markup.
///
/// `source_locator` is left empty for the caller to fill in.
///
/// # Errors
///
/// Fails only when the class title is missing or empty.
///
/// ```rust
/// use dtsdoc_core::extract::extract;
///
/// let html = r#"
///   <h1 class="page-title">Class: Marker</h1>
///   <h4 class="name" id="Marker"><span class="signature">()</span></h4>
///   <dd><div class="description">Creates a marker.</div></dd>
///   <h4 class="name" id="clear"><span class="signature">()</span></h4>
/// "#;
/// let record = extract(html)?;
/// assert_eq!(record.identifier, "Marker");
/// assert_eq!(record.methods.len(), 1);
/// assert_eq!(record.methods[0].signature, "clear()");
/// # Ok::<(), dtsdoc_core::extract::ExtractError>(())
/// ```
pub fn extract(markup: &str) -> Result<DocumentRecord, ExtractError> {
    extract_from(&Markup::parse(markup))
}

/// Extract from already parsed markup.
///
/// # Errors
///
/// See [`extract`].
pub fn extract_from(doc: &Markup) -> Result<DocumentRecord, ExtractError> {
    let title = doc
        .find(|e| e.is("h1") && e.has_class("page-title"))
        .ok_or(ExtractError::MissingClassTitle)?;
    let identifier = strip_title_label(&title.normalized_text());
    if identifier.is_empty() {
        return Err(ExtractError::EmptyClassTitle);
    }

    let description = doc
        .find(|e| e.is("div") && e.has_class("class-description"))
        .map(|e| e.normalized_text())
        .unwrap_or_default();

    let anchors = doc.find_all(|e| e.is("h4") && e.has_class("name"));
    let mut methods = Vec::with_capacity(anchors.len());

    for (position, anchor) in anchors.iter().enumerate() {
        let Some(name) = anchor.attr("id").map(str::trim).filter(|id| !id.is_empty()) else {
            debug!("skipping member anchor without id at node {}", anchor.index());
            continue;
        };
        if name == identifier {
            continue;
        }

        let bound = anchors.get(position + 1).map_or(doc.len(), Element::index);
        methods.push(extract_method(doc, *anchor, name, bound));
    }

    debug!("extracted {} methods for {}", methods.len(), identifier);

    Ok(DocumentRecord {
        identifier,
        description,
        methods,
        source_locator: String::new(),
    })
}

fn strip_title_label(title: &str) -> String {
    TITLE_LABELS
        .iter()
        .find_map(|label| title.strip_prefix(label))
        .unwrap_or(title)
        .trim()
        .to_string()
}

fn extract_method(doc: &Markup, anchor: Element<'_>, name: &str, bound: usize) -> MethodRecord {
    let fragment = anchor
        .find(|e| e.is("span") && e.has_class("signature"))
        .map(|e| collapse_whitespace(&e.text()))
        .unwrap_or_default();
    let mut method = MethodRecord::new(name, &fragment);

    let Some(detail) = doc.find_following(anchor.index(), bound, |e| e.is("dd")) else {
        return method;
    };

    method.description = detail
        .find(|e| e.is("div") && e.has_class("description"))
        .map(|e| e.normalized_text())
        .unwrap_or_default();

    method.parameters = detail
        .find(|e| e.is("table") && e.has_class("params"))
        .map(parameters_from_table)
        .unwrap_or_default();

    method.returns = find_heading(detail, &["Returns"])
        .and_then(|heading| heading.next_sibling())
        .map(|e| e.normalized_text());

    method.examples = find_heading(detail, &["Example", "Examples"])
        .map(|heading| examples_after(doc, detail, heading))
        .unwrap_or_default();

    method
}

fn find_heading<'a>(detail: Element<'a>, labels: &[&str]) -> Option<Element<'a>> {
    detail.find(|e| {
        if !e.is("h5") {
            return false;
        }
        let text = e.normalized_text();
        let label = text.trim_end_matches(':').trim_end();
        labels.contains(&label)
    })
}

fn parameters_from_table(table: Element<'_>) -> Vec<Parameter> {
    let rows_of = |parent: Element<'_>| -> Vec<Parameter> {
        parent
            .children()
            .into_iter()
            .filter(|row| row.is("tr"))
            .filter_map(parameter_from_row)
            .collect()
    };

    table
        .children()
        .into_iter()
        .find(|child| child.is("tbody"))
        .map_or_else(|| rows_of(table), rows_of)
}

fn parameter_from_row(row: Element<'_>) -> Option<Parameter> {
    let cells = row.children();
    let cell = |class: &str| {
        cells
            .iter()
            .find(|c| c.is("td") && c.has_class(class))
            .map(Element::normalized_text)
    };

    let name = cell("name").filter(|n| !n.is_empty())?;
    let param_type = cell("type")
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| UNKNOWN_TYPE.to_string());
    let description = cell("last").unwrap_or_default();

    Some(Parameter {
        name,
        param_type,
        description,
    })
}

/// Every `pre` block between the example heading and the next heading.
fn examples_after(doc: &Markup, detail: Element<'_>, heading: Element<'_>) -> Vec<String> {
    let mut examples = Vec::new();
    let mut i = heading.end();
    while i < detail.end() {
        match doc.element(i) {
            Some(e) if matches!(e.tag(), "h1" | "h2" | "h3" | "h4" | "h5" | "h6") => break,
            Some(e) if e.is("pre") => {
                let code = e.find(|c| c.is("code")).unwrap_or(e);
                examples.push(code.text());
                i = e.end();
            },
            _ => i += 1,
        }
    }
    examples
}

/// Class names referenced by links on the page, in first-seen order.
///
/// Only links of the form `Name.html` (no directory part) count, and the
/// index page is excluded.
///
/// ```rust
/// use dtsdoc_core::extract::extract_links;
///
/// let html = r#"<a href="Marker.html">M</a><a href="index.html">i</a>
///               <a href="Layer.html">L</a><a href="Marker.html">again</a>
///               <a href="https://x.dev/Other.html">ext</a>"#;
/// assert_eq!(extract_links(html), vec!["Marker", "Layer"]);
/// ```
#[must_use]
pub fn extract_links(markup: &str) -> Vec<String> {
    let doc = Markup::parse(markup);
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for anchor in doc.elements().filter(|e| e.is("a")) {
        let Some(href) = anchor.attr("href").map(str::trim) else {
            continue;
        };
        if href == "index.html" || href.contains('/') {
            continue;
        }
        let Some(name) = href.strip_suffix(".html").filter(|n| !n.is_empty()) else {
            continue;
        };
        if seen.insert(name.to_string()) {
            links.push(name.to_string());
        }
    }

    links
}

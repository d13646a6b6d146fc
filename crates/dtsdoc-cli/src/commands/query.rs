//! `dtsdoc query`: look up a class or method and print it.

use anyhow::Result;
use chrono::{DateTime, Utc};
use colored::Colorize;
use dtsdoc_core::render::{FULL_VIEW, method_view_key};
use dtsdoc_core::types::{DocumentRecord, MethodRecord};
use dtsdoc_core::{Config, MarkdownRenderer, QueryOutcome, QueryRequest, Renderer, Style};
use serde::Serialize;
use tracing::warn;

use crate::cli::QueryArgs;
use crate::error::CliError;
use crate::output::{print_json, save_markdown};
use crate::utils::build_client;

/// JSON shape of a query result.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryReport<'a> {
    identifier: &'a str,
    locator: &'a str,
    from_cache: bool,
    fetched_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    focused_method: Option<&'a MethodRecord>,
    document: &'a DocumentRecord,
}

/// Run a query and print the result.
///
/// # Errors
///
/// Returns the pipeline error (not found, transport, extraction, missing
/// method) or an output failure.
pub fn execute(args: &QueryArgs, config: &Config, quiet: bool) -> Result<()> {
    let client = build_client(config)?;

    let mut request = QueryRequest::new(args.api_path.as_str()).with_refresh(args.refresh);
    if let Some(method) = &args.method {
        request = request.with_method(method.as_str());
    }
    let outcome = client.query(&request).map_err(CliError::from)?;
    let markdown = render(&outcome, args.format.into());

    if args.json {
        print_json(&QueryReport {
            identifier: outcome.identifier(),
            locator: &outcome.locator,
            from_cache: outcome.from_cache,
            fetched_at: outcome.document.fetched_at,
            focused_method: outcome.focus.as_ref(),
            document: &outcome.document.record,
        })?;
    } else {
        print!("{markdown}");
        if !markdown.ends_with('\n') {
            println!();
        }
    }

    let save = !args.no_save && (config.output.save_docs || args.output_dir.is_some());
    if save {
        let dir = args.output_dir.as_ref().unwrap_or(&config.output.dir);
        let method = outcome.focus.as_ref().map(|m| m.name.as_str());
        match save_markdown(dir, outcome.identifier(), method, &markdown) {
            Ok(path) if !quiet && !args.json => {
                eprintln!("{} Documentation saved: {}", "✓".green(), path.display());
            },
            Ok(_) => {},
            Err(e) => warn!("failed to save documentation: {e:#}"),
        }
    }

    Ok(())
}

/// Detailed output reuses the views the cache already holds.
fn render(outcome: &QueryOutcome, style: Style) -> String {
    let focus = outcome.focus.as_ref().map(|m| m.name.as_str());
    if style == Style::Detailed {
        let key = focus.map_or_else(|| FULL_VIEW.to_string(), method_view_key);
        if let Some(view) = outcome.document.view(&key) {
            return view.to_string();
        }
    }
    MarkdownRenderer::new(style).render(&outcome.document.record, focus)
}

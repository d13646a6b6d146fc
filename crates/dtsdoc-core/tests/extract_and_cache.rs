#![allow(missing_docs, clippy::unwrap_used, clippy::panic)]

use anyhow::Result;
use chrono::TimeDelta;
use dtsdoc_core::render::{FULL_VIEW, method_view_key};
use dtsdoc_core::types::UNKNOWN_TYPE;
use dtsdoc_core::{CacheStore, Invalidate, Lookup, extract, extract_links};
use tempfile::TempDir;

const MARKER_PAGE: &str = include_str!("fixtures/Marker.html");

#[test]
fn extracts_generator_page() -> Result<()> {
    let record = extract(MARKER_PAGE)?;

    assert_eq!(record.identifier, "Marker");
    assert_eq!(
        record.description,
        "Point markers placed on the 3D scene. Markers can carry text & images."
    );

    let names: Vec<_> = record.methods.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["add", "clear", "delete"]);

    let add = &record.methods[0];
    assert!(add.signature.starts_with("add(data, fn"));
    assert_eq!(add.description, "Add one or more markers.");
    assert_eq!(add.parameters.len(), 2);
    assert_eq!(add.parameters[0].name, "data");
    assert_eq!(add.parameters[0].param_type, "Object | Array");
    assert!(add.parameters[0].description.starts_with("Marker options"));
    assert_eq!(add.parameters[1].name, "fn");
    assert_eq!(add.parameters[1].param_type, "function");
    assert_eq!(
        add.returns.as_deref(),
        Some("A promise resolving to the created markers.")
    );
    assert_eq!(
        add.examples,
        vec!["let o = {\n    id: 'm1',\n    coordinate: [0, 0, 10]\n};\n__g.marker.add(o);"]
    );

    let clear = &record.methods[1];
    assert_eq!(clear.signature, "clear()");
    assert_eq!(clear.description, "");
    assert!(clear.parameters.is_empty());

    let delete = &record.methods[2];
    assert_eq!(delete.parameters[0].param_type, UNKNOWN_TYPE);
    Ok(())
}

#[test]
fn script_bodies_do_not_produce_anchors() -> Result<()> {
    let record = extract(MARKER_PAGE)?;
    assert!(record.find_method("bogus").is_none());
    Ok(())
}

#[test]
fn extracts_links_in_document_order() {
    assert_eq!(extract_links(MARKER_PAGE), vec!["TileLayer", "Polygon", "Marker"]);
}

#[test]
fn store_then_lookup_preserves_record() -> Result<()> {
    let temp = TempDir::new()?;
    let store = CacheStore::open(temp.path(), TimeDelta::days(7))?;
    let record = extract(MARKER_PAGE)?.with_source_locator("https://docs.example.com/Marker.html");

    store.store("Marker", record.clone())?;
    let Lookup::Hit(doc) = store.lookup("Marker", true)? else {
        panic!("expected a cache hit");
    };

    assert_eq!(
        serde_json::to_vec(&doc.record.methods)?,
        serde_json::to_vec(&record.methods)?
    );
    assert_eq!(doc.record.description, record.description);
    assert_eq!(doc.record.source_locator, record.source_locator);

    let full = doc.view(FULL_VIEW).unwrap();
    assert!(full.contains("### add(data, fn"));
    assert!(doc.view(&method_view_key("delete")).unwrap().contains("# Marker.delete"));
    Ok(())
}

#[test]
fn stores_are_isolated_by_root() -> Result<()> {
    let first = TempDir::new()?;
    let second = TempDir::new()?;
    let a = CacheStore::open(first.path(), TimeDelta::days(7))?;
    let b = CacheStore::open(second.path(), TimeDelta::days(7))?;

    a.store("Marker", extract(MARKER_PAGE)?)?;
    assert!(matches!(b.lookup("Marker", true)?, Lookup::Miss(_)));

    assert_eq!(b.invalidate(Invalidate::All)?, 0);
    assert!(matches!(a.lookup("Marker", true)?, Lookup::Hit(_)));
    Ok(())
}

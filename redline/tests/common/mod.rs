//! Helpers shared by the integration tests.

#![allow(dead_code)]

use indexmap::IndexMap;
use redline::{DiffOptions, Document, NodeKind, NodeRef, Stem};
use redline::indextree::NodeId;
use serde_json::Value;

/// Install a test subscriber once. Respects `RUST_LOG`.
pub fn setup() {
    use tracing_subscriber::EnvFilter;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Which input a diff output is projected back onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Old,
    New,
}

/// Rebuild one input from a diff output: drop what the other side
/// contributed, unwrap the markers and strip the marker classes.
///
/// Comments never make it into a diff, so compare against an input that
/// has none.
pub fn side_view(diff: &Document, options: &DiffOptions, view: View) -> Document {
    let mut doc = Document::new();
    let root = doc.root;
    for child in diff.root_ref().children() {
        project(&mut doc, root, child, options, view);
    }
    doc
}

fn project(doc: &mut Document, parent: NodeId, node: NodeRef<'_>, options: &DiffOptions, view: View) {
    let (dropped, kept) = match view {
        View::Old => (&options.added_class, &options.removed_class),
        View::New => (&options.removed_class, &options.added_class),
    };

    let Some(elem) = node.element() else {
        let copy = doc.clone_shallow_from(node);
        doc.append(parent, copy);
        return;
    };

    if elem.has_class(dropped) {
        return;
    }

    let is_marker = (node.is_tag("del") && elem.has_class(&options.removed_class))
        || (node.is_tag("ins")
            && (elem.has_class(&options.added_class) || elem.has_class(&options.modified_class)));
    if is_marker {
        for child in node.children() {
            project(doc, parent, child, options, view);
        }
        return;
    }

    let mut attrs: IndexMap<Stem, Stem> = elem.attrs.clone();
    if let Some(class) = elem.attrs.get("class") {
        let rest: Vec<&str> = class
            .split_ascii_whitespace()
            .filter(|token| *token != kept.as_str() && *token != options.modified_class.as_str())
            .collect();
        if rest.is_empty() {
            attrs.shift_remove("class");
        } else {
            let joined = rest.join(" ");
            attrs.insert("class".into(), joined.into());
        }
    }
    let copy = doc.create_element_with(elem.tag.as_str(), attrs);
    doc.append(parent, copy);
    for child in node.children() {
        project(doc, copy, child, options, view);
    }
}

/// Build a fragment from JsonML children: a string is a text node, an
/// array is `[tag, {attrs}?, children...]`, and `["#comment", text]` is a
/// comment.
pub fn from_jsonml(children: &Value) -> Result<Document, String> {
    let mut doc = Document::new();
    let root = doc.root;
    let list = children
        .as_array()
        .ok_or_else(|| format!("expected an array of nodes, got {children}"))?;
    for child in list {
        append_jsonml(&mut doc, root, child)?;
    }
    Ok(doc)
}

fn append_jsonml(doc: &mut Document, parent: NodeId, value: &Value) -> Result<(), String> {
    let id = match value {
        Value::String(text) => doc.create_text(text.as_str()),
        Value::Array(items) => {
            let (tag, rest) = items
                .split_first()
                .ok_or_else(|| "empty JsonML node".to_string())?;
            let tag = tag
                .as_str()
                .ok_or_else(|| format!("JsonML tag must be a string, got {tag}"))?;

            if tag == "#comment" {
                let text = rest.first().and_then(Value::as_str).unwrap_or_default();
                doc.create_comment(text)
            } else {
                let (attrs, children) = match rest.split_first() {
                    Some((Value::Object(attrs), children)) => (Some(attrs), children),
                    _ => (None, rest),
                };
                let attrs: Vec<(&str, &str)> = attrs
                    .into_iter()
                    .flatten()
                    .map(|(k, v)| (k.as_str(), v.as_str().unwrap_or_default()))
                    .collect();
                let id = doc.create_element_with(tag, attrs);
                for child in children {
                    append_jsonml(doc, id, child)?;
                }
                id
            }
        }
        other => return Err(format!("unexpected JsonML value {other}")),
    };
    doc.append(parent, id);
    Ok(())
}

/// Options described by a test case, e.g. `{"skip_modified": true}`.
pub fn options_from_json(value: Option<&Value>) -> DiffOptions {
    let mut options = DiffOptions::default();
    let Some(value) = value else {
        return options;
    };
    if let Some(class) = value.get("added_class").and_then(Value::as_str) {
        options = options.with_added_class(class);
    }
    if let Some(class) = value.get("modified_class").and_then(Value::as_str) {
        options = options.with_modified_class(class);
    }
    if let Some(class) = value.get("removed_class").and_then(Value::as_str) {
        options = options.with_removed_class(class);
    }
    if value.get("skip_modified").and_then(Value::as_bool) == Some(true) {
        options = options.skip_modified();
    }
    options
}

/// Whether the tree contains comments, which a diff drops.
pub fn has_comments(doc: &Document) -> bool {
    redline::DomIterator::new(doc.root_ref(), redline::Everything)
        .any(|node| matches!(node.kind(), NodeKind::Comment(_)))
}

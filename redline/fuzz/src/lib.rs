//! Structured tree generation for fuzzing redline.
//!
//! Trees are built from a small vocabulary so that diffs of two arbitrary
//! trees share a fair amount of structure and text.

use arbitrary::Arbitrary;
use redline::indextree::NodeId;
use redline::{Builder, DiffOptions, Document, NodeRef};

const WORDS: [&str; 8] = ["alpha ", "beta ", "gamma", "delta.", " ", "x", "yy ", "zeta "];
const IMAGES: [&str; 3] = ["a.png", "b.png", "c.png"];

#[derive(Debug, Clone, Copy, Arbitrary)]
pub enum Block {
    Div,
    P,
    H1,
    Section,
    Ul,
    Li,
}

impl Block {
    fn tag(self) -> &'static str {
        match self {
            Block::Div => "div",
            Block::P => "p",
            Block::H1 => "h1",
            Block::Section => "section",
            Block::Ul => "ul",
            Block::Li => "li",
        }
    }
}

#[derive(Debug, Clone, Arbitrary)]
pub enum FuzzNode {
    Text(u8),
    Image(u8),
    Element {
        block: Block,
        class: Option<u8>,
        children: Vec<FuzzNode>,
    },
    /// A table with a `tbody`; rows are cut to the first row's width
    /// unless `ragged`.
    Table { rows: Vec<Vec<u8>>, ragged: bool },
}

/// Build a fragment from generated nodes.
pub fn build(nodes: &[FuzzNode]) -> Document {
    Document::fragment(|b| {
        for node in nodes {
            append(b, node, 0);
        }
    })
}

fn append(b: &mut Builder<'_>, node: &FuzzNode, depth: usize) {
    match node {
        FuzzNode::Text(word) => {
            b.text(WORDS[*word as usize % WORDS.len()]);
        }
        FuzzNode::Image(src) => {
            b.element_with("img", &[("src", IMAGES[*src as usize % IMAGES.len()])], |_| {});
        }
        FuzzNode::Element {
            block,
            class,
            children,
        } => {
            let class = class.map(|c| if c % 2 == 0 { "even" } else { "odd" });
            let attrs: Vec<(&str, &str)> = class.map(|c| ("class", c)).into_iter().collect();
            b.element_with(block.tag(), &attrs, |b| {
                if depth < 6 {
                    for child in children {
                        append(b, child, depth + 1);
                    }
                }
            });
        }
        FuzzNode::Table { rows, ragged } => {
            let width = rows.first().map_or(0, Vec::len).clamp(1, 4);
            b.element("table", |b| {
                b.element("tbody", |b| {
                    for row in rows.iter().take(6) {
                        b.element("tr", |b| {
                            let cells = if *ragged { row.len().clamp(1, 4) } else { width };
                            for i in 0..cells {
                                let word = row.get(i).copied().unwrap_or(0);
                                b.element("td", |b| {
                                    b.text(WORDS[word as usize % WORDS.len()]);
                                });
                            }
                        });
                    }
                });
            });
        }
    }
}

/// Rebuild the new input from a diff: drop removed content, unwrap the
/// markers and strip the marker classes.
pub fn new_view(diff: &Document, options: &DiffOptions) -> Document {
    let mut doc = Document::new();
    let root = doc.root;
    for child in diff.root_ref().children() {
        project(&mut doc, root, child, options);
    }
    doc
}

fn project(doc: &mut Document, parent: NodeId, node: NodeRef<'_>, options: &DiffOptions) {
    let Some(elem) = node.element() else {
        let copy = doc.clone_shallow_from(node);
        doc.append(parent, copy);
        return;
    };
    if elem.has_class(&options.removed_class) {
        return;
    }
    if node.is_tag("ins") {
        for child in node.children() {
            project(doc, parent, child, options);
        }
        return;
    }

    let mut copy = elem.clone();
    if let Some(class) = elem.attrs.get("class") {
        let rest: Vec<&str> = class
            .split_ascii_whitespace()
            .filter(|t| *t != options.added_class.as_str() && *t != options.modified_class.as_str())
            .collect();
        if rest.is_empty() {
            copy.attrs.shift_remove("class");
        } else {
            copy.attrs.insert("class".into(), rest.join(" ").into());
        }
    }
    let id = doc.create_element_with(copy.tag.as_str(), copy.attrs);
    doc.append(parent, id);
    for child in node.children() {
        project(doc, id, child, options);
    }
}


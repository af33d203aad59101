#![no_main]

//! Diffs a tree against a copy with a few nodes replaced, and checks the
//! unchanged case yields no markers at all.

use libfuzzer_sys::fuzz_target;
use redline::{DiffOptions, diff_documents};
use redline_fuzz::{FuzzNode, build, new_view};

#[derive(Debug, arbitrary::Arbitrary)]
struct Input {
    nodes: Vec<FuzzNode>,
    edits: Vec<(u8, FuzzNode)>,
}

fuzz_target!(|input: Input| {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let old = build(&input.nodes);
    let options = DiffOptions::default();

    let same = diff_documents(&old, &old, &options).expect("diff of a tree with itself");
    assert_eq!(same.to_html(), old.to_html());

    let mut nodes = input.nodes.clone();
    for (at, node) in input.edits {
        if nodes.is_empty() {
            nodes.push(node);
        } else {
            let at = at as usize % nodes.len();
            nodes[at] = node;
        }
    }
    let new = build(&nodes);

    let diff = diff_documents(&old, &new, &options).expect("diff failed");
    assert_eq!(new_view(&diff, &options).to_html(), new.to_html());
});


//! Turning recorded marks into visible markup.

use indextree::NodeId;

use crate::dom::{Document, nodes_equal};
use crate::merge::Marks;
use crate::options::DiffOptions;
use crate::trace;

/// Tag wrapping removed content.
pub const REMOVED_TAG: &str = "del";
/// Tag wrapping added and reformatted content.
pub const ADDED_TAG: &str = "ins";

/// Moves every removed node in front of the added siblings right before
/// it, so removed content always reads first.
pub(crate) fn move_removed_before_added(out: &mut Document, marks: &Marks<'_>) {
    for &id in &marks.removed {
        while let Some(previous) = out.previous_sibling(id) {
            if !marks.added.contains(&previous) {
                break;
            }
            out.insert_before(previous, id);
        }
    }
}

/// Marks up removed, added and (unless disabled) modified nodes.
pub(crate) fn mark_up_changes(out: &mut Document, marks: &Marks<'_>, options: &DiffOptions) {
    for &id in &marks.removed {
        mark_up(out, id, REMOVED_TAG, &options.removed_class);
    }
    for &id in &marks.added {
        mark_up(out, id, ADDED_TAG, &options.added_class);
    }
    if !options.skip_modified {
        for &id in &marks.modified {
            mark_up(out, id, ADDED_TAG, &options.modified_class);
        }
    }
}

/// Elements get `class` added. Anything else is wrapped in a `tag`
/// element with `class`, reusing the previous sibling when it is already
/// such a wrapper.
fn mark_up(out: &mut Document, id: NodeId, tag: &str, class: &str) {
    if out.node(id).is_element() {
        out.add_class(id, class);
        return;
    }
    if out.parent(id).is_none() {
        return;
    }

    match out.previous_sibling(id) {
        Some(previous) if out.node(previous).is_tag(tag) && out.node(previous).has_class(class) => {
            out.append(previous, id);
        }
        _ => {
            let wrapper = out.create_element_with(tag, [("class", class)]);
            out.insert_before(id, wrapper);
            out.append(wrapper, id);
        }
    }
}

/// Re-applies formatting elements around text, outermost first, extending
/// the previous sibling when it is the same formatting element.
pub(crate) fn apply_formatting(out: &mut Document, marks: &Marks<'_>) {
    for (&text, formatting) in &marks.formatting {
        for &element in formatting {
            if out.parent(text).is_none() {
                break;
            }
            match out.previous_sibling(text) {
                Some(previous) if nodes_equal(out.node(previous), element, false) => {
                    out.append(previous, text);
                }
                _ => {
                    trace!(?element, "wrapping text in formatting");
                    let wrapper = out.clone_shallow_from(element);
                    out.insert_before(text, wrapper);
                    out.append(wrapper, text);
                }
            }
        }
    }
}

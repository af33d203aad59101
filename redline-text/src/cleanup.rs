//! Clean-up passes over raw diff segments.
//!
//! A character diff is minimal but rarely readable: it happily matches a
//! stray `e` in the middle of two unrelated words. These passes trade
//! minimality for readability, in the spirit of diff-match-patch's
//! `diff_cleanupMerge` / `diff_cleanupSemantic`, with one twist: an equality
//! holding a node marker is structure, not noise, so it is never folded
//! into the surrounding edits.

use crate::markers::{contains_node_marker, is_node_marker};
use crate::{Op, Segment, trace};

/// Normalizes a segment list.
///
/// Adjacent segments of the same kind are joined, deletions are placed
/// before insertions, text shared by the start (or end) of a deletion and
/// an insertion is moved into the neighbouring equality, and single edits
/// are slid sideways when that removes an equality
/// (`A<ins>BA</ins>C` becomes `<ins>AB</ins>AC`).
pub fn cleanup_merge(segments: &mut Vec<Segment>) {
    loop {
        merge_runs(segments);
        if !shift_single_edits(segments) {
            break;
        }
    }
}

fn merge_runs(segments: &mut Vec<Segment>) {
    let mut merged: Vec<Segment> = Vec::with_capacity(segments.len());
    let mut deleted = String::new();
    let mut inserted = String::new();

    for segment in segments.drain(..) {
        match segment.op {
            Op::Delete => deleted.push_str(&segment.text),
            Op::Insert => inserted.push_str(&segment.text),
            Op::Equal => {
                let mut equal = segment.text;
                flush_edits(&mut merged, &mut deleted, &mut inserted, &mut equal);
                push_equal(&mut merged, equal);
            }
        }
    }

    let mut tail = String::new();
    flush_edits(&mut merged, &mut deleted, &mut inserted, &mut tail);
    push_equal(&mut merged, tail);

    *segments = merged;
}

/// Pushes the pending edits, factoring their common prefix into the
/// previous equality and their common suffix into `next_equal`.
fn flush_edits(
    merged: &mut Vec<Segment>,
    deleted: &mut String,
    inserted: &mut String,
    next_equal: &mut String,
) {
    if !deleted.is_empty() && !inserted.is_empty() {
        let prefix = common_prefix(inserted, deleted);
        if prefix > 0 {
            push_equal(merged, inserted[..prefix].to_owned());
            inserted.drain(..prefix);
            deleted.drain(..prefix);
        }

        let suffix = common_suffix(inserted, deleted);
        if suffix > 0 {
            let common = inserted.split_off(inserted.len() - suffix);
            deleted.truncate(deleted.len() - suffix);
            next_equal.insert_str(0, &common);
        }
    }

    if !deleted.is_empty() {
        merged.push(Segment::new(Op::Delete, core::mem::take(deleted)));
    }
    if !inserted.is_empty() {
        merged.push(Segment::new(Op::Insert, core::mem::take(inserted)));
    }
}

fn push_equal(merged: &mut Vec<Segment>, text: String) {
    if text.is_empty() {
        return;
    }
    match merged.last_mut() {
        Some(last) if last.op == Op::Equal => last.text.push_str(&text),
        _ => merged.push(Segment::new(Op::Equal, text)),
    }
}

/// Slides single edits over a neighbouring equality they end (or start)
/// with. Returns `true` if anything moved.
fn shift_single_edits(segments: &mut Vec<Segment>) -> bool {
    let mut changed = false;
    let mut i = 1;

    while i + 1 < segments.len() {
        if segments[i - 1].op == Op::Equal
            && segments[i + 1].op == Op::Equal
            && segments[i].op != Op::Equal
        {
            if segments[i].text.ends_with(segments[i - 1].text.as_str()) {
                let previous = segments.remove(i - 1).text;
                i -= 1;
                let edit = &mut segments[i].text;
                edit.truncate(edit.len() - previous.len());
                edit.insert_str(0, &previous);
                segments[i + 1].text.insert_str(0, &previous);
                changed = true;
            } else if segments[i].text.starts_with(segments[i + 1].text.as_str()) {
                let next = segments.remove(i + 1).text;
                segments[i - 1].text.push_str(&next);
                let edit = &mut segments[i].text;
                edit.drain(..next.len());
                edit.push_str(&next);
                changed = true;
            }
        }
        i += 1;
    }

    changed
}

/// Makes a diff human readable.
///
/// Small equalities sandwiched between larger edits are folded into the
/// edits, unless they contain a node marker. Edits are then aligned with
/// word and line boundaries, and overlaps between a deletion and the
/// following insertion are pulled out as equalities.
pub fn cleanup_semantic(segments: &mut Vec<Segment>) {
    if eliminate_equalities(segments) {
        cleanup_merge(segments);
    }
    cleanup_semantic_lossless(segments);
    extract_overlaps(segments);
    segments.retain(|segment| !segment.text.is_empty());
}

fn eliminate_equalities(segments: &mut Vec<Segment>) -> bool {
    let mut changed = false;
    let mut equalities: Vec<usize> = Vec::new();
    let mut last_equality: Option<usize> = None;

    // Characters changed before and after the last equality.
    let mut inserted_before = 0;
    let mut deleted_before = 0;
    let mut inserted_after = 0;
    let mut deleted_after = 0;

    let mut i = 0;
    while i < segments.len() {
        if segments[i].op == Op::Equal {
            equalities.push(i);
            inserted_before = inserted_after;
            deleted_before = deleted_after;
            inserted_after = 0;
            deleted_after = 0;
            last_equality = Some(i);
            i += 1;
            continue;
        }

        let len = char_len(&segments[i].text);
        if segments[i].op == Op::Insert {
            inserted_after += len;
        } else {
            deleted_after += len;
        }

        if let Some(at) = last_equality {
            let equality = &segments[at].text;
            let equality_len = char_len(equality);
            if equality_len <= inserted_before.max(deleted_before)
                && equality_len <= inserted_after.max(deleted_after)
                && !contains_node_marker(equality)
            {
                trace!("folding equality {:?} into surrounding edits", equality);
                let text = equality.clone();
                segments[at].op = Op::Insert;
                segments.insert(at, Segment::new(Op::Delete, text));

                // Drop this equality and re-evaluate the one before it.
                equalities.pop();
                equalities.pop();
                inserted_before = 0;
                deleted_before = 0;
                inserted_after = 0;
                deleted_after = 0;
                last_equality = None;
                changed = true;

                i = equalities.last().map_or(0, |&at| at + 1);
                continue;
            }
        }

        i += 1;
    }

    changed
}

/// Slides single edits surrounded by equalities to the most natural
/// boundary (blank line > line break > sentence end > whitespace >
/// punctuation), without changing what the diff says.
pub fn cleanup_semantic_lossless(segments: &mut Vec<Segment>) {
    let mut i = 1;

    while i + 1 < segments.len() {
        if segments[i - 1].op != Op::Equal || segments[i + 1].op != Op::Equal {
            i += 1;
            continue;
        }

        let mut before = segments[i - 1].text.clone();
        let mut edit = segments[i].text.clone();
        let mut after = segments[i + 1].text.clone();

        // Shift the edit as far left as possible.
        let shared = common_suffix(&before, &edit);
        if shared > 0 {
            let common = edit.split_off(edit.len() - shared);
            before.truncate(before.len() - shared);
            edit.insert_str(0, &common);
            after.insert_str(0, &common);
        }

        // Then step right one char at a time, keeping the best fit.
        let mut best_score = semantic_score(&before, &edit) + semantic_score(&edit, &after);
        let mut best = (before.clone(), edit.clone(), after.clone());
        while let (Some(first), Some(next)) = (edit.chars().next(), after.chars().next()) {
            if first != next {
                break;
            }
            before.push(first);
            edit.remove(0);
            edit.push(next);
            after.remove(0);

            let score = semantic_score(&before, &edit) + semantic_score(&edit, &after);
            // `>=` favours trailing over leading whitespace in edits.
            if score >= best_score {
                best_score = score;
                best = (before.clone(), edit.clone(), after.clone());
            }
        }

        let (best_before, best_edit, best_after) = best;
        if segments[i - 1].text != best_before {
            if best_before.is_empty() {
                segments.remove(i - 1);
                i -= 1;
            } else {
                segments[i - 1].text = best_before;
            }
            segments[i].text = best_edit;
            if best_after.is_empty() {
                segments.remove(i + 1);
                i = i.saturating_sub(1);
            } else {
                segments[i + 1].text = best_after;
            }
        }

        i += 1;
    }
}

/// Scores how natural the boundary between `one` and `two` is, from 6
/// (edge of the text) down to 0 (inside a word).
fn semantic_score(one: &str, two: &str) -> u8 {
    let (Some(last), Some(first)) = (one.chars().next_back(), two.chars().next()) else {
        return 6;
    };

    let non_alnum_last = !last.is_ascii_alphanumeric();
    let non_alnum_first = !first.is_ascii_alphanumeric();
    let whitespace_last = non_alnum_last && last.is_whitespace();
    let whitespace_first = non_alnum_first && first.is_whitespace();
    let line_break_last = whitespace_last && matches!(last, '\r' | '\n');
    let line_break_first = whitespace_first && matches!(first, '\r' | '\n');
    let blank_line_last = line_break_last && (one.ends_with("\n\n") || one.ends_with("\n\r\n"));
    let blank_line_first = line_break_first
        && ["\n\n", "\n\r\n", "\r\n\n", "\r\n\r\n"]
            .iter()
            .any(|prefix| two.starts_with(prefix));

    if blank_line_last || blank_line_first {
        5
    } else if line_break_last || line_break_first {
        4
    } else if non_alnum_last && !whitespace_last && whitespace_first {
        // End of a sentence.
        3
    } else if whitespace_last || whitespace_first {
        2
    } else if non_alnum_last || non_alnum_first {
        1
    } else {
        0
    }
}

/// Pulls text shared by the end of a deletion and the start of the
/// following insertion (or the reverse) out into an equality, when the
/// overlap is at least half of either edit.
fn extract_overlaps(segments: &mut Vec<Segment>) {
    let mut i = 1;

    while i < segments.len() {
        if segments[i - 1].op == Op::Delete && segments[i].op == Op::Insert {
            let deletion = core::mem::take(&mut segments[i - 1].text);
            let insertion = core::mem::take(&mut segments[i].text);
            let deletion_len = char_len(&deletion);
            let insertion_len = char_len(&insertion);

            let forward = common_overlap(&deletion, &insertion);
            let backward = common_overlap(&insertion, &deletion);
            let forward_len = char_len(&insertion[..forward]);
            let backward_len = char_len(&deletion[..backward]);

            if forward_len >= backward_len {
                if forward_len > 0
                    && (forward_len * 2 >= deletion_len || forward_len * 2 >= insertion_len)
                {
                    segments[i - 1].text = deletion[..deletion.len() - forward].to_owned();
                    segments[i].text = insertion[forward..].to_owned();
                    segments.insert(i, Segment::new(Op::Equal, &insertion[..forward]));
                    i += 1;
                } else {
                    segments[i - 1].text = deletion;
                    segments[i].text = insertion;
                }
            } else if backward_len * 2 >= deletion_len || backward_len * 2 >= insertion_len {
                segments[i - 1] =
                    Segment::new(Op::Insert, &insertion[..insertion.len() - backward]);
                segments[i] = Segment::new(Op::Delete, &deletion[backward..]);
                segments.insert(i, Segment::new(Op::Equal, &deletion[..backward]));
                i += 1;
            } else {
                segments[i - 1].text = deletion;
                segments[i].text = insertion;
            }
            i += 1;
        }
        i += 1;
    }
}

/// Moves node markers that end both an equality and the following edit
/// to the front of the edit.
///
/// `=abc<P>` `+def<P>` `=xyz` becomes `=abc` `+<P>def` `=<P>xyz`, so an
/// inserted block starts with its own opening node instead of borrowing
/// the one of the block before it.
pub fn cleanup_node_markers(segments: &mut Vec<Segment>) {
    let mut i = 0;

    while i + 2 < segments.len() {
        let aligned = segments[i].op == Op::Equal
            && segments[i + 1].op != Op::Equal
            && segments[i + 2].op == Op::Equal;
        let marker = match segments[i].text.chars().next_back() {
            Some(marker)
                if aligned
                    && is_node_marker(marker)
                    && segments[i + 1].text.ends_with(marker) =>
            {
                marker
            }
            _ => {
                i += 1;
                continue;
            }
        };

        segments[i].text.pop();
        let edit = &mut segments[i + 1].text;
        edit.pop();
        edit.insert(0, marker);
        segments[i + 2].text.insert(0, marker);

        if segments[i].text.is_empty() {
            segments.remove(i);
        }
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Byte length of the common prefix of `a` and `b`.
pub(crate) fn common_prefix(a: &str, b: &str) -> usize {
    a.chars()
        .zip(b.chars())
        .take_while(|(x, y)| x == y)
        .map(|(x, _)| x.len_utf8())
        .sum()
}

/// Byte length of the common suffix of `a` and `b`.
pub(crate) fn common_suffix(a: &str, b: &str) -> usize {
    a.chars()
        .rev()
        .zip(b.chars().rev())
        .take_while(|(x, y)| x == y)
        .map(|(x, _)| x.len_utf8())
        .sum()
}

/// Byte length of the longest suffix of `a` that is also a prefix of `b`.
fn common_overlap(a: &str, b: &str) -> usize {
    b.char_indices()
        .map(|(at, c)| at + c.len_utf8())
        .filter(|&end| end <= a.len())
        .filter(|&end| a.ends_with(&b[..end]))
        .last()
        .unwrap_or(0)
}

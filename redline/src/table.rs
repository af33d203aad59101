//! Table realignment.
//!
//! The merge engine knows nothing about columns, so a column added to a
//! table shows up as an added cell in every row, which renders fine, but a
//! column added in one row and removed in another would not line up. This
//! pass derives one column layout per shared table and makes every row
//! follow it. Tables it cannot reason about are shown twice instead: the
//! old one removed, the new one added.

use indextree::NodeId;

use crate::debug;
use crate::dom::{Document, NodeRef};
use crate::error::{DiffError, Result};
use crate::iter::{DomIterator, Everything, Rows};
use crate::merge::{Marks, TablePair};
use crate::options::DiffOptions;

/// What happened to a table column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Column {
    Removed,
    Common,
    Added,
}

impl Column {
    fn of(id: NodeId, marks: &Marks<'_>) -> Self {
        if marks.added.contains(&id) {
            Column::Added
        } else if marks.removed.contains(&id) {
            Column::Removed
        } else {
            Column::Common
        }
    }
}

/// Checks that `table` is a simple table the diff can line up: an
/// optional `caption`, an optional `thead`, a non-empty `tbody`, an
/// optional `tfoot` and nothing else, with rows made only of cells that
/// span one row and one column. With `same_width`, every row must also
/// have the same number of cells.
pub(crate) fn is_table_valid(table: NodeRef<'_>, same_width: bool) -> bool {
    let mut width = None;
    let mut children = table.children().peekable();

    let _caption = children.next_if(|child| child.is_tag("caption"));
    if let Some(thead) = children.next_if(|child| child.is_tag("thead")) {
        if !is_row_group_valid(thead, same_width, &mut width) {
            return false;
        }
    }
    match children.next_if(|child| child.is_tag("tbody")) {
        Some(tbody) if tbody.first_child().is_some() => {
            if !is_row_group_valid(tbody, same_width, &mut width) {
                return false;
            }
        }
        _ => return false,
    }
    if let Some(tfoot) = children.next_if(|child| child.is_tag("tfoot")) {
        if !is_row_group_valid(tfoot, same_width, &mut width) {
            return false;
        }
    }

    children.next().is_none()
}

fn is_row_group_valid(group: NodeRef<'_>, same_width: bool, width: &mut Option<usize>) -> bool {
    group.children().all(|row| {
        if !row.is_tag("tr") {
            return false;
        }
        let cells = row.child_count();
        if cells == 0 {
            return false;
        }
        if same_width {
            match *width {
                None => *width = Some(cells),
                Some(expected) if expected != cells => return false,
                Some(_) => {}
            }
        }
        row.children().all(is_cell_valid)
    })
}

fn is_cell_valid(cell: NodeRef<'_>) -> bool {
    let spans_one = |name| cell.attr(name).is_none_or(|value| value == "1");
    (cell.is_tag("td") || cell.is_tag("th")) && spans_one("colspan") && spans_one("rowspan")
}

/// Realigns every shared table recorded by the merge that is still part
/// of the tree under `output_root`. Tables nested in a replaced table were
/// removed with it and are skipped.
pub(crate) fn realign_tables<'a>(
    out: &mut Document,
    output_root: NodeId,
    marks: &mut Marks<'a>,
    options: &'a DiffOptions,
) -> Result<()> {
    let tables = core::mem::take(&mut marks.tables);
    for table in tables {
        if !out.is_within(table.output, output_root) {
            continue;
        }

        let valid = is_table_valid(table.old, true)
            && is_table_valid(table.new, true)
            && is_table_valid(out.node(table.output), false);
        if !valid {
            debug!("table cannot be diffed cell by cell, showing both versions");
            replace_table(out, table, marks);
            continue;
        }

        match columns(out.node(table.output), marks) {
            Some(columns) => realign_rows(out, table.output, &columns, marks, options)?,
            None => {
                debug!("no shared row to take columns from, showing both versions");
                replace_table(out, table, marks);
            }
        }
    }
    Ok(())
}

/// Replaces the merged table with a removed copy of the old table and an
/// added copy of the new one.
fn replace_table(out: &mut Document, table: TablePair<'_>, marks: &mut Marks<'_>) {
    let subtree: Vec<NodeId> = DomIterator::new(out.node(table.output), Everything)
        .map(NodeRef::id)
        .collect();
    for id in subtree {
        marks.forget(id);
    }

    let old = out.clone_deep_from(table.old);
    let new = out.clone_deep_from(table.new);
    out.insert_before(table.output, old);
    out.insert_before(table.output, new);
    out.remove_subtree(table.output);
    marks.removed.insert(old);
    marks.added.insert(new);
}

/// Column layout taken from the first row both tables share.
fn columns(table: NodeRef<'_>, marks: &Marks<'_>) -> Option<Vec<Column>> {
    let columns = DomIterator::new(table, Rows).find_map(|row| {
        let pair = marks.rows.get(&row.id())?;
        let old_count = pair.old.child_count();
        let new_count = pair.new.child_count();
        let max = old_count.max(new_count);
        let min = old_count.min(new_count);

        let columns: Vec<Column> = if row.child_count() == max {
            // The merge lined the cells up, trust it.
            row.children().map(|cell| Column::of(cell.id(), marks)).collect()
        } else {
            let extra = if old_count < new_count {
                Column::Added
            } else {
                Column::Removed
            };
            (0..max)
                .map(|i| if i < min { Column::Common } else { extra })
                .collect()
        };
        Some(columns)
    })?;

    (!columns.is_empty()).then_some(columns)
}

fn realign_rows<'a>(
    out: &mut Document,
    table: NodeId,
    columns: &[Column],
    marks: &mut Marks<'a>,
    options: &'a DiffOptions,
) -> Result<()> {
    let rows: Vec<NodeId> = DomIterator::new(out.node(table), Rows)
        .map(NodeRef::id)
        .collect();

    for row in rows {
        let cell_count = out.children(row).count();
        let group = out.parent(row);
        let is_marked = |set: &indexmap::IndexSet<NodeId>| {
            set.contains(&row) || group.is_some_and(|group| set.contains(&group))
        };

        if is_marked(&marks.added) {
            if cell_count < columns.len() {
                pad_row(out, row, columns, Column::Removed, Some(&mut *marks));
            }
        } else if is_marked(&marks.removed) {
            if cell_count < columns.len() {
                pad_row(out, row, columns, Column::Added, None);
            }
        } else {
            let aligned = cell_count == columns.len()
                && out
                    .children(row)
                    .zip(columns)
                    .all(|(cell, &column)| Column::of(cell, marks) == column);
            if !aligned {
                rebuild_row(out, row, columns, marks, options)?;
            }
        }
    }
    Ok(())
}

/// Inserts an empty cell at every `column` position. The new cells are
/// marked removed when `marks` is given.
fn pad_row(
    out: &mut Document,
    row: NodeId,
    columns: &[Column],
    column: Column,
    mut marks: Option<&mut Marks<'_>>,
) {
    for (i, _) in columns.iter().enumerate().filter(|&(_, &c)| c == column) {
        let cell = out.create_element("td");
        let next = out.children(row).nth(i);
        match next {
            Some(next) => out.insert_before(next, cell),
            None => out.append(row, cell),
        }
        if let Some(marks) = marks.as_deref_mut() {
            marks.removed.insert(cell);
        }
    }
}

/// Rebuilds a row from its source rows, one cell per column: added cells
/// are copied from the new row, removed cells from the old row, and
/// shared cells are diffed on their own.
fn rebuild_row<'a>(
    out: &mut Document,
    row: NodeId,
    columns: &[Column],
    marks: &mut Marks<'a>,
    options: &'a DiffOptions,
) -> Result<()> {
    debug!(?columns, "rebuilding misaligned row");

    let content: Vec<NodeId> = DomIterator::new(out.node(row), Everything)
        .skip(1)
        .map(NodeRef::id)
        .collect();
    for id in content {
        marks.forget(id);
    }
    out.clear_children(row);

    let pair = marks.rows.get(&row).copied().ok_or(DiffError::MissingRowPair)?;
    let mut old_cells = pair.old.children();
    let mut new_cells = pair.new.children();

    for &column in columns {
        match column {
            Column::Added => {
                if let Some(cell) = new_cells.next() {
                    let copy = out.clone_deep_from(cell);
                    out.append(row, copy);
                    marks.added.insert(copy);
                }
            }
            Column::Removed => {
                if let Some(cell) = old_cells.next() {
                    let copy = out.clone_deep_from(cell);
                    out.append(row, copy);
                    marks.removed.insert(copy);
                }
            }
            Column::Common => {
                if let (Some(old), Some(new)) = (old_cells.next(), new_cells.next()) {
                    crate::diff_into(out, row, old, new, options)?;
                }
            }
        }
    }
    Ok(())
}

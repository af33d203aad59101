//! End-to-end tests for the visual diff: expected markup for typical edits,
//! plus checks that the output still contains both inputs.

mod common;

use common::{View, setup, side_view};
use redline::{
    Builder, DiffError, DiffOptions, Document, DomIterator, Everything, Segment, diff_documents,
    visual_dom_diff,
};

fn doc(build: impl FnOnce(&mut Builder<'_>)) -> Document {
    Document::fragment(build)
}

fn para(text: &str) -> Document {
    doc(|b| {
        b.element("p", |b| {
            b.text(text);
        });
    })
}

fn diff_html(old: &Document, new: &Document, options: &DiffOptions) -> String {
    setup();
    diff_documents(old, new, options)
        .expect("diff should succeed")
        .to_html()
}

/// Both inputs can be read back out of the diff.
#[track_caller]
fn assert_contains_both(old: &Document, new: &Document, options: &DiffOptions) {
    let diff = diff_documents(old, new, options).expect("diff should succeed");
    assert_eq!(
        side_view(&diff, options, View::Old).to_html(),
        old.to_html(),
        "old view of {}",
        diff.to_html()
    );
    assert_eq!(
        side_view(&diff, options, View::New).to_html(),
        new.to_html(),
        "new view of {}",
        diff.to_html()
    );
}

#[test]
fn test_identical_documents_have_no_markers() {
    let tree = doc(|b| {
        b.element("h1", |b| {
            b.text("Title");
        });
        b.element("p", |b| {
            b.text("Some ");
            b.element("strong", |b| {
                b.text("bold");
            });
            b.text(" text.");
        });
        b.element("ul", |b| {
            b.element("li", |b| {
                b.text("one");
            });
            b.element("li", |b| {
                b.text("two");
            });
        });
    });
    let html = diff_html(&tree, &tree, &DiffOptions::default());
    assert_eq!(html, tree.to_html());
}

#[test]
fn test_empty_documents() {
    let empty = Document::new();
    assert_eq!(diff_html(&empty, &empty, &DiffOptions::default()), "");
    assert_eq!(
        diff_html(&empty, &para("x"), &DiffOptions::default()),
        r#"<p class="vdd-added">x</p>"#
    );
    assert_eq!(
        diff_html(&para("x"), &empty, &DiffOptions::default()),
        r#"<p class="vdd-removed">x</p>"#
    );
}

#[test]
fn test_inserted_word() {
    let old = para("Hello world");
    let new = para("Hello brave world");
    assert_eq!(
        diff_html(&old, &new, &DiffOptions::default()),
        r#"<p>Hello <ins class="vdd-added">brave </ins>world</p>"#
    );
    assert_contains_both(&old, &new, &DiffOptions::default());
}

#[test]
fn test_removed_word() {
    let old = para("Hello brave world");
    let new = para("Hello world");
    assert_eq!(
        diff_html(&old, &new, &DiffOptions::default()),
        r#"<p>Hello <del class="vdd-removed">brave </del>world</p>"#
    );
    assert_contains_both(&old, &new, &DiffOptions::default());
}

#[test]
fn test_replaced_word_reads_removed_first() {
    let old = para("The cat sat");
    let new = para("The dog sat");
    assert_eq!(
        diff_html(&old, &new, &DiffOptions::default()),
        r#"<p>The <del class="vdd-removed">cat</del><ins class="vdd-added">dog</ins> sat</p>"#
    );
    assert_contains_both(&old, &new, &DiffOptions::default());
}

#[test]
fn test_whole_text_replaced() {
    let old = para("a");
    let new = para("b");
    assert_eq!(
        diff_html(&old, &new, &DiffOptions::default()),
        r#"<p><del class="vdd-removed">a</del><ins class="vdd-added">b</ins></p>"#
    );
}

#[test]
fn test_added_and_removed_paragraphs() {
    let one = para("a");
    let two = doc(|b| {
        b.element("p", |b| {
            b.text("a");
        });
        b.element("p", |b| {
            b.text("b");
        });
    });
    assert_eq!(
        diff_html(&one, &two, &DiffOptions::default()),
        r#"<p>a</p><p class="vdd-added">b</p>"#
    );
    assert_eq!(
        diff_html(&two, &one, &DiffOptions::default()),
        r#"<p>a</p><p class="vdd-removed">b</p>"#
    );
    assert_contains_both(&one, &two, &DiffOptions::default());
    assert_contains_both(&two, &one, &DiffOptions::default());
}

#[test]
fn test_changed_element_keeps_both_copies() {
    let old = para("a");
    let new = doc(|b| {
        b.element("h1", |b| {
            b.text("a");
        });
    });
    assert_eq!(
        diff_html(&old, &new, &DiffOptions::default()),
        r#"<p class="vdd-removed">a</p><h1 class="vdd-added">a</h1>"#
    );
    assert_contains_both(&old, &new, &DiffOptions::default());
}

#[test]
fn test_attribute_change_marks_element_modified() {
    let old = doc(|b| {
        b.element_with("p", &[("class", "a")], |b| {
            b.text("x");
        });
    });
    let new = doc(|b| {
        b.element_with("p", &[("class", "b")], |b| {
            b.text("x");
        });
    });
    assert_eq!(
        diff_html(&old, &new, &DiffOptions::default()),
        r#"<p class="b vdd-modified">x</p>"#
    );
    assert_eq!(
        diff_html(&old, &new, &DiffOptions::default().skip_modified()),
        r#"<p class="b">x</p>"#
    );
}

#[test]
fn test_removed_formatting_is_modified() {
    let old = doc(|b| {
        b.element("p", |b| {
            b.element("em", |b| {
                b.text("text");
            });
        });
    });
    let new = para("text");
    assert_eq!(
        diff_html(&old, &new, &DiffOptions::default()),
        r#"<p><ins class="vdd-modified">text</ins></p>"#
    );
    assert_eq!(
        diff_html(&old, &new, &DiffOptions::default().skip_modified()),
        "<p>text</p>"
    );
}

#[test]
fn test_added_formatting_is_modified() {
    let old = para("some bold text");
    let new = doc(|b| {
        b.element("p", |b| {
            b.text("some ");
            b.element("strong", |b| {
                b.text("bold");
            });
            b.text(" text");
        });
    });
    assert_eq!(
        diff_html(&old, &new, &DiffOptions::default()),
        r#"<p>some <ins class="vdd-modified"><strong>bold</strong></ins> text</p>"#
    );
    assert_eq!(
        diff_html(&old, &new, &DiffOptions::default().skip_modified()),
        "<p>some <strong>bold</strong> text</p>"
    );

    let diff = diff_documents(&old, &new, &DiffOptions::default()).expect("diff");
    assert_eq!(
        side_view(&diff, &DiffOptions::default(), View::New).to_html(),
        new.to_html()
    );
}

#[test]
fn test_removed_text_keeps_its_formatting() {
    let old = doc(|b| {
        b.element("p", |b| {
            b.text("x ");
            b.element("em", |b| {
                b.text("gone");
            });
        });
    });
    let new = para("x ");
    assert_eq!(
        diff_html(&old, &new, &DiffOptions::default()),
        r#"<p>x <del class="vdd-removed"><em>gone</em></del></p>"#
    );
    assert_contains_both(&old, &new, &DiffOptions::default());
}

#[test]
fn test_embedded_content_is_compared_whole() {
    let image = |src: &'static str| {
        doc(move |b| {
            b.element("p", |b| {
                b.element_with("img", &[("src", src)], |_| {});
            });
        })
    };
    let old = image("a.png");
    let new = image("b.png");
    assert_eq!(
        diff_html(&old, &new, &DiffOptions::default()),
        r#"<p><img src="a.png" class="vdd-removed"><img src="b.png" class="vdd-added"></p>"#
    );
    assert_eq!(
        diff_html(&old, &old, &DiffOptions::default()),
        r#"<p><img src="a.png"></p>"#
    );
    assert_contains_both(&old, &new, &DiffOptions::default());
}

#[test]
fn test_comments_are_ignored() {
    let old = doc(|b| {
        b.element("p", |b| {
            b.text("a");
            b.comment("note");
            b.text("b");
        });
    });
    let new = para("ab");
    assert_eq!(diff_html(&old, &new, &DiffOptions::default()), "<p>ab</p>");
}

#[test]
fn test_custom_classes() {
    let options = DiffOptions::default()
        .with_added_class("plus")
        .with_removed_class("minus")
        .with_modified_class("tilde");
    assert_eq!(
        diff_html(&para("The cat sat"), &para("The dog sat"), &options),
        r#"<p>The <del class="minus">cat</del><ins class="plus">dog</ins> sat</p>"#
    );
    let emphasized = doc(|b| {
        b.element("p", |b| {
            b.element("em", |b| {
                b.text("x");
            });
        });
    });
    assert_eq!(
        diff_html(&emphasized, &para("x"), &options),
        r#"<p><ins class="tilde">x</ins></p>"#
    );
    assert_contains_both(&para("The cat sat"), &para("The dog sat"), &options);
}

#[test]
fn test_custom_formatting_elements() {
    let old = doc(|b| {
        b.element("p", |b| {
            b.element("font", |b| {
                b.text("x");
            });
        });
    });
    let new = para("x");

    assert_eq!(
        diff_html(&old, &new, &DiffOptions::default()),
        r#"<p><font class="vdd-removed">x</font><ins class="vdd-added">x</ins></p>"#
    );

    let options = DiffOptions::default().with_skip_self(|node| node.is_tag("font").then_some(true));
    assert_eq!(
        diff_html(&old, &new, &options),
        r#"<p><ins class="vdd-modified">x</ins></p>"#
    );
}

#[test]
fn test_custom_text_diff() {
    let options = DiffOptions::default()
        .with_diff_text(|old, new| vec![Segment::delete(old), Segment::insert(new)]);
    assert_eq!(
        diff_html(&para("a"), &para("a"), &options),
        r#"<p class="vdd-removed">a</p><p class="vdd-added">a</p>"#
    );
}

#[test]
fn test_inconsistent_text_diff_is_an_error() {
    setup();
    let options = DiffOptions::default().with_diff_text(|_, _| Vec::new());
    let err = diff_documents(&para("a"), &para("a"), &options).unwrap_err();
    assert!(matches!(err, DiffError::DiffExhausted { side: "old" }), "{err:?}");
    assert!(err.to_string().starts_with("unreachable state"));

    let options = DiffOptions::default().with_diff_text(|old, _| vec![Segment::equal(old)]);
    let err = diff_documents(&para("a"), &para("ab"), &options).unwrap_err();
    assert!(matches!(err, DiffError::DiffExhausted { side: "new" }), "{err:?}");
}

#[test]
fn test_diff_subtrees() {
    setup();
    let old = doc(|b| {
        b.element("div", |b| {
            b.element("p", |b| {
                b.text("left");
            });
        });
    });
    let new = doc(|b| {
        b.element("p", |b| {
            b.text("right");
        });
    });
    let old_p = old
        .root_ref()
        .first_child()
        .and_then(|div| div.first_child())
        .expect("p");
    let new_p = new.root_ref().first_child().expect("p");

    let diff = visual_dom_diff(old_p, new_p, &DiffOptions::default()).expect("diff");
    let html = diff.to_html();
    assert!(html.starts_with("<p>"), "{html}");
    assert!(!html.contains("div"), "{html}");
}

mod tables {
    use super::*;

    fn table(rows: &[&[&str]]) -> Document {
        doc(|b| {
            b.element("table", |b| {
                b.element("tbody", |b| {
                    for row in rows {
                        b.element("tr", |b| {
                            for cell in row.iter() {
                                b.element("td", |b| {
                                    b.text(cell);
                                });
                            }
                        });
                    }
                });
            });
        })
    }

    #[test]
    fn test_unchanged_table() {
        let t = table(&[&["a", "b"], &["c", "d"]]);
        assert_eq!(diff_html(&t, &t, &DiffOptions::default()), t.to_html());
    }

    #[test]
    fn test_added_column() {
        let old = table(&[&["a", "b"], &["c", "d"]]);
        let new = table(&[&["a", "b", "e"], &["c", "d", "f"]]);
        assert_eq!(
            diff_html(&old, &new, &DiffOptions::default()),
            concat!(
                "<table><tbody>",
                r#"<tr><td>a</td><td>b</td><td class="vdd-added">e</td></tr>"#,
                r#"<tr><td>c</td><td>d</td><td class="vdd-added">f</td></tr>"#,
                "</tbody></table>"
            )
        );
        assert_contains_both(&old, &new, &DiffOptions::default());
    }

    #[test]
    fn test_added_row() {
        let old = table(&[&["a", "b"]]);
        let new = table(&[&["a", "b"], &["c", "d"]]);
        assert_eq!(
            diff_html(&old, &new, &DiffOptions::default()),
            concat!(
                "<table><tbody>",
                "<tr><td>a</td><td>b</td></tr>",
                r#"<tr class="vdd-added"><td>c</td><td>d</td></tr>"#,
                "</tbody></table>"
            )
        );
        assert_contains_both(&old, &new, &DiffOptions::default());
    }

    #[test]
    fn test_ragged_table_is_shown_twice() {
        let old = table(&[&["a", "b"], &["c", "d"]]);
        let new = table(&[&["a", "b"], &["c"]]);
        assert_eq!(
            diff_html(&old, &new, &DiffOptions::default()),
            concat!(
                r#"<table class="vdd-removed"><tbody>"#,
                "<tr><td>a</td><td>b</td></tr><tr><td>c</td><td>d</td></tr>",
                "</tbody></table>",
                r#"<table class="vdd-added"><tbody>"#,
                "<tr><td>a</td><td>b</td></tr><tr><td>c</td></tr>",
                "</tbody></table>"
            )
        );
        assert_contains_both(&old, &new, &DiffOptions::default());
    }

    #[test]
    fn test_spanning_cells_are_shown_twice() {
        let old = table(&[&["a", "b"]]);
        let new = doc(|b| {
            b.element("table", |b| {
                b.element("tbody", |b| {
                    b.element("tr", |b| {
                        b.element_with("td", &[("colspan", "2")], |b| {
                            b.text("ab");
                        });
                    });
                });
            });
        });
        let html = diff_html(&old, &new, &DiffOptions::default());
        assert!(html.starts_with(r#"<table class="vdd-removed">"#), "{html}");
        assert!(html.contains(r#"<table class="vdd-added">"#), "{html}");
        assert_contains_both(&old, &new, &DiffOptions::default());
    }

    #[test]
    fn test_cell_text_change_stays_in_cell() {
        let old = table(&[&["a", "old text"]]);
        let new = table(&[&["a", "new text"]]);
        let html = diff_html(&old, &new, &DiffOptions::default());
        assert!(html.starts_with("<table><tbody><tr><td>a</td><td>"), "{html}");
        assert!(html.ends_with(" text</td></tr></tbody></table>"), "{html}");
        assert_contains_both(&old, &new, &DiffOptions::default());
    }

    #[test]
    fn test_last_row_gaining_a_cell_is_shown_twice() {
        let old = table(&[&["a", "b"], &["c", "d"]]);
        let new = table(&[&["a", "b"], &["c", "d", "e"]]);
        assert_eq!(
            diff_html(&old, &new, &DiffOptions::default()),
            concat!(
                r#"<table class="vdd-removed"><tbody>"#,
                "<tr><td>a</td><td>b</td></tr>",
                "<tr><td>c</td><td>d</td></tr>",
                "</tbody></table>",
                r#"<table class="vdd-added"><tbody>"#,
                "<tr><td>a</td><td>b</td></tr>",
                "<tr><td>c</td><td>d</td><td>e</td></tr>",
                "</tbody></table>"
            )
        );
        assert_contains_both(&old, &new, &DiffOptions::default());
    }

    /// Every node left in the arena is reachable from the root.
    #[track_caller]
    fn assert_no_stray_nodes(old: &Document, new: &Document) {
        let diff = diff_documents(old, new, &DiffOptions::default()).expect("diff should succeed");
        let live = diff.arena.iter().filter(|node| !node.is_removed()).count();
        let reachable = DomIterator::new(diff.root_ref(), Everything).count();
        assert_eq!(live, reachable, "stray nodes in {}", diff.to_html());
    }

    #[test]
    fn test_rebuilt_rows_leave_no_stray_nodes() {
        let old = table(&[&["a", "b"], &["p", "q"]]);
        let new = table(&[&["a", "b", "z1"], &["p", "z2", "q"]]);
        assert_no_stray_nodes(&old, &new);
    }

    #[test]
    fn test_replaced_tables_leave_no_stray_nodes() {
        let old = table(&[&["a", "b"], &["c", "d"]]);
        let new = table(&[&["a", "b"], &["c", "d", "e"]]);
        assert_no_stray_nodes(&old, &new);
    }

    #[test]
    fn test_cell_diffs_leave_no_stray_nodes() {
        let old = table(&[&["a", "old text"], &["c", "d"]]);
        let new = table(&[&["a", "new text", "x"], &["c", "y", "d"]]);
        assert_no_stray_nodes(&old, &new);
    }
}

#![no_main]

//! Diffs two arbitrary trees.
//!
//! The diff must never fail, and dropping removed content from it must
//! give back the new tree.

use libfuzzer_sys::fuzz_target;
use redline::{DiffOptions, diff_documents};
use redline_fuzz::{FuzzNode, build, new_view};

fuzz_target!(|input: (Vec<FuzzNode>, Vec<FuzzNode>)| {
    let old = build(&input.0);
    let new = build(&input.1);
    let options = DiffOptions::default();

    let diff = match diff_documents(&old, &new, &options) {
        Ok(diff) => diff,
        Err(e) => panic!(
            "diff failed: {e}\nOld: {}\nNew: {}",
            old.to_html(),
            new.to_html()
        ),
    };

    assert_eq!(
        new_view(&diff, &options).to_html(),
        new.to_html(),
        "New view differs!\nOld: {}\nNew: {}\nDiff: {}",
        old.to_html(),
        new.to_html(),
        diff.to_html()
    );
});

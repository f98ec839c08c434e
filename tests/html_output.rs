// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//    http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::fs;

use md5::{Digest, Md5};
use regex::Regex;

use diff_report::{output_html, output_html_directory, Difference, Limits};

fn render(difference: &Difference, limits: &Limits) -> String {
    let mut out = Vec::new();
    output_html(difference, limits, None, &mut out).expect("render failed");
    String::from_utf8(out).expect("non-utf8 output")
}

fn diff_node(unified_diff: &str) -> Difference {
    Difference::new("a", "b").with_unified_diff(unified_diff)
}

fn row_classes(html: &str) -> Vec<String> {
    Regex::new(r#"<tr class=['"]diff(\w+)['"]>"#)
        .unwrap()
        .captures_iter(html)
        .map(|c| c[1].to_string())
        .collect()
}

fn diff_rows(html: &str) -> Vec<String> {
    // every non-chrome row of a diff table, in document order
    Regex::new(r#"(?s)<tr class=['"]diff\w+['"]>.*?</tr>"#)
        .unwrap()
        .find_iter(html)
        .map(|m| m.as_str().to_string())
        .collect()
}

#[test]
fn whole_line_change_is_aligned() {
    let diff = "--- a\n+++ b\n@@ -1,1 +1,1 @@\n-hello\n+world\n";
    let html = render(&diff_node(diff), &Limits::default());

    assert_eq!(row_classes(&html), ["hunk", "changed"]);
    assert!(html.contains("<del>"));
    assert!(html.contains("<ins>"));
    // the shared character stays unmarked between two marked runs
    assert!(html.contains("<del>hel</del>l<del>o</del>"));
    assert!(html.contains("<ins>wor</ins>l<ins>d</ins>"));
}

#[test]
fn context_lines_frame_the_change() {
    let diff = "--- a\n+++ b\n@@ -1,3 +1,3 @@\n foo\n-bar\n+baz\n qux\n";
    let html = render(&diff_node(diff), &Limits::default());

    assert_eq!(
        row_classes(&html),
        ["hunk", "unmodified", "changed", "unmodified"]
    );
    assert!(html.contains("ba<del>r</del>"));
    assert!(html.contains("ba<ins>z</ins>"));
}

#[test]
fn removal_placeholder_consumes_five_lines() {
    let diff = "--- a\n+++ b\n@@ -1,6 +1,1 @@\n-[ 5 lines removed ]\n same\n";
    let html = render(&diff_node(diff), &Limits::default());

    assert_eq!(row_classes(&html), ["hunk", "deleted", "unmodified"]);
    // line1 has advanced past the five elided lines
    assert!(html.contains("<td class=\"diffline\">6 </td>"));
}

#[test]
fn block_limit_truncates_but_the_document_survives() {
    let limits = Limits {
        max_diff_block_lines: 2,
        ..Limits::default()
    };
    let diff = "--- a\n+++ b\n@@ -1,4 +1,4 @@\n one\n two\n three\n four\n";
    let html = render(&diff_node(diff), &limits);

    // exactly two diff rows, then the error row
    assert_eq!(row_classes(&html).len(), 2);
    assert!(html.contains("<tr class='error'>"));
    assert!(html.contains("Max diff block lines reached;"));
    assert!(html.contains("bytes"));
    // the outer document still closes properly
    assert!(html.contains("<div class=\"footer\">"));
    assert!(html.trim_end().ends_with("</html>"));
}

#[test]
fn print_limit_cuts_the_report_short() {
    let limits = Limits {
        max_report_size: 4096,
        ..Limits::default()
    };
    let mut tree = Difference::new("top", "top");
    for i in 0..50 {
        tree.push_detail(Difference::new(&format!("child {}", i), "other"));
    }
    let html = render(&tree, &limits);

    assert!(html.contains("<div class='error'>Max output size reached.</div>"));
    assert!(html.trim_end().ends_with("</html>"));
    // every framed container opened on the way down was force-closed
    assert!(html.matches("<div class='difference'>").count() <= html.matches("</div>").count());
    assert!(html.matches("<div class='difference'>").count() >= 1);
}

#[test]
fn directory_mode_rotates_into_companion_pages() {
    let dir = tempfile::tempdir().expect("tempdir");
    let limits = Limits {
        max_diff_block_lines_parent: 1,
        ..Limits::default()
    };
    let diff = "--- a\n+++ b\n@@ -1,3 +1,3 @@\n-one\n+uno\n two\n three\n";
    let difference = diff_node(diff);
    output_html_directory(
        dir.path(),
        &difference,
        &limits,
        None,
        Some("disable"),
    )
    .expect("directory render failed");

    let mainname = hex::encode(Md5::digest(diff.as_bytes()));
    let parent = fs::read_to_string(dir.path().join("index.html")).expect("missing index.html");
    let child_name = format!("{}-1.html", mainname);
    let child = fs::read_to_string(dir.path().join(&child_name)).expect("missing child page");

    // the parent holds one row, then hands over to the child
    assert_eq!(row_classes(&parent).len(), 1);
    assert!(parent.contains("<tr class=\"ondemand\">"));
    assert!(parent.contains(&child_name));
    assert!(parent.contains("load diff (1 piece)"));
    assert!(!parent.contains(", truncated"));

    // the child is a complete document carrying the remaining rows
    assert!(child.starts_with("<!DOCTYPE html>"));
    assert!(child.trim_end().ends_with("</html>"));
    assert!(!row_classes(&child).is_empty());
    assert!(!child.contains("<tr class=\"ondemand\">"));
}

#[test]
fn rotation_preserves_the_row_sequence() {
    let diff = "--- a\n+++ b\n@@ -1,6 +1,6 @@\n one\n-two\n+zwei\n three\n four\n five\n six\n";
    let difference = diff_node(diff);

    let plain = render(&difference, &Limits::default());
    let expected = diff_rows(&plain);

    let dir = tempfile::tempdir().expect("tempdir");
    let limits = Limits {
        max_diff_block_lines_parent: 2,
        max_report_child_size: 400,
        ..Limits::default()
    };
    output_html_directory(dir.path(), &difference, &limits, None, Some("disable"))
        .expect("directory render failed");

    let mainname = hex::encode(Md5::digest(diff.as_bytes()));
    let mut rotated = Vec::new();
    rotated.extend(diff_rows(
        &fs::read_to_string(dir.path().join("index.html")).expect("missing index.html"),
    ));
    let mut page = 1;
    loop {
        let path = dir.path().join(format!("{}-{}.html", mainname, page));
        match fs::read_to_string(&path) {
            Ok(content) => rotated.extend(diff_rows(&content)),
            Err(_) => break,
        }
        page += 1;
    }
    assert!(page > 2, "expected at least two companion pages");
    assert_eq!(rotated, expected);
}

#[test]
fn internal_linenos_suppress_the_number_columns() {
    let diff = "--- a\n+++ b\n@@ -1,2 +1,2 @@\n 10 same\n-20 old\n+20 new\n";
    let difference = Difference::new("a", "b")
        .with_unified_diff(diff)
        .with_internal_linenos();
    let html = render(&difference, &Limits::default());

    assert!(!html.contains("diffline"));
    for row in diff_rows(&html) {
        if row.contains("diffpresent") {
            assert!(row.contains("<td colspan=\"2\" class=\"diffpresent\">"));
        }
    }
}

#[test]
fn sentinels_never_reach_the_output() {
    let diff = "--- a\n+++ b\n@@ -1,2 +1,2 @@\n-ctl\u{1}chars\u{2}here\n+ctl chars there\n \u{1}\u{2}\n";
    let html = render(&diff_node(diff), &Limits::default());
    assert!(!html.contains('\u{1}'));
    assert!(!html.contains('\u{2}'));
}

#[test]
fn headers_comments_and_anchors_are_emitted() {
    let mut tree = Difference::new("archive.deb", "archive.deb");
    let mut inner = Difference::new("data.tar", "data.tar.gz")
        .with_comment("compression <differs>")
        .with_unified_diff("--- a\n+++ b\n@@ -1,1 +1,1 @@\n-x\n+y\n");
    inner.push_detail(Difference::new("member", "member"));
    tree.push_detail(inner);
    let html = render(&tree, &Limits::default());

    // equal sources render one heading, distinct sources render both
    assert!(html.contains("<div><span class='source'>archive.deb</span>"));
    assert!(html.contains("<div><span class='source'>data.tar</span> vs.</div>"));
    assert!(html.contains("<div><span class='source'>data.tar.gz</span>"));
    // comments are escaped and shown
    assert!(html.contains("<div class='comment'>compression &lt;differs&gt;</div>"));
    // anchors join the ancestor labels, excluding the root
    assert!(html.contains("href='#data.tar'"));
    assert!(html.contains("name='data.tar/member'"));
    // framing stays balanced
    assert_eq!(html.matches("<div").count(), html.matches("</div>").count());
    assert_eq!(html.matches("<table").count(), html.matches("</table>").count());
}

#[test]
fn empty_and_absent_diffs_render_no_table() {
    let html = render(&Difference::new("a", "b"), &Limits::default());
    assert!(!html.contains("<table"));

    let html = render(&Difference::new("a", "b").with_unified_diff(""), &Limits::default());
    assert!(!html.contains("<table"));
}

#[test]
fn single_file_mode_names_no_companions() {
    let diff = "--- a\n+++ b\n@@ -1,1 +1,1 @@\n-x\n+y\n";
    let html = render(&diff_node(diff), &Limits::default());
    assert!(!html.contains("ondemand"));
    assert!(!html.contains("load diff"));
}

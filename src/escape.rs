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

//! Sanitizing and HTML conversion of raw diff text.

use crate::{DIFFOFF, DIFFON, LINESIZE, TABSIZE, WORDBREAK};

/// Replace every control character other than tab and newline with `.`.
///
/// This runs before the aligner, so the alignment sentinels (themselves C0
/// controls) can never occur in text the aligner sees.
pub fn sane(s: &str) -> String {
    s.chars()
        .map(|c| {
            if c != '\t' && c != '\n' && (c as u32) < 32 {
                '.'
            } else {
                c
            }
        })
        .collect()
}

fn push_escaped(c: char, out: &mut String) {
    match c {
        '&' => out.push_str("&amp;"),
        '<' => out.push_str("&lt;"),
        '>' => out.push_str("&gt;"),
        '"' => out.push_str("&quot;"),
        '\'' => out.push_str("&#x27;"),
        _ => out.push(c),
    }
}

/// HTML-escape a whole string.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        push_escaped(c, &mut out);
    }
    out
}

/// Convert one cell's text to an HTML-safe fragment.
///
/// The alignment sentinels become `<tag>`/`</tag>` pairs. With `ponct` set,
/// whitespace is visualized: tabs pad to the next tab stop behind a
/// guillemet, spaces become centered dots, newlines break the line behind a
/// backslash sign. Remaining control characters render as `<em>\xNN</em>`.
/// A zero-width space is inserted after every word-break character and
/// whenever a run grows [`LINESIZE`] columns without one, so the
/// fixed-layout table can wrap anywhere.
pub fn convert(s: &str, ponct: bool, tag: &str) -> String {
    let mut i = 0;
    let mut t = String::with_capacity(s.len());
    for c in s.chars() {
        if c == DIFFON {
            t.push('<');
            t.push_str(tag);
            t.push('>');
        } else if c == DIFFOFF {
            t.push_str("</");
            t.push_str(tag);
            t.push('>');
        } else if c == '\t' && ponct {
            let mut n = TABSIZE - (i % TABSIZE);
            if n == 0 {
                n = TABSIZE;
            }
            t.push_str("<span class=\"diffponct\">\u{bb}</span>");
            for _ in 0..n - 1 {
                t.push('\u{a0}');
            }
        } else if c == ' ' && ponct {
            t.push_str("<span class=\"diffponct\">\u{b7}</span>");
        } else if c == '\n' && ponct {
            t.push_str("<br/><span class=\"diffponct\">\\</span>");
        } else if (c as u32) < 32 {
            let conv = format!("\\x{:x}", c as u32);
            t.push_str("<em>");
            t.push_str(&conv);
            t.push_str("</em>");
            i += conv.len();
        } else {
            push_escaped(c, &mut t);
            i += 1;
        }

        if WORDBREAK.contains(c) {
            t.push('\u{200b}');
            i = 0;
        }
        if i > LINESIZE {
            i = 0;
            t.push('\u{200b}');
        }
    }
    t
}

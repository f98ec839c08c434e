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

//! Streaming scanner over a unified-diff body driving the paginated table
//! renderer.

use log::debug;
use regex::{Captures, Regex};

use crate::align::line_diff;
use crate::config::Limits;
use crate::escape::{convert, escape};
use crate::report;
use crate::sink::{Printer, RenderError, RotationParams, RowSink};
use crate::MAX_LINE_SIZE;

//@@ -l,s +l,s @@ optional section heading
//
//The hunk range is of the format l,s where l is the starting line number
//and s is the number of lines the change hunk applies to for each
//respective file. In many versions of GNU diff, each range can omit the
//comma and trailing value s, in which case s defaults to 1.
//
//Upstream tooling additionally synthesizes two line shapes ordinary diffs
//never contain: full-width annotations in square brackets, and
//`[ N lines removed ]` placeholders standing in for N elided lines on one
//side of a hunk.

struct LineMatcher {
    hunk_data_cre: Regex,
    added_removal_cre: Regex,
    deleted_removal_cre: Regex,
    removal_cre: Regex,
}

impl LineMatcher {
    fn new() -> Self {
        LineMatcher {
            hunk_data_cre: Regex::new(r"^@@ -(\d+)(?:,(\d+))? \+(\d+)(?:,(\d+))?").unwrap(),
            added_removal_cre: Regex::new(r"^\+\[ (\d+) lines removed \]$").unwrap(),
            deleted_removal_cre: Regex::new(r"^-\[ (\d+) lines removed \]$").unwrap(),
            removal_cre: Regex::new(r"^\[ (\d+) lines removed \]$").unwrap(),
        }
    }
}

fn capture_count(captures: &Captures, index: usize) -> Option<usize> {
    match captures.get(index) {
        Some(m) => m.as_str().parse().ok(),
        // the ,size field defaults to 1 when absent
        None => Some(1),
    }
}

fn truncate_line(s: &str) -> String {
    if s.chars().count() > MAX_LINE_SIZE {
        let mut cut: String = s.chars().take(MAX_LINE_SIZE).collect();
        cut.push_str(" \u{2702}");
        cut
    } else {
        s.to_string()
    }
}

/// Rendering state for one unified-diff body. Created on entry to
/// [`output_unified_diff`] and torn down on exit, so nothing leaks across
/// top-level calls.
struct DiffTable<'a, 'w> {
    sink: RowSink<'a, 'w>,
    matcher: LineMatcher,
    has_internal_linenos: bool,
    line1: usize,
    line2: usize,
    hunk_off1: usize,
    hunk_size1: i64,
    hunk_off2: usize,
    hunk_size2: i64,
    add_cpt: usize,
    del_cpt: usize,
    buf: Vec<(Option<String>, Option<String>)>,
    bytes_processed: usize,
}

impl<'a, 'w> DiffTable<'a, 'w> {
    fn new(sink: RowSink<'a, 'w>, has_internal_linenos: bool) -> Self {
        DiffTable {
            sink,
            matcher: LineMatcher::new(),
            has_internal_linenos,
            line1: 0,
            line2: 0,
            hunk_off1: 0,
            hunk_size1: 0,
            hunk_off2: 0,
            hunk_size2: 0,
            add_cpt: 0,
            del_cpt: 0,
            buf: Vec::new(),
            bytes_processed: 0,
        }
    }

    fn scan(&mut self, unified_diff: &str) -> Result<(), RenderError> {
        for l in unified_diff.split_terminator('\n') {
            self.bytes_processed += l.len() + 1;

            if l.starts_with("--- ") || l.starts_with("+++ ") {
                self.empty_buffer()?;
                continue;
            }

            if let Some(captures) = self.matcher.hunk_data_cre.captures(l) {
                self.empty_buffer()?;
                let counts = (
                    capture_count(&captures, 1),
                    capture_count(&captures, 2),
                    capture_count(&captures, 3),
                    capture_count(&captures, 4),
                );
                if let (Some(off1), Some(size1), Some(off2), Some(size2)) = counts {
                    self.hunk_off1 = off1;
                    self.hunk_size1 = size1 as i64;
                    self.hunk_off2 = off2;
                    self.hunk_size2 = size2 as i64;
                    self.line1 = off1;
                    self.line2 = off2;
                    self.output_hunk()?;
                }
                continue;
            }

            if l.starts_with('[') {
                self.empty_buffer()?;
                self.sink
                    .print(&format!("<tr><td colspan=\"4\">{}</td></tr>\n", escape(l)))?;
                continue;
            }

            if l.starts_with("\\ No newline") {
                // annotate the side whose hunk is already consumed; a diff
                // that leads with this line has nothing to annotate
                if let Some(last) = self.buf.last_mut() {
                    let message = &l[2..];
                    let side = if self.hunk_size2 == 0 {
                        last.1.as_mut()
                    } else {
                        last.0.as_mut()
                    };
                    if let Some(text) = side {
                        text.push('\n');
                        text.push_str(message);
                    }
                }
                continue;
            }

            if self.hunk_size1 <= 0 && self.hunk_size2 <= 0 {
                self.empty_buffer()?;
                continue;
            }

            if l.starts_with('+') {
                let n = self
                    .matcher
                    .added_removal_cre
                    .captures(l)
                    .and_then(|c| c[1].parse::<usize>().ok())
                    .unwrap_or(1);
                self.add_cpt += n;
                self.hunk_size2 -= n as i64;
                self.buf.push((None, Some(l[1..].to_string())));
                continue;
            }

            if l.starts_with('-') {
                let n = self
                    .matcher
                    .deleted_removal_cre
                    .captures(l)
                    .and_then(|c| c[1].parse::<usize>().ok())
                    .unwrap_or(1);
                self.del_cpt += n;
                self.hunk_size1 -= n as i64;
                self.buf.push((Some(l[1..].to_string()), None));
                continue;
            }

            if l.starts_with(' ') && self.hunk_size1 > 0 && self.hunk_size2 > 0 {
                self.empty_buffer()?;
                self.hunk_size1 -= 1;
                self.hunk_size2 -= 1;
                self.buf
                    .push((Some(l[1..].to_string()), Some(l[1..].to_string())));
                continue;
            }

            // anything else is noise; the scanner is forgiving
            self.empty_buffer()?;
        }
        self.empty_buffer()
    }

    /// Drain the pending pair buffer. Pure runs come out as-is; a mixed
    /// run is compressed by pairing the deleted side against the added
    /// side index by index.
    fn empty_buffer(&mut self) -> Result<(), RenderError> {
        let buf = std::mem::take(&mut self.buf);
        if self.del_cpt == 0 || self.add_cpt == 0 {
            for (left, right) in &buf {
                self.output_line(left.as_deref(), right.as_deref())?;
            }
        } else {
            let lefts: Vec<&str> = buf.iter().filter_map(|pair| pair.0.as_deref()).collect();
            let rights: Vec<&str> = buf.iter().filter_map(|pair| pair.1.as_deref()).collect();
            for i in 0..lefts.len().max(rights.len()) {
                let left = lefts.get(i).copied().unwrap_or("");
                let right = rights.get(i).copied().unwrap_or("");
                self.output_line(Some(left), Some(right))?;
            }
        }
        self.add_cpt = 0;
        self.del_cpt = 0;
        Ok(())
    }

    fn output_hunk(&mut self) -> Result<(), RenderError> {
        self.sink.print(&format!(
            "<tr class=\"diffhunk\"><td colspan=\"2\">Offset {}, {} lines modified</td>",
            self.hunk_off1, self.hunk_size1
        ))?;
        self.sink.print(&format!(
            "<td colspan=\"2\">Offset {}, {} lines modified</td></tr>\n",
            self.hunk_off2, self.hunk_size2
        ))?;
        self.sink.row_was_output()
    }

    fn output_line(&mut self, s1: Option<&str>, s2: Option<&str>) -> Result<(), RenderError> {
        let cell1 = s1.map(truncate_line);
        let cell2 = s2.map(truncate_line);
        let blank1 = cell1.as_deref().map_or(true, str::is_empty);
        let blank2 = cell2.as_deref().map_or(true, str::is_empty);

        let (class, cell1, cell2) = if blank1 || blank2 {
            let class = if (s1.is_none() && s2.is_none()) || (s1 == Some("") && s2 == Some("")) {
                "unmodified"
            } else if blank1 {
                "added"
            } else {
                "deleted"
            };
            (class, cell1, cell2)
        } else {
            let left = cell1.unwrap_or_default();
            let right = cell2.unwrap_or_default();
            if s1 == s2
                && !left.ends_with("lines removed ]")
                && !right.ends_with("lines removed ]")
            {
                ("unmodified", Some(left), Some(right))
            } else {
                let (left, right) = line_diff(&left, &right);
                ("changed", Some(left), Some(right))
            }
        };

        self.sink.print(&format!("<tr class=\"diff{}\">", class))?;
        let cells = self.output_cells(cell1.as_deref(), cell2.as_deref());
        self.sink.print_forced("</tr>\n")?;
        self.sink.row_was_output()?;
        cells?;

        self.advance_line_numbers(s1, s2);
        Ok(())
    }

    fn output_cells(&mut self, s1: Option<&str>, s2: Option<&str>) -> Result<(), RenderError> {
        match s1 {
            Some(s) if !s.is_empty() => {
                if self.has_internal_linenos {
                    self.sink.print("<td colspan=\"2\" class=\"diffpresent\">")?;
                } else {
                    self.sink
                        .print(&format!("<td class=\"diffline\">{} </td>", self.line1))?;
                    self.sink.print("<td class=\"diffpresent\">")?;
                }
                self.sink.print(&convert(s, true, "del"))?;
                self.sink.print("</td>")?;
            }
            _ => self.sink.print("<td colspan=\"2\">\u{a0}</td>")?,
        }
        match s2 {
            Some(s) if !s.is_empty() => {
                if self.has_internal_linenos {
                    self.sink.print("<td colspan=\"2\" class=\"diffpresent\">")?;
                } else {
                    self.sink
                        .print(&format!("<td class=\"diffline\">{} </td>", self.line2))?;
                    self.sink.print("<td class=\"diffpresent\">")?;
                }
                self.sink.print(&convert(s, true, "ins"))?;
                self.sink.print("</td>")?;
            }
            _ => self.sink.print("<td colspan=\"2\">\u{a0}</td>")?,
        }
        Ok(())
    }

    /// Advance per the untruncated side texts: one line per real side, N
    /// lines per `[ N lines removed ]` placeholder.
    fn advance_line_numbers(&mut self, orig1: Option<&str>, orig2: Option<&str>) {
        if let Some(orig) = orig1 {
            if let Some(captures) = self.matcher.removal_cre.captures(orig) {
                self.line1 += captures[1].parse::<usize>().unwrap_or(1);
            } else if !orig.is_empty() {
                self.line1 += 1;
            }
        }
        if let Some(orig) = orig2 {
            if let Some(captures) = self.matcher.removal_cre.captures(orig) {
                self.line2 += captures[1].parse::<usize>().unwrap_or(1);
            } else if !orig.is_empty() {
                self.line2 += 1;
            }
        }
    }
}

/// Render one unified-diff body as a table on `printer`, rotating into
/// companion pages when `rotation` is given. Row-budget exhaustion is
/// absorbed here; byte-budget exhaustion propagates after the table has
/// been closed.
pub(crate) fn output_unified_diff(
    printer: &mut Printer<'_>,
    limits: &Limits,
    rotation: Option<RotationParams<'_>>,
    unified_diff: &str,
    has_internal_linenos: bool,
) -> Result<(), RenderError> {
    let mainname = rotation.as_ref().map(|r| r.mainname().to_string());

    let (pages, truncated) = {
        let sink = RowSink::new(printer, rotation, limits);
        let mut table = DiffTable::new(sink, has_internal_linenos);
        table.sink.print(report::UD_TABLE_HEADER)?;

        let truncated = match table.scan(unified_diff) {
            Ok(()) => false,
            Err(RenderError::BlockLimit) => {
                let total = unified_diff.len();
                let left = total.saturating_sub(table.bytes_processed);
                let frac = if total == 0 {
                    0.0
                } else {
                    left as f64 / total as f64
                };
                table.sink.print_forced(&format!(
                    "<tr class='error'><td colspan='4'>Max diff block lines reached; \
                     {}/{} bytes ({:.2}%) of diff not shown.</td></tr>",
                    left,
                    total,
                    frac * 100.0
                ))?;
                true
            }
            Err(RenderError::PrintLimit) => {
                // children have no byte budget, so this fired on the parent
                debug_assert!(!table.sink.in_child());
                debug!("print limit hit inside diff table");
                table.sink.print_forced(
                    "<tr class='error'><td colspan='4'>Max output size reached.</td></tr>",
                )?;
                table.sink.print_forced("</table>")?;
                table.sink.close_child()?;
                return Err(RenderError::PrintLimit);
            }
            Err(err) => {
                // stream failure: still try to balance the open table
                let _ = table.sink.print_forced("</table>");
                let _ = table.sink.close_child();
                return Err(err);
            }
        };

        table.sink.print_forced("</table>")?;
        (table.sink.finish()?, truncated)
    };

    if pages > 0 {
        if let Some(mainname) = mainname {
            let noun = if pages > 1 { "pieces" } else { "piece" };
            let text = format!(
                "load diff ({} {}{})",
                pages,
                noun,
                if truncated { ", truncated" } else { "" }
            );
            printer.print_forced(&report::ud_table_footer(&format!("{}-1.html", mainname), &text))?;
        }
    }
    Ok(())
}

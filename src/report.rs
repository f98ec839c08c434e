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

//! The outer document: page chrome, the depth-first walk of the difference
//! tree, and the two public drivers.

use std::env;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use log::{debug, warn};

use crate::config::Limits;
use crate::difference::Difference;
use crate::escape::escape;
use crate::sink::{Printer, RenderError, RotationParams};
use crate::unified_diff::output_unified_diff;

const VERSION: &str = env!("CARGO_PKG_VERSION");

// 16x16 transparent PNG, served inline so reports work from file://
const FAVICON_BASE64: &str = "iVBORw0KGgoAAAANSUhEUgAAABAAAAAQCAYAAAAf8/9hAAAAFElEQVR4\
2mNkYPhfz0AEYBxVSF+FAP5FDvcfRYWgAAAAAElFTkSuQmCC";

const STYLE: &str = "
    body {
      background: white;
      color: black;
    }
    .footer {
      font-size: small;
    }
    .difference {
      border: outset #888 1px;
      background-color:rgba(0,0,0,.1);
      padding: 0.5em;
      margin: 0.5em 0;
    }
    .difference table {
      table-layout: fixed;
      width: 100%;
      border: 0;
    }
    .difference th,
    .difference td {
      border: 0;
    }
    table.diff {
      border: 0px;
      border-collapse:collapse;
      font-size:0.75em;
      font-family: Lucida Console, monospace;
    }
    table.diff tr:hover td {
      background: #FFFF00;
    }
    td.line {
      color:#8080a0
    }
    th {
      background: black;
      color: white
    }
    tr.diffunmodified td {
      background: #D0D0E0
    }
    tr.diffhunk td {
      background: #A0A0A0
    }
    tr.diffadded td {
      background: #CCFFCC
    }
    tr.diffdeleted td {
      background: #FFCCCC
    }
    tr.diffchanged td {
      background: #FFFFA0
    }
    ins, del {
      background: #E0C880;
      text-decoration: none
    }
    span.diffponct {
      color: #B08080
    }
    .comment {
      font-style: italic;
    }
    .source {
      font-weight: bold;
    }
    .error {
      border: solid black 1px;
      background: red;
      color: white;
      padding: 0.2em;
    }
    .anchor {
      margin-left: 0.5em;
      font-size: 80%;
      color: #333;
      text-decoration: none;
      display: none;
    }
    .diffheader:hover .anchor {
      display: inline;
    }
    table.diff tr.ondemand td {
      background: #f99;
      text-align: center;
      padding: 0.5em 0;
    }
    table.diff tr.ondemand:hover td {
      background: #faa;
      cursor: pointer;
    }
";

const ON_DEMAND_JS: &str = r#"$(function() {
  var load_cont = function() {
    var a = $(this).find("a");
    var textparts = /^(.*)\((\d+) pieces?(.*)\)$/.exec(a.text());
    var numleft = Number.parseInt(textparts[2]) - 1;
    var noun = numleft == 1 ? "piece" : "pieces";
    var newtext = textparts[1] + "(" + numleft + " " + noun + textparts[3] + ")";
    var filename = a.attr('href');
    var td = a.parent();
    td.text('... loading ...');
    td.parent().load(filename + " tr", function() {
        var elems = $(this).children(':first').unwrap();
        // set this behaviour for the next link too
        var td = elems.parent().find(".ondemand td");
        td.find("a").text(newtext);
        td.on('click', load_cont);
    });
    return false;
  };
  $(".ondemand td").on('click', load_cont);
});
"#;

pub(crate) const UD_TABLE_HEADER: &str = "<table class=\"diff\">\n\
<colgroup><col style=\"width: 3em;\"/><col style=\"99%\"/>\n\
<col style=\"width: 3em;\"/><col style=\"99%\"/></colgroup>\n";

pub(crate) fn ud_table_footer(filename: &str, text: &str) -> String {
    format!(
        "<tr class=\"ondemand\"><td colspan=\"4\">\n\
         ... <a href=\"{}\">{}</a> ...\n\
         </td></tr>\n\
         </table>\n",
        escape(filename),
        text
    )
}

pub(crate) fn page_header(css_url: Option<&str>) -> String {
    let title: Vec<String> = env::args().collect();
    let css_link = match css_url {
        Some(url) => format!(
            "<link href=\"{}\" type=\"text/css\" rel=\"stylesheet\" />",
            escape(url)
        ),
        None => String::new(),
    };
    format!(
        "<!DOCTYPE html>\n\
         <html>\n\
         <head>\n\
         \x20 <meta charset=\"utf-8\" />\n\
         \x20 <meta name=\"generator\" content=\"diff_report\" />\n\
         \x20 <link rel=\"icon\" type=\"image/png\" href=\"data:image/png;base64,{}\" />\n\
         \x20 <title>{}</title>\n\
         \x20 <style>{}</style>\n\
         \x20 {}\n\
         </head>\n\
         <body>\n",
        FAVICON_BASE64,
        escape(&title.join(" ")),
        STYLE,
        css_link
    )
}

pub(crate) fn page_footer() -> String {
    format!(
        "\n<div class=\"footer\">Generated by diff_report {}</div>\n</body>\n</html>\n",
        VERSION
    )
}

fn on_demand_script(jquery_url: &str) -> String {
    format!(
        "\n<script src=\"{}\"></script>\n\
         <script type=\"text/javascript\">\n{}</script>\n",
        escape(jquery_url),
        ON_DEMAND_JS
    )
}

/// Render one node and its details, keeping the framed container balanced
/// on every exit path.
fn output_difference(
    difference: &Difference,
    printer: &mut Printer<'_>,
    limits: &Limits,
    css_url: Option<&str>,
    directory: Option<&Path>,
    parents: &[String],
) -> Result<(), RenderError> {
    debug!("html output for {}", difference.source1());
    let mut sources = parents.to_vec();
    sources.push(difference.source1().to_string());

    printer.print("<div class='difference'>")?;
    let body = output_difference_body(difference, printer, limits, css_url, directory, &sources);
    let closed = printer.print_forced("</div>");
    body.and(closed)
}

fn output_difference_body(
    difference: &Difference,
    printer: &mut Printer<'_>,
    limits: &Limits,
    css_url: Option<&str>,
    directory: Option<&Path>,
    sources: &[String],
) -> Result<(), RenderError> {
    printer.print("<div class='diffheader'>")?;
    if difference.source1() == difference.source2() {
        printer.print(&format!(
            "<div><span class='source'>{}</span>",
            escape(difference.source1())
        ))?;
    } else {
        printer.print(&format!(
            "<div><span class='source'>{}</span> vs.</div>",
            escape(difference.source1())
        ))?;
        printer.print(&format!(
            "<div><span class='source'>{}</span>",
            escape(difference.source2())
        ))?;
    }
    let anchor = escape(&sources[1..].join("/"));
    printer.print(&format!(
        " <a class='anchor' href='#{}' name='{}'>\u{b6}</a>",
        anchor, anchor
    ))?;
    printer.print("</div>")?;

    if !difference.comments().is_empty() {
        let comments: Vec<String> = difference.comments().iter().map(|c| escape(c)).collect();
        printer.print(&format!(
            "<div class='comment'>{}</div>",
            comments.join("<br />")
        ))?;
    }
    printer.print("</div>")?;

    if let Some(unified_diff) = difference.unified_diff() {
        if !unified_diff.is_empty() {
            let rotation = directory.map(|d| RotationParams::new(d, unified_diff, css_url));
            output_unified_diff(
                printer,
                limits,
                rotation,
                unified_diff,
                difference.has_internal_linenos(),
            )?;
        }
    }

    for detail in difference.details() {
        output_difference(detail, printer, limits, css_url, directory, sources)?;
    }
    Ok(())
}

fn output_document(
    difference: &Difference,
    printer: &mut Printer<'_>,
    limits: &Limits,
    css_url: Option<&str>,
    directory: Option<&Path>,
) -> Result<(), RenderError> {
    let body = printer
        .print(&page_header(css_url))
        .and_then(|_| output_difference(difference, printer, limits, css_url, directory, &[]));
    match body {
        Ok(()) => Ok(()),
        Err(RenderError::PrintLimit) => {
            debug!("print limit reached");
            printer.print_forced("<div class='error'>Max output size reached.</div>")
        }
        Err(err) => Err(err),
    }
}

/// Render the whole tree as one self-contained HTML document.
pub fn output_html<W: Write>(
    difference: &Difference,
    limits: &Limits,
    css_url: Option<&str>,
    out: &mut W,
) -> Result<(), RenderError> {
    let mut printer = Printer::new(out, limits.max_report_size);
    output_document(difference, &mut printer, limits, css_url, None)?;
    printer.print_forced(&page_footer())?;
    Ok(())
}

const JQUERY_SYSTEM_LOCATIONS: &[&str] = &["/usr/share/javascript/jquery/jquery.js"];

fn resolve_jquery(directory: &Path, jquery_url: Option<&str>) -> io::Result<Option<String>> {
    match jquery_url {
        Some("disable") => return Ok(None),
        Some(url) => return Ok(Some(url.to_string())),
        None => {}
    }
    let symlink = directory.join("jquery.js");
    if symlink.exists() {
        return Ok(Some("./jquery.js".to_string()));
    }
    if symlink.symlink_metadata().is_ok() {
        // dangling link left over from an earlier run
        fs::remove_file(&symlink)?;
    }
    for location in JQUERY_SYSTEM_LOCATIONS {
        if Path::new(location).exists() {
            #[cfg(unix)]
            std::os::unix::fs::symlink(location, &symlink)?;
            #[cfg(not(unix))]
            fs::copy(location, &symlink)?;
            return Ok(Some("./jquery.js".to_string()));
        }
    }
    warn!("jQuery was not found in any known location; disabling on-demand inline loading");
    debug!("locations searched: {}", JQUERY_SYSTEM_LOCATIONS.join(", "));
    Ok(None)
}

/// Render the tree into `directory` as `index.html`, rotating oversized
/// diff tables into companion files loaded on demand.
///
/// jQuery powers the lazy loading: pass a URL, pass the literal `"disable"`
/// to omit the script, or pass `None` to have a system copy symlinked next
/// to the report (so the result can still be shared over HTTP).
pub fn output_html_directory(
    directory: &Path,
    difference: &Difference,
    limits: &Limits,
    css_url: Option<&str>,
    jquery_url: Option<&str>,
) -> Result<(), RenderError> {
    if !directory.exists() {
        fs::create_dir_all(directory)?;
    }
    let jquery_url = resolve_jquery(directory, jquery_url)?;

    let file = File::create(directory.join("index.html"))?;
    let mut out = BufWriter::new(file);
    let mut printer = Printer::new(&mut out, limits.max_report_size);
    output_document(difference, &mut printer, limits, css_url, Some(directory))?;
    if let Some(url) = &jquery_url {
        printer.print_forced(&on_demand_script(url))?;
    }
    printer.print_forced(&page_footer())?;
    drop(printer);
    out.flush()?;
    Ok(())
}

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

//! Render a tree of textual differences into a navigable HTML report.
//!
//! The input is a [`Difference`] tree: every node carries a pair of source
//! labels, optional comments, an optional unified-diff body and nested
//! sub-differences. [`output_html`] writes a single self-contained document;
//! [`output_html_directory`] additionally rotates oversized diff tables into
//! numbered companion pages that a small client script loads on demand.

pub mod align;
pub mod config;
pub mod difference;
pub mod escape;
pub mod report;
pub mod sink;
pub mod unified_diff;

/// We add a zero-width break opportunity every LINESIZE columns so that very
/// long tokens still wrap inside the fixed-layout table.
pub const LINESIZE: usize = 20;

/// Longest rendered cell content; anything beyond this is cut and marked
/// with a scissors sign.
pub const MAX_LINE_SIZE: usize = 1024;

/// Tab stop width used when visualizing tab characters.
pub const TABSIZE: usize = 8;

/// Characters we're willing to word wrap on.
pub const WORDBREAK: &str = " \t;.,/):-";

/// In-band sentinel opening a differing character run.
///
/// Both sentinels come from the C0 control range and are reserved: the
/// sanitizer turns every control character into `.` before the aligner
/// runs, so they can never collide with user text. They exist only between
/// [`align::line_diff`] and [`escape::convert`], which converts them into
/// tag pairs; the rendered document never contains them.
pub const DIFFON: char = '\u{1}';

/// In-band sentinel closing a differing character run.
pub const DIFFOFF: char = '\u{2}';

pub use crate::config::Limits;
pub use crate::difference::Difference;
pub use crate::report::{output_html, output_html_directory};
pub use crate::sink::RenderError;

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

/// Size budgets enforced while a report is written.
///
/// The byte budget and the row budget operate independently: the former
/// bounds the primary page as a whole, the latter bounds each diff table.
/// In directory mode the row budget is softened by rotation — see
/// [`crate::sink::RowSink`].
#[derive(Debug, Clone, PartialEq)]
pub struct Limits {
    /// Bytes the primary page may hold before the render is cut short.
    pub max_report_size: usize,
    /// Bytes one companion page may hold before rotating to the next one.
    pub max_report_child_size: usize,
    /// Hard row cap for one diff table when no output directory is
    /// configured.
    pub max_diff_block_lines: usize,
    /// Rows kept on the parent page before rotation starts.
    pub max_diff_block_lines_parent: usize,
    /// Multiplier on `max_diff_block_lines` giving the hard row cap in
    /// directory mode.
    pub max_diff_block_lines_html_dir_ratio: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            max_report_size: 2 * 1024 * 1024,
            max_report_child_size: 500 * 1024,
            max_diff_block_lines: 1024,
            max_diff_block_lines_parent: 50,
            max_diff_block_lines_html_dir_ratio: 4,
        }
    }
}

impl Limits {
    /// The hard row cap when rotation is available.
    pub(crate) fn max_lines_rotated(&self) -> usize {
        self.max_diff_block_lines_html_dir_ratio * self.max_diff_block_lines
    }
}

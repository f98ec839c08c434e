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

//! Character-level alignment of two single-line strings.

use crate::escape::sane;
use crate::{DIFFOFF, DIFFON};

/// Align `s` against `t`, wrapping every character that is not part of a
/// maximal shared subsequence in the [`DIFFON`]/[`DIFFOFF`] sentinels.
///
/// Classic edit-distance dynamic program with unit cost for insert, delete
/// and substitute, followed by a back-pointer walk from the far corner.
/// Equal-cost predecessors are resolved diagonal first, then vertical, then
/// horizontal. Adjacent close/open sentinel pairs are collapsed so marked
/// runs come out contiguous.
pub fn line_diff(s: &str, t: &str) -> (String, String) {
    let s: Vec<char> = sane(s).chars().collect();
    let t: Vec<char> = sane(t).chars().collect();
    let m = s.len();
    let n = t.len();

    // each cell holds the cost and the predecessor it was reached from
    let mut d = vec![vec![(0usize, (0usize, 0usize)); n + 1]; m + 1];
    for i in 1..=m {
        d[i][0] = (i, (i - 1, 0));
    }
    for j in 1..=n {
        d[0][j] = (j, (0, j - 1));
    }
    for i in 1..=m {
        for j in 1..=n {
            let cost = if s[i - 1] == t[j - 1] { 0 } else { 1 };
            let diagonal = d[i - 1][j - 1].0 + cost;
            let vertical = d[i - 1][j].0 + 1;
            let horizontal = d[i][j - 1].0 + 1;
            d[i][j] = if diagonal <= vertical && diagonal <= horizontal {
                (diagonal, (i - 1, j - 1))
            } else if vertical <= horizontal {
                (vertical, (i - 1, j))
            } else {
                (horizontal, (i, j - 1))
            };
        }
    }

    let mut path = Vec::with_capacity(m + n);
    let mut coord = (m, n);
    while coord != (0, 0) {
        path.push(coord);
        coord = d[coord.0][coord.1].1;
    }
    path.reverse();

    let mut l1 = String::new();
    let mut l2 = String::new();
    for (cx, cy) in path {
        let (cost, (fx, fy)) = d[cx][cy];
        let step = (cx - fx, cy - fy);
        if step == (0, 1) {
            // insertion into t
            l2.push(DIFFON);
            l2.push(t[fy]);
            l2.push(DIFFOFF);
        } else if step == (1, 0) {
            // deletion from s
            l1.push(DIFFON);
            l1.push(s[fx]);
            l1.push(DIFFOFF);
        } else if cost - d[fx][fy].0 == 1 {
            // substitution
            l1.push(DIFFON);
            l1.push(s[fx]);
            l1.push(DIFFOFF);
            l2.push(DIFFON);
            l2.push(t[fy]);
            l2.push(DIFFOFF);
        } else {
            l1.push(s[fx]);
            l2.push(t[fy]);
        }
    }

    let seam: String = [DIFFOFF, DIFFON].iter().collect();
    (l1.replace(&seam, ""), l2.replace(&seam, ""))
}

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

/// One node of the difference tree handed to the presenter.
///
/// `source1 == source2` is the equal-sources case and renders as a single
/// heading. `details` nest arbitrarily deep and are rendered depth-first in
/// order.
#[derive(Debug, Clone, Default)]
pub struct Difference {
    source1: String,
    source2: String,
    comments: Vec<String>,
    unified_diff: Option<String>,
    has_internal_linenos: bool,
    details: Vec<Difference>,
}

impl Difference {
    pub fn new(source1: &str, source2: &str) -> Difference {
        Difference {
            source1: source1.to_string(),
            source2: source2.to_string(),
            ..Difference::default()
        }
    }

    /// Attach a unified-diff body describing how `source1` and `source2`
    /// differ.
    pub fn with_unified_diff(mut self, unified_diff: &str) -> Difference {
        self.unified_diff = Some(unified_diff.to_string());
        self
    }

    /// Append a comment line shown below the heading.
    pub fn with_comment(mut self, comment: &str) -> Difference {
        self.comments.push(comment.to_string());
        self
    }

    /// Mark the diff body as carrying its own line numbers, which
    /// suppresses the numeric columns of the rendered table.
    pub fn with_internal_linenos(mut self) -> Difference {
        self.has_internal_linenos = true;
        self
    }

    pub fn push_detail(&mut self, detail: Difference) {
        self.details.push(detail);
    }

    pub fn source1(&self) -> &str {
        &self.source1
    }

    pub fn source2(&self) -> &str {
        &self.source2
    }

    pub fn comments(&self) -> &[String] {
        &self.comments
    }

    pub fn unified_diff(&self) -> Option<&str> {
        self.unified_diff.as_deref()
    }

    pub fn has_internal_linenos(&self) -> bool {
        self.has_internal_linenos
    }

    pub fn details(&self) -> &[Difference] {
        &self.details
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_round_trip() {
        let mut difference = Difference::new("a", "b")
            .with_unified_diff("@@ -1 +1 @@\n-x\n+y\n")
            .with_comment("format: ELF");
        difference.push_detail(Difference::new("a/sub", "b/sub").with_internal_linenos());

        assert_eq!(difference.source1(), "a");
        assert_eq!(difference.source2(), "b");
        assert_eq!(difference.comments(), ["format: ELF"]);
        assert!(difference.unified_diff().is_some());
        assert!(!difference.has_internal_linenos());
        assert_eq!(difference.details().len(), 1);
        assert!(difference.details()[0].has_internal_linenos());
    }
}

//! Word-level differ.
//!
//! Text is tokenized into maximal runs of whitespace and of non-whitespace,
//! and the two token streams are aligned by longest common subsequence.
//! Joining `Keep` and `Insert` operations reproduces the new text; joining
//! `Keep` and `Delete` operations reproduces the old text.
//!
//! # Example
//!
//! ```
//! use docx_refine::diff::{diff_words, EditOp};
//!
//! let script = diff_words("The cat sat.", "The black cat sat.");
//! assert_eq!(
//!     script.ops(),
//!     &[
//!         EditOp::Keep("The "),
//!         EditOp::Insert("black "),
//!         EditOp::Keep("cat sat."),
//!     ]
//! );
//! ```

use std::ops::Range;
use std::sync::OnceLock;

use regex::Regex;

fn token_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+|\S+").expect("token pattern is valid"))
}

/// Byte ranges of the word and whitespace tokens of `text`.
pub fn token_spans(text: &str) -> Vec<Range<usize>> {
    token_pattern().find_iter(text).map(|m| m.range()).collect()
}

/// Split text into word and whitespace tokens.
pub fn tokenize(text: &str) -> Vec<&str> {
    token_pattern().find_iter(text).map(|m| m.as_str()).collect()
}

/// One step of an edit script. Adjacent tokens of the same kind are joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOp<'a> {
    /// Text present in both versions
    Keep(&'a str),
    /// Text only in the old version
    Delete(&'a str),
    /// Text only in the new version
    Insert(&'a str),
}

impl<'a> EditOp<'a> {
    /// The text this operation covers.
    pub fn text(&self) -> &'a str {
        match self {
            EditOp::Keep(text) | EditOp::Delete(text) | EditOp::Insert(text) => text,
        }
    }
}

/// A region of an edit script, as byte ranges into the old and new text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Hunk {
    /// Unchanged text
    Equal {
        /// Range in the old text
        old: Range<usize>,
        /// Range in the new text
        new: Range<usize>,
    },
    /// Old text replaced by new text (either side may be empty)
    Change {
        /// Range in the old text
        old: Range<usize>,
        /// Range in the new text
        new: Range<usize>,
    },
}

/// Ordered edit operations turning one text into another.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditScript<'a> {
    ops: Vec<EditOp<'a>>,
}

impl<'a> EditScript<'a> {
    /// The operations in order.
    pub fn ops(&self) -> &[EditOp<'a>] {
        &self.ops
    }

    /// Iterate over the operations.
    pub fn iter(&self) -> impl Iterator<Item = &EditOp<'a>> {
        self.ops.iter()
    }

    /// Whether the two texts were identical.
    pub fn is_identity(&self) -> bool {
        self.ops.iter().all(|op| matches!(op, EditOp::Keep(_)))
    }

    /// The old text, rebuilt from `Keep` and `Delete`.
    pub fn old_text(&self) -> String {
        self.ops
            .iter()
            .filter(|op| !matches!(op, EditOp::Insert(_)))
            .map(EditOp::text)
            .collect()
    }

    /// The new text, rebuilt from `Keep` and `Insert`.
    pub fn new_text(&self) -> String {
        self.ops
            .iter()
            .filter(|op| !matches!(op, EditOp::Delete(_)))
            .map(EditOp::text)
            .collect()
    }

    /// Number of inserted words (whitespace tokens not counted).
    pub fn inserted_words(&self) -> usize {
        self.count_words(|op| matches!(op, EditOp::Insert(_)))
    }

    /// Number of deleted words (whitespace tokens not counted).
    pub fn deleted_words(&self) -> usize {
        self.count_words(|op| matches!(op, EditOp::Delete(_)))
    }

    /// Group the script into equal and changed regions.
    ///
    /// Every `Delete`/`Insert` stretch between two `Keep`s becomes one
    /// [`Hunk::Change`].
    pub fn hunks(&self) -> Vec<Hunk> {
        let mut hunks = Vec::new();
        let mut old_pos = 0;
        let mut new_pos = 0;
        let mut change: Option<(usize, usize)> = None;

        for op in &self.ops {
            let len = op.text().len();
            match op {
                EditOp::Keep(_) => {
                    if let Some((old_start, new_start)) = change.take() {
                        hunks.push(Hunk::Change {
                            old: old_start..old_pos,
                            new: new_start..new_pos,
                        });
                    }
                    hunks.push(Hunk::Equal {
                        old: old_pos..old_pos + len,
                        new: new_pos..new_pos + len,
                    });
                    old_pos += len;
                    new_pos += len;
                }
                EditOp::Delete(_) => {
                    change.get_or_insert((old_pos, new_pos));
                    old_pos += len;
                }
                EditOp::Insert(_) => {
                    change.get_or_insert((old_pos, new_pos));
                    new_pos += len;
                }
            }
        }
        if let Some((old_start, new_start)) = change {
            hunks.push(Hunk::Change {
                old: old_start..old_pos,
                new: new_start..new_pos,
            });
        }
        hunks
    }

    fn count_words<F>(&self, pred: F) -> usize
    where
        F: Fn(&EditOp<'a>) -> bool,
    {
        self.ops
            .iter()
            .filter(|op| pred(op))
            .flat_map(|op| tokenize(op.text()))
            .filter(|token| !token.chars().all(char::is_whitespace))
            .count()
    }
}

impl<'a> IntoIterator for EditScript<'a> {
    type Item = EditOp<'a>;
    type IntoIter = std::vec::IntoIter<EditOp<'a>>;

    fn into_iter(self) -> Self::IntoIter {
        self.ops.into_iter()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Keep,
    Delete,
    Insert,
}

/// Compute a word-level edit script from `old` to `new`.
///
/// Among equally long alignments, matching tokens are taken as early as
/// possible, so the unchanged prefix is as long as it can be. Within a
/// changed region deletions come before insertions.
pub fn diff_words<'a>(old: &'a str, new: &'a str) -> EditScript<'a> {
    let a = token_spans(old);
    let b = token_spans(new);
    let tok_a = |i: usize| &old[a[i].clone()];
    let tok_b = |j: usize| &new[b[j].clone()];

    let mut prefix = 0;
    while prefix < a.len() && prefix < b.len() && tok_a(prefix) == tok_b(prefix) {
        prefix += 1;
    }
    let mut suffix = 0;
    while suffix < a.len() - prefix
        && suffix < b.len() - prefix
        && tok_a(a.len() - 1 - suffix) == tok_b(b.len() - 1 - suffix)
    {
        suffix += 1;
    }

    let n = a.len() - prefix - suffix;
    let m = b.len() - prefix - suffix;

    // lcs[i * (m + 1) + j]: LCS length of old[prefix + i..] and new[prefix + j..]
    // within the middle section.
    let width = m + 1;
    let mut lcs = vec![0u32; (n + 1) * width];
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            lcs[i * width + j] = if tok_a(prefix + i) == tok_b(prefix + j) {
                lcs[(i + 1) * width + j + 1] + 1
            } else {
                lcs[(i + 1) * width + j].max(lcs[i * width + j + 1])
            };
        }
    }

    let mut steps = Vec::with_capacity(a.len() + b.len());
    steps.extend(std::iter::repeat(Step::Keep).take(prefix));

    let (mut i, mut j) = (0, 0);
    while i < n && j < m {
        if tok_a(prefix + i) == tok_b(prefix + j) {
            steps.push(Step::Keep);
            i += 1;
            j += 1;
        } else if lcs[(i + 1) * width + j] >= lcs[i * width + j + 1] {
            steps.push(Step::Delete);
            i += 1;
        } else {
            steps.push(Step::Insert);
            j += 1;
        }
    }
    steps.extend(std::iter::repeat(Step::Delete).take(n - i));
    steps.extend(std::iter::repeat(Step::Insert).take(m - j));
    steps.extend(std::iter::repeat(Step::Keep).take(suffix));

    build_script(old, new, &a, &b, &steps)
}

/// Turn per-token steps into joined operations, deletions first in each
/// changed region.
fn build_script<'a>(
    old: &'a str,
    new: &'a str,
    a: &[Range<usize>],
    b: &[Range<usize>],
    steps: &[Step],
) -> EditScript<'a> {
    let mut ops = Vec::new();
    let (mut i, mut j) = (0, 0);
    let mut k = 0;

    while k < steps.len() {
        if steps[k] == Step::Keep {
            let start = k;
            while k < steps.len() && steps[k] == Step::Keep {
                k += 1;
            }
            let count = k - start;
            ops.push(EditOp::Keep(&old[a[i].start..a[i + count - 1].end]));
            i += count;
            j += count;
            continue;
        }

        let (mut deleted, mut inserted) = (0, 0);
        while k < steps.len() && steps[k] != Step::Keep {
            match steps[k] {
                Step::Delete => deleted += 1,
                _ => inserted += 1,
            }
            k += 1;
        }
        if deleted > 0 {
            ops.push(EditOp::Delete(&old[a[i].start..a[i + deleted - 1].end]));
            i += deleted;
        }
        if inserted > 0 {
            ops.push(EditOp::Insert(&new[b[j].start..b[j + inserted - 1].end]));
            j += inserted;
        }
    }

    EditScript { ops }
}

//! Change ledger: what happened to each paragraph.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::model::StoryKind;

/// Outcome for one paragraph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParagraphStatus {
    /// Text identical; element left as it was
    Unchanged,
    /// Runs rewritten to carry the amended text
    Modified,
    /// Left as it was because it cannot be rewritten safely
    Skipped,
}

impl std::fmt::Display for ParagraphStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ParagraphStatus::Unchanged => "unchanged",
            ParagraphStatus::Modified => "modified",
            ParagraphStatus::Skipped => "skipped",
        };
        f.write_str(name)
    }
}

/// Original and amended text of a paragraph that differed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextChange {
    /// Text before refinement
    pub original: String,
    /// Text after refinement (or the amended text that was not applied)
    pub amended: String,
}

/// Ledger record for one paragraph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Story part the paragraph belongs to
    pub story: StoryKind,

    /// Paragraph index within the story part
    pub index: usize,

    /// What happened
    pub status: ParagraphStatus,

    /// Formatting of inserted text was guessed and should be checked by hand
    #[serde(default)]
    pub needs_review: bool,

    /// Recovered condition, worded as the error it stands for
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,

    /// Inserted word count
    #[serde(default)]
    pub inserted_words: usize,

    /// Deleted word count
    #[serde(default)]
    pub deleted_words: usize,

    /// The texts, when they differ
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change: Option<TextChange>,
}

impl LedgerEntry {
    fn new(story: StoryKind, index: usize, status: ParagraphStatus) -> Self {
        Self {
            story,
            index,
            status,
            needs_review: false,
            note: None,
            inserted_words: 0,
            deleted_words: 0,
            change: None,
        }
    }

    /// A paragraph whose text did not change.
    pub fn unchanged(story: StoryKind, index: usize) -> Self {
        Self::new(story, index, ParagraphStatus::Unchanged)
    }

    /// A rewritten paragraph.
    pub fn modified(story: StoryKind, index: usize, change: TextChange) -> Self {
        let mut entry = Self::new(story, index, ParagraphStatus::Modified);
        entry.change = Some(change);
        entry
    }

    /// A paragraph left alone because of `reason`.
    pub fn skipped(story: StoryKind, index: usize, reason: &Error) -> Self {
        let mut entry = Self::new(story, index, ParagraphStatus::Skipped);
        entry.note = Some(reason.to_string());
        entry
    }

    /// Set word counts.
    pub fn with_word_counts(mut self, inserted: usize, deleted: usize) -> Self {
        self.inserted_words = inserted;
        self.deleted_words = deleted;
        self
    }

    /// Record the texts.
    pub fn with_change(mut self, change: TextChange) -> Self {
        self.change = Some(change);
        self
    }

    /// Flag for manual review with the recovered condition.
    pub fn flag_for_review(mut self, reason: &Error) -> Self {
        self.needs_review = true;
        self.note = Some(reason.to_string());
        self
    }
}

/// Totals over a ledger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSummary {
    /// Paragraphs visited
    pub total: usize,
    /// Paragraphs left unchanged
    pub unchanged: usize,
    /// Paragraphs rewritten
    pub modified: usize,
    /// Paragraphs skipped
    pub skipped: usize,
    /// Paragraphs flagged for review
    pub needs_review: usize,
    /// Words inserted
    pub inserted_words: usize,
    /// Words deleted
    pub deleted_words: usize,
}

/// Per-paragraph record of a refinement, in document order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeLedger {
    /// When the refinement ran
    pub created_at: DateTime<Utc>,

    /// Whether changed text was marked
    pub markup: bool,

    /// One entry per visited paragraph
    pub entries: Vec<LedgerEntry>,
}

impl ChangeLedger {
    /// Create an empty ledger.
    pub fn new(markup: bool) -> Self {
        Self {
            created_at: Utc::now(),
            markup,
            entries: Vec::new(),
        }
    }

    /// Append an entry.
    pub fn push(&mut self, entry: LedgerEntry) {
        self.entries.push(entry);
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the ledger has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries with a given status.
    pub fn with_status(&self, status: ParagraphStatus) -> impl Iterator<Item = &LedgerEntry> {
        self.entries.iter().filter(move |e| e.status == status)
    }

    /// Entries flagged for manual review.
    pub fn needs_review(&self) -> impl Iterator<Item = &LedgerEntry> {
        self.entries.iter().filter(|e| e.needs_review)
    }

    /// Entries for one story part.
    pub fn story(&self, story: StoryKind) -> impl Iterator<Item = &LedgerEntry> {
        self.entries.iter().filter(move |e| e.story == story)
    }

    /// Entry for a paragraph.
    pub fn get(&self, story: StoryKind, index: usize) -> Option<&LedgerEntry> {
        self.entries
            .iter()
            .find(|e| e.story == story && e.index == index)
    }

    /// Whether any paragraph was rewritten.
    pub fn has_changes(&self) -> bool {
        self.entries
            .iter()
            .any(|e| e.status == ParagraphStatus::Modified)
    }

    /// Totals.
    pub fn summary(&self) -> LedgerSummary {
        let mut summary = LedgerSummary {
            total: self.entries.len(),
            ..Default::default()
        };
        for entry in &self.entries {
            match entry.status {
                ParagraphStatus::Unchanged => summary.unchanged += 1,
                ParagraphStatus::Modified => summary.modified += 1,
                ParagraphStatus::Skipped => summary.skipped += 1,
            }
            if entry.needs_review {
                summary.needs_review += 1;
            }
            summary.inserted_words += entry.inserted_words;
            summary.deleted_words += entry.deleted_words;
        }
        summary
    }
}

impl Default for ChangeLedger {
    fn default() -> Self {
        Self::new(true)
    }
}

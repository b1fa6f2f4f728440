//! Refinement options and configuration.

use serde::{Deserialize, Serialize};

use crate::model::AmendmentMarker;

/// Options for refining a document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefineOptions {
    /// Mark inserted or changed text with the amendment marker
    pub markup: bool,

    /// Formatting layered on marked runs
    pub marker: AmendmentMarker,

    /// Also refine footnotes and endnotes (DOCX amended input only)
    pub include_notes: bool,

    /// What to do with paragraphs holding hyperlinks, fields or text boxes
    pub complex_policy: ComplexParagraphPolicy,
}

impl RefineOptions {
    /// Create new refine options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable markup of changed text.
    pub fn with_markup(mut self, markup: bool) -> Self {
        self.markup = markup;
        self
    }

    /// Produce a clean document with no markup.
    pub fn clean(mut self) -> Self {
        self.markup = false;
        self
    }

    /// Set the amendment marker.
    pub fn with_marker(mut self, marker: AmendmentMarker) -> Self {
        self.marker = marker;
        self
    }

    /// Set the highlight color of the amendment marker.
    pub fn with_highlight(mut self, color: impl Into<String>) -> Self {
        self.marker = self.marker.with_highlight(color);
        self
    }

    /// Enable or disable footnote and endnote refinement.
    pub fn with_notes(mut self, include: bool) -> Self {
        self.include_notes = include;
        self
    }

    /// Set the complex paragraph policy.
    pub fn with_complex_policy(mut self, policy: ComplexParagraphPolicy) -> Self {
        self.complex_policy = policy;
        self
    }

    /// The marker to apply, if markup is enabled.
    pub fn active_marker(&self) -> Option<&AmendmentMarker> {
        self.markup.then_some(&self.marker)
    }
}

impl Default for RefineOptions {
    fn default() -> Self {
        Self {
            markup: true,
            marker: AmendmentMarker::default(),
            include_notes: false,
            complex_policy: ComplexParagraphPolicy::Skip,
        }
    }
}

/// Handling of paragraphs that cannot be rewritten run-by-run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComplexParagraphPolicy {
    /// Leave the paragraph untouched and record it as skipped
    #[default]
    Skip,
    /// Replace the paragraph's runs with the amended text, styled like its
    /// first text run. Hyperlinks and fields in it are lost.
    Replace,
}

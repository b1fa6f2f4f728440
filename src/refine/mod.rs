//! Document refinement: carry amended wording into the original document.
//!
//! The pipeline per story part is extract, align, diff and rewrite. All
//! parts are extracted (and their paragraph counts checked) before any
//! part is touched, and the output file is only written once every part
//! has been processed, so a failure leaves no output behind.

mod align;
mod ledger;
mod options;
mod rewrite;

pub use align::{align, Action, ParagraphPair};
pub use ledger::{ChangeLedger, LedgerEntry, LedgerSummary, ParagraphStatus, TextChange};
pub use options::{ComplexParagraphPolicy, RefineOptions};
pub use rewrite::{RewrittenParagraph, RunRewriter};

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{DocxDocument, StoryKind};
use crate::parser::{self, DocxPackage, Extraction};
use crate::render::{self, JsonFormat};

/// Where the amended wording comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AmendedSource {
    /// A DOCX with the same paragraph structure
    Docx(PathBuf),
    /// UTF-8 text, paragraphs separated by blank lines
    Text(PathBuf),
}

impl AmendedSource {
    /// Amended DOCX file.
    pub fn docx(path: impl Into<PathBuf>) -> Self {
        AmendedSource::Docx(path.into())
    }

    /// Amended text file.
    pub fn text(path: impl Into<PathBuf>) -> Self {
        AmendedSource::Text(path.into())
    }

    /// The file path.
    pub fn path(&self) -> &Path {
        match self {
            AmendedSource::Docx(path) | AmendedSource::Text(path) => path,
        }
    }

    /// Read the amended input.
    pub fn load(&self) -> Result<Amended> {
        match self {
            AmendedSource::Docx(path) => DocxPackage::open(path).map(Amended::Docx),
            AmendedSource::Text(path) => parser::read_paragraphs(path).map(Amended::Paragraphs),
        }
    }
}

/// Amended input held in memory.
#[derive(Debug, Clone)]
pub enum Amended {
    /// An amended DOCX package
    Docx(DocxPackage),
    /// Amended body paragraphs
    Paragraphs(Vec<String>),
}

impl Amended {
    /// Amended DOCX from bytes.
    pub fn from_docx_bytes(data: Vec<u8>) -> Result<Self> {
        DocxPackage::from_bytes(data).map(Amended::Docx)
    }

    /// Amended body text, paragraphs separated by blank lines.
    pub fn from_text(text: &str) -> Self {
        Amended::Paragraphs(parser::split_paragraphs(text))
    }

    fn story_texts(&self, kind: StoryKind) -> Result<Option<Vec<String>>> {
        match self {
            Amended::Docx(package) => Ok(package
                .story(kind)?
                .map(|doc| doc.paragraph_texts())),
            Amended::Paragraphs(paragraphs) if kind == StoryKind::Body => {
                Ok(Some(paragraphs.clone()))
            }
            Amended::Paragraphs(_) => Ok(None),
        }
    }
}

/// Outcome of refining a document to a file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefineReport {
    /// The written document
    pub output: PathBuf,

    /// Where the ledger JSON was written, if it was
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ledger_file: Option<PathBuf>,

    /// Package parts that were rewritten; every other part is copied as is
    pub replaced_parts: Vec<String>,

    /// Per-paragraph record
    pub ledger: ChangeLedger,
}

impl RefineReport {
    /// Ledger totals.
    pub fn summary(&self) -> LedgerSummary {
        self.ledger.summary()
    }
}

/// Refines documents with a fixed set of options.
///
/// # Example
///
/// ```no_run
/// use docx_refine::{AmendedSource, RefineOptions, Refiner};
///
/// let refiner = Refiner::new(RefineOptions::new().with_highlight("green"));
/// let report = refiner.refine(
///     "contract.docx",
///     &AmendedSource::text("contract-amended.txt"),
///     "contract-refined.docx",
/// )?;
/// println!("{} paragraphs modified", report.summary().modified);
/// # Ok::<(), docx_refine::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Refiner {
    options: RefineOptions,
}

impl Refiner {
    /// Create a refiner.
    pub fn new(options: RefineOptions) -> Self {
        Self { options }
    }

    /// The options in use.
    pub fn options(&self) -> &RefineOptions {
        &self.options
    }

    /// Refine `original` with `amended` and write the result to `out`.
    ///
    /// The original is only read. `out` must differ from both inputs and
    /// its directory must exist.
    pub fn refine<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        original: P,
        amended: &AmendedSource,
        out: Q,
    ) -> Result<RefineReport> {
        self.refine_to(original.as_ref(), amended, out.as_ref(), None)
    }

    /// Like [`Refiner::refine`], and also write the change ledger as JSON.
    ///
    /// `ledger` must differ from the inputs and from `out`. Both files are
    /// staged first and moved into place only after both are complete.
    pub fn refine_with_ledger<P: AsRef<Path>, Q: AsRef<Path>, R: AsRef<Path>>(
        &self,
        original: P,
        amended: &AmendedSource,
        out: Q,
        ledger: R,
        format: JsonFormat,
    ) -> Result<RefineReport> {
        self.refine_to(
            original.as_ref(),
            amended,
            out.as_ref(),
            Some((ledger.as_ref(), format)),
        )
    }

    fn refine_to(
        &self,
        original: &Path,
        amended: &AmendedSource,
        out: &Path,
        ledger_file: Option<(&Path, JsonFormat)>,
    ) -> Result<RefineReport> {
        let inputs = [(original, "original document"), (amended.path(), "amended input")];
        validate_output(&inputs, out)?;
        if let Some((path, _)) = ledger_file {
            validate_output(&inputs, path)?;
            validate_output(&[(out, "output document")], path)?;
        }

        log::info!(
            "Refining {} with {}",
            original.display(),
            amended.path().display()
        );
        let package = DocxPackage::open(original)?;
        let amended = amended.load()?;

        let (replaced, ledger) = self.refine_package(&package, &amended)?;

        let staged_ledger = match ledger_file {
            Some((path, format)) => {
                let json = render::to_json(&ledger, format)?;
                let mut tmp = parser::staging_file(path)?;
                tmp.write_all(json.as_bytes())
                    .map_err(|e| Error::DocumentWrite(format!("{}: {}", path.display(), e)))?;
                Some((tmp, path))
            }
            None => None,
        };
        let staged_output = package.stage_with_parts(out, &replaced)?;

        parser::persist(staged_output, out)?;
        if let Some((tmp, path)) = staged_ledger {
            parser::persist(tmp, path)?;
            log::debug!("Wrote ledger to {}", path.display());
        }

        let mut replaced_parts: Vec<String> = replaced.into_keys().collect();
        replaced_parts.sort();
        Ok(RefineReport {
            output: out.to_path_buf(),
            ledger_file: ledger_file.map(|(path, _)| path.to_path_buf()),
            replaced_parts,
            ledger,
        })
    }

    /// Refine a document held in memory, returning the new package bytes.
    pub fn refine_bytes(
        &self,
        original: Vec<u8>,
        amended: &Amended,
    ) -> Result<(Vec<u8>, ChangeLedger)> {
        let package = DocxPackage::from_bytes(original)?;
        let (replaced, ledger) = self.refine_package(&package, amended)?;
        Ok((package.to_bytes_with_parts(&replaced)?, ledger))
    }

    /// Refine every story part, returning the serialized parts that changed.
    pub fn refine_package(
        &self,
        original: &DocxPackage,
        amended: &Amended,
    ) -> Result<(HashMap<String, Vec<u8>>, ChangeLedger)> {
        let mut stories = Vec::new();
        for kind in self.story_kinds(amended) {
            let Some(doc) = original.story(kind)? else {
                continue;
            };
            let Some(texts) = amended.story_texts(kind)? else {
                log::warn!("{}: no amended counterpart, left unchanged", kind);
                continue;
            };
            let extraction = parser::extract(&doc, texts)?;
            stories.push((doc, extraction));
        }

        let mut ledger = ChangeLedger::new(self.options.markup);
        let mut replaced = HashMap::new();
        for (mut doc, extraction) in stories {
            self.refine_story(&mut doc, &extraction, &mut ledger);
            if doc.is_modified() {
                replaced.insert(doc.kind().part_name().to_string(), doc.to_bytes());
            }
        }

        let summary = ledger.summary();
        log::info!(
            "{} paragraphs: {} modified, {} unchanged, {} skipped, {} flagged for review",
            summary.total,
            summary.modified,
            summary.unchanged,
            summary.skipped,
            summary.needs_review
        );
        Ok((replaced, ledger))
    }

    fn story_kinds(&self, amended: &Amended) -> Vec<StoryKind> {
        match amended {
            Amended::Docx(_) if self.options.include_notes => {
                vec![StoryKind::Body, StoryKind::Footnotes, StoryKind::Endnotes]
            }
            Amended::Paragraphs(_) if self.options.include_notes => {
                log::warn!("Notes cannot be amended from plain text; refining the body only");
                vec![StoryKind::Body]
            }
            _ => vec![StoryKind::Body],
        }
    }

    fn refine_story(
        &self,
        doc: &mut DocxDocument,
        extraction: &Extraction,
        ledger: &mut ChangeLedger,
    ) {
        let kind = extraction.kind;
        let wml = doc.wml().clone();
        let rewriter = RunRewriter::new(&wml, self.options.active_marker());
        let mut replacements = HashMap::new();

        for pair in align(extraction) {
            let index = pair.index();
            let change = || TextChange {
                original: pair.source.text.clone(),
                amended: pair.amended.to_string(),
            };

            let rewritten = match pair.action(self.options.complex_policy) {
                Action::Keep => {
                    ledger.push(LedgerEntry::unchanged(kind, index));
                    continue;
                }
                Action::Skip(reason) => {
                    let err = Error::UnsupportedParagraphContent {
                        index,
                        reason: reason.to_string(),
                    };
                    log::warn!("{}: {}", kind, err);
                    let mut entry = LedgerEntry::skipped(kind, index, &err);
                    if !pair.is_identical() {
                        entry = entry.with_change(change());
                    }
                    ledger.push(entry);
                    continue;
                }
                Action::Rewrite => rewriter.rewrite(pair.source, pair.amended),
                Action::Replace => rewriter.replace(pair.source, pair.amended),
            };

            log::debug!(
                "{}: paragraph {} rewritten (+{} -{} words)",
                kind,
                index,
                rewritten.inserted_words,
                rewritten.deleted_words
            );
            let mut entry = LedgerEntry::modified(kind, index, change())
                .with_word_counts(rewritten.inserted_words, rewritten.deleted_words);
            if let Some(ref failure) = rewritten.inheritance_failure {
                log::warn!("{}: {}", kind, failure);
                entry = entry.flag_for_review(failure);
            }
            ledger.push(entry);
            replacements.insert(index, rewritten.paragraph);
        }

        doc.replace_paragraphs(replacements);
    }
}

/// Check that `out` can be written without touching any of `inputs`.
fn validate_output(inputs: &[(&Path, &str)], out: &Path) -> Result<()> {
    for &(input, role) in inputs {
        if same_file(input, out) {
            return Err(Error::InvalidOutputPath(format!(
                "{} is the {}",
                out.display(),
                role
            )));
        }
    }

    if out.is_dir() {
        return Err(Error::InvalidOutputPath(format!(
            "{} is a directory",
            out.display()
        )));
    }

    let dir = match out.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    if !dir.is_dir() {
        return Err(Error::InvalidOutputPath(format!(
            "directory {} does not exist",
            dir.display()
        )));
    }
    Ok(())
}

fn same_file(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

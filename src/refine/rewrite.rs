//! Style-preserving run rewriter.
//!
//! A paragraph's runs are flattened into atoms: text, tabs and breaks that
//! occupy positions in the paragraph text, and zero-width anchors
//! (footnote references, bookmarks and other non-run children) that sit
//! between positions. The word diff is then replayed over the atoms:
//!
//! - kept text is cut out of the original runs, with their formatting
//! - inserted text becomes a new run styled like its nearest neighbor,
//!   with the amendment marker layered on top
//! - deleted text disappears, but anchors inside it are kept in place
//!
//! Each anchor is emitted exactly once.

use std::ops::Range;

use crate::diff::{diff_words, EditScript, Hunk};
use crate::error::Error;
use crate::model::{
    AmendmentMarker, Element, Node, Paragraph, ParagraphChild, Run, RunContent, RunStyle, Wml,
};
use crate::parser::SourceParagraph;

/// A rewritten paragraph.
#[derive(Debug)]
pub struct RewrittenParagraph {
    /// The new paragraph
    pub paragraph: Paragraph,

    /// Set when inserted text had no run to take its formatting from
    pub inheritance_failure: Option<Error>,

    /// Inserted word count
    pub inserted_words: usize,

    /// Deleted word count
    pub deleted_words: usize,
}

impl RewrittenParagraph {
    /// Whether the formatting of inserted text should be checked by hand.
    pub fn needs_review(&self) -> bool {
        self.inheritance_failure.is_some()
    }
}

#[derive(Debug, Clone, Copy)]
enum AtomItem<'p> {
    Text(&'p str),
    Tab(&'p Element),
    Break(&'p Element),
    Anchor(&'p Element),
    Other(&'p Node),
}

#[derive(Debug, Clone, Copy)]
struct Atom<'p> {
    /// Index of the paragraph child the atom comes from
    child: usize,
    run: Option<&'p Run>,
    start: usize,
    end: usize,
    item: AtomItem<'p>,
}

impl Atom<'_> {
    fn is_textual(&self) -> bool {
        matches!(
            self.item,
            AtomItem::Text(_) | AtomItem::Tab(_) | AtomItem::Break(_)
        )
    }
}

fn atoms(paragraph: &Paragraph) -> Vec<Atom<'_>> {
    let mut out = Vec::new();
    let mut pos = 0;

    for (child, node) in paragraph.children.iter().enumerate() {
        let run = match node {
            ParagraphChild::Run(run) => run,
            ParagraphChild::Other(node) => {
                out.push(Atom {
                    child,
                    run: None,
                    start: pos,
                    end: pos,
                    item: AtomItem::Other(node),
                });
                continue;
            }
        };

        for content in &run.content {
            let (len, item) = match content {
                RunContent::Text(text) => (text.len(), AtomItem::Text(text)),
                RunContent::Tab(el) => (1, AtomItem::Tab(el)),
                RunContent::Break(el) => (1, AtomItem::Break(el)),
                RunContent::Anchor(el) => (0, AtomItem::Anchor(el)),
            };
            out.push(Atom {
                child,
                run: Some(run),
                start: pos,
                end: pos + len,
                item,
            });
            pos += len;
        }
    }
    out
}

/// Run whose formatting inserted text at `pos` should take.
///
/// Searches outward: the run covering the position, then the nearest text
/// run before it, then the nearest text run after it, then any run.
fn context_run<'p>(atoms: &[Atom<'p>], pos: usize) -> Option<&'p Run> {
    let covering = atoms.iter().find(|a| {
        a.run.is_some()
            && ((a.is_textual() && a.start <= pos && pos < a.end)
                || (matches!(a.item, AtomItem::Text(_)) && a.start == pos && a.end == pos))
    });
    let before = || {
        atoms
            .iter()
            .rev()
            .find(|a| a.run.is_some() && a.is_textual() && a.end <= pos)
    };
    let after = || {
        atoms
            .iter()
            .find(|a| a.run.is_some() && a.is_textual() && a.start >= pos)
    };
    let any = || atoms.iter().rev().find(|a| a.run.is_some());

    covering
        .or_else(before)
        .or_else(after)
        .or_else(any)
        .and_then(|a| a.run)
}

/// Output under construction. Consecutive fragments cut from the same
/// source run share one output run.
struct Emitter {
    children: Vec<ParagraphChild>,
    open_child: Option<usize>,
}

impl Emitter {
    fn new() -> Self {
        Self {
            children: Vec::new(),
            open_child: None,
        }
    }

    fn push_fragment(&mut self, atom: &Atom<'_>, item: RunContent) {
        let Some(source) = atom.run else {
            return;
        };
        if self.open_child == Some(atom.child) {
            if let Some(ParagraphChild::Run(run)) = self.children.last_mut() {
                run.content.push(item);
                return;
            }
        }
        let mut run = Run::like(source);
        run.content.push(item);
        self.children.push(ParagraphChild::Run(run));
        self.open_child = Some(atom.child);
    }

    fn push(&mut self, child: ParagraphChild) {
        self.children.push(child);
        self.open_child = None;
    }

    fn close(&mut self) {
        self.open_child = None;
    }
}

/// Rewrites paragraph runs to carry amended text.
#[derive(Debug, Clone, Copy)]
pub struct RunRewriter<'a> {
    wml: &'a Wml,
    marker: Option<&'a AmendmentMarker>,
}

impl<'a> RunRewriter<'a> {
    /// Create a rewriter. With no marker, inserted text is not marked.
    pub fn new(wml: &'a Wml, marker: Option<&'a AmendmentMarker>) -> Self {
        Self { wml, marker }
    }

    /// Apply a word diff from the paragraph's text to `new_text`.
    pub fn rewrite(&self, source: &SourceParagraph, new_text: &str) -> RewrittenParagraph {
        let paragraph = &source.paragraph;
        let atoms = atoms(paragraph);
        let old_text = paragraph.text();
        let script = diff_words(&old_text, new_text);

        let mut emitted = vec![false; atoms.len()];
        let mut out = Emitter::new();
        let mut inheritance_failure = None;

        for hunk in script.hunks() {
            match hunk {
                Hunk::Equal { old, .. } => {
                    self.emit_old(&atoms, old, true, &mut emitted, &mut out);
                }
                Hunk::Change { old, new } => {
                    if !new.is_empty() {
                        let style = match context_run(&atoms, old.start) {
                            Some(run) => run.style.clone(),
                            None => {
                                let (style, failure) = self.fallback_style(source);
                                if inheritance_failure.is_none() {
                                    inheritance_failure = Some(failure);
                                }
                                style
                            }
                        };
                        out.push(ParagraphChild::Run(self.changed_run(&new_text[new], style)));
                    }
                    self.emit_old(&atoms, old, false, &mut emitted, &mut out);
                }
            }
        }

        self.finish(paragraph, out.children, &script, inheritance_failure)
    }

    /// Replace every run with `new_text`, styled like the first text run
    /// anywhere in the paragraph.
    pub fn replace(&self, source: &SourceParagraph, new_text: &str) -> RewrittenParagraph {
        let paragraph = &source.paragraph;
        let script = diff_words(&source.text, new_text);

        let mut inheritance_failure = None;
        let mut children = Vec::new();
        if !new_text.is_empty() {
            let style = match self.first_text_style(paragraph) {
                Some(style) => style,
                None => {
                    let (style, failure) = self.fallback_style(source);
                    inheritance_failure = Some(failure);
                    style
                }
            };
            children.push(ParagraphChild::Run(self.changed_run(new_text, style)));
        }

        self.finish(paragraph, children, &script, inheritance_failure)
    }

    fn finish(
        &self,
        paragraph: &Paragraph,
        children: Vec<ParagraphChild>,
        script: &EditScript<'_>,
        inheritance_failure: Option<Error>,
    ) -> RewrittenParagraph {
        RewrittenParagraph {
            paragraph: Paragraph {
                attributes: paragraph.attributes.clone(),
                properties: paragraph.properties.clone(),
                children,
            },
            inheritance_failure,
            inserted_words: script.inserted_words(),
            deleted_words: script.deleted_words(),
        }
    }

    /// Emit the old content in `range`. Without `include_text` only
    /// anchors are emitted. Anchors on either boundary count as inside.
    fn emit_old(
        &self,
        atoms: &[Atom<'_>],
        range: Range<usize>,
        include_text: bool,
        emitted: &mut [bool],
        out: &mut Emitter,
    ) {
        for (i, atom) in atoms.iter().enumerate() {
            match atom.item {
                AtomItem::Text(text) => {
                    if !include_text {
                        continue;
                    }
                    let start = range.start.max(atom.start);
                    let end = range.end.min(atom.end);
                    if start < end {
                        let slice = &text[start - atom.start..end - atom.start];
                        out.push_fragment(atom, RunContent::Text(slice.to_string()));
                    }
                }
                AtomItem::Tab(el) | AtomItem::Break(el) => {
                    if include_text && atom.start >= range.start && atom.end <= range.end {
                        let item = match atom.item {
                            AtomItem::Tab(_) => RunContent::Tab(el.clone()),
                            _ => RunContent::Break(el.clone()),
                        };
                        out.push_fragment(atom, item);
                    }
                }
                AtomItem::Anchor(el) => {
                    if Self::claim(atom, i, &range, emitted) {
                        out.push_fragment(atom, RunContent::Anchor(el.clone()));
                    }
                }
                AtomItem::Other(node) => {
                    if Self::claim(atom, i, &range, emitted) {
                        out.push(ParagraphChild::Other(node.clone()));
                    }
                }
            }
        }
        out.close();
    }

    fn claim(atom: &Atom<'_>, i: usize, range: &Range<usize>, emitted: &mut [bool]) -> bool {
        if emitted[i] || atom.start < range.start || atom.start > range.end {
            return false;
        }
        emitted[i] = true;
        true
    }

    /// Build a run for inserted text; tabs and newlines become `w:tab` and `w:br`.
    fn changed_run(&self, text: &str, style: RunStyle) -> Run {
        let style = match self.marker {
            Some(marker) => style.with_marker(marker, self.wml),
            None => style,
        };
        let mut run = Run::new(style);

        let mut chunk_start = 0;
        for (i, c) in text.char_indices() {
            let item = match c {
                '\t' => RunContent::Tab(Element::new(self.wml.name("tab"))),
                '\n' => RunContent::Break(Element::new(self.wml.name("br"))),
                _ => continue,
            };
            if chunk_start < i {
                run.content
                    .push(RunContent::Text(text[chunk_start..i].to_string()));
            }
            run.content.push(item);
            chunk_start = i + 1;
        }
        if chunk_start < text.len() {
            run.content
                .push(RunContent::Text(text[chunk_start..].to_string()));
        }
        run
    }

    fn first_text_style(&self, paragraph: &Paragraph) -> Option<RunStyle> {
        let wml = self.wml;
        paragraph.children.iter().find_map(|child| match child {
            ParagraphChild::Run(run) if run.is_textual() => Some(run.style.clone()),
            ParagraphChild::Run(_) => None,
            ParagraphChild::Other(Node::Element(el)) => el
                .find_descendant(|r| {
                    wml.is(r, "r")
                        && r.elements()
                            .any(|c| wml.is(c, "t") || wml.is(c, "tab") || wml.is(c, "br"))
                })
                .map(|r| Run::from_element(r, wml).style),
            ParagraphChild::Other(_) => None,
        })
    }

    /// Style for inserted text when the paragraph has no runs.
    fn fallback_style(&self, source: &SourceParagraph) -> (RunStyle, Error) {
        match source.paragraph.default_run_style(self.wml) {
            Some(style) => (
                style,
                Error::StyleInheritance {
                    index: source.index,
                    fallback: "used the paragraph mark run properties".to_string(),
                },
            ),
            None => (
                RunStyle::none(),
                Error::StyleInheritance {
                    index: source.index,
                    fallback: "inserted text has no run properties".to_string(),
                },
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::full_text;
    use crate::model::xml::XmlDocument;
    use crate::parser::unsupported_reason;

    fn source(xml: &str) -> SourceParagraph {
        let wml = Wml::default();
        let el = XmlDocument::parse_str(xml).unwrap().root;
        SourceParagraph {
            index: 0,
            paragraph: Paragraph::from_element(&el, &wml),
            text: full_text(&el, &wml),
            unsupported: unsupported_reason(&el, &wml),
            nested_paragraphs: 0,
        }
    }

    /// (text, marked) for every run.
    fn runs(paragraph: &Paragraph) -> Vec<(String, bool)> {
        let wml = Wml::default();
        let marker = AmendmentMarker::default();
        paragraph
            .runs()
            .map(|r| (r.text(), marker.is_applied(&r.style, &wml)))
            .collect()
    }

    const CAT: &str = r#"<w:p><w:pPr><w:jc w:val="both"/></w:pPr><w:r w:rsidR="00AB"><w:rPr><w:rFonts w:ascii="Garamond"/><w:sz w:val="22"/></w:rPr><w:t>The cat sat on the mat.</w:t></w:r></w:p>"#;

    #[test]
    fn test_insert_and_replace_words() {
        let wml = Wml::default();
        let marker = AmendmentMarker::default();
        let src = source(CAT);
        let out = RunRewriter::new(&wml, Some(&marker))
            .rewrite(&src, "The large cat sat on the rug.");

        assert_eq!(
            runs(&out.paragraph),
            vec![
                ("The ".to_string(), false),
                ("large ".to_string(), true),
                ("cat sat on the ".to_string(), false),
                ("rug.".to_string(), true),
            ]
        );
        assert_eq!(out.paragraph.text(), "The large cat sat on the rug.");
        assert!(!out.needs_review());
        assert_eq!(out.inserted_words, 2);
        assert_eq!(out.deleted_words, 1);
        assert_eq!(out.paragraph.properties, src.paragraph.properties);

        let original = &src.paragraph.runs().next().unwrap().style;
        for run in out.paragraph.runs() {
            assert_eq!(run.style.font_family(&wml), Some("Garamond"));
            assert_eq!(run.style.font_size(&wml), Some(11.0));
        }
        let kept: Vec<_> = out.paragraph.runs().step_by(2).collect();
        assert!(kept.iter().all(|r| r.style.shares_descriptor(original)));
        assert!(kept.iter().all(|r| r.attributes == src.paragraph.runs().next().unwrap().attributes));
    }

    #[test]
    fn test_clean_mode() {
        let wml = Wml::default();
        let src = source(CAT);
        let out = RunRewriter::new(&wml, None).rewrite(&src, "The large cat sat on the rug.");
        assert!(runs(&out.paragraph).iter().all(|(_, marked)| !marked));
        assert_eq!(out.paragraph.text(), "The large cat sat on the rug.");
    }

    #[test]
    fn test_style_follows_position() {
        let wml = Wml::default();
        let marker = AmendmentMarker::default();
        let src = source(
            r#"<w:p><w:r><w:t xml:space="preserve">Plain </w:t></w:r><w:r><w:rPr><w:i/></w:rPr><w:t>italic words</w:t></w:r></w:p>"#,
        );
        let out = RunRewriter::new(&wml, Some(&marker)).rewrite(&src, "Plain italic new words");

        let texts: Vec<_> = out.paragraph.runs().map(|r| r.text()).collect();
        assert_eq!(texts, vec!["Plain ", "italic ", "new ", "words"]);
        let italic: Vec<_> = out.paragraph.runs().map(|r| r.style.italic(&wml)).collect();
        assert_eq!(italic, vec![false, true, true, true]);
    }

    #[test]
    fn test_footnote_reference_survives_replacement() {
        let wml = Wml::default();
        let marker = AmendmentMarker::default();
        let src = source(
            r#"<w:p><w:r><w:t>Section 1 applies.</w:t></w:r><w:r><w:rPr><w:rStyle w:val="FootnoteReference"/></w:rPr><w:footnoteReference w:id="1"/></w:r><w:r><w:t xml:space="preserve"> Next</w:t></w:r></w:p>"#,
        );
        let out = RunRewriter::new(&wml, Some(&marker)).rewrite(&src, "Section 1 governs. Next");

        assert_eq!(out.paragraph.text(), "Section 1 governs. Next");
        let xml = out.paragraph.to_element(&wml).to_xml_string();
        assert_eq!(xml.matches("w:footnoteReference").count(), 1);
        let governs = xml.find("governs.").unwrap();
        let reference = xml.find("w:footnoteReference").unwrap();
        let next = xml.find(" Next").unwrap();
        assert!(governs < reference && reference < next);
    }

    #[test]
    fn test_anchor_in_deleted_span() {
        let wml = Wml::default();
        let src = source(
            r#"<w:p><w:r><w:t xml:space="preserve">A </w:t></w:r><w:bookmarkStart w:id="0" w:name="b"/><w:r><w:t xml:space="preserve">B </w:t></w:r><w:bookmarkEnd w:id="0"/><w:r><w:t>C</w:t></w:r></w:p>"#,
        );
        let out = RunRewriter::new(&wml, None).rewrite(&src, "A C");
        assert_eq!(out.paragraph.text(), "A C");

        let others = out
            .paragraph
            .children
            .iter()
            .filter(|c| matches!(c, ParagraphChild::Other(_)))
            .count();
        assert_eq!(others, 2);
    }

    #[test]
    fn test_inserted_tabs_and_breaks() {
        let wml = Wml::default();
        let marker = AmendmentMarker::default();
        let src = source(r#"<w:p><w:r><w:t>a</w:t></w:r></w:p>"#);
        let out = RunRewriter::new(&wml, Some(&marker)).rewrite(&src, "a\tb\nc");

        let inserted = out.paragraph.runs().nth(1).unwrap();
        assert!(matches!(inserted.content[0], RunContent::Tab(_)));
        assert_eq!(inserted.content[1], RunContent::Text("b".to_string()));
        assert!(matches!(inserted.content[2], RunContent::Break(_)));
        assert_eq!(out.paragraph.text(), "a\tb\nc");
    }

    #[test]
    fn test_kept_tab() {
        let wml = Wml::default();
        let src = source(r#"<w:p><w:r><w:t>x</w:t><w:tab/><w:t>y</w:t></w:r></w:p>"#);
        let out = RunRewriter::new(&wml, None).rewrite(&src, "x\tz");
        let texts: Vec<_> = out.paragraph.runs().map(|r| r.text()).collect();
        assert_eq!(texts, vec!["x\t", "z"]);
    }

    #[test]
    fn test_fallback_to_paragraph_mark() {
        let wml = Wml::default();
        let marker = AmendmentMarker::default();
        let src = source(
            r#"<w:p><w:pPr><w:rPr><w:sz w:val="28"/></w:rPr></w:pPr></w:p>"#,
        );
        let out = RunRewriter::new(&wml, Some(&marker)).rewrite(&src, "New text");

        assert!(out.needs_review());
        let run = out.paragraph.runs().next().unwrap();
        assert_eq!(run.text(), "New text");
        assert_eq!(run.style.font_size(&wml), Some(14.0));
        assert!(run.style.bold(&wml));
        assert!(matches!(
            out.inheritance_failure,
            Some(Error::StyleInheritance { index: 0, .. })
        ));
    }

    #[test]
    fn test_fallback_without_properties() {
        let wml = Wml::default();
        let src = source(r#"<w:p><w:bookmarkStart w:id="1"/></w:p>"#);
        let out = RunRewriter::new(&wml, None).rewrite(&src, "Text");

        assert!(out.needs_review());
        assert_eq!(out.paragraph.text(), "Text");
        assert_eq!(out.paragraph.children.len(), 2);
        assert!(out.paragraph.runs().next().unwrap().style.is_empty());
    }

    #[test]
    fn test_replace_complex_paragraph() {
        let wml = Wml::default();
        let marker = AmendmentMarker::default();
        let src = source(
            r#"<w:p><w:pPr><w:pStyle w:val="Body"/></w:pPr><w:hyperlink r:id="rId1"><w:r><w:rPr><w:u w:val="single"/></w:rPr><w:t>old link</w:t></w:r></w:hyperlink></w:p>"#,
        );
        assert!(!src.is_simple());

        let out = RunRewriter::new(&wml, Some(&marker)).replace(&src, "new text");
        assert_eq!(runs(&out.paragraph), vec![("new text".to_string(), true)]);
        assert!(out.paragraph.runs().next().unwrap().style.underline(&wml));
        assert_eq!(out.paragraph.children.len(), 1);
        assert!(out.paragraph.properties.is_some());
        assert!(!out.needs_review());
    }
}

//! Integration tests for document refinement.

mod common;

use common::*;
use docx_refine::model::Wml;
use docx_refine::render::ledger_from_json;
use docx_refine::{
    extract_paragraphs, extract_text, refine_file, refine_file_with_options,
    refine_file_with_text, Amended, AmendedSource, AmendmentMarker, ComplexParagraphPolicy,
    DocxPackage, Error, JsonFormat, ParagraphStatus, RefineOptions, Refiner, StoryKind,
};

const ORIGINAL: &[&str] = &[
    "The cat sat on the mat.",
    "Payment is due within thirty days.",
    "This clause survives termination.",
];

fn body_paragraphs(docx: Vec<u8>) -> Vec<docx_refine::Paragraph> {
    DocxPackage::from_bytes(docx).unwrap().body().unwrap().paragraphs()
}

#[test]
fn test_identical_text_keeps_parts_byte_identical() {
    let original = docx_with_paragraphs(ORIGINAL);
    let amended = Amended::Paragraphs(ORIGINAL.iter().map(|s| s.to_string()).collect());

    let (output, ledger) = Refiner::default()
        .refine_bytes(original.clone(), &amended)
        .unwrap();

    assert_eq!(part_names(&output), part_names(&original));
    for name in part_names(&original) {
        assert_eq!(read_part(&output, &name), read_part(&original, &name), "{}", name);
    }
    assert_eq!(ledger.len(), 3);
    assert!(ledger
        .entries
        .iter()
        .all(|e| e.status == ParagraphStatus::Unchanged));
    assert!(!ledger.has_changes());
}

#[test]
fn test_word_level_markup() {
    let original = docx_with_paragraphs(ORIGINAL);
    let amended = Amended::from_text(
        "The large cat sat on the rug.\n\nPayment is due within thirty days.\n\nThis clause survives termination.",
    );

    let (output, ledger) = Refiner::default().refine_bytes(original, &amended).unwrap();

    let wml = Wml::default();
    let marker = AmendmentMarker::default();
    let paragraphs = body_paragraphs(output);
    let runs: Vec<(String, bool)> = paragraphs[0]
        .runs()
        .map(|r| (r.text(), marker.is_applied(&r.style, &wml)))
        .collect();
    assert_eq!(
        runs,
        vec![
            ("The ".to_string(), false),
            ("large ".to_string(), true),
            ("cat sat on the ".to_string(), false),
            ("rug.".to_string(), true),
        ]
    );

    // Inherited formatting stays under the marker.
    for run in paragraphs[0].runs() {
        assert_eq!(run.style.font_family(&wml), Some("Times New Roman"));
        assert_eq!(run.style.font_size(&wml), Some(12.0));
    }

    let entry = ledger.get(StoryKind::Body, 0).unwrap();
    assert_eq!(entry.status, ParagraphStatus::Modified);
    assert_eq!(entry.inserted_words, 2);
    assert_eq!(entry.deleted_words, 1);
    assert_eq!(
        ledger.get(StoryKind::Body, 1).unwrap().status,
        ParagraphStatus::Unchanged
    );
}

#[test]
fn test_clean_mode_marks_nothing() {
    let original = docx_with_paragraphs(ORIGINAL);
    let amended = Amended::from_text(
        "The large cat sat on the rug.\n\nPayment is due within fifteen days.\n\nThis clause survives.",
    );

    let refiner = Refiner::new(RefineOptions::new().clean());
    let (output, ledger) = refiner.refine_bytes(original, &amended).unwrap();

    let wml = Wml::default();
    let paragraphs = body_paragraphs(output);
    for run in paragraphs.iter().flat_map(|p| p.runs()) {
        assert!(!run.style.bold(&wml));
        assert_eq!(run.style.highlight(&wml), None);
    }
    assert!(!ledger.markup);
    assert_eq!(ledger.summary().modified, 3);
}

#[test]
fn test_text_fidelity() {
    let body = format!(
        "{}<w:tbl><w:tr><w:tc>{}</w:tc><w:tc>{}</w:tc></w:tr></w:tbl>{}",
        para("Heading one"),
        para("Cell A"),
        para("Cell B"),
        para("Closing words here.")
    );
    let original = build_docx(&body, None);
    let amended_texts = vec![
        "Heading one, revised".to_string(),
        "Cell A".to_string(),
        "Cell\tB2".to_string(),
        "Closing words\nhere and there.".to_string(),
    ];

    let (output, _) = Refiner::default()
        .refine_bytes(original, &Amended::Paragraphs(amended_texts.clone()))
        .unwrap();

    let texts: Vec<String> = body_paragraphs(output).iter().map(|p| p.text()).collect();
    assert_eq!(texts, amended_texts);
}

#[test]
fn test_unchanged_parts_copied_when_body_changes() {
    let original = docx_with_paragraphs(ORIGINAL);
    let amended = Amended::from_text(
        "The dog sat on the mat.\n\nPayment is due within thirty days.\n\nThis clause survives termination.",
    );
    let (output, _) = Refiner::default()
        .refine_bytes(original.clone(), &amended)
        .unwrap();

    assert_eq!(part_names(&output), part_names(&original));
    assert_eq!(
        read_part(&output, "word/styles.xml"),
        read_part(&original, "word/styles.xml")
    );
    assert_ne!(
        read_part(&output, "word/document.xml"),
        read_part(&original, "word/document.xml")
    );

    // Untouched paragraphs are serialized as they were read.
    let xml = String::from_utf8(read_part(&output, "word/document.xml")).unwrap();
    assert!(xml.contains(&para("Payment is due within thirty days.")));
    assert!(xml.contains(r#"<w:sectPr><w:pgSz w:w="12240" w:h="15840"/></w:sectPr>"#));
}

#[test]
fn test_hyperlink_paragraph_skipped() {
    let body = format!(
        "{}{}",
        para("Intro text."),
        hyperlink_para("See ", "the schedule", " for details.")
    );
    let original = build_docx(&body, None);
    let amended = Amended::Paragraphs(vec![
        "Intro text.".to_string(),
        "See the annex for details.".to_string(),
    ]);

    let (output, ledger) = Refiner::default().refine_bytes(original, &amended).unwrap();

    let entry = ledger.get(StoryKind::Body, 1).unwrap();
    assert_eq!(entry.status, ParagraphStatus::Skipped);
    assert_eq!(
        entry.note.as_deref(),
        Some("Paragraph 1 has unsupported content: contains a hyperlink")
    );
    assert_eq!(
        entry.change.as_ref().map(|c| c.amended.as_str()),
        Some("See the annex for details.")
    );

    let xml = String::from_utf8(read_part(&output, "word/document.xml")).unwrap();
    assert!(xml.contains(&hyperlink_para("See ", "the schedule", " for details.")));
}

#[test]
fn test_unchanged_hyperlink_paragraph_still_logged_skipped() {
    let original = build_docx(&hyperlink_para("See ", "here", "."), None);
    let amended = Amended::Paragraphs(vec!["See here.".to_string()]);

    let (output, ledger) = Refiner::default()
        .refine_bytes(original.clone(), &amended)
        .unwrap();

    assert_eq!(
        ledger.get(StoryKind::Body, 0).unwrap().status,
        ParagraphStatus::Skipped
    );
    assert_eq!(
        read_part(&output, "word/document.xml"),
        read_part(&original, "word/document.xml")
    );
}

#[test]
fn test_footnote_reference_preserved() {
    let original = build_docx(
        &footnote_para("The term applies.", 1, " Other words."),
        Some(&footnotes_xml(&["A note."])),
    );
    let amended = Amended::Paragraphs(vec!["The term governs. Other words.".to_string()]);

    let (output, _) = Refiner::default().refine_bytes(original, &amended).unwrap();

    let xml = String::from_utf8(read_part(&output, "word/document.xml")).unwrap();
    assert_eq!(xml.matches(r#"<w:footnoteReference w:id="1"/>"#).count(), 1);
    let reference = xml.find("w:footnoteReference").unwrap();
    assert!(xml.find("governs.").unwrap() < reference);
    assert!(reference < xml.find(" Other words.").unwrap());
    assert!(xml.contains(r#"<w:vertAlign w:val="superscript"/>"#));
}

#[test]
fn test_footnotes_refined_from_amended_docx() {
    let body = footnote_para("Main text.", 1, "");
    let original = build_docx(&body, Some(&footnotes_xml(&["Original note."])));
    let amended = build_docx(&body, Some(&footnotes_xml(&["Revised note."])));

    let refiner = Refiner::new(RefineOptions::new().with_notes(true));
    let (output, ledger) = refiner
        .refine_bytes(original.clone(), &Amended::from_docx_bytes(amended).unwrap())
        .unwrap();

    let notes = DocxPackage::from_bytes(output.clone())
        .unwrap()
        .story(StoryKind::Footnotes)
        .unwrap()
        .unwrap();
    assert_eq!(notes.paragraph_texts(), vec!["", "Revised note."]);
    assert_eq!(
        ledger.get(StoryKind::Footnotes, 1).unwrap().status,
        ParagraphStatus::Modified
    );
    assert_eq!(
        read_part(&output, "word/document.xml"),
        read_part(&original, "word/document.xml")
    );

    // Without the option the notes are left alone.
    let amended = build_docx(&body, Some(&footnotes_xml(&["Revised note."])));
    let (output, ledger) = Refiner::default()
        .refine_bytes(original.clone(), &Amended::from_docx_bytes(amended).unwrap())
        .unwrap();
    assert!(ledger.story(StoryKind::Footnotes).next().is_none());
    assert_eq!(
        read_part(&output, "word/footnotes.xml"),
        read_part(&original, "word/footnotes.xml")
    );
}

#[test]
fn test_mismatch_rejected_without_output() {
    let dir = tempfile::tempdir().unwrap();
    let original = write_file(dir.path(), "original.docx", &docx_with_paragraphs(ORIGINAL));
    let amended = write_file(
        dir.path(),
        "amended.txt",
        b"The cat sat on the mat.\n\nPayment is due within thirty days.\n\nThis clause survives termination.\n\nAn extra paragraph.",
    );
    let out = dir.path().join("out.docx");

    let err = refine_file_with_text(&original, &amended, &out).unwrap_err();
    match err {
        Error::ParagraphCountMismatch {
            part,
            expected,
            actual,
        } => {
            assert_eq!(part, "word/document.xml");
            assert_eq!(expected, 3);
            assert_eq!(actual, 4);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!out.exists());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 2);
}

#[test]
fn test_missing_paragraph_rejected_without_output() {
    let dir = tempfile::tempdir().unwrap();
    let original = write_file(dir.path(), "original.docx", &docx_with_paragraphs(ORIGINAL));
    let amended = write_file(
        dir.path(),
        "amended.txt",
        b"The cat sat on the mat.\n\nPayment is due within thirty days.",
    );
    let out = dir.path().join("out.docx");

    let err = refine_file_with_text(&original, &amended, &out).unwrap_err();
    assert!(matches!(
        err,
        Error::ParagraphCountMismatch {
            expected: 3,
            actual: 2,
            ..
        }
    ));
    assert!(!out.exists());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 2);
}

#[test]
fn test_original_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let bytes = docx_with_paragraphs(ORIGINAL);
    let original = write_file(dir.path(), "original.docx", &bytes);
    let amended = write_file(
        dir.path(),
        "amended.docx",
        &docx_with_paragraphs(&[
            "The cat sat on the rug.",
            "Payment is due within thirty days.",
            "This clause survives expiry.",
        ]),
    );
    let out = dir.path().join("refined.docx");

    let report = refine_file(&original, &amended, &out).unwrap();

    assert_eq!(std::fs::read(&original).unwrap(), bytes);
    assert_eq!(report.output, out);
    assert_eq!(report.replaced_parts, vec!["word/document.xml".to_string()]);
    assert_eq!(report.summary().modified, 2);
    assert_eq!(
        extract_paragraphs(&out).unwrap(),
        vec![
            "The cat sat on the rug.",
            "Payment is due within thirty days.",
            "This clause survives expiry.",
        ]
    );
}

#[test]
fn test_output_same_as_original_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let bytes = docx_with_paragraphs(ORIGINAL);
    let original = write_file(dir.path(), "original.docx", &bytes);
    let amended = write_file(dir.path(), "amended.txt", b"x");

    let err = refine_file_with_options(
        &original,
        &AmendedSource::text(&amended),
        &original,
        RefineOptions::new(),
    )
    .unwrap_err();
    assert!(matches!(err, Error::InvalidOutputPath(_)));
    assert_eq!(std::fs::read(&original).unwrap(), bytes);
}

#[test]
fn test_extract_text_feeds_back() {
    let dir = tempfile::tempdir().unwrap();
    let original = write_file(dir.path(), "original.docx", &docx_with_paragraphs(ORIGINAL));

    let text = extract_text(&original).unwrap();
    assert_eq!(
        text,
        "The cat sat on the mat.\n\nPayment is due within thirty days.\n\nThis clause survives termination."
    );

    let edited = text.replace("thirty", "sixty");
    let amended = write_file(dir.path(), "amended.txt", edited.as_bytes());
    let out = dir.path().join("out.docx");
    let report = refine_file_with_text(&original, &amended, &out).unwrap();
    assert_eq!(report.summary().modified, 1);
    assert_eq!(report.ledger.get(StoryKind::Body, 1).unwrap().inserted_words, 1);
}

#[test]
fn test_corrupt_original() {
    let dir = tempfile::tempdir().unwrap();
    let original = write_file(dir.path(), "broken.docx", b"PK\x03\x04 not really a zip");
    let amended = write_file(dir.path(), "amended.txt", b"x");
    let out = dir.path().join("out.docx");

    let err = refine_file_with_text(&original, &amended, &out).unwrap_err();
    assert!(matches!(err, Error::DocumentRead(_)));
    assert!(!out.exists());
}

const RUBY: &str = r#"<w:p><w:r><w:t xml:space="preserve">Read </w:t></w:r><w:r><w:ruby><w:rt><w:r><w:t>kan</w:t></w:r></w:rt><w:rubyBase><w:r><w:t>漢</w:t></w:r></w:rubyBase></w:ruby></w:r><w:r><w:t xml:space="preserve"> now.</w:t></w:r></w:p>"#;

#[test]
fn test_ruby_paragraph_skipped() {
    let original = build_docx(&format!("{}{}", para("Intro."), RUBY), None);
    let amended = Amended::Paragraphs(vec!["Intro.".to_string(), "Read kan漢 later.".to_string()]);

    let (output, ledger) = Refiner::default()
        .refine_bytes(original.clone(), &amended)
        .unwrap();

    let entry = ledger.get(StoryKind::Body, 1).unwrap();
    assert_eq!(entry.status, ParagraphStatus::Skipped);
    assert_eq!(
        entry.note.as_deref(),
        Some("Paragraph 1 has unsupported content: contains nested runs")
    );
    assert_eq!(
        read_part(&output, "word/document.xml"),
        read_part(&original, "word/document.xml")
    );
}

#[test]
fn test_ruby_paragraph_replaced_with_amended_text() {
    let original = build_docx(RUBY, None);
    let amended = Amended::Paragraphs(vec!["Read kan漢 later.".to_string()]);

    let refiner = Refiner::new(
        RefineOptions::new().with_complex_policy(ComplexParagraphPolicy::Replace),
    );
    let (output, ledger) = refiner.refine_bytes(original, &amended).unwrap();

    assert_eq!(
        ledger.get(StoryKind::Body, 0).unwrap().status,
        ParagraphStatus::Modified
    );
    let texts = DocxPackage::from_bytes(output)
        .unwrap()
        .body()
        .unwrap()
        .paragraph_texts();
    assert_eq!(texts, vec!["Read kan漢 later."]);
}

#[test]
fn test_replace_policy_keeps_text_box_paragraphs() {
    let body = r#"<w:p><w:hyperlink r:id="rId9"><w:r><w:t>Outer</w:t></w:r></w:hyperlink><w:r><w:drawing><w:txbxContent><w:p><w:r><w:t>Inner</w:t></w:r></w:p></w:txbxContent></w:drawing></w:r></w:p>"#;
    let original = build_docx(body, None);
    let amended = Amended::Paragraphs(vec!["Outer2Inner".to_string(), "Inner2".to_string()]);

    let refiner = Refiner::new(
        RefineOptions::new().with_complex_policy(ComplexParagraphPolicy::Replace),
    );
    let (output, ledger) = refiner.refine_bytes(original, &amended).unwrap();

    let statuses: Vec<_> = ledger.entries.iter().map(|e| (e.index, e.status)).collect();
    assert_eq!(
        statuses,
        vec![(0, ParagraphStatus::Skipped), (1, ParagraphStatus::Modified)]
    );

    let texts = DocxPackage::from_bytes(output.clone())
        .unwrap()
        .body()
        .unwrap()
        .paragraph_texts();
    assert_eq!(texts, vec!["OuterInner2", "Inner2"]);
    let xml = String::from_utf8(read_part(&output, "word/document.xml")).unwrap();
    assert!(xml.contains(r#"<w:hyperlink r:id="rId9"><w:r><w:t>Outer</w:t></w:r></w:hyperlink>"#));
}

fn refine_inputs(dir: &std::path::Path) -> (std::path::PathBuf, AmendedSource) {
    let original = write_file(dir, "original.docx", &docx_with_paragraphs(ORIGINAL));
    let amended = write_file(
        dir,
        "amended.txt",
        b"The cat sat on the rug.\n\nPayment is due within thirty days.\n\nThis clause survives termination.",
    );
    (original, AmendedSource::text(amended))
}

#[test]
fn test_ledger_written_with_output() {
    let dir = tempfile::tempdir().unwrap();
    let (original, amended) = refine_inputs(dir.path());
    let out = dir.path().join("out.docx");
    let ledger_path = dir.path().join("ledger.json");

    let report = Refiner::default()
        .refine_with_ledger(&original, &amended, &out, &ledger_path, JsonFormat::Pretty)
        .unwrap();

    assert!(out.exists());
    assert_eq!(report.ledger_file.as_deref(), Some(ledger_path.as_path()));
    let saved = ledger_from_json(&std::fs::read_to_string(&ledger_path).unwrap()).unwrap();
    assert_eq!(saved, report.ledger);
    assert_eq!(saved.summary().modified, 1);
}

#[test]
fn test_ledger_over_original_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let (original, amended) = refine_inputs(dir.path());
    let bytes = std::fs::read(&original).unwrap();
    let out = dir.path().join("out.docx");

    let err = Refiner::default()
        .refine_with_ledger(&original, &amended, &out, &original, JsonFormat::Pretty)
        .unwrap_err();

    assert!(matches!(err, Error::InvalidOutputPath(_)));
    assert_eq!(std::fs::read(&original).unwrap(), bytes);
    assert!(!out.exists());
}

#[test]
fn test_ledger_over_output_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let (original, amended) = refine_inputs(dir.path());
    let out = dir.path().join("out.docx");

    let err = Refiner::default()
        .refine_with_ledger(&original, &amended, &out, &out, JsonFormat::Compact)
        .unwrap_err();
    assert!(err.to_string().contains("output document"));
    assert!(!out.exists());

    let err = Refiner::default()
        .refine_with_ledger(
            &original,
            &amended,
            &out,
            dir.path().join("missing").join("ledger.json"),
            JsonFormat::Compact,
        )
        .unwrap_err();
    assert!(matches!(err, Error::InvalidOutputPath(_)));
    assert!(!out.exists());
}

#[test]
fn test_empty_paragraph_does_not_round_trip_as_text() {
    let dir = tempfile::tempdir().unwrap();
    let original = write_file(
        dir.path(),
        "original.docx",
        &docx_with_paragraphs(&["First.", "", "Third."]),
    );

    let paragraphs = extract_paragraphs(&original).unwrap();
    assert!(!docx_refine::parser::round_trips(&paragraphs));

    let amended = write_file(dir.path(), "amended.txt", extract_text(&original).unwrap().as_bytes());
    let out = dir.path().join("out.docx");
    let err = refine_file_with_text(&original, &amended, &out).unwrap_err();
    assert!(matches!(
        err,
        Error::ParagraphCountMismatch {
            expected: 3,
            actual: 2,
            ..
        }
    ));
}

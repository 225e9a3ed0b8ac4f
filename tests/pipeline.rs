use std::fs;
use std::path::PathBuf;

use ppdiff::{classify, Comparator, CompareOptions, FileKind};
use tempdir::TempDir;
use test_log::test;

/// Write the given (name, contents) pairs into a fresh temporary
/// directory and return it together with the file paths.
fn write_inputs(files: &[(&str, &str)]) -> (TempDir, Vec<PathBuf>) {
    let tmp_dir = TempDir::new("ppdiff").expect("failed to create temporary directory");
    let mut paths = Vec::new();
    for (name, contents) in files {
        let path = tmp_dir.path().join(name);
        fs::write(&path, contents).unwrap();
        paths.push(path);
    }
    (tmp_dir, paths)
}

#[test]
fn collates_rounds_text_against_html() {
    let (_tmp, paths) = write_inputs(&[
        (
            "projectID0123456789abc.txt",
            "-----File: 001.png---\\proofer1\\proofer2\\\nThe <i>quick</i> fox.\n",
        ),
        ("book.html", "<p>The <i>quick</i> fox.</p>"),
    ]);

    let comparator = Comparator::new(CompareOptions::default());
    let result = comparator.process_pair(&paths[0], &paths[1]).unwrap();

    assert_eq!(result.left.main, "The _quick_ fox.\n");
    assert_eq!(result.left.main, result.right.main);
}

#[test]
fn asymmetric_quotes_collate() {
    let (_tmp, paths) = write_inputs(&[
        ("book.txt", "She said \u{201c}wait\u{201d} \u{2014} twice.\n"),
        ("book.html", "<p>She said \"wait\" -- twice.</p>"),
    ]);

    let comparator = Comparator::new(CompareOptions::default());
    let result = comparator.process_pair(&paths[0], &paths[1]).unwrap();

    assert_eq!(result.left.main, "She said \"wait\" -- twice.\n");
    assert_eq!(result.left.main, result.right.main);
}

#[test]
fn footnotes_split_into_parallel_streams() {
    let (_tmp, paths) = write_inputs(&[
        ("book.txt", "Story text.\n\n[1] See appendix.\n"),
        (
            "book.html",
            "<p>Story text.</p>\
             <div class=\"footnote\"><p>[1] See appendix.</p></div>",
        ),
    ]);

    let comparator = Comparator::new(CompareOptions {
        extract_footnotes: true,
        ..Default::default()
    });
    let result = comparator.process_pair(&paths[0], &paths[1]).unwrap();

    assert_eq!(result.left.main.trim_end(), "Story text.");
    assert_eq!(result.right.main.trim_end(), "Story text.");
    assert_eq!(result.left.footnotes.trim_end(), "[1] See appendix.");
    assert_eq!(result.left.footnotes.trim_end(), result.right.footnotes.trim_end());
}

#[test]
fn split_words_regroup_only_with_the_flag() {
    let input = "some wo-*\n*rds here\n";
    let comparator = Comparator::new(CompareOptions {
        regroup_split_words: true,
        ..Default::default()
    });
    let out = comparator.process_input(input, FileKind::Rounds);
    assert_eq!(out.main, "some words here\n");

    let comparator = Comparator::new(CompareOptions::default());
    let out = comparator.process_input(input, FileKind::Rounds);
    assert_eq!(out.main, input);
}

#[test]
fn proofer_notes_suppressed_only_with_the_flag() {
    let input = "word[**check this] next\n";
    let comparator = Comparator::new(CompareOptions {
        suppress_proofers_notes: true,
        ..Default::default()
    });
    assert_eq!(
        comparator.process_input(input, FileKind::Rounds).main,
        "word next\n"
    );

    let comparator = Comparator::new(CompareOptions::default());
    assert_eq!(comparator.process_input(input, FileKind::Rounds).main, input);
}

#[test]
fn greek_transliteration_from_title() {
    let comparator = Comparator::new(CompareOptions {
        css_greek_title_plus: true,
        ..Default::default()
    });
    let out = comparator.process_input(
        "<p><span lang=\"grc\" title=\"phagedaina\">\u{3c6}\u{3b1}\u{3b3}\u{3ad}\u{3b4}\u{3b1}\u{3b9}\u{3bd}\u{3b1}</span></p>",
        FileKind::Html,
    );
    assert_eq!(out.main, "+phagedaina+\n");
}

#[test]
fn lowering_a_title_page() {
    let comparator = Comparator::new(CompareOptions::default());
    let out = comparator.process_input(
        "<body><h1>CHAPTER I</h1>\
         <p><span class=\"pagenum\">[17]</span>It was a <b>dark</b> night.</p>\
         <p>The 1<sup>st</sup> of May.</p></body>",
        FileKind::Html,
    );
    insta::assert_snapshot!(out.main.trim_end(), @r"
    CHAPTER I
    It was a =dark= night.
    The 1^{st} of May.
    ");
}

#[test]
fn unknown_extension_is_rejected() {
    let (_tmp, paths) = write_inputs(&[("book.pdf", "x"), ("book.txt", "y\n")]);
    let comparator = Comparator::new(CompareOptions::default());
    assert!(comparator.process_pair(&paths[0], &paths[1]).is_err());
}

#[test]
fn classification_matches_pipeline_routing() {
    assert_eq!(
        classify(&PathBuf::from("projectIDf00ba4.txt")).unwrap(),
        FileKind::Rounds
    );
    assert_eq!(classify(&PathBuf::from("final.txt")).unwrap(), FileKind::Processed);
    assert_eq!(classify(&PathBuf::from("final.xhtml")).unwrap(), FileKind::Html);
}

//! Compare two renditions of the same book, a plain-text file and an
//! HTML file, by normalizing both into flat token streams in which only
//! semantically meaningful discrepancies remain. The streams are meant to
//! be handed to an external word-diff; running that diff and rendering
//! its report are out of scope here.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context};

pub mod css;
pub mod dom;
pub mod footnotes;
pub mod html;
pub mod normalize;
pub mod text;

/// How aggressively to clean a proofing-round text file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum CleanupKind {
    /// Every known rewrite: format tags, proofer notes, block markup.
    #[default]
    #[value(name = "b", alias = "best")]
    Best,
    /// Strip Project Gutenberg boilerplate only.
    #[value(name = "n", alias = "none")]
    None,
    /// Additionally strip page markers and blank-page lines.
    #[value(name = "p", alias = "proofers")]
    Proofers,
}

/// Rendering of small-caps content on the HTML side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum SmcapStyle {
    #[value(name = "U")]
    Uppercase,
    #[value(name = "L")]
    Lowercase,
    #[value(name = "T")]
    Title,
}

#[derive(Debug, Clone, Default, clap::Args)]
pub struct CompareOptions {
    /// Fold both sides to lowercase before diffing.
    #[clap(long)]
    pub ignore_case: bool,
    /// Pull footnotes out of both sides into a parallel stream.
    #[clap(long)]
    pub extract_footnotes: bool,
    /// Rewrite `[Footnote N:` tags in the text file, keeping the content.
    #[clap(long)]
    pub suppress_footnote_tags: bool,
    /// Remove `[Illustration: ...]` tags in the text file, keeping the content.
    #[clap(long)]
    pub suppress_illustration_tags: bool,
    /// Remove `[Sidenote: ...]` tags in the text file, keeping the content.
    #[clap(long)]
    pub suppress_sidenote_tags: bool,
    /// Discard italic/bold markers on both sides instead of collating them.
    #[clap(long)]
    pub ignore_format: bool,
    /// Remove bracketed `[**...]` proofer notes from round text.
    #[clap(long)]
    pub suppress_proofers_notes: bool,
    /// Rejoin `wo-* *rds` split across a line break in round text.
    #[clap(long)]
    pub regroup_split_words: bool,
    /// Cleanup level for round text files.
    #[clap(long, value_enum, default_value = "b")]
    pub txt_cleanup_type: CleanupKind,
    /// Wrap `.figcenter` blocks as `[Illustration: ...]` on the HTML side.
    #[clap(long)]
    pub css_add_illustration: bool,
    /// Wrap `.sidenote` blocks as `[Sidenote: ...]` on the HTML side.
    #[clap(long)]
    pub css_add_sidenote: bool,
    /// Remove no-break spaces between digits on the HTML side.
    #[clap(long)]
    pub suppress_nbsp_num: bool,
    /// Remove zero-width spaces on the HTML side.
    #[clap(long = "ignore-0-space")]
    pub ignore_0_space: bool,
    /// Case transform for `.smcap` content on the HTML side.
    #[clap(long, value_enum)]
    pub css_smcap: Option<SmcapStyle>,
    /// Sentinel emitted around bold text instead of `=`.
    #[clap(long, value_name = "STR")]
    pub css_bold: Option<String>,
    /// Additional stylesheet applied after the defaults; repeatable.
    #[clap(long = "css", value_name = "CSS")]
    pub css: Vec<String>,
    /// Skip the page-number stripping defaults.
    #[clap(long)]
    pub css_no_default: bool,
    /// Process a single HTML file and print the lowered text.
    #[clap(long)]
    pub simple_html: bool,
    /// Replace `lang="grc"` content with `+`-wrapped transliteration from
    /// the title attribute. Deprecated spelling kept for compatibility.
    #[clap(long)]
    pub css_greek_title_plus: bool,
}

/// The flavor of one input, decided from its file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Html,
    Rounds,
    Processed,
}

/// Classify an input by extension and name prefix.
pub fn classify(path: &Path) -> anyhow::Result<FileKind> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");

    match ext.as_deref() {
        Some("htm") | Some("html") | Some("xhtml") => Ok(FileKind::Html),
        Some("txt") if name.starts_with("projectID") => Ok(FileKind::Rounds),
        Some("txt") => Ok(FileKind::Processed),
        _ => bail!("unrecognized input type: {}", path.display()),
    }
}

/// One side's normalized output: the main stream plus the (possibly
/// empty) footnote stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SideOutput {
    pub main: String,
    pub footnotes: String,
}

/// Both sides, pair-normalized and ready for an external word-diff.
#[derive(Debug, Clone)]
pub struct Comparison {
    pub left: SideOutput,
    pub right: SideOutput,
}

#[derive(Debug, Clone)]
pub struct Comparator {
    options: CompareOptions,
}

impl Comparator {
    pub fn new(options: CompareOptions) -> Self {
        Comparator { options }
    }

    /// Run the whole pipeline over a pair of files.
    pub fn process_pair(&self, left: &Path, right: &Path) -> anyhow::Result<Comparison> {
        let mut left = self.process_file(left)?;
        let mut right = self.process_file(right)?;

        normalize::normalize_pair(&mut left.main, &mut right.main, self.options.ignore_case);
        normalize::normalize_pair(
            &mut left.footnotes,
            &mut right.footnotes,
            self.options.ignore_case,
        );

        Ok(Comparison { left, right })
    }

    /// Classify, read and normalize a single input file. The result still
    /// carries side-local characters; pair normalization happens in
    /// [`Comparator::process_pair`].
    pub fn process_file(&self, path: &Path) -> anyhow::Result<SideOutput> {
        let kind = classify(path)?;
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Ok(self.process_input(&content, kind))
    }

    /// The per-side pipeline: side-specific cleaning, then the footnote
    /// split. Footnotes are pulled out before character folding so that
    /// convention markers (superscript digits) survive recognition.
    pub fn process_input(&self, content: &str, kind: FileKind) -> SideOutput {
        match kind {
            FileKind::Html => html::lower(content, &self.options),
            FileKind::Rounds => {
                let cleaned = text::clean_rounds(content, &self.options);
                let (main, notes) = if self.options.extract_footnotes {
                    footnotes::extract_rounds(&cleaned)
                } else {
                    (cleaned, String::new())
                };
                SideOutput {
                    main: text::suppress_tag_wrappers(main, &self.options),
                    footnotes: notes,
                }
            }
            FileKind::Processed => {
                let cleaned = text::clean_processed(content, &self.options);
                let (main, notes) = if self.options.extract_footnotes {
                    footnotes::extract_processed(&cleaned)
                } else {
                    (cleaned, String::new())
                };
                SideOutput {
                    main: text::suppress_tag_wrappers(main, &self.options),
                    footnotes: notes,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn classification() {
        assert_eq!(classify(Path::new("book.html")).unwrap(), FileKind::Html);
        assert_eq!(classify(Path::new("book.htm")).unwrap(), FileKind::Html);
        assert_eq!(classify(Path::new("book.xhtml")).unwrap(), FileKind::Html);
        assert_eq!(
            classify(Path::new("projectID5a1b2c3d4e5f6.txt")).unwrap(),
            FileKind::Rounds
        );
        assert_eq!(classify(Path::new("book.txt")).unwrap(), FileKind::Processed);
        assert!(classify(Path::new("book.pdf")).is_err());
        assert!(classify(Path::new("book")).is_err());
        // The prefix is case-sensitive.
        assert_eq!(
            classify(&PathBuf::from("ProjectID123.txt")).unwrap(),
            FileKind::Processed
        );
    }

    #[test]
    fn pair_normalization_applies_to_both_streams() {
        let comparator = Comparator::new(CompareOptions {
            extract_footnotes: true,
            ..Default::default()
        });

        let mut left = comparator.process_input(
            "She said \u{201c}wait\u{201d}.\n\n[1] a note\n",
            FileKind::Processed,
        );
        let mut right = comparator.process_input(
            "<p>She said \"wait\".</p><div class=\"footnote\"><p>[1] a note</p></div>",
            FileKind::Html,
        );

        normalize::normalize_pair(&mut left.main, &mut right.main, false);
        assert_eq!(left.main.trim(), "She said \"wait\".");
        assert_eq!(right.main.trim(), "She said \"wait\".");
        assert_eq!(left.footnotes.trim(), right.footnotes.trim());
    }
}

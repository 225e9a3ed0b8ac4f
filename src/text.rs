//! Cleaners for the two plain-text input flavors: proofing-round files
//! and post-processed files.

use regex::Regex;

use crate::{CleanupKind, CompareOptions};

/// Clean a proofing-round file (`projectID*.txt`). The cleanup level is
/// governed by `--txt-cleanup-type`; `best` applies every rewrite.
pub fn clean_rounds(text: &str, options: &CompareOptions) -> String {
    let mut text = strip_pg_boilerplate(text);

    if options.txt_cleanup_type != CleanupKind::None {
        let page_sep = Regex::new(r"(?m)^-----File: .*\r?\n?").unwrap();
        text = page_sep.replace_all(&text, "").into_owned();
        let blank_page = Regex::new(r"(?im)^\[Blank Page\]\r?\n?").unwrap();
        text = blank_page.replace_all(&text, "").into_owned();
    }

    if options.txt_cleanup_type == CleanupKind::Best {
        let italics = Regex::new("(?i)</?i>").unwrap();
        let bold = Regex::new("(?i)</?b>").unwrap();
        if options.ignore_format {
            text = italics.replace_all(&text, "").into_owned();
            text = bold.replace_all(&text, "").into_owned();
        } else {
            text = italics.replace_all(&text, "_").into_owned();
            text = bold.replace_all(&text, "=").into_owned();
        }

        if options.suppress_proofers_notes {
            let note = Regex::new(r"\[\*\*[^\]]*\]").unwrap();
            text = note.replace_all(&text, "").into_owned();
        }

        if options.regroup_split_words {
            // "wo-*  *rds" -> "words"; the asterisks only ever mark a
            // word split straddling a line break.
            let split = Regex::new(r"-\*\s*\*").unwrap();
            text = split.replace_all(&text, "").into_owned();
        }

        let block_markup = Regex::new(r"(?m)^(?:/[*#PFX]|[*#PFX]/)[ \t]*$\r?\n?").unwrap();
        text = block_markup.replace_all(&text, "").into_owned();
    }

    text
}

/// Clean a post-processed file: boilerplate, thought breaks, and (under
/// `--ignore-format`) the `_`/`=` formatting sentinels. The sentinel
/// removal is lossy when those characters occur naturally; that behavior
/// is pinned, not repaired.
pub fn clean_processed(text: &str, options: &CompareOptions) -> String {
    let mut text = strip_pg_boilerplate(text);

    let thought_break = Regex::new(r"(?m)^[ \t]*\*(?:[ \t]+\*){4}[ \t]*$\r?\n?").unwrap();
    text = thought_break.replace_all(&text, "").into_owned();

    if options.ignore_format {
        text = text.replace(['_', '='], "");
    }

    text
}

/// Rewrites for the `--suppress-*-tags` options, applied to the main
/// stream after footnote extraction so extraction still sees the tags.
pub fn suppress_tag_wrappers(mut text: String, options: &CompareOptions) -> String {
    if options.suppress_footnote_tags {
        let tag = Regex::new(r"\[Footnote\s+(\w+):\s*").unwrap();
        text = tag.replace_all(&text, "[$1] ").into_owned();
        let cont = Regex::new(r"\*\[Footnote:\s*").unwrap();
        text = cont.replace_all(&text, "").into_owned();
    }
    if options.suppress_illustration_tags {
        let tag = Regex::new(r"\[Illustrations?:?\s*([^\]]*)\]").unwrap();
        text = tag.replace_all(&text, "$1").into_owned();
    }
    if options.suppress_sidenote_tags {
        let tag = Regex::new(r"\[Sidenote:?\s*([^\]]*)\]").unwrap();
        text = tag.replace_all(&text, "$1").into_owned();
    }
    text
}

/// Drop everything up to and including a `*** START OF ...` line, and
/// everything from a `*** END OF ...` (or `End of the Project
/// Gutenberg...`) line onward.
fn strip_pg_boilerplate(text: &str) -> String {
    let start = Regex::new(r"(?im)^\*\*\*\s*START OF.*\r?\n?").unwrap();
    let end = Regex::new(r"(?im)^(?:\*\*\*\s*END OF|End of (?:the )?Project Gutenberg).*$").unwrap();

    let mut rest = text;
    if let Some(m) = start.find(rest) {
        rest = &rest[m.end()..];
    }
    if let Some(m) = end.find(rest) {
        rest = &rest[..m.start()];
    }
    rest.to_string()
}

//! Footnote recognition for the text input forms, plus the anchor
//! canonicalization shared with the HTML side.
//!
//! Each convention is a predicate over a cursor into the line list plus a
//! block extractor; conventions are tried in priority order and the first
//! match consumes the block. Recognition is best-effort: when nothing
//! matches, the main stream is left untouched and the footnote stream
//! stays empty.

use log::warn;
use regex::Regex;

/// Extract `[Footnote N: ...]` blocks from a proofing-round file.
/// `*[Footnote: ...]` blocks continue the previous footnote.
pub fn extract_rounds(text: &str) -> (String, String) {
    let start = Regex::new(r"^\[Footnote(?:\s+(\w+))?:\s*").unwrap();
    let continuation = Regex::new(r"^\*\[Footnote:\s*").unwrap();

    let lines: Vec<&str> = text.lines().collect();
    let mut main: Vec<&str> = Vec::new();
    let mut notes: Vec<String> = Vec::new();

    let mut i = 0;
    while i < lines.len() {
        let line = lines[i];
        let is_cont = continuation.is_match(line);
        if !is_cont && !start.is_match(line) {
            main.push(line);
            i += 1;
            continue;
        }

        // The block runs to the bracket that balances the opening one.
        let mut depth = 0i32;
        let mut end = i;
        'block: for (j, block_line) in lines.iter().enumerate().skip(i) {
            for c in block_line.chars() {
                match c {
                    '[' => depth += 1,
                    ']' => {
                        depth -= 1;
                        if depth == 0 {
                            end = j;
                            break 'block;
                        }
                    }
                    _ => {}
                }
            }
            end = j;
        }

        let joined = lines[i..=end].join("\n");
        let body = joined
            .strip_suffix(']')
            .unwrap_or(&joined);
        if is_cont {
            let body = continuation.replace(body, "").into_owned();
            match notes.last_mut() {
                Some(prev) => {
                    prev.push('\n');
                    prev.push_str(&body);
                }
                None => notes.push(body),
            }
        } else {
            let anchor = start
                .captures(body)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().to_string());
            let body = start.replace(body, "").into_owned();
            notes.push(match anchor {
                Some(n) => format!("[{n}] {body}"),
                None => body,
            });
        }
        i = end + 1;
    }

    assemble(text, main, notes)
}

/// Extract footnotes from a post-processed file, trying the three
/// conventions in priority order at each line.
pub fn extract_processed(text: &str) -> (String, String) {
    let style1 = Regex::new(r"^\[(\d+)\]\s*(.*)$").unwrap();
    let style2 = Regex::new(r"^Footnote\s+(\d+)\s*:\s*(.*)$").unwrap();

    let lines: Vec<&str> = text.lines().collect();
    let mut main: Vec<&str> = Vec::new();
    let mut notes: Vec<String> = Vec::new();

    let mut i = 0;
    while i < lines.len() {
        let line = lines[i];
        let prev_blank = i == 0 || lines[i - 1].trim().is_empty();

        if prev_blank {
            if let Some(cap) = style1.captures(line) {
                let mut note = format!("[{}] {}", &cap[1], &cap[2]);
                let mut j = i + 1;
                let mut blanks = 0;
                while j < lines.len() {
                    let l = lines[j];
                    if style1.is_match(l) && blanks > 0 {
                        break;
                    }
                    if l.trim().is_empty() {
                        blanks += 1;
                        if blanks >= 2 {
                            break;
                        }
                    } else {
                        blanks = 0;
                    }
                    note.push('\n');
                    note.push_str(l);
                    j += 1;
                }
                notes.push(note.trim_end().to_string());
                i = j;
                continue;
            }
        }

        if let Some(cap) = style2.captures(line) {
            let (note, next) = indented_block(&lines, i, format!("[{}] {}", &cap[1], &cap[2]), &style2);
            notes.push(note);
            i = next;
            continue;
        }

        if let Some((number, rest)) = superscript_lead(line) {
            let (note, next) = indented_block(&lines, i, format!("[{number}] {rest}"), &style2);
            notes.push(note);
            i = next;
            continue;
        }

        main.push(line);
        i += 1;
    }

    assemble(text, main, notes)
}

/// Continuation shared by styles 2 and 3: lines belong to the footnote
/// while blank or indented by at least two spaces; the block ends at the
/// next footnote head or the first unindented non-blank line.
fn indented_block(
    lines: &[&str],
    start: usize,
    mut note: String,
    head: &Regex,
) -> (String, usize) {
    let mut j = start + 1;
    while j < lines.len() {
        let l = lines[j];
        if head.is_match(l) || superscript_lead(l).is_some() {
            break;
        }
        if !l.trim().is_empty() && !l.starts_with("  ") {
            break;
        }
        note.push('\n');
        note.push_str(l);
        j += 1;
    }
    (note.trim_end().to_string(), j)
}

/// A line opening with superscript digits followed by whitespace (style 3).
fn superscript_lead(line: &str) -> Option<(u32, &str)> {
    let mut number = 0u32;
    let mut seen = false;
    let mut chars = line.char_indices().peekable();
    while let Some(&(idx, c)) = chars.peek() {
        match superscript_digit(c) {
            Some(d) => {
                number = number * 10 + d;
                seen = true;
                let _ = chars.next();
            }
            None => {
                if !seen || !c.is_whitespace() {
                    return None;
                }
                return Some((number, line[idx..].trim_start()));
            }
        }
    }
    None
}

fn superscript_digit(c: char) -> Option<u32> {
    match c {
        '\u{2070}' => Some(0),
        '\u{b9}' => Some(1),
        '\u{b2}' => Some(2),
        '\u{b3}' => Some(3),
        '\u{2074}'..='\u{2079}' => Some(c as u32 - 0x2070),
        _ => None,
    }
}

/// Rewrite the head of a footnote block to the canonical `[N]` anchor
/// form. Used for blocks lifted out of the HTML tree, whose labels vary.
pub fn canonicalize_block(text: &str) -> String {
    let body = text.trim();

    // The bracketed rounds convention often survives unchanged inside an
    // HTML wrapper; its closing bracket goes with the head, exactly as in
    // [`extract_rounds`].
    let bracketed = Regex::new(r"^\[Footnote\s+(\w+):\s*").unwrap();
    if let Some(cap) = bracketed.captures(body) {
        let anchor = cap[1].to_string();
        let rest = bracketed.replace(body, "").into_owned();
        let rest = rest.strip_suffix(']').unwrap_or(&rest);
        return format!("[{anchor}] {rest}");
    }

    let heads = [
        Regex::new(r"^Footnote\s+(\w+)\s*:\s*").unwrap(),
        Regex::new(r"^\^\{(\w+)\}\s*").unwrap(),
        Regex::new(r"^\[(\w+)\]\s*").unwrap(),
    ];
    for head in &heads {
        if let Some(cap) = head.captures(body) {
            let anchor = cap[1].to_string();
            return head.replace(body, format!("[{anchor}] ")).into_owned();
        }
    }
    body.to_string()
}

/// Reattach the trailing newline the line split dropped and join the
/// footnotes in source order. Extraction only runs when asked for, so an
/// empty result is a recognition failure worth flagging.
fn assemble(original: &str, main: Vec<&str>, notes: Vec<String>) -> (String, String) {
    if notes.is_empty() {
        warn!("no footnote blocks recognized on this side");
    }
    let mut main = main.join("\n");
    if original.ends_with('\n') && !main.is_empty() {
        main.push('\n');
    }
    (main, notes.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_single_line() {
        let (main, notes) = extract_rounds("before\n[Footnote 2: short note.]\nafter\n");
        assert_eq!(main, "before\nafter\n");
        assert_eq!(notes, "[2] short note.");
    }

    #[test]
    fn rounds_multiline_with_nested_brackets() {
        let (main, notes) =
            extract_rounds("x\n[Footnote 7: see [3]\nand more.]\ny\n");
        assert_eq!(main, "x\ny\n");
        assert_eq!(notes, "[7] see [3]\nand more.");
    }

    #[test]
    fn rounds_continuation_joins_previous() {
        let (main, notes) = extract_rounds(
            "a\n[Footnote 1: first part.]\nb\n*[Footnote: second part.]\nc\n",
        );
        assert_eq!(main, "a\nb\nc\n");
        assert_eq!(notes, "[1] first part.\nsecond part.");
    }

    #[test]
    fn rounds_unnumbered() {
        let (_, notes) = extract_rounds("[Footnote: plain.]\n");
        assert_eq!(notes, "plain.");
    }

    #[test]
    fn processed_style1() {
        let input = "text\n\n[1] a note\ncontinued\n\n\nmore text\n";
        let (main, notes) = extract_processed(input);
        assert_eq!(notes, "[1] a note\ncontinued");
        assert!(main.contains("text"));
        assert!(main.contains("more text"));
        assert!(!main.contains("a note"));
    }

    #[test]
    fn processed_style1_needs_preceding_blank() {
        let input = "see note\n[1] not a footnote here\n";
        let (main, notes) = extract_processed(input);
        assert_eq!(notes, "");
        assert_eq!(main, input);
    }

    #[test]
    fn processed_style2() {
        let input = "body\nFootnote 4: begins\n  indented continuation\nunindented body\n";
        let (main, notes) = extract_processed(input);
        assert_eq!(notes, "[4] begins\n  indented continuation");
        assert_eq!(main, "body\nunindented body\n");
    }

    #[test]
    fn processed_style3() {
        let input = "body\n\u{b9} superscript note\n  more\nplain\n";
        let (main, notes) = extract_processed(input);
        assert_eq!(notes, "[1] superscript note\n  more");
        assert_eq!(main, "body\nplain\n");
    }

    #[test]
    fn no_footnotes_leaves_streams_alone() {
        let input = "just\nsome\nlines\n";
        let (main, notes) = extract_processed(input);
        assert_eq!(main, input);
        assert_eq!(notes, "");
    }

    #[test]
    fn canonical_anchor_forms() {
        assert_eq!(canonicalize_block("[Footnote 9: body]"), "[9] body");
        assert_eq!(canonicalize_block("Footnote 9: body"), "[9] body");
        assert_eq!(canonicalize_block("^{12} body"), "[12] body");
        assert_eq!(canonicalize_block("[3] body"), "[3] body");
        assert_eq!(canonicalize_block("plain body"), "plain body");
    }

    #[test]
    fn canonical_form_agrees_across_input_formats() {
        // The same rounds-convention block must come out identical whether
        // it arrived as text or wrapped in HTML.
        let (_, from_text) = extract_rounds("[Footnote 9: Some note text.]\n");
        let from_html = canonicalize_block("[Footnote 9: Some note text.]");
        assert_eq!(from_text, from_html);
        assert_eq!(from_html, "[9] Some note text.");
    }
}

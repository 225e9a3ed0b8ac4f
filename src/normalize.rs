//! Character normalizations shared by both sides.
//!
//! Each conversion is gated on asymmetry: a fancy character is rewritten
//! to its plain form only when the other stream contains no occurrence of
//! it. When both sides use the character, both keep it and the word-diff
//! stays quiet. Running the normalizer twice is a no-op: no plain form
//! ever contains a fancy character.

/// (fancy, plain) pairs, applied independently of one another.
const CONVERSIONS: &[(char, &str)] = &[
    ('\u{2018}', "'"),   // left single quote
    ('\u{2019}', "'"),   // right single quote
    ('\u{201c}', "\""),  // left double quote
    ('\u{201d}', "\""),  // right double quote
    ('\u{ba}', "o"),     // masculine ordinal
    ('\u{aa}', "a"),     // feminine ordinal
    ('\u{2013}', "-"),   // en dash
    ('\u{2014}', "--"),  // em dash
    ('\u{2044}', "/"),   // fraction slash
    ('\u{2032}', "'"),   // prime
    ('\u{2033}', "''"),  // double prime
    ('\u{2034}', "'''"), // triple prime
    ('\u{2080}', "0"),
    ('\u{2081}', "1"),
    ('\u{2082}', "2"),
    ('\u{2083}', "3"),
    ('\u{2084}', "4"),
    ('\u{2085}', "5"),
    ('\u{2086}', "6"),
    ('\u{2087}', "7"),
    ('\u{2088}', "8"),
    ('\u{2089}', "9"),
    ('\u{2070}', "0"),
    ('\u{b9}', "1"),
    ('\u{b2}', "2"),
    ('\u{b3}', "3"),
    ('\u{2074}', "4"),
    ('\u{2075}', "5"),
    ('\u{2076}', "6"),
    ('\u{2077}', "7"),
    ('\u{2078}', "8"),
    ('\u{2079}', "9"),
];

/// Apply the asymmetry-gated conversions to a pair of streams, then fold
/// case if asked. Ligatures are deliberately left alone.
pub fn normalize_pair(left: &mut String, right: &mut String, ignore_case: bool) {
    for &(fancy, plain) in CONVERSIONS {
        let in_left = left.contains(fancy);
        let in_right = right.contains(fancy);
        if in_left && !in_right {
            *left = left.replace(fancy, plain);
        } else if in_right && !in_left {
            *right = right.replace(fancy, plain);
        }
    }
    if ignore_case {
        *left = left.to_lowercase();
        *right = right.to_lowercase();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalized(left: &str, right: &str) -> (String, String) {
        let mut l = left.to_string();
        let mut r = right.to_string();
        normalize_pair(&mut l, &mut r, false);
        (l, r)
    }

    #[test]
    fn curly_quotes_rewritten_on_the_fancy_side() {
        let (l, r) = normalized("\u{201c}Hello\u{201d}", "\"Hello\"");
        assert_eq!(l, "\"Hello\"");
        assert_eq!(r, "\"Hello\"");
    }

    #[test]
    fn symmetric_characters_are_left_alone() {
        let (l, r) = normalized("a\u{2014}b", "c\u{2014}d");
        assert_eq!(l, "a\u{2014}b");
        assert_eq!(r, "c\u{2014}d");
    }

    #[test]
    fn dashes_and_primes() {
        let (l, r) = normalized("1\u{2013}2 at 5\u{2032}10\u{2033}", "1-2 at 5'10''");
        assert_eq!(l, "1-2 at 5'10''");
        assert_eq!(r, "1-2 at 5'10''");
    }

    #[test]
    fn super_and_subscript_digits() {
        let (l, r) = normalized("H\u{2082}O and x\u{b2}", "H2O and x2");
        assert_eq!(l, "H2O and x2");
        assert_eq!(r, "H2O and x2");
    }

    #[test]
    fn idempotent() {
        let mut l = "\u{2018}one\u{2019} \u{2014} two".to_string();
        let mut r = "'one' -- two".to_string();
        normalize_pair(&mut l, &mut r, false);
        let (l1, r1) = (l.clone(), r.clone());
        normalize_pair(&mut l, &mut r, false);
        assert_eq!((l, r), (l1, r1));
    }

    #[test]
    fn case_folding() {
        let mut l = "Hello WORLD".to_string();
        let mut r = "hello world".to_string();
        normalize_pair(&mut l, &mut r, true);
        assert_eq!(l, r);
    }

    #[test]
    fn ligatures_untouched() {
        let (l, r) = normalized("man\u{153}uvre", "manoeuvre");
        assert_eq!(l, "man\u{153}uvre");
        assert_eq!(r, "manoeuvre");
    }
}

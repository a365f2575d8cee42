//! Text canonicalization for element comparison.
//!
//! Browsers render full-width and half-width forms identically, and the
//! static parse and the live DOM rarely agree on whitespace. Every text
//! comparison in the correlation engine goes through [`normalize`] so
//! equivalent labels compare equal while non-Latin script content is
//! left untouched.

/// Full-width punctuation folded to its half-width form.
///
/// Punctuation only: ideographic and kana characters carry meaning and
/// are never rewritten.
const PUNCT_FOLD: &[(char, &str)] = &[
    ('！', "!"),
    ('？', "?"),
    ('：', ":"),
    ('；', ";"),
    ('（', "("),
    ('）', ")"),
    ('［', "["),
    ('］', "]"),
    ('｛', "{"),
    ('｝', "}"),
    ('．', "."),
    ('，', ","),
    ('‼', "!!"),
    ('⁉', "!?"),
    ('⁈', "?!"),
    ('〜', "~"),
    ('～', "~"),
    ('―', "-"),
    ('…', "..."),
];

/// Full-width (ideographic) space code point.
const IDEOGRAPHIC_SPACE: char = '\u{3000}';

fn fold_punct(c: char) -> Option<&'static str> {
    PUNCT_FOLD.iter().find(|(f, _)| *f == c).map(|(_, h)| *h)
}

/// Canonicalize visible text for comparison.
///
/// Steps, in order: fold the ideographic space to an ASCII space, fold
/// full-width punctuation to half-width, replace non-printable control
/// characters with a space, then collapse whitespace runs and trim.
///
/// The function is pure and idempotent: `normalize(normalize(x)) ==
/// normalize(x)` for all inputs. The result never contains consecutive
/// spaces or leading/trailing whitespace.
#[must_use]
pub fn normalize(text: &str) -> String {
    let mut folded = String::with_capacity(text.len());
    for c in text.chars() {
        if c == IDEOGRAPHIC_SPACE {
            folded.push(' ');
        } else if let Some(half) = fold_punct(c) {
            folded.push_str(half);
        } else if c.is_control() && !c.is_whitespace() {
            // Hidden control characters silently break equality checks
            folded.push(' ');
        } else {
            folded.push(c);
        }
    }
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalize and additionally strip internal spaces.
///
/// Used by the exact-match correlation tier, where inline markup can
/// introduce inconsistent intra-text spacing between the static parse
/// and the live render.
#[must_use]
pub fn normalize_compact(text: &str) -> String {
    normalize(text).replace(' ', "")
}

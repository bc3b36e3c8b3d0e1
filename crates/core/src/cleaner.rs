//! Repairs extraction artifacts in book text.
//!
//! The cleaner is a fixed sequence of passes over the whole string. Order
//! matters: every pass assumes the ones before it already ran, e.g. header
//! detection relies on lines being trimmed and spaces collapsed.
//!
//! [`clean_paragraphs`] stops before the final flattening so the segmenter can
//! still see blank-line paragraph breaks; [`flatten`] turns the result into a
//! single reading string. [`clean`] runs both.

use regex::Regex;
use std::sync::LazyLock;
use tracing::trace;

type Pass = fn(&str) -> String;

/// Line-break variants rewritten to `\n`. `\r\n` must come before `\r`.
const LINE_BREAKS: &[&str] = &[
    "\r\n", "\r", "\u{2028}", "\u{2029}", "\u{0085}", "\u{000B}", "\u{000C}",
];

const SPACE_VARIANTS: &[char] = &[
    '\u{00A0}', '\u{1680}', '\u{2000}', '\u{2001}', '\u{2002}', '\u{2003}', '\u{2004}',
    '\u{2005}', '\u{2006}', '\u{2007}', '\u{2008}', '\u{2009}', '\u{200A}', '\u{202F}',
    '\u{205F}', '\u{3000}',
];

const PUNCTUATION_VARIANTS: &[(char, char)] = &[
    ('\u{201C}', '"'),
    ('\u{201D}', '"'),
    ('\u{201E}', '"'),
    ('\u{201F}', '"'),
    ('\u{00AB}', '"'),
    ('\u{00BB}', '"'),
    ('\u{2033}', '"'),
    ('\u{2018}', '\''),
    ('\u{2019}', '\''),
    ('\u{201A}', '\''),
    ('\u{201B}', '\''),
    ('\u{2032}', '\''),
    ('\u{2010}', '-'),
    ('\u{2011}', '-'),
    ('\u{2012}', '-'),
    ('\u{2013}', '-'),
    ('\u{2014}', '-'),
    ('\u{2015}', '-'),
    ('\u{2212}', '-'),
];

const LIGATURES: &[(char, &str)] = &[
    ('\u{FB00}', "ff"),
    ('\u{FB01}', "fi"),
    ('\u{FB02}', "fl"),
    ('\u{FB03}', "ffi"),
    ('\u{FB04}', "ffl"),
    ('\u{FB05}', "st"),
    ('\u{FB06}', "st"),
    ('\u{00C6}', "AE"),
    ('\u{00E6}', "ae"),
    ('\u{0152}', "OE"),
    ('\u{0153}', "oe"),
    ('\u{0132}', "IJ"),
    ('\u{0133}', "ij"),
];

/// Zero-width and bidi format characters that carry no reading content.
const INVISIBLE_CHARACTERS: &[char] = &[
    '\u{200B}', '\u{200C}', '\u{200D}', '\u{200E}', '\u{200F}', '\u{202A}', '\u{202B}',
    '\u{202C}', '\u{202D}', '\u{202E}', '\u{2060}', '\u{2061}', '\u{2062}', '\u{2063}',
    '\u{2064}', '\u{2066}', '\u{2067}', '\u{2068}', '\u{2069}', '\u{FEFF}',
];

const SOFT_HYPHEN: char = '\u{00AD}';

/// Whole-line running headers and footers. Matched case-insensitively.
const HEADER_FOOTER_RULES: &[&str] = &[
    r"^\d{1,4}$",
    r"^(?:page|p[aá]g(?:ina)?\.?|p\.)\s*\d{1,4}(?:\s*(?:of|de|/)\s*\d{1,4})?$",
    r"^-\s*\d{1,4}\s*-$",
    r"^\d{1,4}\s*(?:of|de|/)\s*\d{1,4}$",
    r"^\[\s*\d{1,4}\s*\]$",
];

/// Whole-line structural headings. Each rule carries its own flags since
/// roman numerals must stay upper case to avoid eating words like "mix".
const HEADING_RULES: &[&str] = &[
    r"(?i)^(?:chapter|cap[ií]tulo|part|parte|section|secci[oó]n|book|libro|unit|unidad|lesson|lecci[oó]n)\s+(?:\d{1,3}|(?-i:[IVXLCDM]{1,7})|one|two|three|four|five|six|seven|eight|nine|ten|uno|dos|tres|cuatro|cinco|seis|siete|ocho|nueve|diez|primer[oa]?|segund[oa]|tercer[oa]?)\b(?:\s*[.:\-]\s*[^.!?]{0,80})?$",
    r"(?i)^(?:introduction|introducci[oó]n|prologue|pr[oó]logo|preface|prefacio|foreword|epilogue|ep[ií]logo|afterword|conclusion|conclusi[oó]n|bibliography|bibliograf[ií]a|references|referencias|index|[ií]ndice|acknowledge?ments|agradecimientos|contents|table of contents|contenido)[.:]?$",
    r"^[IVXLCDM]{1,7}\.?$",
    r"^\d{1,2}(?:\.\d{1,2})+\.?\s+\p{Lu}[^.!?]{0,60}$",
];

static HYPHEN_LINE_BREAK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\p{L})[\-\u{00AD}\u{2010}\u{2011}][ \t]*\n\s*(\p{L})")
        .expect("valid hyphen line-break regex")
});

static HYPHEN_SPACE_BREAK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\p{L})[\-\u{2010}\u{2011}][ \t]+(\p{L})").expect("valid hyphen space regex")
});

static SOFT_HYPHEN_BREAK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\p{L})\u{00AD}[ \t]*(\p{L})").expect("valid soft hyphen regex")
});

static HORIZONTAL_SPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t]+").expect("valid space run regex"));

static BLANK_LINE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("valid blank line regex"));

static INLINE_PAGE_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)[ \t]*--[ \t]*\d+[ \t]+(?:of|de)[ \t]+\d+[ \t]*--[ \t]*")
        .expect("valid page marker regex")
});

static TOC_LEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^(.*?)[ \t]*(?:\.[ \t]*){3,}\d{1,4}[ \t]*$").expect("valid toc regex")
});

static HEADER_FOOTER_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    HEADER_FOOTER_RULES
        .iter()
        .map(|rule| Regex::new(&format!("(?i){rule}")).expect("valid header/footer regex"))
        .collect()
});

static HEADING_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    HEADING_RULES
        .iter()
        .map(|rule| Regex::new(rule).expect("valid heading regex"))
        .collect()
});

/// Passes 1 to 15, in order. Hyphenation runs twice: the second sweep joins
/// word halves that only met once a header, marker or heading line between
/// them was removed.
const PARAGRAPH_PASSES: &[(&str, Pass)] = &[
    ("line_breaks", normalize_line_breaks),
    ("spaces", normalize_spaces),
    ("punctuation", normalize_punctuation),
    ("ligatures", expand_ligatures),
    ("invisible", strip_invisible),
    ("hyphenation", rejoin_hyphenation),
    ("space_runs", collapse_space_runs),
    ("blank_lines", collapse_blank_lines),
    ("page_markers", remove_page_markers),
    ("headers_footers", remove_headers_footers),
    ("toc_leaders", simplify_toc_lines),
    ("blank_lines", collapse_blank_lines),
    ("headings", remove_headings),
    ("blank_lines", collapse_blank_lines),
    ("exposed_hyphenation", rejoin_hyphenation),
    ("soft_hyphens", strip_soft_hyphens),
];

/// Full cleanup: one flowing reading string.
///
/// Flattening can turn a split line such as "Chapter" / "2: The Storm" into
/// one line that a whole-line rule matches, so the passes repeat until the
/// output stops changing. Every repeat only removes text, so this ends.
pub fn clean(text: &str) -> String {
    let mut current = flatten(&clean_paragraphs(text));
    loop {
        let next = flatten(&clean_paragraphs(&current));
        if next == current {
            return current;
        }
        current = next;
    }
}

/// Cleanup that keeps blank-line paragraph breaks.
pub fn clean_paragraphs(text: &str) -> String {
    PARAGRAPH_PASSES
        .iter()
        .fold(text.to_string(), |current, (name, pass)| {
            let next = pass(&current);
            trace!(pass = *name, before = current.len(), after = next.len(), "cleaner pass");
            next
        })
}

/// Joins all lines with single spaces.
pub fn flatten(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn normalize_line_breaks(text: &str) -> String {
    LINE_BREAKS
        .iter()
        .fold(text.to_string(), |current, variant| current.replace(variant, "\n"))
}

fn normalize_spaces(text: &str) -> String {
    text.chars()
        .map(|c| if SPACE_VARIANTS.contains(&c) { ' ' } else { c })
        .collect()
}

fn normalize_punctuation(text: &str) -> String {
    text.chars()
        .map(|c| {
            PUNCTUATION_VARIANTS
                .iter()
                .find(|(variant, _)| *variant == c)
                .map_or(c, |(_, ascii)| *ascii)
        })
        .collect()
}

fn expand_ligatures(text: &str) -> String {
    let mut expanded = String::with_capacity(text.len());
    for c in text.chars() {
        match LIGATURES.iter().find(|(ligature, _)| *ligature == c) {
            Some((_, letters)) => expanded.push_str(letters),
            None => expanded.push(c),
        }
    }
    expanded
}

fn strip_invisible(text: &str) -> String {
    text.chars()
        .filter(|c| {
            let control = c.is_control() && !matches!(c, '\n' | '\t' | '\r');
            !control && !INVISIBLE_CHARACTERS.contains(c)
        })
        .collect()
}

fn rejoin_hyphenation(text: &str) -> String {
    let joined = replace_until_stable(&HYPHEN_LINE_BREAK, text.to_string(), "$1$2");
    let joined = replace_until_stable(&HYPHEN_SPACE_BREAK, joined, "$1$2");
    replace_until_stable(&SOFT_HYPHEN_BREAK, joined, "$1$2")
}

fn collapse_space_runs(text: &str) -> String {
    HORIZONTAL_SPACE_RUN.replace_all(text, " ").into_owned()
}

fn collapse_blank_lines(text: &str) -> String {
    let trimmed = text.lines().map(str::trim).collect::<Vec<_>>().join("\n");
    BLANK_LINE_RUN
        .replace_all(&trimmed, "\n\n")
        .trim()
        .to_string()
}

fn remove_page_markers(text: &str) -> String {
    INLINE_PAGE_MARKER.replace_all(text, " ").into_owned()
}

fn remove_headers_footers(text: &str) -> String {
    remove_matching_lines(text, &HEADER_FOOTER_PATTERNS)
}

fn simplify_toc_lines(text: &str) -> String {
    TOC_LEADER.replace_all(text, "$1").into_owned()
}

fn remove_headings(text: &str) -> String {
    remove_matching_lines(text, &HEADING_PATTERNS)
}

fn strip_soft_hyphens(text: &str) -> String {
    text.replace(SOFT_HYPHEN, "")
}

/// Blanks out lines matching any pattern, keeping the line so paragraph
/// breaks around it survive until the next blank-line collapse.
fn remove_matching_lines(text: &str, patterns: &[Regex]) -> String {
    text.split('\n')
        .map(|line| {
            let candidate = line.trim();
            if !candidate.is_empty() && patterns.iter().any(|pattern| pattern.is_match(candidate)) {
                ""
            } else {
                line
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Overlapping breaks ("a-\nb-\nc") need more than one sweep.
fn replace_until_stable(pattern: &Regex, text: String, replacement: &str) -> String {
    let mut current = text;
    loop {
        let next = pattern.replace_all(&current, replacement);
        if next == current {
            return current;
        }
        current = next.into_owned();
    }
}

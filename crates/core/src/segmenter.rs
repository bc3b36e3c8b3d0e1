//! Splits cleaned book text into reader-sized segments.
//!
//! Input is the paragraph-preserving output of
//! [`clean_paragraphs`](crate::cleaner::clean_paragraphs). Paragraphs are
//! folded through [`SegmentFold`], which owns the pending accumulator and
//! decides when to flush. Oversized paragraphs are cut at sentence
//! boundaries first and by raw word count only when a single sentence run is
//! itself too long.

use crate::cleaner::flatten;
use crate::error::{PipelineError, Result};
use crate::models::Segment;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

pub const MIN_WORDS: usize = 200;
pub const MAX_WORDS: usize = 500;
pub const TARGET_WORDS: usize = 350;
pub const MIN_WORDS_PER_SEGMENT: usize = 10;
pub const MIN_WORDS_FINAL_FLUSH: usize = 1;
pub const MIN_WORDS_REST: usize = 50;
pub const MIN_WORDS_PARAGRAPH: usize = 3;
pub const MIN_CHARS_PARAGRAPH: usize = 10;
/// Fraction a sentence-built chunk may exceed the target before a cut.
pub const SENTENCE_OVERSHOOT: f64 = 0.3;

const SENTENCE_TERMINATORS: &[char] = &['.', '!', '?', '…'];
/// Closing marks that stay attached to the sentence they end.
const SENTENCE_CLOSERS: &[char] = &['"', '\'', ')', ']', '»'];
/// Spanish opening marks start a new sentence even without a terminator.
const SENTENCE_OPENERS: &[char] = &['¿', '¡'];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentingConfig {
    pub min_words: usize,
    pub max_words: usize,
    pub target_words: usize,
    pub min_words_per_segment: usize,
    pub min_words_final_flush: usize,
    pub min_words_rest: usize,
    pub min_words_paragraph: usize,
    pub min_chars_paragraph: usize,
    pub sentence_overshoot: f64,
}

impl Default for SegmentingConfig {
    fn default() -> Self {
        Self {
            min_words: MIN_WORDS,
            max_words: MAX_WORDS,
            target_words: TARGET_WORDS,
            min_words_per_segment: MIN_WORDS_PER_SEGMENT,
            min_words_final_flush: MIN_WORDS_FINAL_FLUSH,
            min_words_rest: MIN_WORDS_REST,
            min_words_paragraph: MIN_WORDS_PARAGRAPH,
            min_chars_paragraph: MIN_CHARS_PARAGRAPH,
            sentence_overshoot: SENTENCE_OVERSHOOT,
        }
    }
}

impl SegmentingConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_words == 0 {
            return Err(PipelineError::InvalidConfig(
                "max_words must be greater than zero".to_string(),
            ));
        }
        if self.min_words > self.max_words {
            return Err(PipelineError::InvalidConfig(format!(
                "min_words ({}) exceeds max_words ({})",
                self.min_words, self.max_words
            )));
        }
        if self.target_words == 0 || self.target_words > self.max_words {
            return Err(PipelineError::InvalidConfig(format!(
                "target_words ({}) must be within 1..={}",
                self.target_words, self.max_words
            )));
        }
        if self.sentence_overshoot.is_nan() || self.sentence_overshoot < 0.0 {
            return Err(PipelineError::InvalidConfig(
                "sentence_overshoot must be zero or positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Largest sentence-built chunk before a run is cut by word count.
    fn overshoot_limit(&self) -> usize {
        let limit = (self.target_words as f64 * (1.0 + self.sentence_overshoot)).floor() as usize;
        limit.max(self.target_words)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Segmenter {
    config: SegmentingConfig,
}

impl Segmenter {
    pub fn new(config: SegmentingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SegmentingConfig {
        &self.config
    }

    /// Segments paragraph-delimited text.
    ///
    /// `page_count` drives the word-density page estimate; `None` or `Some(0)`
    /// leaves every `page_number` unset.
    pub fn segment(&self, text: &str, page_count: Option<u32>) -> Vec<Segment> {
        let paragraphs = split_paragraphs(text, &self.config);
        let mut fold = SegmentFold::new(&self.config);
        for paragraph in &paragraphs {
            fold.push_paragraph(paragraph);
        }
        let contents = fold.finish();

        let mut pages = PageEstimator::new(&contents, page_count);
        contents
            .into_iter()
            .enumerate()
            .map(|(index, content)| {
                let page_number = pages.next_page(word_count(&content));
                Segment {
                    content,
                    order: u32::try_from(index + 1).unwrap_or(u32::MAX),
                    page_number,
                    external_id: Uuid::new_v4().to_string(),
                }
            })
            .collect()
    }
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Splits on blank lines and drops noise paragraphs.
///
/// When every paragraph is noise but the text as a whole is not, the whole
/// text becomes one paragraph so short documents are never lost.
pub fn split_paragraphs(text: &str, config: &SegmentingConfig) -> Vec<String> {
    let is_real = |paragraph: &str| {
        word_count(paragraph) >= config.min_words_paragraph
            || paragraph.chars().count() >= config.min_chars_paragraph
    };

    let paragraphs = text
        .split("\n\n")
        .map(flatten)
        .filter(|paragraph| !paragraph.is_empty())
        .filter(|paragraph| is_real(paragraph))
        .collect::<Vec<_>>();

    if paragraphs.is_empty() {
        let whole = flatten(text);
        if !whole.is_empty() && is_real(&whole) {
            return vec![whole];
        }
    }

    paragraphs
}

/// Splits at `. ! ? …` (plus trailing closing quotes), before `¿ ¡`, and at
/// blank lines. Pieces keep their punctuation.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((index, c)) = chars.next() {
        let boundary = if SENTENCE_TERMINATORS.contains(&c) {
            let mut end = index + c.len_utf8();
            while let Some(&(next_index, next)) = chars.peek() {
                if SENTENCE_TERMINATORS.contains(&next) || SENTENCE_CLOSERS.contains(&next) {
                    end = next_index + next.len_utf8();
                    chars.next();
                } else {
                    break;
                }
            }
            match chars.peek() {
                Some(&(_, next)) if next.is_whitespace() => Some(end),
                None => Some(end),
                _ => None,
            }
        } else if SENTENCE_OPENERS.contains(&c) && !text[start..index].trim().is_empty() {
            Some(index)
        } else if c == '\n' && text[index..].starts_with("\n\n") {
            Some(index)
        } else {
            None
        };

        if let Some(end) = boundary {
            let sentence = text[start..end].trim();
            if !sentence.is_empty() {
                sentences.push(sentence);
            }
            start = end;
        }
    }

    let rest = text[start..].trim();
    if !rest.is_empty() {
        sentences.push(rest);
    }
    sentences
}

/// Groups a long paragraph into chunks close to the target size.
pub fn split_into_chunks(paragraph: &str, config: &SegmentingConfig) -> Vec<String> {
    let limit = config.overshoot_limit();
    let mut chunks = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for sentence in split_sentences(paragraph) {
        let words = sentence.split_whitespace().collect::<Vec<_>>();
        let combined = current.len() + words.len();

        if combined <= config.target_words {
            current.extend(words);
        } else if combined <= limit || current.len() < config.min_words_per_segment {
            current.extend(words);
            if current.len() > limit {
                cut_by_words(&mut current, &mut chunks, config.target_words);
            } else {
                chunks.push(current.join(" "));
                current.clear();
            }
        } else if words.len() > limit {
            current.extend(words);
            cut_by_words(&mut current, &mut chunks, config.target_words);
        } else {
            chunks.push(current.join(" "));
            current = words;
        }
    }

    if !current.is_empty() {
        chunks.push(current.join(" "));
    }
    chunks
}

/// Last resort for a run with no usable sentence break: emits full
/// `target`-sized pieces and leaves the remainder in `words`.
fn cut_by_words<'a>(words: &mut Vec<&'a str>, chunks: &mut Vec<String>, target: usize) {
    let target = target.max(1);
    while words.len() > target {
        let rest = words.split_off(target);
        chunks.push(words.join(" "));
        *words = rest;
    }
}

/// Accumulator state for the paragraph walk.
#[derive(Debug)]
pub struct SegmentFold<'c> {
    config: &'c SegmentingConfig,
    pending: Vec<String>,
    pending_words: usize,
    emitted: Vec<String>,
}

impl<'c> SegmentFold<'c> {
    pub fn new(config: &'c SegmentingConfig) -> Self {
        Self {
            config,
            pending: Vec::new(),
            pending_words: 0,
            emitted: Vec::new(),
        }
    }

    pub fn pending_words(&self) -> usize {
        self.pending_words
    }

    pub fn emitted(&self) -> &[String] {
        &self.emitted
    }

    pub fn push_paragraph(&mut self, paragraph: &str) {
        let words = word_count(paragraph);
        if words == 0 {
            return;
        }
        let combined = self.pending_words + words;

        if combined > self.config.max_words {
            if self.pending_words >= self.config.min_words {
                self.flush();
                self.push_paragraph(paragraph);
            } else {
                self.distribute_long(paragraph);
            }
        } else if combined >= self.config.min_words {
            self.append(paragraph.to_string(), words);
            self.flush();
        } else {
            self.append(paragraph.to_string(), words);
            if self.pending_words >= self.config.target_words {
                self.flush();
            }
        }
    }

    /// Emits whatever is pending and returns every segment body in order.
    pub fn finish(mut self) -> Vec<String> {
        if self.pending_words >= self.config.min_words_rest {
            self.flush();
        } else if self.pending_words >= self.config.min_words_final_flush.max(1) {
            self.flush_allowing_small();
        }
        self.emitted
    }

    fn distribute_long(&mut self, paragraph: &str) {
        let mut chunks = split_into_chunks(paragraph, self.config).into_iter();
        let Some(first) = chunks.next() else {
            return;
        };

        let first_words = word_count(&first);
        if self.pending_words + first_words <= self.config.max_words {
            self.append(first, first_words);
            self.flush();
        } else {
            self.flush();
            self.append(first, first_words);
            self.flush();
        }

        let mut rest = chunks.peekable();
        while let Some(chunk) = rest.next() {
            let chunk_words = word_count(&chunk);
            let is_last = rest.peek().is_none();
            self.append(chunk, chunk_words);
            if !is_last || chunk_words >= self.config.min_words {
                self.flush();
            }
        }
    }

    fn append(&mut self, text: String, words: usize) {
        self.pending.push(text);
        self.pending_words += words;
    }

    fn flush(&mut self) {
        self.flush_with_floor(self.config.min_words_per_segment);
    }

    fn flush_allowing_small(&mut self) {
        self.flush_with_floor(self.config.min_words_final_flush);
    }

    fn flush_with_floor(&mut self, floor: usize) {
        if self.pending.is_empty() {
            return;
        }
        let words = self.pending_words;
        let content = self.pending.join(" ");
        self.pending.clear();
        self.pending_words = 0;

        if words < floor {
            debug!(words, floor, "discarding undersized segment candidate");
            return;
        }
        self.emitted.push(content);
    }
}

/// Word-density page model: every page is assumed to hold the same number of words.
#[derive(Debug)]
struct PageEstimator {
    words_per_page: usize,
    page_count: u32,
    current_page: u32,
    words_on_page: usize,
}

impl PageEstimator {
    fn new(contents: &[String], page_count: Option<u32>) -> Self {
        let page_count = page_count.unwrap_or(0);
        let total_words = contents.iter().map(|content| word_count(content)).sum::<usize>();
        let words_per_page = if page_count > 0 {
            total_words.div_ceil(page_count as usize).max(1)
        } else {
            0
        };

        Self {
            words_per_page,
            page_count,
            current_page: 1,
            words_on_page: 0,
        }
    }

    /// Page the next segment starts on, then advances past its words.
    fn next_page(&mut self, segment_words: usize) -> Option<u32> {
        if self.page_count == 0 {
            return None;
        }

        let page = self.current_page;
        self.words_on_page += segment_words;
        while self.words_on_page >= self.words_per_page && self.current_page < self.page_count {
            self.words_on_page -= self.words_per_page;
            self.current_page += 1;
        }
        Some(page)
    }
}

use std::borrow::Cow;

use anyhow::{Context, Result};
use regex::Regex;

/// Turns raw cue text into transcript text.
///
/// The patterns are compiled once and then only read, so a single instance
/// can be shared by every worker.
pub struct Normaliser {
    tags: Regex,
    parens: Regex,
    punctuation: Regex,
}

impl Normaliser {
    pub fn new() -> Result<Self> {
        Ok(Self {
            // Anything between `<` and `>`, plus ASS overrides like `{\an8}`.
            tags: Regex::new(r"<[^>]*>|\{\\[^}]*\}").context("Invalid tag regex.")?,
            // Greedy on purpose: removes from the first `(` to the last `)` of a line.
            parens: Regex::new(r"\(.*\)").context("Invalid parenthesis regex.")?,
            // All Unicode punctuation except the apostrophe.
            punctuation: Regex::new(r"[\p{P}&&[^']]+").context("Invalid punctuation regex.")?,
        })
    }

    pub fn strip_tags<'a>(&self, text: &'a str) -> Cow<'a, str> {
        self.tags.replace_all(text, "")
    }

    /// Removes parentheticals, flattens lines, lowercases and strips punctuation.
    ///
    /// Surrounding whitespace is left alone.
    pub fn normalise(&self, text: &str) -> String {
        let text = self.parens.replace_all(text, "");
        let text = text.replace('\n', " ").to_lowercase();
        self.punctuation.replace_all(&text, "").into_owned()
    }

    /// Normalised transcript for the lines of one cue.
    pub fn clean_cue(&self, lines: &[String]) -> String {
        let joined = lines.join("\n");
        self.normalise(&self.strip_tags(&joined))
    }
}

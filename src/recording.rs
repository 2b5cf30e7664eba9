use std::cmp::Ordering;
use std::path::Path;

#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub(crate) id: usize,
    /// Seconds.
    pub(crate) start: f64,
    /// Seconds.
    pub(crate) end: f64,
    pub(crate) text: String,
}

/// All valid utterances of one subtitle file.
#[derive(Debug)]
pub struct Recording {
    basename: String,
    utterances: Vec<Utterance>,
    dropped: usize,
    skipped_blocks: usize,
}

impl Recording {
    pub fn new(basename: impl Into<String>) -> Self {
        Self {
            basename: basename.into(),
            utterances: Vec::new(),
            dropped: 0,
            skipped_blocks: 0,
        }
    }

    /// Creates a recording named after the file stem of `path`.
    pub fn for_file(path: &Path) -> Self {
        let basename = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::new(basename)
    }

    /// Adds an utterance spanning `start_ms..end_ms`.
    ///
    /// Returns `false` and stores nothing when the span is empty or inverted,
    /// or when the text has nothing but whitespace in it.
    pub fn add(&mut self, start_ms: u64, end_ms: u64, text: &str) -> bool {
        if text.trim().is_empty() || start_ms >= end_ms {
            self.dropped += 1;
            return false;
        }
        self.utterances.push(Utterance {
            id: self.utterances.len(),
            start: start_ms as f64 / 1000.0,
            end: end_ms as f64 / 1000.0,
            text: text.split_whitespace().collect::<Vec<_>>().join(" "),
        });
        true
    }

    pub fn basename(&self) -> &str {
        &self.basename
    }

    pub fn utterances(&self) -> &[Utterance] {
        &self.utterances
    }

    /// Number of cues that were rejected by `add`.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// Notes blocks of the source file that were not cues at all.
    pub fn record_skipped_blocks(&mut self, count: usize) {
        self.skipped_blocks += count;
    }

    pub fn skipped_blocks(&self) -> usize {
        self.skipped_blocks
    }

    pub fn len(&self) -> usize {
        self.utterances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.utterances.is_empty()
    }
}

impl PartialEq for Recording {
    fn eq(&self, other: &Self) -> bool {
        self.basename == other.basename
    }
}

impl Eq for Recording {}

impl PartialOrd for Recording {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Recording {
    fn cmp(&self, other: &Self) -> Ordering {
        self.basename.cmp(&other.basename)
    }
}

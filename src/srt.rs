use std::time::Duration;

#[derive(Debug)]
pub struct Subtitle {
    pub(crate) sequence_number: Option<usize>,
    pub(crate) show_at: Duration,
    pub(crate) hide_at: Duration,
    pub(crate) text: Vec<String>,
}

/// The cues of one subtitle file, in file order.
#[derive(Debug, Default)]
pub struct SubtitleFile {
    pub(crate) subtitles: Vec<Subtitle>,
    /// Blocks that did not look like a cue and were skipped.
    pub(crate) skipped_blocks: usize,
}

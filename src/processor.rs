use crate::normaliser::Normaliser;
use crate::parser::{self, Encoding, Parser};
use crate::recording::Recording;
use crate::srt::SubtitleFile;

use std::path::Path;

use anyhow::{Context, Result};
use log::{debug, trace};

/// Reads and parses one subtitle file into a `Recording`.
pub fn process_file(path: &Path, normaliser: &Normaliser) -> Result<Recording> {
    let bytes = std::fs::read(path)
        .context(format!("Failed to open input file: '{}'", path.display()))?;
    let (data, encoding) = parser::decode(&bytes);
    if encoding != Encoding::Utf8 {
        debug!("'{}' is not valid UTF-8, read as {}", path.display(), encoding);
    }

    let file = Parser::new()
        .parse(&data)
        .context(format!("Failed to parse SRT file: '{}'", path.display()))?;
    if file.skipped_blocks > 0 {
        debug!(
            "'{}': skipped {} malformed block(s)",
            path.display(),
            file.skipped_blocks
        );
    }

    let reco = process(Recording::for_file(path), file, normaliser);
    debug!(
        "'{}': {} utterance(s), {} cue(s) dropped",
        path.display(),
        reco.len(),
        reco.dropped()
    );
    Ok(reco)
}

fn process(mut reco: Recording, file: SubtitleFile, normaliser: &Normaliser) -> Recording {
    reco.record_skipped_blocks(file.skipped_blocks);
    for sub in file.subtitles {
        let text = normaliser.clean_cue(&sub.text);
        let start = sub.show_at.as_millis() as u64;
        let end = sub.hide_at.as_millis() as u64;
        if !reco.add(start, end, &text) {
            match sub.sequence_number {
                Some(n) => trace!("{}: dropped cue {}", reco.basename(), n),
                None => trace!("{}: dropped cue at {:?}", reco.basename(), sub.show_at),
            }
        }
    }
    reco
}

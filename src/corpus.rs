use crate::error::CorpusError;
use crate::normaliser::Normaliser;
use crate::processor;
use crate::recording::Recording;
use crate::serialiser::{AudioSource, Manifests};

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{info, warn};
use rayon::prelude::*;
use walkdir::WalkDir;

pub struct CorpusOpts {
    pub subtitle_dir: PathBuf,
    pub audio_dir: PathBuf,
    pub output_dir: PathBuf,
    pub jobs: usize,
    pub subtitle_extension: String,
    pub audio_extension: String,
}

impl CorpusOpts {
    pub fn new<P: Into<PathBuf>>(subtitle_dir: P, audio_dir: P, output_dir: P) -> Self {
        Self {
            subtitle_dir: subtitle_dir.into(),
            audio_dir: audio_dir.into(),
            output_dir: output_dir.into(),
            jobs: 10,
            subtitle_extension: "srt".to_string(),
            audio_extension: "aac".to_string(),
        }
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct Summary {
    pub files: usize,
    pub recordings: usize,
    pub utterances: usize,
    pub dropped_cues: usize,
    pub skipped_blocks: usize,
    pub empty_recordings: usize,
}

/// Converts every subtitle file in the subtitle directory into the four manifests.
pub fn build(opts: &CorpusOpts) -> Result<Summary> {
    let files = discover(&opts.subtitle_dir, &opts.subtitle_extension)?;
    let audio = AudioSource::new(&opts.audio_dir, &opts.audio_extension)?;
    let normaliser = Normaliser::new()?;

    let recordings = parse_files(&files, opts.jobs, &normaliser)?;

    let mut summary = Summary {
        files: files.len(),
        ..Summary::default()
    };
    let mut recordings: Vec<Recording> = recordings
        .into_iter()
        .filter(|reco| {
            summary.dropped_cues += reco.dropped();
            summary.skipped_blocks += reco.skipped_blocks();
            if reco.is_empty() {
                warn!("'{}' has no usable cues, skipping it", reco.basename());
                summary.empty_recordings += 1;
            }
            !reco.is_empty()
        })
        .collect();
    recordings.sort();

    std::fs::create_dir_all(&opts.output_dir).context(format!(
        "Failed to create output directory: '{}'",
        opts.output_dir.display()
    ))?;
    let mut manifests = Manifests::create(&opts.output_dir)?;
    for reco in &recordings {
        manifests.write_recording(reco, &audio)?;
        summary.utterances += reco.len();
    }
    manifests.finish()?;
    summary.recordings = recordings.len();

    info!(
        "Wrote {} utterance(s) from {} recording(s) to '{}' ({} file(s) read, {} cue(s) dropped, {} malformed block(s) skipped, {} empty recording(s))",
        summary.utterances,
        summary.recordings,
        opts.output_dir.display(),
        summary.files,
        summary.dropped_cues,
        summary.skipped_blocks,
        summary.empty_recordings
    );
    Ok(summary)
}

/// Parses every file on a pool of `jobs` threads.
///
/// Recordings come back in the order of `files`. The first failure stops the
/// remaining work and is returned.
fn parse_files(files: &[PathBuf], jobs: usize, normaliser: &Normaliser) -> Result<Vec<Recording>> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(jobs)
        .build()
        .context("Failed to start the parser thread pool")?;
    pool.install(|| {
        files
            .par_iter()
            .map(|path| processor::process_file(path, normaliser))
            .collect::<Result<Vec<_>>>()
    })
}

/// Lists the files directly inside `dir` with the given extension, sorted.
fn discover(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(CorpusError::NotADirectory(dir.to_path_buf()))
            .context("Failed to read subtitle directory");
    }
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).follow_links(true) {
        let entry = entry.context("Failed to read directory entry")?;
        let hidden = entry.file_name().to_string_lossy().starts_with('.');
        let matches = entry.path().extension().map_or(false, |ext| ext == extension);
        if entry.file_type().is_file() && !hidden && matches {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

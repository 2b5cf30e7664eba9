use crate::recording::Recording;

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};

pub const SEGMENTS: &str = "segments";
pub const WAV_SCP: &str = "wav.scp";
pub const UTT2SPK: &str = "utt2spk";
pub const TEXT: &str = "text";

/// Where `wav.scp` points for audio.
pub struct AudioSource {
    dir: PathBuf,
    extension: String,
}

impl AudioSource {
    /// `dir` is made absolute without touching the file system.
    pub fn new<P: AsRef<Path>>(dir: P, extension: &str) -> Result<Self> {
        let dir = std::path::absolute(dir.as_ref()).context(format!(
            "Failed to resolve audio directory: '{}'",
            dir.as_ref().display()
        ))?;
        Ok(Self {
            dir: clean_path(&dir),
            extension: extension.to_string(),
        })
    }
}

/// Folds `.` and `..` components without resolving symlinks.
fn clean_path(path: &Path) -> PathBuf {
    let mut cleaned = PathBuf::new();
    for comp in path.components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => {
                cleaned.pop();
            }
            other => cleaned.push(other),
        }
    }
    cleaned
}

/// The four manifest streams, written in lock-step.
///
/// Dropping the value closes every stream, whether or not writing finished.
pub struct Manifests<W: Write> {
    segments: W,
    wav_scp: W,
    utt2spk: W,
    text: W,
}

impl Manifests<BufWriter<File>> {
    pub fn create<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        let open = |name: &str| -> Result<BufWriter<File>> {
            let path = dir.join(name);
            let file = File::create(&path)
                .context(format!("Failed to create file: '{}'", path.display()))?;
            Ok(BufWriter::new(file))
        };
        Ok(Manifests {
            segments: open(SEGMENTS)?,
            wav_scp: open(WAV_SCP)?,
            utt2spk: open(UTT2SPK)?,
            text: open(TEXT)?,
        })
    }
}

impl<W: Write> Manifests<W> {
    pub fn write_recording(&mut self, reco: &Recording, audio: &AudioSource) -> Result<()> {
        write_wav_entry(&mut self.wav_scp, reco.basename(), audio)
            .context("Failed to write to wav.scp.")?;
        for utt in reco.utterances() {
            let utt_id = utterance_id(reco.basename(), utt.id);
            writeln!(self.text, "{} {}", utt_id, utt.text).context("Failed to write to text.")?;
            writeln!(
                self.segments,
                "{} {} {} {}",
                utt_id,
                reco.basename(),
                format_seconds(utt.start),
                format_seconds(utt.end)
            )
            .context("Failed to write to segments.")?;
            writeln!(self.utt2spk, "{} {}", utt_id, utt_id)
                .context("Failed to write to utt2spk.")?;
        }
        Ok(())
    }

    /// Flushes all four streams, reporting the first failure.
    pub fn finish(mut self) -> Result<()> {
        let results = [
            self.segments.flush().context("Failed to write to segments."),
            self.wav_scp.flush().context("Failed to write to wav.scp."),
            self.utt2spk.flush().context("Failed to write to utt2spk."),
            self.text.flush().context("Failed to write to text."),
        ];
        results.into_iter().collect()
    }
}

#[cfg(test)]
impl<W: Write> Manifests<W> {
    fn new(segments: W, wav_scp: W, utt2spk: W, text: W) -> Self {
        Self {
            segments,
            wav_scp,
            utt2spk,
            text,
        }
    }

    fn into_inner(self) -> (W, W, W, W) {
        (self.segments, self.wav_scp, self.utt2spk, self.text)
    }
}

fn write_wav_entry<W: Write>(buf: &mut W, basename: &str, audio: &AudioSource) -> Result<()> {
    writeln!(
        buf,
        "{} ffmpeg -loglevel panic -i {}/{}.{} -ac 1 -ar 16000 -f wav - |",
        basename,
        audio.dir.display(),
        basename,
        audio.extension
    )?;
    Ok(())
}

fn utterance_id(basename: &str, id: usize) -> String {
    format!("{}-{:04}", basename, id)
}

/// Shortest decimal that reads back as `secs`, always with a fractional part.
fn format_seconds(secs: f64) -> String {
    let mut s = secs.to_string();
    if !s.contains('.') {
        s.push_str(".0");
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! test_format_seconds {
        ($($name:ident: $value:expr,)*) => {
        $(
            #[test]
            fn $name() {
                let (input, expected) = $value;

                assert_eq!(format_seconds(input as f64 / 1000.0), expected);
            }
        )*
        }
    }

    test_format_seconds! {
        test_format_seconds_0: (0, "0.0"),
        test_format_seconds_1: (1, "0.001"),
        test_format_seconds_2: (1000, "1.0"),
        test_format_seconds_3: (2500, "2.5"),
        test_format_seconds_4: (61_234, "61.234"),
        test_format_seconds_5: (3_600_000, "3600.0"),
        test_format_seconds_6: (7_326_159, "7326.159"),
    }

    #[test]
    fn pads_utterance_ids() {
        assert_eq!(utterance_id("demo", 0), "demo-0000");
        assert_eq!(utterance_id("demo", 42), "demo-0042");
        assert_eq!(utterance_id("demo", 12345), "demo-12345");
    }

    #[test]
    fn cleans_audio_dir() {
        assert_eq!(clean_path(Path::new("/a/./b/../c/")), PathBuf::from("/a/c"));
        let audio = AudioSource::new("/audio/", "aac").unwrap();
        assert_eq!(audio.dir, PathBuf::from("/audio"));
        assert!(AudioSource::new("relative", "aac").unwrap().dir.is_absolute());
    }

    #[test]
    fn writes_one_recording() {
        let mut reco = Recording::new("demo");
        reco.add(1000, 2500, "hello world");
        reco.add(3000, 4000, "again");
        let audio = AudioSource::new("/audio", "aac").unwrap();
        let mut manifests = Manifests::new(Vec::new(), Vec::new(), Vec::new(), Vec::new());

        manifests.write_recording(&reco, &audio).unwrap();

        let (segments, wav_scp, utt2spk, text) = manifests.into_inner();
        assert_eq!(
            String::from_utf8(wav_scp).unwrap(),
            "demo ffmpeg -loglevel panic -i /audio/demo.aac -ac 1 -ar 16000 -f wav - |\n"
        );
        assert_eq!(
            String::from_utf8(text).unwrap(),
            "demo-0000 hello world\ndemo-0001 again\n"
        );
        assert_eq!(
            String::from_utf8(segments).unwrap(),
            "demo-0000 demo 1.0 2.5\ndemo-0001 demo 3.0 4.0\n"
        );
        assert_eq!(
            String::from_utf8(utt2spk).unwrap(),
            "demo-0000 demo-0000\ndemo-0001 demo-0001\n"
        );
    }
}

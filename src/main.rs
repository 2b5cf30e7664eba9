mod corpus;
mod error;
mod normaliser;
mod parser;
mod processor;
mod recording;
mod serialiser;
mod srt;

use crate::corpus::CorpusOpts;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser as ClapParser;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run() {
        Ok(()) => (),
        Err(err) => {
            eprintln!("An error occurred: {}", err);
            for cause in err.chain().skip(1) {
                eprintln!("    {}", cause);
            }
            std::process::exit(1);
        }
    }
}

#[derive(ClapParser)]
#[command(about = "Build Kaldi data files (segments, wav.scp, utt2spk, text) from SRT subtitles")]
struct Cli {
    #[arg(value_name = "SUBTITLE_DIR", help = "Directory containing the subtitle files.")]
    subtitle_dir: PathBuf,
    #[arg(
        value_name = "AUDIO_DIR",
        help = "Directory containing one audio file per subtitle file, named after it."
    )]
    audio_dir: PathBuf,
    #[arg(
        value_name = "OUTPUT_DIR",
        help = "Directory to write the data files to. Created if it does not exist."
    )]
    output_dir: PathBuf,
    #[arg(
        short,
        long,
        value_name = "N",
        help = "Number of subtitle files to parse in parallel.",
        default_value_t = 10,
        value_parser = clap::value_parser!(u16).range(1..)
    )]
    jobs: u16,
    #[arg(
        long,
        value_name = "EXT",
        help = "Extension of the subtitle files to read.",
        default_value = "srt"
    )]
    subtitle_extension: String,
    #[arg(
        long,
        value_name = "EXT",
        help = "Extension of the audio files referenced in wav.scp.",
        default_value = "aac"
    )]
    audio_extension: String,
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let opts = CorpusOpts {
        jobs: usize::from(cli.jobs),
        subtitle_extension: cli.subtitle_extension,
        audio_extension: cli.audio_extension,
        ..CorpusOpts::new(cli.subtitle_dir, cli.audio_dir, cli.output_dir)
    };
    corpus::build(&opts)?;

    Ok(())
}

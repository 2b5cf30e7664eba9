use crate::error::CorpusError;
use crate::srt::{Subtitle, SubtitleFile};

use std::borrow::Cow;
use std::fmt;
use std::time::Duration;

use anyhow::Context;
use nom::bytes::complete::{tag, take_while1, take_while_m_n};
use nom::character::complete::{
    digit1, line_ending, multispace0, multispace1, not_line_ending, one_of, space0, space1,
};
use nom::combinator::{map_res, opt, recognize};
use nom::error::{convert_error, ErrorKind, VerboseError};
use nom::multi::many_till;
use nom::sequence::{pair, terminated};
use nom::{branch::alt, error_position, Err, IResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Utf8,
    Latin1,
}

impl fmt::Display for Encoding {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Encoding::Utf8 => write!(fmt, "UTF-8"),
            Encoding::Latin1 => write!(fmt, "Latin-1"),
        }
    }
}

/// Decodes raw subtitle bytes, trying UTF-8 first and falling back to Latin-1.
///
/// A leading byte order mark is dropped and all line endings are turned into `\n`.
pub fn decode(bytes: &[u8]) -> (String, Encoding) {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    let (text, encoding) = match std::str::from_utf8(bytes) {
        Ok(text) => (Cow::Borrowed(text), Encoding::Utf8),
        // Every byte is a valid Latin-1 code point, so this cannot fail.
        Err(_) => (
            Cow::Owned(bytes.iter().map(|&b| b as char).collect()),
            Encoding::Latin1,
        ),
    };
    let text = if text.contains('\r') {
        text.replace("\r\n", "\n").replace('\r', "\n")
    } else {
        text.into_owned()
    };
    (text, encoding)
}

pub struct Parser;
impl Parser {
    pub fn new() -> Self {
        Self {}
    }

    pub fn parse(&self, input: &str) -> Result<SubtitleFile, anyhow::Error> {
        match srt_file(input) {
            Ok((_, file)) => Ok(file),
            Err(Err::Error(err)) | Err(Err::Failure(err)) => {
                let conv = convert_error(input, err);
                Err(CorpusError::ParseError(conv)).context("Failed to parse SRT file")
            }
            Err(Err::Incomplete(_)) => {
                unreachable!("Incomplete data received by non-streaming parser.")
            }
        }
    }
}

fn optional_bom(input: &str) -> IResult<&str, Option<&str>, VerboseError<&str>> {
    opt(tag("\u{FEFF}"))(input)
}

fn srt_file(input: &str) -> IResult<&str, SubtitleFile, VerboseError<&str>> {
    let (input, _) = optional_bom(input)?;
    let (input, file) = all_subtitles(input)?;
    let (input, _) = end_of_file(input)?;
    Ok((input, file))
}

fn all_subtitles(input: &str) -> IResult<&str, SubtitleFile, VerboseError<&str>> {
    let mut file = SubtitleFile::default();
    let (mut input, _) = multispace0(input)?;
    while !input.is_empty() {
        match subtitle(input) {
            Ok((rem_input, subtitle)) => {
                file.subtitles.push(subtitle);
                input = rem_input;
            }
            Err(Err::Error(_)) | Err(Err::Failure(_)) => {
                // Not a cue. Skip everything up to the next blank line and carry on.
                let (rem_input, _) = skip_block(input)?;
                file.skipped_blocks += 1;
                input = rem_input;
            }
            Err(err) => return Err(err),
        }
        let (rem_input, _) = multispace0(input)?;
        input = rem_input;
    }
    Ok((input, file))
}

fn subtitle(input: &str) -> IResult<&str, Subtitle, VerboseError<&str>> {
    // The index line is optional: a block may start directly with the timing line.
    let (input, sequence_number) = opt(terminated(seq_num, multispace1))(input)?;
    let (input, (show_at, hide_at)) =
        terminated(show_hide, alt((line_ending, end_of_file)))(input)?;
    let (input, text) = sub_text(input)?;

    Ok((
        input,
        Subtitle {
            sequence_number,
            show_at,
            hide_at,
            text,
        },
    ))
}

fn end_of_file(input: &str) -> IResult<&str, &str, VerboseError<&str>> {
    if input.is_empty() {
        Ok((input, input))
    } else {
        std::result::Result::Err(Err::Error(error_position!(input, ErrorKind::Eof)))
    }
}

/// A line holding nothing but spaces or tabs ends a cue.
fn blank_line(input: &str) -> IResult<&str, &str, VerboseError<&str>> {
    recognize(pair(space0, alt((line_ending, end_of_file))))(input)
}

fn text_line(input: &str) -> IResult<&str, &str, VerboseError<&str>> {
    terminated(
        take_while1(|c: char| c != '\n'),
        alt((line_ending, end_of_file)),
    )(input)
}

fn sub_text(input: &str) -> IResult<&str, Vec<String>, VerboseError<&str>> {
    let (input, (vec, _)) = many_till(text_line, blank_line)(input)?;

    Ok((input, vec.into_iter().map(String::from).collect()))
}

fn skip_block(input: &str) -> IResult<&str, &str, VerboseError<&str>> {
    recognize(many_till(text_line, blank_line))(input)
}

fn show_hide(input: &str) -> IResult<&str, (Duration, Duration), VerboseError<&str>> {
    let (input, show_at) = timestamp(input)?;
    let (input, _) = space1(input)?;
    let (input, _) = tag("-->")(input)?;
    let (input, _) = space1(input)?;
    let (input, hide_at) = timestamp(input)?;
    // Anything after the end time (e.g. `X1:40 X2:600 Y1:20 Y2:50`) is ignored.
    let (input, _) = not_line_ending(input)?;

    Ok((input, (show_at, hide_at)))
}

fn timestamp(input: &str) -> IResult<&str, Duration, VerboseError<&str>> {
    const MILLIS_MIN: usize = 0;
    const MILLIS_MAX: usize = 3;
    let take_millis = || {
        map_res(
            take_while_m_n(MILLIS_MIN, MILLIS_MAX, |c: char| c.is_ascii_digit()),
            move |s: &str| {
                if s.len() < MILLIS_MAX {
                    // A short value like `,2` is not valid SRT but does occur.
                    // It is read as `,200`: right-pad to 3 characters.
                    let millis = format!("{:0<3}", s);
                    millis.parse()
                } else {
                    s.parse()
                }
            },
        )
    };

    const HMS_MIN: usize = 0;
    const HMS_MAX: usize = 2;
    let take_hms = || {
        map_res(
            take_while_m_n(HMS_MIN, HMS_MAX, |c: char| c.is_ascii_digit()),
            |s: &str| {
                if s.len() < HMS_MAX {
                    // Left-pad here: 1:13:45 means 01:13:45, not 10:13:45.
                    let padded = format!("{:0>2}", s);
                    padded.parse()
                } else {
                    s.parse()
                }
            },
        )
    };

    let (input, hours): (_, u64) = take_hms()(input)?;
    let (input, _) = tag(":")(input)?;
    let (input, minutes): (_, u64) = take_hms()(input)?;
    let (input, _) = tag(":")(input)?;
    let (input, seconds): (_, u64) = take_hms()(input)?;
    let (input, _) = one_of(",.")(input)?;
    let (input, millis): (_, u64) = take_millis()(input)?;

    Ok((
        input,
        Duration::from_millis(
            millis + seconds * 1000 + minutes * 60 * 1000 + hours * 60 * 60 * 1000,
        ),
    ))
}

fn seq_num(input: &str) -> IResult<&str, usize, VerboseError<&str>> {
    map_res(digit1, |s: &str| s.parse())(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! test_read_ts {
        ($($name:ident: $value:expr,)*) => {
        $(
            #[test]
            fn $name() {
                let (input, expected) = $value;

                let (_, duration) = timestamp(input).unwrap();

                assert_eq!(duration.as_millis(), expected);
            }
        )*
        }
    }

    test_read_ts! {
        test_read_ts_0: ("00:00:01,200", 1200),
        test_read_ts_1: ("00:00:01,2", 1200),
        test_read_ts_2: ("00:00:01,002", 1002),
        test_read_ts_3: ("00:00:01,02", 1020),
        test_read_ts_4: ("00:00:01,", 1000),
        test_read_ts_5: ("1:1:1,200", 3661200),
        test_read_ts_6: ("01:01:01,200", 3661200),
        test_read_ts_7: ("00:00:02.500", 2500),
    }

    fn parse(input: &str) -> SubtitleFile {
        Parser::new().parse(input).expect("Failed to parse input")
    }

    #[test]
    fn parses_cues_in_file_order() {
        let file = parse(
            "1\n00:00:05,000 --> 00:00:06,000\nSecond in time\n\n\
             2\n00:00:01,000 --> 00:00:02,500\nHello (laughs)\nWorld!\n",
        );
        assert_eq!(file.subtitles.len(), 2);
        assert_eq!(file.skipped_blocks, 0);
        assert_eq!(file.subtitles[0].sequence_number, Some(1));
        assert_eq!(file.subtitles[0].text, vec!["Second in time"]);
        assert_eq!(file.subtitles[1].show_at, Duration::from_millis(1000));
        assert_eq!(file.subtitles[1].hide_at, Duration::from_millis(2500));
        assert_eq!(file.subtitles[1].text, vec!["Hello (laughs)", "World!"]);
    }

    #[test]
    fn accepts_missing_trailing_newline_and_coordinates() {
        let file = parse("1\n00:00:01,000 --> 00:00:02,000 X1:40 X2:600\nLast line");
        assert_eq!(file.subtitles.len(), 1);
        assert_eq!(file.subtitles[0].text, vec!["Last line"]);
    }

    #[test]
    fn keeps_cues_without_text() {
        let file = parse(
            "1\n00:00:01,000 --> 00:00:02,000\n\n\
             2\n00:00:03,000 --> 00:00:04,000\nText\n",
        );
        assert_eq!(file.subtitles.len(), 2);
        assert!(file.subtitles[0].text.is_empty());
        assert_eq!(file.subtitles[1].text, vec!["Text"]);
    }

    #[test]
    fn skips_malformed_blocks() {
        let file = parse(
            "garbage here\nmore garbage\n\n\
             1\n00:00:01,000 --> 00:00:02,000\nKept\n\n\
             2\nno timing line\n\n\
             3\n00:00:03,000 --> 00:00:04,000\nAlso kept\n",
        );
        assert_eq!(file.skipped_blocks, 2);
        let texts: Vec<_> = file.subtitles.iter().map(|s| s.text[0].as_str()).collect();
        assert_eq!(texts, vec!["Kept", "Also kept"]);
    }

    #[test]
    fn whitespace_only_line_ends_cue() {
        let file = parse(
            "1\n00:00:01,000 --> 00:00:02,000\nFirst\n \n\
             2\n00:00:03,000 --> 00:00:04,000\nSecond\n\t\n\
             junk\n  \n\
             3\n00:00:05,000 --> 00:00:06,000\nThird\n   ",
        );
        let texts: Vec<_> = file.subtitles.iter().map(|s| s.text.clone()).collect();
        assert_eq!(texts, vec![vec!["First"], vec!["Second"], vec!["Third"]]);
        assert_eq!(file.skipped_blocks, 1);
    }

    #[test]
    fn index_line_is_optional() {
        let file = parse(
            "00:00:01,000 --> 00:00:02,000\nNo index\n\n\
             2\n00:00:03,000 --> 00:00:04,000\nSecond\n",
        );
        assert_eq!(file.skipped_blocks, 0);
        assert_eq!(file.subtitles.len(), 2);
        assert_eq!(file.subtitles[0].sequence_number, None);
        assert_eq!(file.subtitles[0].show_at, Duration::from_millis(1000));
        assert_eq!(file.subtitles[0].text, vec!["No index"]);
        assert_eq!(file.subtitles[1].sequence_number, Some(2));
    }

    #[test]
    fn empty_input_has_no_cues() {
        let file = parse("");
        assert!(file.subtitles.is_empty());
        let file = parse("\n\n  \n");
        assert!(file.subtitles.is_empty());
        assert_eq!(file.skipped_blocks, 0);
    }

    #[test]
    fn decode_prefers_utf8() {
        let (text, encoding) = decode("\u{FEFF}1\r\nCaf\u{e9}\r\n".as_bytes());
        assert_eq!(encoding, Encoding::Utf8);
        assert_eq!(text, "1\nCaf\u{e9}\n");
    }

    #[test]
    fn decode_falls_back_to_latin1() {
        let (text, encoding) = decode(b"Caf\xe9\rna\xefve\n");
        assert_eq!(encoding, Encoding::Latin1);
        assert_eq!(text, "Caf\u{e9}\nna\u{ef}ve\n");
    }
}

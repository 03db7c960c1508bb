use super::frame::read::ParsedFrame;
use super::header::{Id3v2Header, Id3v2Version, skip_extended_header};
use super::tag::Id3v2Tag;
use super::util::synchsafe::remove_unsynchronisation;
use crate::config::ParseOptions;
use crate::error::Result;

use std::borrow::Cow;

/// Read the frames of a tag
///
/// `content` is everything following the 10 byte header, up to `header.size` bytes.
pub(crate) fn parse_id3v2(
	content: &[u8],
	header: Id3v2Header,
	parse_options: ParseOptions,
) -> Result<Id3v2Tag> {
	log::debug!(
		"Parsing ID3v2.{} tag, size: {}",
		header.version.major(),
		header.size
	);

	// ID3v2.4 applies unsynchronisation to each frame individually
	let content = if header.flags.unsynchronisation && header.version != Id3v2Version::V4 {
		Cow::Owned(remove_unsynchronisation(content))
	} else {
		Cow::Borrowed(content)
	};

	let mut reader = &content[..];
	if header.flags.extended_header {
		reader = skip_extended_header(reader, header.version)?;
	}

	let mut tag = Id3v2Tag {
		original_version: header.version,
		frames: Vec::new(),
	};

	loop {
		match ParsedFrame::read(
			&mut reader,
			header.version,
			header.flags.unsynchronisation,
			parse_options,
		)? {
			ParsedFrame::Next(frame) => tag.frames.push(frame),
			// Ignored due to errors, but we can expect more frames
			ParsedFrame::Skip => {},
			// Padding or the end of the tag
			ParsedFrame::Eof => break,
		}
	}

	Ok(tag)
}

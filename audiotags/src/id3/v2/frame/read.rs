use super::content::parse_content;
use super::{Frame, FrameContent, FrameFlags};
use crate::config::{ParseOptions, ParsingMode};
use crate::error::{Id3v2Error, Id3v2ErrorKind, Result};
use crate::id3::v2::header::Id3v2Version;
use crate::id3::v2::util::synchsafe::{SynchsafeInteger, remove_unsynchronisation};
use crate::id3::v2::util::upgrade::{upgrade_v2, upgrade_v3};
use crate::macros::{parse_mode_choice, truncated_err};

use std::borrow::Cow;

use byteorder::{BigEndian, ByteOrder};

pub(crate) enum ParsedFrame {
	Next(Frame),
	Skip,
	Eof,
}

struct RawHeader<'a> {
	id: &'a [u8],
	size: u32,
	flags: FrameFlags,
}

fn parse_header<'a>(reader: &mut &'a [u8], version: Id3v2Version) -> Option<RawHeader<'a>> {
	let header_len = if version == Id3v2Version::V2 { 6 } else { 10 };
	if reader.len() < header_len {
		return None;
	}

	let (header, rest) = reader.split_at(header_len);

	// Assume we just started reading padding
	if header[0] == 0 {
		return None;
	}

	*reader = rest;

	let parsed = match version {
		// V2 doesn't store flags
		Id3v2Version::V2 => RawHeader {
			id: &header[..3],
			size: BigEndian::read_u24(&header[3..]),
			flags: FrameFlags::default(),
		},
		Id3v2Version::V3 => RawHeader {
			// For some reason, some apps make v3 tags with v2 frame IDs.
			// The actual frame header is v3 though
			id: if header[3] == 0 { &header[..3] } else { &header[..4] },
			size: BigEndian::read_u32(&header[4..]),
			flags: FrameFlags::parse_id3v23(BigEndian::read_u16(&header[8..])),
		},
		Id3v2Version::V4 => RawHeader {
			id: &header[..4],
			size: BigEndian::read_u32(&header[4..]).unsynch(),
			flags: FrameFlags::parse_id3v24(BigEndian::read_u16(&header[8..])),
		},
	};

	Some(parsed)
}

// Map the ID to its ID3v2.4 spelling, `None` if it has no equivalent
fn upgrade_id(id: &str, version: Id3v2Version) -> Option<Cow<'static, str>> {
	match (version, id.len()) {
		(_, 3) => upgrade_v2(id).map(Cow::Borrowed),
		(Id3v2Version::V3, _) => Some(
			upgrade_v3(id).map_or_else(|| Cow::Owned(id.to_owned()), Cow::Borrowed),
		),
		_ => Some(Cow::Owned(id.to_owned())),
	}
}

fn valid_id(id: &[u8]) -> bool {
	id.iter().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
}

// Split `len` bytes off the front of `content`
fn take<'a>(content: &mut &'a [u8], len: usize) -> Result<&'a [u8]> {
	if content.len() < len {
		return Err(Id3v2Error::new(Id3v2ErrorKind::BadFrameLength).into());
	}

	let (taken, rest) = content.split_at(len);
	*content = rest;
	Ok(taken)
}

impl ParsedFrame {
	/// Read the next frame from `reader`, advancing it past the frame
	///
	/// `tag_unsynchronised` is the tag header's unsynchronisation flag, which only applies
	/// per frame in ID3v2.4.
	pub(crate) fn read(
		reader: &mut &[u8],
		version: Id3v2Version,
		tag_unsynchronised: bool,
		parse_options: ParseOptions,
	) -> Result<Self> {
		let parse_mode = parse_options.parsing_mode;

		let Some(RawHeader { id, size, mut flags }) = parse_header(reader, version) else {
			// Stop reading
			return Ok(Self::Eof);
		};

		if size as usize > reader.len() {
			parse_mode_choice!(
				parse_mode,
				RELAXED: {
					log::warn!("Frame extends past the end of the tag, discarding the rest");
					return Ok(Self::Eof);
				},
				DEFAULT: return Err(truncated_err!("ID3v2 frame length exceeds the tag size"))
			);
		}

		let (mut content, rest) = reader.split_at(size as usize);
		*reader = rest;

		if !valid_id(id) {
			let err = Id3v2Error::new(Id3v2ErrorKind::BadFrameId(id.to_vec()));
			if parse_mode == ParsingMode::Strict {
				return Err(err.into());
			}

			log::warn!("Failed to read frame header, skipping: {err}");
			return Ok(Self::Skip);
		}

		// Valid IDs are ASCII
		let id_str = String::from_utf8_lossy(id);
		let Some(id) = upgrade_id(&id_str, version) else {
			log::debug!("Dropping ID3v2.2 frame with no modern equivalent: {id_str}");
			return Ok(Self::Skip);
		};

		if size == 0 {
			if parse_mode == ParsingMode::Strict {
				return Err(Id3v2Error::new(Id3v2ErrorKind::BadFrameLength).into());
			}

			log::debug!("Encountered a zero length frame, skipping");
			return Ok(Self::Skip);
		}

		// The added bytes are in the same order as the flags
		match version {
			Id3v2Version::V4 => {
				if let Some(group) = flags.grouping_identity.as_mut() {
					*group = take(&mut content, 1)?[0];
				}

				if let Some(enc) = flags.encryption.as_mut() {
					*enc = take(&mut content, 1)?[0];
				}

				// Compressed frames always carry a data length indicator, even when its flag is unset
				if flags.data_length_indicator.is_some() || flags.compression {
					let len = BigEndian::read_u32(take(&mut content, 4)?).unsynch();
					flags.data_length_indicator = Some(len);
				}
			},
			_ => {
				if flags.compression {
					let len = BigEndian::read_u32(take(&mut content, 4)?);
					flags.data_length_indicator = Some(len);
				}

				if let Some(enc) = flags.encryption.as_mut() {
					*enc = take(&mut content, 1)?[0];
				}

				if let Some(group) = flags.grouping_identity.as_mut() {
					*group = take(&mut content, 1)?[0];
				}
			},
		}

		let mut content = if flags.unsynchronisation
			|| (version == Id3v2Version::V4 && tag_unsynchronised)
		{
			Cow::Owned(remove_unsynchronisation(content))
		} else {
			Cow::Borrowed(content)
		};
		flags.unsynchronisation = false;

		// Nothing further we can do with encrypted frames
		if flags.encryption.is_some() {
			log::debug!("Retaining encrypted frame \"{id}\" as-is");
			return Ok(Self::Next(Frame {
				id: id.into_owned(),
				flags,
				content: FrameContent::Binary(content.into_owned()),
				raw: None,
				origin: Some(version),
			}));
		}

		if flags.compression {
			content = Cow::Owned(decompress(&content, flags.data_length_indicator)?);
		}

		flags.compression = false;
		flags.data_length_indicator = None;

		if content.is_empty() {
			if parse_mode == ParsingMode::Strict {
				return Err(Id3v2Error::new(Id3v2ErrorKind::BadFrameLength).into());
			}

			return Ok(Self::Skip);
		}

		// ID3v2.2 pictures always need decoding, their layout can't be written back
		let skip_picture =
			!parse_options.read_cover_art && id == "APIC" && version != Id3v2Version::V2;

		let parsed = if skip_picture {
			Ok(FrameContent::Binary(content.to_vec()))
		} else {
			parse_content(&id, &content, version)
		};

		let frame_content = match parsed {
			Ok(frame_content) => frame_content,
			Err(err) => {
				if parse_mode == ParsingMode::Strict {
					return Err(err);
				}

				// Unknown ID3v2.2 layouts can't be retained
				if version == Id3v2Version::V2 {
					log::warn!("Unable to parse frame \"{id}\", discarding: {err}");
					return Ok(Self::Skip);
				}

				log::warn!("Unable to parse frame \"{id}\", retaining it as-is: {err}");
				FrameContent::Binary(content.to_vec())
			},
		};

		let raw = match frame_content {
			FrameContent::Binary(_) => None,
			_ => Some(content.into_owned()),
		};

		Ok(Self::Next(Frame {
			id: id.into_owned(),
			flags,
			content: frame_content,
			raw,
			origin: Some(version),
		}))
	}
}

#[cfg(feature = "id3v2_compression_support")]
fn decompress(content: &[u8], expected_len: Option<u32>) -> Result<Vec<u8>> {
	use crate::util::alloc::ALLOCATION_LIMIT;
	use std::io::Read;

	let limit = expected_len.map_or(ALLOCATION_LIMIT as u64, u64::from);

	let mut decompressed = Vec::new();
	flate2::read::ZlibDecoder::new(content)
		.take(limit)
		.read_to_end(&mut decompressed)
		.map_err(|e| Id3v2Error::new(Id3v2ErrorKind::Decompression(e)))?;

	Ok(decompressed)
}

#[cfg(not(feature = "id3v2_compression_support"))]
#[allow(clippy::unnecessary_wraps)]
fn decompress(_: &[u8], _: Option<u32>) -> Result<Vec<u8>> {
	Err(Id3v2Error::new(Id3v2ErrorKind::CompressedFrameEncountered).into())
}

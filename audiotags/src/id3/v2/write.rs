use super::frame::{Frame, FrameContent};
use super::header::Id3v2Version;
use super::tag::Id3v2Tag;
use super::util::synchsafe::SynchsafeInteger;
use super::util::upgrade::downgrade_v4;
use crate::config::WriteOptions;
use crate::error::Result;
use crate::macros::err;

use std::borrow::Cow;
use std::io::Write;

use byteorder::{BigEndian, WriteBytesExt};

const HEADER_LEN: usize = 10;

impl Id3v2Tag {
	/// The version the tag will be written as
	pub(crate) fn write_version(options: WriteOptions) -> Id3v2Version {
		if options.use_id3v23 {
			Id3v2Version::V3
		} else {
			Id3v2Version::V4
		}
	}

	/// Encode every frame, including their headers
	pub(crate) fn frames_as_bytes(&self, options: WriteOptions) -> Result<Vec<u8>> {
		let version = Self::write_version(options);

		let mut out = Vec::new();
		for frame in &self.frames {
			write_frame(&mut out, frame, version, options.lossy_text_encoding)?;
		}

		Ok(out)
	}

	/// Encode the complete tag
	///
	/// When `fit_into` is the size of the tag being replaced, and the new tag is no larger, it is
	/// padded out to exactly that size. Otherwise it receives `preferred_padding` bytes of padding.
	///
	/// An empty tag produces no bytes at all.
	pub(crate) fn dump(&self, options: WriteOptions, fit_into: Option<u64>) -> Result<Vec<u8>> {
		if self.frames.is_empty() {
			log::debug!("No ID3v2 frames remain, removing the tag");
			return Ok(Vec::new());
		}

		let frames = self.frames_as_bytes(options)?;
		let needed = (HEADER_LEN + frames.len()) as u64;

		let padding = match fit_into {
			Some(old_size) if needed <= old_size => old_size - needed,
			_ => u64::from(options.preferred_padding.unwrap_or(0)),
		};

		let Ok(size) = u32::try_from(frames.len() as u64 + padding) else {
			err!(TooMuchData);
		};

		log::debug!(
			"Writing ID3v2.{} tag, {} bytes of frames, {padding} bytes of padding",
			Self::write_version(options).major(),
			frames.len()
		);

		let mut out = Vec::with_capacity(HEADER_LEN + size as usize);
		out.write_all(b"ID3")?;
		out.write_u8(Self::write_version(options).major())?;
		// Revision, flags
		out.write_all(&[0, 0])?;
		out.write_u32::<BigEndian>(size.synch()?)?;
		out.extend(frames);
		out.resize(HEADER_LEN + size as usize, 0);

		Ok(out)
	}
}

// ID3v2.3 has no room for anything beyond the year in these
fn year_only(frame: &Frame) -> Option<Frame> {
	let FrameContent::Text { encoding, values } = &frame.content else {
		return None;
	};

	let values = values
		.iter()
		.map(|v| v.chars().take(4).collect::<String>())
		.collect();
	Some(Frame::text(&frame.id, *encoding, values))
}

fn write_frame(out: &mut Vec<u8>, frame: &Frame, version: Id3v2Version, lossy: bool) -> Result<()> {
	let v3_id = match version {
		Id3v2Version::V3 => downgrade_v4(&frame.id),
		_ => None,
	};

	let frame = match v3_id {
		Some(_)
			if matches!(frame.id.as_str(), "TDRC" | "TDOR")
				&& frame.origin != Some(Id3v2Version::V3) =>
		{
			year_only(frame).map_or(Cow::Borrowed(frame), Cow::Owned)
		},
		_ => Cow::Borrowed(frame),
	};
	let id = v3_id.unwrap_or(frame.id.as_str());

	let content = match frame.raw_compatible(version) {
		Some(raw) => Cow::Borrowed(raw),
		None => Cow::Owned(frame.content_bytes(version, lossy)?),
	};

	let flags = frame.flags;

	let mut extra = Vec::new();
	match version {
		Id3v2Version::V4 => {
			if let Some(group) = flags.grouping_identity {
				extra.push(group);
			}

			if let Some(method) = flags.encryption {
				extra.push(method);
			}

			if let Some(len) = flags.data_length_indicator {
				extra.write_u32::<BigEndian>(len.synch()?)?;
			}
		},
		_ => {
			if flags.compression {
				extra.write_u32::<BigEndian>(flags.data_length_indicator.unwrap_or(0))?;
			}

			if let Some(method) = flags.encryption {
				extra.push(method);
			}

			if let Some(group) = flags.grouping_identity {
				extra.push(group);
			}
		},
	}

	let Ok(len) = u32::try_from(extra.len() + content.len()) else {
		err!(TooMuchData);
	};

	log::trace!("Writing frame \"{id}\", size: {len}");

	out.write_all(id.as_bytes())?;
	match version {
		Id3v2Version::V4 => {
			out.write_u32::<BigEndian>(len.synch()?)?;
			out.write_u16::<BigEndian>(flags.as_id3v24_bytes())?;
		},
		_ => {
			out.write_u32::<BigEndian>(len)?;
			out.write_u16::<BigEndian>(flags.as_id3v23_bytes())?;
		},
	}

	out.extend(extra);
	out.extend_from_slice(&content);

	Ok(())
}

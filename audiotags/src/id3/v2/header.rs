use super::util::synchsafe::SynchsafeInteger;
use crate::error::{Id3v2Error, Id3v2ErrorKind, Result};
use crate::macros::decode_err;

use std::io::Read;

use byteorder::{BigEndian, ByteOrder};

/// The ID3v2 version
#[derive(PartialEq, Eq, Debug, Clone, Copy, Hash)]
pub enum Id3v2Version {
	/// ID3v2.2
	V2,
	/// ID3v2.3
	V3,
	/// ID3v2.4
	V4,
}

impl Id3v2Version {
	pub(crate) fn major(self) -> u8 {
		match self {
			Self::V2 => 2,
			Self::V3 => 3,
			Self::V4 => 4,
		}
	}
}

/// Flags that apply to the entire tag
#[derive(Default, Copy, Clone, Debug, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct Id3v2TagFlags {
	/// Whether or not all frames are unsynchronised
	pub unsynchronisation: bool,
	/// Whether an extended header follows the tag header
	pub extended_header: bool,
	/// Indicates if the tag is in an experimental stage
	pub experimental: bool,
	/// Indicates that the tag includes a footer
	pub footer: bool,
}

#[derive(Copy, Clone, Debug)]
pub(crate) struct Id3v2Header {
	pub version: Id3v2Version,
	pub flags: Id3v2TagFlags,
	/// The size of the tag contents (**DOES NOT INCLUDE THE HEADER/FOOTER**)
	pub size: u32,
}

impl Id3v2Header {
	pub(crate) fn parse<R>(bytes: &mut R) -> Result<Self>
	where
		R: Read,
	{
		log::debug!("Parsing ID3v2 header");

		let mut header = [0; 10];
		bytes.read_exact(&mut header)?;

		if &header[..3] != b"ID3" {
			decode_err!(@BAIL "Expected an ID3v2 tag identifier");
		}

		// Version is stored as [major, minor], but here we don't care about minor revisions unless there's an error.
		let version = match header[3] {
			2 => Id3v2Version::V2,
			3 => Id3v2Version::V3,
			4 => Id3v2Version::V4,
			major => {
				return Err(
					Id3v2Error::new(Id3v2ErrorKind::BadId3v2Version(major, header[4])).into(),
				);
			},
		};

		let flags = header[5];

		// ID3v2.2 reserved bit 6 for compression, but no scheme was ever defined
		if version == Id3v2Version::V2 && flags & 0x40 == 0x40 {
			return Err(Id3v2Error::new(Id3v2ErrorKind::V2Compression).into());
		}

		let not_v2 = version != Id3v2Version::V2;
		let flags_parsed = Id3v2TagFlags {
			unsynchronisation: flags & 0x80 == 0x80,
			extended_header: not_v2 && flags & 0x40 == 0x40,
			experimental: not_v2 && flags & 0x20 == 0x20,
			footer: version == Id3v2Version::V4 && flags & 0x10 == 0x10,
		};

		let size = BigEndian::read_u32(&header[6..]).unsynch();

		Ok(Id3v2Header {
			version,
			flags: flags_parsed,
			size,
		})
	}

	/// The total size of the tag, including the header and footer
	pub(crate) fn full_tag_size(&self) -> u64 {
		u64::from(self.size) + 10 + if self.flags.footer { 10 } else { 0 }
	}
}

/// Skip the extended header at the start of `content`, returning what follows it
///
/// The size field is plain in ID3v2.3 and excludes itself, while ID3v2.4 uses a synchsafe
/// size that includes itself.
pub(crate) fn skip_extended_header(content: &[u8], version: Id3v2Version) -> Result<&[u8]> {
	if content.len() < 4 {
		return Err(Id3v2Error::new(Id3v2ErrorKind::BadExtendedHeaderSize).into());
	}

	let size = BigEndian::read_u32(content);
	let total = match version {
		Id3v2Version::V4 => size.unsynch(),
		_ => size.saturating_add(4),
	};

	if total < 6 || total as usize > content.len() {
		return Err(Id3v2Error::new(Id3v2ErrorKind::BadExtendedHeaderSize).into());
	}

	log::trace!("Skipping an extended header of {total} bytes");
	Ok(&content[total as usize..])
}

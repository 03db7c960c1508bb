use crate::error::Result;
use crate::macros::{encode_err, truncated_err, try_vec};

use std::io::{Read, Seek, SeekFrom, Write};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

pub(crate) const BLOCK_ID_STREAMINFO: u8 = 0;
pub(crate) const BLOCK_ID_PADDING: u8 = 1;
pub(crate) const BLOCK_ID_VORBIS_COMMENTS: u8 = 4;
pub(crate) const BLOCK_ID_PICTURE: u8 = 6;

/// The largest content a block header can describe
pub(crate) const MAX_BLOCK_SIZE: usize = 0x00FF_FFFF;

/// A raw metadata block
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Block {
	pub(crate) ty: u8,
	pub(crate) last: bool,
	pub(crate) content: Vec<u8>,
	pub(crate) start: u64,
	pub(crate) end: u64,
}

impl Block {
	pub(crate) fn read<R>(data: &mut R) -> Result<Self>
	where
		R: Read + Seek,
	{
		let start = data.stream_position()?;

		let byte = data.read_u8()?;
		let last = (byte & 0x80) != 0;
		let ty = byte & 0x7F;

		let size = data.read_u24::<BigEndian>()?;
		log::trace!("Reading FLAC block, type: {ty}, size: {size}");

		let content_start = data.stream_position()?;
		let file_end = data.seek(SeekFrom::End(0))?;
		if content_start + u64::from(size) > file_end {
			truncated_err!(@BAIL Flac, "Metadata block length exceeds the file");
		}

		data.seek(SeekFrom::Start(content_start))?;
		let mut content = try_vec![0; size as usize];
		data.read_exact(&mut content)?;

		let end = data.stream_position()?;

		Ok(Self {
			ty,
			last,
			content,
			start,
			end,
		})
	}

	/// The full size of the block, including its 4 byte header
	pub(crate) fn len(&self) -> u64 {
		self.end - self.start
	}
}

/// Write a block header and its content
pub(crate) fn write_block<W>(writer: &mut W, ty: u8, last: bool, content: &[u8]) -> Result<()>
where
	W: Write,
{
	if content.len() > MAX_BLOCK_SIZE {
		encode_err!(@BAIL Flac, "Metadata block content exceeds 16 MiB");
	}

	let byte = if last { ty | 0x80 } else { ty };
	writer.write_u8(byte)?;
	writer.write_u24::<BigEndian>(content.len() as u32)?;
	writer.write_all(content)?;

	log::trace!("Wrote a block (ty: {ty}, size: {})", content.len());
	Ok(())
}

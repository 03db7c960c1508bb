use crate::config::ParsingMode;
use crate::error::Result;
use crate::macros::truncated_err;
use crate::mp4::atom_info::AtomInfo;

use std::io::{Read, Seek, SeekFrom};
use std::ops::Range;

use byteorder::{BigEndian, ReadBytesExt};

macro_rules! be_readers {
	($($name:ident => $ty:ty),+ $(,)?) => {
		$(
			pub(crate) fn $name(&mut self) -> std::io::Result<$ty> {
				ReadBytesExt::$name::<BigEndian>(self)
			}
		)+
	};
}

/// A reader confined to a range of its inner reader
///
/// `SeekFrom::Start` is relative to the start of the range, positions are always reported as
/// absolute offsets. Atom offsets found through it can be used on the inner reader directly.
pub(crate) struct AtomReader<R>
where
	R: Read + Seek,
{
	inner: R,
	bounds: Range<u64>,
	pos: u64,
	parse_mode: ParsingMode,
}

impl<R> AtomReader<R>
where
	R: Read + Seek,
{
	/// Create a reader over the whole of `inner`
	pub(crate) fn new(mut inner: R, parse_mode: ParsingMode) -> Result<Self> {
		let len = inner.seek(SeekFrom::End(0))?;
		inner.seek(SeekFrom::Start(0))?;

		Ok(Self {
			inner,
			bounds: 0..len,
			pos: 0,
			parse_mode,
		})
	}

	/// Confine the reader to `len` bytes from `start`, and move to `start`
	pub(crate) fn reset_bounds(&mut self, start: u64, len: u64) -> Result<()> {
		self.bounds = start..start + len;
		self.pos = self.inner.seek(SeekFrom::Start(start))?;
		Ok(())
	}

	pub(crate) fn parse_mode(&self) -> ParsingMode {
		self.parse_mode
	}

	fn remaining(&self) -> u64 {
		self.bounds.end.saturating_sub(self.pos)
	}

	pub(crate) fn read_u8(&mut self) -> std::io::Result<u8> {
		ReadBytesExt::read_u8(self)
	}

	be_readers! {
		read_u16 => u16,
		read_u24 => u32,
		read_u32 => u32,
		read_u64 => u64,
	}

	/// Read the next atom header within the bounds
	///
	/// This leaves the reader at the beginning of the atom content.
	pub(crate) fn next(&mut self) -> Result<Option<AtomInfo>> {
		let remaining = self.remaining();
		if remaining == 0 {
			return Ok(None);
		}

		if remaining < 8 {
			if self.parse_mode == ParsingMode::Strict {
				truncated_err!(@BAIL Mp4, "Found trailing bytes too short to be an atom");
			}

			log::warn!("MP4: Ignoring {remaining} trailing bytes");
			self.seek(SeekFrom::End(0))?;
			return Ok(None);
		}

		let parse_mode = self.parse_mode;
		AtomInfo::read(self, remaining, parse_mode)
	}
}

impl<R> Seek for AtomReader<R>
where
	R: Read + Seek,
{
	fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
		let Range { start, end } = self.bounds;

		let target = match pos {
			SeekFrom::Start(offset) => start.saturating_add(offset),
			SeekFrom::End(offset) => end.saturating_add_signed(offset),
			SeekFrom::Current(offset) => self.pos.saturating_add_signed(offset),
		};

		self.pos = self.inner.seek(SeekFrom::Start(target.clamp(start, end)))?;
		Ok(self.pos)
	}
}

impl<R> Read for AtomReader<R>
where
	R: Read + Seek,
{
	fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
		let limit = usize::try_from(self.remaining()).unwrap_or(usize::MAX);
		let len = buf.len().min(limit);
		if len == 0 {
			return Ok(0);
		}

		let read = self.inner.read(&mut buf[..len])?;
		self.pos += read as u64;

		Ok(read)
	}
}

use crate::error::Result;
use crate::macros::decode_err;

use std::fmt::{Display, Formatter};

const BOM: u16 = 0xFEFF;

/// A string that can't be represented in the requested [`TextEncoding`]
#[derive(Copy, Clone, Debug)]
pub struct TextEncodingError {
	encoding: TextEncoding,
	valid_up_to: usize,
}

impl TextEncodingError {
	/// The encoding that was requested
	pub fn encoding(&self) -> TextEncoding {
		self.encoding
	}

	/// The index of the first character that couldn't be encoded
	pub fn valid_up_to(&self) -> usize {
		self.valid_up_to
	}
}

impl Display for TextEncodingError {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(
			f,
			"character {} can't be encoded as {}",
			self.valid_up_to,
			self.encoding.name()
		)
	}
}

impl std::error::Error for TextEncodingError {}

/// The text encoding byte used by ID3v2 frames
#[derive(Debug, Clone, Eq, PartialEq, Copy, Hash)]
#[repr(u8)]
pub enum TextEncoding {
	/// ISO-8859-1
	Latin1 = 0,
	/// UTF-16 with a byte order mark
	UTF16 = 1,
	/// UTF-16 big endian, no byte order mark
	UTF16BE = 2,
	/// UTF-8
	UTF8 = 3,
}

impl TextEncoding {
	/// Get a `TextEncoding` from its ID3v2 encoding byte
	///
	/// Anything above 3 is unknown.
	pub fn from_u8(byte: u8) -> Option<Self> {
		[Self::Latin1, Self::UTF16, Self::UTF16BE, Self::UTF8]
			.into_iter()
			.find(|encoding| *encoding as u8 == byte)
	}

	fn name(self) -> &'static str {
		match self {
			Self::Latin1 => "Latin-1",
			Self::UTF16 => "UTF-16",
			Self::UTF16BE => "UTF-16 BE",
			Self::UTF8 => "UTF-8",
		}
	}

	pub(crate) fn verify_latin1(text: &str) -> bool {
		text.chars().all(|c| u8::try_from(c).is_ok())
	}

	/// ID3v2.3 only knows Latin-1 and UTF-16 with a BOM
	pub(crate) fn to_id3v23(self) -> Self {
		match self {
			Self::Latin1 => Self::Latin1,
			_ => Self::UTF16,
		}
	}

	pub(crate) fn terminator_len(self) -> usize {
		match self {
			Self::UTF16 | Self::UTF16BE => 2,
			Self::Latin1 | Self::UTF8 => 1,
		}
	}

	/// Encode `text`, optionally NUL terminated
	///
	/// With `lossy`, characters outside of Latin-1 become `?` rather than an error.
	pub(crate) fn encode(
		self,
		text: &str,
		terminated: bool,
		lossy: bool,
	) -> std::result::Result<Vec<u8>, TextEncodingError> {
		let mut out = match self {
			Self::Latin1 => latin1_encode(text, lossy).collect::<std::result::Result<_, _>>()?,
			Self::UTF16 => utf16_encode(text, u16::to_le_bytes, true),
			Self::UTF16BE => utf16_encode(text, u16::to_be_bytes, false),
			Self::UTF8 => text.as_bytes().to_vec(),
		};

		if terminated {
			out.extend(std::iter::repeat_n(0, self.terminator_len()));
		}

		Ok(out)
	}
}

/// Decode a string from the start of `bytes`
///
/// With `terminated`, decoding stops at the first NUL of the encoding's width. Otherwise
/// the whole slice is decoded. Returns the text and the number of bytes consumed,
/// including the terminator.
pub(crate) fn decode_text(
	bytes: &[u8],
	encoding: TextEncoding,
	terminated: bool,
) -> Result<(String, usize)> {
	let width = encoding.terminator_len();

	let (raw, consumed) = match terminated.then(|| find_terminator(bytes, width)).flatten() {
		Some(end) => (&bytes[..end], end + width),
		None => (bytes, bytes.len()),
	};

	let text = match encoding {
		TextEncoding::Latin1 => latin1_decode(raw),
		TextEncoding::UTF8 => utf8_decode(raw)?,
		TextEncoding::UTF16BE => utf16_decode_bytes(even(raw, terminated)?, u16::from_be_bytes)?,
		TextEncoding::UTF16 => {
			let raw = even(raw, terminated)?;

			// Missing BOMs are common when several strings share a frame, assume LE then
			match raw {
				[0xFE, 0xFF, ..] => utf16_decode_bytes(&raw[2..], u16::from_be_bytes)?,
				_ => utf16_decode_bytes(raw, u16::from_le_bytes)?,
			}
		},
	};

	Ok((text, consumed))
}

// Offset of the first NUL character, aligned to `width`
fn find_terminator(bytes: &[u8], width: usize) -> Option<usize> {
	bytes
		.chunks_exact(width)
		.position(|chunk| chunk.iter().all(|b| *b == 0))
		.map(|index| index * width)
}

// An unterminated UTF-16 string running to the end of the input may carry a stray byte
fn even(raw: &[u8], terminated: bool) -> Result<&[u8]> {
	match raw.len() % 2 {
		0 => Ok(raw),
		_ if terminated => Ok(&raw[..raw.len() - 1]),
		_ => Err(decode_err!("UTF-16 string has an odd length")),
	}
}

pub(crate) fn latin1_decode(bytes: &[u8]) -> String {
	let mut text = bytes.iter().copied().map(char::from).collect();
	trim_end_nulls(&mut text);
	text
}

pub(crate) fn latin1_encode(
	s: &str,
	lossy: bool,
) -> impl Iterator<Item = std::result::Result<u8, TextEncodingError>> {
	s.chars()
		.enumerate()
		.map(move |(index, c)| match u8::try_from(c) {
			Ok(byte) => Ok(byte),
			Err(_) if lossy => Ok(b'?'),
			Err(_) => Err(TextEncodingError {
				encoding: TextEncoding::Latin1,
				valid_up_to: index,
			}),
		})
}

pub(crate) fn utf8_decode(bytes: &[u8]) -> Result<String> {
	let mut text = String::from(std::str::from_utf8(bytes)?);
	trim_end_nulls(&mut text);
	Ok(text)
}

/// Decode UTF-8, replacing invalid sequences
pub(crate) fn utf8_decode_lossy(bytes: &[u8]) -> String {
	let mut text = String::from_utf8_lossy(bytes).into_owned();
	trim_end_nulls(&mut text);
	text
}

/// Decode UTF-16 with a fixed byte order
///
/// BOMs matching `endianness` are dropped wherever they appear, since multi-valued ID3v2 frames
/// may repeat them before each value.
pub(crate) fn utf16_decode_bytes(bytes: &[u8], endianness: fn([u8; 2]) -> u16) -> Result<String> {
	let units = bytes
		.chunks_exact(2)
		.map(|pair| endianness([pair[0], pair[1]]))
		.filter(|unit| *unit != BOM)
		.collect::<Vec<u16>>();

	let Ok(mut text) = String::from_utf16(&units) else {
		return Err(decode_err!("Given an invalid UTF-16 string"));
	};

	trim_end_nulls(&mut text);
	Ok(text)
}

pub(crate) fn trim_end_nulls(text: &mut String) {
	let len = text.trim_end_matches('\0').len();
	text.truncate(len);
}

fn utf16_encode(text: &str, endianness: fn(u16) -> [u8; 2], bom: bool) -> Vec<u8> {
	let bom = bom.then_some(BOM);

	bom.into_iter()
		.chain(text.encode_utf16())
		.flat_map(endianness)
		.collect()
}

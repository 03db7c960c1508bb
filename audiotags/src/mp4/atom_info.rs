use crate::config::ParsingMode;
use crate::error::Result;
use crate::macros::{decode_err, try_vec, truncated_err};
use crate::util::text::utf8_decode;

use std::fmt::{Display, Formatter};
use std::io::{Read, Seek, SeekFrom};

use byteorder::{BigEndian, ReadBytesExt};

/// Size (4) and identifier (4)
pub(super) const ATOM_HEADER_LEN: u64 = 8;
// A 64-bit size follows the identifier when the 32-bit size is 1
const EXTENDED_SIZE_LEN: u64 = 8;

/// The `mean` of freeform atoms written by iTunes
pub(crate) const ITUNES_MEAN: &str = "com.apple.iTunes";

/// An MP4 atom identifier
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub enum AtomIdent {
	/// A four byte identifier
	///
	/// Many of the metadata identifiers start with `0xA9` (©).
	Fourcc([u8; 4]),
	/// A `----` atom, named by its `mean` and `name` children
	///
	/// The text form is `----:mean:name`, e.g. `----:com.apple.iTunes:MOOD`.
	Freeform {
		/// A reverse DNS namespace
		mean: String,
		/// The field name within `mean`
		name: String,
	},
}

impl AtomIdent {
	/// Parse the text form produced by [`Display`]
	pub(crate) fn parse(ident: &str) -> Option<Self> {
		if let Some(rest) = ident.strip_prefix("----:") {
			return match rest.split_once(':') {
				Some((mean, name)) if !mean.is_empty() && !name.is_empty() => Some(Self::Freeform {
					mean: mean.to_owned(),
					name: name.to_owned(),
				}),
				_ => None,
			};
		}

		// Every character stands for one byte, as in Latin-1
		let bytes = ident
			.chars()
			.map(|c| u8::try_from(c).ok())
			.collect::<Option<Vec<u8>>>()?;

		match <[u8; 4]>::try_from(bytes) {
			Ok(fourcc) if fourcc.iter().all(|b| plausible_ident_byte(*b)) => {
				Some(Self::Fourcc(fourcc))
			},
			_ => None,
		}
	}
}

impl Display for AtomIdent {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Fourcc(fourcc) => fourcc.iter().try_for_each(|b| write!(f, "{}", char::from(*b))),
			Self::Freeform { mean, name } => write!(f, "----:{mean}:{name}"),
		}
	}
}

// Any byte is technically allowed. These are the only ones seen in practice, anything else
// means the parent's layout was misread.
fn plausible_ident_byte(b: u8) -> bool {
	b.is_ascii_graphic() || b == b' ' || b == 0xA9
}

/// A located atom header
#[derive(Debug, Clone)]
pub(crate) struct AtomInfo {
	pub(crate) start: u64,
	/// The full length, header included
	pub(crate) len: u64,
	pub(crate) extended: bool,
	pub(crate) ident: AtomIdent,
}

impl AtomInfo {
	/// Read an atom header
	///
	/// `available` is the number of bytes left in the parent. `None` means the rest of the parent
	/// can't be trusted, which only happens outside of [`ParsingMode::Strict`]. The reader is moved
	/// to the end of the stream in that case.
	pub(crate) fn read<R>(data: &mut R, available: u64, parse_mode: ParsingMode) -> Result<Option<Self>>
	where
		R: Read + Seek,
	{
		let start = data.stream_position()?;
		let size = data.read_u32::<BigEndian>()?;

		let mut fourcc = [0; 4];
		data.read_exact(&mut fourcc)?;

		if !fourcc.iter().all(|b| plausible_ident_byte(*b)) {
			data.seek(SeekFrom::End(0))?;

			if parse_mode == ParsingMode::Strict {
				decode_err!(@BAIL Mp4, "Encountered an atom with invalid characters");
			}

			log::warn!(
				"MP4: Atom at {start} has an invalid identifier ({}), stopping",
				fourcc.escape_ascii()
			);
			return Ok(None);
		}

		let (len, extended) = match size {
			0 => (data.seek(SeekFrom::End(0))? - start, false),
			1 => (data.read_u64::<BigEndian>()?, true),
			_ => (u64::from(size), false),
		};

		if size == 0 {
			data.seek(SeekFrom::Start(start + ATOM_HEADER_LEN))?;
		}

		let header_len = ATOM_HEADER_LEN + if extended { EXTENDED_SIZE_LEN } else { 0 };
		if len < header_len {
			data.seek(SeekFrom::End(0))?;
			decode_err!(@BAIL Mp4, "Found an atom with an invalid length (< 8)");
		}

		if len > available {
			// Writers that don't understand padding tend to leave an oversized trailing `free`
			let tolerated = match parse_mode {
				ParsingMode::Strict => false,
				ParsingMode::BestAttempt => &fourcc == b"free",
				ParsingMode::Relaxed => true,
			};

			if !tolerated {
				truncated_err!(@BAIL Mp4, "Atom length exceeds its parent");
			}

			log::warn!("MP4: `{}` atom overruns its parent, stopping", fourcc.escape_ascii());
			data.seek(SeekFrom::End(0))?;
			return Ok(None);
		}

		let ident = match &fourcc {
			b"----" => read_freeform(data, len - header_len, parse_mode)?,
			_ => AtomIdent::Fourcc(fourcc),
		};

		Ok(Some(Self {
			start,
			len,
			extended,
			ident,
		}))
	}

	pub(crate) fn header_size(&self) -> u64 {
		if self.extended {
			return ATOM_HEADER_LEN + EXTENDED_SIZE_LEN;
		}

		ATOM_HEADER_LEN
	}

	pub(crate) fn end(&self) -> u64 {
		self.start + self.len
	}
}

// The `mean` and `name` children come first, each a full atom with a version and flags
fn read_freeform<R>(data: &mut R, mut available: u64, parse_mode: ParsingMode) -> Result<AtomIdent>
where
	R: Read + Seek,
{
	let mut child = |expected: &[u8; 4]| -> Result<String> {
		let Some(atom) = AtomInfo::read(&mut *data, available, parse_mode)? else {
			decode_err!(@BAIL Mp4, "Freeform identifier is missing its `mean` or `name`");
		};

		match atom.ident {
			AtomIdent::Fourcc(ref fourcc) if fourcc == expected && atom.len >= 12 => {},
			_ => decode_err!(@BAIL Mp4, "Freeform identifier is missing its `mean` or `name`"),
		}

		// Version (1) and flags (3)
		data.seek(SeekFrom::Current(4))?;

		let mut content = try_vec![0; (atom.len - 12) as usize];
		data.read_exact(&mut content)?;

		available -= atom.len;
		utf8_decode(&content).map_err(|_| decode_err!(Mp4, "Freeform identifier is not UTF-8"))
	};

	let mean = child(b"mean")?;
	let name = child(b"name")?;

	Ok(AtomIdent::Freeform { mean, name })
}

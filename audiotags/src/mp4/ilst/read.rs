use super::Ilst;
use super::atom::{Atom, AtomData};
use super::data_type::DataType;
use crate::config::ParsingMode;
use crate::error::Result;
use crate::macros::{decode_err, try_vec};
use crate::mp4::atom_info::{AtomIdent, AtomInfo};
use crate::mp4::read::{AtomReader, skip_atom};
use crate::picture::{Picture, PictureType};
use crate::util::text::{utf8_decode, utf16_decode_bytes};

use std::io::{Cursor, Read, Seek, SeekFrom};

// Size (4), "data" (4), type (4), locale (4)
const DATA_HEADER_LEN: u64 = 16;

/// How the `data` children of an item are interpreted
enum ItemKind {
	Padding,
	Cover,
	/// Integers of any size, which are normalized to a single byte on write
	Flag,
	Plain,
}

impl ItemKind {
	fn of(ident: &AtomIdent) -> Self {
		let AtomIdent::Fourcc(fourcc) = ident else {
			return Self::Plain;
		};

		match fourcc {
			b"free" | b"skip" => Self::Padding,
			b"covr" => Self::Cover,
			b"cpil" | b"hdvd" | b"pcst" | b"pgap" | b"shwm" => Self::Flag,
			_ => Self::Plain,
		}
	}
}

struct DataChild {
	code: DataType,
	content: Vec<u8>,
}

/// Parse the items of `ilst`
///
/// The reader is expected to be at the content of `ilst`.
pub(in crate::mp4) fn parse_ilst<R>(reader: &mut AtomReader<R>, ilst: &AtomInfo) -> Result<Ilst>
where
	R: Read + Seek,
{
	let parse_mode = reader.parse_mode();

	let mut content = try_vec![0; (ilst.len - ilst.header_size()) as usize];
	reader.read_exact(&mut content)?;

	let mut cursor = Cursor::new(content);
	let mut items = AtomReader::new(&mut cursor, parse_mode)?;

	let mut tag = Ilst::default();
	while let Some(item) = items.next()? {
		let data = match ItemKind::of(&item.ident) {
			ItemKind::Padding => {
				skip_atom(&mut items, &item)?;
				continue;
			},
			ItemKind::Cover => covers(read_data_children(&mut items, &item)?, parse_mode)?,
			ItemKind::Flag => read_data_children(&mut items, &item)?
				.into_iter()
				.take(1)
				.map(|child| AtomData::Bool(child.content.iter().any(|b| *b != 0)))
				.collect(),
			ItemKind::Plain => {
				let children = read_data_children(&mut items, &item)?;
				plain_values(&item.ident, children, parse_mode)?
			},
		};

		tag.atoms.extend(Atom::from_collection(item.ident, data));
	}

	log::debug!("MP4: Parsed {} `ilst` item(s)", tag.atoms.len());
	Ok(tag)
}

/// Read every `data` child of `item`
///
/// Other children are skipped, as are `data` atoms from a type set other than the well known
/// one. The reader is left at the end of `item`.
fn read_data_children<R>(reader: &mut AtomReader<R>, item: &AtomInfo) -> Result<Vec<DataChild>>
where
	R: Read + Seek,
{
	let parse_mode = reader.parse_mode();
	let strict = parse_mode == ParsingMode::Strict;

	let mut children = Vec::new();
	loop {
		let remaining = item.end().saturating_sub(reader.stream_position()?);
		if remaining == 0 {
			break;
		}

		if remaining < DATA_HEADER_LEN {
			if strict {
				decode_err!(@BAIL Mp4, "Found trailing bytes too short to be a \"data\" atom");
			}

			log::warn!("MP4: Ignoring {remaining} trailing bytes in `{}`", item.ident);
			break;
		}

		let Some(child) = AtomInfo::read(reader, remaining, parse_mode)? else {
			break;
		};

		if child.len < DATA_HEADER_LEN {
			if strict {
				decode_err!(@BAIL Mp4, "Data atom is too small");
			}

			log::warn!(
				"MP4: `data` atom in `{}` is only {} bytes, stopping",
				item.ident,
				child.len
			);
			break;
		}

		if child.ident != AtomIdent::Fourcc(*b"data") {
			if strict {
				decode_err!(@BAIL Mp4, "Expected atom \"data\" to follow name");
			}

			log::warn!("MP4: Skipping `{}` in `{}`", child.ident, item.ident);
			skip_atom(reader, &child)?;
			continue;
		}

		// A type set (1) other than 0 can't be interpreted
		let type_set = reader.read_u8()?;
		let code = DataType::from(reader.read_u24()?);
		if type_set != 0 {
			if strict {
				decode_err!(@BAIL Mp4, "Unknown type set in data atom");
			}

			log::warn!("MP4: Skipping `data` with type set {type_set} in `{}`", item.ident);
			skip_atom(reader, &child)?;
			continue;
		}

		// Locale
		reader.seek(SeekFrom::Current(4))?;

		let content_len = child.len - child.header_size() - 8;
		if content_len == 0 {
			log::debug!("MP4: Skipping empty `data` in `{}`", item.ident);
			continue;
		}

		let mut content = try_vec![0; content_len as usize];
		reader.read_exact(&mut content)?;
		children.push(DataChild { code, content });
	}

	reader.seek(SeekFrom::Start(item.end()))?;
	Ok(children)
}

// `covr` has no notion of a picture type, everything is the front cover
fn covers(children: Vec<DataChild>, parse_mode: ParsingMode) -> Result<Vec<AtomData>> {
	let mut pictures = Vec::with_capacity(children.len());

	for DataChild { code, content } in children {
		let mime_type = match code.picture_mime() {
			Ok(mime_type) => mime_type,
			Err(_) if parse_mode == ParsingMode::Strict => {
				decode_err!(@BAIL Mp4, "\"covr\" atom has an unknown type");
			},
			Err(other) => {
				log::warn!("MP4: Discarding `covr` data of type {}", u32::from(other));
				continue;
			},
		};

		let mut picture = Picture::unchecked(content).pic_type(PictureType::CoverFront);
		if let Some(mime_type) = mime_type {
			picture = picture.mime_type(mime_type);
		}

		pictures.push(AtomData::Picture(picture.build()));
	}

	Ok(pictures)
}

// Content that can't be interpreted is kept raw, so it is written back untouched
fn plain_values(
	ident: &AtomIdent,
	children: Vec<DataChild>,
	parse_mode: ParsingMode,
) -> Result<Vec<AtomData>> {
	let mut values = Vec::with_capacity(children.len());

	for DataChild { code, content } in children {
		match interpret(code, &content) {
			Ok(Some(value)) => values.push(value),
			Ok(None) => values.push(AtomData::Unknown { code, data: content }),
			Err(e) if parse_mode == ParsingMode::Strict => return Err(e),
			Err(e) => {
				log::warn!("MP4: Keeping `{ident}` as raw data: {e}");
				values.push(AtomData::Unknown { code, data: content });
			},
		}
	}

	Ok(values)
}

fn interpret(code: DataType, content: &[u8]) -> Result<Option<AtomData>> {
	let value = match code {
		DataType::Utf8 => Some(AtomData::UTF8(utf8_decode(content)?)),
		DataType::Utf16 => {
			let text = utf16_decode_bytes(content, u16::from_be_bytes)?;
			Some(AtomData::UTF16(text))
		},
		DataType::BeSignedInteger => {
			be_int(content, true).map(|int| AtomData::SignedInteger(int as i32))
		},
		DataType::BeUnsignedInteger => {
			be_int(content, false).map(|int| AtomData::UnsignedInteger(int as u32))
		},
		_ => None,
	};

	Ok(value)
}

// A 1-4 byte big endian integer. Wider values (such as `plID`) stay raw.
fn be_int(bytes: &[u8], signed: bool) -> Option<i64> {
	if bytes.is_empty() || bytes.len() > 4 {
		return None;
	}

	let mut padded = [0; 8];
	padded[8 - bytes.len()..].copy_from_slice(bytes);

	let value = i64::from_be_bytes(padded);
	if !signed {
		return Some(value);
	}

	let shift = 64 - 8 * bytes.len() as u32;
	Some(value << shift >> shift)
}

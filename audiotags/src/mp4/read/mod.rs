mod atom_reader;

use super::Mp4File;
use super::atom_info::{AtomIdent, AtomInfo};
use super::moov::Moov;
use crate::config::{ParseOptions, ParsingMode};
use crate::dialect::{Dialect, TagBlock};
use crate::error::Result;
use crate::file::FileType;
use crate::macros::{decode_err, err};
use crate::model::{AudioRegion, BlockInfo, Container, ContainerHeader, StructuralModel};
use crate::properties::AudioProperties;
use crate::util::text::utf8_decode;

use std::io::{Read, Seek, SeekFrom};

use byteorder::{BigEndian, ReadBytesExt};

pub(super) use atom_reader::AtomReader;

/// Verify the file starts with an `ftyp` atom, returning its major brand
pub(in crate::mp4) fn verify_mp4<R>(reader: &mut AtomReader<R>) -> Result<String>
where
	R: Read + Seek,
{
	let Some(atom) = reader.next()? else {
		err!(UnrecognizedFormat);
	};

	if atom.ident != AtomIdent::Fourcc(*b"ftyp") {
		err!(UnrecognizedFormat);
	}

	// size + identifier + major brand
	// There *should* be more, but this is all we need from it
	if atom.len < 12 {
		decode_err!(@BAIL Mp4, "\"ftyp\" atom too short");
	}

	let mut major_brand = [0u8; 4];
	reader.read_exact(&mut major_brand)?;

	skip_atom(reader, &atom)?;

	let major_brand = utf8_decode(&major_brand)
		.map_err(|_| decode_err!(Mp4, "Unable to parse \"ftyp\"'s major brand"))?;

	log::debug!("Verified to be an MP4 file. Major brand: {major_brand:?}");
	Ok(major_brand)
}

pub(crate) fn read_from<R>(data: &mut R, parse_options: ParseOptions) -> Result<StructuralModel>
where
	R: Read + Seek,
{
	let mut reader = AtomReader::new(data, parse_options.parsing_mode)?;
	let file_length = reader.seek(SeekFrom::End(0))?;
	reader.rewind()?;

	let ftyp = verify_mp4(&mut reader)?;

	let mut moov = None;
	let mut mdat = None;
	while let Some(atom) = reader.next()? {
		log::trace!("Found top level atom `{}` at {}, size: {}", atom.ident, atom.start, atom.len);

		skip_atom(&mut reader, &atom)?;
		if moov.is_none() && atom.ident == AtomIdent::Fourcc(*b"moov") {
			moov = Some(atom);
		} else if mdat.is_none() && atom.ident == AtomIdent::Fourcc(*b"mdat") {
			mdat = Some(atom);
		}
	}

	let Some(moov_info) = moov else {
		decode_err!(@BAIL Mp4, "No \"moov\" atom found");
	};

	// Restrict the reader to the children of `moov`
	reader.reset_bounds(
		moov_info.start + moov_info.header_size(),
		moov_info.len - moov_info.header_size(),
	)?;
	let moov = Moov::parse(&mut reader)?;

	// Positions are absolute from here on
	reader.reset_bounds(0, file_length)?;

	let audio = match &mdat {
		Some(mdat) => AudioRegion {
			offset: mdat.start + mdat.header_size(),
			len: mdat.len - mdat.header_size(),
		},
		None => {
			log::warn!("No \"mdat\" atom found, the file has no audio");
			AudioRegion {
				offset: file_length,
				len: 0,
			}
		},
	};

	let properties = if parse_options.read_properties {
		super::properties::read_properties(&mut reader, &moov.traks, audio.len, file_length)?
	} else {
		AudioProperties::default()
	};

	let blocks = moov
		.ilst
		.as_ref()
		.map(|(_, info)| BlockInfo::new(Dialect::Mp4Ilst, info.start, info.len))
		.into_iter()
		.collect();

	Ok(StructuralModel {
		header: ContainerHeader {
			file_type: FileType::Mp4,
			version: ftyp.clone(),
		},
		blocks,
		audio,
		properties,
		container: Container::Mp4(Mp4File {
			ftyp,
			ilst: moov.ilst.map(|(ilst, _)| TagBlock::Ilst(ilst)),
		}),
	})
}

/// Move the reader to the end of `atom`
pub(super) fn skip_atom<R>(reader: &mut R, atom: &AtomInfo) -> Result<()>
where
	R: Read + Seek,
{
	let pos = reader.stream_position()?;

	let Some(remaining) = atom.end().checked_sub(pos) else {
		decode_err!(@BAIL Mp4, "Read past the end of an atom");
	};

	log::trace!("Skipping {remaining} bytes of `{}`", atom.ident);

	let Ok(remaining) = i64::try_from(remaining) else {
		err!(TooMuchData);
	};

	reader.seek(SeekFrom::Current(remaining))?;
	Ok(())
}

/// Find the first child of `parent` with the given fourcc
///
/// The reader is expected to be positioned at the first child. On success it is left at the
/// content of the found atom.
pub(super) fn find_child_atom<R>(
	reader: &mut R,
	parent: &AtomInfo,
	expected: [u8; 4],
	parse_mode: ParsingMode,
) -> Result<Option<AtomInfo>>
where
	R: Read + Seek,
{
	let end = parent.end();

	loop {
		let pos = reader.stream_position()?;
		if pos + 8 > end {
			return Ok(None);
		}

		let Some(atom) = AtomInfo::read(reader, end - pos, parse_mode)? else {
			return Ok(None);
		};

		if atom.ident == AtomIdent::Fourcc(expected) {
			return Ok(Some(atom));
		}

		skip_atom(reader, &atom)?;
	}
}

/// Check for the version and flags of a `meta` atom
///
/// A full `meta` atom has a version (1) and flags (3), but it's possible that it is written as
/// a normal atom. The reader is left at the first child either way.
pub(super) fn meta_is_full<R>(reader: &mut R) -> Result<bool>
where
	R: Read + Seek,
{
	let _version_flags = reader.read_u32::<BigEndian>()?;

	// Check if the next four bytes is one of the nested `meta` atoms
	let mut possible_ident = [0; 4];
	reader.read_exact(&mut possible_ident)?;

	match &possible_ident {
		b"hdlr" | b"ilst" | b"mhdr" | b"ctry" | b"lang" => {
			log::warn!("File contains a non-full 'meta' atom");

			reader.seek(SeekFrom::Current(-8))?;
			Ok(false)
		},
		_ => {
			reader.seek(SeekFrom::Current(-4))?;
			Ok(true)
		},
	}
}

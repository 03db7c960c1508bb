use super::atom_info::{AtomIdent, AtomInfo};
use super::ilst::Ilst;
use super::ilst::read::parse_ilst;
use super::read::{AtomReader, find_child_atom, meta_is_full, skip_atom};
use crate::error::Result;

use std::io::{Read, Seek};

pub(crate) struct Moov {
	// Represents the trak.mdia atom
	pub(crate) traks: Vec<AtomInfo>,
	// Represents a parsed moov.udta.meta.ilst, and where it was found
	pub(crate) ilst: Option<(Ilst, AtomInfo)>,
}

impl Moov {
	/// Parse the children of `moov`
	///
	/// The reader is expected to be bound to the content of the `moov` atom.
	pub(super) fn parse<R>(reader: &mut AtomReader<R>) -> Result<Self>
	where
		R: Read + Seek,
	{
		let parse_mode = reader.parse_mode();

		let mut traks = Vec::new();
		let mut ilst = None;

		while let Some(atom) = reader.next()? {
			if let AtomIdent::Fourcc(fourcc) = &atom.ident {
				match fourcc {
					b"trak" => {
						// All we need from here is trak.mdia
						if let Some(mdia) = find_child_atom(reader, &atom, *b"mdia", parse_mode)? {
							traks.push(mdia);
						}
					},
					b"udta" if ilst.is_none() => ilst = ilst_from_udta(reader, &atom)?,
					b"udta" => {
						log::warn!("Multiple `ilst` atoms found, only the first one is used");
					},
					_ => {},
				}
			}

			skip_atom(reader, &atom)?;
		}

		Ok(Self { traks, ilst })
	}
}

fn ilst_from_udta<R>(reader: &mut AtomReader<R>, udta: &AtomInfo) -> Result<Option<(Ilst, AtomInfo)>>
where
	R: Read + Seek,
{
	let parse_mode = reader.parse_mode();

	let Some(meta) = find_child_atom(reader, udta, *b"meta", parse_mode)? else {
		return Ok(None);
	};

	// It's possible for the `meta` atom to be non-full, so we have to check for that case
	meta_is_full(reader)?;

	let Some(ilst) = find_child_atom(reader, &meta, *b"ilst", parse_mode)? else {
		return Ok(None);
	};

	log::debug!("Found `ilst` atom at {}, size: {}", ilst.start, ilst.len);

	let parsed = parse_ilst(reader, &ilst)?;
	Ok(Some((parsed, ilst)))
}

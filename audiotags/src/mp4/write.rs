use super::atom_info::{ATOM_HEADER_LEN, AtomIdent, AtomInfo};
use super::read::{meta_is_full, skip_atom};
use crate::config::{ParseOptions, ParsingMode, WriteOptions};
use crate::error::Result;
use crate::macros::{decode_err, encode_err, err, try_vec};
use crate::model::{AudioRegion, Staged};

use std::io::{Cursor, Read, Seek, SeekFrom, Write};
use std::ops::Range;

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

// Size (4) + identifier (4) + version (1) + flags (3)
const FULL_ATOM_SIZE: u64 = 12;
// Full atom + pre-defined (4) + handler type (8) + reserved (8) + name (1)
const HDLR_SIZE: u64 = FULL_ATOM_SIZE + 21;

/// A wrapper around [`AtomInfo`] that tracks all of the children of containers we deem important
#[derive(Debug)]
struct ContextualAtom {
	info: AtomInfo,
	children: Vec<ContextualAtom>,
}

#[rustfmt::skip]
const IMPORTANT_CONTAINERS: &[[u8; 4]] = &[
	*b"moov",
		*b"udta",
			*b"meta",
		*b"trak",
			*b"mdia",
				*b"minf",
					*b"stbl",
	*b"moof",
		*b"traf",
];

impl ContextualAtom {
	fn read<R>(
		reader: &mut R,
		reader_len: &mut u64,
		parse_mode: ParsingMode,
	) -> Result<Option<ContextualAtom>>
	where
		R: Read + Seek,
	{
		if *reader_len == 0 {
			return Ok(None);
		}

		if *reader_len < ATOM_HEADER_LEN {
			log::warn!("Skipping {reader_len} trailing bytes in a container");
			reader.seek(SeekFrom::Current(*reader_len as i64))?;
			*reader_len = 0;
			return Ok(None);
		}

		let Some(info) = AtomInfo::read(reader, *reader_len, parse_mode)? else {
			return Ok(None);
		};

		match &info.ident {
			AtomIdent::Fourcc(ident) if IMPORTANT_CONTAINERS.contains(ident) => {},
			_ => {
				*reader_len = reader_len.saturating_sub(info.len);

				// We don't care about the atom's contents
				skip_atom(reader, &info)?;
				return Ok(Some(ContextualAtom {
					info,
					children: Vec::new(),
				}));
			},
		}

		let mut len = info.len - info.header_size();
		let mut children = Vec::new();

		// See meta_is_full for details
		if info.ident == AtomIdent::Fourcc(*b"meta") && meta_is_full(reader)? {
			len -= 4;
		}

		while let Some(child) = Self::read(reader, &mut len, parse_mode)? {
			children.push(child);
		}

		if len != 0 {
			decode_err!(@BAIL Mp4, "Unable to read entire container");
		}

		*reader_len = reader_len.saturating_sub(info.len);
		Ok(Some(ContextualAtom { info, children }))
	}

	fn child(&self, fourcc: [u8; 4]) -> Option<&ContextualAtom> {
		find(&self.children, fourcc)
	}

	/// Every atom named `expected` below this one, at any depth
	fn find_all<'a>(&'a self, expected: [u8; 4], found: &mut Vec<&'a AtomInfo>) {
		for child in &self.children {
			if child.info.ident == AtomIdent::Fourcc(expected) {
				found.push(&child.info);
			}

			child.find_all(expected, found);
		}
	}
}

fn find(atoms: &[ContextualAtom], fourcc: [u8; 4]) -> Option<&ContextualAtom> {
	atoms
		.iter()
		.find(|atom| atom.info.ident == AtomIdent::Fourcc(fourcc))
}

/// A single replacement within the file
struct Edit<'a> {
	range: Range<u64>,
	replacement: Vec<u8>,
	/// Containers enclosing `range`, whose sizes change along with it
	ancestors: Vec<&'a AtomInfo>,
}

impl Edit<'_> {
	fn difference(&self) -> i64 {
		self.replacement.len() as i64 - (self.range.end - self.range.start) as i64
	}
}

/// Replace the `ilst` atom of `original` with `ilst`
///
/// An empty `ilst` removes the atom, leaving `free` space behind. Any missing `udta` or `meta`
/// parents are created at the end of their own parent.
pub(super) fn stage(
	original: &[u8],
	ilst: &[u8],
	audio: AudioRegion,
	options: WriteOptions,
) -> Result<Staged> {
	let mut reader = Cursor::new(original);
	let mut len = original.len() as u64;

	let mut atoms = Vec::new();
	while let Some(atom) =
		ContextualAtom::read(&mut reader, &mut len, ParseOptions::DEFAULT_PARSING_MODE)?
	{
		atoms.push(atom);
	}

	let Some(moov) = find(&atoms, *b"moov") else {
		encode_err!(@BAIL Mp4, "Could not find \"moov\" atom in target file");
	};

	let udta = moov.child(*b"udta");
	let meta = udta.and_then(|udta| udta.child(*b"meta"));

	let edit = match (udta, meta) {
		(Some(udta), Some(meta)) => match meta.child(*b"ilst") {
			Some(_) => replace_ilst(udta, meta, moov, ilst, options)?,
			None if ilst.is_empty() => None,
			None => {
				log::debug!("Appending `ilst` atom to the existing `meta` atom");

				let end = meta.info.end();
				Some(Edit {
					range: end..end,
					replacement: padded(ilst, options)?,
					ancestors: vec![&meta.info, &udta.info, &moov.info],
				})
			},
		},
		_ if ilst.is_empty() => None,
		(Some(udta), None) => {
			log::debug!("Creating a `meta` atom");

			let end = udta.info.end();
			Some(Edit {
				range: end..end,
				replacement: create_meta(&padded(ilst, options)?)?,
				ancestors: vec![&udta.info, &moov.info],
			})
		},
		(None, _) => {
			log::debug!("Creating a `udta` atom");

			let end = moov.info.end();
			Some(Edit {
				range: end..end,
				replacement: create_udta(&padded(ilst, options)?)?,
				ancestors: vec![&moov.info],
			})
		},
	};

	let Some(edit) = edit else {
		log::debug!("Nothing to write, file is unchanged");
		return Ok(Staged::new(original, original.to_vec(), audio));
	};

	let difference = edit.difference();
	let edit_point = edit.range.start;
	let bytes = apply_edit(original, &atoms, edit)?;

	// `mdat` is a top level atom, it only moves if it comes after the edit
	let audio = if audio.offset >= edit_point {
		AudioRegion {
			offset: (audio.offset as i64 + difference) as u64,
			len: audio.len,
		}
	} else {
		audio
	};

	Ok(Staged::new(original, bytes, audio))
}

/// Replace an existing `ilst`, making use of any `free` atoms surrounding it
fn replace_ilst<'a>(
	udta: &'a ContextualAtom,
	meta: &'a ContextualAtom,
	moov: &'a ContextualAtom,
	ilst: &[u8],
	options: WriteOptions,
) -> Result<Option<Edit<'a>>> {
	let siblings = &meta.children;
	let Some(ilst_idx) = siblings
		.iter()
		.position(|atom| atom.info.ident == AtomIdent::Fourcc(*b"ilst"))
	else {
		return Ok(None);
	};

	let is_free = |atom: &ContextualAtom| atom.info.ident == AtomIdent::Fourcc(*b"free");

	// Check for padding directly before and after the `ilst` atom
	let first = siblings[..ilst_idx]
		.iter()
		.rposition(|atom| !is_free(atom))
		.map_or(0, |i| i + 1);
	let last = siblings[ilst_idx + 1..]
		.iter()
		.position(|atom| !is_free(atom))
		.map_or(siblings.len(), |i| ilst_idx + 1 + i);

	log::trace!(
		"Found {} preceding and {} succeeding `free` atoms",
		ilst_idx - first,
		last - ilst_idx - 1
	);

	let range = siblings[first].info.start..siblings[last - 1].info.end();
	let available_space = range.end - range.start;
	let ilst_len = ilst.len() as u64;

	let replacement = if available_space == ilst_len {
		ilst.to_vec()
	} else if available_space >= ilst_len + ATOM_HEADER_LEN {
		log::trace!("Found enough padding to fit the tag, file size will not change");

		let mut replacement = ilst.to_vec();
		write_free_atom(&mut replacement, available_space - ilst_len)?;
		replacement
	} else {
		log::trace!("Tag doesn't fit in the available space, offsets will be updated");
		padded(ilst, options)?
	};

	Ok(Some(Edit {
		range,
		replacement,
		ancestors: vec![&meta.info, &udta.info, &moov.info],
	}))
}

/// Apply `edit` to a copy of `original`, fixing up container sizes and chunk offsets
fn apply_edit(original: &[u8], atoms: &[ContextualAtom], edit: Edit<'_>) -> Result<Vec<u8>> {
	let difference = edit.difference();
	let Edit {
		range,
		replacement,
		ancestors,
	} = edit;

	let mut bytes = Vec::with_capacity((original.len() as i64 + difference) as usize);
	bytes.extend_from_slice(&original[..range.start as usize]);
	bytes.extend_from_slice(&replacement);
	bytes.extend_from_slice(&original[range.end as usize..]);

	if difference != 0 {
		// Every ancestor header is before the edit point, so it hasn't moved
		for ancestor in ancestors {
			let new_len = (ancestor.len as i64 + difference) as u64;
			write_atom_size(&mut bytes, ancestor, new_len)?;
		}

		update_offsets(&mut bytes, atoms, difference, range.start)?;
	}

	log::debug!(
		"MP4: replaced {} bytes at {} with {} bytes",
		range.end - range.start,
		range.start,
		replacement.len()
	);

	Ok(bytes)
}

/// `ilst` followed by the preferred amount of padding
fn padded(ilst: &[u8], options: WriteOptions) -> Result<Vec<u8>> {
	let mut ret = ilst.to_vec();

	match options.preferred_padding {
		Some(padding) if u64::from(padding) >= ATOM_HEADER_LEN => {
			log::trace!("Padding `ilst` atom with {padding} bytes");
			write_free_atom(&mut ret, u64::from(padding))?;
		},
		_ => {},
	}

	Ok(ret)
}

fn write_free_atom<W>(writer: &mut W, size: u64) -> Result<()>
where
	W: Write,
{
	let Ok(size32) = u32::try_from(size) else {
		err!(TooMuchData);
	};

	writer.write_u32::<BigEndian>(size32)?;
	writer.write_all(b"free")?;
	writer.write_all(&try_vec![0; (size - ATOM_HEADER_LEN) as usize])?;
	Ok(())
}

fn write_atom_size(bytes: &mut [u8], atom: &AtomInfo, new_len: u64) -> Result<()> {
	let start = atom.start as usize;

	if atom.extended {
		bytes[start + 8..start + 16].copy_from_slice(&new_len.to_be_bytes());
		return Ok(());
	}

	let Ok(new_len) = u32::try_from(new_len) else {
		encode_err!(@BAIL Mp4, "Atom grew past the 32-bit size limit");
	};

	bytes[start..start + 4].copy_from_slice(&new_len.to_be_bytes());
	Ok(())
}

/// Shift every chunk offset at or after `edit_point` by `difference`
fn update_offsets(
	bytes: &mut [u8],
	atoms: &[ContextualAtom],
	difference: i64,
	edit_point: u64,
) -> Result<()> {
	log::debug!("Checking for offset atoms to update");

	// Positions of atoms found in the original file
	let shift = |pos: u64| {
		if pos >= edit_point {
			(pos as i64 + difference) as u64
		} else {
			pos
		}
	};

	let mut stco = Vec::new();
	let mut co64 = Vec::new();
	let mut tfhd = Vec::new();
	for atom in atoms {
		atom.find_all(*b"stco", &mut stco);
		atom.find_all(*b"co64", &mut co64);
		atom.find_all(*b"tfhd", &mut tfhd);
	}

	let mut writer = Cursor::new(bytes);

	// 32-bit offsets
	for stco in stco {
		log::trace!("Found `stco` atom");

		// Version (1) + flags (3)
		let content = shift(stco.start) + stco.header_size() + 4;
		writer.seek(SeekFrom::Start(content))?;

		let count = u64::from(writer.read_u32::<BigEndian>()?);
		if count * 4 > stco.len.saturating_sub(stco.header_size() + 8) {
			decode_err!(@BAIL Mp4, "`stco` atom has more entries than it can hold");
		}

		for _ in 0..count {
			let read_offset = writer.read_u32::<BigEndian>()?;
			if u64::from(read_offset) < edit_point {
				continue;
			}

			let Ok(new_offset) = u32::try_from(i64::from(read_offset) + difference) else {
				encode_err!(@BAIL Mp4, "Chunk offset no longer fits in a `stco` atom");
			};

			writer.seek(SeekFrom::Current(-4))?;
			writer.write_u32::<BigEndian>(new_offset)?;

			log::trace!("Updated offset from {read_offset} to {new_offset}");
		}
	}

	// 64-bit offsets
	for co64 in co64 {
		log::trace!("Found `co64` atom");

		let content = shift(co64.start) + co64.header_size() + 4;
		writer.seek(SeekFrom::Start(content))?;

		let count = u64::from(writer.read_u32::<BigEndian>()?);
		if count * 8 > co64.len.saturating_sub(co64.header_size() + 8) {
			decode_err!(@BAIL Mp4, "`co64` atom has more entries than it can hold");
		}

		for _ in 0..count {
			let read_offset = writer.read_u64::<BigEndian>()?;
			if read_offset < edit_point {
				continue;
			}

			let new_offset = (read_offset as i64 + difference) as u64;
			writer.seek(SeekFrom::Current(-8))?;
			writer.write_u64::<BigEndian>(new_offset)?;

			log::trace!("Updated offset from {read_offset} to {new_offset}");
		}
	}

	// Movie fragments
	for tfhd in tfhd {
		log::trace!("Found `tfhd` atom");

		// Skip version (1)
		writer.seek(SeekFrom::Start(shift(tfhd.start) + tfhd.header_size() + 1))?;

		let flags = writer.read_u24::<BigEndian>()?;
		if flags & 0b1 == 0 {
			continue;
		}

		// Track ID (4)
		writer.seek(SeekFrom::Current(4))?;

		let read_offset = writer.read_u64::<BigEndian>()?;
		if read_offset < edit_point {
			continue;
		}

		let new_offset = (read_offset as i64 + difference) as u64;
		writer.seek(SeekFrom::Current(-8))?;
		writer.write_u64::<BigEndian>(new_offset)?;

		log::trace!("Updated base data offset from {read_offset} to {new_offset}");
	}

	Ok(())
}

fn create_udta(ilst: &[u8]) -> Result<Vec<u8>> {
	let meta = create_meta(ilst)?;

	let mut udta = Vec::new();
	udta.write_u32::<BigEndian>(0)?;
	udta.write_all(b"udta")?;
	udta.write_all(&meta)?;

	let Ok(size) = u32::try_from(udta.len()) else {
		err!(TooMuchData);
	};
	udta[..4].copy_from_slice(&size.to_be_bytes());

	Ok(udta)
}

fn create_meta(ilst: &[u8]) -> Result<Vec<u8>> {
	let meta_size = FULL_ATOM_SIZE + HDLR_SIZE + ilst.len() as u64;
	let Ok(meta_size) = u32::try_from(meta_size) else {
		err!(TooMuchData);
	};

	let mut meta = Vec::with_capacity(meta_size as usize);

	// meta atom
	meta.write_u32::<BigEndian>(meta_size)?;
	meta.write_all(&[b'm', b'e', b't', b'a', 0, 0, 0, 0])?;

	// hdlr atom
	meta.write_u32::<BigEndian>(HDLR_SIZE as u32)?;
	meta.write_all(b"hdlr")?;
	meta.write_u64::<BigEndian>(0)?;
	meta.write_all(b"mdirappl")?;
	meta.write_all(&[0, 0, 0, 0, 0, 0, 0, 0, 0])?;

	meta.write_all(ilst)?;

	Ok(meta)
}

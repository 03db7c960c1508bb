use super::atom::{Atom, AtomData};
use super::data_type::DataType;
use crate::error::Result;
use crate::macros::{encode_err, err};
use crate::mp4::AtomIdent;
use crate::picture::Picture;

use std::io::Write;

use byteorder::{BigEndian, WriteBytesExt};

// Size (4) + identifier (4) + version (1) + flags (3)
const FULL_ATOM_SIZE: u64 = 12;

/// Build a complete `ilst` atom from `atoms`
///
/// Nothing is produced for an empty list, the atom is removed instead.
pub(in crate::mp4) fn build_ilst(atoms: &[Atom]) -> Result<Vec<u8>> {
	if atoms.is_empty() {
		return Ok(Vec::new());
	}

	log::debug!("Building `ilst` atom with {} item(s)", atoms.len());

	let mut ilst = Vec::new();
	ilst.write_all(&[0, 0, 0, 0, b'i', b'l', b's', b't'])?;

	for atom in atoms {
		let start = ilst.len();

		// Placeholder size
		ilst.write_u32::<BigEndian>(0)?;

		match &atom.ident {
			AtomIdent::Fourcc(fourcc) => ilst.write_all(fourcc)?,
			AtomIdent::Freeform { mean, name } => write_freeform(mean, name, &mut ilst)?,
		}

		for value in atom.data() {
			write_atom_data(value, &mut ilst)?;
		}

		write_size(&mut ilst, start)?;
	}

	write_size(&mut ilst, 0)?;

	Ok(ilst)
}

/// Write the size of the atom starting at `start`, spanning to the end of `buf`
fn write_size(buf: &mut [u8], start: usize) -> Result<()> {
	let Ok(size) = u32::try_from(buf.len() - start) else {
		err!(TooMuchData);
	};

	buf[start..start + 4].copy_from_slice(&size.to_be_bytes());
	Ok(())
}

fn write_freeform<W>(mean: &str, name: &str, writer: &mut W) -> Result<()>
where
	W: Write,
{
	// ---- : ???? : ????

	// ----
	writer.write_all(b"----")?;

	// .... MEAN 0000 ????
	writer.write_u32::<BigEndian>((FULL_ATOM_SIZE + mean.len() as u64) as u32)?;
	writer.write_all(&[b'm', b'e', b'a', b'n', 0, 0, 0, 0])?;
	writer.write_all(mean.as_bytes())?;

	// .... NAME 0000 ????
	writer.write_u32::<BigEndian>((FULL_ATOM_SIZE + name.len() as u64) as u32)?;
	writer.write_all(&[b'n', b'a', b'm', b'e', 0, 0, 0, 0])?;
	writer.write_all(name.as_bytes())?;

	Ok(())
}

fn write_atom_data(value: &AtomData, writer: &mut Vec<u8>) -> Result<()> {
	match value {
		AtomData::UTF8(text) => write_data(DataType::Utf8, text.as_bytes(), writer),
		AtomData::UTF16(text) => {
			let encoded = text
				.encode_utf16()
				.flat_map(u16::to_be_bytes)
				.collect::<Vec<u8>>();
			write_data(DataType::Utf16, &encoded, writer)
		},
		AtomData::Picture(pic) => write_picture(pic, writer),
		AtomData::SignedInteger(int) => {
			write_data(DataType::BeSignedInteger, &int.to_be_bytes(), writer)
		},
		AtomData::UnsignedInteger(uint) => {
			let bytes_needed = bytes_to_occupy_uint(*uint);
			write_data(
				DataType::BeUnsignedInteger,
				&uint.to_be_bytes()[4 - bytes_needed..],
				writer,
			)
		},
		AtomData::Bool(b) => write_data(DataType::BeSignedInteger, &[u8::from(*b)], writer),
		AtomData::Unknown { code, data } => write_data(*code, data, writer),
	}
}

fn bytes_to_occupy_uint(uint: u32) -> usize {
	if uint == 0 {
		return 1;
	}

	let ret = 4 - (uint.leading_zeros() >> 3) as usize;
	if ret == 3 {
		return 4;
	}
	ret
}

fn write_picture(picture: &Picture, writer: &mut Vec<u8>) -> Result<()> {
	let code = match picture.mime_type() {
		// GIF is deprecated
		Some(mime_type) => match DataType::from_mime(mime_type) {
			Some(code) => code,
			None => encode_err!(@BAIL Mp4, "Attempted to write an unsupported picture format"),
		},
		// We'll assume implicit (0) was the intended type
		None => DataType::Reserved,
	};

	write_data(code, picture.data(), writer)
}

fn write_data(code: DataType, data: &[u8], writer: &mut Vec<u8>) -> Result<()> {
	let code = u32::from(code);
	if code > DataType::MAX {
		encode_err!(@BAIL Mp4, "Attempted to write a type code larger than 24 bits");
	}

	// .... DATA (version = 0) (type) (locale = 0000) ????
	let Ok(size) = u32::try_from(16 + data.len() as u64) else {
		err!(TooMuchData);
	};

	writer.write_u32::<BigEndian>(size)?;
	writer.write_all(b"data")?;
	writer.write_u8(0)?;
	writer.write_u24::<BigEndian>(code)?;
	writer.write_all(&[0; 4])?;
	writer.write_all(data)?;

	Ok(())
}

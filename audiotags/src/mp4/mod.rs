//! MP4 specific items
//!
//! ## File notes
//!
//! * The only supported tag format is [`Ilst`], found at `moov.udta.meta.ilst`. Only the first
//!   `udta` holding one is used.
//! * Edits reuse `free` atoms around `ilst` when possible. Otherwise the chunk offsets in `stco`,
//!   `co64` and `tfhd` are shifted to follow the moved media data.
mod atom_info;
pub(crate) mod ilst;
mod moov;
mod properties;
pub(crate) mod read;
mod write;

pub use atom_info::AtomIdent;
pub use ilst::Ilst;

use crate::config::{ParsingMode, WriteOptions};
use crate::dialect::{PictureEdit, TagBlock, all_keys};
use crate::error::Result;
use crate::macros::encode_err;
use crate::model::{Staged, StructuralModel};
use crate::picture::Picture;
use crate::properties::PropertyStore;

/// A parsed MP4 file
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Mp4File {
	/// The file format from ftyp's "major brand" (Ex. "M4A ")
	pub(crate) ftyp: String,
	/// The parsed `ilst` (metadata) atom, if it exists
	pub(crate) ilst: Option<TagBlock>,
}

impl Mp4File {
	pub(crate) fn tags(&self) -> Vec<&TagBlock> {
		self.ilst.iter().collect()
	}

	pub(crate) fn pictures(&self, parse_mode: ParsingMode) -> Result<Vec<Picture>> {
		match &self.ilst {
			Some(tag) => tag.pictures(parse_mode),
			None => Ok(Vec::new()),
		}
	}

	pub(crate) fn apply(
		&mut self,
		store: &PropertyStore,
		changed: &[String],
		pictures: Option<PictureEdit<'_>>,
		options: WriteOptions,
	) -> Result<()> {
		if !changed.is_empty() {
			match &mut self.ilst {
				Some(tag) => tag.apply(store, changed, options)?,
				None => {
					log::debug!("Creating a new `ilst` atom");

					let mut tag = TagBlock::Ilst(Ilst::default());
					tag.apply(store, &all_keys(store), options)?;
					self.ilst = Some(tag);
				},
			}
		}

		if let Some(edit) = pictures {
			self.ilst
				.get_or_insert_with(|| TagBlock::Ilst(Ilst::default()))
				.write_pictures(edit);
		}

		Ok(())
	}

	/// Replace the `ilst` atom of `original`
	pub(crate) fn stage(
		&self,
		model: &StructuralModel,
		original: &[u8],
		options: WriteOptions,
	) -> Result<Staged> {
		let ilst = match &self.ilst {
			Some(TagBlock::Ilst(tag)) => ilst::write::build_ilst(&tag.atoms)?,
			Some(_) => encode_err!(@BAIL Mp4, "Only `ilst` atoms can be written to MP4 files"),
			None => Vec::new(),
		};

		write::stage(original, &ilst, model.audio, options)
	}
}

#[cfg(test)]
pub(crate) mod tests {
	use super::read::read_from;
	use crate::config::{ParseOptions, ParsingMode, WriteOptions};
	use crate::dialect::Dialect;
	use crate::error::ErrorKind;
	use crate::model::StructuralModel;
	use crate::picture::tests::png;
	use crate::picture::{MimeType, PictureType};
	use crate::properties::PropertyStore;

	use std::io::Cursor;

	pub(crate) fn atom(ident: &[u8; 4], content: &[u8]) -> Vec<u8> {
		let mut atom = ((content.len() + 8) as u32).to_be_bytes().to_vec();
		atom.extend(ident);
		atom.extend(content);
		atom
	}

	fn data_atom(code: u32, content: &[u8]) -> Vec<u8> {
		let mut data = code.to_be_bytes().to_vec();
		// Locale
		data.extend([0; 4]);
		data.extend(content);
		atom(b"data", &data)
	}

	pub(crate) fn text_item(ident: &[u8; 4], text: &str) -> Vec<u8> {
		atom(ident, &data_atom(1, text.as_bytes()))
	}

	fn freeform_item(name: &str, text: &str) -> Vec<u8> {
		let mut content = atom(b"mean", &[&[0; 4], b"com.apple.iTunes".as_slice()].concat());
		content.extend(atom(b"name", &[&[0; 4], name.as_bytes()].concat()));
		content.extend(data_atom(1, text.as_bytes()));
		atom(b"----", &content)
	}

	/// An M4A file with a single 2 second, 44.1 kHz stereo track
	///
	/// `items` are the children of `ilst`, with `None` leaving out `udta` entirely. The chunk
	/// offset points to the 1000 bytes of `mdat`.
	pub(crate) fn mp4_file(items: Option<&[Vec<u8>]>, padding: usize) -> Vec<u8> {
		let ftyp = atom(b"ftyp", b"M4A \0\0\0\0M4A isom");

		let moov = |chunk_offset: u32| {
			// Version, flags, creation and modification time
			let mut mdhd = vec![0; 12];
			mdhd.extend(44100_u32.to_be_bytes());
			mdhd.extend((44100_u32 * 2).to_be_bytes());
			mdhd.extend([0; 4]);

			let mut hdlr = vec![0; 8];
			hdlr.extend(b"soun");
			hdlr.extend([0; 13]);

			let mut mp4a = vec![0; 16];
			mp4a.extend(2_u16.to_be_bytes());
			mp4a.extend(16_u16.to_be_bytes());
			mp4a.extend([0; 4]);
			mp4a.extend(44100_u16.to_be_bytes());
			mp4a.extend([0; 2]);

			let mut stsd = vec![0, 0, 0, 0, 0, 0, 0, 1];
			stsd.extend(atom(b"mp4a", &mp4a));

			let mut stco = vec![0, 0, 0, 0, 0, 0, 0, 1];
			stco.extend(chunk_offset.to_be_bytes());

			let stbl = atom(b"stbl", &[atom(b"stsd", &stsd), atom(b"stco", &stco)].concat());
			let mdia = [
				atom(b"mdhd", &mdhd),
				atom(b"hdlr", &hdlr),
				atom(b"minf", &stbl),
			]
			.concat();

			let mut content = atom(b"trak", &atom(b"mdia", &mdia));

			if let Some(items) = items {
				let mut hdlr = vec![0; 8];
				hdlr.extend(b"mdirappl");
				hdlr.extend([0; 9]);

				// Full atom
				let mut meta = vec![0; 4];
				meta.extend(atom(b"hdlr", &hdlr));
				meta.extend(atom(b"ilst", &items.concat()));
				if padding >= 8 {
					meta.extend(atom(b"free", &vec![0; padding - 8]));
				}

				content.extend(atom(b"udta", &atom(b"meta", &meta)));
			}

			atom(b"moov", &content)
		};

		let chunk_offset = (ftyp.len() + moov(0).len() + 8) as u32;
		[ftyp, moov(chunk_offset), atom(b"mdat", &[0xAA; 1000])].concat()
	}

	/// The first entry of the first `stco` atom
	fn chunk_offset(bytes: &[u8]) -> u64 {
		let pos = bytes.windows(4).position(|w| w == b"stco").unwrap();
		u64::from(u32::from_be_bytes(bytes[pos + 12..pos + 16].try_into().unwrap()))
	}

	fn read(bytes: &[u8]) -> StructuralModel {
		read_from(&mut Cursor::new(bytes), ParseOptions::new()).unwrap()
	}

	fn store(model: &StructuralModel) -> PropertyStore {
		model.store(true, ParsingMode::BestAttempt).unwrap()
	}

	#[test_log::test]
	fn read_items_and_properties() {
		let items = [
			text_item(b"\xA9nam", "Title"),
			atom(b"trkn", &data_atom(0, &[0, 0, 0, 3, 0, 12, 0, 0])),
			atom(b"cpil", &data_atom(21, &[1])),
			freeform_item("MOOD", "Calm"),
			text_item(b"\xA9st3", "Custom"),
			atom(b"covr", &data_atom(14, &png(2, 2))),
		];
		let bytes = mp4_file(Some(&items), 64);

		let model = read(&bytes);
		assert_eq!(model.header().version(), "M4A ");
		assert_eq!(model.blocks().len(), 1);
		assert_eq!(model.blocks()[0].dialect(), Dialect::Mp4Ilst);
		assert_eq!(model.audio().len(), 1000);
		assert_eq!(model.audio().offset(), chunk_offset(&bytes));

		let store = store(&model);
		assert_eq!(store.title(), Some("Title"));
		assert_eq!(store.get_first("TRACKNUMBER"), Some("3/12"));
		assert_eq!(store.get_first("COMPILATION"), Some("1"));
		assert_eq!(store.get_first("MOOD"), Some("Calm"));
		assert_eq!(store.get_first("MP4:\u{a9}ST3"), Some("Custom"));

		let pictures = store.pictures();
		assert_eq!(pictures.len(), 1);
		assert_eq!(pictures[0].pic_type(), PictureType::CoverFront);
		assert_eq!(pictures[0].mime_type(), Some(&MimeType::Png));

		let properties = model.properties();
		assert_eq!(properties.duration_ms(), 2000);
		assert_eq!(properties.sample_rate(), 44100);
		assert_eq!(properties.channels(), 2);
		assert_eq!(properties.audio_bitrate(), 4);
	}

	#[test_log::test]
	fn edit_within_padding_is_in_place() {
		let bytes = mp4_file(Some(&[text_item(b"\xA9nam", "Title")]), 256);

		let model = read(&bytes);
		let loaded = store(&model);

		let mut store = loaded.clone();
		store.set_artist("Someone");

		let staged = model
			.stage(&bytes, &store, &loaded, WriteOptions::default())
			.unwrap();
		assert_eq!(staged.bytes.len(), bytes.len());
		assert!(staged.in_place.is_some_and(|range| range.end <= model.audio().offset() as usize));
		assert_eq!(chunk_offset(&staged.bytes), chunk_offset(&bytes));

		let reread = read(&staged.bytes);
		assert_eq!(self::store(&reread).artist(), Some("Someone"));
		assert_eq!(self::store(&reread).title(), Some("Title"));
	}

	#[test_log::test]
	fn growth_shifts_chunk_offsets() {
		let bytes = mp4_file(Some(&[text_item(b"\xA9nam", "Title")]), 0);

		let model = read(&bytes);
		let loaded = store(&model);

		let mut store = loaded.clone();
		store.set_comment("A comment long enough to need more room");

		let staged = model
			.stage(&bytes, &store, &loaded, WriteOptions::new().preferred_padding(64))
			.unwrap();
		assert!(staged.in_place.is_none());
		assert!(staged.bytes.len() > bytes.len());
		assert_eq!(chunk_offset(&staged.bytes), staged.audio.offset());
		assert_eq!(&staged.bytes[staged.audio.range()], &bytes[model.audio().range()]);

		let reread = read(&staged.bytes);
		assert_eq!(reread.audio(), staged.audio);
		assert_eq!(reread.properties().duration_ms(), 2000);
		assert_eq!(
			self::store(&reread).comment(),
			Some("A comment long enough to need more room")
		);

		// The new padding absorbs the next small edit
		let loaded = self::store(&reread);
		let mut store = loaded.clone();
		store.set_title("T");

		let staged_again = reread
			.stage(&staged.bytes, &store, &loaded, WriteOptions::default())
			.unwrap();
		assert_eq!(staged_again.bytes.len(), staged.bytes.len());
	}

	#[test_log::test]
	fn missing_chain_is_created() {
		let bytes = mp4_file(None, 0);

		let model = read(&bytes);
		assert!(model.blocks().is_empty());

		let loaded = store(&model);
		let mut store = loaded.clone();
		store.set_title("Title");
		store.push_picture(crate::picture::Picture::unchecked(png(2, 2)).build());

		let staged = model
			.stage(&bytes, &store, &loaded, WriteOptions::default())
			.unwrap();
		assert_eq!(chunk_offset(&staged.bytes), staged.audio.offset());

		let reread = read(&staged.bytes);
		assert_eq!(reread.blocks().len(), 1);
		assert_eq!(self::store(&reread).title(), Some("Title"));
		assert_eq!(self::store(&reread).pictures().len(), 1);
	}

	#[test_log::test]
	fn removing_everything_leaves_padding() {
		let bytes = mp4_file(Some(&[text_item(b"\xA9nam", "Title")]), 0);

		let model = read(&bytes);
		let loaded = store(&model);

		let mut store = loaded.clone();
		store.clear_all();

		let staged = model
			.stage(&bytes, &store, &loaded, WriteOptions::default())
			.unwrap();
		assert_eq!(staged.bytes.len(), bytes.len());
		assert!(staged.in_place.is_some());

		let reread = read(&staged.bytes);
		assert!(reread.blocks().is_empty());
		assert!(self::store(&reread).is_empty());
	}

	#[test_log::test]
	fn unknown_items_survive_edits() {
		let plid = atom(b"plID", &data_atom(21, &[0, 0, 0, 0, 0, 0, 1, 2]));
		let bytes = mp4_file(Some(&[text_item(b"\xA9nam", "Title"), plid.clone()]), 0);

		let model = read(&bytes);
		let loaded = store(&model);
		assert_eq!(loaded.len(), 1);

		let mut store = loaded.clone();
		store.set_title("A different title");

		let staged = model
			.stage(&bytes, &store, &loaded, WriteOptions::default())
			.unwrap();
		assert!(staged.bytes.windows(plid.len()).any(|w| w == plid));
	}

	#[test_log::test]
	fn invalid_track_number() {
		let bytes = mp4_file(Some(&[]), 0);

		let model = read(&bytes);
		let loaded = store(&model);

		let mut store = loaded.clone();
		store.set("TRACKNUMBER", ["three"]);

		let err = model
			.stage(&bytes, &store, &loaded, WriteOptions::default())
			.unwrap_err();
		assert!(matches!(err.kind(), ErrorKind::EncodingError(_)));
	}

	#[test_log::test]
	fn structural_errors() {
		let ftyp = atom(b"ftyp", b"M4A \0\0\0\0");

		// No `moov`
		let bytes = [ftyp.clone(), atom(b"mdat", &[0; 16])].concat();
		let err = read_from(&mut Cursor::new(&bytes), ParseOptions::new()).unwrap_err();
		assert!(err.is_corrupt_block());

		// No `ftyp`
		let bytes = atom(b"moov", &[]);
		let err = read_from(&mut Cursor::new(&bytes), ParseOptions::new()).unwrap_err();
		assert!(matches!(err.kind(), ErrorKind::UnrecognizedFormat));

		// `mdat` runs past the end of the file
		let mut bytes = mp4_file(Some(&[text_item(b"\xA9nam", "Title")]), 0);
		bytes.truncate(bytes.len() - 500);
		let err = read_from(&mut Cursor::new(&bytes), ParseOptions::new()).unwrap_err();
		assert!(err.is_truncated_input());
	}
}

//! Translation between native metadata blocks and the [`PropertyStore`]
//!
//! Every supported metadata dialect is a variant of [`TagBlock`]. A block decodes into
//! `(key, value)` pairs, and the store is encoded back into the block by only touching the
//! native fields of keys that changed since the file was loaded. Unchanged fields, including
//! ones with no canonical mapping, are left exactly as they were read.

pub(crate) mod keys;

use crate::config::{ParsingMode, WriteOptions};
use crate::error::Result;
use crate::id3::v1::Id3v1Tag;
use crate::id3::v2::Id3v2Tag;
use crate::mp4::Ilst;
use crate::picture::Picture;
use crate::properties::PropertyStore;
use crate::vorbis::VorbisComments;

/// The kind of a located metadata region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Dialect {
	/// A FLAC `VORBIS_COMMENT` block
	VorbisComments,
	/// A FLAC `PICTURE` block
	FlacPicture,
	/// Any other FLAC metadata block, with its block type
	FlacOther(u8),
	/// An ID3v2 tag
	Id3v2,
	/// A 128 byte ID3v1 tag
	Id3v1,
	/// An APEv2 tag, retained as-is
	Ape,
	/// A Lyrics3v2 block, retained as-is
	Lyrics3,
	/// An MP4 `ilst` atom
	Mp4Ilst,
}

/// A decoded native metadata block
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TagBlock {
	/// Vorbis comments, stored in FLAC files
	Vorbis(VorbisComments),
	/// An ID3v2 tag
	Id3v2(Id3v2Tag),
	/// A legacy ID3v1 tag
	Id3v1(Id3v1Tag),
	/// An MP4 `ilst` atom
	Ilst(Ilst),
}

impl TagBlock {
	/// The [`Dialect`] of this block
	pub fn dialect(&self) -> Dialect {
		match self {
			TagBlock::Vorbis(_) => Dialect::VorbisComments,
			TagBlock::Id3v2(_) => Dialect::Id3v2,
			TagBlock::Id3v1(_) => Dialect::Id3v1,
			TagBlock::Ilst(_) => Dialect::Mp4Ilst,
		}
	}

	/// Every `(key, value)` pair the block exposes, in native field order
	pub fn decode(&self) -> Vec<(String, String)> {
		match self {
			TagBlock::Vorbis(tag) => tag.decode(),
			TagBlock::Id3v2(tag) => tag.decode(),
			TagBlock::Id3v1(tag) => tag.decode(),
			TagBlock::Ilst(tag) => tag.decode(),
		}
	}

	/// Encode the values of `changed` keys from `store` into the block
	pub(crate) fn apply(
		&mut self,
		store: &PropertyStore,
		changed: &[String],
		options: WriteOptions,
	) -> Result<()> {
		match self {
			TagBlock::Vorbis(tag) => tag.apply(store, changed),
			TagBlock::Id3v2(tag) => tag.apply(store, changed, options),
			// Too small to hold anything but a snapshot of the common keys
			TagBlock::Id3v1(tag) => {
				*tag = Id3v1Tag::from_store(store);
				Ok(())
			},
			TagBlock::Ilst(tag) => tag.apply(store, changed),
		}
	}

	/// The pictures stored in the block
	pub(crate) fn pictures(&self, parse_mode: ParsingMode) -> Result<Vec<Picture>> {
		match self {
			TagBlock::Vorbis(tag) => tag.pictures(parse_mode),
			TagBlock::Id3v2(tag) => tag.pictures(parse_mode),
			TagBlock::Id3v1(_) => Ok(Vec::new()),
			TagBlock::Ilst(tag) => Ok(tag.pictures()),
		}
	}

	/// Write the pictures of `edit` to the block
	pub(crate) fn write_pictures(&mut self, edit: PictureEdit<'_>) {
		match (self, edit) {
			// Vorbis comment pictures are moved to `PICTURE` blocks
			(TagBlock::Vorbis(tag), PictureEdit::Replace(_)) => tag.remove_pictures(),
			(TagBlock::Vorbis(_) | TagBlock::Id3v1(_), _) => {},
			(TagBlock::Id3v2(tag), PictureEdit::Replace(pictures)) => tag.set_pictures(pictures),
			(TagBlock::Id3v2(tag), PictureEdit::Append(pictures)) => tag.append_pictures(pictures),
			(TagBlock::Ilst(tag), PictureEdit::Replace(pictures)) => tag.set_pictures(pictures),
			(TagBlock::Ilst(tag), PictureEdit::Append(pictures)) => tag.append_pictures(pictures),
		}
	}
}

/// How pictures are written back to a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PictureEdit<'a> {
	/// Every existing picture is replaced
	Replace(&'a [Picture]),
	/// The pictures follow the existing ones, which were never read
	Append(&'a [Picture]),
}

impl<'a> PictureEdit<'a> {
	pub(crate) fn pictures(self) -> &'a [Picture] {
		match self {
			PictureEdit::Replace(pictures) | PictureEdit::Append(pictures) => pictures,
		}
	}
}

/// Build the store from blocks listed in precedence order
///
/// The first block contributes everything. Later blocks only contribute keys that no earlier
/// block has.
pub(crate) fn merge<'a, I>(blocks: I) -> PropertyStore
where
	I: IntoIterator<Item = &'a TagBlock>,
{
	let mut store = PropertyStore::new();

	for block in blocks {
		let existing = store.keys().map(str::to_owned).collect::<Vec<_>>();
		for (key, value) in block.decode() {
			if existing.iter().any(|k| k.eq_ignore_ascii_case(&key)) {
				continue;
			}

			store.append(&key, value);
		}
	}

	store
}

/// A native field that may feed a canonical key
pub(crate) trait NativeField {
	/// The canonical key of the field, `None` if it isn't exposed
	fn canonical_key(&self) -> Option<String>;
}

/// Re-encode the fields of every `changed` key
///
/// All native fields of a changed key are removed, and the newly encoded fields are inserted
/// where the first of them was. New keys are appended. Fields of other keys aren't touched.
pub(crate) fn splice<F, E>(
	fields: &mut Vec<F>,
	store: &PropertyStore,
	changed: &[String],
	mut encode: E,
) -> Result<()>
where
	F: NativeField,
	E: FnMut(&str, &[String]) -> Result<Vec<F>>,
{
	for key in changed {
		let new_fields = match store.get(key) {
			Some(values) => encode(key, values)?,
			None => Vec::new(),
		};

		let first = fields
			.iter()
			.position(|f| f.canonical_key().as_deref() == Some(key.as_str()));
		fields.retain(|f| f.canonical_key().as_deref() != Some(key.as_str()));

		// Nothing before the first match was removed, so its index is still valid
		let at = first.unwrap_or(fields.len());
		log::trace!("Re-encoding \"{key}\" into {} field(s) at {at}", new_fields.len());

		fields.splice(at..at, new_fields);
	}

	Ok(())
}

/// Every key in the store, used when a block is created from scratch
pub(crate) fn all_keys(store: &PropertyStore) -> Vec<String> {
	store.keys().map(str::to_owned).collect()
}

//! Items for MPEG audio streams
//!
//! ## File notes
//!
//! * Leading ID3v2 tags are merged when read, and replaced by a single tag when written.
//! * APEv2 and Lyrics3v2 trailers are located and retained as-is.
//! * An existing ID3v1 tag is kept in sync with the store, but one is never created.

mod constants;
pub(crate) mod header;
mod properties;
pub(crate) mod read;

use crate::config::{ParsingMode, WriteOptions};
use crate::dialect::{PictureEdit, TagBlock, all_keys};
use crate::error::Result;
use crate::id3::v2::Id3v2Tag;
use crate::macros::encode_err;
use crate::model::{AudioRegion, Staged, StructuralModel};
use crate::picture::Picture;
use crate::properties::PropertyStore;

use std::ops::Range;

/// A parsed MPEG file
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MpegFile {
	/// Every leading ID3v2 tag, merged
	pub(crate) id3v2: Option<TagBlock>,
	/// The span of the leading tags, empty if there are none
	pub(crate) id3v2_region: Range<u64>,
	pub(crate) id3v1: Option<TagBlock>,
	/// Where the ID3v1 tag starts, or the end of the file
	pub(crate) id3v1_offset: u64,
}

impl MpegFile {
	pub(crate) fn tags(&self) -> Vec<&TagBlock> {
		self.id3v2.iter().chain(self.id3v1.iter()).collect()
	}

	pub(crate) fn pictures(&self, parse_mode: ParsingMode) -> Result<Vec<Picture>> {
		match &self.id3v2 {
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
			match &mut self.id3v2 {
				Some(tag) => tag.apply(store, changed, options)?,
				None => {
					log::debug!("Creating a new ID3v2 tag");

					let mut tag = TagBlock::Id3v2(Id3v2Tag::default());
					tag.apply(store, &all_keys(store), options)?;
					self.id3v2 = Some(tag);
				},
			}

			if let Some(tag) = &mut self.id3v1 {
				tag.apply(store, changed, options)?;
			}
		}

		if let Some(edit) = pictures {
			self.id3v2
				.get_or_insert_with(|| TagBlock::Id3v2(Id3v2Tag::default()))
				.write_pictures(edit);
		}

		if self.id3v1.is_some() && (options.strip_legacy_tags || store.is_empty()) {
			log::debug!("Removing the ID3v1 tag");
			self.id3v1 = None;
		}

		Ok(())
	}

	/// Replace the leading tags and the ID3v1 tag of `original`
	///
	/// Everything between them, including any APE or Lyrics3 trailers, is copied unchanged.
	pub(crate) fn stage(
		&self,
		model: &StructuralModel,
		original: &[u8],
		options: WriteOptions,
	) -> Result<Staged> {
		let old_len = self.id3v2_region.end - self.id3v2_region.start;

		let id3v2 = match &self.id3v2 {
			Some(TagBlock::Id3v2(tag)) => tag.dump(options, (old_len > 0).then_some(old_len))?,
			Some(_) => encode_err!(@BAIL Mpeg, "Only ID3v2 tags can be written to the start of the file"),
			None => Vec::new(),
		};

		let id3v1 = match &self.id3v1 {
			Some(TagBlock::Id3v1(tag)) => Some(tag.as_bytes()),
			Some(_) => encode_err!(@BAIL Mpeg, "Expected an ID3v1 tag at the end of the file"),
			None => None,
		};

		let region = self.id3v2_region.start as usize..self.id3v2_region.end as usize;
		let middle = region.end..self.id3v1_offset as usize;

		let mut bytes = Vec::with_capacity(original.len() - old_len as usize + id3v2.len());
		bytes.extend_from_slice(&original[..region.start]);
		bytes.extend_from_slice(&id3v2);
		bytes.extend_from_slice(&original[middle]);
		if let Some(id3v1) = id3v1 {
			bytes.extend_from_slice(&id3v1);
		}

		let audio = AudioRegion {
			offset: model.audio.offset - old_len + id3v2.len() as u64,
			len: model.audio.len,
		};

		log::debug!(
			"MPEG: leading tags {old_len} -> {} bytes, file {} -> {} bytes",
			id3v2.len(),
			original.len(),
			bytes.len()
		);

		Ok(Staged::new(original, bytes, audio))
	}
}

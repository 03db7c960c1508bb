//! Items for FLAC
//!
//! ## File notes
//!
//! * An ID3v2 tag before the stream marker is retained as-is, but never read or written.
//! * Pictures live in `PICTURE` blocks. Pictures stored in the Vorbis comments are read, and
//!   moved into `PICTURE` blocks once the pictures are rewritten.
//! * `PADDING` blocks are merged into one block at the end of the metadata when writing.

pub(crate) mod block;
pub(crate) mod properties;
pub(crate) mod read;
mod write;

use crate::config::{ParsingMode, WriteOptions};
use crate::dialect::{PictureEdit, TagBlock, all_keys};
use crate::error::Result;
use crate::picture::Picture;
use crate::properties::PropertyStore;
use crate::vorbis::VorbisComments;
use block::BLOCK_ID_PICTURE;

/// A metadata block following `STREAMINFO`
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum MetadataBlock {
	/// The Vorbis comments
	Comments(TagBlock),
	/// Any other block, kept as read
	Raw { ty: u8, content: Vec<u8> },
}

/// A parsed FLAC file
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FlacFile {
	/// The size of the ID3v2 tag preceding the stream marker
	pub(crate) id3v2_len: u64,
	/// Every metadata block except `PADDING`, starting with `STREAMINFO`
	pub(crate) blocks: Vec<MetadataBlock>,
}

impl FlacFile {
	pub(crate) fn tags(&self) -> Vec<&TagBlock> {
		self.blocks
			.iter()
			.filter_map(|block| match block {
				MetadataBlock::Comments(tag) => Some(tag),
				MetadataBlock::Raw { .. } => None,
			})
			.collect()
	}

	fn comments_mut(&mut self) -> Option<&mut TagBlock> {
		self.blocks.iter_mut().find_map(|block| match block {
			MetadataBlock::Comments(tag) => Some(tag),
			MetadataBlock::Raw { .. } => None,
		})
	}

	/// `PICTURE` blocks first, then any pictures in the Vorbis comments
	pub(crate) fn pictures(&self, parse_mode: ParsingMode) -> Result<Vec<Picture>> {
		let mut pictures = Vec::new();

		for block in &self.blocks {
			let MetadataBlock::Raw {
				ty: BLOCK_ID_PICTURE,
				content,
			} = block
			else {
				continue;
			};

			match Picture::from_flac_bytes(content, false, parse_mode) {
				Ok(picture) => pictures.push(picture),
				Err(e) if parse_mode == ParsingMode::Strict => return Err(e),
				Err(e) => log::warn!("Unable to read FLAC picture block, skipping: {e}"),
			}
		}

		for tag in self.tags() {
			pictures.extend(tag.pictures(parse_mode)?);
		}

		Ok(pictures)
	}

	pub(crate) fn apply(
		&mut self,
		store: &PropertyStore,
		changed: &[String],
		pictures: Option<PictureEdit<'_>>,
		options: WriteOptions,
	) -> Result<()> {
		if !changed.is_empty() {
			match self.comments_mut() {
				Some(tag) => tag.apply(store, changed, options)?,
				None if !store.is_empty() => {
					log::debug!("Creating a new Vorbis Comments block");

					let mut tag = TagBlock::Vorbis(VorbisComments::default());
					tag.apply(store, &all_keys(store), options)?;

					// Directly after STREAMINFO
					let at = self.blocks.len().min(1);
					self.blocks.insert(at, MetadataBlock::Comments(tag));
				},
				None => {},
			}
		}

		if let Some(edit) = pictures {
			let is_picture =
				|block: &MetadataBlock| matches!(block, MetadataBlock::Raw { ty: BLOCK_ID_PICTURE, .. });

			let at = match edit {
				PictureEdit::Replace(_) => {
					if let Some(tag) = self.comments_mut() {
						tag.write_pictures(edit);
					}

					let first = self.blocks.iter().position(is_picture);
					self.blocks.retain(|block| !is_picture(block));
					first.unwrap_or(self.blocks.len())
				},
				PictureEdit::Append(_) => self
					.blocks
					.iter()
					.rposition(is_picture)
					.map_or(self.blocks.len(), |last| last + 1),
			};

			let new_blocks = edit.pictures().iter().map(|picture| MetadataBlock::Raw {
				ty: BLOCK_ID_PICTURE,
				content: picture.as_flac_bytes(false),
			});

			self.blocks.splice(at..at, new_blocks);
		}

		Ok(())
	}
}

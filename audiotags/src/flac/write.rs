use super::block::{BLOCK_ID_PADDING, BLOCK_ID_VORBIS_COMMENTS, MAX_BLOCK_SIZE, write_block};
use super::{FlacFile, MetadataBlock};
use crate::config::WriteOptions;
use crate::dialect::TagBlock;
use crate::error::Result;
use crate::macros::encode_err;
use crate::model::{AudioRegion, Staged, StructuralModel};

use std::borrow::Cow;

const BLOCK_HEADER_LEN: u64 = 4;

impl FlacFile {
	/// Rewrite the metadata blocks of `original`
	///
	/// The new blocks are followed by a single `PADDING` block. If they fit into the space taken
	/// by the old blocks, the padding fills whatever is left, and the file length is unchanged.
	pub(crate) fn stage(
		&self,
		model: &StructuralModel,
		original: &[u8],
		options: WriteOptions,
	) -> Result<Staged> {
		let mut encoded = Vec::with_capacity(self.blocks.len());
		for block in &self.blocks {
			let (ty, content) = match block {
				MetadataBlock::Raw { ty, content } => (*ty, Cow::Borrowed(content.as_slice())),
				MetadataBlock::Comments(TagBlock::Vorbis(comments)) => {
					(BLOCK_ID_VORBIS_COMMENTS, Cow::Owned(comments.as_bytes()?))
				},
				MetadataBlock::Comments(_) => {
					encode_err!(@BAIL Flac, "Only Vorbis comments can be stored in metadata blocks")
				},
			};

			encoded.push((ty, content));
		}

		// After the stream marker
		let metadata_start = self.id3v2_len + 4;
		let metadata_end = model.audio.offset;
		let available = metadata_end - metadata_start;

		let needed = encoded
			.iter()
			.map(|(_, content)| BLOCK_HEADER_LEN + content.len() as u64)
			.sum::<u64>();

		let padding = match available.checked_sub(needed) {
			Some(0) => None,
			Some(left) if left >= BLOCK_HEADER_LEN && left - BLOCK_HEADER_LEN <= MAX_BLOCK_SIZE as u64 => {
				Some(left - BLOCK_HEADER_LEN)
			},
			_ => options
				.preferred_padding
				.map(|padding| u64::from(padding).min(MAX_BLOCK_SIZE as u64)),
		};

		log::debug!(
			"FLAC metadata: {needed} bytes needed, {available} bytes available, padding: {padding:?}"
		);

		let mut metadata = Vec::new();
		let last_idx = encoded.len() - 1;
		for (idx, (ty, content)) in encoded.iter().enumerate() {
			write_block(&mut metadata, *ty, padding.is_none() && idx == last_idx, content)?;
		}

		if let Some(padding) = padding {
			write_block(&mut metadata, BLOCK_ID_PADDING, true, &vec![0; padding as usize])?;
		}

		let audio = AudioRegion {
			offset: metadata_start + metadata.len() as u64,
			len: model.audio.len,
		};

		Ok(Staged::splice(
			original,
			metadata_start as usize..metadata_end as usize,
			&metadata,
			audio,
		))
	}
}

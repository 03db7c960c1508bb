//! The structural model of a parsed file
//!
//! A [`StructuralModel`] records where every metadata region lives, where the audio lives,
//! and owns the decoded native tags. The audio region is never parsed.

use crate::config::{ParsingMode, WriteOptions};
use crate::dialect::{self, Dialect, TagBlock};
use crate::error::Result;
use crate::file::FileType;
use crate::flac::FlacFile;
use crate::mp4::Mp4File;
use crate::mpeg::MpegFile;
use crate::picture::Picture;
use crate::properties::{AudioProperties, PropertyStore};

use std::ops::Range;

/// The container's identification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerHeader {
	pub(crate) file_type: FileType,
	pub(crate) version: String,
}

impl ContainerHeader {
	/// The detected [`FileType`]
	pub fn file_type(&self) -> FileType {
		self.file_type
	}

	/// A human readable container version
	///
	/// This is the FLAC stream marker, the MPEG version and layer (e.g. `"MPEG-1 Layer 3"`), or
	/// the MP4 major brand.
	pub fn version(&self) -> &str {
		&self.version
	}
}

/// A located metadata region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockInfo {
	pub(crate) dialect: Dialect,
	pub(crate) offset: u64,
	pub(crate) len: u64,
}

impl BlockInfo {
	pub(crate) fn new(dialect: Dialect, offset: u64, len: u64) -> Self {
		Self {
			dialect,
			offset,
			len,
		}
	}

	/// The kind of metadata stored in the region
	pub fn dialect(&self) -> Dialect {
		self.dialect
	}

	/// The offset of the region, including any header
	pub fn offset(&self) -> u64 {
		self.offset
	}

	/// The length of the region, including any header
	pub fn len(&self) -> u64 {
		self.len
	}

	/// Whether the region has no length
	pub fn is_empty(&self) -> bool {
		self.len == 0
	}
}

/// The span of the file holding the audio stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AudioRegion {
	pub(crate) offset: u64,
	pub(crate) len: u64,
}

impl AudioRegion {
	/// The offset of the audio
	pub fn offset(&self) -> u64 {
		self.offset
	}

	/// The length of the audio
	pub fn len(&self) -> u64 {
		self.len
	}

	/// Whether the file has no audio
	pub fn is_empty(&self) -> bool {
		self.len == 0
	}

	pub(crate) fn range(&self) -> Range<usize> {
		self.offset as usize..(self.offset + self.len) as usize
	}
}

/// The parsed container
#[derive(Debug, Clone)]
pub(crate) enum Container {
	Flac(FlacFile),
	Mpeg(MpegFile),
	Mp4(Mp4File),
}

/// A rewritten file, ready to be committed
#[derive(Debug)]
pub(crate) struct Staged {
	pub(crate) bytes: Vec<u8>,
	/// The only range that differs from the original, if the length is unchanged
	pub(crate) in_place: Option<Range<usize>>,
	pub(crate) audio: AudioRegion,
}

impl Staged {
	/// Build a staged file from complete new contents
	///
	/// If the length is unchanged, the span between the first and last differing byte is
	/// recorded as the in-place patch.
	pub(crate) fn new(original: &[u8], bytes: Vec<u8>, audio: AudioRegion) -> Self {
		let in_place = (bytes.len() == original.len()).then(|| {
			let start = bytes
				.iter()
				.zip(original)
				.position(|(new, old)| new != old)
				.unwrap_or(bytes.len());
			let end = bytes
				.iter()
				.zip(original)
				.rposition(|(new, old)| new != old)
				.map_or(start, |last| last + 1);

			start..end
		});

		Self {
			bytes,
			in_place,
			audio,
		}
	}

	/// Build a staged file, detecting whether it can be patched in place
	///
	/// `changed` is the range of `original` that was replaced by `replacement`.
	pub(crate) fn splice(
		original: &[u8],
		changed: Range<usize>,
		replacement: &[u8],
		audio: AudioRegion,
	) -> Self {
		let in_place = (replacement.len() == changed.len()).then(|| changed.clone());

		let mut bytes = Vec::with_capacity(original.len() - changed.len() + replacement.len());
		bytes.extend_from_slice(&original[..changed.start]);
		bytes.extend_from_slice(replacement);
		bytes.extend_from_slice(&original[changed.end..]);

		Self {
			bytes,
			in_place,
			audio,
		}
	}
}

/// The located structure of a file
///
/// Produced by [`Probe::read`](crate::probe::Probe::read).
#[derive(Debug, Clone)]
pub struct StructuralModel {
	pub(crate) header: ContainerHeader,
	pub(crate) blocks: Vec<BlockInfo>,
	pub(crate) audio: AudioRegion,
	pub(crate) properties: AudioProperties,
	pub(crate) container: Container,
}

impl StructuralModel {
	/// The container identification
	pub fn header(&self) -> &ContainerHeader {
		&self.header
	}

	/// The file type
	pub fn file_type(&self) -> FileType {
		self.header.file_type
	}

	/// Every located metadata region, in file order
	pub fn blocks(&self) -> &[BlockInfo] {
		&self.blocks
	}

	/// The audio region
	pub fn audio(&self) -> AudioRegion {
		self.audio
	}

	/// The audio properties read from the container
	pub fn properties(&self) -> &AudioProperties {
		&self.properties
	}

	/// The decoded native tags, in read precedence order
	pub fn tags(&self) -> Vec<&TagBlock> {
		match &self.container {
			Container::Flac(file) => file.tags(),
			Container::Mpeg(file) => file.tags(),
			Container::Mp4(file) => file.tags(),
		}
	}

	/// Every embedded picture, in file order
	pub(crate) fn pictures(&self, parse_mode: ParsingMode) -> Result<Vec<Picture>> {
		match &self.container {
			Container::Flac(file) => file.pictures(parse_mode),
			Container::Mpeg(file) => file.pictures(parse_mode),
			Container::Mp4(file) => file.pictures(parse_mode),
		}
	}

	/// Build the store from the decoded tags
	pub(crate) fn store(&self, read_pictures: bool, parse_mode: ParsingMode) -> Result<PropertyStore> {
		let mut store = dialect::merge(self.tags());
		if read_pictures {
			store.set_pictures(self.pictures(parse_mode)?);
		} else {
			store.mark_pictures_unread();
		}

		Ok(store)
	}

	/// Encode `store` into a copy of the container and rewrite `original`
	///
	/// `loaded` is the store as it was built from this model, only keys that differ from it
	/// are re-encoded.
	pub(crate) fn stage(
		&self,
		original: &[u8],
		store: &PropertyStore,
		loaded: &PropertyStore,
		options: WriteOptions,
	) -> Result<Staged> {
		let changed = store.changed_keys(loaded);
		let pictures = store.picture_edit(loaded);

		log::debug!(
			"Staging {:?} file, {} changed key(s), pictures changed: {}",
			self.header.file_type,
			changed.len(),
			pictures.is_some()
		);

		let mut container = self.container.clone();
		match &mut container {
			Container::Flac(file) => {
				file.apply(store, &changed, pictures, options)?;
				file.stage(self, original, options)
			},
			Container::Mpeg(file) => {
				file.apply(store, &changed, pictures, options)?;
				file.stage(self, original, options)
			},
			Container::Mp4(file) => {
				file.apply(store, &changed, pictures, options)?;
				file.stage(self, original, options)
			},
		}
	}
}

#[cfg(test)]
mod tests {
	use super::{AudioRegion, Staged};

	#[test_log::test]
	fn splice_same_length_is_in_place() {
		let original = b"head-meta-audio";
		let audio = AudioRegion { offset: 10, len: 5 };

		let staged = Staged::splice(original, 5..9, b"META", audio);
		assert_eq!(staged.bytes, b"head-META-audio");
		assert_eq!(staged.in_place, Some(5..9));
	}

	#[test_log::test]
	fn new_finds_the_changed_span() {
		let original = b"TAG1-audio-TAG2";
		let audio = AudioRegion { offset: 5, len: 5 };

		let staged = Staged::new(original, b"TAGx-audio-TAGy".to_vec(), audio);
		assert_eq!(staged.in_place, Some(3..15));

		let staged = Staged::new(original, original.to_vec(), audio);
		assert_eq!(staged.in_place, Some(15..15));

		let staged = Staged::new(original, b"audio".to_vec(), AudioRegion { offset: 0, len: 5 });
		assert_eq!(staged.in_place, None);
	}

	#[test_log::test]
	fn splice_growth_is_a_rewrite() {
		let original = b"head-meta-audio";
		let audio = AudioRegion { offset: 12, len: 5 };

		let staged = Staged::splice(original, 5..9, b"METADA", audio);
		assert_eq!(staged.bytes, b"head-METADA-audio");
		assert_eq!(staged.in_place, None);
		assert_eq!(&staged.bytes[staged.audio.range()], b"audio");
	}
}

use super::FileType;
use super::commit::{self, Source};
use crate::config::{ParseOptions, PictureMode, WriteOptions};
use crate::error::{FileEncodingError, Result};
use crate::macros::err;
use crate::model::StructuralModel;
use crate::picture::{MimeType, PICTURE_DESCRIPTION, Picture, PictureInformation, PictureType};
use crate::probe::Probe;
use crate::properties::{AudioProperties, PropertyStore, normalize_key};

use std::collections::HashSet;
use std::io::Cursor;
use std::path::Path;

/// A handle to an open audio file
///
/// The handle owns the file's bytes, its [`StructuralModel`] and a [`PropertyStore`] holding
/// every property and picture. Edits stay in memory until [`AudioFile::save`] (or one of the
/// committing operations) stages the new file and commits it in one step. After a commit, the
/// committed bytes are parsed again, so the model always reflects the source. A handle that
/// can't parse its own committed bytes is closed.
///
/// Once [`closed`](AudioFile::close), every operation fails with
/// [`ErrorKind::InvalidHandle`](crate::error::ErrorKind::InvalidHandle).
///
/// # Examples
///
/// ```rust,no_run
/// use audiotags::config::{ParseOptions, WriteOptions};
/// use audiotags::file::AudioFile;
///
/// # fn main() -> audiotags::error::Result<()> {
/// let mut file = AudioFile::open_from_path("song.flac", ParseOptions::new())?;
///
/// for (key, value) in file.read_properties()? {
/// 	println!("{key}: {value}");
/// }
///
/// file.write_properties([("ARTIST", "Foo"), ("ARTIST", "Bar")], WriteOptions::default())?;
/// file.close();
/// # Ok(()) }
/// ```
#[derive(Debug)]
pub struct AudioFile {
	inner: Option<Loaded>,
}

#[derive(Debug)]
struct Loaded {
	source: Source,
	parse_options: ParseOptions,
	bytes: Vec<u8>,
	model: StructuralModel,
	/// The store as it was built from `model`
	loaded: PropertyStore,
	store: PropertyStore,
}

impl Loaded {
	fn parse(source: Source, bytes: Vec<u8>, parse_options: ParseOptions) -> Result<Self> {
		let model = Probe::new(Cursor::new(&bytes))
			.options(parse_options)
			.guess_file_type()?
			.read()?;

		let store = model.store(parse_options.read_cover_art, parse_options.parsing_mode)?;
		log::debug!(
			"Loaded {:?} file with {} block(s), {} key(s) and {} picture(s)",
			model.file_type(),
			model.blocks().len(),
			store.len(),
			store.pictures().len()
		);

		Ok(Self {
			source,
			parse_options,
			bytes,
			model,
			loaded: store.clone(),
			store,
		})
	}

	fn has_changes(&self) -> bool {
		!self.store.changed_keys(&self.loaded).is_empty()
			|| self.store.picture_edit(&self.loaded).is_some()
	}

	/// Stage and commit the pending edits, returning the committed bytes
	fn commit(&self, options: WriteOptions) -> Result<Option<Vec<u8>>> {
		if !self.has_changes() {
			log::debug!("Nothing to save");
			return Ok(None);
		}

		let staged = self
			.model
			.stage(&self.bytes, &self.store, &self.loaded, options)?;
		commit::verify_audio(&self.bytes, self.model.audio(), &staged)?;
		commit::commit(&self.source, &staged, options)?;

		Ok(Some(staged.bytes))
	}
}

impl AudioFile {
	/// Open and parse the file at `path`
	///
	/// The whole file is read into memory. Its format is detected from the content, not the
	/// extension.
	///
	/// # Errors
	///
	/// * `path` can't be read
	/// * See [`Probe::read`]
	pub fn open_from_path(path: impl AsRef<Path>, parse_options: ParseOptions) -> Result<Self> {
		let path = path.as_ref();
		log::debug!("Opening `{}`", path.display());

		let bytes = std::fs::read(path)?;
		let loaded = Loaded::parse(Source::Path(path.to_path_buf()), bytes, parse_options)?;

		Ok(Self {
			inner: Some(loaded),
		})
	}

	/// Parse a file held in memory
	///
	/// Commits replace the handle's buffer, see [`AudioFile::bytes`].
	///
	/// # Errors
	///
	/// See [`Probe::read`]
	pub fn open_from_memory(bytes: impl Into<Vec<u8>>, parse_options: ParseOptions) -> Result<Self> {
		let loaded = Loaded::parse(Source::Memory, bytes.into(), parse_options)?;

		Ok(Self {
			inner: Some(loaded),
		})
	}

	/// Release the handle's buffers
	///
	/// This is idempotent. Any pending, unsaved edits are discarded.
	pub fn close(&mut self) {
		if self.inner.take().is_some() {
			log::debug!("Closed handle");
		}
	}

	/// Whether the handle has not been closed
	pub fn is_open(&self) -> bool {
		self.inner.is_some()
	}

	fn loaded(&self) -> Result<&Loaded> {
		match &self.inner {
			Some(loaded) => Ok(loaded),
			None => err!(InvalidHandle),
		}
	}

	fn loaded_mut(&mut self) -> Result<&mut Loaded> {
		match &mut self.inner {
			Some(loaded) => Ok(loaded),
			None => err!(InvalidHandle),
		}
	}

	fn commit(&mut self, write_options: WriteOptions) -> Result<()> {
		let committed = self.loaded()?.commit(write_options)?;
		match committed {
			Some(committed) => self.reload(committed),
			None => Ok(()),
		}
	}

	// The source already holds `committed`, a handle that can't parse it is closed
	fn reload(&mut self, committed: Vec<u8>) -> Result<()> {
		let loaded = self.loaded_mut()?;
		match Loaded::parse(loaded.source.clone(), committed, loaded.parse_options) {
			Ok(reloaded) => {
				*loaded = reloaded;
				Ok(())
			},
			Err(e) => {
				log::error!("Unable to parse the committed file, closing the handle");
				self.close();
				Err(e)
			},
		}
	}

	/// Every `(key, value)` pair, in order
	///
	/// A multi-valued key yields one pair per value.
	///
	/// # Errors
	///
	/// * The handle is closed
	pub fn read_properties(&self) -> Result<Vec<(String, String)>> {
		Ok(self.loaded()?.store.pairs())
	}

	/// Write `pairs` to the store, then commit
	///
	/// Within one call, the first occurrence of a key replaces its values and any later
	/// occurrence appends to them. Keys that aren't mentioned are left alone.
	///
	/// # Errors
	///
	/// * The handle is closed
	/// * See [`AudioFile::save`]
	pub fn write_properties<I, K, V>(&mut self, pairs: I, write_options: WriteOptions) -> Result<()>
	where
		I: IntoIterator<Item = (K, V)>,
		K: AsRef<str>,
		V: Into<String>,
	{
		let loaded = self.loaded_mut()?;

		let mut seen = HashSet::new();
		for (key, value) in pairs {
			let key = key.as_ref();
			if seen.insert(normalize_key(key)) {
				loaded.store.set(key, [value.into()]);
			} else {
				loaded.store.append(key, value);
			}
		}

		self.commit(write_options)
	}

	/// Remove every property from the store
	///
	/// Nothing is committed until the next [`AudioFile::save`]. Pictures are kept.
	///
	/// # Errors
	///
	/// * The handle is closed
	pub fn clear_properties(&mut self) -> Result<()> {
		self.loaded_mut()?.store.clear_all();
		Ok(())
	}

	/// Commit every pending edit
	///
	/// With nothing pending, this does nothing. Otherwise the whole file is staged first, and
	/// the source is only touched once staging has succeeded.
	///
	/// # Errors
	///
	/// * The handle is closed
	/// * A property can't be represented in the file's metadata
	///   ([`ErrorKind::EncodingError`](crate::error::ErrorKind::EncodingError))
	/// * The file couldn't be written ([`ErrorKind::WriteError`](crate::error::ErrorKind::WriteError))
	/// * The committed file can't be parsed again, which closes the handle
	pub fn save(&mut self, write_options: WriteOptions) -> Result<()> {
		self.commit(write_options)
	}

	/// The audio properties of the file
	///
	/// # Errors
	///
	/// * The handle is closed
	pub fn read_audio_properties(&self) -> Result<AudioProperties> {
		Ok(*self.loaded()?.model.properties())
	}

	/// The first picture, if any
	///
	/// # Errors
	///
	/// * The handle is closed
	pub fn read_picture(&self) -> Result<Option<Picture>> {
		Ok(self.loaded()?.store.pictures().first().cloned())
	}

	/// Every picture, in file order
	///
	/// # Errors
	///
	/// * The handle is closed
	pub fn pictures(&self) -> Result<&[Picture]> {
		Ok(self.loaded()?.store.pictures())
	}

	/// Store `data` as the front cover, then commit
	///
	/// A `width` or `height` of `0` is sniffed from the image header, as is a missing
	/// `mime_type`. Existing pictures are replaced, unless [`PictureMode::Append`] is set.
	///
	/// # Errors
	///
	/// * The handle is closed
	/// * `data` is empty ([`ErrorKind::WriteError`](crate::error::ErrorKind::WriteError))
	/// * See [`AudioFile::save`]
	pub fn write_picture(
		&mut self,
		data: Vec<u8>,
		width: u32,
		height: u32,
		mime_type: Option<MimeType>,
		write_options: WriteOptions,
	) -> Result<()> {
		let loaded = self.loaded_mut()?;

		if data.is_empty() {
			return Err(FileEncodingError::from_description("Picture data is empty").into());
		}

		let mut information = PictureInformation::sniff(&data);
		if width != 0 && height != 0 {
			information.width = width;
			information.height = height;
		}

		let mut picture = Picture::unchecked(data)
			.pic_type(PictureType::CoverFront)
			.description(PICTURE_DESCRIPTION)
			.information(information);
		if let Some(mime_type) = mime_type {
			picture = picture.mime_type(mime_type);
		}

		let picture = picture.build();
		log::debug!(
			"Writing {}x{} `{}` picture ({:?})",
			picture.width(),
			picture.height(),
			picture.mime_str(),
			write_options.picture_mode
		);

		match write_options.picture_mode {
			PictureMode::Replace => loaded.store.set_pictures(vec![picture]),
			PictureMode::Append => loaded.store.push_picture(picture),
		}

		self.commit(write_options)
	}

	/// Remove every picture, then commit
	///
	/// # Errors
	///
	/// * The handle is closed
	/// * See [`AudioFile::save`]
	pub fn remove_pictures(&mut self, write_options: WriteOptions) -> Result<()> {
		let loaded = self.loaded_mut()?;
		loaded.store.clear_pictures();
		self.commit(write_options)
	}

	/// The detected [`FileType`]
	///
	/// # Errors
	///
	/// * The handle is closed
	pub fn file_type(&self) -> Result<FileType> {
		Ok(self.loaded()?.model.file_type())
	}

	/// The [`StructuralModel`] of the last committed (or opened) state
	///
	/// # Errors
	///
	/// * The handle is closed
	pub fn model(&self) -> Result<&StructuralModel> {
		Ok(&self.loaded()?.model)
	}

	/// The [`PropertyStore`], including any unsaved edits
	///
	/// # Errors
	///
	/// * The handle is closed
	pub fn properties(&self) -> Result<&PropertyStore> {
		Ok(&self.loaded()?.store)
	}

	/// Mutable access to the [`PropertyStore`]
	///
	/// Edits are committed by [`AudioFile::save`].
	///
	/// # Errors
	///
	/// * The handle is closed
	pub fn properties_mut(&mut self) -> Result<&mut PropertyStore> {
		Ok(&mut self.loaded_mut()?.store)
	}

	/// The file's bytes as of the last commit
	///
	/// # Errors
	///
	/// * The handle is closed
	pub fn bytes(&self) -> Result<&[u8]> {
		Ok(&self.loaded()?.bytes)
	}

	/// Consume the handle, returning the file's bytes as of the last commit
	///
	/// # Errors
	///
	/// * The handle is closed
	pub fn into_bytes(self) -> Result<Vec<u8>> {
		match self.inner {
			Some(loaded) => Ok(loaded.bytes),
			None => err!(InvalidHandle),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::AudioFile;
	use crate::config::{ParseOptions, PictureMode, WriteOptions};
	use crate::error::ErrorKind;
	use crate::picture::tests::png;
	use crate::picture::{MimeType, PICTURE_DESCRIPTION, PictureType};

	fn flac() -> AudioFile {
		let bytes = crate::flac::tests::flac_bytes(&[]);
		AudioFile::open_from_memory(bytes, ParseOptions::new()).unwrap()
	}

	#[test_log::test]
	fn first_occurrence_sets_later_ones_append() {
		let mut file = flac();
		file.properties_mut().unwrap().set_artist("Old");

		file.write_properties(
			[("artist", "Foo"), ("TITLE", "Baz"), ("Artist", "Bar")],
			WriteOptions::default(),
		)
		.unwrap();

		assert_eq!(
			file.read_properties().unwrap(),
			[
				("ARTIST".to_string(), "Foo".to_string()),
				("ARTIST".to_string(), "Bar".to_string()),
				("TITLE".to_string(), "Baz".to_string()),
			]
		);
	}

	#[test_log::test]
	fn save_without_changes_is_a_no_op() {
		let mut file = flac();
		let before = file.bytes().unwrap().to_vec();

		file.save(WriteOptions::default()).unwrap();
		file.clear_properties().unwrap();
		file.save(WriteOptions::default()).unwrap();

		assert_eq!(file.bytes().unwrap(), before);
	}

	#[test_log::test]
	fn picture_modes() {
		let mut file = flac();

		file.write_picture(png(4, 3), 0, 0, None, WriteOptions::default())
			.unwrap();
		file.write_picture(png(8, 8), 0, 0, None, WriteOptions::default())
			.unwrap();
		assert_eq!(file.pictures().unwrap().len(), 1);

		let picture = file.read_picture().unwrap().unwrap();
		assert_eq!(picture.pic_type(), PictureType::CoverFront);
		assert_eq!(picture.description(), PICTURE_DESCRIPTION);
		assert_eq!(picture.mime_type(), Some(&MimeType::Png));
		assert_eq!((picture.width(), picture.height()), (8, 8));

		file.write_picture(
			png(2, 2),
			100,
			50,
			Some(MimeType::Png),
			WriteOptions::new().picture_mode(PictureMode::Append),
		)
		.unwrap();

		let pictures = file.pictures().unwrap();
		assert_eq!(pictures.len(), 2);
		assert_eq!((pictures[1].width(), pictures[1].height()), (100, 50));

		file.remove_pictures(WriteOptions::default()).unwrap();
		assert!(file.pictures().unwrap().is_empty());
		assert!(file.read_picture().unwrap().is_none());
	}

	#[test_log::test]
	fn empty_picture_is_rejected() {
		let mut file = flac();
		let before = file.bytes().unwrap().to_vec();

		let err = file
			.write_picture(Vec::new(), 0, 0, None, WriteOptions::default())
			.unwrap_err();
		assert!(matches!(err.kind(), ErrorKind::WriteError(_)));
		assert_eq!(file.bytes().unwrap(), before);
	}

	#[test_log::test]
	fn unparsable_commit_closes_the_handle() {
		let mut file = flac();

		let err = file.reload(vec![0; 10]).unwrap_err();
		assert!(matches!(err.kind(), ErrorKind::UnrecognizedFormat));
		assert!(!file.is_open());
		assert!(matches!(
			file.bytes().unwrap_err().kind(),
			ErrorKind::InvalidHandle
		));
	}

	#[test_log::test]
	fn closed_handle() {
		let mut file = flac();
		file.close();
		file.close();
		assert!(!file.is_open());

		let is_invalid = |kind: &ErrorKind| matches!(kind, ErrorKind::InvalidHandle);

		assert!(is_invalid(file.read_properties().unwrap_err().kind()));
		assert!(is_invalid(file.read_audio_properties().unwrap_err().kind()));
		assert!(is_invalid(file.read_picture().unwrap_err().kind()));
		assert!(is_invalid(file.clear_properties().unwrap_err().kind()));
		assert!(is_invalid(file.save(WriteOptions::default()).unwrap_err().kind()));
		assert!(is_invalid(
			file.write_properties([("TITLE", "x")], WriteOptions::default())
				.unwrap_err()
				.kind()
		));
		assert!(is_invalid(
			file.remove_pictures(WriteOptions::default())
				.unwrap_err()
				.kind()
		));
		assert!(is_invalid(file.into_bytes().unwrap_err().kind()));
	}
}

/// How [`AudioFile::write_picture`](crate::file::AudioFile::write_picture) treats existing pictures
#[derive(Copy, Clone, Debug, Eq, PartialEq, Default)]
#[non_exhaustive]
pub enum PictureMode {
	/// Every existing picture is removed before the new one is added
	#[default]
	Replace,
	/// The new picture is added after the existing ones
	Append,
}

/// Options to control how audiotags writes to a file
///
/// These are per-operation, nothing is shared between handles.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub struct WriteOptions {
	pub(crate) preferred_padding: Option<u32>,
	pub(crate) use_id3v23: bool,
	pub(crate) unicode_text: bool,
	pub(crate) lossy_text_encoding: bool,
	pub(crate) picture_mode: PictureMode,
	pub(crate) strip_legacy_tags: bool,
	pub(crate) atomic_save: bool,
}

impl WriteOptions {
	/// Default preferred padding size in bytes
	pub const DEFAULT_PREFERRED_PADDING: u32 = 1024;

	/// Creates a new `WriteOptions`, alias for `Default` implementation
	///
	/// # Examples
	///
	/// ```rust
	/// use audiotags::config::WriteOptions;
	///
	/// let write_options = WriteOptions::new();
	/// ```
	#[must_use]
	pub const fn new() -> Self {
		Self {
			preferred_padding: Some(Self::DEFAULT_PREFERRED_PADDING),
			use_id3v23: false,
			unicode_text: true,
			lossy_text_encoding: false,
			picture_mode: PictureMode::Replace,
			strip_legacy_tags: false,
			atomic_save: true,
		}
	}

	/// Set the preferred padding size in bytes
	///
	/// When a rewritten tag no longer fits in its old space, the file is rewritten with this
	/// much padding so that later edits can happen in place.
	///
	/// NOTES:
	///
	/// * MP4 files are padded with `free` atoms
	/// * The actual padding size may be different from this value, depending on the space available
	///
	/// # Examples
	///
	/// ```rust
	/// use audiotags::config::WriteOptions;
	///
	/// // I really don't want my files rewritten, so I'll double the padding size!
	/// let options = WriteOptions::new().preferred_padding(2048);
	///
	/// // ...Or I don't want padding under any circumstances!
	/// let options = WriteOptions::new().preferred_padding(0);
	/// ```
	#[must_use]
	pub const fn preferred_padding(mut self, preferred_padding: u32) -> Self {
		match preferred_padding {
			0 => self.preferred_padding = None,
			_ => self.preferred_padding = Some(preferred_padding),
		}
		self
	}

	/// Whether to write ID3v2.3 instead of ID3v2.4
	///
	/// ID3v2.3 has no UTF-8 text encoding, text that isn't Latin-1 is written as UTF-16.
	///
	/// # Examples
	///
	/// ```rust
	/// use audiotags::config::WriteOptions;
	///
	/// let options = WriteOptions::new().use_id3v23(true);
	/// ```
	#[must_use]
	pub const fn use_id3v23(mut self, use_id3v23: bool) -> Self {
		self.use_id3v23 = use_id3v23;
		self
	}

	/// Whether ID3v2 text may use a Unicode encoding
	///
	/// When disabled, every ID3v2 text field must be representable as Latin-1, and values that
	/// aren't fail with [`ErrorKind::EncodingError`](crate::error::ErrorKind::EncodingError).
	///
	/// # Examples
	///
	/// ```rust
	/// use audiotags::config::WriteOptions;
	///
	/// // Old hardware only understands Latin-1
	/// let options = WriteOptions::new().unicode_text(false);
	/// ```
	#[must_use]
	pub const fn unicode_text(mut self, unicode_text: bool) -> Self {
		self.unicode_text = unicode_text;
		self
	}

	/// Whether to replace unrepresentable characters instead of failing
	///
	/// This only matters when [`WriteOptions::unicode_text`] is disabled. Characters outside of
	/// Latin-1 are written as `?`.
	///
	/// # Examples
	///
	/// ```rust
	/// use audiotags::config::WriteOptions;
	///
	/// let options = WriteOptions::new().unicode_text(false).lossy_text_encoding(true);
	/// ```
	#[must_use]
	pub const fn lossy_text_encoding(mut self, lossy_text_encoding: bool) -> Self {
		self.lossy_text_encoding = lossy_text_encoding;
		self
	}

	/// How new pictures interact with existing ones, see [`PictureMode`]
	///
	/// # Examples
	///
	/// ```rust
	/// use audiotags::config::{PictureMode, WriteOptions};
	///
	/// let options = WriteOptions::new().picture_mode(PictureMode::Append);
	/// ```
	#[must_use]
	pub const fn picture_mode(mut self, picture_mode: PictureMode) -> Self {
		self.picture_mode = picture_mode;
		self
	}

	/// Whether to remove the legacy ID3v1 tag from MPEG files
	///
	/// By default, an existing ID3v1 tag is re-encoded from the properties.
	///
	/// # Examples
	///
	/// ```rust
	/// use audiotags::config::WriteOptions;
	///
	/// let options = WriteOptions::new().strip_legacy_tags(true);
	/// ```
	#[must_use]
	pub const fn strip_legacy_tags(mut self, strip_legacy_tags: bool) -> Self {
		self.strip_legacy_tags = strip_legacy_tags;
		self
	}

	/// Whether saves to a path go through a temporary file
	///
	/// When enabled, the new contents are written next to the original and renamed over it, so a
	/// failed save never leaves a partial file. When disabled, saves that fit in the existing
	/// layout are patched directly into the file.
	///
	/// # Examples
	///
	/// ```rust
	/// use audiotags::config::WriteOptions;
	///
	/// let options = WriteOptions::new().atomic_save(false);
	/// ```
	#[must_use]
	pub const fn atomic_save(mut self, atomic_save: bool) -> Self {
		self.atomic_save = atomic_save;
		self
	}
}

impl Default for WriteOptions {
	/// The default implementation for `WriteOptions`
	///
	/// The defaults are as follows:
	///
	/// ```rust,ignore
	/// WriteOptions {
	///     preferred_padding: 1024,
	///     use_id3v23: false,
	///     unicode_text: true,
	///     lossy_text_encoding: false,
	///     picture_mode: PictureMode::Replace,
	///     strip_legacy_tags: false,
	///     atomic_save: true,
	/// }
	/// ```
	fn default() -> Self {
		Self::new()
	}
}

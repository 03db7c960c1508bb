/// How much malformed input the readers put up with
///
/// Set through [`ParseOptions::parsing_mode`].
///
/// # Examples
///
/// ```rust,no_run
/// use audiotags::config::{ParseOptions, ParsingMode};
/// use audiotags::file::AudioFile;
///
/// # fn main() -> audiotags::error::Result<()> {
/// // Anything malformed is an error
/// let options = ParseOptions::new().parsing_mode(ParsingMode::Strict);
/// let file = AudioFile::open_from_path("foo.mp3", options)?;
/// # Ok(()) }
/// ```
#[derive(Copy, Clone, Debug, Ord, PartialOrd, Eq, PartialEq, Default)]
#[non_exhaustive]
pub enum ParsingMode {
	/// Any malformed structure fails the whole read
	///
	/// For example, an undecodable text field or a second Vorbis comment block in a FLAC
	/// stream are errors.
	Strict,
	/// Recover where the damage is local (the default)
	///
	/// Undecodable text is decoded lossily, and an unknown sample rate is reported as 0.
	/// Being able to read a file doesn't guarantee it can be written back.
	#[default]
	BestAttempt,
	/// Drop whatever is malformed and keep going
	///
	/// Undecodable text fields are discarded entirely, and an atom with an invalid identifier
	/// ends the atom list.
	Relaxed,
}

/// Options for reading a file
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub struct ParseOptions {
	pub(crate) read_properties: bool,
	pub(crate) read_cover_art: bool,
	pub(crate) parsing_mode: ParsingMode,
	pub(crate) max_junk_bytes: usize,
}

impl Default for ParseOptions {
	/// Same as [`ParseOptions::new`]
	fn default() -> Self {
		Self::new()
	}
}

impl ParseOptions {
	/// The parsing mode used unless one is set
	pub const DEFAULT_PARSING_MODE: ParsingMode = ParsingMode::BestAttempt;

	/// How far into a stream to look for the first MPEG frame, unless set
	pub const DEFAULT_MAX_JUNK_BYTES: usize = 1024;

	/// Creates a new `ParseOptions`
	///
	/// Audio properties and pictures are both read, with [`Self::DEFAULT_PARSING_MODE`] and
	/// [`Self::DEFAULT_MAX_JUNK_BYTES`].
	///
	/// # Examples
	///
	/// ```rust
	/// use audiotags::config::{ParseOptions, ParsingMode};
	///
	/// let options = ParseOptions::new();
	/// assert_eq!(options, ParseOptions::default());
	/// ```
	#[must_use]
	pub const fn new() -> Self {
		Self {
			read_properties: true,
			read_cover_art: true,
			parsing_mode: Self::DEFAULT_PARSING_MODE,
			max_junk_bytes: Self::DEFAULT_MAX_JUNK_BYTES,
		}
	}

	/// Whether to compute the audio properties
	///
	/// When disabled, [`AudioFile::read_audio_properties`](crate::file::AudioFile::read_audio_properties)
	/// returns zeroed properties.
	#[must_use]
	pub const fn read_properties(mut self, read_properties: bool) -> Self {
		self.read_properties = read_properties;
		self
	}

	/// Whether to decode embedded pictures
	///
	/// When disabled, picture carriers are kept raw and the handle reports no pictures.
	/// Replacing or removing pictures still removes the raw carriers.
	///
	/// # Examples
	///
	/// ```rust
	/// use audiotags::config::ParseOptions;
	///
	/// // Only the titles of a library are needed, not the artwork
	/// let options = ParseOptions::new().read_cover_art(false);
	/// ```
	#[must_use]
	pub const fn read_cover_art(mut self, read_cover_art: bool) -> Self {
		self.read_cover_art = read_cover_art;
		self
	}

	/// See [`ParsingMode`]
	#[must_use]
	pub const fn parsing_mode(mut self, parsing_mode: ParsingMode) -> Self {
		self.parsing_mode = parsing_mode;
		self
	}

	/// How many bytes may precede the first MPEG frame
	///
	/// Some MPEG files carry junk between the ID3v2 tag and the first frame. This bounds the
	/// search for the first frame sync, both when detecting and reading a stream.
	///
	/// # Examples
	///
	/// ```rust
	/// use audiotags::config::ParseOptions;
	///
	/// let options = ParseOptions::new().max_junk_bytes(2048);
	/// ```
	#[must_use]
	pub const fn max_junk_bytes(mut self, max_junk_bytes: usize) -> Self {
		self.max_junk_bytes = max_junk_bytes;
		self
	}
}

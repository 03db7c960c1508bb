//! Contains the errors that can arise within audiotags
//!
//! Every fallible operation returns an [`AudioTagsError`], whose [`ErrorKind`] tells the caller
//! what went wrong:
//!
//! | Kind                                | Raised when                                          |
//! |-------------------------------------|------------------------------------------------------|
//! | [`ErrorKind::UnrecognizedFormat`]   | No container signature matched                       |
//! | [`ErrorKind::TruncatedInput`]       | A declared length runs past the input                |
//! | [`ErrorKind::CorruptBlock`]         | A metadata structure breaks its format's rules       |
//! | [`ErrorKind::EncodingError`]        | A property can't be represented in the dialect       |
//! | [`ErrorKind::WriteError`]           | Staging or committing the new file failed            |
//! | [`ErrorKind::InvalidHandle`]        | The handle was used after being closed               |

use crate::file::FileType;
pub use crate::util::text::TextEncodingError;

use std::collections::TryReserveError;
use std::fmt::{Debug, Display, Formatter};

/// Alias for `Result<T, AudioTagsError>`
pub type Result<T> = std::result::Result<T, AudioTagsError>;

/// The types of errors that can occur
#[derive(Debug)]
#[non_exhaustive]
pub enum ErrorKind {
	/// No known magic signature matched the input
	UnrecognizedFormat,
	/// A declared block, frame, or atom length exceeds the remaining input
	TruncatedInput(FileDecodingError),
	/// A metadata structure violates its format's rules
	CorruptBlock(FileDecodingError),
	/// An ID3v2 tag or frame is malformed
	Id3v2(Id3v2Error),
	/// Image data was expected, but not found
	NotAPicture,
	/// A property value cannot be represented in the target dialect
	EncodingError(PropertyEncodingError),
	/// The staged file could not be produced or committed
	WriteError(FileEncodingError),
	/// The handle was used after [`AudioFile::close`](crate::file::AudioFile::close)
	InvalidHandle,
	/// A declared length is too large to be believed
	TooMuchData,
	/// Failure to allocate enough memory
	Alloc(TryReserveError),
	/// Text expected to be UTF-8 isn't
	StrFromUtf8(std::str::Utf8Error),
	/// Represents all cases of [`std::io::Error`].
	Io(std::io::Error),
}

/// The ways an ID3v2 tag can be malformed
#[derive(Debug)]
#[non_exhaustive]
pub enum Id3v2ErrorKind {
	/// The major version is not one of 2, 3 or 4
	BadId3v2Version(u8, u8),
	/// An ID3v2.2 tag has its compression flag set, which was never defined
	V2Compression,
	/// The extended header has an impossible size
	BadExtendedHeaderSize,
	/// A frame ID contains characters outside of `A-Z0-9`
	BadFrameId(Vec<u8>),
	/// A frame is too short for its own layout
	BadFrameLength,
	/// A text encoding byte outside of `0..=3`
	BadTextEncoding(u8),
	/// An ID3v2.2 `PIC` frame with an unknown image format
	BadPictureFormat(String),
	/// A compressed frame couldn't be inflated
	#[cfg(feature = "id3v2_compression_support")]
	Decompression(std::io::Error),
	/// A compressed frame was found, but `id3v2_compression_support` is disabled
	#[cfg(not(feature = "id3v2_compression_support"))]
	CompressedFrameEncountered,
}

impl Display for Id3v2ErrorKind {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::BadId3v2Version(major, minor) => {
				write!(f, "Unsupported version 2.{major}.{minor}")
			},
			Self::V2Compression => f.write_str("ID3v2.2 tags can't be compressed"),
			Self::BadExtendedHeaderSize => f.write_str("Extended header size is invalid"),
			Self::BadFrameId(id) => write!(f, "Invalid frame ID {:?}", id.escape_ascii().to_string()),
			Self::BadFrameLength => f.write_str("Frame is too short for its content"),
			Self::BadTextEncoding(byte) => write!(f, "Unknown text encoding {byte}"),
			Self::BadPictureFormat(format) => write!(f, "Unknown picture format {format:?}"),
			#[cfg(feature = "id3v2_compression_support")]
			Self::Decompression(err) => write!(f, "Unable to decompress a frame: {err}"),
			#[cfg(not(feature = "id3v2_compression_support"))]
			Self::CompressedFrameEncountered => {
				f.write_str("Compressed frames require `id3v2_compression_support`")
			},
		}
	}
}

/// An error that arises while reading an ID3v2 tag
pub struct Id3v2Error {
	kind: Id3v2ErrorKind,
}

impl Id3v2Error {
	/// Create a new `Id3v2Error` from an [`Id3v2ErrorKind`]
	#[must_use]
	pub const fn new(kind: Id3v2ErrorKind) -> Self {
		Self { kind }
	}

	/// Returns the [`Id3v2ErrorKind`]
	pub fn kind(&self) -> &Id3v2ErrorKind {
		&self.kind
	}
}

impl Debug for Id3v2Error {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(f, "ID3v2: {:?}", self.kind)
	}
}

impl Display for Id3v2Error {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(f, "ID3v2: {}", self.kind)
	}
}

// "Flac: description" when the container is known
fn write_described(
	f: &mut Formatter<'_>,
	format: Option<FileType>,
	description: &str,
) -> std::fmt::Result {
	match format {
		Some(format) => write!(f, "{format:?}: {description}"),
		None => f.write_str(description),
	}
}

/// An error that arises while decoding a file
///
/// Used for both [`ErrorKind::TruncatedInput`] and [`ErrorKind::CorruptBlock`].
#[derive(Debug)]
pub struct FileDecodingError {
	format: Option<FileType>,
	description: &'static str,
}

impl FileDecodingError {
	/// Create a `FileDecodingError` from a [`FileType`] and description
	#[must_use]
	pub const fn new(format: FileType, description: &'static str) -> Self {
		Self {
			format: Some(format),
			description,
		}
	}

	/// Create a `FileDecodingError` without binding it to a [`FileType`]
	pub fn from_description(description: &'static str) -> Self {
		Self {
			format: None,
			description,
		}
	}

	/// Returns the associated [`FileType`], if one exists
	pub fn format(&self) -> Option<FileType> {
		self.format
	}

	/// Returns the error description
	pub fn description(&self) -> &str {
		self.description
	}
}

impl Display for FileDecodingError {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write_described(f, self.format, self.description)
	}
}

/// An error that arises while staging or committing a file
#[derive(Debug)]
pub struct FileEncodingError {
	format: Option<FileType>,
	description: &'static str,
	source: Option<std::io::Error>,
}

impl FileEncodingError {
	/// Create a `FileEncodingError` from a [`FileType`] and description
	///
	/// # Examples
	///
	/// ```rust
	/// use audiotags::error::FileEncodingError;
	/// use audiotags::file::FileType;
	///
	/// let flac_error = FileEncodingError::new(FileType::Flac, "Metadata blocks are too large");
	/// assert_eq!(flac_error.format(), Some(FileType::Flac));
	/// ```
	#[must_use]
	pub const fn new(format: FileType, description: &'static str) -> Self {
		Self {
			format: Some(format),
			description,
			source: None,
		}
	}

	/// Create a `FileEncodingError` without binding it to a [`FileType`]
	pub fn from_description(description: &'static str) -> Self {
		Self {
			format: None,
			description,
			source: None,
		}
	}

	/// Wrap an I/O failure that happened while committing
	pub fn from_io(description: &'static str, source: std::io::Error) -> Self {
		Self {
			source: Some(source),
			..Self::from_description(description)
		}
	}

	/// Returns the associated [`FileType`], if one exists
	pub fn format(&self) -> Option<FileType> {
		self.format
	}

	/// Returns the error description
	pub fn description(&self) -> &str {
		self.description
	}

	/// Returns the underlying I/O error, if the failure came from the filesystem
	pub fn io_error(&self) -> Option<&std::io::Error> {
		self.source.as_ref()
	}
}

impl Display for FileEncodingError {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write_described(f, self.format, self.description)?;

		match &self.source {
			Some(source) => write!(f, ": {source}"),
			None => Ok(()),
		}
	}
}

/// A property that could not be encoded into the target dialect
///
/// Carries the offending key and value so the caller knows which write failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyEncodingError {
	key: String,
	value: String,
	reason: &'static str,
}

impl PropertyEncodingError {
	pub(crate) fn new(key: &str, value: &str, reason: &'static str) -> Self {
		Self {
			key: key.to_owned(),
			value: value.to_owned(),
			reason,
		}
	}

	/// The canonical key of the property that failed
	pub fn key(&self) -> &str {
		&self.key
	}

	/// The value that failed to encode
	pub fn value(&self) -> &str {
		&self.value
	}

	/// Why the value was rejected
	pub fn reason(&self) -> &str {
		self.reason
	}
}

impl Display for PropertyEncodingError {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(
			f,
			"Unable to encode {} = {:?}: {}",
			self.key, self.value, self.reason
		)
	}
}

/// Errors that could occur within audiotags
pub struct AudioTagsError {
	pub(crate) kind: ErrorKind,
}

impl AudioTagsError {
	/// Create an `AudioTagsError` from an [`ErrorKind`]
	///
	/// # Examples
	///
	/// ```rust
	/// use audiotags::error::{AudioTagsError, ErrorKind};
	///
	/// let closed = AudioTagsError::new(ErrorKind::InvalidHandle);
	/// assert_eq!(closed.to_string(), "The file handle has been closed");
	/// ```
	#[must_use]
	pub const fn new(kind: ErrorKind) -> Self {
		Self { kind }
	}

	/// Returns the [`ErrorKind`]
	pub fn kind(&self) -> &ErrorKind {
		&self.kind
	}

	/// Whether this error describes a structurally invalid metadata block
	///
	/// Malformed ID3v2 tags count as corrupt blocks.
	pub fn is_corrupt_block(&self) -> bool {
		matches!(self.kind, ErrorKind::CorruptBlock(_) | ErrorKind::Id3v2(_))
	}

	/// Whether this error describes input that ended inside a structure
	pub fn is_truncated_input(&self) -> bool {
		matches!(self.kind, ErrorKind::TruncatedInput(_))
	}

	// An in-memory read only hits `UnexpectedEof` when a structure runs past the buffer
	pub(crate) fn into_truncated(self, format: FileType) -> Self {
		match &self.kind {
			ErrorKind::Io(err) if err.kind() == std::io::ErrorKind::UnexpectedEof => {
				Self::new(ErrorKind::TruncatedInput(FileDecodingError::new(
					format,
					"Input ended inside a metadata structure",
				)))
			},
			_ => self,
		}
	}
}

impl std::error::Error for AudioTagsError {}

impl Debug for AudioTagsError {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		Debug::fmt(&self.kind, f)
	}
}

impl Display for AudioTagsError {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match &self.kind {
			ErrorKind::UnrecognizedFormat => {
				f.write_str("No format could be determined from the provided input")
			},
			ErrorKind::TruncatedInput(err) => write!(f, "Truncated input: {err}"),
			ErrorKind::CorruptBlock(err) => write!(f, "Corrupt block: {err}"),
			ErrorKind::WriteError(err) => write!(f, "Write failed: {err}"),
			ErrorKind::NotAPicture => f.write_str("Picture: Encountered invalid data"),
			ErrorKind::InvalidHandle => f.write_str("The file handle has been closed"),
			ErrorKind::TooMuchData => f.write_str("A declared length is abnormally large"),
			ErrorKind::Id3v2(err) => Display::fmt(err, f),
			ErrorKind::EncodingError(err) => Display::fmt(err, f),
			ErrorKind::Alloc(err) => Display::fmt(err, f),
			ErrorKind::StrFromUtf8(err) => Display::fmt(err, f),
			ErrorKind::Io(err) => Display::fmt(err, f),
		}
	}
}

macro_rules! impl_from {
	($($source:ty => $variant:ident),+ $(,)?) => {
		$(
			impl From<$source> for AudioTagsError {
				fn from(input: $source) -> Self {
					Self::new(ErrorKind::$variant(input))
				}
			}
		)+
	};
}

impl_from! {
	Id3v2Error             => Id3v2,
	FileEncodingError      => WriteError,
	PropertyEncodingError  => EncodingError,
	std::io::Error         => Io,
	std::str::Utf8Error    => StrFromUtf8,
	TryReserveError        => Alloc,
}

#[cfg(test)]
mod tests {
	use super::{AudioTagsError, ErrorKind, FileEncodingError, PropertyEncodingError};
	use crate::file::FileType;

	use std::io;

	#[test_log::test]
	fn unexpected_eof_becomes_truncated_input() {
		let err: AudioTagsError = io::Error::new(io::ErrorKind::UnexpectedEof, "eof").into();
		let err = err.into_truncated(FileType::Mpeg);

		assert!(err.is_truncated_input());
		assert_eq!(
			err.to_string(),
			"Truncated input: Mpeg: Input ended inside a metadata structure"
		);
	}

	#[test_log::test]
	fn other_io_errors_are_untouched() {
		let err: AudioTagsError = io::Error::new(io::ErrorKind::PermissionDenied, "nope").into();
		let err = err.into_truncated(FileType::Flac);

		assert!(matches!(err.kind(), ErrorKind::Io(_)));
	}

	#[test_log::test]
	fn encoding_error_names_the_key() {
		let err: AudioTagsError =
			PropertyEncodingError::new("TITLE", "\u{3042}", "not representable as Latin-1").into();

		let ErrorKind::EncodingError(inner) = err.kind() else {
			panic!("expected an encoding error");
		};

		assert_eq!(inner.key(), "TITLE");
		assert_eq!(inner.value(), "\u{3042}");
	}

	#[test_log::test]
	fn write_error_carries_the_io_error() {
		let source = io::Error::new(io::ErrorKind::PermissionDenied, "read-only");
		let err: AudioTagsError = FileEncodingError::from_io("Unable to persist", source).into();

		assert_eq!(err.to_string(), "Write failed: Unable to persist: read-only");

		let ErrorKind::WriteError(inner) = err.kind() else {
			panic!("expected a write error");
		};
		assert_eq!(inner.io_error().map(io::Error::kind), Some(io::ErrorKind::PermissionDenied));
	}
}

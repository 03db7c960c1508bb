//! Format-agnostic file parsing tools

use crate::config::ParseOptions;
use crate::error::Result;
use crate::file::{BufferGuess, FileType};
use crate::macros::err;
use crate::model::StructuralModel;
use crate::mpeg::header::{Header, next_header_matches, search_for_frame_sync};

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

/// Format detection for readers of unknown content
///
/// A `Probe` holds a reader and an optional [`FileType`]. The type is either given up front,
/// guessed from a path's extension by [`Probe::open`], or sniffed from the content with
/// [`Probe::guess_file_type`]. [`Probe::read`] then parses the reader into a [`StructuralModel`].
///
/// ```rust,no_run
/// # fn main() -> audiotags::error::Result<()> {
/// use audiotags::file::FileType;
/// use audiotags::probe::Probe;
///
/// // Only the extension is looked at here
/// let probe = Probe::open("path/to/my.flac")?;
/// assert_eq!(probe.file_type(), Some(FileType::Flac));
/// # Ok(())
/// # }
/// ```
///
/// Sniffing the content works on anything that can seek:
///
/// ```rust
/// # fn main() -> audiotags::error::Result<()> {
/// use audiotags::file::FileType;
/// use audiotags::probe::Probe;
/// use std::io::Cursor;
///
/// let probe = Probe::new(Cursor::new(b"fLaC")).guess_file_type()?;
/// assert_eq!(probe.file_type(), Some(FileType::Flac));
/// # Ok(())
/// # }
/// ```
pub struct Probe<R: Read> {
	inner: R,
	options: Option<ParseOptions>,
	file_type: Option<FileType>,
}

impl<R: Read> Probe<R> {
	/// Wrap a reader of unknown type
	///
	/// Detection reads byte by byte, a [`BufReader`] is recommended for files.
	#[must_use]
	pub const fn new(reader: R) -> Self {
		Self {
			inner: reader,
			options: None,
			file_type: None,
		}
	}

	/// Wrap a reader whose [`FileType`] is already known
	pub fn with_file_type(reader: R, file_type: FileType) -> Self {
		Self::new(reader).set_file_type(file_type)
	}

	/// The [`FileType`] that [`Probe::read`] will use, if one is known
	pub fn file_type(&self) -> Option<FileType> {
		self.file_type
	}

	/// Override the [`FileType`]
	pub fn set_file_type(mut self, file_type: FileType) -> Self {
		self.file_type = Some(file_type);
		self
	}

	/// The [`ParseOptions`] used by detection and [`Probe::read`]
	///
	/// # Examples
	///
	/// ```rust
	/// use audiotags::config::ParseOptions;
	/// use audiotags::probe::Probe;
	///
	/// # let reader = std::io::Cursor::new(&[]);
	/// // Only the tags are needed
	/// let probe = Probe::new(reader).options(ParseOptions::new().read_properties(false));
	/// ```
	#[must_use]
	pub fn options(mut self, options: ParseOptions) -> Self {
		self.options = Some(options);
		self
	}

	/// Take back the reader
	pub fn into_inner(self) -> R {
		self.inner
	}
}

impl Probe<BufReader<File>> {
	/// Open the file at `path`, taking its [`FileType`] from the extension
	///
	/// Use [`Probe::guess_file_type`] when the extension can't be trusted.
	///
	/// # Errors
	///
	/// * `path` can't be opened
	pub fn open<P>(path: P) -> Result<Self>
	where
		P: AsRef<Path>,
	{
		let path = path.as_ref();

		let file_type = FileType::from_path(path);
		log::debug!("Probe: `{}` looks like {file_type:?}", path.display());

		let probe = Self::new(BufReader::new(File::open(path)?));
		Ok(Self { file_type, ..probe })
	}
}

impl<R: Read + Seek> Probe<R> {
	/// Sniff the [`FileType`] from the content, starting at the current position
	///
	/// A match replaces the current file type, otherwise it is left alone. The reader is
	/// returned to where it started either way.
	///
	/// MPEG streams preceded by junk are only found within [`ParseOptions::max_junk_bytes`],
	/// so set the options with [`Probe::options()`] first.
	///
	/// # Errors
	///
	/// The reader failed. The `Probe` shouldn't be used any further.
	pub fn guess_file_type(mut self) -> std::io::Result<Self> {
		let max_junk_bytes = self
			.options
			.map_or(ParseOptions::DEFAULT_MAX_JUNK_BYTES, |options| {
				options.max_junk_bytes
			});

		let origin = self.inner.stream_position()?;
		let guessed = self.sniff(max_junk_bytes);
		self.inner.seek(SeekFrom::Start(origin))?;

		if let Some(file_type) = guessed? {
			self.file_type = Some(file_type);
		}

		log::debug!("Probe: Guessed file type: {:?}", self.file_type);
		Ok(self)
	}

	fn sniff(&mut self, max_junk_bytes: usize) -> std::io::Result<Option<FileType>> {
		let mut prefix = [0; BufferGuess::PREFIX_LEN];
		let prefix_len = fill(&mut self.inner, &mut prefix)?;

		match BufferGuess::from_prefix(&prefix[..prefix_len]) {
			// A frame header alone isn't enough, the frame has to be confirmed
			BufferGuess::Known(FileType::Mpeg) => {
				self.inner.seek(SeekFrom::Current(-(prefix_len as i64)))?;
				self.find_mpeg_frame(0)
			},
			BufferGuess::Known(file_type) => Ok(Some(file_type)),
			BufferGuess::Empty => Ok(None),
			// Only FLAC and MPEG streams are expected behind an ID3v2 tag
			BufferGuess::Id3v2 { tag_len } => {
				log::debug!("Probe: Skipping a {tag_len} byte ID3v2 tag");
				self.inner
					.seek(SeekFrom::Current(i64::from(tag_len) - prefix_len as i64))?;

				let mut marker = [0; 4];
				let marker_len = fill(&mut self.inner, &mut marker)?;

				match &marker[..marker_len] {
					b"fLaC" => Ok(Some(FileType::Flac)),
					_ => Ok(Some(FileType::Mpeg)),
				}
			},
			BufferGuess::Unknown => {
				log::debug!("Probe: No signature, searching {max_junk_bytes} bytes for a frame");
				self.inner.seek(SeekFrom::Current(-(prefix_len as i64)))?;
				self.find_mpeg_frame(max_junk_bytes)
			},
		}
	}

	/// Search for an MPEG frame preceded by at most `max_junk_bytes` bytes
	///
	/// A frame only counts if the next frame's header agrees with it, or it ends the stream.
	fn find_mpeg_frame(&mut self, max_junk_bytes: usize) -> std::io::Result<Option<FileType>> {
		let search_start = self.inner.stream_position()?;
		// The sync is two bytes
		let window_end = search_start + max_junk_bytes as u64 + 2;

		let mut pos = search_start;
		while pos < window_end {
			let window = &mut self.inner.by_ref().take(window_end - pos);
			let Some(relative) = search_for_frame_sync(window)? else {
				break;
			};

			let sync = pos + relative;
			self.inner.seek(SeekFrom::Start(sync))?;

			let mut word = [0; 4];
			if fill(&mut self.inner, &mut word)? < word.len() {
				break;
			}

			let word = u32::from_be_bytes(word);
			if let Some(header) = Header::read(word) {
				if next_header_matches(&mut self.inner, word, header.len) == Some(true) {
					log::debug!("Probe: Found an MPEG frame {} bytes in", sync - search_start);
					return Ok(Some(FileType::Mpeg));
				}
			}

			pos = sync + 1;
			self.inner.seek(SeekFrom::Start(pos))?;
		}

		Ok(None)
	}

	/// Parse the reader into a [`StructuralModel`]
	///
	/// With [`ParseOptions::read_properties`] disabled, the properties are zeroed.
	///
	/// # Errors
	///
	/// * No file type is known ([`ErrorKind::UnrecognizedFormat`])
	/// * The reader ends inside a structure ([`ErrorKind::TruncatedInput`])
	/// * The reader contains invalid data ([`ErrorKind::CorruptBlock`])
	///
	/// [`ErrorKind::UnrecognizedFormat`]: crate::error::ErrorKind::UnrecognizedFormat
	/// [`ErrorKind::TruncatedInput`]: crate::error::ErrorKind::TruncatedInput
	/// [`ErrorKind::CorruptBlock`]: crate::error::ErrorKind::CorruptBlock
	///
	/// # Examples
	///
	/// ```rust
	/// use audiotags::error::ErrorKind;
	/// use audiotags::probe::Probe;
	/// use std::io::Cursor;
	///
	/// # fn main() -> audiotags::error::Result<()> {
	/// let probe = Probe::new(Cursor::new(b"not audio")).guess_file_type()?;
	///
	/// let err = probe.read().unwrap_err();
	/// assert!(matches!(err.kind(), ErrorKind::UnrecognizedFormat));
	/// # Ok(()) }
	/// ```
	pub fn read(mut self) -> Result<StructuralModel> {
		let options = self.options.unwrap_or_default();
		let reader = &mut self.inner;

		let Some(file_type) = self.file_type else {
			err!(UnrecognizedFormat);
		};

		let model = match file_type {
			FileType::Flac => crate::flac::read::read_from(reader, options),
			FileType::Mpeg => crate::mpeg::read::read_from(reader, options),
			FileType::Mp4 => crate::mp4::read::read_from(reader, options),
		};

		model.map_err(|e| e.into_truncated(file_type))
	}
}

// Read into `buf` until it is full or the reader runs dry
fn fill<R: Read>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
	let mut filled = 0;
	while filled < buf.len() {
		match reader.read(&mut buf[filled..]) {
			Ok(0) => break,
			Ok(n) => filled += n,
			Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {},
			Err(e) => return Err(e),
		}
	}

	Ok(filled)
}

#[cfg(test)]
mod tests {
	use crate::config::ParseOptions;
	use crate::error::ErrorKind;
	use crate::file::FileType;
	use crate::probe::Probe;

	use std::io::Cursor;

	// An MPEG-1 Layer 3 frame header, 128 kbps, 44.1 kHz, joint stereo
	const FRAME_HEADER: [u8; 4] = [0xFF, 0xFB, 0x90, 0x64];

	fn frames(count: usize) -> Vec<u8> {
		let mut frame = FRAME_HEADER.to_vec();
		frame.resize(417, 0);
		frame.repeat(count)
	}

	fn guess(data: &[u8]) -> Option<FileType> {
		Probe::new(Cursor::new(data))
			.guess_file_type()
			.unwrap()
			.file_type()
	}

	#[test_log::test]
	fn junk_between_id3v2_and_frame() {
		// An empty ID3v2.3 tag with 6 bytes of padding
		let mut data = b"ID3\x03\x00\x00\x00\x00\x00\x06".to_vec();
		data.extend([0; 6]);
		data.extend(b"    ");
		data.extend(FRAME_HEADER);

		assert_eq!(guess(&data), Some(FileType::Mpeg));
	}

	#[test_log::test]
	fn flac_behind_id3v2() {
		let mut data = b"ID3\x04\x00\x00\x00\x00\x00\x04".to_vec();
		data.extend([0; 4]);
		data.extend(b"fLaC");
		assert_eq!(guess(&data), Some(FileType::Flac));
	}

	#[test_log::test]
	fn junk_before_frame() {
		let mut data = vec![0x42; 100];
		data.extend(frames(2));

		assert_eq!(guess(&data), Some(FileType::Mpeg));

		let probe = Probe::new(Cursor::new(&data))
			.options(ParseOptions::new().max_junk_bytes(50))
			.guess_file_type()
			.unwrap();
		assert_eq!(probe.file_type(), None);

		let probe = Probe::new(Cursor::new(&data))
			.options(ParseOptions::new().max_junk_bytes(100))
			.guess_file_type()
			.unwrap();
		assert_eq!(probe.file_type(), Some(FileType::Mpeg));
	}

	#[test_log::test]
	fn frames_must_be_confirmed() {
		// A lone frame ending the stream
		assert_eq!(guess(&frames(1)), Some(FileType::Mpeg));

		// A header with no room for its frame
		let mut data = FRAME_HEADER.to_vec();
		data.extend([0; 8]);
		assert_eq!(guess(&data), None);

		// A false sync in the junk, then a real stream
		let mut data = vec![0x42, 0xFF, 0xFB, 0x90, 0x64, 0x42];
		data.extend(frames(2));
		assert_eq!(guess(&data), Some(FileType::Mpeg));

		// The following header disagrees
		let mut data = frames(2);
		data[417 + 2] = 0x94;
		assert_eq!(guess(&data), None);
	}

	#[test_log::test]
	fn random_bytes_are_unrecognized() {
		let data = [0x3A, 0x91, 0x07, 0xC4, 0x5E, 0x12, 0xB8, 0x6D, 0x20, 0xF3];

		let probe = Probe::new(Cursor::new(&data)).guess_file_type().unwrap();
		assert_eq!(probe.file_type(), None);

		let err = probe.read().unwrap_err();
		assert!(matches!(err.kind(), ErrorKind::UnrecognizedFormat));
	}

	#[test_log::test]
	fn declared_length_past_the_end_is_truncated() {
		// STREAMINFO claims 34 bytes, only 4 follow
		let data = b"fLaC\x80\x00\x00\x22\x00\x00\x00\x00";

		let err = Probe::new(Cursor::new(data))
			.guess_file_type()
			.unwrap()
			.read()
			.unwrap_err();
		assert!(err.is_truncated_input());
	}

	#[test_log::test]
	fn position_is_restored() {
		let mut data = vec![0x42; 8];
		data.extend(frames(2));

		let mut cursor = Cursor::new(&data);
		cursor.set_position(2);

		let probe = Probe::new(cursor).guess_file_type().unwrap();
		assert_eq!(probe.file_type(), Some(FileType::Mpeg));
		assert_eq!(probe.into_inner().position(), 2);
	}
}

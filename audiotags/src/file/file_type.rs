use crate::id3::v2::util::synchsafe::SynchsafeInteger;
use crate::mpeg::header::{Header, verify_frame_sync};

use std::ffi::OsStr;
use std::path::Path;

const EXTENSION_MAP: [(&str, FileType); 11] = [
	("flac", FileType::Flac),
	("mp3", FileType::Mpeg),
	("mp2", FileType::Mpeg),
	("mp1", FileType::Mpeg),
	("mp4", FileType::Mp4),
	("m4a", FileType::Mp4),
	("m4b", FileType::Mp4),
	("m4p", FileType::Mp4),
	("m4r", FileType::Mp4),
	("m4v", FileType::Mp4),
	("3gp", FileType::Mp4),
];

/// List of common extensions for every supported [`FileType`]
///
/// This can be used as a filter when scanning directories.
///
/// # Examples
///
/// ```rust,no_run
/// use audiotags::config::ParseOptions;
/// use audiotags::file::{AudioFile, EXTENSIONS};
/// use std::fs;
///
/// # fn main() -> audiotags::error::Result<()> {
/// for entry in fs::read_dir(".")? {
/// 	let path = entry?.path();
///
/// 	let is_audio = path
/// 		.extension()
/// 		.is_some_and(|ext| EXTENSIONS.iter().any(|e| *e == ext));
/// 	if is_audio {
/// 		let file = AudioFile::open_from_path(path, ParseOptions::new())?;
/// 	}
/// }
/// # Ok(()) }
/// ```
pub const EXTENSIONS: [&str; EXTENSION_MAP.len()] = {
	let mut extensions = [""; EXTENSION_MAP.len()];

	let mut i = 0;
	while i < EXTENSION_MAP.len() {
		extensions[i] = EXTENSION_MAP[i].0;
		i += 1;
	}

	extensions
};

/// The container format of a file
#[derive(PartialEq, Eq, Copy, Clone, Debug, Hash)]
#[non_exhaustive]
pub enum FileType {
	/// A native FLAC stream
	Flac,
	/// An MPEG audio stream (MP1, MP2 or MP3)
	Mpeg,
	/// An ISO base media file (M4A and friends)
	Mp4,
}

impl FileType {
	/// Attempts to extract a [`FileType`] from an extension
	///
	/// The comparison ignores case.
	///
	/// # Examples
	///
	/// ```rust
	/// use audiotags::file::FileType;
	///
	/// assert_eq!(FileType::from_ext("MP3"), Some(FileType::Mpeg));
	/// assert_eq!(FileType::from_ext("ogg"), None);
	/// ```
	pub fn from_ext<E>(ext: E) -> Option<Self>
	where
		E: AsRef<OsStr>,
	{
		let ext = ext.as_ref().to_str()?;

		EXTENSION_MAP
			.iter()
			.find(|(known, _)| known.eq_ignore_ascii_case(ext))
			.map(|(_, file_type)| *file_type)
	}

	/// Attempts to determine a [`FileType`] from a path's extension
	///
	/// # Examples
	///
	/// ```rust
	/// use audiotags::file::FileType;
	/// use std::path::Path;
	///
	/// let path = Path::new("path/to/my.m4a");
	/// assert_eq!(FileType::from_path(path), Some(FileType::Mp4));
	/// ```
	pub fn from_path<P>(path: P) -> Option<Self>
	where
		P: AsRef<Path>,
	{
		path.as_ref().extension().and_then(Self::from_ext)
	}

	/// Attempts to extract a [`FileType`] from the start of a file
	///
	/// This only looks at magic signatures. Files starting with an ID3v2 tag or junk need
	/// [`Probe::guess_file_type`](crate::probe::Probe::guess_file_type), which can search
	/// past them.
	///
	/// # Examples
	///
	/// ```rust
	/// use audiotags::file::FileType;
	///
	/// assert_eq!(FileType::from_buffer(b"fLaC\0\0\0\x22"), Some(FileType::Flac));
	/// assert_eq!(FileType::from_buffer(b"\0\0\0\x20ftypM4A "), Some(FileType::Mp4));
	/// assert_eq!(FileType::from_buffer(b"RIFF"), None);
	/// ```
	pub fn from_buffer(buf: &[u8]) -> Option<Self> {
		match BufferGuess::from_prefix(buf) {
			BufferGuess::Known(file_type) => Some(file_type),
			_ => None,
		}
	}

	fn from_signature(buf: &[u8]) -> Option<Self> {
		if buf.starts_with(b"fLaC") {
			return Some(Self::Flac);
		}

		if buf.get(4..8) == Some(&b"ftyp"[..]) {
			return Some(Self::Mp4);
		}

		// A sync alone is too weak, the rest of the header has to make sense
		match buf {
			[a, b, c, d, ..] if verify_frame_sync([*a, *b]) => {
				Header::read(u32::from_be_bytes([*a, *b, *c, *d])).map(|_| Self::Mpeg)
			},
			_ => None,
		}
	}
}

/// What the first bytes of a stream say about its format
pub(crate) enum BufferGuess {
	/// A magic signature matched
	Known(FileType),
	/// An ID3v2 tag comes first, `tag_len` bytes in total
	Id3v2 { tag_len: u32 },
	/// Nothing matched, though junk may precede an MPEG frame
	Unknown,
	/// There are no bytes to look at
	Empty,
}

impl BufferGuess {
	/// The number of bytes needed to make a guess
	pub(crate) const PREFIX_LEN: usize = 12;

	pub(crate) fn from_prefix(buf: &[u8]) -> Self {
		if buf.is_empty() {
			return Self::Empty;
		}

		if let Some(file_type) = FileType::from_signature(buf) {
			return Self::Known(file_type);
		}

		// Header (10), then the size excluding the header and footer
		match buf {
			[b'I', b'D', b'3', _, _, flags, s1, s2, s3, s4, ..] => {
				let size = u32::from_be_bytes([*s1, *s2, *s3, *s4]).unsynch();
				let footer = if flags & 0x10 == 0 { 0 } else { 10 };

				Self::Id3v2 {
					tag_len: 10 + size + footer,
				}
			},
			_ => Self::Unknown,
		}
	}
}

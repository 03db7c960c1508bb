pub(super) mod content;
pub(super) mod picture;
pub(super) mod read;

use super::header::Id3v2Version;
use crate::dialect::NativeField;
use crate::dialect::keys::{ID3V2_MAP, ID3V2_URL_MAP, description_to_key};
use crate::picture::Picture;
use crate::util::text::TextEncoding;

/// The status and format flags of a frame
///
/// Compression and unsynchronisation are undone while reading, so they're only retained on
/// encrypted frames.
#[derive(Default, Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[allow(clippy::struct_excessive_bools)]
pub struct FrameFlags {
	/// Discard the frame when the tag is altered and the frame is unknown
	pub tag_alter_preservation: bool,
	/// Discard the frame when the audio is altered and the frame is unknown
	pub file_alter_preservation: bool,
	/// The frame is meant to be read only
	pub read_only: bool,
	/// The group this frame belongs to
	pub grouping_identity: Option<u8>,
	/// The content is zlib compressed
	pub compression: bool,
	/// The method the content is encrypted with
	pub encryption: Option<u8>,
	/// The content is unsynchronised (ID3v2.4 only)
	pub unsynchronisation: bool,
	/// The length of the content before compression or unsynchronisation (ID3v2.4 only)
	pub data_length_indicator: Option<u32>,
}

// Where each flag lives in a revision's flag word. A zero mask means the revision lacks it.
struct FlagLayout {
	tag_alter_preservation: u16,
	file_alter_preservation: u16,
	read_only: u16,
	grouping_identity: u16,
	compression: u16,
	encryption: u16,
	unsynchronisation: u16,
	data_length_indicator: u16,
}

const ID3V23_FLAGS: FlagLayout = FlagLayout {
	tag_alter_preservation: 0x8000,
	file_alter_preservation: 0x4000,
	read_only: 0x2000,
	grouping_identity: 0x0020,
	compression: 0x0080,
	encryption: 0x0040,
	unsynchronisation: 0,
	data_length_indicator: 0,
};

const ID3V24_FLAGS: FlagLayout = FlagLayout {
	tag_alter_preservation: 0x4000,
	file_alter_preservation: 0x2000,
	read_only: 0x1000,
	grouping_identity: 0x0040,
	compression: 0x0008,
	encryption: 0x0004,
	unsynchronisation: 0x0002,
	data_length_indicator: 0x0001,
};

impl FrameFlags {
	fn from_word(word: u16, layout: &FlagLayout) -> Self {
		let set = |mask: u16| mask != 0 && word & mask == mask;

		// The values of these live in the frame content, they're filled in by the reader
		let placeholder = |mask: u16| set(mask).then_some(0);

		Self {
			tag_alter_preservation: set(layout.tag_alter_preservation),
			file_alter_preservation: set(layout.file_alter_preservation),
			read_only: set(layout.read_only),
			grouping_identity: placeholder(layout.grouping_identity),
			compression: set(layout.compression),
			encryption: placeholder(layout.encryption),
			unsynchronisation: set(layout.unsynchronisation),
			data_length_indicator: placeholder(layout.data_length_indicator).map(u32::from),
		}
	}

	fn to_word(self, layout: &FlagLayout) -> u16 {
		[
			(self.tag_alter_preservation, layout.tag_alter_preservation),
			(self.file_alter_preservation, layout.file_alter_preservation),
			(self.read_only, layout.read_only),
			(self.grouping_identity.is_some(), layout.grouping_identity),
			(self.compression, layout.compression),
			(self.encryption.is_some(), layout.encryption),
			(self.unsynchronisation, layout.unsynchronisation),
			(self.data_length_indicator.is_some(), layout.data_length_indicator),
		]
		.into_iter()
		.filter_map(|(on, mask)| on.then_some(mask))
		.fold(0, |word, mask| word | mask)
	}

	/// Parse the flags of an ID3v2.4 frame
	///
	/// The grouping identity, encryption method, and data length indicator are set to `Some(0)`
	/// when flagged, their values follow the frame header.
	pub fn parse_id3v24(flags: u16) -> Self {
		Self::from_word(flags, &ID3V24_FLAGS)
	}

	/// Parse the flags of an ID3v2.3 frame
	///
	/// See [`FrameFlags::parse_id3v24`]. ID3v2.3 has no per-frame unsynchronisation or data
	/// length indicator.
	pub fn parse_id3v23(flags: u16) -> Self {
		Self::from_word(flags, &ID3V23_FLAGS)
	}

	/// The ID3v2.4 flag word
	pub fn as_id3v24_bytes(&self) -> u16 {
		self.to_word(&ID3V24_FLAGS)
	}

	/// The ID3v2.3 flag word, dropping what ID3v2.3 can't express
	pub fn as_id3v23_bytes(&self) -> u16 {
		self.to_word(&ID3V23_FLAGS)
	}
}

/// A frame with a language, description, and text (`COMM`, `USLT`)
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct LanguageFrame {
	/// The encoding of the description and text
	pub encoding: TextEncoding,
	/// ISO-639-2 language code (3 bytes)
	pub language: [u8; 3],
	/// Unique content description
	pub description: String,
	/// The actual frame content
	pub content: String,
}

/// The decoded content of a [`Frame`]
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum FrameContent {
	/// A text information frame (`T***`), one entry per NUL separated value
	Text {
		/// The encoding of the values
		encoding: TextEncoding,
		/// The values
		values: Vec<String>,
	},
	/// A user defined text frame (`TXXX`)
	UserText {
		/// The encoding of the description and values
		encoding: TextEncoding,
		/// The description, which identifies the frame
		description: String,
		/// The values
		values: Vec<String>,
	},
	/// A URL link frame (`W***`)
	Url(String),
	/// A user defined URL frame (`WXXX`)
	UserUrl {
		/// The encoding of the description
		encoding: TextEncoding,
		/// The description, which identifies the frame
		description: String,
		/// The URL, always Latin-1
		url: String,
	},
	/// A comment frame (`COMM`)
	Comment(LanguageFrame),
	/// An unsynchronised lyrics frame (`USLT`)
	Lyrics(LanguageFrame),
	/// An attached picture frame (`APIC`)
	Picture {
		/// The encoding of the description
		encoding: TextEncoding,
		/// The picture itself
		picture: Picture,
	},
	/// Any frame that isn't decoded, kept byte for byte
	Binary(Vec<u8>),
}

/// An ID3v2 frame
///
/// Frame IDs are always stored in their ID3v2.4 spelling. Frames read from a file keep their
/// original content, which is written back untouched as long as the target version allows it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
	pub(crate) id: String,
	pub(crate) flags: FrameFlags,
	pub(crate) content: FrameContent,
	// The content as it was read, after unsynchronisation and compression were undone
	pub(crate) raw: Option<Vec<u8>>,
	pub(crate) origin: Option<Id3v2Version>,
}

impl Frame {
	/// Create a new frame
	///
	/// `id` should be a 4 character ID3v2.4 frame ID.
	pub fn new(id: impl Into<String>, content: FrameContent) -> Self {
		Self {
			id: id.into(),
			flags: FrameFlags::default(),
			content,
			raw: None,
			origin: None,
		}
	}

	/// The frame ID
	pub fn id(&self) -> &str {
		&self.id
	}

	/// The frame's flags
	pub fn flags(&self) -> FrameFlags {
		self.flags
	}

	/// The decoded content
	pub fn content(&self) -> &FrameContent {
		&self.content
	}

	pub(crate) fn text(id: &str, encoding: TextEncoding, values: Vec<String>) -> Self {
		Self::new(id, FrameContent::Text { encoding, values })
	}

	/// Every value this frame exposes under its canonical key
	pub(crate) fn values(&self) -> Vec<String> {
		match &self.content {
			FrameContent::Text { values, .. } if self.id == "TCON" => {
				values.iter().map(|v| resolve_genre(v)).collect()
			},
			FrameContent::Text { values, .. } | FrameContent::UserText { values, .. } => {
				values.clone()
			},
			FrameContent::Url(url) | FrameContent::UserUrl { url, .. } => {
				if url.is_empty() {
					Vec::new()
				} else {
					vec![url.clone()]
				}
			},
			FrameContent::Comment(frame) | FrameContent::Lyrics(frame) => {
				if frame.content.is_empty() {
					Vec::new()
				} else {
					vec![frame.content.clone()]
				}
			},
			FrameContent::Picture { .. } | FrameContent::Binary(_) => Vec::new(),
		}
	}

	pub(crate) fn is_picture(&self) -> bool {
		self.id == "APIC"
	}
}

impl NativeField for Frame {
	fn canonical_key(&self) -> Option<String> {
		fn with_description(base: &str, description: &str) -> String {
			if description.is_empty() {
				base.to_owned()
			} else {
				format!("{base}:{}", description.to_uppercase())
			}
		}

		match &self.content {
			FrameContent::Text { .. } => Some(
				ID3V2_MAP::canonical(&self.id)
					.map_or_else(|| format!("ID3V2:{}", self.id), str::to_owned),
			),
			FrameContent::UserText { description, .. } if !description.is_empty() => {
				Some(description_to_key(description))
			},
			FrameContent::Url(_) => Some(
				ID3V2_URL_MAP::canonical(&self.id)
					.map_or_else(|| format!("ID3V2:{}", self.id), str::to_owned),
			),
			FrameContent::UserUrl { description, .. } => {
				Some(with_description("URL", description))
			},
			FrameContent::Comment(frame) => Some(with_description("COMMENT", &frame.description)),
			FrameContent::Lyrics(frame) => Some(with_description("LYRICS", &frame.description)),
			_ => None,
		}
	}
}

/// Replace ID3v1 genre references such as `(17)` or `17` with the genre name
fn resolve_genre(value: &str) -> String {
	use crate::id3::v1::GENRES;

	let index = value
		.strip_prefix('(')
		.and_then(|v| v.strip_suffix(')'))
		.unwrap_or(value);

	match index.parse::<usize>().ok().and_then(|idx| GENRES.get(idx)) {
		Some(genre) => (*genre).to_owned(),
		None => value.to_owned(),
	}
}

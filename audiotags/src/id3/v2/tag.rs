use super::frame::picture::parse_picture;
use super::frame::{Frame, FrameContent, LanguageFrame};
use super::header::Id3v2Version;
use crate::config::{ParsingMode, WriteOptions};
use crate::dialect::keys::{ID3V2_MAP, ID3V2_URL_MAP, key_to_description};
use crate::dialect::{NativeField, splice};
use crate::error::{PropertyEncodingError, Result};
use crate::picture::Picture;
use crate::properties::PropertyStore;
use crate::util::text::TextEncoding;

/// The language written to new `COMM` and `USLT` frames
const UNKNOWN_LANGUAGE: [u8; 3] = *b"XXX";

/// An `ID3v2` tag
///
/// ## Canonical keys
///
/// * Text frames map through a fixed table, e.g. `TIT2` <-> `TITLE`.
/// * `TXXX` frames use their description, e.g. `TXXX:REPLAYGAIN_TRACK_GAIN` <-> `REPLAYGAIN_TRACK_GAIN`.
/// * `COMM` frames map to `COMMENT`, or `COMMENT:<DESCRIPTION>` when they have a description.
/// * `USLT` frames map to `LYRICS`.
/// * `WXXX` frames map to `URL`, or `URL:<DESCRIPTION>`.
/// * Any other text or URL frame is exposed as `ID3V2:<FRAME ID>`.
///
/// Every other frame is retained, but never exposed.
///
/// ## Versions
///
/// Tags are always written as ID3v2.4, or ID3v2.3 with [`WriteOptions::use_id3v23`].
/// ID3v2.2 tags are upgraded on read, and ID3v2.2 frames without a modern equivalent are dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Id3v2Tag {
	pub(crate) original_version: Id3v2Version,
	pub(crate) frames: Vec<Frame>,
}

impl Default for Id3v2Tag {
	fn default() -> Self {
		Self {
			original_version: Id3v2Version::V4,
			frames: Vec::new(),
		}
	}
}

impl Id3v2Tag {
	/// Create a new empty `ID3v2Tag`
	///
	/// # Examples
	///
	/// ```rust
	/// use audiotags::id3::v2::Id3v2Tag;
	///
	/// let id3v2_tag = Id3v2Tag::new();
	/// assert!(id3v2_tag.is_empty());
	/// ```
	pub fn new() -> Self {
		Self::default()
	}

	/// The version of the tag that was read
	///
	/// New tags report ID3v2.4.
	pub fn original_version(&self) -> Id3v2Version {
		self.original_version
	}

	/// The frames, in file order
	pub fn frames(&self) -> &[Frame] {
		&self.frames
	}

	/// Whether the tag has no frames at all
	pub fn is_empty(&self) -> bool {
		self.frames.is_empty()
	}

	/// Append the frames of a tag that directly followed this one
	pub(crate) fn merge(&mut self, other: Id3v2Tag) {
		log::debug!("Merging {} frames from a subsequent ID3v2 tag", other.frames.len());
		self.frames.extend(other.frames);
	}

	pub(crate) fn decode(&self) -> Vec<(String, String)> {
		let mut pairs = Vec::new();

		for frame in &self.frames {
			let Some(key) = frame.canonical_key() else {
				continue;
			};

			for value in frame.values() {
				pairs.push((key.clone(), value));
			}
		}

		pairs
	}

	pub(crate) fn apply(
		&mut self,
		store: &PropertyStore,
		changed: &[String],
		options: WriteOptions,
	) -> Result<()> {
		splice(&mut self.frames, store, changed, |key, values| {
			encode_key(key, values, options)
		})
	}

	pub(crate) fn pictures(&self, parse_mode: ParsingMode) -> Result<Vec<Picture>> {
		let mut pictures = Vec::new();

		for frame in self.frames.iter().filter(|f| f.is_picture()) {
			match &frame.content {
				FrameContent::Picture { picture, .. } => pictures.push(picture.clone()),
				// Pictures that were skipped while reading, or encrypted
				FrameContent::Binary(data) if frame.flags.encryption.is_none() => {
					let version = frame.origin.unwrap_or(Id3v2Version::V4);
					match parse_picture(data, version) {
						Ok((_, picture)) => pictures.push(picture),
						Err(e) => {
							if parse_mode == ParsingMode::Strict {
								return Err(e);
							}

							log::warn!("Unable to read an ID3v2 picture, skipping: {e}");
						},
					}
				},
				_ => {},
			}
		}

		Ok(pictures)
	}

	pub(crate) fn set_pictures(&mut self, pictures: &[Picture]) {
		let first = self.frames.iter().position(Frame::is_picture);
		self.frames.retain(|f| !f.is_picture());

		let at = first.unwrap_or(self.frames.len());
		self.frames.splice(at..at, pictures.iter().map(picture_frame));
	}

	/// Add `pictures` after the last existing picture frame
	pub(crate) fn append_pictures(&mut self, pictures: &[Picture]) {
		let at = self
			.frames
			.iter()
			.rposition(Frame::is_picture)
			.map_or(self.frames.len(), |last| last + 1);

		self.frames.splice(at..at, pictures.iter().map(picture_frame));
	}
}

fn picture_frame(picture: &Picture) -> Frame {
	let encoding = if TextEncoding::verify_latin1(picture.description()) {
		TextEncoding::Latin1
	} else {
		TextEncoding::UTF16
	};

	Frame::new(
		"APIC",
		FrameContent::Picture {
			encoding,
			picture: picture.clone(),
		},
	)
}

// Pick the narrowest encoding allowed for `texts`
fn select_encoding<'a, I>(key: &str, texts: I, options: WriteOptions) -> Result<TextEncoding>
where
	I: IntoIterator<Item = &'a str>,
{
	let mut latin1 = true;
	for text in texts {
		if TextEncoding::verify_latin1(text) {
			continue;
		}

		if !options.unicode_text && !options.lossy_text_encoding {
			return Err(PropertyEncodingError::new(key, text, "not representable as Latin-1").into());
		}

		latin1 = false;
	}

	Ok(match (latin1 || !options.unicode_text, options.use_id3v23) {
		(true, _) => TextEncoding::Latin1,
		(false, true) => TextEncoding::UTF16,
		(false, false) => TextEncoding::UTF8,
	})
}

fn check_url(key: &str, url: &str, options: WriteOptions) -> Result<String> {
	if !TextEncoding::verify_latin1(url) && !options.lossy_text_encoding {
		return Err(PropertyEncodingError::new(key, url, "URLs must be Latin-1").into());
	}

	Ok(url.to_owned())
}

fn split_description<'a>(key: &'a str, base: &str) -> Option<&'a str> {
	if key == base {
		return Some("");
	}

	key.strip_prefix(base)?.strip_prefix(':')
}

// Encode the values of `key` into new frames
fn encode_key(key: &str, values: &[String], options: WriteOptions) -> Result<Vec<Frame>> {
	let strs = || values.iter().map(String::as_str);

	if let Some(id) = ID3V2_MAP::native(key) {
		let encoding = select_encoding(key, strs(), options)?;
		return Ok(vec![Frame::text(id, encoding, values.to_vec())]);
	}

	if let Some(id) = ID3V2_URL_MAP::native(key) {
		return values
			.iter()
			.map(|url| Ok(Frame::new(id, FrameContent::Url(check_url(key, url, options)?))))
			.collect();
	}

	if let Some(description) = split_description(key, "COMMENT") {
		return language_frames("COMM", key, description, values, options);
	}

	if let Some(description) = split_description(key, "LYRICS") {
		return language_frames("USLT", key, description, values, options);
	}

	if let Some(description) = split_description(key, "URL") {
		let encoding = select_encoding(key, [description], options)?;
		return values
			.iter()
			.map(|url| {
				Ok(Frame::new(
					"WXXX",
					FrameContent::UserUrl {
						encoding,
						description: description.to_owned(),
						url: check_url(key, url, options)?,
					},
				))
			})
			.collect();
	}

	if let Some(id) = key.strip_prefix("ID3V2:") {
		return encode_passthrough(key, id, values, options);
	}

	let description = key_to_description(key);
	let encoding = select_encoding(key, strs().chain([description]), options)?;
	Ok(vec![Frame::new(
		"TXXX",
		FrameContent::UserText {
			encoding,
			description: description.to_owned(),
			values: values.to_vec(),
		},
	)])
}

fn language_frames(
	id: &str,
	key: &str,
	description: &str,
	values: &[String],
	options: WriteOptions,
) -> Result<Vec<Frame>> {
	values
		.iter()
		.map(|value| {
			let frame = LanguageFrame {
				encoding: select_encoding(key, [description, value.as_str()], options)?,
				language: UNKNOWN_LANGUAGE,
				description: description.to_owned(),
				content: value.clone(),
			};

			Ok(Frame::new(
				id,
				if id == "COMM" {
					FrameContent::Comment(frame)
				} else {
					FrameContent::Lyrics(frame)
				},
			))
		})
		.collect()
}

fn encode_passthrough(
	key: &str,
	id: &str,
	values: &[String],
	options: WriteOptions,
) -> Result<Vec<Frame>> {
	let reject = |reason| {
		let value = values.first().map_or("", String::as_str);
		Err(PropertyEncodingError::new(key, value, reason).into())
	};

	let valid = id.len() == 4
		&& id.bytes().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
		&& id != "TXXX"
		&& id != "WXXX";
	if !valid {
		return reject("not a valid ID3v2 text or URL frame ID");
	}

	if id.starts_with('T') {
		let encoding = select_encoding(key, values.iter().map(String::as_str), options)?;
		return Ok(vec![Frame::text(id, encoding, values.to_vec())]);
	}

	if id.starts_with('W') {
		return values
			.iter()
			.map(|url| Ok(Frame::new(id, FrameContent::Url(check_url(key, url, options)?))))
			.collect();
	}

	reject("only text and URL frames can be written through ID3V2 keys")
}

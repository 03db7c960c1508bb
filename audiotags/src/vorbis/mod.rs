//! Vorbis comments
//!
//! FLAC stores these in its `VORBIS_COMMENT` metadata block. Field names are case-insensitive
//! and may repeat, so the vocabulary is open: every field name is its own canonical key.

mod read;
mod write;

pub(crate) use read::read_comments;

use crate::config::ParsingMode;
use crate::dialect::{NativeField, splice};
use crate::error::{PropertyEncodingError, Result};
use crate::macros::err;
use crate::picture::{Picture, PictureType};
use crate::properties::PropertyStore;

use data_encoding::BASE64;

/// The vendor string written to newly created blocks
pub const VENDOR: &str = concat!("audiotags ", env!("CARGO_PKG_VERSION"));

const PICTURE_KEY: &str = "METADATA_BLOCK_PICTURE";
const COVERART_KEY: &str = "COVERART";

/// A set of Vorbis comments
///
/// Fields are kept in file order with their original spelling. Picture fields
/// (`METADATA_BLOCK_PICTURE` and the deprecated `COVERART`) are retained as base64 and exposed
/// as pictures rather than properties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VorbisComments {
	pub(crate) vendor: String,
	pub(crate) items: Vec<(String, String)>,
}

impl Default for VorbisComments {
	fn default() -> Self {
		Self {
			vendor: VENDOR.to_owned(),
			items: Vec::new(),
		}
	}
}

impl NativeField for (String, String) {
	fn canonical_key(&self) -> Option<String> {
		if is_picture_key(&self.0) {
			return None;
		}

		Some(self.0.to_uppercase())
	}
}

fn is_picture_key(key: &str) -> bool {
	key.eq_ignore_ascii_case(PICTURE_KEY) || key.eq_ignore_ascii_case(COVERART_KEY)
}

// A case-insensitive field name that may consist of ASCII 0x20 through 0x7D, 0x3D ('=') excluded
pub(crate) fn valid_key(key: &[u8]) -> bool {
	!key.is_empty() && key.iter().all(|c| (b' '..=b'}').contains(c) && *c != b'=')
}

impl VorbisComments {
	/// The vendor string
	pub fn vendor(&self) -> &str {
		&self.vendor
	}

	/// Every field, including picture fields, as `(name, value)`
	pub fn items(&self) -> impl ExactSizeIterator<Item = (&str, &str)> + Clone {
		self.items.iter().map(|(k, v)| (k.as_str(), v.as_str()))
	}

	pub(crate) fn decode(&self) -> Vec<(String, String)> {
		self.items
			.iter()
			.filter_map(|field| field.canonical_key().map(|key| (key, field.1.clone())))
			.collect()
	}

	pub(crate) fn apply(&mut self, store: &PropertyStore, changed: &[String]) -> Result<()> {
		splice(&mut self.items, store, changed, |key, values| {
			if !valid_key(key.as_bytes()) || is_picture_key(key) {
				let value = values.first().map_or("", String::as_str);
				err!(EncodingError(PropertyEncodingError::new(
					key,
					value,
					"not a valid Vorbis comment field name"
				)));
			}

			Ok(values
				.iter()
				.map(|value| (key.to_owned(), value.clone()))
				.collect())
		})
	}

	pub(crate) fn pictures(&self, parse_mode: ParsingMode) -> Result<Vec<Picture>> {
		let mut pictures = Vec::new();

		for (key, value) in &self.items {
			let picture = if key.eq_ignore_ascii_case(PICTURE_KEY) {
				Picture::from_flac_bytes(value.as_bytes(), true, parse_mode)
			} else if key.eq_ignore_ascii_case(COVERART_KEY) {
				// `COVERART` is the deprecated predecessor of `METADATA_BLOCK_PICTURE`,
				// holding nothing but the base64 image data
				log::warn!("Found deprecated `COVERART` field");
				match BASE64.decode(value.as_bytes()) {
					Ok(data) => Picture::from_bytes(data),
					Err(_) => Err(crate::error::AudioTagsError::new(
						crate::error::ErrorKind::NotAPicture,
					)),
				}
			} else {
				continue;
			};

			match picture {
				Ok(mut picture) => {
					if picture.pic_type == PictureType::Other && key.eq_ignore_ascii_case(COVERART_KEY)
					{
						picture.pic_type = PictureType::CoverFront;
					}
					pictures.push(picture)
				},
				Err(e) if parse_mode == ParsingMode::Strict => return Err(e),
				Err(e) => log::warn!("Failed to decode a Vorbis comment picture, skipping: {e}"),
			}
		}

		Ok(pictures)
	}

	pub(crate) fn remove_pictures(&mut self) {
		self.items.retain(|(key, _)| !is_picture_key(key));
	}
}

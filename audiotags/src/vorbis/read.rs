use super::{VorbisComments, valid_key};
use crate::config::ParsingMode;
use crate::error::Result;
use crate::macros::{decode_err, parse_mode_choice, truncated_err, try_vec};
use crate::util::text::{utf8_decode, utf8_decode_lossy};

use std::io::{Cursor, Read};

use byteorder::{LittleEndian, ReadBytesExt};

/// Parse the content of a `VORBIS_COMMENT` block
pub(crate) fn read_comments(content: &[u8], parse_mode: ParsingMode) -> Result<VorbisComments> {
	let mut data = Cursor::new(content);
	let mut len = content.len() as u64;

	let vendor_len = data.read_u32::<LittleEndian>()?;
	len = len.saturating_sub(4);
	if u64::from(vendor_len) > len {
		return Err(truncated_err!(Flac, "Vorbis comments: vendor string length exceeds the block"));
	}

	let mut vendor_bytes = try_vec![0; vendor_len as usize];
	data.read_exact(&mut vendor_bytes)?;
	len -= u64::from(vendor_len);

	let vendor = match utf8_decode(&vendor_bytes) {
		Ok(vendor) => vendor,
		Err(e) if parse_mode == ParsingMode::Strict => return Err(e),
		Err(_) => {
			log::warn!("Vorbis comments: Invalid vendor string, decoding lossily");
			utf8_decode_lossy(&vendor_bytes)
		},
	};

	let number_of_items = data.read_u32::<LittleEndian>()?;
	len = len.saturating_sub(4);
	// Every field is at least a 4 byte length
	if u64::from(number_of_items) > (len >> 2) {
		return Err(truncated_err!(Flac, "Vorbis comments: field count exceeds the block"));
	}

	let mut tag = VorbisComments {
		vendor,
		items: Vec::with_capacity(number_of_items as usize),
	};

	for _ in 0..number_of_items {
		let comment_len = data.read_u32::<LittleEndian>()?;
		len = len.saturating_sub(4);
		if u64::from(comment_len) > len {
			return Err(truncated_err!(Flac, "Vorbis comments: field length exceeds the block"));
		}

		let mut comment_bytes = try_vec![0; comment_len as usize];
		data.read_exact(&mut comment_bytes)?;
		len -= u64::from(comment_len);

		// KEY=VALUE
		let mut comment_split = comment_bytes.splitn(2, |b| *b == b'=');
		let key = comment_split.next().unwrap_or_default();

		let Some(value) = comment_split.next() else {
			parse_mode_choice!(
				parse_mode,
				STRICT: return Err(decode_err!(Flac, "Vorbis comments: field has no separator")),
				DEFAULT: {
					log::warn!("Vorbis comments: No separator found in field, discarding");
					continue;
				}
			);
		};

		if !valid_key(key) {
			parse_mode_choice!(
				parse_mode,
				STRICT: return Err(decode_err!(Flac, "Vorbis comments: invalid field name")),
				DEFAULT: {
					log::warn!("Vorbis comments: Invalid field name, discarding");
					continue;
				}
			);
		}

		// Verified to be ASCII above
		let key = String::from_utf8_lossy(key).into_owned();

		let value = match utf8_decode(value) {
			Ok(value) => value,
			Err(e) => {
				parse_mode_choice!(
					parse_mode,
					STRICT: return Err(e),
					RELAXED: {
						log::warn!("Vorbis comments: Non UTF-8 value found, discarding field {key:?}");
						continue;
					},
					DEFAULT: utf8_decode_lossy(value)
				)
			},
		};

		tag.items.push((key, value));
	}

	Ok(tag)
}

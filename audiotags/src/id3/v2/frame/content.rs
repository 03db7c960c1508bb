use super::picture::{parse_picture, picture_as_bytes};
use super::{Frame, FrameContent, LanguageFrame};
use crate::error::{Id3v2Error, Id3v2ErrorKind, PropertyEncodingError, Result};
use crate::id3::v2::header::Id3v2Version;
use crate::util::text::{TextEncoding, decode_text, latin1_decode};

fn read_encoding(content: &[u8]) -> Result<(TextEncoding, &[u8])> {
	let [encoding, rest @ ..] = content else {
		return Err(Id3v2Error::new(Id3v2ErrorKind::BadFrameLength).into());
	};

	match TextEncoding::from_u8(*encoding) {
		Some(encoding) => Ok((encoding, rest)),
		None => Err(Id3v2Error::new(Id3v2ErrorKind::BadTextEncoding(*encoding)).into()),
	}
}

// Text frames separate multiple values with a terminator of the encoding's width
fn decode_values(mut bytes: &[u8], encoding: TextEncoding) -> Result<Vec<String>> {
	let mut values = Vec::new();

	while !bytes.is_empty() {
		let (value, read) = decode_text(bytes, encoding, true)?;
		if read == 0 {
			break;
		}

		bytes = &bytes[read..];
		if !value.is_empty() {
			values.push(value);
		}
	}

	Ok(values)
}

fn decode_language_frame(content: &[u8]) -> Result<LanguageFrame> {
	let (encoding, rest) = read_encoding(content)?;

	let [a, b, c, rest @ ..] = rest else {
		return Err(Id3v2Error::new(Id3v2ErrorKind::BadFrameLength).into());
	};

	let (description, read) = decode_text(rest, encoding, true)?;
	let (content, _) = decode_text(&rest[read..], encoding, false)?;

	Ok(LanguageFrame {
		encoding,
		language: [*a, *b, *c],
		description,
		content,
	})
}

/// Decode the content of a frame, all flags having already been handled
pub(super) fn parse_content(
	id: &str,
	content: &[u8],
	version: Id3v2Version,
) -> Result<FrameContent> {
	let parsed = match id {
		"TXXX" => {
			let (encoding, rest) = read_encoding(content)?;
			let (description, read) = decode_text(rest, encoding, true)?;

			FrameContent::UserText {
				encoding,
				description,
				values: decode_values(&rest[read..], encoding)?,
			}
		},
		"WXXX" => {
			let (encoding, rest) = read_encoding(content)?;
			let (description, read) = decode_text(rest, encoding, true)?;

			FrameContent::UserUrl {
				encoding,
				description,
				url: latin1_decode(&rest[read..]),
			}
		},
		"COMM" => FrameContent::Comment(decode_language_frame(content)?),
		"USLT" => FrameContent::Lyrics(decode_language_frame(content)?),
		"APIC" => {
			let (encoding, picture) = parse_picture(content, version)?;
			FrameContent::Picture { encoding, picture }
		},
		_ if id.starts_with('T') => {
			let (encoding, rest) = read_encoding(content)?;
			FrameContent::Text {
				encoding,
				values: decode_values(rest, encoding)?,
			}
		},
		_ if id.starts_with('W') => FrameContent::Url(latin1_decode(content)),
		_ => FrameContent::Binary(content.to_vec()),
	};

	Ok(parsed)
}

impl Frame {
	/// Encode the frame content for `version`
	///
	/// NOTE: This does not include the frame header
	pub(crate) fn content_bytes(&self, version: Id3v2Version, lossy: bool) -> Result<Vec<u8>> {
		let target = |encoding: TextEncoding| match version {
			Id3v2Version::V4 => encoding,
			_ => encoding.to_id3v23(),
		};

		let encode = |encoding: TextEncoding, text: &str, terminated: bool| {
			encoding.encode(text, terminated, lossy).map_err(|_| {
				PropertyEncodingError::new(
					&self.id,
					text,
					"not representable in the frame's text encoding",
				)
			})
		};

		let encode_values = |encoding: TextEncoding, values: &[String], out: &mut Vec<u8>| {
			for (idx, value) in values.iter().enumerate() {
				if idx > 0 {
					out.resize(out.len() + encoding.terminator_len(), 0);
				}

				out.extend(encode(encoding, value, false)?);
			}

			Ok::<_, PropertyEncodingError>(())
		};

		let mut out = Vec::new();
		match &self.content {
			FrameContent::Text { encoding, values } => {
				let encoding = target(*encoding);
				out.push(encoding as u8);
				encode_values(encoding, values, &mut out)?;
			},
			FrameContent::UserText {
				encoding,
				description,
				values,
			} => {
				let encoding = target(*encoding);
				out.push(encoding as u8);
				out.extend(encode(encoding, description, true)?);
				encode_values(encoding, values, &mut out)?;
			},
			FrameContent::Url(url) => out.extend(encode(TextEncoding::Latin1, url, false)?),
			FrameContent::UserUrl {
				encoding,
				description,
				url,
			} => {
				let encoding = target(*encoding);
				out.push(encoding as u8);
				out.extend(encode(encoding, description, true)?);
				out.extend(encode(TextEncoding::Latin1, url, false)?);
			},
			FrameContent::Comment(frame) | FrameContent::Lyrics(frame) => {
				let encoding = target(frame.encoding);
				out.push(encoding as u8);
				out.extend_from_slice(&frame.language);
				out.extend(encode(encoding, &frame.description, true)?);
				out.extend(encode(encoding, &frame.content, false)?);
			},
			FrameContent::Picture { encoding, picture } => {
				out = picture_as_bytes(picture, target(*encoding), lossy)?;
			},
			FrameContent::Binary(data) => out.extend_from_slice(data),
		}

		Ok(out)
	}

	/// Whether the original content can be written as-is for `version`
	pub(crate) fn raw_compatible(&self, version: Id3v2Version) -> Option<&[u8]> {
		let raw = self.raw.as_deref()?;
		let origin = self.origin?;

		if origin == version {
			return Some(raw);
		}

		// ID3v2.2 layouts differ, and ID3v2.3 can't store UTF-8 or UTF-16 BE text
		let encoding = match &self.content {
			FrameContent::Text { encoding, .. }
			| FrameContent::UserText { encoding, .. }
			| FrameContent::UserUrl { encoding, .. }
			| FrameContent::Picture { encoding, .. } => Some(*encoding),
			FrameContent::Comment(frame) | FrameContent::Lyrics(frame) => Some(frame.encoding),
			FrameContent::Url(_) | FrameContent::Binary(_) => None,
		};

		let compatible = origin != Id3v2Version::V2
			&& !(version == Id3v2Version::V3
				&& matches!(encoding, Some(TextEncoding::UTF8 | TextEncoding::UTF16BE)));

		compatible.then_some(raw)
	}
}

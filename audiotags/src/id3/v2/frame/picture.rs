use crate::error::{Id3v2Error, Id3v2ErrorKind, Result};
use crate::id3::v2::header::Id3v2Version;
use crate::picture::{MimeType, Picture, PictureType};
use crate::util::text::{TextEncoding, decode_text};

use std::io::Write;

use byteorder::WriteBytesExt;

/// Parse the content of an `APIC` (or ID3v2.2 `PIC`) frame
///
/// # Errors
///
/// * There isn't enough data present
/// * Unable to decode any of the text
///
/// ID3v2.2:
///
/// * The format is not "PNG" or "JPG"
pub(in crate::id3::v2) fn parse_picture(
	content: &[u8],
	version: Id3v2Version,
) -> Result<(TextEncoding, Picture)> {
	let [encoding, rest @ ..] = content else {
		return Err(Id3v2Error::new(Id3v2ErrorKind::BadFrameLength).into());
	};

	let encoding = TextEncoding::from_u8(*encoding)
		.ok_or_else(|| Id3v2Error::new(Id3v2ErrorKind::BadTextEncoding(*encoding)))?;

	let (mime_type, rest) = if version == Id3v2Version::V2 {
		let [a, b, c, rest @ ..] = rest else {
			return Err(Id3v2Error::new(Id3v2ErrorKind::BadFrameLength).into());
		};

		let mime_type = match [*a, *b, *c] {
			[b'P', b'N', b'G'] => MimeType::Png,
			[b'J', b'P', b'G'] => MimeType::Jpeg,
			format => {
				return Err(Id3v2Error::new(Id3v2ErrorKind::BadPictureFormat(
					String::from_utf8_lossy(&format).into_owned(),
				))
				.into());
			},
		};

		(Some(mime_type), rest)
	} else {
		let (mime_type, read) = decode_text(rest, TextEncoding::Latin1, true)?;
		let mime_type = (!mime_type.is_empty()).then(|| MimeType::from_str(&mime_type));

		(mime_type, &rest[read..])
	};

	let [pic_type, rest @ ..] = rest else {
		return Err(Id3v2Error::new(Id3v2ErrorKind::BadFrameLength).into());
	};

	let (description, read) = decode_text(rest, encoding, true)?;
	let data = rest[read..].to_vec();

	let mut builder = Picture::unchecked(data)
		.pic_type(PictureType::from_u8(*pic_type))
		.description(description);
	if let Some(mime_type) = mime_type {
		builder = builder.mime_type(mime_type);
	}

	Ok((encoding, builder.build()))
}

/// Convert a [`Picture`] to ID3v2.3/4 `APIC` bytes
///
/// NOTE: This does not include the frame header
pub(in crate::id3::v2) fn picture_as_bytes(
	picture: &Picture,
	encoding: TextEncoding,
	lossy: bool,
) -> Result<Vec<u8>> {
	let mut data = vec![encoding as u8];

	if let Some(mime_type) = picture.mime_type() {
		data.write_all(mime_type.as_str().as_bytes())?;
	}
	data.write_u8(0)?;

	data.write_u8(picture.pic_type().as_u8())?;

	let description = encoding
		.encode(picture.description(), true, lossy)
		.unwrap_or_else(|_| vec![0; encoding.terminator_len()]);
	data.write_all(&description)?;

	data.write_all(picture.data())?;

	Ok(data)
}

#[cfg(test)]
mod tests {
	use super::{parse_picture, picture_as_bytes};
	use crate::id3::v2::header::Id3v2Version;
	use crate::picture::tests::png;
	use crate::picture::{MimeType, Picture, PictureType};
	use crate::util::text::TextEncoding;

	#[test_log::test]
	fn apic_round_trip() {
		let picture = Picture::unchecked(png(2, 3))
			.pic_type(PictureType::CoverFront)
			.description("cover")
			.build();

		let bytes = picture_as_bytes(&picture, TextEncoding::UTF16, false).unwrap();
		let (encoding, parsed) = parse_picture(&bytes, Id3v2Version::V4).unwrap();

		assert_eq!(encoding, TextEncoding::UTF16);
		assert_eq!(parsed, picture);
		assert_eq!(parsed.width(), 2);
	}

	#[test_log::test]
	fn id3v22_pic() {
		let mut content = vec![0, b'P', b'N', b'G', 3, 0];
		content.extend(png(5, 5));

		let (_, picture) = parse_picture(&content, Id3v2Version::V2).unwrap();
		assert_eq!(picture.mime_type(), Some(&MimeType::Png));
		assert_eq!(picture.pic_type(), PictureType::CoverFront);
		assert_eq!(picture.height(), 5);

		content[1..4].copy_from_slice(b"XYZ");
		assert!(parse_picture(&content, Id3v2Version::V2).is_err());
	}
}

use crate::images;

use audiotags::config::ParsingMode;
use audiotags::picture::{MimeType, Picture, PictureType};

fn cover() -> Picture {
	Picture::unchecked(images::png(640, 628, 2))
		.pic_type(PictureType::CoverFront)
		.description("png_640x628.png")
		.build()
}

#[test_log::test]
fn as_flac_bytes() {
	let bytes = cover().as_flac_bytes(false);

	// Type, then the MIME type
	assert_eq!(&bytes[..4], &[0, 0, 0, 3]);
	assert_eq!(&bytes[4..8], &9_u32.to_be_bytes());
	assert_eq!(&bytes[8..17], b"image/png");

	// The dimensions are filled in from the image header
	let dimensions = 17 + 4 + "png_640x628.png".len();
	assert_eq!(&bytes[dimensions..dimensions + 4], &640_u32.to_be_bytes());
	assert_eq!(&bytes[dimensions + 4..dimensions + 8], &628_u32.to_be_bytes());
}

#[test_log::test]
fn flac_block() {
	let original = cover();

	let read = Picture::from_flac_bytes(
		&original.as_flac_bytes(false),
		false,
		ParsingMode::Strict,
	)
	.unwrap();
	assert_eq!(read, original);
}

#[test_log::test]
fn vorbis_comment_value() {
	let original = cover();

	let encoded = original.as_flac_bytes(true);
	assert!(encoded.iter().all(u8::is_ascii));

	let read = Picture::from_flac_bytes(&encoded, true, ParsingMode::Strict).unwrap();
	assert_eq!(read, original);

	assert!(Picture::from_flac_bytes(b"not base64!", true, ParsingMode::Strict).is_err());
}

#[test_log::test]
fn missing_details_are_sniffed() {
	let data = images::gif(3, 4);

	let mut bytes = 3_u32.to_be_bytes().to_vec();
	// No MIME type or description
	bytes.extend([0; 8]);
	// No dimensions, depth or colors
	bytes.extend([0; 16]);
	bytes.extend((data.len() as u32).to_be_bytes());
	bytes.extend(&data);

	let picture = Picture::from_flac_bytes(&bytes, false, ParsingMode::BestAttempt).unwrap();
	assert_eq!(picture.mime_type(), Some(&MimeType::Gif));
	assert_eq!((picture.width(), picture.height()), (3, 4));
}

#[test_log::test]
fn lengths_past_the_end() {
	let mut bytes = cover().as_flac_bytes(false);

	// Cut into the image data
	bytes.truncate(bytes.len() - 10);
	assert!(Picture::from_flac_bytes(&bytes, false, ParsingMode::BestAttempt).is_err());

	// A MIME type length larger than the block
	let mut bytes = cover().as_flac_bytes(false);
	bytes[4..8].copy_from_slice(&u32::MAX.to_be_bytes());
	assert!(Picture::from_flac_bytes(&bytes, false, ParsingMode::BestAttempt).is_err());
}

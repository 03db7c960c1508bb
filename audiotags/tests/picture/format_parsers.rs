use crate::images;

use audiotags::error::ErrorKind;
use audiotags::picture::{MimeType, Picture, PictureInformation, PictureType};

fn assert_dimensions(info: PictureInformation, width: u32, height: u32) {
	assert_eq!((info.width, info.height), (width, height));
}

#[test_log::test]
fn read_png() {
	let info = PictureInformation::from_png(&images::png(640, 628, 6)).unwrap();
	assert_dimensions(info, 640, 628);
	assert_eq!(info.color_depth, 32);
}

#[test_log::test]
fn read_png_plte() {
	let mut data = images::png(16, 16, 3);
	data.extend(6_u32.to_be_bytes());
	data.extend(b"PLTE");
	data.extend([0; 6 + 4]);

	let info = PictureInformation::from_png(&data).unwrap();
	assert_dimensions(info, 16, 16);
	assert_eq!(info.num_colors, 2);
}

#[test_log::test]
fn read_jpeg() {
	let info = PictureInformation::from_jpeg(&images::jpeg(640, 628)).unwrap();
	assert_dimensions(info, 640, 628);
	assert_eq!(info.color_depth, 24);
}

#[test_log::test]
fn jpeg_without_frame_header() {
	let err = PictureInformation::from_jpeg(&[0xFF, 0xD8, 0xFF, 0xDA]).unwrap_err();
	assert!(matches!(err.kind(), ErrorKind::NotAPicture));
}

#[test_log::test]
fn read_gif() {
	let info = PictureInformation::from_gif(&images::gif(640, 628)).unwrap();
	assert_dimensions(info, 640, 628);
	assert_eq!(info.color_depth, 8);
	assert_eq!(info.num_colors, 256);
}

#[test_log::test]
fn read_bmp() {
	let info = PictureInformation::from_bmp(&images::bmp(640, 628)).unwrap();
	assert_dimensions(info, 640, 628);
	assert_eq!(info.color_depth, 24);

	// Top-down
	let info = PictureInformation::from_bmp(&images::bmp(640, -628)).unwrap();
	assert_dimensions(info, 640, 628);
}

#[test_log::test]
fn wrong_parser() {
	assert!(PictureInformation::from_png(&images::gif(1, 1)).is_err());
	assert!(PictureInformation::from_gif(&images::bmp(1, 1)).is_err());
	assert!(PictureInformation::from_bmp(&images::jpeg(1, 1)).is_err());
}

#[test_log::test]
fn sniff() {
	let cases = [
		(images::png(1, 2, 2), MimeType::Png),
		(images::jpeg(1, 2), MimeType::Jpeg),
		(images::gif(1, 2), MimeType::Gif),
		(images::bmp(1, 2), MimeType::Bmp),
	];

	for (data, mime_type) in cases {
		assert_eq!(MimeType::sniff(&data), Some(mime_type));
		assert_dimensions(PictureInformation::sniff(&data), 1, 2);
	}

	// Known, but never inspected
	assert_eq!(MimeType::sniff(b"II*\0\x08\0\0\0"), Some(MimeType::Tiff));
	assert_eq!(
		PictureInformation::sniff(b"II*\0\x08\0\0\0"),
		PictureInformation::default()
	);
}

#[test_log::test]
fn truncated_header_sniffs_as_unknown() {
	let data = images::png(1, 1, 6);
	assert_eq!(
		PictureInformation::sniff(&data[..20]),
		PictureInformation::default()
	);
}

#[test_log::test]
fn from_bytes() {
	let picture = Picture::from_bytes(images::jpeg(30, 20)).unwrap();
	assert_eq!(picture.mime_type(), Some(&MimeType::Jpeg));
	assert_eq!(picture.pic_type(), PictureType::Other);
	assert_eq!((picture.width(), picture.height()), (30, 20));

	let err = Picture::from_bytes(b"plain text".to_vec()).unwrap_err();
	assert!(matches!(err.kind(), ErrorKind::NotAPicture));
}

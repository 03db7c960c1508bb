use crate::util::{self, audio, flac_with_comments, mp4, mpeg, open, temp_path, text_frame};

use audiotags::config::{ParseOptions, PictureMode, WriteOptions};
use audiotags::error::ErrorKind;
use audiotags::file::{AudioFile, FileType};
use audiotags::picture::{MimeType, PictureType};

#[test_log::test]
fn random_bytes_are_unrecognized() {
	// xorshift64, so every run sees the same inputs
	let mut state = 0x9E37_79B9_7F4A_7C15_u64;
	let mut next = move || {
		state ^= state << 13;
		state ^= state >> 7;
		state ^= state << 17;
		state.to_le_bytes()
	};

	let unrecognized = |bytes: Vec<u8>| {
		let err = AudioFile::open_from_memory(bytes.clone(), ParseOptions::new()).unwrap_err();
		assert!(
			matches!(err.kind(), ErrorKind::UnrecognizedFormat),
			"{bytes:?}: {err}"
		);
	};

	for _ in 0..10_000 {
		let mut bytes = next().to_vec();
		bytes.extend(next());
		bytes.truncate(10);
		unrecognized(bytes);
	}

	// A plausible frame header with no room for its frame
	unrecognized(vec![190, 207, 166, 255, 244, 163, 112, 24, 82, 234]);
	unrecognized(Vec::new());
}

#[test_log::test]
fn extension_is_ignored() {
	let (_dir, path) = temp_path("actually_flac.mp3", &flac_with_comments(&[("ARTIST", "Foo")]));

	let file = AudioFile::open_from_path(&path, ParseOptions::new()).unwrap();
	assert_eq!(file.file_type().unwrap(), FileType::Flac);
}

#[test_log::test]
fn missing_file() {
	let dir = tempfile::tempdir().unwrap();
	let err = AudioFile::open_from_path(dir.path().join("nothing.flac"), ParseOptions::new())
		.unwrap_err();
	assert!(matches!(err.kind(), ErrorKind::Io(_)));
}

#[test_log::test]
fn closed_handle() {
	let mut file = open(flac_with_comments(&[("ARTIST", "Foo")]));
	assert!(file.is_open());

	file.close();
	file.close();
	assert!(!file.is_open());

	let invalid = |kind: &ErrorKind| matches!(kind, ErrorKind::InvalidHandle);
	assert!(invalid(file.read_properties().unwrap_err().kind()));
	assert!(invalid(file.read_audio_properties().unwrap_err().kind()));
	assert!(invalid(file.read_picture().unwrap_err().kind()));
	assert!(invalid(file.clear_properties().unwrap_err().kind()));
	assert!(invalid(
		file.write_properties([("TITLE", "Bar")], WriteOptions::default())
			.unwrap_err()
			.kind()
	));
	assert!(invalid(
		file.write_picture(util::png(1, 1), 0, 0, None, WriteOptions::default())
			.unwrap_err()
			.kind()
	));
	assert!(invalid(
		file.remove_pictures(WriteOptions::default())
			.unwrap_err()
			.kind()
	));
	assert!(invalid(file.into_bytes().unwrap_err().kind()));
}

#[test_log::test]
fn nothing_pending_is_a_no_op() {
	let bytes = mpeg(Some(util::id3v2(&[text_frame(b"TPE1", "Foo")], 0)), None);

	let mut file = open(bytes.clone());
	file.save(WriteOptions::default()).unwrap();
	file.write_properties([("ARTIST", "Foo")], WriteOptions::default())
		.unwrap();
	assert_eq!(file.bytes().unwrap(), bytes);
}

fn save_to_path(atomic_save: bool) {
	let (dir, path) = temp_path("song.m4a", &mp4(Some(&[]), 0));

	let mut file = AudioFile::open_from_path(&path, ParseOptions::new()).unwrap();
	let audio_before = audio(&file);
	file.write_properties(
		[("ARTIST", "Foo")],
		WriteOptions::new().atomic_save(atomic_save),
	)
	.unwrap();

	let committed = file.bytes().unwrap().to_vec();
	assert_eq!(std::fs::read(&path).unwrap(), committed);

	file.write_properties(
		[("TITLE", "Bar")],
		WriteOptions::new().atomic_save(atomic_save),
	)
	.unwrap();
	file.close();

	let file = AudioFile::open_from_path(&path, ParseOptions::new()).unwrap();
	assert_eq!(
		file.read_properties().unwrap(),
		util::pairs(&[("ARTIST", "Foo"), ("TITLE", "Bar")])
	);
	assert_eq!(audio(&file), audio_before);

	// No temporary files are left behind
	assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[test_log::test]
fn atomic_save() {
	save_to_path(true);
}

#[test_log::test]
fn non_atomic_save() {
	save_to_path(false);
}

#[test_log::test]
fn in_place_save() {
	let bytes = flac_with_comments(&[("ARTIST", "Foo")]);
	let (_dir, path) = temp_path("song.flac", &bytes);

	let mut file = AudioFile::open_from_path(&path, ParseOptions::new()).unwrap();
	file.write_properties([("ARTIST", "Bar")], WriteOptions::new().atomic_save(false))
		.unwrap();

	let written = std::fs::read(&path).unwrap();
	assert_eq!(written.len(), bytes.len());
	assert_eq!(written, file.bytes().unwrap());
}

#[test_log::test]
fn zero_dimensions_are_sniffed() {
	let mut file = open(flac_with_comments(&[]));
	file.write_picture(util::png(640, 480), 0, 0, None, WriteOptions::default())
		.unwrap();

	let picture = util::reopen(file).read_picture().unwrap().unwrap();
	assert_eq!(picture.width(), 640);
	assert_eq!(picture.height(), 480);
	assert_eq!(picture.mime_type(), Some(&MimeType::Png));
	assert_eq!(picture.pic_type(), PictureType::CoverFront);
}

#[test_log::test]
fn explicit_picture_details() {
	let mut file = open(flac_with_comments(&[]));
	file.write_picture(
		b"not an image".to_vec(),
		10,
		20,
		Some(MimeType::Jpeg),
		WriteOptions::default(),
	)
	.unwrap();

	let picture = util::reopen(file).read_picture().unwrap().unwrap();
	assert_eq!(picture.width(), 10);
	assert_eq!(picture.height(), 20);
	assert_eq!(picture.mime_type(), Some(&MimeType::Jpeg));
}

#[test_log::test]
fn empty_picture() {
	let mut file = open(mpeg(None, None));
	let err = file
		.write_picture(Vec::new(), 0, 0, None, WriteOptions::default())
		.unwrap_err();
	assert!(matches!(err.kind(), ErrorKind::WriteError(_)));
}

#[test_log::test]
fn append_pictures() {
	let options = WriteOptions::new().picture_mode(PictureMode::Append);

	let mut file = open(mpeg(None, None));
	file.write_picture(util::png(1, 1), 0, 0, None, options)
		.unwrap();
	file.write_picture(util::png(2, 2), 0, 0, None, options)
		.unwrap();

	let file = util::reopen(file);
	let pictures = file.pictures().unwrap();
	assert_eq!(pictures.len(), 2);
	assert_eq!(pictures[0].data(), util::png(1, 1));
	assert_eq!(pictures[1].data(), util::png(2, 2));
}

#[test_log::test]
fn properties_leave_pictures_alone() {
	let mut file = open(flac_with_comments(&[("ARTIST", "Foo")]));
	file.write_picture(util::png(1, 1), 0, 0, None, WriteOptions::default())
		.unwrap();

	file.clear_properties().unwrap();
	file.write_properties([("TITLE", "Bar")], WriteOptions::default())
		.unwrap();

	let file = util::reopen(file);
	assert_eq!(
		file.read_properties().unwrap(),
		util::pairs(&[("TITLE", "Bar")])
	);
	assert_eq!(file.pictures().unwrap().len(), 1);
}

fn unread_pictures(bytes: Vec<u8>) {
	let mut file = open(bytes);
	file.write_picture(util::png(1, 1), 0, 0, None, WriteOptions::default())
		.unwrap();
	let bytes = file.into_bytes().unwrap();

	let without_pictures = ParseOptions::new().read_cover_art(false);

	// Appending keeps the pictures that were never read
	let mut file = AudioFile::open_from_memory(bytes.clone(), without_pictures).unwrap();
	assert!(file.pictures().unwrap().is_empty());
	file.write_picture(
		util::png(2, 2),
		0,
		0,
		None,
		WriteOptions::new().picture_mode(PictureMode::Append),
	)
	.unwrap();

	let file = util::reopen(file);
	let pictures = file.pictures().unwrap();
	assert_eq!(pictures.len(), 2);
	assert_eq!(pictures[0].data(), util::png(1, 1));
	assert_eq!(pictures[1].data(), util::png(2, 2));

	// Replacing doesn't
	let mut file = AudioFile::open_from_memory(bytes.clone(), without_pictures).unwrap();
	file.write_picture(util::png(3, 3), 0, 0, None, WriteOptions::default())
		.unwrap();

	let file = util::reopen(file);
	let pictures = file.pictures().unwrap();
	assert_eq!(pictures.len(), 1);
	assert_eq!(pictures[0].data(), util::png(3, 3));

	let mut file = AudioFile::open_from_memory(bytes, without_pictures).unwrap();
	file.remove_pictures(WriteOptions::default()).unwrap();
	assert!(util::reopen(file).pictures().unwrap().is_empty());
}

#[test_log::test]
fn unread_pictures_flac() {
	unread_pictures(flac_with_comments(&[("ARTIST", "Foo")]));
}

#[test_log::test]
fn unread_pictures_mpeg() {
	unread_pictures(mpeg(Some(util::id3v2(&[text_frame(b"TPE1", "Foo")], 0)), None));
}

#[test_log::test]
fn unread_pictures_mp4() {
	unread_pictures(mp4(Some(&[]), 0));
}

use crate::util::{self, audio, id3v1, id3v2, id3v2_frame, mpeg, open, reopen, text_frame};

use audiotags::config::WriteOptions;
use audiotags::dialect::Dialect;
use audiotags::error::ErrorKind;
use audiotags::file::FileType;

fn tagged(frames: &[Vec<u8>]) -> Vec<u8> {
	mpeg(Some(id3v2(frames, 0)), None)
}

fn has_id3v1(bytes: &[u8]) -> bool {
	bytes[bytes.len() - 128..].starts_with(b"TAG")
}

#[test_log::test]
fn read() {
	let file = open(tagged(&[
		text_frame(b"TIT2", "Song"),
		text_frame(b"TPE1", "Foo\0Bar"),
	]));

	assert_eq!(file.file_type().unwrap(), FileType::Mpeg);
	assert_eq!(
		file.read_properties().unwrap(),
		util::pairs(&[("TITLE", "Song"), ("ARTIST", "Foo"), ("ARTIST", "Bar")])
	);
}

#[test_log::test]
fn read_audio_properties() {
	let file = open(mpeg(None, None));
	let properties = file.read_audio_properties().unwrap();

	assert_eq!(properties.sample_rate(), 44100);
	assert_eq!(properties.channels(), 2);
	assert_eq!(properties.audio_bitrate(), 128);
	assert!((500..=530).contains(&properties.duration_ms()));
}

#[test_log::test]
fn read_user_defined_text() {
	let mut txxx = vec![3];
	txxx.extend(b"MOOD\0happy");

	let mut file = open(tagged(&[
		id3v2_frame(b"TXXX", &txxx),
		text_frame(b"TXYZ", "unknown"),
	]));

	assert_eq!(
		file.read_properties().unwrap(),
		util::pairs(&[("MOOD", "happy"), ("ID3V2:TXYZ", "unknown")])
	);

	// Passthrough keys are written back to the same frame
	file.write_properties([("ID3V2:TXYZ", "changed")], WriteOptions::default())
		.unwrap();

	let file = reopen(file);
	assert_eq!(
		file.properties().unwrap().get_first("ID3V2:TXYZ"),
		Some("changed")
	);
	assert_eq!(file.properties().unwrap().get_first("MOOD"), Some("happy"));
}

#[test_log::test]
fn artist_then_title() {
	util::artist_then_title(tagged(&[text_frame(b"TPE1", "Foo")]));
}

#[test_log::test]
fn untagged_file_gets_a_tag() {
	let bytes = mpeg(None, None);
	let original_len = bytes.len();

	let mut file = open(bytes);
	let audio_before = audio(&file);
	file.write_properties([("ARTIST", "Foo")], WriteOptions::default())
		.unwrap();

	let file = reopen(file);
	assert!(file.bytes().unwrap().starts_with(b"ID3"));
	assert!(file.bytes().unwrap().len() > original_len);
	assert_eq!(audio(&file), audio_before);

	util::artist_then_title(file.into_bytes().unwrap());
}

#[test_log::test]
fn multi_value() {
	util::multi_value(tagged(&[text_frame(b"TPE1", "Foo")]), "ARTIST");
}

#[test_log::test]
fn clear_twice() {
	util::clear_twice(tagged(&[
		text_frame(b"TPE1", "Foo"),
		text_frame(b"TIT2", "Bar"),
	]));
}

#[test_log::test]
fn picture_replace() {
	util::picture_replace(tagged(&[text_frame(b"TPE1", "Foo")]));
}

#[test_log::test]
fn private_frames_are_kept() {
	let private = id3v2_frame(b"PRIV", b"owner@example.com\0\x01\x02\x03");
	let mut file = open(tagged(&[private.clone(), text_frame(b"TPE1", "Foo")]));

	file.write_properties([("TITLE", "Bar")], WriteOptions::default())
		.unwrap();
	file.clear_properties().unwrap();
	file.save(WriteOptions::default()).unwrap();

	let file = reopen(file);
	assert!(file.read_properties().unwrap().is_empty());
	assert!(
		file.bytes()
			.unwrap()
			.windows(private.len())
			.any(|w| w == private)
	);
}

#[test_log::test]
fn padding_absorbs_growth() {
	let bytes = mpeg(Some(id3v2(&[text_frame(b"TPE1", "Foo")], 256)), None);
	let original_len = bytes.len();

	let mut file = open(bytes);
	file.write_properties([("TITLE", "Bar")], WriteOptions::default())
		.unwrap();

	assert_eq!(file.bytes().unwrap().len(), original_len);
	assert_eq!(file.properties().unwrap().title(), Some("Bar"));
}

#[test_log::test]
fn id3v1_and_id3v2() {
	let bytes = mpeg(
		Some(id3v2(&[text_frame(b"TPE1", "Foo")], 0)),
		Some(id3v1("Old", "Foo")),
	);

	let mut file = open(bytes);
	let blocks = file.model().unwrap().blocks();
	assert!(blocks.iter().any(|b| b.dialect() == Dialect::Id3v2));
	assert!(blocks.iter().any(|b| b.dialect() == Dialect::Id3v1));

	// ID3v2 takes precedence, ID3v1 fills in what's missing
	assert_eq!(
		file.read_properties().unwrap(),
		util::pairs(&[("ARTIST", "Foo"), ("TITLE", "Old")])
	);

	let audio_before = audio(&file);
	file.write_properties([("TITLE", "New")], WriteOptions::default())
		.unwrap();

	let file = reopen(file);
	assert_eq!(file.properties().unwrap().title(), Some("New"));
	assert_eq!(audio(&file), audio_before);

	// Both tags are kept in sync
	let bytes = file.bytes().unwrap();
	assert!(has_id3v1(bytes));
	assert_eq!(&bytes[bytes.len() - 125..bytes.len() - 122], b"New");
}

#[test_log::test]
fn strip_legacy_tags() {
	let bytes = mpeg(
		Some(id3v2(&[text_frame(b"TPE1", "Foo")], 0)),
		Some(id3v1("Old", "Foo")),
	);

	let mut file = open(bytes);
	file.write_properties(
		[("TITLE", "New")],
		WriteOptions::new().strip_legacy_tags(true),
	)
	.unwrap();

	let file = reopen(file);
	assert!(!has_id3v1(file.bytes().unwrap()));
	assert!(
		!file
			.model()
			.unwrap()
			.blocks()
			.iter()
			.any(|b| b.dialect() == Dialect::Id3v1)
	);
	assert_eq!(
		file.read_properties().unwrap(),
		util::pairs(&[("ARTIST", "Foo"), ("TITLE", "New")])
	);
}

#[test_log::test]
fn latin1_only() {
	let mut file = open(tagged(&[text_frame(b"TPE1", "Foo")]));
	let before = file.bytes().unwrap().to_vec();

	let err = file
		.write_properties(
			[("TITLE", "\u{65e5}\u{672c}")],
			WriteOptions::new().unicode_text(false),
		)
		.unwrap_err();
	assert!(matches!(err.kind(), ErrorKind::EncodingError(_)));

	// Nothing was committed, the edit is still pending
	assert_eq!(file.bytes().unwrap(), before);
	assert_eq!(file.properties().unwrap().title(), Some("\u{65e5}\u{672c}"));

	// Latin-1 text is fine
	file.write_properties(
		[("TITLE", "Caf\u{e9}")],
		WriteOptions::new().unicode_text(false),
	)
	.unwrap();

	let file = reopen(file);
	assert_eq!(file.properties().unwrap().title(), Some("Caf\u{e9}"));
}

#[test_log::test]
fn id3v23() {
	let mut file = open(tagged(&[text_frame(b"TPE1", "Foo")]));
	file.write_properties(
		[("TITLE", "\u{65e5}\u{672c}")],
		WriteOptions::new().use_id3v23(true),
	)
	.unwrap();

	let file = reopen(file);
	assert_eq!(&file.bytes().unwrap()[..4], b"ID3\x03");
	assert_eq!(
		file.read_properties().unwrap(),
		util::pairs(&[("ARTIST", "Foo"), ("TITLE", "\u{65e5}\u{672c}")])
	);
}

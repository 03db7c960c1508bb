use crate::util::{self, atom, audio, ilst_item, mp4, open, reopen};

use audiotags::config::{ParseOptions, WriteOptions};
use audiotags::dialect::Dialect;
use audiotags::error::ErrorKind;
use audiotags::file::{AudioFile, FileType};

fn text(ident: &[u8; 4], value: &str) -> Vec<u8> {
	ilst_item(ident, 1, value.as_bytes())
}

fn freeform(name: &str, value: &str) -> Vec<u8> {
	let mut content = atom(b"mean", &[&[0; 4], b"com.apple.iTunes".as_slice()].concat());
	content.extend(atom(b"name", &[&[0; 4], name.as_bytes()].concat()));

	let mut data = 1_u32.to_be_bytes().to_vec();
	data.extend([0; 4]);
	data.extend(value.as_bytes());
	content.extend(atom(b"data", &data));

	atom(b"----", &content)
}

// The chunk offset of the first `stco` entry
fn chunk_offset(bytes: &[u8]) -> u32 {
	let pos = bytes.windows(4).position(|w| w == b"stco").unwrap();
	let entry = pos + 12;
	u32::from_be_bytes(bytes[entry..entry + 4].try_into().unwrap())
}

#[test_log::test]
fn read() {
	let file = open(mp4(
		Some(&[
			text(b"\xa9nam", "Song"),
			text(b"\xa9ART", "Foo"),
			ilst_item(b"trkn", 0, &[0, 0, 0, 3, 0, 12, 0, 0]),
			freeform("MusicBrainz Track Id", "abc"),
			text(b"\xa9st3", "passthrough"),
		]),
		0,
	));

	assert_eq!(file.file_type().unwrap(), FileType::Mp4);
	assert_eq!(
		file.read_properties().unwrap(),
		util::pairs(&[
			("TITLE", "Song"),
			("ARTIST", "Foo"),
			("TRACKNUMBER", "3/12"),
			("MUSICBRAINZ_TRACKID", "abc"),
			("MP4:\u{a9}ST3", "passthrough"),
		])
	);
}

#[test_log::test]
fn read_audio_properties() {
	let file = open(mp4(None, 0));
	let properties = file.read_audio_properties().unwrap();

	assert_eq!(properties.sample_rate(), 44100);
	assert_eq!(properties.channels(), 2);
	assert_eq!(properties.duration_ms(), 2000);
}

#[test_log::test]
fn artist_then_title() {
	util::artist_then_title(mp4(Some(&[text(b"\xa9ART", "Foo")]), 0));
}

#[test_log::test]
fn untagged_file_gets_a_tag() {
	let bytes = mp4(None, 0);
	let offset_before = chunk_offset(&bytes);

	let mut file = open(bytes);
	let audio_before = audio(&file);
	file.write_properties([("ARTIST", "Foo")], WriteOptions::default())
		.unwrap();

	let file = reopen(file);
	assert!(
		file.model()
			.unwrap()
			.blocks()
			.iter()
			.any(|b| b.dialect() == Dialect::Mp4Ilst)
	);
	assert_eq!(audio(&file), audio_before);

	// `moov` grew in front of `mdat`
	let offset_after = chunk_offset(file.bytes().unwrap());
	assert!(offset_after > offset_before);
	assert_eq!(u64::from(offset_after), file.model().unwrap().audio().offset());

	util::artist_then_title(file.into_bytes().unwrap());
}

#[test_log::test]
fn multi_value() {
	util::multi_value(mp4(Some(&[text(b"\xa9ART", "Foo")]), 0), "ARTIST");
}

#[test_log::test]
fn clear_twice() {
	util::clear_twice(mp4(
		Some(&[text(b"\xa9ART", "Foo"), text(b"\xa9nam", "Bar")]),
		0,
	));
}

#[test_log::test]
fn picture_replace() {
	util::picture_replace(mp4(Some(&[text(b"\xa9ART", "Foo")]), 0));
}

#[test_log::test]
fn binary_items_are_kept() {
	// An 8 byte integer, which isn't exposed as a property
	let playlist_id = ilst_item(b"plID", 21, &[0, 0, 0, 0, 0x12, 0x34, 0x56, 0x78]);
	let mut file = open(mp4(
		Some(&[playlist_id.clone(), text(b"\xa9ART", "Foo")]),
		0,
	));

	assert_eq!(
		file.read_properties().unwrap(),
		util::pairs(&[("ARTIST", "Foo")])
	);

	file.write_properties([("TITLE", "Bar")], WriteOptions::default())
		.unwrap();
	file.clear_properties().unwrap();
	file.save(WriteOptions::default()).unwrap();

	let file = reopen(file);
	assert!(file.read_properties().unwrap().is_empty());
	assert!(
		file.bytes()
			.unwrap()
			.windows(playlist_id.len())
			.any(|w| w == playlist_id)
	);
}

#[test_log::test]
fn padding_absorbs_growth() {
	let bytes = mp4(Some(&[text(b"\xa9ART", "Foo")]), 512);
	let original_len = bytes.len();
	let offset_before = chunk_offset(&bytes);

	let mut file = open(bytes);
	file.write_properties([("TITLE", "Bar")], WriteOptions::default())
		.unwrap();

	let bytes = file.bytes().unwrap();
	assert_eq!(bytes.len(), original_len);
	assert_eq!(chunk_offset(bytes), offset_before);
	assert_eq!(file.properties().unwrap().title(), Some("Bar"));
}

#[test_log::test]
fn track_number() {
	let mut file = open(mp4(Some(&[]), 0));
	file.write_properties(
		[("TRACKNUMBER", "5/10"), ("DISCNUMBER", "1")],
		WriteOptions::default(),
	)
	.unwrap();

	let mut file = reopen(file);
	assert_eq!(file.properties().unwrap().track_number(), Some("5/10"));
	assert_eq!(
		file.properties().unwrap().get_first("DISCNUMBER"),
		Some("1")
	);

	let err = file
		.write_properties([("TRACKNUMBER", "five")], WriteOptions::default())
		.unwrap_err();
	assert!(matches!(err.kind(), ErrorKind::EncodingError(_)));

	// `trkn` holds one number/total pair
	let err = file
		.write_properties(
			[("TRACKNUMBER", "1"), ("TRACKNUMBER", "2")],
			WriteOptions::default(),
		)
		.unwrap_err();
	let ErrorKind::EncodingError(encoding) = err.kind() else {
		panic!("expected an encoding error, got {err}");
	};
	assert_eq!(encoding.key(), "TRACKNUMBER");
	assert_eq!(encoding.value(), "2");
}

#[test_log::test]
fn truncated_atom() {
	let mut bytes = mp4(Some(&[text(b"\xa9ART", "Foo")]), 0);
	// `mdat` claims its 1000 bytes, only half of them are left
	bytes.truncate(bytes.len() - 500);

	let err = AudioFile::open_from_memory(bytes, ParseOptions::new()).unwrap_err();
	assert!(err.is_truncated_input());
}

use crate::util::{
	self, FLAC_BLOCK_APPLICATION, FLAC_BLOCK_PADDING, FLAC_BLOCK_VORBIS_COMMENT, audio, flac,
	flac_with_comments, open, reopen, vorbis_comments,
};

use audiotags::config::{ParseOptions, ParsingMode, WriteOptions};
use audiotags::dialect::Dialect;
use audiotags::file::{AudioFile, FileType};
use audiotags::picture::{Picture, PictureType};

#[test_log::test]
fn read() {
	let file = open(flac_with_comments(&[
		("TITLE", "Song"),
		("artist", "Foo"),
		("ARTIST", "Bar"),
	]));

	assert_eq!(file.file_type().unwrap(), FileType::Flac);
	assert_eq!(
		file.read_properties().unwrap(),
		util::pairs(&[("TITLE", "Song"), ("ARTIST", "Foo"), ("ARTIST", "Bar")])
	);
	assert_eq!(file.properties().unwrap().artist(), Some("Foo"));
}

#[test_log::test]
fn read_audio_properties() {
	let file = open(flac(&[]));
	let properties = file.read_audio_properties().unwrap();

	assert_eq!(properties.sample_rate(), 44100);
	assert_eq!(properties.channels(), 2);
	assert_eq!(properties.bit_depth(), Some(16));
	assert_eq!(properties.duration_ms(), 2000);
}

#[test_log::test]
fn read_no_properties() {
	let file = open(flac(&[]));
	assert!(file.read_properties().unwrap().is_empty());
	assert!(file.read_picture().unwrap().is_none());
}

#[test_log::test]
fn artist_then_title() {
	util::artist_then_title(flac_with_comments(&[("ARTIST", "Foo")]));
}

#[test_log::test]
fn artist_then_title_without_comments() {
	let mut file = open(flac(&[]));
	file.write_properties([("ARTIST", "Foo")], WriteOptions::default())
		.unwrap();

	util::artist_then_title(file.into_bytes().unwrap());
}

#[test_log::test]
fn multi_value() {
	util::multi_value(flac_with_comments(&[("ARTIST", "Foo")]), "ARTIST");
}

#[test_log::test]
fn clear_twice() {
	util::clear_twice(flac_with_comments(&[("ARTIST", "Foo"), ("TITLE", "Bar")]));
}

#[test_log::test]
fn picture_replace() {
	util::picture_replace(flac_with_comments(&[("ARTIST", "Foo")]));
}

#[test_log::test]
fn picture_blocks() {
	let picture = Picture::unchecked(util::png(3, 4))
		.pic_type(PictureType::CoverBack)
		.description("back")
		.build();

	let file = open(flac(&[
		(FLAC_BLOCK_VORBIS_COMMENT, vorbis_comments(&[("TITLE", "Song")])),
		(6, picture.as_flac_bytes(false)),
	]));

	let read = file.read_picture().unwrap().unwrap();
	assert_eq!(read.pic_type(), PictureType::CoverBack);
	assert_eq!(read.description(), "back");
	assert_eq!(read.data(), util::png(3, 4));

	// Pictures aren't properties
	assert_eq!(
		file.read_properties().unwrap(),
		util::pairs(&[("TITLE", "Song")])
	);
}

#[test_log::test]
fn pictures_not_read() {
	let picture = Picture::unchecked(util::png(3, 4)).build();
	let bytes = flac(&[(6, picture.as_flac_bytes(false))]);

	let file =
		AudioFile::open_from_memory(bytes, ParseOptions::new().read_cover_art(false)).unwrap();
	assert!(file.read_picture().unwrap().is_none());

	// The block is still located
	let blocks = file.model().unwrap().blocks();
	assert!(blocks.iter().any(|b| b.dialect() == Dialect::FlacPicture));
}

#[test_log::test]
fn unknown_blocks_are_kept() {
	let application = b"TEST\x01\x02\x03\x04\x05".to_vec();
	let mut file = open(flac(&[
		(FLAC_BLOCK_APPLICATION, application.clone()),
		(FLAC_BLOCK_VORBIS_COMMENT, vorbis_comments(&[("ARTIST", "Foo")])),
	]));

	file.write_properties([("TITLE", "A much longer title than before")], WriteOptions::default())
		.unwrap();
	file.clear_properties().unwrap();
	file.save(WriteOptions::default()).unwrap();

	let file = reopen(file);
	let model = file.model().unwrap();
	let block = model
		.blocks()
		.iter()
		.find(|b| b.dialect() == Dialect::FlacOther(FLAC_BLOCK_APPLICATION))
		.unwrap();

	let start = block.offset() as usize + 4;
	assert_eq!(block.len() as usize, application.len() + 4);
	assert_eq!(&file.bytes().unwrap()[start..start + application.len()], application);
}

#[test_log::test]
fn padding_absorbs_growth() {
	let bytes = flac(&[
		(FLAC_BLOCK_VORBIS_COMMENT, vorbis_comments(&[("ARTIST", "Foo")])),
		(FLAC_BLOCK_PADDING, vec![0; 512]),
	]);
	let original_len = bytes.len();

	let mut file = open(bytes);
	let audio_before = audio(&file);
	file.write_properties([("TITLE", "Bar")], WriteOptions::default())
		.unwrap();

	assert_eq!(file.bytes().unwrap().len(), original_len);
	assert_eq!(audio(&file), audio_before);
}

#[test_log::test]
fn growth_uses_preferred_padding() {
	let mut file = open(flac_with_comments(&[("ARTIST", "Foo")]));
	let original_len = file.bytes().unwrap().len();

	file.write_properties(
		[("TITLE", "Bar")],
		WriteOptions::new().preferred_padding(100),
	)
	.unwrap();

	let model = file.model().unwrap();
	let padding = model
		.blocks()
		.iter()
		.find(|b| b.dialect() == Dialect::FlacOther(FLAC_BLOCK_PADDING))
		.unwrap();

	assert_eq!(padding.len(), 104);
	assert!(file.bytes().unwrap().len() > original_len);
}

#[test_log::test]
fn truncated_block() {
	let mut bytes = flac_with_comments(&[("ARTIST", "Foo"), ("TITLE", "Bar")]);
	// Cut into the comment block
	bytes.truncate(4 + 38 + 10);

	let err = AudioFile::open_from_memory(bytes, ParseOptions::new()).unwrap_err();
	assert!(err.is_truncated_input());
}

#[test_log::test]
fn second_comment_block() {
	let bytes = flac(&[
		(FLAC_BLOCK_VORBIS_COMMENT, vorbis_comments(&[("ARTIST", "Foo")])),
		(FLAC_BLOCK_VORBIS_COMMENT, vorbis_comments(&[("ARTIST", "Bar")])),
	]);

	assert!(
		AudioFile::open_from_memory(
			bytes.clone(),
			ParseOptions::new().parsing_mode(ParsingMode::Strict)
		)
		.is_err()
	);

	// The first block wins, the second is retained as-is
	let file = open(bytes);
	assert_eq!(file.properties().unwrap().artist(), Some("Foo"));
	assert_eq!(
		file.model()
			.unwrap()
			.blocks()
			.iter()
			.filter(|b| b.dialect() == Dialect::VorbisComments)
			.count(),
		2
	);
}

//! Synthetic fixtures
//!
//! Every file is built in memory, with just enough structure for its container to be parsed.

use audiotags::config::{ParseOptions, WriteOptions};
use audiotags::file::AudioFile;

use std::path::PathBuf;

use tempfile::TempDir;

/// Write `bytes` to a file in a new temporary directory
pub fn temp_path(name: &str, bytes: &[u8]) -> (TempDir, PathBuf) {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join(name);
	std::fs::write(&path, bytes).unwrap();

	(dir, path)
}

/// The bytes of the audio region of `file`
pub fn audio(file: &AudioFile) -> Vec<u8> {
	let audio = file.model().unwrap().audio();
	let start = audio.offset() as usize;
	file.bytes().unwrap()[start..start + audio.len() as usize].to_vec()
}

pub fn open(bytes: Vec<u8>) -> AudioFile {
	AudioFile::open_from_memory(bytes, ParseOptions::new()).unwrap()
}

/// Save `file`, and parse the committed bytes with a fresh handle
pub fn reopen(file: AudioFile) -> AudioFile {
	open(file.into_bytes().unwrap())
}

pub fn pairs(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
	pairs
		.iter()
		.map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
		.collect()
}

// ---- FLAC ----

pub const FLAC_BLOCK_PADDING: u8 = 1;
pub const FLAC_BLOCK_APPLICATION: u8 = 2;
pub const FLAC_BLOCK_VORBIS_COMMENT: u8 = 4;

/// 2 seconds of 44.1 kHz, 16-bit stereo
fn stream_info() -> Vec<u8> {
	let mut content = vec![0x10, 0x00, 0x10, 0x00, 0, 0, 0, 0, 0, 0];
	content.extend(((44100_u32 << 12) | (1 << 9) | (15 << 4)).to_be_bytes());
	content.extend(88200_u32.to_be_bytes());
	content.extend([0; 16]);
	content
}

fn flac_block(out: &mut Vec<u8>, ty: u8, last: bool, content: &[u8]) {
	out.push(if last { ty | 0x80 } else { ty });
	out.extend(&(content.len() as u32).to_be_bytes()[1..]);
	out.extend(content);
}

pub fn vorbis_comments(items: &[(&str, &str)]) -> Vec<u8> {
	let mut content = Vec::new();
	content.extend(9_u32.to_le_bytes());
	content.extend(b"reference");
	content.extend((items.len() as u32).to_le_bytes());

	for (key, value) in items {
		let field = format!("{key}={value}");
		content.extend((field.len() as u32).to_le_bytes());
		content.extend(field.as_bytes());
	}

	content
}

/// A FLAC stream with STREAMINFO, then `blocks`, then 256 bytes of "audio"
pub fn flac(blocks: &[(u8, Vec<u8>)]) -> Vec<u8> {
	let mut bytes = b"fLaC".to_vec();
	flac_block(&mut bytes, 0, blocks.is_empty(), &stream_info());

	for (idx, (ty, content)) in blocks.iter().enumerate() {
		flac_block(&mut bytes, *ty, idx == blocks.len() - 1, content);
	}

	bytes.extend((0..=255).map(|b: u8| b ^ 0x5A));
	bytes
}

/// A FLAC stream with a single Vorbis comment block
pub fn flac_with_comments(items: &[(&str, &str)]) -> Vec<u8> {
	flac(&[(FLAC_BLOCK_VORBIS_COMMENT, vorbis_comments(items))])
}

// ---- MPEG ----

// MPEG-1 Layer 3, 128 kbps, 44.1 kHz, joint stereo
const FRAME_HEADER: [u8; 4] = [0xFF, 0xFB, 0x90, 0x64];
const FRAME_LEN: usize = 417;

fn synchsafe(n: u32) -> [u8; 4] {
	[
		((n >> 21) & 0x7F) as u8,
		((n >> 14) & 0x7F) as u8,
		((n >> 7) & 0x7F) as u8,
		(n & 0x7F) as u8,
	]
}

/// An ID3v2.4 frame
pub fn id3v2_frame(id: &[u8; 4], content: &[u8]) -> Vec<u8> {
	let mut frame = id.to_vec();
	frame.extend(synchsafe(content.len() as u32));
	frame.extend([0, 0]);
	frame.extend(content);
	frame
}

/// A UTF-8 ID3v2.4 text frame
pub fn text_frame(id: &[u8; 4], text: &str) -> Vec<u8> {
	let mut content = vec![3];
	content.extend(text.as_bytes());
	id3v2_frame(id, &content)
}

/// An ID3v2.4 tag holding `frames`, followed by `padding` zero bytes
pub fn id3v2(frames: &[Vec<u8>], padding: usize) -> Vec<u8> {
	let content_len = frames.iter().map(Vec::len).sum::<usize>() + padding;

	let mut tag = b"ID3\x04\x00\x00".to_vec();
	tag.extend(synchsafe(content_len as u32));
	for frame in frames {
		tag.extend(frame);
	}
	tag.extend(std::iter::repeat_n(0, padding));
	tag
}

/// A 128 byte ID3v1 tag
pub fn id3v1(title: &str, artist: &str) -> Vec<u8> {
	fn field(out: &mut Vec<u8>, value: &str, len: usize) {
		let start = out.len();
		out.extend(value.as_bytes());
		out.resize(start + len, 0);
	}

	let mut tag = b"TAG".to_vec();
	field(&mut tag, title, 30);
	field(&mut tag, artist, 30);
	field(&mut tag, "", 30);
	field(&mut tag, "", 4);
	field(&mut tag, "", 30);
	// No genre
	tag.push(255);
	tag
}

/// 20 frames of silence, optionally surrounded by tags
pub fn mpeg(id3v2: Option<Vec<u8>>, id3v1: Option<Vec<u8>>) -> Vec<u8> {
	let mut bytes = id3v2.unwrap_or_default();

	for idx in 0..20_u8 {
		bytes.extend(FRAME_HEADER);
		let mut frame = vec![0; FRAME_LEN - FRAME_HEADER.len()];
		// Keep the frames distinguishable, away from any VBR header
		frame[100] = idx;
		bytes.extend(frame);
	}

	if let Some(id3v1) = id3v1 {
		bytes.extend(id3v1);
	}

	bytes
}

// ---- MP4 ----

pub fn atom(ident: &[u8; 4], content: &[u8]) -> Vec<u8> {
	let mut atom = ((content.len() + 8) as u32).to_be_bytes().to_vec();
	atom.extend(ident);
	atom.extend(content);
	atom
}

/// An `ilst` item holding one `data` atom
pub fn ilst_item(ident: &[u8; 4], code: u32, content: &[u8]) -> Vec<u8> {
	let mut data = code.to_be_bytes().to_vec();
	data.extend([0; 4]);
	data.extend(content);
	atom(ident, &atom(b"data", &data))
}

/// An M4A file with one 2 second AAC track and 1000 bytes of `mdat`
///
/// With `items` of `None`, there is no `udta` at all.
pub fn mp4(items: Option<&[Vec<u8>]>, padding: usize) -> Vec<u8> {
	let ftyp = atom(b"ftyp", b"M4A \0\0\0\0M4A mp42isom");

	let moov = |chunk_offset: u32| {
		let mut mdhd = vec![0; 12];
		mdhd.extend(44100_u32.to_be_bytes());
		mdhd.extend(88200_u32.to_be_bytes());
		mdhd.extend([0; 4]);

		let mut hdlr = vec![0; 8];
		hdlr.extend(b"soun");
		hdlr.extend([0; 13]);

		let mut mp4a = vec![0; 16];
		mp4a.extend(2_u16.to_be_bytes());
		mp4a.extend(16_u16.to_be_bytes());
		mp4a.extend([0; 4]);
		mp4a.extend(44100_u16.to_be_bytes());
		mp4a.extend([0; 2]);

		let mut stsd = vec![0, 0, 0, 0, 0, 0, 0, 1];
		stsd.extend(atom(b"mp4a", &mp4a));

		let mut stco = vec![0, 0, 0, 0, 0, 0, 0, 1];
		stco.extend(chunk_offset.to_be_bytes());

		let stbl = atom(b"stbl", &[atom(b"stsd", &stsd), atom(b"stco", &stco)].concat());
		let mdia = [
			atom(b"mdhd", &mdhd),
			atom(b"hdlr", &hdlr),
			atom(b"minf", &stbl),
		]
		.concat();

		let mut content = atom(b"trak", &atom(b"mdia", &mdia));

		if let Some(items) = items {
			let mut hdlr = vec![0; 8];
			hdlr.extend(b"mdirappl");
			hdlr.extend([0; 9]);

			let mut meta = vec![0; 4];
			meta.extend(atom(b"hdlr", &hdlr));
			meta.extend(atom(b"ilst", &items.concat()));
			if padding >= 8 {
				meta.extend(atom(b"free", &vec![0; padding - 8]));
			}

			content.extend(atom(b"udta", &atom(b"meta", &meta)));
		}

		atom(b"moov", &content)
	};

	let chunk_offset = (ftyp.len() + moov(0).len() + 8) as u32;
	let audio = (0..1000_u32).map(|i| (i % 251) as u8).collect::<Vec<_>>();

	[ftyp, moov(chunk_offset), atom(b"mdat", &audio)].concat()
}

/// The scenario every format has to pass
///
/// `bytes` holds `ARTIST=Foo` and nothing else. Writing `TITLE=Bar` keeps the artist, and the
/// committed bytes reproduce both pairs.
pub fn artist_then_title(bytes: Vec<u8>) {
	let mut file = open(bytes);
	assert_eq!(file.read_properties().unwrap(), self::pairs(&[("ARTIST", "Foo")]));

	let audio_before = audio(&file);
	file.write_properties([("TITLE", "Bar")], WriteOptions::default())
		.unwrap();

	let expected = self::pairs(&[("ARTIST", "Foo"), ("TITLE", "Bar")]);
	assert_eq!(file.read_properties().unwrap(), expected);
	assert_eq!(audio(&file), audio_before);

	let file = reopen(file);
	assert_eq!(file.read_properties().unwrap(), expected);
	assert_eq!(audio(&file), audio_before);
}

/// Setting `["a", "b", "c"]` survives a save
pub fn multi_value(bytes: Vec<u8>, key: &str) {
	let mut file = open(bytes);
	file.write_properties([(key, "a"), (key, "b"), (key, "c")], WriteOptions::default())
		.unwrap();

	let file = reopen(file);
	let values = file.properties().unwrap().get(key).unwrap().to_vec();
	assert_eq!(values, ["a", "b", "c"]);
}

/// Clearing twice is the same as clearing once, and the result is saved as empty
pub fn clear_twice(bytes: Vec<u8>) {
	let mut file = open(bytes);

	file.clear_properties().unwrap();
	let once = file.read_properties().unwrap();
	file.clear_properties().unwrap();
	assert_eq!(file.read_properties().unwrap(), once);
	assert!(once.is_empty());

	file.save(WriteOptions::default()).unwrap();
	let saved = file.bytes().unwrap().to_vec();

	let mut file = reopen(file);
	assert!(file.read_properties().unwrap().is_empty());

	// Nothing left to clear
	file.clear_properties().unwrap();
	file.save(WriteOptions::default()).unwrap();
	assert_eq!(file.bytes().unwrap(), saved);
}

/// Picture A then picture B leaves only B, removing leaves nothing
pub fn picture_replace(bytes: Vec<u8>) {
	let mut file = open(bytes);
	let audio_before = audio(&file);

	file.write_picture(png(1, 1), 0, 0, None, WriteOptions::default())
		.unwrap();
	file.write_picture(png(2, 2), 0, 0, None, WriteOptions::default())
		.unwrap();

	let mut file = reopen(file);
	let pictures = file.pictures().unwrap();
	assert_eq!(pictures.len(), 1);
	assert_eq!(pictures[0].data(), png(2, 2));

	file.remove_pictures(WriteOptions::default()).unwrap();

	let file = reopen(file);
	assert!(file.pictures().unwrap().is_empty());
	assert!(file.read_picture().unwrap().is_none());
	assert_eq!(audio(&file), audio_before);
}

/// The smallest PNG header the dimension sniffer accepts
pub fn png(width: u32, height: u32) -> Vec<u8> {
	let mut png = b"\x89PNG\r\n\x1a\n".to_vec();
	png.extend(13_u32.to_be_bytes());
	png.extend(b"IHDR");
	png.extend(width.to_be_bytes());
	png.extend(height.to_be_bytes());
	// Bit depth, color type, compression, filter, interlace
	png.extend([8, 6, 0, 0, 0]);
	// CRC
	png.extend([0; 4]);
	png
}

//! ID3 specific items
//!
//! MPEG files carry ID3v2 tags at their start, and optionally a legacy ID3v1 tag at their end.
//! FLAC files may also begin with an ID3v2 tag, which is retained but never used.

pub mod v1;
pub mod v2;

use crate::error::Result;
use crate::macros::{decode_err, truncated_err, try_vec};
use v1::constants::ID3V1_TAG_MARKER;
use v2::Id3v2Header;

use std::io::{Read, Seek, SeekFrom};

/// Look for a Lyrics3v2 block ending at the current position
///
/// On success, the reader is left at the start of the block and its full size is returned.
pub(crate) fn find_lyrics3v2<R>(data: &mut R) -> Result<Option<u32>>
where
	R: Read + Seek,
{
	log::debug!("Searching for a Lyrics3v2 tag");

	if data.stream_position()? < 15 {
		return Ok(None);
	}

	data.seek(SeekFrom::Current(-15))?;

	let mut footer = [0; 15];
	data.read_exact(&mut footer)?;

	if &footer[6..] != b"LYRICS200" {
		return Ok(None);
	}

	log::debug!("Found a Lyrics3v2 tag, it will be retained as-is");

	// The size covers everything but the footer itself
	let lyrics_size = std::str::from_utf8(&footer[..6])
		.ok()
		.and_then(|size| size.parse::<u32>().ok())
		.ok_or_else(|| decode_err!(Mpeg, "Lyrics3v2 tag has an invalid size string"))?;

	let size = lyrics_size + 15;
	if u64::from(size) > data.stream_position()? {
		truncated_err!(@BAIL Mpeg, "Lyrics3v2 size exceeds the file");
	}

	data.seek(SeekFrom::Current(-i64::from(size)))?;
	Ok(Some(size))
}

/// Look for a 128 byte ID3v1 tag at the end of the reader
///
/// The reader is left at the start of the tag if one was found, otherwise at the end.
pub(crate) fn find_id3v1<R>(data: &mut R) -> Result<Option<v1::Id3v1Tag>>
where
	R: Read + Seek,
{
	log::debug!("Searching for an ID3v1 tag");

	// Reader is too small to contain an ID3v1 tag
	if data.seek(SeekFrom::End(-128)).is_err() {
		data.seek(SeekFrom::End(0))?;
		return Ok(None);
	}

	let mut id3v1 = [0; 128];
	data.read_exact(&mut id3v1)?;

	// No ID3v1 tag found
	if id3v1[..3] != ID3V1_TAG_MARKER {
		return Ok(None);
	}

	log::debug!("Found an ID3v1 tag");
	data.seek(SeekFrom::End(-128))?;

	Ok(Some(v1::read::parse_id3v1(&id3v1)))
}

/// Look for an ID3v2 tag at the current position
///
/// A tag that doesn't begin with `ID3` leaves the reader untouched. Once the identifier matches,
/// a malformed header is an error. When `read` is set, the tag content (everything after the
/// header) is returned alongside the header, otherwise it's skipped.
pub(crate) fn find_id3v2<R>(
	data: &mut R,
	read: bool,
) -> Result<Option<(Id3v2Header, Option<Vec<u8>>)>>
where
	R: Read + Seek,
{
	let start = data.stream_position()?;
	log::debug!("Searching for an ID3v2 tag at offset: {start}");

	let mut identifier = [0; 3];
	let found = data.read_exact(&mut identifier).is_ok() && &identifier == b"ID3";
	data.seek(SeekFrom::Start(start))?;

	if !found {
		return Ok(None);
	}

	let header = Id3v2Header::parse(data)?;
	log::debug!("Found an ID3v2 tag, size: {}", header.full_tag_size());

	let end = data.seek(SeekFrom::End(0))?;
	if start + header.full_tag_size() > end {
		truncated_err!(@BAIL "ID3v2 tag size exceeds the input");
	}

	data.seek(SeekFrom::Start(start + 10))?;

	let mut content = None;
	if read {
		let mut tag = try_vec![0; header.size as usize];
		data.read_exact(&mut tag)?;
		content = Some(tag);
	}

	data.seek(SeekFrom::Start(start + header.full_tag_size()))?;
	Ok(Some((header, content)))
}

#[cfg(test)]
mod tests {
	use super::{find_id3v1, find_id3v2, find_lyrics3v2};
	use crate::error::ErrorKind;

	use std::io::{Cursor, Seek, SeekFrom};

	#[test_log::test]
	fn id3v2_not_present() {
		let mut reader = Cursor::new(b"fLaC\0\0\0\0\0\0\0\0".to_vec());
		assert!(find_id3v2(&mut reader, true).unwrap().is_none());
		assert_eq!(reader.position(), 0);
	}

	#[test_log::test]
	fn id3v2_located() {
		let mut bytes = b"ID3\x04\x00\x00\x00\x00\x00\x05".to_vec();
		bytes.extend([0; 5]);
		bytes.extend(b"audio");

		let mut reader = Cursor::new(bytes);
		let (header, content) = find_id3v2(&mut reader, true).unwrap().unwrap();

		assert_eq!(header.size, 5);
		assert_eq!(content, Some(vec![0; 5]));
		assert_eq!(reader.position(), 15);
	}

	#[test_log::test]
	fn id3v2_size_beyond_input() {
		let mut reader = Cursor::new(b"ID3\x04\x00\x00\x00\x00\x01\x00".to_vec());
		let err = find_id3v2(&mut reader, true).unwrap_err();
		assert!(err.is_truncated_input());
	}

	#[test_log::test]
	fn id3v2_bad_version() {
		let mut reader = Cursor::new(b"ID3\x07\x00\x00\x00\x00\x00\x00".to_vec());
		let err = find_id3v2(&mut reader, true).unwrap_err();
		assert!(matches!(err.kind(), ErrorKind::Id3v2(_)));
	}

	#[test_log::test]
	fn id3v1_and_lyrics3() {
		let mut bytes = b"audio".to_vec();
		let lyrics_start = bytes.len();
		bytes.extend(b"LYRICSBEGININD00002");
		bytes.extend(format!("{:06}", 19).as_bytes());
		bytes.extend(b"LYRICS200");
		let lyrics_len = bytes.len() - lyrics_start;

		let mut id3v1 = [0; 128];
		id3v1[..3].copy_from_slice(b"TAG");
		id3v1[3..8].copy_from_slice(b"Title");
		bytes.extend(id3v1);

		let mut reader = Cursor::new(bytes);
		let tag = find_id3v1(&mut reader).unwrap();
		assert_eq!(tag.and_then(|t| t.title).as_deref(), Some("Title"));
		assert_eq!(reader.position() as usize, lyrics_start + lyrics_len);

		let size = find_lyrics3v2(&mut reader).unwrap();
		assert_eq!(size.map(|size| size as usize), Some(lyrics_len));
		assert_eq!(reader.position() as usize, lyrics_start);
	}

	#[test_log::test]
	fn no_trailers() {
		let mut reader = Cursor::new(vec![1; 200]);
		assert!(find_id3v1(&mut reader).unwrap().is_none());
		assert_eq!(reader.position(), 200);

		reader.seek(SeekFrom::End(0)).unwrap();
		assert!(find_lyrics3v2(&mut reader).unwrap().is_none());
	}
}

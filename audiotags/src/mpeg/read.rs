use super::MpegFile;
use super::header::{Header, VbrHeader, next_header_matches, search_for_frame_sync};
use crate::config::{ParseOptions, ParsingMode};
use crate::dialect::{Dialect, TagBlock};
use crate::error::Result;
use crate::file::FileType;
use crate::id3::v2::Id3v2Tag;
use crate::id3::v2::read::parse_id3v2;
use crate::id3::{find_id3v1, find_id3v2, find_lyrics3v2};
use crate::macros::{decode_err, truncated_err};
use crate::model::{AudioRegion, BlockInfo, Container, ContainerHeader, StructuralModel};
use crate::properties::AudioProperties;

use std::io::{Read, Seek, SeekFrom};

use byteorder::{BigEndian, LittleEndian, ReadBytesExt};

const APE_PREAMBLE: &[u8; 8] = b"APETAGEX";
const APE_FOOTER_LEN: u64 = 32;

pub(crate) fn read_from<R>(reader: &mut R, parse_options: ParseOptions) -> Result<StructuralModel>
where
	R: Read + Seek,
{
	let file_length = reader.seek(SeekFrom::End(0))?;
	reader.seek(SeekFrom::Start(0))?;

	let mut blocks = Vec::new();

	// Skip any invalid padding
	let mut start = 0;
	while start < file_length && reader.read_u8()? == 0 {
		start += 1;
	}
	reader.seek(SeekFrom::Start(start))?;

	let mut id3v2 = None::<Id3v2Tag>;
	let mut id3v2_region = start..start;

	// Back-to-back tags are merged, the first one taking precedence
	while let Some((header, Some(content))) = find_id3v2(reader, true)? {
		let tag_end = reader.stream_position()?;
		blocks.push(BlockInfo::new(
			Dialect::Id3v2,
			id3v2_region.end,
			header.full_tag_size(),
		));

		let tag = parse_id3v2(&content, header, parse_options)?;
		match &mut id3v2 {
			Some(existing) => existing.merge(tag),
			None => id3v2 = Some(tag),
		}

		id3v2_region.end = tag_end;
	}

	let mut first_frame = find_next_frame(reader)?;

	// The tag may be buried in junk
	if id3v2.is_none() && parse_options.parsing_mode != ParsingMode::Strict {
		let window_end = first_frame.map_or(file_length, |(_, offset)| offset);
		let buried = find_buried_id3v2(reader, start, window_end, parse_options.max_junk_bytes)?;
		if let Some(offset) = buried {
			reader.seek(SeekFrom::Start(offset))?;
			if let Some((header, Some(content))) = find_id3v2(reader, true)? {
				log::warn!("MPEG: Found an ID3v2 tag after {} junk bytes", offset - start);

				blocks.push(BlockInfo::new(Dialect::Id3v2, offset, header.full_tag_size()));
				id3v2 = Some(parse_id3v2(&content, header, parse_options)?);
				id3v2_region = offset..reader.stream_position()?;

				first_frame = find_next_frame(reader)?;
			}
		}
	}

	let id3v2_block_count = blocks.len();

	let id3v1 = find_id3v1(reader)?;
	let mut trailer_start = reader.stream_position()?;
	let id3v1_offset = trailer_start;

	if let Some(size) = find_lyrics3v2(reader)? {
		trailer_start = reader.stream_position()?;
		blocks.push(BlockInfo::new(Dialect::Lyrics3, trailer_start, u64::from(size)));
	}

	if let Some(size) = find_ape_tag(reader)? {
		trailer_start = reader.stream_position()?;
		blocks.push(BlockInfo::new(Dialect::Ape, trailer_start, size));
	}

	if id3v1.is_some() {
		blocks.push(BlockInfo::new(Dialect::Id3v1, id3v1_offset, 128));
	}

	// Trailers were pushed in reverse file order
	blocks[id3v2_block_count..].sort_by_key(BlockInfo::offset);

	if trailer_start < id3v2_region.end {
		decode_err!(@BAIL Mpeg, "Trailing tags overlap the leading ID3v2 tag");
	}

	let audio = AudioRegion {
		offset: id3v2_region.end,
		len: trailer_start - id3v2_region.end,
	};

	let mut version = String::from("MPEG");
	if let Some((header, _)) = first_frame {
		version = header.description();
	}

	let mut properties = AudioProperties::default();
	if parse_options.read_properties {
		let Some((first_frame_header, first_frame_offset)) = first_frame else {
			decode_err!(@BAIL Mpeg, "File contains an invalid frame");
		};

		if first_frame_header.sample_rate == 0 {
			decode_err!(@BAIL Mpeg, "Sample rate is 0");
		}

		reader.seek(SeekFrom::Start(
			first_frame_offset + u64::from(first_frame_header.data_start),
		))?;

		let mut frame_data = [0; 32];
		reader.read_exact(&mut frame_data)?;

		let vbr_header = VbrHeader::read(&frame_data)?;

		properties = super::properties::read_properties(
			reader,
			(first_frame_header, first_frame_offset),
			trailer_start,
			vbr_header,
			file_length,
		)?;
	}

	let file = MpegFile {
		id3v2: id3v2.map(TagBlock::Id3v2),
		id3v2_region,
		id3v1: id3v1.map(TagBlock::Id3v1),
		id3v1_offset,
	};

	Ok(StructuralModel {
		header: ContainerHeader {
			file_type: FileType::Mpeg,
			version,
		},
		blocks,
		audio,
		properties,
		container: Container::Mpeg(file),
	})
}

/// Find the next frame that is followed by a compatible one
///
/// A lone sync could be a false positive within junk data, so the search resumes directly after
/// any header without a matching successor.
pub(crate) fn find_next_frame<R>(reader: &mut R) -> Result<Option<(Header, u64)>>
where
	R: Read + Seek,
{
	let mut search_start = reader.stream_position()?;

	while let Ok(Some(relative)) = search_for_frame_sync(reader) {
		let frame_start = search_start + relative;

		reader.seek(SeekFrom::Start(frame_start))?;
		let word = reader.read_u32::<BigEndian>()?;

		if let Some(header) = Header::read(word) {
			match next_header_matches(reader, word, header.len) {
				Some(true) => return Ok(Some((header, frame_start))),
				Some(false) => {},
				None => return Ok(None),
			}
		}

		search_start = frame_start + 1;
		reader.seek(SeekFrom::Start(search_start))?;
	}

	Ok(None)
}

// Look for an "ID3" identifier in the first `max_junk_bytes` of `start..end`
fn find_buried_id3v2<R>(
	reader: &mut R,
	start: u64,
	end: u64,
	max_junk_bytes: usize,
) -> Result<Option<u64>>
where
	R: Read + Seek,
{
	let window = end.saturating_sub(start).min(max_junk_bytes as u64);
	if window < 3 {
		return Ok(None);
	}

	reader.seek(SeekFrom::Start(start))?;

	let mut buf = Vec::with_capacity(window as usize);
	reader.take(window).read_to_end(&mut buf)?;

	Ok(buf
		.windows(3)
		.position(|w| w == b"ID3")
		.map(|pos| start + pos as u64))
}

/// Look for an APEv2 tag ending at the current position
///
/// On success, the reader is left at the start of the tag, and its full size is returned.
fn find_ape_tag<R>(reader: &mut R) -> Result<Option<u64>>
where
	R: Read + Seek,
{
	let end = reader.stream_position()?;
	if end < APE_FOOTER_LEN {
		return Ok(None);
	}

	reader.seek(SeekFrom::Start(end - APE_FOOTER_LEN))?;

	let mut preamble = [0; 8];
	reader.read_exact(&mut preamble)?;

	if &preamble != APE_PREAMBLE {
		reader.seek(SeekFrom::Start(end))?;
		return Ok(None);
	}

	let _version = reader.read_u32::<LittleEndian>()?;

	// Includes the footer and all items, but not the header
	let size = reader.read_u32::<LittleEndian>()?;
	if u64::from(size) < APE_FOOTER_LEN {
		decode_err!(@BAIL Mpeg, "APE tag has an invalid size (< 32)");
	}

	let _item_count = reader.read_u32::<LittleEndian>()?;
	let flags = reader.read_u32::<LittleEndian>()?;

	let mut full_size = u64::from(size);
	if flags & (1 << 31) != 0 {
		full_size += APE_FOOTER_LEN;
	}

	if full_size > end {
		truncated_err!(@BAIL Mpeg, "APE tag size exceeds the file");
	}

	log::debug!("Found an APE tag, it will be retained as-is");

	reader.seek(SeekFrom::Start(end - full_size))?;
	Ok(Some(full_size))
}

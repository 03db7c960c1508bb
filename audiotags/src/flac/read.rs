use super::block::{BLOCK_ID_PADDING, BLOCK_ID_PICTURE, BLOCK_ID_STREAMINFO, BLOCK_ID_VORBIS_COMMENTS, Block};
use super::{FlacFile, MetadataBlock};
use crate::config::{ParseOptions, ParsingMode};
use crate::dialect::{Dialect, TagBlock};
use crate::error::Result;
use crate::file::FileType;
use crate::id3::find_id3v2;
use crate::macros::decode_err;
use crate::model::{AudioRegion, BlockInfo, Container, ContainerHeader, StructuralModel};
use crate::properties::AudioProperties;
use crate::vorbis::read_comments;

use std::io::{Read, Seek, SeekFrom};

fn block_dialect(ty: u8) -> Dialect {
	match ty {
		BLOCK_ID_VORBIS_COMMENTS => Dialect::VorbisComments,
		BLOCK_ID_PICTURE => Dialect::FlacPicture,
		other => Dialect::FlacOther(other),
	}
}

pub(super) fn verify_flac<R>(data: &mut R) -> Result<Block>
where
	R: Read + Seek,
{
	let mut marker = [0; 4];
	data.read_exact(&mut marker)?;

	if &marker != b"fLaC" {
		decode_err!(@BAIL Flac, "File missing \"fLaC\" stream marker");
	}

	let block = Block::read(data)?;

	if block.ty != BLOCK_ID_STREAMINFO {
		decode_err!(@BAIL Flac, "File missing mandatory STREAMINFO block");
	}

	if block.content.len() < 18 {
		decode_err!(@BAIL Flac, "File has an invalid STREAMINFO block size (< 18)");
	}

	log::debug!("File verified to be FLAC");
	Ok(block)
}

pub(crate) fn read_from<R>(data: &mut R, parse_options: ParseOptions) -> Result<StructuralModel>
where
	R: Read + Seek,
{
	let mut block_infos = Vec::new();

	// It is possible for a FLAC file to contain an ID3v2 tag
	let mut id3v2_len = 0;
	if let Some((header, _)) = find_id3v2(data, false)? {
		log::warn!("Encountered an ID3v2 tag before the stream marker, it will be retained as-is");

		id3v2_len = header.full_tag_size();
		block_infos.push(BlockInfo::new(Dialect::Id3v2, 0, id3v2_len));
	}

	let stream_info = verify_flac(data)?;
	block_infos.push(BlockInfo::new(
		Dialect::FlacOther(BLOCK_ID_STREAMINFO),
		stream_info.start,
		stream_info.len(),
	));

	let mut flac_file = FlacFile {
		id3v2_len,
		blocks: vec![MetadataBlock::Raw {
			ty: BLOCK_ID_STREAMINFO,
			content: stream_info.content.clone(),
		}],
	};

	let mut last_block = stream_info.last;
	let mut has_comments = false;

	while !last_block {
		let block = Block::read(data)?;
		last_block = block.last;

		block_infos.push(BlockInfo::new(block_dialect(block.ty), block.start, block.len()));

		match block.ty {
			// Padding is recreated on write
			BLOCK_ID_PADDING => continue,
			BLOCK_ID_STREAMINFO => {
				decode_err!(@BAIL Flac, "Encountered a second STREAMINFO block");
			},
			BLOCK_ID_VORBIS_COMMENTS if !has_comments => {
				log::debug!("Encountered a Vorbis Comments block, parsing");

				let comments = read_comments(&block.content, parse_options.parsing_mode)?;
				flac_file
					.blocks
					.push(MetadataBlock::Comments(TagBlock::Vorbis(comments)));
				has_comments = true;
			},
			BLOCK_ID_VORBIS_COMMENTS => {
				// "There may be only one VORBIS_COMMENT block in a stream."
				if parse_options.parsing_mode == ParsingMode::Strict {
					decode_err!(@BAIL Flac, "Streams are only allowed one Vorbis Comments block per stream");
				}

				log::warn!("Encountered a second Vorbis Comments block, retaining it as-is");
				flac_file.blocks.push(MetadataBlock::Raw {
					ty: block.ty,
					content: block.content,
				});
			},
			ty => flac_file.blocks.push(MetadataBlock::Raw {
				ty,
				content: block.content,
			}),
		}
	}

	let audio_offset = data.stream_position()?;
	let file_length = data.seek(SeekFrom::End(0))?;
	let audio = AudioRegion {
		offset: audio_offset,
		len: file_length - audio_offset,
	};

	let properties = if parse_options.read_properties {
		super::properties::read_properties(&stream_info.content, audio.len, file_length)?
	} else {
		AudioProperties::default()
	};

	Ok(StructuralModel {
		header: ContainerHeader {
			file_type: FileType::Flac,
			version: String::from("fLaC"),
		},
		blocks: block_infos,
		audio,
		properties,
		container: Container::Flac(flac_file),
	})
}

#[cfg(test)]
mod tests {
	use super::read_from;
	use crate::config::{ParseOptions, ParsingMode};
	use crate::dialect::Dialect;
	use crate::flac::tests::{flac_bytes, vorbis_block};

	use std::io::Cursor;

	#[test_log::test]
	fn located_blocks() {
		let bytes = flac_bytes(&[(4, vorbis_block(&[("TITLE", "a")])), (1, vec![0; 10])]);
		let model = read_from(&mut Cursor::new(&bytes), ParseOptions::new()).unwrap();

		let dialects = model.blocks().iter().map(|b| b.dialect()).collect::<Vec<_>>();
		assert_eq!(
			dialects,
			vec![
				Dialect::FlacOther(0),
				Dialect::VorbisComments,
				Dialect::FlacOther(1)
			]
		);

		assert_eq!(model.audio().offset() + model.audio().len(), bytes.len() as u64);
		assert_eq!(&bytes[model.audio().range()], b"AUDIO");
		assert_eq!(model.properties().sample_rate(), 44100);
	}

	#[test_log::test]
	fn second_vorbis_block() {
		let bytes = flac_bytes(&[
			(4, vorbis_block(&[("TITLE", "a")])),
			(4, vorbis_block(&[("TITLE", "b")])),
		]);

		let model = read_from(&mut Cursor::new(&bytes), ParseOptions::new()).unwrap();
		assert_eq!(model.tags().len(), 1);
		assert_eq!(model.tags()[0].decode()[0].1, "a");

		let err = read_from(
			&mut Cursor::new(&bytes),
			ParseOptions::new().parsing_mode(ParsingMode::Strict),
		)
		.unwrap_err();
		assert!(err.is_corrupt_block());
	}

	#[test_log::test]
	fn missing_stream_info() {
		let mut bytes = b"fLaC".to_vec();
		bytes.extend([0x84, 0, 0, 0]);

		let err = read_from(&mut Cursor::new(&bytes), ParseOptions::new()).unwrap_err();
		assert!(err.is_corrupt_block());
	}

	#[test_log::test]
	fn leading_id3v2() {
		let mut bytes = b"ID3\x04\x00\x00\x00\x00\x00\x02\x00\x00".to_vec();
		bytes.extend(flac_bytes(&[]));

		let model = read_from(&mut Cursor::new(&bytes), ParseOptions::new()).unwrap();
		assert_eq!(model.blocks()[0].dialect(), Dialect::Id3v2);
		assert_eq!(model.blocks()[0].len(), 12);
		assert_eq!(model.blocks()[1].offset(), 16);
	}
}

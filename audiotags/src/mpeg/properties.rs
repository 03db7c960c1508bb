use super::header::{ChannelMode, Header, VbrHeader, VbrHeaderType, rev_search_for_frame_header};
use crate::error::Result;
use crate::properties::AudioProperties;
use crate::util::math::{RoundedDivision, samples_to_millis};

use std::io::{Read, Seek, SeekFrom};

/// Read the properties of the stream starting at `first_frame`
///
/// `stream_end` is the end of the audio region. Without a usable VBR header, the duration is
/// estimated from the first frame's bitrate and the span up to the last matching frame.
pub(super) fn read_properties<R>(
	reader: &mut R,
	first_frame: (Header, u64),
	stream_end: u64,
	vbr_header: Option<VbrHeader>,
	file_length: u64,
) -> Result<AudioProperties>
where
	R: Read + Seek,
{
	let (header, first_frame_offset) = first_frame;

	let mut properties = AudioProperties {
		sample_rate: header.sample_rate,
		channels: match header.channel_mode {
			ChannelMode::SingleChannel => 1,
			_ => 2,
		},
		..AudioProperties::default()
	};

	match vbr_header {
		Some(vbr) if vbr.is_valid() => {
			log::debug!("MPEG: Using the {:?} header for the duration", vbr.ty);

			let samples = u64::from(header.samples) * u64::from(vbr.frames);
			if let Some(millis) = samples_to_millis(samples, header.sample_rate).filter(|&m| m > 0)
			{
				properties.set_duration(millis, u64::from(vbr.size), file_length);
			}
		},
		vbr => {
			// "Info" marks a CBR stream, anything else is a guess
			if !matches!(vbr.map(|h| h.ty), Some(VbrHeaderType::Info)) {
				log::debug!("MPEG: No usable VBR header, assuming a constant bitrate");
			}

			estimate_from_bitrate(
				reader,
				&mut properties,
				header,
				first_frame_offset,
				stream_end,
				file_length,
			)?;
		},
	}

	Ok(properties)
}

fn estimate_from_bitrate<R>(
	reader: &mut R,
	properties: &mut AudioProperties,
	first: Header,
	first_frame_offset: u64,
	stream_end: u64,
	file_length: u64,
) -> Result<()>
where
	R: Read + Seek,
{
	properties.audio_bitrate = first.bitrate;

	let Some((last, last_offset)) = find_last_frame(reader, first, first_frame_offset, stream_end)?
	else {
		log::warn!("MPEG: No frame matches the first one, the duration is unknown");
		return Ok(());
	};

	let span = (last_offset + u64::from(last.len)).saturating_sub(first_frame_offset);
	let Some(millis) = (span * 8).div_round(u64::from(first.bitrate)) else {
		return Ok(());
	};

	if millis > 0 {
		let bitrate = properties.audio_bitrate;
		properties.set_duration(millis, span, file_length);

		// The header's bitrate is exact, the derived one is off by rounding
		properties.audio_bitrate = bitrate;
	}

	Ok(())
}

// Search backwards from `stream_end` for a frame compatible with `first`
fn find_last_frame<R>(
	reader: &mut R,
	first: Header,
	first_frame_offset: u64,
	stream_end: u64,
) -> Result<Option<(Header, u64)>>
where
	R: Read + Seek,
{
	reader.seek(SeekFrom::Start(stream_end))?;

	let mut pos = stream_end;
	while pos > first_frame_offset {
		match rev_search_for_frame_header(reader, &mut pos) {
			Ok(Some(header)) if header.cmp(&first) => return Ok(Some((header, pos))),
			Ok(_) => {},
			Err(_) => break,
		}
	}

	Ok(None)
}

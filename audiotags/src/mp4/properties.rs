use super::atom_info::{AtomIdent, AtomInfo};
use super::read::{AtomReader, find_child_atom, skip_atom};
use crate::config::ParsingMode;
use crate::error::Result;
use crate::macros::{decode_err, try_vec};
use crate::properties::AudioProperties;
use crate::util::math::samples_to_millis;

use std::io::{Cursor, Read, Seek, SeekFrom};

// https://wiki.multimedia.cx/index.php?title=MPEG-4_Audio#Sampling_Frequencies
const SAMPLE_RATES: [u32; 13] = [
	96000, 88200, 64000, 48000, 44100, 32000, 24000, 22050, 16000, 12000, 11025, 8000, 7350,
];

/// The `mdhd` and `minf` atoms of a `soun` track
struct SoundTrack {
	mdhd: AtomInfo,
	minf: Option<AtomInfo>,
}

/// Derive the audio properties from the first sound track
///
/// `mdat_len` is used for the audio bitrate when the codec configuration doesn't record one.
pub(super) fn read_properties<R>(
	reader: &mut AtomReader<R>,
	traks: &[AtomInfo],
	mdat_len: u64,
	file_length: u64,
) -> Result<AudioProperties>
where
	R: Read + Seek,
{
	let parse_mode = reader.parse_mode();

	let Some(track) = find_sound_track(reader, traks)? else {
		if parse_mode == ParsingMode::Strict {
			decode_err!(@BAIL Mp4, "File contains no audio tracks");
		}

		log::warn!("MP4: No audio track, properties will be empty");
		return Ok(AudioProperties::default());
	};

	let mut properties = AudioProperties::default();
	let mut codec_bitrate = None;

	let stsd = match &track.minf {
		Some(minf) => read_stsd(reader, minf)?,
		None => None,
	};

	if let Some(stsd) = stsd {
		let mut cursor = Cursor::new(stsd.as_slice());
		let mut stsd_reader = AtomReader::new(&mut cursor, parse_mode)?;
		codec_bitrate = read_sample_entry(&mut stsd_reader, &mut properties)?;
	}

	reader.seek(SeekFrom::Start(track.mdhd.start + track.mdhd.header_size()))?;
	match media_duration(reader)? {
		Some(millis) if millis > 0 => properties.set_duration(millis, mdat_len, file_length),
		_ => log::warn!("MP4: Track has no duration, unable to calculate the bitrate"),
	}

	if let Some(bitrate) = codec_bitrate.filter(|&b| b > 0) {
		properties.audio_bitrate = bitrate;
	}

	Ok(properties)
}

fn find_sound_track<R>(
	reader: &mut AtomReader<R>,
	traks: &[AtomInfo],
) -> Result<Option<SoundTrack>>
where
	R: Read + Seek,
{
	for mdia in traks {
		let mut is_sound = false;
		let mut mdhd = None;
		let mut minf = None;

		reader.seek(SeekFrom::Start(mdia.start + mdia.header_size()))?;
		while reader.stream_position()? + 8 <= mdia.end() {
			let Some(atom) = reader.next()? else {
				break;
			};

			match &atom.ident {
				AtomIdent::Fourcc(fourcc) if fourcc == b"mdhd" => mdhd = Some(atom.clone()),
				AtomIdent::Fourcc(fourcc) if fourcc == b"minf" => minf = Some(atom.clone()),
				AtomIdent::Fourcc(fourcc) if fourcc == b"hdlr" => {
					// Version and flags (4), pre-defined (4), handler type (4)
					if atom.len < atom.header_size() + 12 {
						log::warn!("MP4: Skipping a truncated `hdlr` atom");
					} else {
						reader.seek(SeekFrom::Current(8))?;

						let mut handler_type = [0; 4];
						reader.read_exact(&mut handler_type)?;
						is_sound = &handler_type == b"soun";
					}
				},
				_ => {},
			}

			skip_atom(reader, &atom)?;
		}

		if !is_sound {
			continue;
		}

		let Some(mdhd) = mdhd else {
			decode_err!(@BAIL Mp4, "Audio track is missing `mdhd`");
		};

		return Ok(Some(SoundTrack { mdhd, minf }));
	}

	Ok(None)
}

// The track duration in milliseconds, `None` without a timescale
fn media_duration<R>(reader: &mut AtomReader<R>) -> Result<Option<u64>>
where
	R: Read + Seek,
{
	let version = reader.read_u8()?;
	let _flags = reader.read_u24()?;

	// Creation and modification times are 8 bytes each in version 1, 4 otherwise
	let (timescale, duration) = if version == 1 {
		reader.seek(SeekFrom::Current(16))?;
		(reader.read_u32()?, reader.read_u64()?)
	} else {
		reader.seek(SeekFrom::Current(8))?;
		(reader.read_u32()?, u64::from(reader.read_u32()?))
	};

	Ok(samples_to_millis(duration, timescale))
}

// The content of `minf.stbl.stsd`
fn read_stsd<R>(reader: &mut AtomReader<R>, minf: &AtomInfo) -> Result<Option<Vec<u8>>>
where
	R: Read + Seek,
{
	let parse_mode = reader.parse_mode();

	reader.seek(SeekFrom::Start(minf.start + minf.header_size()))?;
	let Some(stbl) = find_child_atom(reader, minf, *b"stbl", parse_mode)? else {
		return Ok(None);
	};

	let Some(stsd) = find_child_atom(reader, &stbl, *b"stsd", parse_mode)? else {
		return Ok(None);
	};

	let mut content = try_vec![0; (stsd.len - stsd.header_size()) as usize];
	reader.read_exact(&mut content)?;

	Ok(Some(content))
}

/// Fill `properties` from the first supported sample entry
///
/// Returns the bitrate recorded by the codec configuration, if any.
fn read_sample_entry<R>(
	stsd: &mut AtomReader<R>,
	properties: &mut AudioProperties,
) -> Result<Option<u32>>
where
	R: Read + Seek,
{
	// Version and flags (4)
	stsd.seek(SeekFrom::Current(4))?;
	let entry_count = stsd.read_u32()?;

	for _ in 0..entry_count {
		let Some(entry) = stsd.next()? else {
			decode_err!(@BAIL Mp4, "`stsd` ended before its sample entries");
		};

		let AtomIdent::Fourcc(fourcc) = &entry.ident else {
			decode_err!(@BAIL Mp4, "Sample entries can't be freeform atoms");
		};

		match fourcc {
			b"mp4a" => return mp4a(stsd, properties),
			b"alac" => return alac(stsd, properties),
			b"fLaC" => return flac(stsd, properties).map(|()| None),
			_ => {
				log::warn!(
					"MP4: Skipping unsupported sample entry `{}`",
					fourcc.escape_ascii()
				);
				skip_atom(stsd, &entry)?;
			},
		}
	}

	Ok(None)
}

// The fields shared by every audio sample entry, returning the 16.16 sample rate's integer part
fn audio_sample_entry<R>(
	stsd: &mut AtomReader<R>,
	properties: &mut AudioProperties,
) -> Result<u16>
where
	R: Read + Seek,
{
	// Reserved (6), data reference index (2), version (2), revision (2), vendor (4)
	stsd.seek(SeekFrom::Current(16))?;

	properties.channels = stsd.read_u16()? as u8;
	let sample_size = stsd.read_u16()?;

	// Compression ID (2), packet size (2)
	stsd.seek(SeekFrom::Current(4))?;
	let sample_rate = stsd.read_u16()?;
	let _fraction = stsd.read_u16()?;

	properties.sample_rate = u32::from(sample_rate);
	Ok(sample_size)
}

fn mp4a<R>(stsd: &mut AtomReader<R>, properties: &mut AudioProperties) -> Result<Option<u32>>
where
	R: Read + Seek,
{
	audio_sample_entry(stsd, properties)?;

	// The elementary stream descriptor is optional
	let Ok(Some(esds)) = stsd.next() else {
		return Ok(None);
	};

	if esds.ident != AtomIdent::Fourcc(*b"esds") {
		return Ok(None);
	}

	let Some(config) = DecoderConfig::read(stsd)? else {
		return Ok(None);
	};

	if let Some(sample_rate) = config.sample_rate {
		properties.sample_rate = sample_rate;
	}

	if let Some(channels) = config.channels {
		properties.channels = channels;
	}

	Ok(Some(config.average_bitrate / 1000))
}

fn alac<R>(stsd: &mut AtomReader<R>, properties: &mut AudioProperties) -> Result<Option<u32>>
where
	R: Read + Seek,
{
	audio_sample_entry(stsd, properties)?;

	// The codec configuration is an `alac` atom nested in the sample entry
	let Ok(Some(config)) = stsd.next() else {
		return Ok(None);
	};

	if config.ident != AtomIdent::Fourcc(*b"alac") || config.len < config.header_size() + 28 {
		return Ok(None);
	}

	// Version and flags (4), frame length (4), compatible version (1)
	stsd.seek(SeekFrom::Current(9))?;
	properties.bit_depth = Some(stsd.read_u8()?);

	// Rice history mult (1), initial history (1), parameter limit (1)
	stsd.seek(SeekFrom::Current(3))?;
	properties.channels = stsd.read_u8()?;

	// Max run (2), max frame size (4)
	stsd.seek(SeekFrom::Current(6))?;
	let average_bitrate = stsd.read_u32()?;
	properties.sample_rate = stsd.read_u32()?;

	Ok(Some(average_bitrate / 1000))
}

fn flac<R>(stsd: &mut AtomReader<R>, properties: &mut AudioProperties) -> Result<()>
where
	R: Read + Seek,
{
	let sample_size = audio_sample_entry(stsd, properties)?;
	properties.bit_depth = Some(sample_size as u8);

	// `dfLa` holds a full STREAMINFO block
	let Some(dfla) = stsd.next()? else {
		return Ok(());
	};

	if dfla.ident != AtomIdent::Fourcc(*b"dfLa") || dfla.len < dfla.header_size() + 4 + 38 {
		return Ok(());
	}

	// Version and flags (4)
	stsd.seek(SeekFrom::Current(4))?;

	let stream_info = crate::flac::block::Block::read(stsd)?;
	let stream = crate::flac::properties::read_properties(&stream_info.content, 0, 0)?;

	properties.sample_rate = stream.sample_rate();
	properties.bit_depth = stream.bit_depth();
	properties.channels = stream.channels();

	Ok(())
}

/// The parts of an `esds` atom that describe the stream
struct DecoderConfig {
	average_bitrate: u32,
	sample_rate: Option<u32>,
	channels: Option<u8>,
}

impl DecoderConfig {
	const ES_DESCRIPTOR: u8 = 0x03;
	const DECODER_CONFIG_DESCRIPTOR: u8 = 0x04;
	const DECODER_SPECIFIC_INFO: u8 = 0x05;

	fn read<R: Read + Seek>(esds: &mut R) -> Result<Option<Self>> {
		// Only version 0 is defined
		let mut version_flags = [0; 4];
		esds.read_exact(&mut version_flags)?;
		if version_flags != [0; 4] {
			return Ok(None);
		}

		if read_descriptor_tag(esds)? != Self::ES_DESCRIPTOR {
			return Ok(None);
		}

		// Elementary stream ID (2), flags (1)
		esds.seek(SeekFrom::Current(3))?;

		if read_descriptor_tag(esds)? != Self::DECODER_CONFIG_DESCRIPTOR {
			return Ok(None);
		}

		// Object type (1), stream type (1), buffer size (3), max bitrate (4)
		esds.seek(SeekFrom::Current(9))?;

		let mut average_bitrate = [0; 4];
		esds.read_exact(&mut average_bitrate)?;

		let mut config = Self {
			average_bitrate: u32::from_be_bytes(average_bitrate),
			sample_rate: None,
			channels: None,
		};

		if read_descriptor_tag(esds)? != Self::DECODER_SPECIFIC_INFO {
			return Ok(Some(config));
		}

		// https://wiki.multimedia.cx/index.php?title=MPEG-4_Audio#Audio_Specific_Config
		//
		// object type (5) | frequency index (4) | channel configuration (4)
		let mut audio_specific = [0; 2];
		esds.read_exact(&mut audio_specific)?;

		let [a, b] = audio_specific;
		if a >> 3 == 31 {
			log::debug!("MP4: Extended audio object type, keeping the sample entry values");
			return Ok(Some(config));
		}

		let frequency_index = ((a & 0b111) << 1) | (b >> 7);
		config.sample_rate = SAMPLE_RATES.get(usize::from(frequency_index)).copied();

		let channels = (b >> 3) & 0b1111;
		config.channels = (channels > 0).then_some(channels);

		Ok(Some(config))
	}
}

// Descriptor sizes take up to four bytes of 7 bits, with the high bit marking continuation
fn read_descriptor_tag<R: Read>(reader: &mut R) -> Result<u8> {
	let mut byte = [0; 1];
	reader.read_exact(&mut byte)?;
	let tag = byte[0];

	for _ in 0..4 {
		reader.read_exact(&mut byte)?;
		if byte[0] & 0x80 == 0 {
			break;
		}
	}

	Ok(tag)
}

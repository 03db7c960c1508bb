use super::constants::{BITRATES, PADDING_SIZES, SAMPLE_RATES, SAMPLES, SIDE_INFORMATION_SIZES};
use crate::error::Result;
use crate::macros::decode_err;

use std::io::{Read, Seek, SeekFrom};

use byteorder::{BigEndian, ByteOrder, ReadBytesExt};

// The version, layer, and sample rate bits. These never change within a stream.
const STREAM_MASK: u32 = 0xFFFE_0C00;

/// Whether two bytes start with the 11 set bits of a frame sync
pub(crate) fn verify_frame_sync(frame_sync: [u8; 2]) -> bool {
	frame_sync[0] == 0xFF && frame_sync[1] & 0xE0 == 0xE0
}

/// Find the next frame sync, returning its offset from the reader's starting position
///
/// The sync is expected to be byte aligned.
pub(crate) fn search_for_frame_sync<R>(input: &mut R) -> std::io::Result<Option<u64>>
where
	R: Read,
{
	let mut previous = 0;
	for (offset, byte) in input.bytes().enumerate() {
		let byte = byte?;
		if offset > 0 && verify_frame_sync([previous, byte]) {
			return Ok(Some(offset as u64 - 1));
		}

		previous = byte;
	}

	Ok(None)
}

/// Look for a valid frame header in the 1024 bytes before `pos`
///
/// Used to find the end of a stream without a VBR header. When a header is found, `pos` and the
/// reader are moved to it, otherwise `pos` is moved to the start of the searched window.
pub(super) fn rev_search_for_frame_header<R>(input: &mut R, pos: &mut u64) -> Result<Option<Header>>
where
	R: Read + Seek,
{
	const WINDOW: u64 = 1024;

	let window_len = (*pos).min(WINDOW);
	*pos -= window_len;

	input.seek(SeekFrom::Start(*pos))?;
	let mut window = Vec::with_capacity(window_len as usize);
	input.take(window_len).read_to_end(&mut window)?;

	// A sync alone could be junk (ex. 0xFFFFFFFF), the rest of the header has to make sense too
	let found = window.windows(4).enumerate().rev().find_map(|(offset, bytes)| {
		if !verify_frame_sync([bytes[0], bytes[1]]) {
			return None;
		}

		Header::read(BigEndian::read_u32(bytes)).map(|header| (offset as u64, header))
	});

	let Some((offset, header)) = found else {
		return Ok(None);
	};

	*pos += offset;
	input.seek(SeekFrom::Start(*pos))?;

	Ok(Some(header))
}

/// Check the header one frame after `first`
///
/// The reader is expected directly after the four bytes of `first`, and is returned there.
/// A frame ending exactly at the end of the stream has nothing to compare against, and matches.
/// `None` means the frame runs past the end of the stream.
pub(crate) fn next_header_matches<R>(reader: &mut R, first: u32, first_len: u32) -> Option<bool>
where
	R: Read + Seek,
{
	let header_end = reader.stream_position().ok()?;
	let frame_end = header_end + u64::from(first_len.saturating_sub(4));
	let stream_end = reader.seek(SeekFrom::End(0)).ok()?;

	let matches = if frame_end == stream_end {
		Some(true)
	} else {
		reader
			.seek(SeekFrom::Start(frame_end))
			.and_then(|_| reader.read_u32::<BigEndian>())
			.ok()
			.map(|next| first & STREAM_MASK == next & STREAM_MASK)
	};

	reader.seek(SeekFrom::Start(header_end)).ok()?;
	matches
}

#[derive(Default, PartialEq, Eq, Copy, Clone, Debug)]
pub(crate) enum MpegVersion {
	#[default]
	V1,
	V2,
	V2_5,
}

impl MpegVersion {
	fn from_bits(bits: u32) -> Option<Self> {
		match bits {
			0b11 => Some(Self::V1),
			0b10 => Some(Self::V2),
			0b00 => Some(Self::V2_5),
			_ => None,
		}
	}

	fn as_str(self) -> &'static str {
		match self {
			Self::V1 => "1",
			Self::V2 => "2",
			Self::V2_5 => "2.5",
		}
	}
}

#[derive(Default, Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Layer {
	Layer1 = 1,
	Layer2 = 2,
	#[default]
	Layer3 = 3,
}

impl Layer {
	fn from_bits(bits: u32) -> Option<Self> {
		match bits {
			0b11 => Some(Self::Layer1),
			0b10 => Some(Self::Layer2),
			0b01 => Some(Self::Layer3),
			_ => None,
		}
	}
}

#[derive(Default, Copy, Clone, PartialEq, Eq, Debug)]
pub(crate) enum ChannelMode {
	#[default]
	Stereo = 0,
	JointStereo = 1,
	/// Two independent mono channels
	DualChannel = 2,
	SingleChannel = 3,
}

impl ChannelMode {
	fn from_bits(bits: u32) -> Self {
		match bits {
			0 => Self::Stereo,
			1 => Self::JointStereo,
			2 => Self::DualChannel,
			_ => Self::SingleChannel,
		}
	}
}

/// A decoded frame header
#[derive(Copy, Clone, Debug)]
pub(crate) struct Header {
	pub(crate) sample_rate: u32,
	/// The full frame length, including the header
	pub(crate) len: u32,
	/// Offset of the frame data (where a VBR header lives) from the frame start
	pub(crate) data_start: u32,
	pub(crate) samples: u16,
	pub(crate) bitrate: u32,
	pub(crate) version: MpegVersion,
	pub(crate) layer: Layer,
	pub(crate) channel_mode: ChannelMode,
}

impl Header {
	/// Decode a header, rejecting reserved or free format fields
	pub(crate) fn read(word: u32) -> Option<Self> {
		let field = |shift: u32, width: u32| (word >> shift) & ((1 << width) - 1);

		let version = MpegVersion::from_bits(field(19, 2))?;
		let Some(layer) = Layer::from_bits(field(17, 2)) else {
			log::trace!("MPEG: Frame header uses a reserved layer");
			return None;
		};

		// The tables share one row for MPEG-2 and MPEG-2.5
		let version_row = usize::from(version != MpegVersion::V1);
		let layer_row = layer as usize - 1;

		let bitrate = BITRATES[version_row][layer_row][field(12, 4) as usize];
		let sample_rate_index = field(10, 2) as usize;
		if bitrate == 0 || sample_rate_index == 3 {
			return None;
		}

		let sample_rate = SAMPLE_RATES[version as usize][sample_rate_index];
		let channel_mode = ChannelMode::from_bits(field(6, 2));
		let padding = field(9, 1) * u32::from(PADDING_SIZES[layer_row]);
		let samples = SAMPLES[layer_row][version_row];

		// Bytes per frame: samples / 8 * bitrate (in bps) / sample rate
		let len = u32::from(samples) * bitrate * 125 / sample_rate + padding;

		Some(Self {
			sample_rate,
			len,
			data_start: 4 + SIDE_INFORMATION_SIZES[version_row][channel_mode as usize],
			samples,
			bitrate,
			version,
			layer,
			channel_mode,
		})
	}

	/// Whether `other` can belong to the same stream
	pub(super) fn cmp(self, other: &Self) -> bool {
		(self.version, self.layer, self.sample_rate)
			== (other.version, other.layer, other.sample_rate)
	}

	/// The stream description, e.g. `"MPEG-1 Layer 3"`
	pub(super) fn description(self) -> String {
		format!("MPEG-{} Layer {}", self.version.as_str(), self.layer as u8)
	}
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub(super) enum VbrHeaderType {
	Xing,
	/// A Xing header written by an encoder in CBR mode
	Info,
	Vbri,
}

/// The frame count and stream size of a Xing, Info or VBRI header
#[derive(Copy, Clone, Debug)]
pub(super) struct VbrHeader {
	pub ty: VbrHeaderType,
	pub frames: u32,
	pub size: u32,
}

impl VbrHeader {
	/// Read a VBR header from the start of the first frame's data
	///
	/// `Ok(None)` is returned when there is no header, or it doesn't record both counts.
	pub(super) fn read(data: &[u8]) -> Result<Option<Self>> {
		let field = |at: usize| data.get(at..at + 4).map(BigEndian::read_u32);

		let ty = match data.get(..4) {
			Some(b"Xing") => VbrHeaderType::Xing,
			Some(b"Info") => VbrHeaderType::Info,
			Some(b"VBRI") => VbrHeaderType::Vbri,
			_ => return Ok(None),
		};

		if ty == VbrHeaderType::Vbri {
			// Version (2), delay (2), quality (2), then the stream size and frame count
			let (Some(size), Some(frames)) = (field(10), field(14)) else {
				decode_err!(@BAIL Mpeg, "VBRI header is too short");
			};

			return Ok(Some(Self { ty, frames, size }));
		}

		let Some(flags) = field(4) else {
			decode_err!(@BAIL Mpeg, "Xing header is too short");
		};

		// Frame count (0x1) and stream size (0x2), in that order
		if flags & 0b11 != 0b11 {
			log::debug!("MPEG: Xing header is missing the frame count or stream size");
			return Ok(None);
		}

		let (Some(frames), Some(size)) = (field(8), field(12)) else {
			decode_err!(@BAIL Mpeg, "Xing header is too short");
		};

		Ok(Some(Self { ty, frames, size }))
	}

	pub(super) fn is_valid(&self) -> bool {
		self.frames > 0 && self.size > 0
	}
}

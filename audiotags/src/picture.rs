//! Format-agnostic picture handling
//!
//! A [`Picture`] is the payload shared by every dialect that embeds images: FLAC `PICTURE`
//! blocks, base64 `METADATA_BLOCK_PICTURE` comments, ID3v2 `APIC` frames and MP4 `covr` atoms.
//! Dimensions are read from the image header alone, the image is never decoded.

use crate::config::ParsingMode;
use crate::error::{AudioTagsError, ErrorKind, Result};
use crate::macros::{decode_err, err};

use std::fmt::{Debug, Display, Formatter};

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use data_encoding::BASE64;

/// The description attached to pictures written through
/// [`AudioFile::write_picture`](crate::file::AudioFile::write_picture)
pub const PICTURE_DESCRIPTION: &str = "Written by audiotags";

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// MIME types for pictures.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
#[non_exhaustive]
pub enum MimeType {
	/// PNG image
	Png,
	/// JPEG image
	Jpeg,
	/// TIFF image
	Tiff,
	/// BMP image
	Bmp,
	/// GIF image
	Gif,
	/// Some unknown MIME type
	Unknown(String),
}

impl MimeType {
	const KNOWN: [(Self, &'static str); 5] = [
		(Self::Png, "image/png"),
		(Self::Jpeg, "image/jpeg"),
		(Self::Tiff, "image/tiff"),
		(Self::Bmp, "image/bmp"),
		(Self::Gif, "image/gif"),
	];

	/// Get a `MimeType` from a string
	///
	/// The comparison ignores case, and the common misspelling `image/jpg` is accepted.
	///
	/// # Examples
	///
	/// ```rust
	/// use audiotags::picture::MimeType;
	///
	/// assert_eq!(MimeType::from_str("IMAGE/JPG"), MimeType::Jpeg);
	/// assert_eq!(
	/// 	MimeType::from_str("image/webp"),
	/// 	MimeType::Unknown(String::from("image/webp"))
	/// );
	/// ```
	#[must_use]
	#[allow(clippy::should_implement_trait)] // Infallible in contrast to FromStr
	pub fn from_str(mime_type: &str) -> Self {
		if mime_type.eq_ignore_ascii_case("image/jpg") {
			return Self::Jpeg;
		}

		Self::KNOWN
			.into_iter()
			.find_map(|(known, s)| mime_type.eq_ignore_ascii_case(s).then_some(known))
			.unwrap_or_else(|| Self::Unknown(mime_type.to_owned()))
	}

	/// The MIME type as written to a tag
	///
	/// # Examples
	///
	/// ```rust
	/// use audiotags::picture::MimeType;
	///
	/// assert_eq!(MimeType::Gif.as_str(), "image/gif");
	/// ```
	#[must_use]
	pub fn as_str(&self) -> &str {
		if let Self::Unknown(other) = self {
			return other;
		}

		Self::KNOWN
			.iter()
			.find_map(|(known, s)| (known == self).then_some(*s))
			.unwrap_or_default()
	}

	/// Guess the `MimeType` from the leading bytes of an image
	///
	/// # Examples
	///
	/// ```rust
	/// use audiotags::picture::MimeType;
	///
	/// assert_eq!(MimeType::sniff(b"GIF89a\x01\x00"), Some(MimeType::Gif));
	/// assert_eq!(MimeType::sniff(b"not an image"), None);
	/// ```
	pub fn sniff(bytes: &[u8]) -> Option<Self> {
		match bytes {
			_ if bytes.starts_with(&PNG_SIGNATURE) => Some(Self::Png),
			[0xFF, 0xD8, ..] => Some(Self::Jpeg),
			[b'G', b'I', b'F', b'8', b'7' | b'9', b'a', ..] => Some(Self::Gif),
			[b'B', b'M', ..] => Some(Self::Bmp),
			[b'I', b'I', b'*', 0, ..] | [b'M', b'M', 0, b'*', ..] => Some(Self::Tiff),
			_ => None,
		}
	}
}

impl Display for MimeType {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

macro_rules! picture_types {
	($($variant:ident = $byte:literal => $name:literal),+ $(,)?) => {
		/// The role of a picture, numbered as in ID3v2 `APIC` frames and FLAC `PICTURE` blocks
		#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
		#[non_exhaustive]
		pub enum PictureType {
			$(
				#[doc = $name]
				$variant,
			)+
			/// A value outside of the defined roles
			Undefined(u8),
		}

		impl PictureType {
			/// The role's numeric value
			pub fn as_u8(&self) -> u8 {
				match self {
					$(Self::$variant => $byte,)+
					Self::Undefined(byte) => *byte,
				}
			}

			/// Get a `PictureType` from its numeric value
			pub fn from_u8(byte: u8) -> Self {
				match byte {
					$($byte => Self::$variant,)+
					_ => Self::Undefined(byte),
				}
			}

			/// The human readable name of the role
			///
			/// # Examples
			///
			/// ```rust
			/// use audiotags::picture::PictureType;
			///
			/// assert_eq!(PictureType::CoverFront.as_str(), "Front Cover");
			/// assert_eq!(PictureType::from_u8(200).as_str(), "Other");
			/// ```
			pub fn as_str(&self) -> &'static str {
				match self {
					$(Self::$variant => $name,)+
					Self::Undefined(_) => "Other",
				}
			}
		}
	};
}

picture_types! {
	Other             = 0  => "Other",
	Icon              = 1  => "File Icon",
	OtherIcon         = 2  => "Other File Icon",
	CoverFront        = 3  => "Front Cover",
	CoverBack         = 4  => "Back Cover",
	Leaflet           = 5  => "Leaflet Page",
	Media             = 6  => "Media",
	LeadArtist        = 7  => "Lead Artist",
	Artist            = 8  => "Artist",
	Conductor         = 9  => "Conductor",
	Band              = 10 => "Band",
	Composer          = 11 => "Composer",
	Lyricist          = 12 => "Lyricist",
	RecordingLocation = 13 => "Recording Location",
	DuringRecording   = 14 => "During Recording",
	DuringPerformance = 15 => "During Performance",
	ScreenCapture     = 16 => "Movie Screen Capture",
	BrightFish        = 17 => "Coloured Fish",
	Illustration      = 18 => "Illustration",
	BandLogo          = 19 => "Band Logo",
	PublisherLogo     = 20 => "Publisher Logo",
}

impl Display for PictureType {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Fixed offset reads into an image header
///
/// Anything past the end of the data means the header isn't one we understand.
struct ImageHeader<'a>(&'a [u8]);

impl ImageHeader<'_> {
	fn slice(&self, at: usize, len: usize) -> Result<&[u8]> {
		match at.checked_add(len).and_then(|end| self.0.get(at..end)) {
			Some(slice) => Ok(slice),
			None => err!(NotAPicture),
		}
	}

	fn u8(&self, at: usize) -> Result<u8> {
		Ok(self.slice(at, 1)?[0])
	}

	fn be_u16(&self, at: usize) -> Result<u16> {
		self.slice(at, 2).map(BigEndian::read_u16)
	}

	fn be_u32(&self, at: usize) -> Result<u32> {
		self.slice(at, 4).map(BigEndian::read_u32)
	}

	fn le_u16(&self, at: usize) -> Result<u16> {
		self.slice(at, 2).map(LittleEndian::read_u16)
	}

	fn le_u32(&self, at: usize) -> Result<u32> {
		self.slice(at, 4).map(LittleEndian::read_u32)
	}

	fn le_i32(&self, at: usize) -> Result<i32> {
		self.slice(at, 4).map(LittleEndian::read_i32)
	}
}

/// Information about a [`Picture`]
///
/// A value of `0` means the field is unknown.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub struct PictureInformation {
	/// The picture's width in pixels
	pub width: u32,
	/// The picture's height in pixels
	pub height: u32,
	/// The picture's color depth in bits per pixel
	pub color_depth: u32,
	/// The number of colors used
	pub num_colors: u32,
}

impl PictureInformation {
	/// Inspect the header of an image and extract its dimensions
	///
	/// Supports PNG, JPEG, GIF and BMP. Anything else, including a malformed header, yields
	/// zeroed information.
	///
	/// # Examples
	///
	/// ```rust
	/// use audiotags::picture::PictureInformation;
	///
	/// let info = PictureInformation::sniff(b"garbage");
	/// assert_eq!(info, PictureInformation::default());
	/// ```
	pub fn sniff(data: &[u8]) -> Self {
		let parser = match MimeType::sniff(data) {
			Some(MimeType::Png) => Self::from_png,
			Some(MimeType::Jpeg) => Self::from_jpeg,
			Some(MimeType::Gif) => Self::from_gif,
			Some(MimeType::Bmp) => Self::from_bmp,
			_ => return Self::default(),
		};

		parser(data).unwrap_or_else(|e| {
			log::debug!("Picture: Unable to read image header, {e}");
			Self::default()
		})
	}

	/// Attempt to extract [`PictureInformation`] from a PNG
	///
	/// The palette size is only filled in for indexed-color images.
	///
	/// # Errors
	///
	/// * `data` is not a PNG, or its `IHDR` chunk is missing or truncated
	pub fn from_png(data: &[u8]) -> Result<Self> {
		// Chunks are laid out as length (4), type (4), data, CRC (4)
		const IHDR_DATA: usize = 16;
		const FIRST_CHUNK_AFTER_IHDR: usize = IHDR_DATA + 13 + 4;

		let header = ImageHeader(data);
		if !data.starts_with(&PNG_SIGNATURE) || header.slice(12, 4)? != b"IHDR" {
			err!(NotAPicture);
		}

		let width = header.be_u32(IHDR_DATA)?;
		let height = header.be_u32(IHDR_DATA + 4)?;
		let bit_depth = u32::from(header.u8(IHDR_DATA + 8)?);
		let color_type = header.u8(IHDR_DATA + 9)?;

		let samples_per_pixel = match color_type {
			// Truecolor
			2 => 3,
			// Grayscale with alpha
			4 => 2,
			// Truecolor with alpha
			6 => 4,
			_ => 1,
		};

		let mut info = Self {
			width,
			height,
			color_depth: bit_depth * samples_per_pixel,
			num_colors: 0,
		};

		if color_type != 3 {
			return Ok(info);
		}

		let mut chunk = FIRST_CHUNK_AFTER_IHDR;
		while let (Ok(len), Ok(ty)) = (header.be_u32(chunk), header.slice(chunk + 4, 4)) {
			match ty {
				// 1-256 entries of 3 bytes
				b"PLTE" => {
					info.num_colors = len / 3;
					break;
				},
				// The palette must come before the image data
				b"IDAT" => break,
				_ => {},
			}

			let Some(next) = (len as usize).checked_add(12).and_then(|n| n.checked_add(chunk))
			else {
				break;
			};
			chunk = next;
		}

		Ok(info)
	}

	/// Attempt to extract [`PictureInformation`] from a JPEG
	///
	/// # Errors
	///
	/// * `data` is not a JPEG image
	/// * `data` has no `SOFn` segment before the image data
	pub fn from_jpeg(data: &[u8]) -> Result<Self> {
		const START_OF_SCAN: u8 = 0xDA;
		const END_OF_IMAGE: u8 = 0xD9;

		let header = ImageHeader(data);
		if !data.starts_with(&[0xFF, 0xD8]) {
			err!(NotAPicture);
		}

		let mut pos = 2;
		loop {
			if header.u8(pos)? != 0xFF {
				err!(NotAPicture);
			}

			// Markers may be padded with any number of fill bytes
			while header.u8(pos)? == 0xFF {
				pos += 1;
			}

			let marker = header.u8(pos)?;
			if matches!(marker, START_OF_SCAN | END_OF_IMAGE) {
				err!(NotAPicture);
			}

			// The segment length includes itself
			let segment_len = usize::from(header.be_u16(pos + 1)?);
			if segment_len < 2 {
				err!(NotAPicture);
			}

			// SOF0-SOF15, excluding DHT (C4), JPG (C8) and DAC (CC)
			let is_frame_header =
				(0xC0..=0xCF).contains(&marker) && !matches!(marker, 0xC4 | 0xC8 | 0xCC);
			if is_frame_header {
				let precision = u32::from(header.u8(pos + 3)?);
				let components = u32::from(header.u8(pos + 8)?);

				return Ok(Self {
					width: u32::from(header.be_u16(pos + 6)?),
					height: u32::from(header.be_u16(pos + 4)?),
					color_depth: precision * components,
					num_colors: 0,
				});
			}

			pos += 1 + segment_len;
		}
	}

	/// Attempt to extract [`PictureInformation`] from a GIF
	///
	/// # Errors
	///
	/// * `data` is not a GIF image
	pub fn from_gif(data: &[u8]) -> Result<Self> {
		if MimeType::sniff(data) != Some(MimeType::Gif) {
			err!(NotAPicture);
		}

		// Logical screen descriptor
		let header = ImageHeader(data);
		let width = u32::from(header.le_u16(6)?);
		let height = u32::from(header.le_u16(8)?);
		let packed = header.u8(10)?;

		let color_depth = u32::from(packed & 0b111) + 1;
		let has_global_table = packed & 0x80 != 0;

		Ok(Self {
			width,
			height,
			color_depth,
			num_colors: if has_global_table { 1 << color_depth } else { 0 },
		})
	}

	/// Attempt to extract [`PictureInformation`] from a BMP
	///
	/// # Errors
	///
	/// * `data` is not a BMP image
	/// * `data` uses an unknown info header
	pub fn from_bmp(data: &[u8]) -> Result<Self> {
		// The info header follows the 14 byte file header
		const INFO: usize = 14;

		if !data.starts_with(b"BM") {
			err!(NotAPicture);
		}

		let header = ImageHeader(data);
		match header.le_u32(INFO)? {
			// BITMAPCOREHEADER
			12 => Ok(Self {
				width: u32::from(header.le_u16(INFO + 4)?),
				height: u32::from(header.le_u16(INFO + 6)?),
				color_depth: u32::from(header.le_u16(INFO + 10)?),
				num_colors: 0,
			}),
			// BITMAPINFOHEADER and its extensions, where negative heights are top-down images
			40.. => Ok(Self {
				width: header.le_i32(INFO + 4)?.unsigned_abs(),
				height: header.le_i32(INFO + 8)?.unsigned_abs(),
				color_depth: u32::from(header.le_u16(INFO + 14)?),
				num_colors: header.le_u32(INFO + 32)?,
			}),
			_ => err!(NotAPicture),
		}
	}
}

/// Builder for a [`Picture`]
///
/// This is created through [`Picture::unchecked()`]. Anything left unset is filled in from the
/// image data by [`PictureBuilder::build()`].
pub struct PictureBuilder {
	pic_type: PictureType,
	mime_type: Option<MimeType>,
	description: String,
	data: Vec<u8>,
	information: Option<PictureInformation>,
}

impl PictureBuilder {
	/// Set the [`PictureType`], [`PictureType::Other`] by default
	///
	/// # Examples
	///
	/// ```rust
	/// use audiotags::picture::{Picture, PictureType};
	///
	/// let picture = Picture::unchecked(vec![0; 8])
	/// 	.pic_type(PictureType::CoverBack)
	/// 	.build();
	/// assert_eq!(picture.pic_type(), PictureType::CoverBack);
	/// ```
	pub fn pic_type(mut self, pic_type: PictureType) -> Self {
		self.pic_type = pic_type;
		self
	}

	/// Set the [`MimeType`]
	pub fn mime_type(mut self, mime_type: MimeType) -> Self {
		self.mime_type = Some(mime_type);
		self
	}

	/// Set the description
	pub fn description(mut self, description: impl Into<String>) -> Self {
		self.description = description.into();
		self
	}

	/// Set the dimensions explicitly
	pub fn information(mut self, information: PictureInformation) -> Self {
		self.information = Some(information);
		self
	}

	/// Construct the [`Picture`]
	pub fn build(self) -> Picture {
		let information = match self.information {
			Some(information) => information,
			None => PictureInformation::sniff(&self.data),
		};

		Picture {
			pic_type: self.pic_type,
			mime_type: self.mime_type.or_else(|| MimeType::sniff(&self.data)),
			description: self.description,
			data: self.data,
			information,
		}
	}
}

impl From<PictureBuilder> for Picture {
	fn from(builder: PictureBuilder) -> Self {
		builder.build()
	}
}

/// An embedded picture
#[derive(Clone, Eq, PartialEq, Hash)]
pub struct Picture {
	pub(crate) pic_type: PictureType,
	pub(crate) mime_type: Option<MimeType>,
	pub(crate) description: String,
	pub(crate) data: Vec<u8>,
	pub(crate) information: PictureInformation,
}

impl Debug for Picture {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Picture")
			.field("pic_type", &self.pic_type)
			.field("mime_type", &self.mime_type)
			.field("description", &self.description)
			.field("information", &self.information)
			.field("data", &format_args!("<{} bytes>", self.data.len()))
			.finish()
	}
}

impl Picture {
	/// Create a [`Picture`] from raw image bytes
	///
	/// The [`MimeType`] and dimensions are sniffed from the data, and the role is
	/// [`PictureType::Other`].
	///
	/// # Errors
	///
	/// * `data` does not start with a known image signature
	///
	/// # Examples
	///
	/// ```rust
	/// use audiotags::picture::{MimeType, Picture};
	///
	/// let gif = b"GIF89a\x02\x00\x03\x00\x00\x00\x00".to_vec();
	/// let picture = Picture::from_bytes(gif).unwrap();
	///
	/// assert_eq!(picture.mime_type(), Some(&MimeType::Gif));
	/// assert_eq!(picture.width(), 2);
	/// assert_eq!(picture.height(), 3);
	/// ```
	pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
		match MimeType::sniff(&data) {
			Some(mime_type) => Ok(Self::unchecked(data).mime_type(mime_type).build()),
			None => err!(NotAPicture),
		}
	}

	/// Start building a `Picture` with no verification of `data`
	///
	/// # Examples
	///
	/// ```rust
	/// use audiotags::picture::{MimeType, Picture, PictureType};
	///
	/// let picture = Picture::unchecked(vec![0xFF, 0xD8, 0xFF, 0xD9])
	/// 	.pic_type(PictureType::Band)
	/// 	.mime_type(MimeType::Jpeg)
	/// 	.description("The band on stage")
	/// 	.build();
	///
	/// assert_eq!(picture.description(), "The band on stage");
	/// ```
	pub fn unchecked(data: Vec<u8>) -> PictureBuilder {
		PictureBuilder {
			pic_type: PictureType::Other,
			mime_type: None,
			description: String::new(),
			data,
			information: None,
		}
	}

	/// Returns the [`PictureType`]
	pub fn pic_type(&self) -> PictureType {
		self.pic_type
	}

	/// Sets the [`PictureType`]
	pub fn set_pic_type(&mut self, pic_type: PictureType) {
		self.pic_type = pic_type
	}

	/// Returns the [`MimeType`], if one is known
	pub fn mime_type(&self) -> Option<&MimeType> {
		self.mime_type.as_ref()
	}

	/// The MIME type as a string, empty if unknown
	pub fn mime_str(&self) -> &str {
		self.mime_type.as_ref().map_or("", MimeType::as_str)
	}

	/// Returns the description
	pub fn description(&self) -> &str {
		&self.description
	}

	/// Sets the description
	pub fn set_description(&mut self, description: impl Into<String>) {
		self.description = description.into();
	}

	/// Returns the picture data
	pub fn data(&self) -> &[u8] {
		&self.data
	}

	/// The length of the picture data in bytes
	pub fn len(&self) -> usize {
		self.data.len()
	}

	/// Whether the picture has no data
	pub fn is_empty(&self) -> bool {
		self.data.is_empty()
	}

	/// Consumes a [`Picture`], returning its data
	pub fn into_data(self) -> Vec<u8> {
		self.data
	}

	/// Returns the [`PictureInformation`]
	pub fn information(&self) -> PictureInformation {
		self.information
	}

	/// The width in pixels, `0` if unknown
	pub fn width(&self) -> u32 {
		self.information.width
	}

	/// The height in pixels, `0` if unknown
	pub fn height(&self) -> u32 {
		self.information.height
	}

	/// Serialize as the content of a FLAC `PICTURE` block
	///
	/// With `encode`, the bytes are base64 encoded for use as a `METADATA_BLOCK_PICTURE` comment.
	/// Neither a block header nor a comment key is included.
	pub fn as_flac_bytes(&self, encode: bool) -> Vec<u8> {
		let mime_type = self.mime_str().as_bytes();
		let description = self.description.as_bytes();

		let mut block = Vec::with_capacity(32 + mime_type.len() + description.len() + self.len());
		block.extend(u32::from(self.pic_type.as_u8()).to_be_bytes());

		for string in [mime_type, description] {
			block.extend((string.len() as u32).to_be_bytes());
			block.extend(string);
		}

		let PictureInformation {
			width,
			height,
			color_depth,
			num_colors,
		} = self.information;
		for field in [width, height, color_depth, num_colors, self.data.len() as u32] {
			block.extend(field.to_be_bytes());
		}
		block.extend(&self.data);

		if encode {
			return BASE64.encode(&block).into_bytes();
		}

		block
	}

	/// Read the content of a FLAC `PICTURE` block
	///
	/// With `encoded`, `bytes` is the base64 value of a `METADATA_BLOCK_PICTURE` comment. A missing
	/// MIME type or zero dimensions are filled in from the image data.
	///
	/// # Errors
	///
	/// * The data isn't valid base64 (`encoded`)
	/// * A length field runs past the end of the data
	/// * The picture type is out of range, in [`ParsingMode::Strict`]
	pub fn from_flac_bytes(bytes: &[u8], encoded: bool, parse_mode: ParsingMode) -> Result<Self> {
		if !encoded {
			return Self::read_flac_block(bytes, parse_mode);
		}

		let decoded = BASE64
			.decode(bytes)
			.map_err(|_| AudioTagsError::new(ErrorKind::NotAPicture))?;
		Self::read_flac_block(&decoded, parse_mode)
	}

	fn read_flac_block(content: &[u8], parse_mode: ParsingMode) -> Result<Self> {
		// Eight length and dimension fields
		if content.len() < 32 {
			err!(NotAPicture);
		}

		let mut fields = FlacFields(content);

		let pic_type = fields.u32()?;
		let Ok(pic_type) = u8::try_from(pic_type) else {
			if parse_mode == ParsingMode::Strict {
				decode_err!(@BAIL Flac, "Picture type out of range");
			}

			log::warn!("Picture: Type {pic_type} is out of range, using `Other`");
			return Self::read_flac_fields(PictureType::Other, fields);
		};

		Self::read_flac_fields(PictureType::from_u8(pic_type), fields)
	}

	fn read_flac_fields(pic_type: PictureType, mut fields: FlacFields<'_>) -> Result<Self> {
		let mime_type = fields.string()?;
		let description = fields.string()?;

		let mut information = PictureInformation {
			width: fields.u32()?,
			height: fields.u32()?,
			color_depth: fields.u32()?,
			num_colors: fields.u32()?,
		};

		let data_len = fields.u32()? as usize;
		let data = fields.take(data_len)?.to_vec();

		if information.width == 0 || information.height == 0 {
			information = PictureInformation::sniff(&data);
		}

		let mime_type = if mime_type.is_empty() {
			MimeType::sniff(&data)
		} else {
			Some(MimeType::from_str(&mime_type))
		};

		Ok(Self {
			pic_type,
			mime_type,
			description,
			data,
			information,
		})
	}
}

// The remaining fields of a FLAC picture block
struct FlacFields<'a>(&'a [u8]);

impl<'a> FlacFields<'a> {
	fn take(&mut self, len: usize) -> Result<&'a [u8]> {
		if len > self.0.len() {
			decode_err!(@BAIL Flac, "Picture field length exceeds the block");
		}

		let (field, rest) = self.0.split_at(len);
		self.0 = rest;
		Ok(field)
	}

	fn u32(&mut self) -> Result<u32> {
		self.take(4).map(BigEndian::read_u32)
	}

	fn string(&mut self) -> Result<String> {
		let len = self.u32()? as usize;
		self.take(len).map(crate::util::text::utf8_decode_lossy)
	}
}

use crate::picture::MimeType;

macro_rules! data_types {
	($($(#[$meta:meta])* $name:ident = $code:literal),+ $(,)?) => {
		/// The type code of a `data` atom, from the [well known types]
		///
		/// Only the codes audiotags interprets are named.
		///
		/// [well known types]: https://developer.apple.com/documentation/quicktime-file-format/well-known_types
		#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
		pub(crate) enum DataType {
			$($(#[$meta])* $name,)+
			/// Any other code, kept as-is
			Other(u32),
		}

		impl From<u32> for DataType {
			fn from(code: u32) -> Self {
				match code {
					$($code => Self::$name,)+
					other => Self::Other(other),
				}
			}
		}

		impl From<DataType> for u32 {
			fn from(data_type: DataType) -> Self {
				match data_type {
					$(DataType::$name => $code,)+
					DataType::Other(code) => code,
				}
			}
		}
	};
}

data_types! {
	/// Implicit, the content decides
	Reserved = 0,
	/// UTF-8, unterminated
	Utf8 = 1,
	/// Big endian UTF-16, unterminated
	Utf16 = 2,
	Gif = 12,
	Jpeg = 13,
	Png = 14,
	/// 1 to 4 bytes
	BeSignedInteger = 21,
	/// 1 to 4 bytes
	BeUnsignedInteger = 22,
	Bmp = 27,
}

impl DataType {
	/// Type codes are stored in 24 bits
	pub(crate) const MAX: u32 = 0x00FF_FFFF;

	/// The picture type code for `mime_type`, if `covr` can store it
	pub(crate) fn from_mime(mime_type: &MimeType) -> Option<Self> {
		match mime_type {
			MimeType::Jpeg => Some(Self::Jpeg),
			MimeType::Png => Some(Self::Png),
			MimeType::Bmp => Some(Self::Bmp),
			MimeType::Gif => Some(Self::Gif),
			_ => None,
		}
	}

	/// The inverse of [`DataType::from_mime`]
	///
	/// The implicit type is `Ok(None)`, anything that isn't a picture format is an error.
	pub(crate) fn picture_mime(self) -> Result<Option<MimeType>, Self> {
		match self {
			Self::Reserved => Ok(None),
			Self::Jpeg => Ok(Some(MimeType::Jpeg)),
			Self::Png => Ok(Some(MimeType::Png)),
			Self::Bmp => Ok(Some(MimeType::Bmp)),
			Self::Gif => Ok(Some(MimeType::Gif)),
			other => Err(other),
		}
	}
}

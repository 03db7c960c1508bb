use super::data_type::DataType;
use crate::mp4::AtomIdent;
use crate::picture::Picture;

/// A single item of an `ilst` atom
///
/// An item never exists without at least one `data` child.
#[derive(Debug, PartialEq, Eq, Clone)]
pub(crate) struct Atom {
	pub(crate) ident: AtomIdent,
	data: Vec<AtomData>,
}

impl Atom {
	pub(crate) fn new(ident: AtomIdent, data: AtomData) -> Self {
		Self {
			ident,
			data: vec![data],
		}
	}

	pub(crate) fn from_collection(ident: AtomIdent, data: Vec<AtomData>) -> Option<Self> {
		(!data.is_empty()).then_some(Self { ident, data })
	}

	pub(crate) fn extend(&mut self, data: impl IntoIterator<Item = AtomData>) {
		self.data.extend(data);
	}

	pub(crate) fn data(&self) -> impl Iterator<Item = &AtomData> {
		self.data.iter()
	}

	/// Whether every value of the atom is a string
	pub(crate) fn is_text(&self) -> bool {
		self.data
			.iter()
			.all(|data| matches!(data, AtomData::UTF8(_) | AtomData::UTF16(_)))
	}
}

/// The content of a `data` atom
#[derive(Debug, PartialEq, Eq, Clone)]
pub(crate) enum AtomData {
	UTF8(String),
	UTF16(String),
	/// A `covr` image
	Picture(Picture),
	SignedInteger(i32),
	/// Shrunk to the smallest size when written
	UnsignedInteger(u32),
	/// A single byte signed integer
	Bool(bool),
	/// Anything else, kept as it was read
	Unknown {
		code: DataType,
		/// The content following the type and locale
		data: Vec<u8>,
	},
}

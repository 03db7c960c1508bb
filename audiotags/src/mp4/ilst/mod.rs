pub(super) mod atom;
pub(super) mod data_type;
pub(super) mod read;
pub(super) mod write;

use super::AtomIdent;
use super::atom_info::ITUNES_MEAN;
use crate::dialect::keys::{ILST_MAP, description_to_key, key_to_description};
use crate::dialect::{NativeField, splice};
use crate::error::{PropertyEncodingError, Result};
use crate::id3::v1::GENRES;
use crate::macros::err;
use crate::picture::Picture;
use crate::properties::PropertyStore;
use crate::util::flag_item;
use atom::{Atom, AtomData};
use data_type::DataType;

const COVR: AtomIdent = AtomIdent::Fourcc(*b"covr");

// Items with no canonical mapping are exposed under their textual identifier with this prefix
const PASSTHROUGH_PREFIX: &str = "MP4:";

/// An MP4 `ilst` atom
///
/// Items are kept in file order. Text items and known integer items are exposed as properties,
/// `covr` as pictures, and anything else is written back exactly as it was read.
#[derive(Default, PartialEq, Eq, Clone, Debug)]
pub struct Ilst {
	pub(crate) atoms: Vec<Atom>,
}

impl NativeField for Atom {
	fn canonical_key(&self) -> Option<String> {
		match &self.ident {
			AtomIdent::Fourcc(fourcc) => {
				if self.ident == COVR {
					return None;
				}

				// Decoded through the ID3v1 genre list
				if fourcc == b"gnre" {
					return Some(String::from("GENRE"));
				}

				if let Some(key) = ILST_MAP::canonical(&self.ident.to_string()) {
					return Some(key.to_owned());
				}

				self.is_text().then(|| passthrough_key(&self.ident))
			},
			AtomIdent::Freeform { mean, name } if mean == ITUNES_MEAN => {
				Some(description_to_key(name))
			},
			AtomIdent::Freeform { .. } => self.is_text().then(|| passthrough_key(&self.ident)),
		}
	}
}

fn passthrough_key(ident: &AtomIdent) -> String {
	format!("{PASSTHROUGH_PREFIX}{ident}").to_uppercase()
}

impl Ilst {
	/// The identifiers of every item, in file order
	pub fn idents(&self) -> impl Iterator<Item = &AtomIdent> {
		self.atoms.iter().map(|atom| &atom.ident)
	}

	/// Whether an item with the identifier exists
	pub fn contains(&self, ident: &AtomIdent) -> bool {
		self.atoms.iter().any(|atom| &atom.ident == ident)
	}

	/// The number of items
	pub fn len(&self) -> usize {
		self.atoms.len()
	}

	pub(crate) fn decode(&self) -> Vec<(String, String)> {
		let mut ret = Vec::new();

		for atom in &self.atoms {
			let Some(key) = atom.canonical_key() else {
				continue;
			};

			for data in atom.data() {
				if let Some(value) = decode_value(&atom.ident, data) {
					ret.push((key.clone(), value));
				}
			}
		}

		ret
	}

	pub(crate) fn apply(&mut self, store: &PropertyStore, changed: &[String]) -> Result<()> {
		// Keys without a fixed identifier keep the spelling they were read with
		let existing = changed
			.iter()
			.filter_map(|key| {
				self.atoms
					.iter()
					.find(|atom| atom.canonical_key().as_deref() == Some(key.as_str()))
					.map(|atom| (key.as_str(), atom.ident.clone()))
			})
			.collect::<Vec<_>>();

		splice(&mut self.atoms, store, changed, |key, values| {
			let existing = existing
				.iter()
				.find_map(|(k, ident)| (*k == key).then_some(ident));

			let ident = ident_for_key(key, values, existing)?;
			Ok(encode_atom(key, ident, values)?.into_iter().collect())
		})
	}

	pub(crate) fn pictures(&self) -> Vec<Picture> {
		self.atoms
			.iter()
			.filter(|atom| atom.ident == COVR)
			.flat_map(Atom::data)
			.filter_map(|data| match data {
				AtomData::Picture(picture) => Some(picture.clone()),
				_ => None,
			})
			.collect()
	}

	/// Replace every `covr` item with a single one holding `pictures`
	pub(crate) fn set_pictures(&mut self, pictures: &[Picture]) {
		let first = self.atoms.iter().position(|atom| atom.ident == COVR);
		self.atoms.retain(|atom| atom.ident != COVR);

		let data = pictures.iter().cloned().map(AtomData::Picture).collect();
		if let Some(covr) = Atom::from_collection(COVR, data) {
			let at = first.map_or(self.atoms.len(), |i| i.min(self.atoms.len()));
			self.atoms.insert(at, covr);
		}
	}

	/// Add `pictures` to the end of the existing `covr` item
	pub(crate) fn append_pictures(&mut self, pictures: &[Picture]) {
		let data = pictures.iter().cloned().map(AtomData::Picture);

		match self.atoms.iter_mut().find(|atom| atom.ident == COVR) {
			Some(covr) => covr.extend(data),
			None => self.atoms.extend(Atom::from_collection(COVR, data.collect())),
		}
	}
}

fn decode_value(ident: &AtomIdent, data: &AtomData) -> Option<String> {
	match data {
		AtomData::UTF8(text) | AtomData::UTF16(text) => Some(text.clone()),
		AtomData::SignedInteger(int) => Some(int.to_string()),
		AtomData::UnsignedInteger(uint) => Some(uint.to_string()),
		AtomData::Bool(b) => Some(String::from(if *b { "1" } else { "0" })),
		AtomData::Unknown { data, .. } => match ident {
			AtomIdent::Fourcc(fourcc) if fourcc == b"trkn" || fourcc == b"disk" => {
				decode_pair(data)
			},
			AtomIdent::Fourcc(fourcc) if fourcc == b"gnre" => decode_genre(data),
			_ => None,
		},
		AtomData::Picture(_) => None,
	}
}

// Reserved (2), number (2), total (2), and for `trkn` reserved (2)
fn decode_pair(data: &[u8]) -> Option<String> {
	if data.len() < 6 {
		return None;
	}

	let number = u16::from_be_bytes([data[2], data[3]]);
	let total = u16::from_be_bytes([data[4], data[5]]);

	match total {
		0 => Some(number.to_string()),
		_ => Some(format!("{number}/{total}")),
	}
}

// A one-based index into the ID3v1 genre list
fn decode_genre(data: &[u8]) -> Option<String> {
	let [.., hi, lo] = data else {
		return None;
	};

	let index = usize::from(u16::from_be_bytes([*hi, *lo]));
	GENRES
		.get(index.checked_sub(1)?)
		.map(|genre| String::from(*genre))
}

fn encoding_error(key: &str, value: &str, reason: &'static str) -> crate::error::AudioTagsError {
	crate::error::AudioTagsError::new(crate::error::ErrorKind::EncodingError(
		PropertyEncodingError::new(key, value, reason),
	))
}

fn ident_for_key(key: &str, values: &[String], existing: Option<&AtomIdent>) -> Result<AtomIdent> {
	if let Some(native) = ILST_MAP::native(key) {
		if let Some(ident) = AtomIdent::parse(native) {
			return Ok(ident);
		}
	}

	if let Some(ident) = existing {
		// `gnre` is never written, `©gen` is used instead
		if *ident != AtomIdent::Fourcc(*b"gnre") {
			return Ok(ident.clone());
		}
	}

	if let Some(ident) = key.strip_prefix(PASSTHROUGH_PREFIX) {
		return AtomIdent::parse(ident).ok_or_else(|| {
			let value = values.first().map_or("", String::as_str);
			encoding_error(key, value, "not a valid MP4 atom identifier")
		});
	}

	Ok(AtomIdent::Freeform {
		mean: String::from(ITUNES_MEAN),
		name: key_to_description(key).to_owned(),
	})
}

fn parse_pair(value: &str) -> Option<(u16, u16)> {
	let (number, total) = match value.split_once('/') {
		Some((number, total)) => (number, Some(total)),
		None => (value, None),
	};

	let number = number.trim().parse().ok()?;
	let total = match total {
		Some(total) => total.trim().parse().ok()?,
		None => 0,
	};

	Some((number, total))
}

fn encode_atom(key: &str, ident: AtomIdent, values: &[String]) -> Result<Option<Atom>> {
	let Some(first) = values.first() else {
		return Ok(None);
	};

	let fourcc = match ident {
		AtomIdent::Fourcc(fourcc) => fourcc,
		freeform @ AtomIdent::Freeform { .. } => {
			let data = values.iter().cloned().map(AtomData::UTF8).collect();
			return Ok(Atom::from_collection(freeform, data));
		},
	};

	let single = match &fourcc {
		b"trkn" | b"disk" => {
			let Some((number, total)) = parse_pair(first) else {
				err!(EncodingError(PropertyEncodingError::new(
					key,
					first,
					"expected a number or a number/total pair"
				)));
			};

			let mut data = vec![0, 0];
			data.extend(number.to_be_bytes());
			data.extend(total.to_be_bytes());
			if &fourcc == b"trkn" {
				data.extend([0, 0]);
			}

			AtomData::Unknown {
				code: DataType::Reserved,
				data,
			}
		},
		b"tmpo" => {
			let Ok(bpm) = first.trim().parse::<u16>() else {
				err!(EncodingError(PropertyEncodingError::new(
					key,
					first,
					"expected a number between 0 and 65535"
				)));
			};

			AtomData::SignedInteger(i32::from(bpm))
		},
		b"cpil" | b"pgap" | b"pcst" => {
			let Some(flag) = flag_item(first.trim()) else {
				err!(EncodingError(PropertyEncodingError::new(
					key,
					first,
					"expected a boolean (1, 0, true, false)"
				)));
			};

			AtomData::Bool(flag)
		},
		_ => {
			let data = values.iter().cloned().map(AtomData::UTF8).collect();
			return Ok(Atom::from_collection(ident, data));
		},
	};

	if let Some(extra) = values.get(1) {
		err!(EncodingError(PropertyEncodingError::new(
			key,
			extra,
			"holds a single value"
		)));
	}

	Ok(Some(Atom::new(ident, single)))
}

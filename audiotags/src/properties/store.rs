use crate::dialect::PictureEdit;
use crate::picture::Picture;

/// An ordered multi-map of canonical keys to values, plus the file's pictures
///
/// Keys are uppercased on insertion and compared case-insensitively. Entries keep the order in
/// which their key was first inserted, and a key never maps to an empty list or an empty string.
///
/// # Examples
///
/// ```rust
/// use audiotags::properties::PropertyStore;
///
/// let mut store = PropertyStore::new();
/// store.set("Artist", ["Foo", "Bar"]);
/// store.append("title", "Baz");
///
/// assert_eq!(store.get("ARTIST"), Some(&["Foo".to_string(), "Bar".to_string()][..]));
/// assert_eq!(store.keys().collect::<Vec<_>>(), vec!["ARTIST", "TITLE"]);
/// ```
///
/// ## Unread pictures
///
/// When a file is opened without [`ParseOptions::read_cover_art`], its pictures aren't in the
/// store. Pictures pushed with [`PropertyStore::push_picture`] are then added to the file's own,
/// while [`PropertyStore::set_pictures`] and [`PropertyStore::clear_pictures`] replace them.
///
/// [`ParseOptions::read_cover_art`]: crate::config::ParseOptions::read_cover_art
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyStore {
	entries: Vec<(String, Vec<String>)>,
	pictures: Vec<Picture>,
	/// The file's pictures were never read
	pictures_unread: bool,
	/// The file's unread pictures are to be replaced
	replaces_unread: bool,
}

pub(crate) fn normalize_key(key: &str) -> String {
	key.to_uppercase()
}

macro_rules! impl_accessors {
	($($name:ident => $key:literal),+ $(,)?) => {
		impl PropertyStore {
			paste::paste! {
				$(
					#[doc = "Returns the first `" $key "` value"]
					pub fn $name(&self) -> Option<&str> {
						self.get_first($key)
					}

					#[doc = "Sets `" $key "`, replacing any existing values"]
					pub fn [<set_ $name>](&mut self, value: impl Into<String>) {
						self.set($key, [value.into()])
					}

					#[doc = "Removes every `" $key "` value"]
					pub fn [<remove_ $name>](&mut self) {
						self.remove($key);
					}
				)+
			}
		}
	}
}

impl_accessors! {
	title        => "TITLE",
	artist       => "ARTIST",
	album        => "ALBUM",
	album_artist => "ALBUMARTIST",
	genre        => "GENRE",
	date         => "DATE",
	comment      => "COMMENT",
	track_number => "TRACKNUMBER",
	disc_number  => "DISCNUMBER",
	composer     => "COMPOSER",
	lyrics       => "LYRICS",
}

impl PropertyStore {
	/// Create an empty store
	pub fn new() -> Self {
		Self::default()
	}

	fn position(&self, key: &str) -> Option<usize> {
		let key = normalize_key(key);
		self.entries.iter().position(|(k, _)| *k == key)
	}

	/// All values of `key`, in order
	pub fn get(&self, key: &str) -> Option<&[String]> {
		self.position(key).map(|pos| self.entries[pos].1.as_slice())
	}

	/// The first value of `key`
	pub fn get_first(&self, key: &str) -> Option<&str> {
		self.get(key).and_then(|values| values.first()).map(String::as_str)
	}

	/// All values of `key` joined by `separator`
	///
	/// # Examples
	///
	/// ```rust
	/// use audiotags::properties::PropertyStore;
	///
	/// let mut store = PropertyStore::new();
	/// store.set("GENRE", ["Rock", "Pop"]);
	///
	/// assert_eq!(store.joined("genre", "; ").as_deref(), Some("Rock; Pop"));
	/// ```
	pub fn joined(&self, key: &str, separator: &str) -> Option<String> {
		self.get(key).map(|values| values.join(separator))
	}

	/// Whether `key` has any value
	pub fn contains(&self, key: &str) -> bool {
		self.position(key).is_some()
	}

	/// Replace every value of `key`
	///
	/// An existing key keeps its position. Empty strings are dropped, and if nothing remains
	/// the key is removed.
	pub fn set<I, V>(&mut self, key: &str, values: I)
	where
		I: IntoIterator<Item = V>,
		V: Into<String>,
	{
		if key.is_empty() {
			log::warn!("Ignoring a property with an empty key");
			return;
		}

		let values = values
			.into_iter()
			.map(Into::into)
			.filter(|v| !v.is_empty())
			.collect::<Vec<String>>();

		match (self.position(key), values.is_empty()) {
			(Some(pos), true) => {
				self.entries.remove(pos);
			},
			(Some(pos), false) => self.entries[pos].1 = values,
			(None, true) => {},
			(None, false) => self.entries.push((normalize_key(key), values)),
		}
	}

	/// Add a value to `key`, creating it if necessary
	pub fn append(&mut self, key: &str, value: impl Into<String>) {
		let value = value.into();
		if key.is_empty() || value.is_empty() {
			return;
		}

		match self.position(key) {
			Some(pos) => self.entries[pos].1.push(value),
			None => self.entries.push((normalize_key(key), vec![value])),
		}
	}

	/// Remove `key`, returning its values
	pub fn remove(&mut self, key: &str) -> Option<Vec<String>> {
		self.position(key).map(|pos| self.entries.remove(pos).1)
	}

	/// Remove every key
	///
	/// Pictures are left untouched.
	pub fn clear_all(&mut self) {
		self.entries.clear();
	}

	/// The keys, in insertion order
	pub fn keys(&self) -> impl Iterator<Item = &str> + Clone {
		self.entries.iter().map(|(k, _)| k.as_str())
	}

	/// Each key with all of its values
	pub fn entries(&self) -> impl Iterator<Item = (&str, &[String])> + Clone {
		self.entries.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
	}

	/// Every `(key, value)` pair, multi-valued keys yielding one pair per value
	pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + Clone {
		self.entries
			.iter()
			.flat_map(|(k, values)| values.iter().map(move |v| (k.as_str(), v.as_str())))
	}

	/// Owned version of [`PropertyStore::iter`]
	pub fn pairs(&self) -> Vec<(String, String)> {
		self.iter()
			.map(|(k, v)| (k.to_owned(), v.to_owned()))
			.collect()
	}

	/// The number of keys
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	/// Whether the store has no keys
	///
	/// Pictures aren't considered.
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// The pictures, in file order
	pub fn pictures(&self) -> &[Picture] {
		&self.pictures
	}

	/// Replace every picture
	pub fn set_pictures(&mut self, pictures: Vec<Picture>) {
		self.pictures = pictures;
		self.replaces_unread = self.pictures_unread;
	}

	/// Add a picture after the existing ones
	pub fn push_picture(&mut self, picture: Picture) {
		self.pictures.push(picture);
	}

	/// Remove every picture
	pub fn clear_pictures(&mut self) {
		self.pictures.clear();
		self.replaces_unread = self.pictures_unread;
	}

	pub(crate) fn mark_pictures_unread(&mut self) {
		self.pictures_unread = true;
	}

	/// Keys whose values differ from `loaded`, including keys that were removed
	pub(crate) fn changed_keys(&self, loaded: &PropertyStore) -> Vec<String> {
		let mut changed = self
			.entries
			.iter()
			.filter(|(k, v)| loaded.get(k) != Some(v.as_slice()))
			.map(|(k, _)| k.clone())
			.collect::<Vec<_>>();

		changed.extend(
			loaded
				.keys()
				.filter(|k| !self.contains(k))
				.map(str::to_owned),
		);

		changed
	}

	/// How the pictures have to be written back, `None` if they are unchanged from `loaded`
	pub(crate) fn picture_edit(&self, loaded: &PropertyStore) -> Option<PictureEdit<'_>> {
		if self.pictures_unread && !self.replaces_unread {
			return (!self.pictures.is_empty()).then_some(PictureEdit::Append(&self.pictures));
		}

		(self.replaces_unread || self.pictures != loaded.pictures)
			.then_some(PictureEdit::Replace(&self.pictures))
	}
}

impl<'a> IntoIterator for &'a PropertyStore {
	type Item = (&'a str, &'a str);
	type IntoIter = Box<dyn Iterator<Item = (&'a str, &'a str)> + 'a>;

	fn into_iter(self) -> Self::IntoIter {
		Box::new(self.iter())
	}
}

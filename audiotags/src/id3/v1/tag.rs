use super::constants::{GENRES, genre_index};
use crate::properties::PropertyStore;

/// ID3v1 is a severely limited format, with each field
/// being incredibly small in size. All fields have been
/// commented with their maximum sizes and any other additional
/// restrictions.
///
/// Attempting to write a field greater than the maximum size
/// will **not** error, it will just be shrunk. Text that can't be
/// represented as Latin-1 is replaced with `?`.
///
/// ## Canonical keys
///
/// * `title` <-> `TITLE`
/// * `artist` <-> `ARTIST`
/// * `album` <-> `ALBUM`
/// * `year` <-> `DATE` (only the year is kept)
/// * `comment` <-> `COMMENT`
/// * `track_number` <-> `TRACKNUMBER` (the track total is dropped)
/// * `genre` <-> `GENRE` (the name at [`GENRES`]\[index\])
#[derive(Default, Debug, PartialEq, Eq, Clone)]
pub struct Id3v1Tag {
	/// Track title, 30 bytes max
	pub title: Option<String>,
	/// Track artist, 30 bytes max
	pub artist: Option<String>,
	/// Album title, 30 bytes max
	pub album: Option<String>,
	/// Release year (max 9999)
	pub year: Option<u16>,
	/// A short comment
	///
	/// A V1 tag may have been read, which limits this field to 30 bytes.
	/// A V1.1 tag only has 28 bytes available, and is always what gets written.
	pub comment: Option<String>,
	/// The track number, 1 byte max
	///
	/// The track number **cannot** be 0, as a null byte at the end of the comment
	/// is what differentiates V1 and V1.1.
	pub track_number: Option<u8>,
	/// The track's genre, an index into [`GENRES`]
	pub genre: Option<u8>,
}

impl Id3v1Tag {
	/// Create a new empty `Id3v1Tag`
	///
	/// # Examples
	///
	/// ```rust
	/// use audiotags::id3::v1::Id3v1Tag;
	///
	/// let id3v1_tag = Id3v1Tag::new();
	/// assert!(id3v1_tag.is_empty());
	/// ```
	pub fn new() -> Self {
		Self::default()
	}

	/// Whether every field is empty
	pub fn is_empty(&self) -> bool {
		self.title.is_none()
			&& self.artist.is_none()
			&& self.album.is_none()
			&& self.year.is_none()
			&& self.comment.is_none()
			&& self.track_number.is_none()
			&& self.genre.is_none()
	}

	/// The genre name, if the index is valid
	pub fn genre_name(&self) -> Option<&'static str> {
		self.genre.and_then(|idx| GENRES.get(usize::from(idx)).copied())
	}

	pub(crate) fn decode(&self) -> Vec<(String, String)> {
		let mut pairs = Vec::new();

		let mut push = |key: &str, value: Option<String>| {
			if let Some(value) = value.filter(|v| !v.is_empty()) {
				pairs.push((key.to_owned(), value));
			}
		};

		push("TITLE", self.title.clone());
		push("ARTIST", self.artist.clone());
		push("ALBUM", self.album.clone());
		push("DATE", self.year.map(|y| y.to_string()));
		push("COMMENT", self.comment.clone());
		push("TRACKNUMBER", self.track_number.map(|t| t.to_string()));
		push("GENRE", self.genre_name().map(str::to_owned));

		pairs
	}

	/// Snapshot the common keys of `store`
	pub(crate) fn from_store(store: &PropertyStore) -> Self {
		let year = store
			.date()
			.and_then(|date| date.get(..4))
			.and_then(|year| year.parse::<u16>().ok())
			.map(|year| year.min(9999));

		let track_number = store
			.track_number()
			.and_then(|track| track.split('/').next())
			.and_then(|track| track.trim().parse::<u8>().ok())
			.filter(|track| *track != 0);

		let genre = store.genre().and_then(|genre| {
			genre_index(genre).or_else(|| {
				genre
					.parse::<u8>()
					.ok()
					.filter(|idx| usize::from(*idx) < GENRES.len())
			})
		});

		Self {
			title: store.title().map(str::to_owned),
			artist: store.artist().map(str::to_owned),
			album: store.album().map(str::to_owned),
			year,
			comment: store.comment().map(str::to_owned),
			track_number,
			genre,
		}
	}
}

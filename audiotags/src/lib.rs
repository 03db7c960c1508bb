//! Read and write tags and metadata of FLAC, MPEG and MP4 audio files.
//!
//! # Supported Formats
//!
//! | Container | Metadata                                  |
//! |-----------|-------------------------------------------|
//! | FLAC      | Vorbis comments, `PICTURE` blocks         |
//! | MPEG      | ID3v2 (2.2, 2.3, 2.4), ID3v1              |
//! | MP4       | `ilst` atoms                              |
//!
//! APEv2 and Lyrics3v2 trailers in MPEG files, and ID3v2 tags in front of FLAC streams, are
//! located and retained, but never interpreted.
//!
//! # Overview
//!
//! Every format's native fields are translated to a single [`PropertyStore`], an ordered
//! multi-map of uppercase keys (`TITLE`, `ARTIST`, `TRACKNUMBER`, ...) to values. Fields that
//! have no common name are still exposed, under a dialect-specific passthrough key (such as
//! `ID3V2:TXYZ` or `MP4:©ST3`), and fields that can't be represented as text are kept
//! untouched across writes.
//!
//! The audio stream itself is located, but never decoded or modified.
//!
//! # Examples
//!
//! ## Reading properties
//!
//! ```rust,no_run
//! # fn main() -> audiotags::error::Result<()> {
//! use audiotags::config::ParseOptions;
//! use audiotags::file::AudioFile;
//!
//! let file = AudioFile::open_from_path("song.mp3", ParseOptions::new())?;
//!
//! let store = file.properties()?;
//! println!("{:?} by {:?}", store.title(), store.artist());
//!
//! let properties = file.read_audio_properties()?;
//! println!("{} ms at {} Hz", properties.duration_ms(), properties.sample_rate());
//! # Ok(())
//! # }
//! ```
//!
//! ## Writing properties
//!
//! ```rust,no_run
//! # fn main() -> audiotags::error::Result<()> {
//! use audiotags::config::{ParseOptions, WriteOptions};
//! use audiotags::file::AudioFile;
//!
//! let mut file = AudioFile::open_from_path("song.m4a", ParseOptions::new())?;
//!
//! // Edits stay in memory...
//! let store = file.properties_mut()?;
//! store.set_title("New title");
//! store.set("ARTIST", ["Foo", "Bar"]);
//!
//! // ...until they're committed
//! file.save(WriteOptions::default())?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Inspecting the structure of a file
//!
//! ```rust,no_run
//! # fn main() -> audiotags::error::Result<()> {
//! use audiotags::probe::Probe;
//! use std::fs::File;
//! use std::io::BufReader;
//!
//! let reader = BufReader::new(File::open("song.flac")?);
//! let model = Probe::new(reader).guess_file_type()?.read()?;
//!
//! for block in model.blocks() {
//! 	println!("{:?} at {} ({} bytes)", block.dialect(), block.offset(), block.len());
//! }
//! # Ok(())
//! # }
//! ```
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod config;
pub mod dialect;
pub mod error;
pub mod file;
pub(crate) mod macros;
pub mod model;
pub mod picture;
pub mod probe;
pub mod properties;
mod util;

pub(crate) mod flac;
pub mod id3;
pub mod mp4;
pub(crate) mod mpeg;
pub mod vorbis;

pub use crate::file::AudioFile;
pub use crate::properties::PropertyStore;

pub use util::text::TextEncoding;

pub mod prelude {
	//! A prelude for commonly used items in the library.
	//!
	//! This module is intended to be wildcard imported.
	//!
	//! ```rust
	//! use audiotags::prelude::*;
	//! ```

	pub use crate::config::{ParseOptions, WriteOptions};
	pub use crate::file::{AudioFile, FileType};
	pub use crate::properties::{AudioProperties, PropertyStore};
}

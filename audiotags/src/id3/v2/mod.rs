//! ID3v2 items and utilities
//!
//! ## Important notes
//!
//! See:
//!
//! * [`Id3v2Tag`]
//! * [`Frame`]

mod frame;
mod header;
pub(crate) mod read;
mod tag;
pub mod util;
mod write;

pub use frame::{Frame, FrameContent, FrameFlags, LanguageFrame};
pub use header::{Id3v2TagFlags, Id3v2Version};
pub use tag::Id3v2Tag;

pub(crate) use header::Id3v2Header;

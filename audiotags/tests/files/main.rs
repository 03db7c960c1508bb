#![allow(missing_docs)]

mod flac;
mod handle;
mod mp4;
mod mpeg;
pub(crate) mod util;

//! File handles and format detection

mod audio_file;
mod commit;
mod file_type;

pub use audio_file::AudioFile;
pub use file_type::{EXTENSIONS, FileType};

pub(crate) use file_type::BufferGuess;

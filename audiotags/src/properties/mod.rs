//! The normalized property model shared by every dialect

mod audio;
mod store;

pub use audio::AudioProperties;
pub use store::PropertyStore;

pub(crate) use store::normalize_key;

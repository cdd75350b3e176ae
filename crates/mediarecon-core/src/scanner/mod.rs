pub mod locate;
pub mod walk;

pub use locate::{split_duplicate_suffix, Locator};
pub use walk::{
    contains_media, has_extension, is_sample, list_media_files, MUSIC_EXTENSIONS, VIDEO_EXTENSIONS,
};

//! Low-level byte codecs shared by the posting list store and persistence

pub mod rle;
pub mod vbyte;

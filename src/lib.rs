//! Media Sorter Library
//!
//! Watches a drop folder for new video files, works out whether each is a
//! movie or a TV episode from its name, proposes a canonical name and files
//! it into a `Movies/` or `TV/<Title>/Season <N>/` library layout.

pub mod cli;
pub mod core;
pub mod error;
pub mod models;
pub mod utils;

pub use error::{Error, Result};

//! Frontcode: compressed, randomly addressable lists of element strings.
//!
//! A front-coded list stores every `ratio`-th entry verbatim (an anchor) and
//! every other entry as the length of the prefix it shares with its
//! predecessor plus the differing suffix. An anchor table gives direct access
//! to each block, so a lookup costs at most `ratio` record decodes.
//!
//! The crate provides:
//! - [`FrontCodedList`] and [`FrontCodedBigList`] (`list`, `cursor`)
//! - The record codec (`codec`) and segmented storage (`storage`)
//! - A stable persisted layout (`persist`)
//! - An optional CLI (`cli` feature)
//!
//! # Quick Start
//!
//! ```
//! use frontcode::FrontCodedList;
//!
//! let urls = ["http://a.example/", "http://a.example/x", "http://b.example/"];
//! let list = FrontCodedList::<u8>::build(urls.iter().map(|u| u.as_bytes()), 4).unwrap();
//!
//! assert_eq!(list.get(1).unwrap(), b"http://a.example/x");
//!
//! let mut cursor = list.cursor_at(3).unwrap();
//! assert_eq!(cursor.previous_entry().unwrap(), b"http://b.example/");
//!
//! let bytes = list.to_bytes().unwrap();
//! let back = FrontCodedList::<u8>::from_bytes(&bytes).unwrap();
//! assert_eq!(back.len(), 3);
//! ```

pub mod codec;
pub mod cursor;
pub mod error;
pub mod list;
pub mod persist;
pub mod storage;

#[cfg(feature = "cli")]
pub mod cli;

pub use codec::{DEFAULT_RATIO, Element, FrontCodedOptions};
pub use cursor::{Cursor, Iter};
pub use error::{Error, Result};
pub use list::{FrontCodedBigList, FrontCodedList, ListStats};
pub use storage::{Big, IndexWidth, Standard};

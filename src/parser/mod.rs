//! Input validation for mod URLs and batch sources.
//!
//! Everything here runs before any network activity: a malformed URL or
//! batch entry is rejected with a [`ValidationError`] so no download starts
//! from a half-valid request.
//!
//! # Example
//!
//! ```
//! use mod_downloader_core::parser::{parse_batch_input, BatchFormat};
//!
//! let batch = parse_batch_input(
//!     "# favourites\nhttps://mods.factorio.com/mod/flib\n",
//!     "https://mods.factorio.com",
//! )
//! .unwrap();
//! assert_eq!(batch.format, BatchFormat::Lines);
//! assert_eq!(batch.urls, vec!["https://mods.factorio.com/mod/flib"]);
//! ```

mod error;
mod input;
mod url;

pub use error::{MAX_URL_LENGTH, ValidationError};
pub use input::{BatchFormat, BatchInput, parse_batch_input};
pub use url::{mod_identity_from_url, mod_name_from_url, validate_mod_url, validate_mod_url_for};

//! Internal domain modules for the ReinventProse core library.
//!
//! All public types from these modules are re-exported at the crate root
//! with `#[doc(inline)]`; import from there in preference to this module.

pub mod assets;
pub mod book;
pub mod chapter;
pub mod error;
pub mod export;
pub mod image_info;
pub mod layout;
pub mod library;
pub mod markup;
pub mod session;
pub mod storage;

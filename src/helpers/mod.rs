//! Helper functions for the page shell

mod date;
mod html;
mod url;

pub use date::*;
pub use html::*;
pub use url::*;

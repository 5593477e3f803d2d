//! HTTP Handlers

mod objects;
mod ping;
mod speak;
mod voice;

pub use objects::*;
pub use ping::*;
pub use speak::*;
pub use voice::*;

//! Reversible content transformers applied between storage drivers and
//! the HTTP surface.

pub mod age;
pub mod encryption;
pub mod helper;
pub mod traits;

pub use age::AgeKeyHelper;
pub use encryption::EncryptionTransformer;
pub use helper::KeyHelper;
pub use traits::Transformer;

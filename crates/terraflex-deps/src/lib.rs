//! Resolves external helper binaries (currently `age`/`age-keygen`) into
//! a content-addressable local cache.

pub mod age;
pub mod downloader;
pub mod resolver;

pub use age::AgeDownloader;
pub use downloader::Downloader;
pub use resolver::DependencyResolver;

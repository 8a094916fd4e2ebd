pub mod config;
pub mod logging;

pub mod bridge;
pub mod capability;
pub mod checksum;
pub mod classifier;
pub mod context;
pub mod error;
pub mod feedback;
pub mod filename;
pub mod host;
pub mod materializer;
pub mod media;
pub mod sink;
pub mod storage;
pub mod transfer;

#[cfg(test)]
pub(crate) mod testing;

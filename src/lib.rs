pub mod config;
pub mod decode;
pub mod error;
pub mod geometry;
pub mod layout;
pub mod page;
pub mod settings;
pub mod source;
#[cfg(test)]
mod test_util;
pub mod tracker;
pub mod viewer;
pub mod viewport;
pub mod worker;

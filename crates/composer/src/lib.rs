pub mod composer;
pub mod entity;
pub mod error;
pub mod join;
pub mod last_row;
pub mod plan;
pub mod projection;
pub mod registry;
pub mod source;
pub mod sync;
pub mod unzip;

#[cfg(test)]
pub(crate) mod test_utils;

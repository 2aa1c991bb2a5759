pub mod aggregate;
pub mod cache;
pub mod config;
pub mod error;
pub mod fetch;
pub mod server;
pub mod table;

#[cfg(test)]
pub(crate) mod test_support;

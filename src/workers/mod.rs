pub mod claims;
pub mod error;
pub mod pipeline;
pub mod scheduler;

#[cfg(test)]
pub(crate) mod testing;

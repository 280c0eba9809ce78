pub mod condition;
pub mod endpoint;
pub mod tls;

pub use condition::*;
pub use endpoint::*;

#[cfg(test)]
mod tests;

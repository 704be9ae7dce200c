mod interface;
mod memory;
mod optimistic;
#[cfg(test)]
mod tests;

pub use interface::*;
pub use memory::*;
pub use optimistic::*;

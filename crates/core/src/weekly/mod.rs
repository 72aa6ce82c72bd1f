pub mod change;
pub mod error;
pub mod pipeline;
pub mod rank;

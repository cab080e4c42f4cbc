pub mod feedforward;
pub mod lstm;

pub use feedforward::{FeedForwardNet, FeedForwardNetConfig};
pub use lstm::{LstmNet, LstmNetConfig};

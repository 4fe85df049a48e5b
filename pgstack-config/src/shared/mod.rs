mod connection;
mod retry;

pub use connection::*;
pub use retry::*;

pub mod conversions;
pub mod network;
pub mod snapshot;

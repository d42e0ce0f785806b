pub mod control;
pub mod data;
pub mod pasv;
pub mod stream;

pub use control::ControlConnection;
pub use data::{DataChannelFactory, PassiveDataChannelFactory};
pub use pasv::PassiveMode;
pub use stream::{AsyncStream, BoxedStream, ControlLease, TransferStream};

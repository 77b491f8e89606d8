#![allow(dead_code)]

mod mock_transport;
mod packets;

pub use mock_transport::MockTransport;
pub use packets::*;

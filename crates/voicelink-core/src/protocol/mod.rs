//! Protocol module containing message types and the JSON frame codec.

pub mod codec;
pub mod messages;

pub use codec::{decode_frame, encode_frame, DecodeError, CLOSE_NORMAL};
pub use messages::*;

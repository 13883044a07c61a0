pub mod codec;
pub mod framer;

pub use codec::{
    decode_request, decode_response, encode_request, Request, Response, ResponseHead,
};
pub use framer::{read_response, write_request, FrameLimits};

//! Chat response protocol
//!
//! Decoding and interpretation of the backend's `/chat` responses: a
//! reusable newline-delimited stream decoder, the record shapes of both
//! response variants, and the assembler that folds records into an
//! in-progress message.

pub mod assembler;
pub mod decoder;
pub mod record;

pub use assembler::{assemble_unary, Applied, ResponseAssembler};
pub use decoder::LineDecoder;
pub use record::{parse_record, ChatCompletion, StreamRecord};

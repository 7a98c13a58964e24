pub mod accumulator;
pub mod cursor;
pub mod decoder;
pub mod framer;

pub use accumulator::AnswerAccumulator;
pub use cursor::ChatStream;
pub use decoder::{EventDecoder, LineOutcome};
pub use framer::LineFramer;

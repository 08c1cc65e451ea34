//! Scanner protocol: request building, the cursor state machine, page
//! decoding and the pull-based cell stream on top.

pub mod cursor;
pub mod decode;
pub mod request;
pub mod stream;

pub use cursor::{CursorPhase, ScanCursor};
pub use decode::decode_rows;
pub use stream::ScanStream;

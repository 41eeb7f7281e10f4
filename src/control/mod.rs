//! Control-mode wire format: octal decoding, layout strings, and the line
//! parser that ties them together into typed events.

pub mod decode;
pub mod layout;
pub mod parser;

pub use layout::{parse_layout, strip_checksum, LayoutNode};
pub use parser::{ControlEvent, ControlParser};

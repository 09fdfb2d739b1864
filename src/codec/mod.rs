// Front-coding codec.
//
// # Modules
//
// - `varint`  - Variable-length integer encoding (base-128, big-endian)
// - `element` - Fixed-width element types and their big-endian encoding
// - `encoder` - Anchor/delta record emission and construction options
// - `decoder` - Bounds-checked record replay

pub mod decoder;
pub mod element;
pub mod encoder;
pub mod varint;

pub use decoder::RecordReader;
pub use element::Element;
pub use encoder::{DEFAULT_RATIO, Encoded, Encoder, FrontCodedOptions};

// Storage beneath the codec.
//
// - `width`     - Standard vs. big index widths and persisted field sizes
// - `segmented` - Fixed-capacity segments with seam-transparent reads

pub mod segmented;
pub mod width;

pub use segmented::{SegmentWriter, SegmentedBuffer};
pub use width::{BIG_SEGMENT_SIZE, Big, IndexWidth, Standard};

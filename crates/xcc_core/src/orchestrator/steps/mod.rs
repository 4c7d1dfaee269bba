//! Pipeline step implementations.
//!
//! Each step handles one stage of the clock-drift pipeline.

mod drift;
mod export;
mod preprocess;
mod regress;
mod segment;

pub use drift::EstimateDriftStep;
pub use export::ExportStep;
pub use preprocess::PreprocessStep;
pub use regress::RegressStep;
pub use segment::SegmentStep;

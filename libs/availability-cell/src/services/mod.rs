pub mod fallback;
pub mod resolver;
pub mod sequencer;
pub mod source;

pub use fallback::FallbackSchedule;
pub use resolver::SlotResolver;
pub use sequencer::SlotQuerySequencer;
pub use source::{HttpSlotSource, SlotSource};

//! Stream plumbing: initial-message framing and credit-based delivery.
//!
//! - [`frame_buffer`]: reassemble the first encoded object of a chunked stream
//! - [`credit`]: consumer-granted credit
//! - [`event`]: credit-governed event channel
//! - [`initial`]: a task splitting a stream into initial message + events

pub mod credit;
pub mod event;
pub mod frame_buffer;
pub mod initial;

pub use credit::CreditController;
pub use event::{event_channel, EventSender, EventStream};
pub use frame_buffer::{BufferAccumulator, BufferingPolicy, FramePolicy, PassThroughPolicy};
pub use initial::{split_initial_message, InitialMessage, SplitStream};

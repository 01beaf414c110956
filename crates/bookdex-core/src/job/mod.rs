//! Job lifecycle types shared between the progress actor, the pipelines, and
//! the transport.

mod envelope;
mod state;

pub use envelope::{ClientMessage, ENVELOPE_VERSION, MessageType, ProgressMessage};
pub use state::{InvalidTransition, JobPipeline, JobState, JobStatus, TransitionOutcome};

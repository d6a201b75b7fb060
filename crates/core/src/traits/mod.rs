//! Seam traits between the pipeline and its collaborators

mod briefing;
mod devices;
mod handler;
mod llm;
mod planner;
mod search;
mod sinks;

pub use briefing::{BriefingSource, Story};
pub use devices::{DeviceController, DeviceDescriptor, DeviceState};
pub use handler::{ChunkStream, Handler};
pub use llm::{GenerateResponse, IntentModel, LanguageModel};
pub use planner::{EventRange, NewEvent, PlannerEvent, PlannerStore};
pub use search::{SearchBackend, SearchHit};
pub use sinks::{SpeechSink, UiSink};

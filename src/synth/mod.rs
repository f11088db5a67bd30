// Purpose: Voice management
// This layer sits above graph nodes and owns every sounding key

pub mod factory;
pub mod manager;
pub mod message;
pub mod voice;

pub use manager::{VoiceManager, VoiceRequest, VoiceStats};
pub use message::Notification;
pub use voice::{VoiceId, VoiceStage};

//! External provider clients.
//!
//! Every provider sits behind a narrow async trait so the pipeline can be
//! driven by fakes in tests:
//! - [`ScriptGenerator`]: OpenAI-compatible chat completions
//! - [`SpeechSynthesizer`]: ElevenLabs text-to-speech
//! - [`StockMediaSource`]: Pexels image and video search
//! - [`Transcriber`]: AssemblyAI speech-to-text

pub mod error;
pub mod script;
pub mod stock;
pub mod transcribe;
pub mod tts;

pub use error::{ProviderError, ProviderResult};
pub use script::{parse_script, OpenAiConfig, OpenAiScriptClient, ScriptGenerator};
pub use stock::{PexelsClient, PexelsConfig, StockItem, StockMediaSource, StockQuery};
pub use transcribe::{AssemblyAiClient, AssemblyAiConfig, Transcriber};
pub use tts::{ElevenLabsClient, ElevenLabsConfig, SpeechSynthesizer, VoiceSelector};

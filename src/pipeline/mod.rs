//! Photo enrichment pipeline.
//!
//! Every inbound photo flows through:
//! 1. `Messenger::resolve_file_url()` for the largest variant
//! 2. `SafetyScreen::screen()`, the only gate; failures reject
//! 3. `ObjectDetector::detect()` and `BrandRecognizer::recognize()`, concurrently
//! 4. `PhotoStore::insert_photo()`, then a summary reply to the sender

pub mod processor;
pub mod reply;
pub mod types;

pub use processor::{PhotoProcessor, ProcessorDeps};
pub use types::WebhookOutcome;

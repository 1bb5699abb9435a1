pub mod gemini;
pub mod metrics_manager;
pub mod responder;

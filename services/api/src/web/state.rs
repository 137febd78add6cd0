//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use crate::web::token::TokenIssuer;
use medreport_core::ports::{AnswerGenerationService, DatabaseService, TextExtractionService};
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all handlers.
pub struct AppState {
    pub db: Arc<dyn DatabaseService>,
    pub extractor: Arc<dyn TextExtractionService>,
    pub answerer: Arc<dyn AnswerGenerationService>,
    pub tokens: TokenIssuer,
    pub config: Arc<Config>,
}

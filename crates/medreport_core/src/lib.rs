pub mod domain;
pub mod ports;

pub use domain::{
    ChatMessage, NewReport, NewUser, Report, ReportSummary, ReportType, Sender, User,
    UserCredentials,
};
pub use ports::{
    AnswerGenerationService, DatabaseService, PortError, PortResult, TextExtractionService,
};

pub mod answer_llm;
pub mod db;
pub mod pdf;

pub use answer_llm::OpenAiAnswerAdapter;
pub use db::PgAdapter;
pub use pdf::LopdfExtractor;

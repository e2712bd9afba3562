pub mod completion_llm;
pub mod db;

pub use completion_llm::CompletionGatewayAdapter;
pub use db::DbAdapter;

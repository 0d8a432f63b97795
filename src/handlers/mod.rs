pub mod detection;
pub mod status;

pub use detection::{AppState, DetectResponse, HistoryResponse, detect, get_history};
pub use status::system_status;

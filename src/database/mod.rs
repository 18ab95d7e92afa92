mod history_data;
mod table;

pub use history_data::HistoryCache;
pub use history_data::HistoryData;
pub use history_data::clear_history;
pub use history_data::load_full_history;
pub use history_data::store_recognized;
pub use history_data::store_translation;

pub mod profile;
pub mod store;
pub mod task;
pub mod time_entry;

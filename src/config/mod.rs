pub mod runfile;
pub mod settings;

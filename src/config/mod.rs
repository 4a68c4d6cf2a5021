pub mod loader;
pub mod types;

#[allow(unused_imports)]
pub use loader::get_settings;
#[allow(unused_imports)]
pub use types::Settings;

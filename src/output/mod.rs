pub mod fallback;
pub mod suggestion_parser;

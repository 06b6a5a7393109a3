pub mod attributes;
pub mod parser;
pub mod record;
pub mod utils;

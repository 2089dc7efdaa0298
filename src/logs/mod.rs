pub mod ansi;
pub mod stream;

pub mod png_output;

pub use png_output::{encode_png, encode_rgba_png};

//! 纯文本导出

pub mod liner;
pub mod text_maker;

pub use liner::{wrap_line, Line, Liner};
pub use text_maker::make_text;

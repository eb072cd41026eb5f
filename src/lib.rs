mod error;
mod fonts;
mod model;
mod pdf;

pub use error::Error;
pub use fonts::BuiltinFont;
pub use model::{PageNumbering, Report, Section, TocEntry};

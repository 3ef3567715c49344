//! 隐私层：脱敏类别、基于本地模型的脱敏器、残留数据扫描

pub mod anonymizer;
pub mod category;
pub mod verify;

pub use anonymizer::{AnonymizedMessage, Anonymizer};
pub use category::{detect_categories, Category};
pub use verify::ResidualScanner;

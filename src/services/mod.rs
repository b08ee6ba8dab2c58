pub mod bingdict;
pub mod collins;
pub mod dict_source;
pub mod dictcn;
pub mod export_writer;
pub mod failure_writer;
pub mod html;
pub mod source;
pub mod webster;

pub use dict_source::DictSource;
pub use export_writer::ExportWriter;
pub use failure_writer::AssetFailureWriter;
pub use source::{LookupError, SourceAdapter};

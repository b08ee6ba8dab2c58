pub mod dictionary;
pub mod entry;
pub mod loaders;

pub use dictionary::{Dictionary, UnknownDictionary};
pub use entry::{Definition, Entry, Sense};
pub use loaders::WordStream;

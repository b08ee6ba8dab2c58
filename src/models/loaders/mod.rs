pub mod word_list;

pub use word_list::WordStream;

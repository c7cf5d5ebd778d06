mod command;
mod model;
mod parse;
mod source;

pub use model::RawNode;
pub use parse::parse_tree;
pub use source::{CommandSource, FileSource, StaticSource, TreeSource};

pub mod pipeline;
pub mod probe;
pub mod renamer;
pub mod scanner;
pub mod segment;
pub mod tagger;

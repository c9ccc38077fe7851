#![allow(rustdoc::bare_urls)]
#![doc = include_str!("../README.md")]

mod error;
mod graph;
mod parse;
mod words;

pub use error::Error;
pub use graph::Graph;
pub use words::{Lexicon, SampleSeq};

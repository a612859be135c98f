//! wikibot command-line front end.

pub mod cli;
pub mod fs_store;

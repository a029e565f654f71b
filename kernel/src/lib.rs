// Tally Kernel
//
// Core correctness primitives for appending survey records to a
// shared, versioned JSON document in a git-hosted file store.

pub mod append;
pub mod document;
pub mod paths;
pub mod question;
pub mod store;

pub mod cli;
pub mod stripper;
pub mod traversal;
pub mod types;

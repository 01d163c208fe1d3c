pub mod command;
pub mod decode;
pub mod filter;
pub mod info;

#![cfg_attr(feature = "strict", deny(warnings))]

#[macro_use]
extern crate text_io;

pub mod api;
pub mod cli;
pub mod commands;
pub mod deploy;
pub mod error;
pub mod http;
pub mod proxy;
pub mod results;
pub mod settings;
pub mod terminal;
pub mod validation;
pub mod worker;

pub use error::CommandError;

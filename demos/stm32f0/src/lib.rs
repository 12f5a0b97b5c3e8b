#![no_std]

pub mod lines;
pub mod time_source;

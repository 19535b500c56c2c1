pub mod common;
mod signing;

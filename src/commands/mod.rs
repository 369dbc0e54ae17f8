// ABOUTME: Command module exports
// ABOUTME: Operation boundary between the console and the employee store

pub mod employees;

pub use employees::*;

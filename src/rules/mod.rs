// Rule model: ordered rules, each naming an option and an ordered list of actions

pub mod action;

pub use action::*;

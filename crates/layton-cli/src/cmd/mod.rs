pub mod config;
pub mod errands;
pub mod orient;
pub mod protocols;
pub mod rolodex;

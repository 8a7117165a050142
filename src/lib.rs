//! Bookshelf Application Library
//!
//! Hosts the application modules mounted by the HTTP facade.

pub mod modules;

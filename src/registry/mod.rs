//! Registry catalog and the npm command interface.

pub mod catalog;
pub mod npm;

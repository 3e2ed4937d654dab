//! On-board device models reached through the IO, lookup and
//! scratch+control banks.

pub mod dp;
pub mod mc;
pub mod ramdac;

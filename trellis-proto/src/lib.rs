//! Trellis wire protocol: newline framing over an unaligned byte stream,
//! and the command grammar spoken on top of it.

pub mod command;
pub mod line;

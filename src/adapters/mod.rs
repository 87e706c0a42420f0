mod memory;
mod terminal;

pub use memory::{Element, MemoryPage};
pub use terminal::{BoardError, TerminalBoard, poll_settled};

pub mod audio;
pub mod schedule;

pub use schedule::{Epoch, Fired, Scheduler};

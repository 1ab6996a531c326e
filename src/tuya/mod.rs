pub mod datapoint;
pub mod frame;

pub use frame::{DpFrame, DpRecord, TuyaCommand};

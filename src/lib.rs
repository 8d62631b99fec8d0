pub mod logging;
pub mod sketch;

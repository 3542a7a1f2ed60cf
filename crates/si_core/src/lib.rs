pub mod animation;
pub mod sheet;
pub mod time;

//! Types that are really the bedrock of the app.

pub mod photo;
pub mod tags;

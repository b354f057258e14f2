pub mod mime;
pub mod object;
pub mod poll;
pub mod prefix;

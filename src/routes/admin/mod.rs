mod campaigns;
mod logout;

pub use campaigns::*;
pub use logout::*;

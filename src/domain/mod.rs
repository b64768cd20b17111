mod campaign;
mod intention;
mod new_subscriber;
mod subscriber;
mod subscriber_email;
mod subscriber_name;
mod subscriber_phone;
mod token;

pub use campaign::*;
pub use intention::*;
pub use new_subscriber::*;
pub use subscriber::*;
pub use subscriber_email::*;
pub use subscriber_name::*;
pub use subscriber_phone::*;
pub use token::*;

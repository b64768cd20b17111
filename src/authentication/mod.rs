mod jwt;
mod middleware;
mod password;
mod rate_limit;
mod session;

pub use jwt::*;
pub use middleware::*;
pub use password::*;
pub use rate_limit::*;
pub use session::*;

mod jwt;
mod middleware;
mod password;

pub use jwt::{create_session_token, verify_session_token, Claims};
pub use middleware::{
    auth_middleware, clear_session_cookie, session_cookie, AuthUser, SESSION_COOKIE,
};
pub use password::{hash_password, verify_password};

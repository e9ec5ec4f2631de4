mod log_in;
mod me;
mod middleware;
mod password;
mod register;
mod token;
mod user;

pub use log_in::log_in;
pub use me::get_current_user;
pub use middleware::auth_guard;
pub use password::{PasswordHash, ValidatedPassword};
pub use register::{TokenResponse, register_user};
pub use token::{DEFAULT_TOKEN_DURATION, TokenKeys, issue_token, verify_token};
pub use user::{
    UserID, UserProfile, create_user, create_user_table, get_user_by_email, get_user_by_id,
};

#[cfg(test)]
pub use middleware::AuthState;
#[cfg(test)]
pub use user::User;

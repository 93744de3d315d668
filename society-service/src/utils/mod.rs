mod extract;
mod html;
pub mod password;

pub use extract::Payload;
pub use html::escape_html;
pub use password::{check_password_policy, hash_password, verify_password, Password};

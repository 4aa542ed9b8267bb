//! Authentication primitives

mod clock;
mod jwt;
mod password;

pub use clock::{Clock, ManualClock, SystemClock};
pub use jwt::{Claims, JwtService, TokenKind, TokenPair, SIGNING_ALGORITHM};
pub use password::{
    hash_password, validate_password_strength, verify_password, PasswordService,
};

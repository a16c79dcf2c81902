pub mod cookie;
pub mod guard;
pub mod password;
pub mod role;
pub mod session;

pub use cookie::{read_cookie, SessionCookie};
pub use guard::{authorize, tenant_scope, AuthResult, TenantScope};
pub use password::{
    hash_password, meets_minimum_length, verify_credentials, verify_password, PasswordError,
};
pub use role::{Role, UnknownRole};
pub use session::{Claims, SessionCodec, SessionError, SessionPayload, Sessions};

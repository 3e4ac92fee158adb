//! Authentication

mod token;

pub use token::AccessToken;
pub use token::AnonymousTokenProvider;
pub use token::StaticTokenProvider;
pub use token::TokenProvider;

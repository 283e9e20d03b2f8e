pub mod secret;

pub use secret::{gen_password, join_tags, split_tags, SecretRecord};

/// Blogr Crypto Library
///
/// Password hashing for stored credentials. Digests are Argon2id PHC
/// strings, so the salt and parameters travel with the hash.
pub mod password;

use uuid::Uuid;

/// Number of hex characters in a paste key.
pub const KEY_LEN: usize = 8;

/// Generate a short paste key from a random UUID.
pub fn generate_key() -> String {
    let mut key = Uuid::new_v4().simple().to_string();
    key.truncate(KEY_LEN);
    key
}

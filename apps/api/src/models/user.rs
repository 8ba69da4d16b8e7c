use uuid::Uuid;

/// Display name given to users created lazily on their first write.
pub fn default_username(id: Uuid) -> String {
    let simple = id.simple().to_string();
    format!("user-{}", &simple[..8])
}

// Helper for generating user identifiers.
//
// Identifiers are UUIDv7 (timestamp-sortable) and generated app-side so a
// `User` value is complete before it reaches the store.

use uuid::Uuid;

/// Generate a new UUIDv7 (timestamp-sortable).
pub fn uuidv7() -> Uuid {
    Uuid::now_v7()
}

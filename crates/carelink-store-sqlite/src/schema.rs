//! SQL schema for the CareLink SQLite backend.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Schemaless document collections. Bodies are JSON objects; the only
-- structured columns are the ones every document shares.
CREATE TABLE IF NOT EXISTS documents (
    collection  TEXT NOT NULL,
    doc_id      TEXT NOT NULL,
    created_at  TEXT NOT NULL,   -- ISO 8601 UTC; server-assigned
    body        TEXT NOT NULL,   -- JSON object
    PRIMARY KEY (collection, doc_id)
);

-- Identity records. The uid is opaque and immutable; the email is the
-- human-facing key and must be unique across all identities.
CREATE TABLE IF NOT EXISTS identities (
    uid            TEXT PRIMARY KEY,
    email          TEXT NOT NULL UNIQUE,
    password_hash  TEXT NOT NULL,   -- argon2 PHC string
    email_verified INTEGER NOT NULL DEFAULT 0,
    claims         TEXT NOT NULL DEFAULT '{}',   -- JSON object
    created_at     TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS documents_collection_idx ON documents(collection);

PRAGMA user_version = 1;
";

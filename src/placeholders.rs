//! Template documents that materialize each collection's shape.
//!
//! Every placeholder uses the nil UUID as `_id` and for its references, so it can
//! be found and removed by key without touching real records.

use mongodb::bson::{doc, Bson, DateTime, Document, Uuid as BsonUuid};
use uuid::Uuid;

pub const SENTINEL: Uuid = Uuid::nil();

pub fn sentinel_id() -> BsonUuid {
    BsonUuid::from_bytes(SENTINEL.into_bytes())
}

pub fn sentinel_filter() -> Document {
    doc! { "_id": sentinel_id() }
}

pub fn user(now: DateTime) -> Document {
    doc! {
        "_id": sentinel_id(),
        "username": "",
        "email": "",
        "email_verified": false,
        "phone": Bson::Null,
        "phone_verified": false,
        "password_hash": "",
        "first_name": "",
        "last_name": "",
        "birthdate": Bson::Null,
        "sex": Bson::Null,
        "bio": "",
        "profile_picture_id": Bson::Null,
        "grade": 1,
        "location": "",
        "school": "",
        "work": "",
        "badges": [],
        "created_at": now,
        "updated_at": now,
        "connected": false,
        "last_used": now,
    }
}

pub fn user_settings(now: DateTime) -> Document {
    doc! {
        "_id": sentinel_id(),
        "user_id": sentinel_id(),
        "privacy": {},
        "notifications": {},
        "language": "",
        "theme": 0,
        "created_at": now,
        "updated_at": now,
        "last_used": now,
    }
}

pub fn session(now: DateTime) -> Document {
    doc! {
        "_id": sentinel_id(),
        "user_id": sentinel_id(),
        "refresh_token": "",
        "device_info": {},
        "ip": [],
        "created_at": now,
        "expires_at": Bson::Null,
        "revoked": false,
        "last_used": now,
    }
}

pub fn relation(now: DateTime) -> Document {
    doc! {
        "_id": sentinel_id(),
        "primary_id": sentinel_id(),
        "secondary_id": sentinel_id(),
        "state": 1,
        "created_at": now,
        "last_used": now,
    }
}

pub fn post(now: DateTime) -> Document {
    doc! {
        "_id": sentinel_id(),
        "user_id": sentinel_id(),
        "content": "",
        "media_ids": [],
        "visibility": 0,
        "location": "",
        "created_at": now,
        "updated_at": now,
        "last_used": now,
    }
}

pub fn comment(now: DateTime) -> Document {
    doc! {
        "_id": sentinel_id(),
        "post_id": sentinel_id(),
        "user_id": sentinel_id(),
        "content": "",
        "created_at": now,
        "last_used": now,
    }
}

pub fn like(now: DateTime) -> Document {
    doc! {
        "_id": sentinel_id(),
        "target_type": 0,
        "target_id": sentinel_id(),
        "user_id": sentinel_id(),
        "created_at": now,
        "last_used": now,
    }
}

pub fn media(now: DateTime) -> Document {
    doc! {
        "_id": sentinel_id(),
        "owner_id": sentinel_id(),
        "storage_path": "",
        "created_at": now,
        "last_used": now,
    }
}

pub fn conversation(now: DateTime) -> Document {
    doc! {
        "_id": sentinel_id(),
        "type": 0,
        "title": "",
        "last_message_id": Bson::Null,
        "state": 0,
        "created_at": now,
        "last_used": now,
    }
}

pub fn conversation_member(now: DateTime) -> Document {
    doc! {
        "_id": sentinel_id(),
        "conversation_id": sentinel_id(),
        "user_id": sentinel_id(),
        "role": 0,
        "joined_at": now,
        "unread_count": 0,
        "last_used": now,
    }
}

pub fn message(now: DateTime) -> Document {
    doc! {
        "_id": sentinel_id(),
        "conversation_id": sentinel_id(),
        "sender_id": sentinel_id(),
        "message_type": 0,
        "state": 0,
        "content": "",
        "attachments": {},
        "created_at": now,
        "last_used": now,
    }
}

pub fn feed_cache(now: DateTime) -> Document {
    doc! {
        "_id": sentinel_id(),
        "user_id": sentinel_id(),
        "items": [],
        "created_at": now,
        "last_used": now,
    }
}

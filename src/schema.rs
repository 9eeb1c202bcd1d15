use mongodb::bson::{Bson, DateTime, Document};
use mongodb::options::IndexOptions;
use mongodb::IndexModel;

use crate::placeholders;
use Direction::{Asc, Desc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    pub fn as_i32(self) -> i32 {
        match self {
            Direction::Asc => 1,
            Direction::Desc => -1,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct IndexSpec {
    pub keys: &'static [(&'static str, Direction)],
    pub unique: bool,
}

impl IndexSpec {
    const fn new(keys: &'static [(&'static str, Direction)]) -> Self {
        Self {
            keys,
            unique: false,
        }
    }

    const fn unique(keys: &'static [(&'static str, Direction)]) -> Self {
        Self { keys, unique: true }
    }

    /// Server default name, e.g. `user_id_1_created_at_-1`.
    pub fn name(&self) -> String {
        self.keys
            .iter()
            .map(|(field, dir)| format!("{}_{}", field, dir.as_i32()))
            .collect::<Vec<_>>()
            .join("_")
    }

    pub fn keys_document(&self) -> Document {
        let mut keys = Document::new();
        for (field, dir) in self.keys {
            keys.insert(*field, dir.as_i32());
        }
        keys
    }

    pub fn to_model(&self) -> IndexModel {
        let options = IndexOptions::builder()
            .name(self.name())
            .unique(self.unique)
            .build();
        IndexModel::builder()
            .keys(self.keys_document())
            .options(options)
            .build()
    }

    /// True when `keys` holds exactly the declared fields, in order, with matching directions.
    pub fn matches_keys(&self, keys: &Document) -> bool {
        if keys.len() != self.keys.len() {
            return false;
        }
        keys.iter()
            .zip(self.keys.iter())
            .all(|((field, value), (want_field, want_dir))| {
                field == want_field && direction_of(value) == Some(want_dir.as_i32() as i64)
            })
    }
}

fn direction_of(value: &Bson) -> Option<i64> {
    match value {
        Bson::Int32(v) => Some(*v as i64),
        Bson::Int64(v) => Some(*v),
        Bson::Double(v) if v.fract() == 0.0 => Some(*v as i64),
        _ => None,
    }
}

pub struct CollectionSpec {
    pub name: &'static str,
    /// Whether the deployment's tier suffix applies to this collection.
    pub tiered: bool,
    pub indexes: &'static [IndexSpec],
    pub placeholder: fn(DateTime) -> Document,
}

impl CollectionSpec {
    pub fn collection_name(&self, suffix: &str) -> String {
        if self.tiered {
            format!("{}{}", self.name, suffix)
        } else {
            self.name.to_string()
        }
    }
}

pub const USERS: &str = "users";
pub const USER_SETTINGS: &str = "user_settings";
pub const SESSIONS: &str = "sessions";
pub const RELATIONS: &str = "relations";
pub const POSTS: &str = "posts";
pub const COMMENTS: &str = "comments";
pub const LIKES: &str = "likes";
pub const MEDIA: &str = "media";
pub const CONVERSATIONS: &str = "conversations";
pub const CONVERSATION_MEMBERS: &str = "conversation_members";
pub const MESSAGES: &str = "messages";
pub const FEED_CACHE: &str = "feed_cache";

pub const COLLECTIONS: &[CollectionSpec] = &[
    CollectionSpec {
        name: USERS,
        tiered: true,
        indexes: &[
            IndexSpec::unique(&[("username", Asc)]),
            IndexSpec::unique(&[("email", Asc)]),
        ],
        placeholder: placeholders::user,
    },
    CollectionSpec {
        name: USER_SETTINGS,
        tiered: true,
        indexes: &[IndexSpec::unique(&[("user_id", Asc)])],
        placeholder: placeholders::user_settings,
    },
    CollectionSpec {
        name: SESSIONS,
        tiered: true,
        indexes: &[IndexSpec::new(&[("user_id", Asc), ("revoked", Asc)])],
        placeholder: placeholders::session,
    },
    CollectionSpec {
        name: RELATIONS,
        tiered: true,
        indexes: &[
            IndexSpec::new(&[("primary_id", Asc)]),
            IndexSpec::new(&[("secondary_id", Asc)]),
            IndexSpec::unique(&[("secondary_id", Asc), ("primary_id", Asc)]),
        ],
        placeholder: placeholders::relation,
    },
    CollectionSpec {
        name: POSTS,
        tiered: true,
        indexes: &[IndexSpec::new(&[("user_id", Asc), ("created_at", Desc)])],
        placeholder: placeholders::post,
    },
    CollectionSpec {
        name: COMMENTS,
        tiered: true,
        indexes: &[IndexSpec::new(&[("post_id", Asc), ("created_at", Desc)])],
        placeholder: placeholders::comment,
    },
    CollectionSpec {
        name: LIKES,
        tiered: true,
        indexes: &[
            IndexSpec::new(&[("target_type", Asc), ("target_id", Asc)]),
            IndexSpec::unique(&[("target_type", Asc), ("target_id", Asc), ("user_id", Asc)]),
        ],
        placeholder: placeholders::like,
    },
    CollectionSpec {
        name: MEDIA,
        tiered: true,
        indexes: &[
            IndexSpec::new(&[("owner_id", Asc)]),
            IndexSpec::new(&[("created_at", Asc)]),
        ],
        placeholder: placeholders::media,
    },
    CollectionSpec {
        name: CONVERSATIONS,
        tiered: true,
        indexes: &[IndexSpec::new(&[("last_message_id", Asc)])],
        placeholder: placeholders::conversation,
    },
    CollectionSpec {
        name: CONVERSATION_MEMBERS,
        tiered: true,
        indexes: &[IndexSpec::unique(&[("conversation_id", Asc), ("user_id", Asc)])],
        placeholder: placeholders::conversation_member,
    },
    CollectionSpec {
        name: MESSAGES,
        tiered: true,
        indexes: &[IndexSpec::new(&[("conversation_id", Asc), ("created_at", Desc)])],
        placeholder: placeholders::message,
    },
    CollectionSpec {
        name: FEED_CACHE,
        tiered: false,
        indexes: &[IndexSpec::new(&[("user_id", Asc), ("created_at", Desc)])],
        placeholder: placeholders::feed_cache,
    },
];

pub fn find(name: &str) -> Option<&'static CollectionSpec> {
    COLLECTIONS.iter().find(|spec| spec.name == name)
}

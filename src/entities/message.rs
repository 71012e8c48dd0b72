use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One entry of a ride's append-only chat log. The server assigns the
/// id and the ordering; the id is what de-duplicates across polls.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: i64,
    pub sender: String,
    pub content: String,
    pub created_at: Option<DateTime<Utc>>,
}

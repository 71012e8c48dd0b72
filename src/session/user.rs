use serde::{Deserialize, Serialize};

/// The authenticated account as reported by the profile endpoint.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Principal {
    pub id: i64,
    pub username: String,
    pub email: Option<String>,
    pub role: Role,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Rider,
    Driver,
}

impl Role {
    pub fn name(&self) -> String {
        match self {
            Self::Rider => "rider".into(),
            Self::Driver => "driver".into(),
        }
    }
}

impl Principal {
    pub fn is_driver(&self) -> bool {
        matches!(self.role, Role::Driver)
    }
}

/// Payload for account creation.
#[derive(Clone, Debug, Serialize)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

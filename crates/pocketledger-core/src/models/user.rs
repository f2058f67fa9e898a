use std::fmt;

use serde::{Deserialize, Serialize};

const REDACTED: &str = "<redacted>";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct User {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub email: String,
}

impl User {
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.email
        } else {
            &self.name
        }
    }
}

#[derive(Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &REDACTED)
            .finish()
    }
}

#[derive(Clone, Serialize)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &REDACTED)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_accepts_either_id_key() {
        let a: User = serde_json::from_str(r#"{"_id":"u1","name":"Ana","email":"ana@example.com"}"#)
            .expect("valid user JSON");
        let b: User = serde_json::from_str(r#"{"id":"u1","email":"ana@example.com"}"#)
            .expect("valid user JSON");
        assert_eq!(a.id, b.id);
        assert_eq!(a.display_name(), "Ana");
        assert_eq!(b.display_name(), "ana@example.com");
    }

    #[test]
    fn test_debug_hides_password() {
        let credentials = Credentials {
            email: "ana@example.com".to_string(),
            password: "Secret123".to_string(),
        };
        let registration = Registration {
            name: "Ana".to_string(),
            email: "ana@example.com".to_string(),
            password: "Secret123".to_string(),
        };
        for debug in [format!("{:?}", credentials), format!("{:?}", registration)] {
            assert!(debug.contains("ana@example.com"));
            assert!(!debug.contains("Secret123"));
        }
    }
}

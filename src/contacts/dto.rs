use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::contacts::repo::Contact;

time::serde::format_description!(dob_format, Date, "[year]-[month]-[day]");

/// Request body for creating a contact. `dob` arrives as "YYYY-MM-DD" and is
/// parsed by the service.
#[derive(Debug, Deserialize)]
pub struct CreateContactRequest {
    pub name: String,
    pub email: String,
    pub place: String,
    pub dob: String,
}

/// Partial update; absent fields are left untouched.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateContactRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub place: Option<String>,
    pub dob: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub search: String,
}

fn default_page() -> i64 {
    1
}
fn default_limit() -> i64 {
    15
}

/// Wire shape of a contact.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactResponse {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub place: String,
    #[serde(with = "dob_format")]
    pub dob: Date,
    pub user_id: i64,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl From<Contact> for ContactResponse {
    fn from(c: Contact) -> Self {
        Self {
            id: c.id,
            name: c.name,
            email: c.email,
            place: c.place,
            dob: c.dob,
            user_id: c.user_id,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

/// Single-contact envelope.
#[derive(Debug, Serialize)]
pub struct ContactEnvelope {
    pub contact: ContactResponse,
}

/// Paginated listing envelope.
#[derive(Debug, Serialize)]
pub struct ContactPage {
    pub contacts: Vec<ContactResponse>,
    pub total: i64,
    #[serde(rename = "totalPages")]
    pub total_pages: i64,
    #[serde(rename = "currentPage")]
    pub current_page: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime};

    fn sample() -> ContactResponse {
        ContactResponse {
            id: 3,
            name: "Alex".into(),
            email: "alex@example.com".into(),
            place: "Berlin".into(),
            dob: date!(1990 - 04 - 01),
            user_id: 7,
            created_at: datetime!(2026-01-01 12:00 UTC),
            updated_at: datetime!(2026-01-01 12:00 UTC),
        }
    }

    #[test]
    fn contact_dob_serializes_as_plain_date() {
        let json = serde_json::to_string(&sample()).unwrap();
        assert!(json.contains("\"dob\":\"1990-04-01\""));
        assert!(json.contains("\"userId\":7"));
    }

    #[test]
    fn page_envelope_uses_contract_keys() {
        let page = ContactPage {
            contacts: vec![sample()],
            total: 37,
            total_pages: 3,
            current_page: 1,
        };
        let json = serde_json::to_string(&page).unwrap();
        assert!(json.contains("\"totalPages\":3"));
        assert!(json.contains("\"currentPage\":1"));
        assert!(json.contains("\"total\":37"));
    }
}

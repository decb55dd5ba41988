use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::{Date, OffsetDateTime};

/// Contact row, always scoped to its owning user. Rows are removed with the
/// owner via the cascade FK.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Contact {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub email: String,
    pub place: String,
    pub dob: Date,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Validated field set ready to persist, produced by the service layer.
#[derive(Debug, Clone)]
pub struct ContactFields {
    pub name: String,
    pub email: String,
    pub place: String,
    pub dob: Date,
}

/// Escape LIKE metacharacters so the search term is matched literally.
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

impl Contact {
    pub async fn insert(
        db: &PgPool,
        owner_id: i64,
        fields: &ContactFields,
    ) -> Result<Contact, sqlx::Error> {
        sqlx::query_as::<_, Contact>(
            r#"
            INSERT INTO contacts (user_id, name, email, place, dob)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, name, email, place, dob, created_at, updated_at
            "#,
        )
        .bind(owner_id)
        .bind(&fields.name)
        .bind(&fields.email)
        .bind(&fields.place)
        .bind(fields.dob)
        .fetch_one(db)
        .await
    }

    pub async fn find_by_id(db: &PgPool, id: i64) -> Result<Option<Contact>, sqlx::Error> {
        sqlx::query_as::<_, Contact>(
            r#"
            SELECT id, user_id, name, email, place, dob, created_at, updated_at
            FROM contacts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await
    }

    /// Persist the full (merged) field set. Returns `None` when the row has
    /// vanished between load and write.
    pub async fn update(
        db: &PgPool,
        id: i64,
        fields: &ContactFields,
    ) -> Result<Option<Contact>, sqlx::Error> {
        sqlx::query_as::<_, Contact>(
            r#"
            UPDATE contacts
            SET name = $2, email = $3, place = $4, dob = $5, updated_at = now()
            WHERE id = $1
            RETURNING id, user_id, name, email, place, dob, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(&fields.name)
        .bind(&fields.email)
        .bind(&fields.place)
        .bind(fields.dob)
        .fetch_optional(db)
        .await
    }

    /// True when a row was deleted; a second delete of the same id finds
    /// nothing.
    pub async fn delete(db: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM contacts WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Page of contacts, newest first. `owner` = None lists across all
    /// owners (admin view); a non-empty term matches name, email or place
    /// case-insensitively.
    pub async fn search(
        db: &PgPool,
        owner: Option<i64>,
        term: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Contact>, sqlx::Error> {
        sqlx::query_as::<_, Contact>(
            r#"
            SELECT id, user_id, name, email, place, dob, created_at, updated_at
            FROM contacts
            WHERE ($1::BIGINT IS NULL OR user_id = $1)
              AND ($2 = '' OR name ILIKE $3 OR email ILIKE $3 OR place ILIKE $3)
            ORDER BY id DESC
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(owner)
        .bind(term)
        .bind(like_pattern(term))
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await
    }

    pub async fn count(db: &PgPool, owner: Option<i64>, term: &str) -> Result<i64, sqlx::Error> {
        let (total,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*)
            FROM contacts
            WHERE ($1::BIGINT IS NULL OR user_id = $1)
              AND ($2 = '' OR name ILIKE $3 OR email ILIKE $3 OR place ILIKE $3)
            "#,
        )
        .bind(owner)
        .bind(term)
        .bind(like_pattern(term))
        .fetch_one(db)
        .await?;
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_pattern_escapes_metacharacters() {
        assert_eq!(like_pattern("alex"), "%alex%");
        assert_eq!(like_pattern("50%"), "%50\\%%");
        assert_eq!(like_pattern("a_b"), "%a\\_b%");
        assert_eq!(like_pattern(r"back\slash"), r"%back\\slash%");
    }
}

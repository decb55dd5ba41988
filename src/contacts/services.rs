use time::{format_description::FormatItem, macros::format_description, Date, OffsetDateTime};

use crate::auth::services::is_valid_email;
use crate::contacts::dto::{ContactPage, CreateContactRequest, ListQuery, UpdateContactRequest};
use crate::contacts::repo::{Contact, ContactFields};
use crate::error::AppError;
use crate::state::AppState;

const DOB_FORMAT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// Pagination arithmetic shared by the listing endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageParams {
    pub page: i64,
    pub page_size: i64,
}

impl PageParams {
    pub fn new(page: i64, page_size: i64) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.max(1),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.page_size
    }

    pub fn total_pages(&self, total: i64) -> i64 {
        (total + self.page_size - 1) / self.page_size
    }
}

fn non_empty(field: &'static str, value: &str) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation(field, "must not be empty"));
    }
    Ok(trimmed.to_string())
}

fn valid_email(value: &str) -> Result<String, AppError> {
    let email = non_empty("email", value)?;
    if !is_valid_email(&email) {
        return Err(AppError::validation("email", "not a valid email address"));
    }
    Ok(email)
}

fn parse_dob(raw: &str) -> Result<Date, AppError> {
    let dob = Date::parse(raw.trim(), DOB_FORMAT)
        .map_err(|_| AppError::validation("dob", "must be a valid YYYY-MM-DD date"))?;
    if dob > OffsetDateTime::now_utc().date() {
        return Err(AppError::validation("dob", "must not be in the future"));
    }
    Ok(dob)
}

pub fn validate_new(req: CreateContactRequest) -> Result<ContactFields, AppError> {
    Ok(ContactFields {
        name: non_empty("name", &req.name)?,
        email: valid_email(&req.email)?,
        place: non_empty("place", &req.place)?,
        dob: parse_dob(&req.dob)?,
    })
}

/// Merge a partial update onto an existing row, re-validating every changed
/// field with the same rules as create.
pub fn apply_update(
    existing: &Contact,
    req: UpdateContactRequest,
) -> Result<ContactFields, AppError> {
    Ok(ContactFields {
        name: match req.name {
            Some(v) => non_empty("name", &v)?,
            None => existing.name.clone(),
        },
        email: match req.email {
            Some(v) => valid_email(&v)?,
            None => existing.email.clone(),
        },
        place: match req.place {
            Some(v) => non_empty("place", &v)?,
            None => existing.place.clone(),
        },
        dob: match req.dob {
            Some(v) => parse_dob(&v)?,
            None => existing.dob,
        },
    })
}

/// Paginated, filtered listing. `owner` = Some restricts to that user's
/// contacts; None is the admin view across all owners. Pages past the end
/// come back empty with the correct totals.
pub async fn list(
    state: &AppState,
    owner: Option<i64>,
    query: ListQuery,
) -> Result<ContactPage, AppError> {
    let params = PageParams::new(query.page, query.limit);
    let term = query.search.trim();

    let total = Contact::count(&state.db, owner, term).await?;
    let rows = Contact::search(&state.db, owner, term, params.page_size, params.offset()).await?;

    Ok(ContactPage {
        contacts: rows.into_iter().map(Into::into).collect(),
        total,
        total_pages: params.total_pages(total),
        current_page: params.page,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    fn sample_contact() -> Contact {
        Contact {
            id: 1,
            user_id: 7,
            name: "Alex".into(),
            email: "alex@example.com".into(),
            place: "Berlin".into(),
            dob: date!(1990 - 04 - 01),
            created_at: OffsetDateTime::now_utc(),
            updated_at: OffsetDateTime::now_utc(),
        }
    }

    fn create_req() -> CreateContactRequest {
        CreateContactRequest {
            name: "Alex".into(),
            email: "alex@example.com".into(),
            place: "Berlin".into(),
            dob: "1990-04-01".into(),
        }
    }

    #[test]
    fn valid_request_passes() {
        let fields = validate_new(create_req()).expect("should validate");
        assert_eq!(fields.name, "Alex");
        assert_eq!(fields.dob, date!(1990 - 04 - 01));
    }

    #[test]
    fn empty_name_names_the_field() {
        let req = CreateContactRequest {
            name: "  ".into(),
            ..create_req()
        };
        let err = validate_new(req).unwrap_err();
        assert!(err.to_string().starts_with("name:"));
    }

    #[test]
    fn empty_place_is_rejected() {
        let req = CreateContactRequest {
            place: "".into(),
            ..create_req()
        };
        let err = validate_new(req).unwrap_err();
        assert!(err.to_string().starts_with("place:"));
    }

    #[test]
    fn bad_email_is_rejected() {
        let req = CreateContactRequest {
            email: "not-an-email".into(),
            ..create_req()
        };
        let err = validate_new(req).unwrap_err();
        assert!(err.to_string().starts_with("email:"));
    }

    #[test]
    fn garbage_dob_is_rejected() {
        let req = CreateContactRequest {
            dob: "01/04/1990".into(),
            ..create_req()
        };
        let err = validate_new(req).unwrap_err();
        assert!(err.to_string().starts_with("dob:"));
    }

    #[test]
    fn future_dob_is_rejected() {
        let tomorrow = OffsetDateTime::now_utc().date() + time::Duration::days(1);
        let req = CreateContactRequest {
            dob: tomorrow
                .format(DOB_FORMAT)
                .expect("format tomorrow"),
            ..create_req()
        };
        let err = validate_new(req).unwrap_err();
        assert!(err.to_string().contains("future"));
    }

    #[test]
    fn partial_update_keeps_unchanged_fields() {
        let existing = sample_contact();
        let fields = apply_update(
            &existing,
            UpdateContactRequest {
                place: Some("Hamburg".into()),
                ..Default::default()
            },
        )
        .expect("should validate");
        assert_eq!(fields.place, "Hamburg");
        assert_eq!(fields.name, "Alex");
        assert_eq!(fields.email, "alex@example.com");
        assert_eq!(fields.dob, existing.dob);
    }

    #[test]
    fn partial_update_revalidates_changed_fields() {
        let existing = sample_contact();
        let err = apply_update(
            &existing,
            UpdateContactRequest {
                email: Some("broken".into()),
                ..Default::default()
            },
        )
        .unwrap_err();
        assert!(err.to_string().starts_with("email:"));
    }

    #[test]
    fn pagination_of_37_items_in_pages_of_15() {
        let total = 37;
        let p1 = PageParams::new(1, 15);
        assert_eq!(p1.offset(), 0);
        assert_eq!(p1.total_pages(total), 3);

        let p3 = PageParams::new(3, 15);
        assert_eq!(p3.offset(), 30); // 7 rows remain at this offset

        let p4 = PageParams::new(4, 15);
        assert_eq!(p4.offset(), 45); // past the end, empty page
        assert_eq!(p4.total_pages(total), 3);
    }

    #[test]
    fn pagination_handles_exact_multiples_and_zero() {
        assert_eq!(PageParams::new(1, 15).total_pages(30), 2);
        assert_eq!(PageParams::new(1, 15).total_pages(0), 0);
    }

    #[test]
    fn page_and_size_are_clamped_to_at_least_one() {
        let p = PageParams::new(0, 0);
        assert_eq!(p.page, 1);
        assert_eq!(p.page_size, 1);
        assert_eq!(p.offset(), 0);
    }
}

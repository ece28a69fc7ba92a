use chrono::Utc;
use serde::Serialize;
use serde_json::{Map, Value};
use sqlx::SqlitePool;
use sqlx::types::Json;
use uuid::Uuid;

use crate::models::{
    Class, ClassPatch, ClassStatus, NewClassRequest, NewPaymentRequest, NewSelectionRequest,
    Payment, RoleFilter, Selection, StatusUpdateRequest, UpdateAck, User, UserProfile,
};

// Documents

/// Serializes a write body into the top-level fields it sets.
fn document_fields<T: Serialize>(value: &T) -> Result<Map<String, Value>, sqlx::Error> {
    match serde_json::to_value(value).map_err(|e| sqlx::Error::Encode(Box::new(e)))? {
        Value::Object(fields) => Ok(fields),
        other => Err(sqlx::Error::Encode(
            format!("expected a JSON object, got {}", other).into(),
        )),
    }
}

/// Replaces each top-level field of `current` named in `fields`. Nested
/// objects are replaced whole, and `null` is stored as `null`.
fn overwrite_fields(current: &str, fields: &Map<String, Value>) -> Result<String, sqlx::Error> {
    let mut doc: Map<String, Value> =
        serde_json::from_str(current).map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
    doc.extend(fields.clone());
    serde_json::to_string(&doc).map_err(|e| sqlx::Error::Encode(Box::new(e)))
}

/// Overwrites fields of the document selected by `select_sql`, writing it
/// back with `swap_sql` only if nobody changed it in between; a lost race
/// re-reads and tries again. Returns `false` when no document exists.
///
/// `select_sql` binds the key; `swap_sql` binds the new doc, the key and the
/// doc that was read.
async fn overwrite_document(
    db: &SqlitePool,
    select_sql: &str,
    swap_sql: &str,
    key: &str,
    fields: &Map<String, Value>,
) -> Result<bool, sqlx::Error> {
    loop {
        let Some(current) = sqlx::query_scalar::<_, String>(select_sql)
            .bind(key)
            .fetch_optional(db)
            .await?
        else {
            return Ok(false);
        };

        let swapped = sqlx::query(swap_sql)
            .bind(overwrite_fields(&current, fields)?)
            .bind(key)
            .bind(&current)
            .execute(db)
            .await?
            .rows_affected();

        if swapped > 0 {
            return Ok(true);
        }
    }
}

// Users

/// Inserts a brand-new user. Returns `false` when the email is already taken.
pub async fn insert_user(db: &SqlitePool, user: &User) -> Result<bool, sqlx::Error> {
    let inserted = sqlx::query(
        "INSERT INTO users (email, doc) VALUES (?1, ?2) ON CONFLICT(email) DO NOTHING",
    )
    .bind(&user.email)
    .bind(Json(user))
    .execute(db)
    .await?
    .rows_affected();

    Ok(inserted > 0)
}

/// Writes `profile` onto the user stored under `email`, creating it if
/// absent. Both paths store the same fields the same way.
pub async fn upsert_user(
    db: &SqlitePool,
    email: &str,
    profile: &UserProfile,
) -> Result<UpdateAck, sqlx::Error> {
    let mut doc = profile.clone();
    doc.email = Some(email.to_string());
    let fields = document_fields(&doc)?;

    loop {
        let matched = overwrite_document(
            db,
            "SELECT doc FROM users WHERE email = ?1",
            "UPDATE users SET doc = ?1 WHERE email = ?2 AND doc = ?3",
            email,
            &fields,
        )
        .await?;
        if matched {
            return Ok(UpdateAck::matched(1));
        }

        let inserted = sqlx::query(
            "INSERT INTO users (email, doc) VALUES (?1, ?2) ON CONFLICT(email) DO NOTHING",
        )
        .bind(email)
        .bind(Json(&fields))
        .execute(db)
        .await?
        .rows_affected();
        if inserted > 0 {
            return Ok(UpdateAck::upserted(email));
        }
        // A concurrent writer created the user first; overwrite theirs.
    }
}

pub async fn find_user(db: &SqlitePool, email: &str) -> Result<Option<User>, sqlx::Error> {
    let user = sqlx::query_scalar::<_, Json<User>>("SELECT doc FROM users WHERE email = ?1")
        .bind(email)
        .fetch_optional(db)
        .await?;

    Ok(user.map(|Json(u)| u))
}

pub async fn fetch_users(db: &SqlitePool) -> Result<Vec<User>, sqlx::Error> {
    let users = sqlx::query_scalar::<_, Json<User>>("SELECT doc FROM users ORDER BY rowid")
        .fetch_all(db)
        .await?;

    Ok(users.into_iter().map(|Json(u)| u).collect())
}

pub async fn fetch_users_by_role(
    db: &SqlitePool,
    filter: RoleFilter,
) -> Result<Vec<User>, sqlx::Error> {
    let users = match filter {
        RoleFilter::Role(role) => {
            sqlx::query_scalar::<_, Json<User>>(
                "SELECT doc FROM users WHERE json_extract(doc, '$.role') = ?1 ORDER BY rowid",
            )
            .bind(role.as_str())
            .fetch_all(db)
            .await?
        }
        RoleFilter::Unset => {
            sqlx::query_scalar::<_, Json<User>>(
                "SELECT doc FROM users WHERE json_extract(doc, '$.role') IS NULL ORDER BY rowid",
            )
            .fetch_all(db)
            .await?
        }
    };

    Ok(users.into_iter().map(|Json(u)| u).collect())
}

pub async fn delete_user(db: &SqlitePool, email: &str) -> Result<u64, sqlx::Error> {
    let deleted = sqlx::query("DELETE FROM users WHERE email = ?1")
        .bind(email)
        .execute(db)
        .await?
        .rows_affected();

    Ok(deleted)
}

// Classes

pub async fn insert_class(db: &SqlitePool, req: NewClassRequest) -> Result<Class, sqlx::Error> {
    let class = req.into_class(Uuid::new_v4().to_string());

    sqlx::query("INSERT INTO classes (id, doc) VALUES (?1, ?2)")
        .bind(&class.id)
        .bind(Json(&class))
        .execute(db)
        .await?;

    Ok(class)
}

/// All classes ordered by status label descending. The order is the plain
/// string order of the labels, ties kept in insertion order.
pub async fn fetch_classes_by_status_desc(db: &SqlitePool) -> Result<Vec<Class>, sqlx::Error> {
    let classes = sqlx::query_scalar::<_, Json<Class>>(
        r#"
        SELECT doc FROM classes
        ORDER BY json_extract(doc, '$.status') DESC, rowid ASC
        "#,
    )
    .fetch_all(db)
    .await?;

    Ok(classes.into_iter().map(|Json(c)| c).collect())
}

pub async fn fetch_classes_with_status(
    db: &SqlitePool,
    status: ClassStatus,
) -> Result<Vec<Class>, sqlx::Error> {
    let classes = sqlx::query_scalar::<_, Json<Class>>(
        "SELECT doc FROM classes WHERE json_extract(doc, '$.status') = ?1 ORDER BY rowid",
    )
    .bind(status.as_str())
    .fetch_all(db)
    .await?;

    Ok(classes.into_iter().map(|Json(c)| c).collect())
}

pub async fn fetch_popular_classes(db: &SqlitePool, limit: i64) -> Result<Vec<Class>, sqlx::Error> {
    let classes = sqlx::query_scalar::<_, Json<Class>>(
        r#"
        SELECT doc FROM classes
        ORDER BY json_extract(doc, '$.enrolled') DESC, rowid ASC
        LIMIT ?1
        "#,
    )
    .bind(limit)
    .fetch_all(db)
    .await?;

    Ok(classes.into_iter().map(|Json(c)| c).collect())
}

pub async fn fetch_classes_by_instructor(
    db: &SqlitePool,
    email: &str,
) -> Result<Vec<Class>, sqlx::Error> {
    let classes = sqlx::query_scalar::<_, Json<Class>>(
        "SELECT doc FROM classes WHERE json_extract(doc, '$.instructorEmail') = ?1 ORDER BY rowid",
    )
    .bind(email)
    .fetch_all(db)
    .await?;

    Ok(classes.into_iter().map(|Json(c)| c).collect())
}

/// Sets the moderation status (and optional feedback). No transition is
/// refused. Returns the number of matched classes.
pub async fn update_class_status(
    db: &SqlitePool,
    id: &str,
    req: &StatusUpdateRequest,
) -> Result<u64, sqlx::Error> {
    let matched = sqlx::query("UPDATE classes SET doc = json_patch(doc, ?1) WHERE id = ?2")
        .bind(Json(req))
        .bind(id)
        .execute(db)
        .await?
        .rows_affected();

    Ok(matched)
}

/// Overwrites top-level fields of one class. Returns the number of matched classes.
pub async fn merge_class(db: &SqlitePool, id: &str, patch: &ClassPatch) -> Result<u64, sqlx::Error> {
    let fields = document_fields(patch)?;
    let matched = overwrite_document(
        db,
        "SELECT doc FROM classes WHERE id = ?1",
        "UPDATE classes SET doc = ?1 WHERE id = ?2 AND doc = ?3",
        id,
        &fields,
    )
    .await?;

    Ok(u64::from(matched))
}

// Selections

/// Records a selection. The same user may select the same class any number of times.
pub async fn insert_selection(
    db: &SqlitePool,
    req: NewSelectionRequest,
) -> Result<Selection, sqlx::Error> {
    let selection = req.into_selection(Uuid::new_v4().to_string());

    sqlx::query("INSERT INTO selections (id, doc) VALUES (?1, ?2)")
        .bind(&selection.id)
        .bind(Json(&selection))
        .execute(db)
        .await?;

    Ok(selection)
}

pub async fn fetch_selections_for_user(
    db: &SqlitePool,
    email: &str,
) -> Result<Vec<Selection>, sqlx::Error> {
    let selections = sqlx::query_scalar::<_, Json<Selection>>(
        "SELECT doc FROM selections WHERE json_extract(doc, '$.userEmail') = ?1 ORDER BY rowid",
    )
    .bind(email)
    .fetch_all(db)
    .await?;

    Ok(selections.into_iter().map(|Json(s)| s).collect())
}

pub async fn delete_selection(db: &SqlitePool, id: &str) -> Result<u64, sqlx::Error> {
    let deleted = sqlx::query("DELETE FROM selections WHERE id = ?1")
        .bind(id)
        .execute(db)
        .await?
        .rows_affected();

    Ok(deleted)
}

// Payments

#[derive(Debug, Clone)]
pub struct RecordedPayment {
    pub payment: Payment,
    /// Whether the referenced class existed and had its counters moved.
    pub class_matched: bool,
}

/// Confirms a seat: bumps `enrolled` and drops `seats` on the class in one
/// statement, then appends the payment. The payment is written even when
/// the class does not exist, and `seats` may go negative.
pub async fn record_payment(
    db: &SqlitePool,
    req: NewPaymentRequest,
) -> Result<RecordedPayment, sqlx::Error> {
    let payment = req.into_payment(Uuid::new_v4().to_string(), Utc::now().to_rfc3339());

    let mut tx = db.begin().await?;

    let matched = sqlx::query(
        r#"
        UPDATE classes
        SET doc = json_set(
            doc,
            '$.enrolled', COALESCE(json_extract(doc, '$.enrolled'), 0) + 1,
            '$.seats', COALESCE(json_extract(doc, '$.seats'), 0) - 1
        )
        WHERE id = ?1
        "#,
    )
    .bind(&payment.class_id)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    sqlx::query("INSERT INTO payments (id, doc) VALUES (?1, ?2)")
        .bind(&payment.id)
        .bind(Json(&payment))
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(RecordedPayment {
        payment,
        class_matched: matched > 0,
    })
}

/// A user's payments, newest first.
pub async fn fetch_payments_for_user(
    db: &SqlitePool,
    email: &str,
) -> Result<Vec<Payment>, sqlx::Error> {
    let payments = sqlx::query_scalar::<_, Json<Payment>>(
        "SELECT doc FROM payments WHERE json_extract(doc, '$.userEmail') = ?1 ORDER BY rowid DESC",
    )
    .bind(email)
    .fetch_all(db)
    .await?;

    Ok(payments.into_iter().map(|Json(p)| p).collect())
}

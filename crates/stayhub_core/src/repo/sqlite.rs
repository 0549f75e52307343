//! SQLite realization of the repository contract.
//!
//! # Responsibility
//! - Map each entity type onto its table through the `SqlRecord` trait.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Write paths validate entities before SQL mutations.
//! - Read paths reject invalid persisted state instead of masking it.
//! - `try_new` refuses connections that were not migrated by this crate.

use crate::db::migrations::latest_version;
use crate::model::amenity::Amenity;
use crate::model::entity::{AttrValue, Entity, EntityId, EntityMeta};
use crate::model::place::Place;
use crate::model::review::Review;
use crate::model::user::User;
use crate::repo::{RepoError, RepoResult, Repository};
use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};
use std::marker::PhantomData;
use uuid::Uuid;

/// Table mapping required to persist an entity type through
/// [`SqliteRepository`].
///
/// `COLUMNS` starts with `id`, followed by `created_at` and `updated_at`;
/// `bind_values` must produce one value per column in the same order.
pub trait SqlRecord: Entity + Sized {
    const TABLE: &'static str;
    const COLUMNS: &'static [&'static str];

    /// Column values for this entity, aligned with `COLUMNS`.
    fn bind_values(&self) -> Vec<Value>;

    /// Decodes one row selected with `COLUMNS`.
    fn from_row(row: &Row<'_>) -> RepoResult<Self>;

    /// Maps a public attribute name onto its column, if queryable.
    fn column_for_attribute(name: &str) -> Option<&'static str>;

    /// Loads association rows that live outside the entity table.
    fn load_associations(&mut self, _conn: &Connection) -> RepoResult<()> {
        Ok(())
    }

    /// Persists association rows that live outside the entity table.
    fn store_associations(&self, _conn: &Connection) -> RepoResult<()> {
        Ok(())
    }
}

/// SQLite-backed repository, generic over the record mapping.
///
/// Holds a borrowed connection; one connection can back the repositories of
/// all four entity types.
pub struct SqliteRepository<'conn, T: SqlRecord> {
    conn: &'conn Connection,
    _entity: PhantomData<T>,
}

impl<'conn, T: SqlRecord> SqliteRepository<'conn, T> {
    /// Wraps a migrated connection, guarding schema version and table
    /// presence.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
        let expected_version = latest_version();
        if actual_version != expected_version {
            return Err(RepoError::UninitializedConnection {
                expected_version,
                actual_version,
            });
        }

        let table_exists: bool = conn.query_row(
            "SELECT EXISTS (SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1);",
            [T::TABLE],
            |row| row.get(0),
        )?;
        if !table_exists {
            return Err(RepoError::MissingRequiredTable(T::TABLE));
        }

        Ok(Self {
            conn,
            _entity: PhantomData,
        })
    }

    fn select_sql() -> String {
        format!("SELECT {} FROM {}", T::COLUMNS.join(", "), T::TABLE)
    }

    /// Inserts or fully rewrites the entity row.
    ///
    /// Conflict target is the primary key only, so overwriting an id never
    /// deletes a row that other tables reference.
    fn persist(&self, entity: &T) -> RepoResult<()> {
        entity.validate()?;

        let placeholders = (1..=T::COLUMNS.len())
            .map(|index| format!("?{index}"))
            .collect::<Vec<_>>()
            .join(", ");
        let assignments = T::COLUMNS
            .iter()
            .skip(1)
            .map(|column| format!("{column} = excluded.{column}"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({placeholders})
             ON CONFLICT (id) DO UPDATE SET {assignments};",
            T::TABLE,
            T::COLUMNS.join(", "),
        );

        self.conn
            .execute(&sql, params_from_iter(entity.bind_values()))?;
        entity.store_associations(self.conn)?;
        Ok(())
    }

    fn fetch(&self, id: EntityId) -> RepoResult<Option<T>> {
        let sql = format!("{} WHERE id = ?1;", Self::select_sql());
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params![id.to_string()])?;

        if let Some(row) = rows.next()? {
            let mut entity = T::from_row(row)?;
            entity.load_associations(self.conn)?;
            return Ok(Some(entity));
        }
        Ok(None)
    }
}

impl<T: SqlRecord> Repository<T> for SqliteRepository<'_, T> {
    fn add(&mut self, entity: T) -> RepoResult<()> {
        self.persist(&entity)
    }

    fn get(&self, id: EntityId) -> RepoResult<Option<T>> {
        self.fetch(id)
    }

    fn get_all(&self) -> RepoResult<Vec<T>> {
        let sql = format!("{} ORDER BY rowid;", Self::select_sql());
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([])?;

        let mut entities = Vec::new();
        while let Some(row) = rows.next()? {
            let mut entity = T::from_row(row)?;
            entity.load_associations(self.conn)?;
            entities.push(entity);
        }
        Ok(entities)
    }

    fn update(&mut self, id: EntityId, patch: &T::Patch) -> RepoResult<Option<T>> {
        let Some(mut entity) = self.fetch(id)? else {
            return Ok(None);
        };

        entity.apply_patch(patch)?;
        entity.meta_mut().touch();
        self.persist(&entity)?;
        Ok(Some(entity))
    }

    fn delete(&mut self, id: EntityId) -> RepoResult<bool> {
        let changed = self.conn.execute(
            &format!("DELETE FROM {} WHERE id = ?1;", T::TABLE),
            params![id.to_string()],
        )?;
        Ok(changed > 0)
    }

    fn get_by_attribute(&self, name: &str, value: &AttrValue) -> RepoResult<Option<T>> {
        let Some(column) = T::column_for_attribute(name) else {
            return Ok(None);
        };

        let sql = format!(
            "{} WHERE {column} = ?1 ORDER BY rowid LIMIT 1;",
            Self::select_sql()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params![attr_to_sql(value)])?;

        if let Some(row) = rows.next()? {
            let mut entity = T::from_row(row)?;
            entity.load_associations(self.conn)?;
            return Ok(Some(entity));
        }
        Ok(None)
    }
}

impl SqlRecord for User {
    const TABLE: &'static str = "users";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "created_at",
        "updated_at",
        "first_name",
        "last_name",
        "email",
        "password_hash",
        "is_admin",
    ];

    fn bind_values(&self) -> Vec<Value> {
        let mut values = meta_bind_values(&self.meta);
        values.push(Value::Text(self.first_name.clone()));
        values.push(Value::Text(self.last_name.clone()));
        values.push(Value::Text(self.email.clone()));
        values.push(Value::Text(self.password_hash.clone()));
        values.push(Value::Integer(i64::from(self.is_admin)));
        values
    }

    fn from_row(row: &Row<'_>) -> RepoResult<Self> {
        let user = Self {
            meta: meta_from_row(row)?,
            first_name: row.get("first_name")?,
            last_name: row.get("last_name")?,
            email: row.get("email")?,
            password_hash: row.get("password_hash")?,
            is_admin: parse_bool(row, "is_admin")?,
        };
        user.validate()?;
        Ok(user)
    }

    fn column_for_attribute(name: &str) -> Option<&'static str> {
        match name {
            "id" => Some("id"),
            "first_name" => Some("first_name"),
            "last_name" => Some("last_name"),
            "email" => Some("email"),
            "is_admin" => Some("is_admin"),
            _ => None,
        }
    }
}

impl SqlRecord for Place {
    const TABLE: &'static str = "places";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "created_at",
        "updated_at",
        "title",
        "description",
        "price",
        "latitude",
        "longitude",
        "owner_id",
    ];

    fn bind_values(&self) -> Vec<Value> {
        let mut values = meta_bind_values(&self.meta);
        values.push(Value::Text(self.title.clone()));
        values.push(match &self.description {
            Some(description) => Value::Text(description.clone()),
            None => Value::Null,
        });
        values.push(Value::Real(self.price));
        values.push(Value::Real(self.latitude));
        values.push(Value::Real(self.longitude));
        values.push(Value::Text(self.owner_id.to_string()));
        values
    }

    fn from_row(row: &Row<'_>) -> RepoResult<Self> {
        let place = Self {
            meta: meta_from_row(row)?,
            title: row.get("title")?,
            description: row.get("description")?,
            price: row.get("price")?,
            latitude: row.get("latitude")?,
            longitude: row.get("longitude")?,
            owner_id: parse_uuid_column(row, "owner_id")?,
            amenity_ids: Default::default(),
        };
        place.validate()?;
        Ok(place)
    }

    fn column_for_attribute(name: &str) -> Option<&'static str> {
        match name {
            "id" => Some("id"),
            "title" => Some("title"),
            "price" => Some("price"),
            "latitude" => Some("latitude"),
            "longitude" => Some("longitude"),
            "owner_id" => Some("owner_id"),
            _ => None,
        }
    }

    fn load_associations(&mut self, conn: &Connection) -> RepoResult<()> {
        let mut stmt =
            conn.prepare("SELECT amenity_id FROM place_amenities WHERE place_id = ?1;")?;
        let mut rows = stmt.query(params![self.meta.id.to_string()])?;

        self.amenity_ids.clear();
        while let Some(row) = rows.next()? {
            let amenity_id: String = row.get(0)?;
            let amenity_id = Uuid::parse_str(&amenity_id).map_err(|_| {
                RepoError::InvalidData(format!(
                    "invalid uuid `{amenity_id}` in place_amenities.amenity_id"
                ))
            })?;
            self.amenity_ids.insert(amenity_id);
        }
        Ok(())
    }

    fn store_associations(&self, conn: &Connection) -> RepoResult<()> {
        conn.execute(
            "DELETE FROM place_amenities WHERE place_id = ?1;",
            params![self.meta.id.to_string()],
        )?;
        let mut stmt =
            conn.prepare("INSERT INTO place_amenities (place_id, amenity_id) VALUES (?1, ?2);")?;
        for amenity_id in &self.amenity_ids {
            stmt.execute(params![self.meta.id.to_string(), amenity_id.to_string()])?;
        }
        Ok(())
    }
}

impl SqlRecord for Review {
    const TABLE: &'static str = "reviews";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "created_at",
        "updated_at",
        "text",
        "rating",
        "user_id",
        "place_id",
    ];

    fn bind_values(&self) -> Vec<Value> {
        let mut values = meta_bind_values(&self.meta);
        values.push(Value::Text(self.text.clone()));
        values.push(Value::Integer(i64::from(self.rating)));
        values.push(Value::Text(self.user_id.to_string()));
        values.push(Value::Text(self.place_id.to_string()));
        values
    }

    fn from_row(row: &Row<'_>) -> RepoResult<Self> {
        let rating: i64 = row.get("rating")?;
        let rating = u8::try_from(rating).map_err(|_| {
            RepoError::InvalidData(format!("invalid rating value `{rating}` in reviews.rating"))
        })?;

        let review = Self {
            meta: meta_from_row(row)?,
            text: row.get("text")?,
            rating,
            user_id: parse_uuid_column(row, "user_id")?,
            place_id: parse_uuid_column(row, "place_id")?,
        };
        review.validate()?;
        Ok(review)
    }

    fn column_for_attribute(name: &str) -> Option<&'static str> {
        match name {
            "id" => Some("id"),
            "text" => Some("text"),
            "rating" => Some("rating"),
            "user_id" => Some("user_id"),
            "place_id" => Some("place_id"),
            _ => None,
        }
    }
}

impl SqlRecord for Amenity {
    const TABLE: &'static str = "amenities";
    const COLUMNS: &'static [&'static str] = &["id", "created_at", "updated_at", "name"];

    fn bind_values(&self) -> Vec<Value> {
        let mut values = meta_bind_values(&self.meta);
        values.push(Value::Text(self.name.clone()));
        values
    }

    fn from_row(row: &Row<'_>) -> RepoResult<Self> {
        let amenity = Self {
            meta: meta_from_row(row)?,
            name: row.get("name")?,
        };
        amenity.validate()?;
        Ok(amenity)
    }

    fn column_for_attribute(name: &str) -> Option<&'static str> {
        match name {
            "id" => Some("id"),
            "name" => Some("name"),
            _ => None,
        }
    }
}

fn meta_bind_values(meta: &EntityMeta) -> Vec<Value> {
    vec![
        Value::Text(meta.id.to_string()),
        Value::Text(meta.created_at.to_rfc3339()),
        Value::Text(meta.updated_at.to_rfc3339()),
    ]
}

fn meta_from_row(row: &Row<'_>) -> RepoResult<EntityMeta> {
    Ok(EntityMeta {
        id: parse_uuid_column(row, "id")?,
        created_at: parse_timestamp(row, "created_at")?,
        updated_at: parse_timestamp(row, "updated_at")?,
    })
}

fn parse_uuid_column(row: &Row<'_>, column: &'static str) -> RepoResult<Uuid> {
    let text: String = row.get(column)?;
    Uuid::parse_str(&text)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid `{text}` in column `{column}`")))
}

fn parse_timestamp(row: &Row<'_>, column: &'static str) -> RepoResult<DateTime<Utc>> {
    let text: String = row.get(column)?;
    DateTime::parse_from_rfc3339(&text)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|_| {
            RepoError::InvalidData(format!("invalid timestamp `{text}` in column `{column}`"))
        })
}

fn parse_bool(row: &Row<'_>, column: &'static str) -> RepoResult<bool> {
    match row.get::<_, i64>(column)? {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid boolean value `{other}` in column `{column}`"
        ))),
    }
}

fn attr_to_sql(value: &AttrValue) -> Value {
    match value {
        AttrValue::Str(text) => Value::Text(text.clone()),
        AttrValue::Int(number) => Value::Integer(*number),
        AttrValue::Float(number) => Value::Real(*number),
        AttrValue::Bool(flag) => Value::Integer(i64::from(*flag)),
        AttrValue::Id(id) => Value::Text(id.to_string()),
    }
}

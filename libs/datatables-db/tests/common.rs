#![allow(dead_code)]
use anyhow::Result;
use chrono::{Days, NaiveDate};
use rand::seq::SliceRandom;
use sea_orm::{
    ActiveValue::Set, ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbBackend,
    EntityTrait, Schema,
};
use serde_json::{json, Value};

pub const USER_VIEW_COLUMNS: [&str; 5] = [
    "User.username",
    "User.email",
    "User.first_name",
    "User.last_name",
    "User.column_with_single_value",
];

pub mod users {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "users")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i32,
        pub username: String,
        pub email: String,
        pub first_name: Option<String>,
        pub last_name: Option<String>,
        pub column_with_single_value: String,
        pub an_int: i32,
        /// Plain `YYYY-MM-DD HH:MM:SS` text.
        pub created_on: String,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

/// Rows with a native timestamp column, stored by SeaORM as RFC 3339 text
/// on SQLite.
pub mod events {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "events")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i32,
        pub name: String,
        pub created_at: DateTimeUtc,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

/// Fresh in-memory SQLite database with an empty `users` table.
pub async fn bring_up_sqlite() -> Result<DatabaseConnection> {
    let mut opts = ConnectOptions::new("sqlite::memory:");
    // one connection, otherwise every pooled connection sees its own database
    opts.max_connections(1).min_connections(1).sqlx_logging(false);
    let db = Database::connect(opts).await?;

    let schema = Schema::new(DbBackend::Sqlite);
    let create = schema.create_table_from_entity(users::Entity);
    db.execute(db.get_database_backend().build(&create)).await?;
    Ok(db)
}

/// 50 users alternating `johndoeNN`/`msmithNN` with `an_int = NN`, inserted
/// in shuffled order. User `NN` was created at noon, `NN` days after
/// 2020-01-01.
pub async fn create_many_sample_users(db: &DatabaseConnection) -> Result<()> {
    let epoch = NaiveDate::from_ymd_opt(2020, 1, 1).ok_or_else(|| anyhow::anyhow!("bad epoch"))?;

    let mut rows: Vec<users::ActiveModel> = (0..50)
        .map(|n: i32| {
            let username = if n % 2 == 0 {
                format!("johndoe{n:02}")
            } else {
                format!("msmith{n:02}")
            };
            let created = epoch + Days::new(n as u64);
            users::ActiveModel {
                email: Set(format!("{username}@example.com")),
                username: Set(username),
                column_with_single_value: Set("000000|TBD".to_string()),
                an_int: Set(n),
                created_on: Set(format!("{} 12:00:00", created.format("%Y-%m-%d"))),
                ..Default::default()
            }
        })
        .collect();
    rows.shuffle(&mut rand::rng());

    users::Entity::insert_many(rows).exec(db).await?;
    Ok(())
}

/// Adds an `events` table with one row per `(name, UTC timestamp)`.
pub async fn create_events(
    db: &DatabaseConnection,
    rows: &[(&str, chrono::DateTime<chrono::Utc>)],
) -> Result<()> {
    let schema = Schema::new(DbBackend::Sqlite);
    let create = schema.create_table_from_entity(events::Entity);
    db.execute(db.get_database_backend().build(&create)).await?;

    let models = rows.iter().map(|(name, at)| events::ActiveModel {
        name: Set(name.to_string()),
        created_at: Set(*at),
        ..Default::default()
    });
    events::Entity::insert_many(models).exec(db).await?;
    Ok(())
}

/// The request a freshly loaded DataTables grid sends for the user view
/// columns: first column ascending, first page of 10.
pub fn sample_params() -> Value {
    let column = |searchable: &str, orderable: &str| {
        json!({
            "data": "0", "name": "", "searchable": searchable, "orderable": orderable,
            "search": {"value": "", "regex": "false"}
        })
    };
    json!({
        "draw": "1",
        "columns": {
            "0": column("true", "true"),
            "1": column("true", "true"),
            "2": column("false", "false"),
            "3": column("false", "true"),
            "4": column("false", "true")
        },
        "order": {"0": {"column": "0", "dir": "asc"}},
        "start": "0",
        "length": "10",
        "search": {"value": "", "regex": "false"},
        "_": "1423364387185"
    })
}

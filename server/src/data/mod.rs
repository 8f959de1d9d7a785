use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use phatik_server_shared::Event;
use rusqlite::{params, Connection};

pub(crate) struct DbEvent {
    pub(crate) message: String,
    pub(crate) app: String,
    pub(crate) tags: Vec<i64>,
    pub(crate) epoch_seconds: i64,
}

pub(crate) struct DbTag {
    pub(crate) text: String,
}

impl From<&str> for DbTag {
    /// Drops [`constants::TAG_SEPARATOR`] so a stored tag reads back whole.
    fn from(s: &str) -> Self {
        Self {
            text: s.replace(constants::TAG_SEPARATOR, ""),
        }
    }
}

pub(crate) mod constants {
    /// Joins tag texts in `GROUP_CONCAT`; stripped from incoming tags.
    pub(crate) const TAG_SEPARATOR: char = '\u{1f}';
}

pub(crate) struct DatabaseApi {
    connection: Connection,
}

impl DatabaseApi {
    pub(crate) fn new_temporary() -> Result<Self> {
        let connection = Connection::open_in_memory().context("when opening in-memory database")?;
        Ok(Self { connection })
    }

    pub(crate) fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("when creating {}", parent.display()))?;
        }
        let connection = Connection::open(path)
            .with_context(|| format!("when opening database {}", path.display()))?;
        Ok(Self { connection })
    }

    pub(crate) fn init_database(&self) -> Result<()> {
        self.connection
            .execute_batch(
                r"
                CREATE TABLE IF NOT EXISTS status (
                    id              INTEGER PRIMARY KEY,
                    message         TEXT NOT NULL,
                    app             TEXT NOT NULL,
                    timestamp       INTEGER NOT NULL
                );

                CREATE TABLE IF NOT EXISTS tags (
                    id              INTEGER PRIMARY KEY,
                    text            TEXT NOT NULL UNIQUE
                );

                CREATE TABLE IF NOT EXISTS tags_relation (
                    status_id       INTEGER NOT NULL,
                    tag_id          INTEGER NOT NULL,
                    FOREIGN KEY (status_id) REFERENCES status(id),
                    FOREIGN KEY (tag_id) REFERENCES tags(id),
                    PRIMARY KEY (status_id, tag_id)
                );
                ",
            )
            .context("when creating tables")
    }

    pub(crate) fn add_fake_data(&self) -> Result<()> {
        let now = Utc::now().timestamp();
        let fake_events = [
            ("Starting a build", "concourse", vec!["build", "js", "helm"], now),
            ("Deploying helm", "git", vec!["helm", "deploy", "go"], now + 1),
            ("Toggling storage radiator", "git", vec!["js", "automation"], now + 2),
        ];
        let count = fake_events.len();

        for (message, app, tags, epoch_seconds) in fake_events {
            let tags = tags
                .into_iter()
                .map(|tag| self.register_tag(tag.into()))
                .collect::<Result<Vec<_>>>()?;
            self.register_event(DbEvent {
                message: message.to_owned(),
                app: app.to_owned(),
                tags,
                epoch_seconds,
            })?;
        }
        log::info!("inserted {count} fake events");
        Ok(())
    }

    pub(crate) fn register_tag(&self, tag: DbTag) -> Result<i64> {
        self.connection
            .execute(
                "INSERT OR IGNORE INTO tags(text) VALUES (?1)",
                params![tag.text],
            )
            .context("when inserting tag")?;

        self.connection
            .query_row(
                "SELECT id FROM tags WHERE text = (?1)",
                params![tag.text],
                |row| row.get(0),
            )
            .context("when retrieving tag id")
    }

    /// Stores the event together with its tag relations and returns its id.
    pub(crate) fn register_event(&self, event: DbEvent) -> Result<i64> {
        let transaction = self
            .connection
            .unchecked_transaction()
            .context("when starting transaction")?;

        transaction
            .execute(
                "INSERT INTO status(message, app, timestamp) VALUES (?1, ?2, ?3)",
                params![event.message, event.app, event.epoch_seconds],
            )
            .context("when inserting status")?;
        let status_id = transaction.last_insert_rowid();

        for tag in event.tags {
            transaction
                .execute(
                    "INSERT OR IGNORE INTO tags_relation(status_id, tag_id) VALUES (?1, ?2)",
                    params![status_id, tag],
                )
                .context("when relating tag")?;
        }

        transaction.commit().context("when committing status")?;
        Ok(status_id)
    }

    /// Events with an id above `start_id`, oldest first, together with the
    /// largest id returned (or `start_id` if there is none).
    pub(crate) fn events_after_id(&self, start_id: i64, max_count: i64) -> Result<(i64, Vec<Event>)> {
        log::debug!("events after {start_id}, at most {max_count}");
        let mut stmt = self.connection.prepare(
            r"
             SELECT status.id, message, app, timestamp, GROUP_CONCAT(tags.text, char(31))
             FROM status
             LEFT JOIN tags_relation ON tags_relation.status_id = status.id
             LEFT JOIN tags ON tags.id = tags_relation.tag_id
             WHERE status.id > ?1
             GROUP BY status.id
             ORDER BY status.id ASC
             LIMIT ?2",
        )?;

        let rows = stmt
            .query_map(params![start_id, max_count], |row| {
                let id: i64 = row.get(0)?;
                let tags: Option<String> = row.get(4)?;
                let mut tags = tags
                    .map(|t| {
                        t.split(constants::TAG_SEPARATOR)
                            .map(ToOwned::to_owned)
                            .collect::<Vec<_>>()
                    })
                    .unwrap_or_default();
                tags.sort();
                Ok((
                    id,
                    Event {
                        message: row.get(1)?,
                        app: row.get(2)?,
                        tags,
                        epoch_seconds: row.get(3)?,
                    },
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("when reading events")?;

        let max_id = rows.iter().map(|(id, _)| *id).fold(start_id, i64::max);
        Ok((max_id, rows.into_iter().map(|(_, event)| event).collect()))
    }

    pub(crate) fn newest_id(&self) -> Result<i64> {
        self.connection
            .query_row("SELECT COALESCE(MAX(id), -1) FROM status", params![], |row| {
                row.get(0)
            })
            .context("when reading newest id")
    }

    pub(crate) fn all_tags(&self, limit: Option<i64>) -> Result<Vec<String>> {
        let mut stmt = self
            .connection
            .prepare("SELECT text FROM tags ORDER BY text LIMIT ?1")?;

        let tags = stmt
            .query_map(params![limit.unwrap_or(-1)], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()
            .context("when reading tags")?;
        Ok(tags)
    }
}

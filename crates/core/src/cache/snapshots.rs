//! Snapshot storage: the SQLite implementation of [`CacheStore`].
//!
//! A snapshot is written once and only ever replaced wholesale by a newer
//! snapshot under the same (generation, key) pair.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

use super::connection::CacheDb;
use super::generation::CacheStore;
use super::hash::RequestKey;
use crate::Error;
use crate::message::{Headers, Request, Response, ResponseSource};

/// `Vary: *` marker. A snapshot recorded with it never matches.
const VARY_ANY: &str = "*";

/// A stored response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub generation: String,
    pub key: RequestKey,
    pub method: String,
    pub url: String,
    pub status: u16,
    pub headers_json: String,
    /// Request header values captured for each name in the response's `Vary`.
    pub vary_json: Option<String>,
    pub body: Vec<u8>,
    pub stored_at: String,
}

impl Snapshot {
    /// Capture `response` as stored for `request` in `generation`.
    pub fn capture(generation: &str, request: &Request, response: &Response) -> Result<Self, Error> {
        let vary = response.vary();
        let vary_json = if vary.is_empty() {
            None
        } else {
            let captured: BTreeMap<String, Option<String>> = vary
                .into_iter()
                .map(|name| {
                    let value = request.header(&name).map(str::to_string);
                    (name, value)
                })
                .collect();
            Some(serde_json::to_string(&captured)?)
        };

        Ok(Self {
            generation: generation.to_string(),
            key: RequestKey::for_request(request),
            method: request.method.clone(),
            url: request.url.to_string(),
            status: response.status,
            headers_json: serde_json::to_string(&response.headers)?,
            vary_json,
            body: response.body.to_vec(),
            stored_at: chrono::Utc::now().to_rfc3339(),
        })
    }

    pub fn headers(&self) -> Result<Headers, Error> {
        Ok(serde_json::from_str(&self.headers_json)?)
    }

    /// Whether `request` carries the same values for every header the
    /// stored response varies on.
    pub fn matches_vary(&self, request: &Request) -> Result<bool, Error> {
        let Some(vary_json) = &self.vary_json else {
            return Ok(true);
        };
        let captured: BTreeMap<String, Option<String>> = serde_json::from_str(vary_json)?;
        if captured.contains_key(VARY_ANY) {
            return Ok(false);
        }
        Ok(captured
            .iter()
            .all(|(name, value)| request.header(name) == value.as_deref()))
    }

    /// Rebuild the response this snapshot was captured from.
    pub fn into_response(self) -> Result<Response, Error> {
        let headers = self.headers()?;
        Ok(Response { status: self.status, headers, body: self.body.into(), source: ResponseSource::Cache })
    }
}

fn row_to_snapshot(row: &rusqlite::Row<'_>) -> rusqlite::Result<Snapshot> {
    Ok(Snapshot {
        generation: row.get(0)?,
        key: RequestKey::from_stored(row.get(1)?),
        method: row.get(2)?,
        url: row.get(3)?,
        status: row.get(4)?,
        headers_json: row.get(5)?,
        vary_json: row.get(6)?,
        body: row.get(7)?,
        stored_at: row.get(8)?,
    })
}

fn insert_snapshot(conn: &rusqlite::Connection, snapshot: &Snapshot) -> rusqlite::Result<usize> {
    conn.execute(
        "INSERT INTO entries (
            generation, key, method, url, status, headers_json, vary_json, body, stored_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        ON CONFLICT(generation, key) DO UPDATE SET
            method = excluded.method,
            url = excluded.url,
            status = excluded.status,
            headers_json = excluded.headers_json,
            vary_json = excluded.vary_json,
            body = excluded.body,
            stored_at = excluded.stored_at",
        params![
            &snapshot.generation,
            snapshot.key.as_str(),
            &snapshot.method,
            &snapshot.url,
            snapshot.status,
            &snapshot.headers_json,
            &snapshot.vary_json,
            &snapshot.body,
            &snapshot.stored_at,
        ],
    )
}

/// Cache API semantics: only `GET` requests can be stored.
fn ensure_storable(request: &Request) -> Result<(), Error> {
    if request.method != "GET" {
        return Err(Error::StoreRejected(format!("cannot store {} request for {}", request.method, request.url)));
    }
    Ok(())
}

#[async_trait]
impl CacheStore for CacheDb {
    async fn open_generation(&self, name: &str) -> Result<(), Error> {
        let name = name.to_string();
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT OR IGNORE INTO generations (name, created_at) VALUES (?1, ?2)",
                    params![name, now],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn lookup(&self, generation: &str, request: &Request) -> Result<Option<Snapshot>, Error> {
        let generation = generation.to_string();
        let key = RequestKey::for_request(request);
        let found = self
            .conn
            .call(move |conn| -> Result<Option<Snapshot>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT generation, key, method, url, status, headers_json, vary_json, body, stored_at
                     FROM entries WHERE generation = ?1 AND key = ?2",
                )?;

                match stmt.query_row(params![generation, key.as_str()], row_to_snapshot) {
                    Ok(s) => Ok(Some(s)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)?;

        match found {
            Some(snapshot) if snapshot.matches_vary(request)? => Ok(Some(snapshot)),
            _ => Ok(None),
        }
    }

    async fn put(&self, generation: &str, request: &Request, response: &Response) -> Result<(), Error> {
        ensure_storable(request)?;
        let snapshot = Snapshot::capture(generation, request, response)?;
        self.conn
            .call(move |conn| -> Result<(), Error> {
                insert_snapshot(conn, &snapshot)?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn put_all(&self, generation: &str, entries: &[(Request, Response)]) -> Result<(), Error> {
        let snapshots = entries
            .iter()
            .map(|(request, response)| {
                ensure_storable(request)?;
                Snapshot::capture(generation, request, response)
            })
            .collect::<Result<Vec<_>, Error>>()?;

        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                for snapshot in &snapshots {
                    insert_snapshot(&tx, snapshot)?;
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn generation_names(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM generations ORDER BY created_at, name")?;
                let names = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    async fn delete_generation(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let count = conn.execute("DELETE FROM generations WHERE name = ?1", params![name])?;
                Ok(count > 0)
            })
            .await
            .map_err(Error::from)
    }

    async fn keys(&self, generation: &str) -> Result<Vec<RequestKey>, Error> {
        let generation = generation.to_string();
        self.conn
            .call(move |conn| -> Result<Vec<RequestKey>, Error> {
                let mut stmt = conn.prepare("SELECT key FROM entries WHERE generation = ?1 ORDER BY key")?;
                let keys = stmt
                    .query_map(params![generation], |row| row.get::<_, String>(0))?
                    .map(|key| key.map(RequestKey::from_stored))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(keys)
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GEN: &str = "offgrid-dynamic-v1";

    fn ok_response(body: &str) -> Response {
        let mut headers = Headers::new();
        headers.insert("content-type".into(), "text/plain".into());
        Response::new(200, headers, body.to_string())
    }

    async fn open_db() -> CacheDb {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.open_generation(GEN).await.unwrap();
        db
    }

    #[tokio::test]
    async fn test_put_and_lookup() {
        let db = open_db().await;
        let request = Request::parse("https://example.com/app.js").unwrap();

        db.put(GEN, &request, &ok_response("console.log(1)")).await.unwrap();

        let snapshot = db.lookup(GEN, &request).await.unwrap().unwrap();
        assert_eq!(snapshot.status, 200);
        assert_eq!(snapshot.url, "https://example.com/app.js");

        let response = snapshot.into_response().unwrap();
        assert_eq!(response.body, "console.log(1)");
        assert_eq!(response.source, ResponseSource::Cache);
        assert_eq!(response.content_type(), Some("text/plain"));
    }

    #[tokio::test]
    async fn test_lookup_missing() {
        let db = open_db().await;
        let request = Request::parse("https://example.com/nothing").unwrap();
        assert!(db.lookup(GEN, &request).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_generations_are_disjoint() {
        let db = open_db().await;
        db.open_generation("other").await.unwrap();
        let request = Request::parse("https://example.com/app.js").unwrap();

        db.put(GEN, &request, &ok_response("a")).await.unwrap();

        assert!(db.lookup("other", &request).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_replaces_snapshot() {
        let db = open_db().await;
        let request = Request::parse("https://example.com/api/items").unwrap();

        db.put(GEN, &request, &ok_response("old")).await.unwrap();
        db.put(GEN, &request, &ok_response("new")).await.unwrap();

        let response = db.lookup(GEN, &request).await.unwrap().unwrap().into_response().unwrap();
        assert_eq!(response.body, "new");
        assert_eq!(db.keys(GEN).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_put_rejects_non_get() {
        let db = open_db().await;
        let request = Request::new("POST", url::Url::parse("https://example.com/api/items").unwrap());

        let result = db.put(GEN, &request, &ok_response("x")).await;
        assert!(matches!(result, Err(Error::StoreRejected(_))));
    }

    #[tokio::test]
    async fn test_vary_mismatch_misses() {
        let db = open_db().await;
        let stored_for = Request::parse("https://example.com/api/data")
            .unwrap()
            .with_header("accept", "application/json");
        let mut response = ok_response("{}");
        response.headers.insert("vary".into(), "Accept".into());

        db.put(GEN, &stored_for, &response).await.unwrap();

        let same = Request::parse("https://example.com/api/data")
            .unwrap()
            .with_header("Accept", "application/json");
        let different = Request::parse("https://example.com/api/data")
            .unwrap()
            .with_header("accept", "text/html");
        assert!(db.lookup(GEN, &same).await.unwrap().is_some());
        assert!(db.lookup(GEN, &different).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_vary_star_never_matches() {
        let db = open_db().await;
        let request = Request::parse("https://example.com/live").unwrap();
        let mut response = ok_response("now");
        response.headers.insert("vary".into(), "*".into());

        db.put(GEN, &request, &response).await.unwrap();

        assert!(db.lookup(GEN, &request).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_all_is_atomic() {
        let db = open_db().await;
        let good = Request::parse("https://example.com/index.html").unwrap();
        let bad = Request::new("POST", url::Url::parse("https://example.com/form").unwrap());

        let result = db
            .put_all(GEN, &[(good.clone(), ok_response("<html>")), (bad, ok_response("x"))])
            .await;

        assert!(result.is_err());
        assert!(db.lookup(GEN, &good).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_open_generation_idempotent() {
        let db = open_db().await;
        db.open_generation(GEN).await.unwrap();
        assert_eq!(db.generation_names().await.unwrap(), vec![GEN.to_string()]);
    }

    #[tokio::test]
    async fn test_delete_generation_cascades() {
        let db = open_db().await;
        let request = Request::parse("https://example.com/app.css").unwrap();
        db.put(GEN, &request, &ok_response("body{}")).await.unwrap();

        assert!(db.delete_generation(GEN).await.unwrap());
        assert!(!db.delete_generation(GEN).await.unwrap());
        assert!(db.generation_names().await.unwrap().is_empty());

        db.open_generation(GEN).await.unwrap();
        assert!(db.lookup(GEN, &request).await.unwrap().is_none());
    }
}

use std::sync::Arc;

use futures::future::BoxFuture;
use reqwest::{Client, Method, StatusCode};

use crate::dao::{
    models::RoomEntity,
    room_store::{RoomStore, RoomVersion, VersionedRoom},
    storage::{StorageError, StorageResult},
};

use super::{
    config::CouchConfig,
    error::{CouchDaoError, CouchResult},
    models::{CouchRoomDocument, room_doc_id},
};

/// Room store backed by a CouchDB database.
#[derive(Clone)]
pub struct CouchRoomStore {
    client: Client,
    base_url: Arc<str>,
    database: Arc<str>,
    auth: Option<(Arc<str>, Arc<str>)>,
}

impl CouchRoomStore {
    /// Establish a connection to CouchDB and ensure the database exists.
    pub async fn connect(config: CouchConfig) -> CouchResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|source| CouchDaoError::ClientBuilder { source })?;

        let base_url = Arc::<str>::from(config.base_url.trim_end_matches('/'));
        let database = Arc::<str>::from(config.database);
        let auth = config
            .username
            .zip(config.password)
            .map(|(u, p)| (Arc::<str>::from(u), Arc::<str>::from(p)));

        let store = Self {
            client,
            base_url,
            database,
            auth,
        };

        store.ensure_database().await?;
        Ok(store)
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}/{}/{}", self.base_url, self.database, path);
        let builder = self.client.request(method, url);
        if let Some((ref user, ref pass)) = self.auth {
            builder.basic_auth(user.as_ref(), Some(pass.as_ref()))
        } else {
            builder
        }
    }

    async fn ensure_database(&self) -> CouchResult<()> {
        let database = self.database.to_string();
        let url = format!("{}/{}", self.base_url, self.database);
        let mut builder = self.client.get(&url);
        if let Some((ref user, ref pass)) = self.auth {
            builder = builder.basic_auth(user.as_ref(), Some(pass.as_ref()));
        }

        let response = builder
            .send()
            .await
            .map_err(|source| CouchDaoError::DatabaseQuery {
                database: database.clone(),
                source,
            })?;

        match response.status() {
            StatusCode::OK => Ok(()),
            StatusCode::NOT_FOUND => {
                let mut builder = self.client.put(&url);
                if let Some((ref user, ref pass)) = self.auth {
                    builder = builder.basic_auth(user.as_ref(), Some(pass.as_ref()));
                }
                let create =
                    builder
                        .send()
                        .await
                        .map_err(|source| CouchDaoError::DatabaseCreate {
                            database: database.clone(),
                            source,
                        })?;
                if create.status().is_success() {
                    Ok(())
                } else {
                    Err(CouchDaoError::DatabaseStatus {
                        database,
                        status: create.status(),
                    })
                }
            }
            other => Err(CouchDaoError::DatabaseStatus {
                database,
                status: other,
            }),
        }
    }

    async fn get_document(&self, doc_id: &str) -> CouchResult<Option<CouchRoomDocument>> {
        let response = self
            .request(Method::GET, doc_id)
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: doc_id.to_string(),
                source,
            })?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => response
                .json::<CouchRoomDocument>()
                .await
                .map(Some)
                .map_err(|source| CouchDaoError::DecodeResponse {
                    path: doc_id.to_string(),
                    source,
                }),
            other => Err(CouchDaoError::RequestStatus {
                path: doc_id.to_string(),
                status: other,
            }),
        }
    }

    async fn put_document(&self, doc_id: &str, document: &CouchRoomDocument) -> CouchResult<String> {
        let response = self
            .request(Method::PUT, doc_id)
            .json(document)
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: doc_id.to_string(),
                source,
            })?;

        match response.status() {
            StatusCode::CONFLICT => Err(CouchDaoError::RevisionConflict {
                path: doc_id.to_string(),
            }),
            status if status.is_success() => {
                let body: PutResponse =
                    response
                        .json()
                        .await
                        .map_err(|source| CouchDaoError::DecodeResponse {
                            path: doc_id.to_string(),
                            source,
                        })?;
                Ok(body.rev)
            }
            other => Err(CouchDaoError::RequestStatus {
                path: doc_id.to_string(),
                status: other,
            }),
        }
    }

    fn map_error(code: &str, err: CouchDaoError) -> StorageError {
        match err {
            CouchDaoError::RevisionConflict { .. } => StorageError::conflict(code),
            other => StorageError::unavailable(other.to_string(), other),
        }
    }
}

#[derive(serde::Deserialize)]
struct PutResponse {
    rev: String,
}

impl RoomStore for CouchRoomStore {
    fn load_room(&self, code: &str) -> BoxFuture<'static, StorageResult<Option<VersionedRoom>>> {
        let store = self.clone();
        let code = code.to_owned();
        Box::pin(async move {
            let doc_id = room_doc_id(&code);
            let maybe_doc = store
                .get_document(&doc_id)
                .await
                .map_err(|err| Self::map_error(&code, err))?;
            Ok(maybe_doc.and_then(|doc| {
                doc.rev.map(|rev| VersionedRoom {
                    room: doc.room,
                    version: rev,
                })
            }))
        })
    }

    fn save_room(
        &self,
        room: RoomEntity,
        expected: Option<RoomVersion>,
    ) -> BoxFuture<'static, StorageResult<RoomVersion>> {
        let store = self.clone();
        Box::pin(async move {
            let code = room.code.clone();
            let doc_id = room_doc_id(&code);

            // Create-only saves carry no revision; CouchDB rejects a
            // revision-less PUT against an existing document with a 409.
            let doc = CouchRoomDocument::from_entity(room, expected);
            store
                .put_document(&doc_id, &doc)
                .await
                .map_err(|err| Self::map_error(&code, err))
        })
    }

    fn delete_room(&self, code: &str) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        let code = code.to_owned();
        Box::pin(async move {
            let doc_id = room_doc_id(&code);
            let Some(doc) = store
                .get_document(&doc_id)
                .await
                .map_err(|err| Self::map_error(&code, err))?
            else {
                return Ok(false);
            };
            let Some(rev) = doc.rev else {
                return Ok(false);
            };

            let response = store
                .request(Method::DELETE, &doc_id)
                .query(&[("rev", rev)])
                .send()
                .await
                .map_err(|source| {
                    Self::map_error(
                        &code,
                        CouchDaoError::RequestSend {
                            path: doc_id.clone(),
                            source,
                        },
                    )
                })?;

            match response.status() {
                StatusCode::NOT_FOUND => Ok(false),
                StatusCode::CONFLICT => Err(StorageError::conflict(&code)),
                status if status.is_success() => Ok(true),
                other => Err(Self::map_error(
                    &code,
                    CouchDaoError::RequestStatus {
                        path: doc_id,
                        status: other,
                    },
                )),
            }
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let url = format!("{}/{}", store.base_url, store.database);
            let mut builder = store.client.get(&url);
            if let Some((ref user, ref pass)) = store.auth {
                builder = builder.basic_auth(user.as_ref(), Some(pass.as_ref()));
            }

            let response = builder.send().await.map_err(|source| {
                StorageError::unavailable(
                    "CouchDB health check failed".into(),
                    CouchDaoError::RequestSend {
                        path: url.clone(),
                        source,
                    },
                )
            })?;

            if response.status().is_success() {
                Ok(())
            } else {
                let err = CouchDaoError::RequestStatus {
                    path: url,
                    status: response.status(),
                };
                Err(StorageError::unavailable(err.to_string(), err))
            }
        })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .ensure_database()
                .await
                .map_err(|err| StorageError::unavailable(err.to_string(), err))
        })
    }
}

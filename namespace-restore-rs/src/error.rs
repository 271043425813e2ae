/// Errors raised by the namespace store.
///
/// The engine's conflict policy dispatches on the first two variants:
/// a duplicate record identifier is a skip, a taken name triggers the
/// rename-and-retry path. Everything else aborts the run.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("object id already exists: {0}")]
    IdExists(String),

    #[error("name already exists: {0}")]
    NameExists(String),

    #[error("no such entry: {0}")]
    NotFound(String),

    #[error(transparent)]
    Db(#[from] rusqlite::Error),

    #[error(transparent)]
    Pool(#[from] r2d2::Error),
}

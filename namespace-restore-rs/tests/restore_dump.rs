//! End-to-end dump replay against a real on-disk store.

use namespace_restore_rs::db::connection::{create_pool, DbPool};
use namespace_restore_rs::db::migrate::migrate;
use namespace_restore_rs::dump::{open_dump, DumpFormat};
use namespace_restore_rs::services::restore::{restore_dump, RestoreSummary};
use namespace_restore_rs::store::SqliteStore;
use std::path::Path;
use tempfile::TempDir;

fn open_store(dir: &TempDir) -> (DbPool, SqliteStore) {
    let db_path = dir.path().join("ns.db");
    let pool = create_pool(db_path.to_str().unwrap()).unwrap();
    migrate(&pool).unwrap();
    (pool.clone(), SqliteStore::new(pool))
}

fn replay(store: &SqliteStore, dump: &Path, format: DumpFormat) -> RestoreSummary {
    restore_dump(store, open_dump(dump, format).unwrap()).unwrap()
}

fn file_count(pool: &DbPool) -> i64 {
    let conn = pool.get().unwrap();
    conn.query_row("SELECT COUNT(*) FROM inodes WHERE kind = 'file'", [], |r| r.get(0))
        .unwrap()
}

#[test]
fn tsm_dump_restores_files_and_replays_idempotently() {
    let dir = TempDir::new().unwrap();
    let (pool, store) = open_store(&dir);

    let dump = dir.path().join("backup.log");
    std::fs::write(
        &dump,
        "a b c d e REC123 f -si=path=/a/b/c.dat;uid=10;gid=20;size=42;flag-c=1:deadbeef;sClass=tape:grpA;hsm=hsm1\n\
         a b c d e REC124 f -si=path=/a/b/c.dat;uid=10;gid=20;size=7\n\
         a b c d e REC125 f -si=path=/a/b/d.dat;size=9\n\
         garbage line\n",
    )
    .unwrap();

    let first = replay(&store, &dump, DumpFormat::Tsm);
    assert_eq!(
        first,
        RestoreSummary {
            created: 2,
            renamed: 1,
            skipped: 0,
            rejected: 0,
        }
    );
    assert_eq!(file_count(&pool), 3);

    let conn = pool.get().unwrap();

    // Fully-populated record: c.dat under /a/b, id REC123, size 42.
    let (name, size): (String, i64) = conn
        .query_row(
            "SELECT name, size FROM inodes WHERE id = 'REC123'",
            [],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )
        .unwrap();
    assert_eq!((name.as_str(), size), ("c.dat", 42));

    let (algo, digest): (u32, String) = conn
        .query_row(
            "SELECT algorithm, digest FROM checksums WHERE inode_id = 'REC123'",
            [],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )
        .unwrap();
    assert_eq!((algo, digest.as_str()), (1, "deadbeef"));

    let (hsm, class, group): (String, String, String) = conn
        .query_row(
            "SELECT hsm, store_class, class_group FROM storage_class WHERE inode_id = 'REC123'",
            [],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
        )
        .unwrap();
    assert_eq!(
        (hsm.as_str(), class.as_str(), group.as_str()),
        ("hsm1", "tape", "grpA")
    );

    let uri: String = conn
        .query_row(
            "SELECT uri FROM locations WHERE inode_id = 'REC123'",
            [],
            |r| r.get(0),
        )
        .unwrap();
    assert_eq!(uri, "hsm1://tape/grpA/REC123");

    // The colliding record got the mangled name.
    let renamed: String = conn
        .query_row("SELECT name FROM inodes WHERE id = 'REC124'", [], |r| r.get(0))
        .unwrap();
    assert_eq!(renamed, "c.dat;REC124");
    drop(conn);

    // Second replay of the same dump is a no-op.
    let second = replay(&store, &dump, DumpFormat::Tsm);
    assert_eq!(
        second,
        RestoreSummary {
            created: 0,
            renamed: 0,
            skipped: 3,
            rejected: 0,
        }
    );
    assert_eq!(file_count(&pool), 3);
}

#[test]
fn yaml_dump_restores_only_precious_records() {
    let dir = TempDir::new().unwrap();
    let (pool, store) = open_store(&dir);

    let dump = dir.path().join("inventory.yaml");
    std::fs::write(
        &dump,
        r#"
"0000A1":
  state: PRECIOUS
  filesize: "1024"
  map:
    path: /data/exp/run1.raw
    uid: "100"
    gid: "200"
"0000B2":
  state: CACHED
  filesize: "99"
  map:
    path: /data/exp/run2.raw
"#,
    )
    .unwrap();

    let summary = replay(&store, &dump, DumpFormat::Yaml);
    assert_eq!(summary.created, 1);
    assert_eq!(file_count(&pool), 1);

    let conn = pool.get().unwrap();
    let (name, uid, gid, size): (String, u32, u32, i64) = conn
        .query_row(
            "SELECT name, uid, gid, size FROM inodes WHERE id = '0000A1'",
            [],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?)),
        )
        .unwrap();
    assert_eq!((name.as_str(), uid, gid, size), ("run1.raw", 100, 200, 1024));

    // The CACHED record never reached the store.
    let missing: bool = conn
        .query_row(
            "SELECT EXISTS(SELECT 1 FROM inodes WHERE id = '0000B2')",
            [],
            |r| r.get(0),
        )
        .unwrap();
    assert!(!missing);
}

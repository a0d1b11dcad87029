use std::path::Path;

use rusqlite::{Connection, params};
use tempfile::tempdir;

use regularly_convert::commands::convert::{ConvertArgs, convert};
use regularly_convert::error::ConvertError;
use regularly_convert::store::room::IDENTITY_HASH;

const REGULARLY_SCHEMA: &str = "CREATE TABLE tasks (
        _id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT,
        details TEXT,
        period INTEGER,
        firstdue TEXT,
        created TEXT,
        lastnotified TEXT,
        notifications_enabled INTEGER,
        notifications_time TEXT,
        notifications_period INTEGER
    );
    CREATE TABLE log (
        _id INTEGER PRIMARY KEY AUTOINCREMENT,
        taskid INTEGER,
        entrydate TEXT,
        note TEXT
    );";

#[derive(Debug, PartialEq)]
struct TaskRow {
    id: i64,
    name: String,
    description: String,
    creation_date: String,
    initial_due_date: String,
    period: i64,
    notifications_enabled: i64,
    notification_last_dismissed: Option<String>,
    notification_time: Option<String>,
    notification_period: Option<i64>,
}

fn create_source(path: &Path) -> Connection {
    let conn = Connection::open(path).unwrap();
    conn.execute_batch(REGULARLY_SCHEMA).unwrap();
    conn
}

fn args(infile: &Path, outdir: &Path) -> ConvertArgs {
    ConvertArgs {
        infile: infile.to_path_buf(),
        outdir: outdir.display().to_string(),
        dry_run: false,
        id_map: None,
    }
}

fn read_tasks(conn: &Connection) -> Vec<TaskRow> {
    conn.prepare(
        "SELECT id, name, description, creationDate, initialDueDate, period,
                notificationsEnabled, notificationLastDismissed, notificationTime,
                notificationPeriod
         FROM tasks_table ORDER BY id",
    )
    .unwrap()
    .query_map([], |row| {
        Ok(TaskRow {
            id: row.get(0)?,
            name: row.get(1)?,
            description: row.get(2)?,
            creation_date: row.get(3)?,
            initial_due_date: row.get(4)?,
            period: row.get(5)?,
            notifications_enabled: row.get(6)?,
            notification_last_dismissed: row.get(7)?,
            notification_time: row.get(8)?,
            notification_period: row.get(9)?,
        })
    })
    .unwrap()
    .collect::<Result<Vec<_>, _>>()
    .unwrap()
}

fn read_log(conn: &Connection) -> Vec<(i64, String, Option<String>)> {
    conn.prepare("SELECT taskId, date, note FROM completion_date_table ORDER BY id")
        .unwrap()
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap()
}

#[test]
fn water_plants_end_to_end() {
    let dir = tempdir().unwrap();
    let infile = dir.path().join("regularly.db");
    let source = create_source(&infile);
    source
        .execute(
            "INSERT INTO tasks (_id, name, details, created, firstdue, period,
                notifications_enabled, lastnotified, notifications_time, notifications_period)
             VALUES (5, 'Water plants', '', '2022-01-01', NULL, 3, 0, NULL, NULL, NULL)",
            [],
        )
        .unwrap();
    source
        .execute(
            "INSERT INTO log (taskid, entrydate, note) VALUES (5, '2022-01-04', 'done')",
            [],
        )
        .unwrap();
    drop(source);

    convert(&args(&infile, &dir.path().join("out"))).unwrap();

    let dest = Connection::open(dir.path().join("converted.db")).unwrap();
    let tasks = read_tasks(&dest);
    assert_eq!(
        tasks,
        vec![TaskRow {
            id: tasks[0].id,
            name: "Water plants".into(),
            description: String::new(),
            creation_date: "2022-01-01".into(),
            initial_due_date: "2022-01-01".into(),
            period: 3,
            notifications_enabled: 0,
            notification_last_dismissed: None,
            notification_time: None,
            notification_period: None,
        }]
    );
    assert_eq!(
        read_log(&dest),
        vec![(tasks[0].id, "2022-01-04".to_string(), Some("done".to_string()))]
    );

    let version: i64 = dest
        .query_row("PRAGMA user_version", [], |row| row.get(0))
        .unwrap();
    assert_eq!(version, 1);
}

#[test]
fn notification_fields_are_reformatted() {
    let dir = tempdir().unwrap();
    let infile = dir.path().join("regularly.db");
    let source = create_source(&infile);
    source
        .execute(
            "INSERT INTO tasks (_id, name, details, created, firstdue, period,
                notifications_enabled, lastnotified, notifications_time, notifications_period)
             VALUES (1, 'Vacuum', 'Upstairs', '2020-01-01', '2020-02-01', 14, 1,
                     '2021-05-05', '09:30', 2)",
            [],
        )
        .unwrap();
    drop(source);

    convert(&args(&infile, &dir.path().join("out"))).unwrap();

    let dest = Connection::open(dir.path().join("converted.db")).unwrap();
    let task = &read_tasks(&dest)[0];
    assert_eq!(task.description, "Upstairs");
    assert_eq!(task.initial_due_date, "2020-02-01");
    assert_eq!(
        task.notification_last_dismissed.as_deref(),
        Some("2021-05-05T00:00:00")
    );
    assert_eq!(task.notification_time.as_deref(), Some("09:30:00"));
    assert_eq!(task.notification_period, Some(2));
}

#[test]
fn log_rows_follow_their_tasks_whatever_the_source_order() {
    let dir = tempdir().unwrap();
    let infile = dir.path().join("regularly.db");
    let source = create_source(&infile);
    for (id, name) in [(40, "Bins"), (12, "Recycling"), (77, "Compost")] {
        source
            .execute(
                "INSERT INTO tasks (_id, name, details, created, period, notifications_enabled)
                 VALUES (?1, ?2, '', '2020-01-01', 7, 0)",
                params![id, name],
            )
            .unwrap();
    }
    for (taskid, date) in [(77, "2020-01-03"), (12, "2020-01-04"), (40, "2020-01-05"), (77, "2020-01-10")] {
        source
            .execute(
                "INSERT INTO log (taskid, entrydate) VALUES (?1, ?2)",
                params![taskid, date],
            )
            .unwrap();
    }
    drop(source);

    convert(&args(&infile, &dir.path().join("out"))).unwrap();

    let dest = Connection::open(dir.path().join("converted.db")).unwrap();
    let linked: Vec<(String, String)> = dest
        .prepare(
            "SELECT t.name, c.date FROM completion_date_table c
             JOIN tasks_table t ON t.id = c.taskId ORDER BY c.id",
        )
        .unwrap()
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    assert_eq!(
        linked,
        vec![
            ("Compost".to_string(), "2020-01-03".to_string()),
            ("Recycling".to_string(), "2020-01-04".to_string()),
            ("Bins".to_string(), "2020-01-05".to_string()),
            ("Compost".to_string(), "2020-01-10".to_string()),
        ]
    );
}

#[test]
fn rerun_recreates_identical_content() {
    let dir = tempdir().unwrap();
    let infile = dir.path().join("regularly.db");
    let source = create_source(&infile);
    source
        .execute_batch(
            "INSERT INTO tasks (_id, name, details, created, period, notifications_enabled)
                 VALUES (2, 'Floss', '', '2020-01-01', 1, 1);
             INSERT INTO tasks (_id, name, details, created, period, notifications_enabled)
                 VALUES (9, 'Stretch', 'Morning', '2020-01-02', 2, 0);
             INSERT INTO log (taskid, entrydate, note) VALUES (9, '2020-01-03', NULL);",
        )
        .unwrap();
    drop(source);

    let outdir = dir.path().join("out");
    convert(&args(&infile, &outdir)).unwrap();
    let dest = Connection::open(dir.path().join("converted.db")).unwrap();
    let first = (read_tasks(&dest), read_log(&dest));
    drop(dest);

    convert(&args(&infile, &outdir)).unwrap();
    let dest = Connection::open(dir.path().join("converted.db")).unwrap();
    let second = (read_tasks(&dest), read_log(&dest));

    assert_eq!(first, second);
    assert_eq!(second.0.len(), 2);
}

#[test]
fn metadata_tables_match_room_expectations() {
    let dir = tempdir().unwrap();
    let infile = dir.path().join("regularly.db");
    drop(create_source(&infile));

    convert(&args(&infile, &dir.path().join("out"))).unwrap();

    let dest = Connection::open(dir.path().join("converted.db")).unwrap();
    let locale: String = dest
        .query_row("SELECT locale FROM android_metadata", [], |row| row.get(0))
        .unwrap();
    assert_eq!(locale, "en_US");
    let (id, hash): (i64, String) = dest
        .query_row("SELECT id, identity_hash FROM room_master_table", [], |row| {
            Ok((row.get(0)?, row.get(1)?))
        })
        .unwrap();
    assert_eq!(id, 42);
    assert_eq!(hash, IDENTITY_HASH);
}

#[test]
fn dangling_log_reference_aborts_after_tasks_are_written() {
    let dir = tempdir().unwrap();
    let infile = dir.path().join("regularly.db");
    let source = create_source(&infile);
    source
        .execute_batch(
            "INSERT INTO tasks (_id, name, details, created, period, notifications_enabled)
                 VALUES (1, 'Floss', '', '2020-01-01', 1, 0);
             INSERT INTO log (taskid, entrydate) VALUES (3, '2020-01-02');",
        )
        .unwrap();
    drop(source);

    let err = convert(&args(&infile, &dir.path().join("out"))).unwrap_err();
    assert!(matches!(
        err,
        ConvertError::MissingTaskMapping { task_id: 3, .. }
    ));

    let dest = Connection::open(dir.path().join("converted.db")).unwrap();
    assert_eq!(read_tasks(&dest).len(), 1);
    assert!(read_log(&dest).is_empty());
    let version: i64 = dest
        .query_row("PRAGMA user_version", [], |row| row.get(0))
        .unwrap();
    assert_eq!(version, 0);
}

//! Process-wide registration of the `sqlite-vec` extension.
//!
//! Registration goes through `sqlite3_auto_extension`, so every connection
//! opened after the first successful call exposes `vec_f32`,
//! `vec_distance_cosine` and friends. Connections opened earlier are not
//! affected.

use rusqlite::Connection;
use std::sync::OnceLock;

static REGISTRATION: OnceLock<Result<(), String>> = OnceLock::new();

/// Register `sqlite-vec` for all connections opened from now on.
///
/// Idempotent: the underlying registration runs once per process and the
/// first outcome is replayed on later calls.
///
/// # Errors
///
/// Returns the SQLite result code as text when the registration is rejected.
pub fn register_auto_extension() -> Result<(), String> {
    REGISTRATION.get_or_init(register_once).clone()
}

/// Report the `sqlite-vec` version visible on `conn`, if any.
#[must_use]
pub fn vec_version(conn: &Connection) -> Option<String> {
    conn.query_row("SELECT vec_version()", [], |row| row.get::<_, String>(0))
        .ok()
}

fn register_once() -> Result<(), String> {
    #[allow(clippy::transmute_ptr_to_ptr)]
    let entrypoint: unsafe extern "C" fn(
        *mut rusqlite::ffi::sqlite3,
        *mut *const std::os::raw::c_char,
        *const rusqlite::ffi::sqlite3_api_routines,
    ) -> std::os::raw::c_int =
        unsafe { std::mem::transmute(sqlite_vec::sqlite3_vec_init as *const ()) };

    let rc = unsafe { rusqlite::ffi::sqlite3_auto_extension(Some(entrypoint)) };
    if rc == rusqlite::ffi::SQLITE_OK {
        Ok(())
    } else {
        Err(format!("sqlite3_auto_extension failed with rc={rc}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_exposes_vec_functions() {
        let result = register_auto_extension();
        assert!(result.is_ok(), "registration failed: {result:?}");

        let conn = Connection::open_in_memory().expect("open in-memory sqlite");
        assert!(vec_version(&conn).is_some());

        let distance: f64 = conn
            .query_row(
                "SELECT vec_distance_cosine(vec_f32('[1.0, 0.0]'), vec_f32('[1.0, 0.0]'))",
                [],
                |row| row.get(0),
            )
            .expect("cosine distance query");
        assert!(distance.abs() < 1e-6);
    }

    #[test]
    fn registration_is_idempotent() {
        let first = register_auto_extension();
        let second = register_auto_extension();
        assert_eq!(first, second);
    }
}

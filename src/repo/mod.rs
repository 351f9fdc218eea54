//! Row-level persistence. Every function takes the connection explicitly and
//! every owned lookup filters by the teacher's `user_id`, so a foreign row is
//! indistinguishable from a missing one.

pub mod attendance;
pub mod classes;
pub mod completions;
pub mod missions;
pub mod students;
pub mod talents;
pub mod users;

pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

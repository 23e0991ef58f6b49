//! Role and permission-scope vocabulary.
//!
//! Roles and scopes are plain strings at this layer; the role→permission
//! mapping lives in the credential store and is resolved per login, not
//! persisted per user.

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_TEACHER: &str = "teacher";
pub const ROLE_STUDENT: &str = "student";

/// Role assigned to every newly registered user.
pub const DEFAULT_ROLE: &str = ROLE_STUDENT;

pub const SCOPE_TASKS_READ: &str = "tasks:read";
pub const SCOPE_TASKS_WRITE: &str = "tasks:write";
pub const SCOPE_TASKS_DELETE: &str = "tasks:delete";
pub const SCOPE_TASKS_SOLVE: &str = "tasks:solve";

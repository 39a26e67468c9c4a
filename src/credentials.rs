//! Credential Store: the local user base used when the remote API is unreachable.

use parking_lot::RwLock;
use std::sync::Arc;

use crate::models::{NewUser, Role, User};

/// Repository over user records. Lookups take a predicate; the named queries
/// the gateway needs are provided on top of `find`/`insert`.
pub trait UserRepository: Send + Sync {
    fn find(&self, predicate: &dyn Fn(&User) -> bool) -> Option<User>;

    /// Append a record, allocating its id
    fn insert(&self, user: NewUser) -> User;

    fn find_by_username_and_password(&self, username: &str, password: &str) -> Option<User> {
        self.find(&|u: &User| u.username == username && u.password == password)
    }

    fn find_by_username_or_email(&self, username: &str, email: &str) -> Option<User> {
        self.find(&|u: &User| u.username == username || u.email == email)
    }

    fn append(&self, user: NewUser) -> User {
        self.insert(user)
    }
}

/// Process-lifetime, ordered, in-memory user list
#[derive(Clone, Default)]
pub struct InMemoryUserStore {
    users: Arc<RwLock<Vec<User>>>,
}

impl InMemoryUserStore {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Store holding the four demo accounts (two ADMIN, two USER)
    pub fn seeded() -> Self {
        Self::with_users(demo_users())
    }

    pub fn with_users(users: Vec<User>) -> Self {
        Self {
            users: Arc::new(RwLock::new(users)),
        }
    }

    pub fn len(&self) -> usize {
        self.users.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.read().is_empty()
    }

    pub fn all(&self) -> Vec<User> {
        self.users.read().clone()
    }
}

impl UserRepository for InMemoryUserStore {
    fn find(&self, predicate: &dyn Fn(&User) -> bool) -> Option<User> {
        self.users.read().iter().find(|u| predicate(u)).cloned()
    }

    fn insert(&self, user: NewUser) -> User {
        let mut users = self.users.write();
        // Next id is max + 1
        let id = users.iter().map(|u| u.id).max().unwrap_or(0) + 1;
        let record = User {
            id,
            username: user.username,
            email: user.email,
            password: user.password,
            role: user.role,
        };
        users.push(record.clone());
        record
    }
}

pub fn demo_users() -> Vec<User> {
    let user = |id, username: &str, email: &str, password: &str, role| User {
        id,
        username: username.to_string(),
        email: email.to_string(),
        password: password.to_string(),
        role,
    };
    vec![
        user(1, "admin", "admin@sweetshop.com", "admin123", Role::Admin),
        user(2, "user1", "user1@sweetshop.com", "user123", Role::User),
        user(3, "john", "john@example.com", "john123", Role::User),
        user(4, "alice", "alice@example.com", "alice123", Role::Admin),
    ]
}

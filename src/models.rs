use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "USER",
            Role::Admin => "ADMIN",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "USER" => Some(Role::User),
            "ADMIN" => Some(Role::Admin),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Known account. Password is plaintext; the local store is a demo fallback.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct User {
    pub id: u64,
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

impl User {
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            role: self.role,
        }
    }
}

/// User fields safe to hand back to a surface
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct UserSummary {
    pub id: u64,
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: Role,
}

/// Record about to be appended; the store allocates the id
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RegisterResponse {
    #[serde(default)]
    pub message: String,
    pub user: UserSummary,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserSummary,
}

/// Catalog item as served by `/sweets`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Sweet {
    pub id: u64,
    pub name: String,
    pub category: String,
    pub price: f64,
    pub quantity: u32,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: String,
}

/// Add/update body for the admin panel (no id)
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SweetDraft {
    pub name: String,
    pub category: String,
    pub price: f64,
    pub quantity: u32,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: String,
}

impl SweetDraft {
    pub fn into_sweet(self, id: u64) -> Sweet {
        Sweet {
            id,
            name: self.name,
            category: self.category,
            price: self.price,
            quantity: self.quantity,
            description: self.description,
            image: self.image,
        }
    }
}

/// Entry of the `purchasedItems` ledger
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseRecord {
    pub id: Uuid,
    pub sweet_id: u64,
    pub sweet_name: String,
    pub category: String,
    pub description: String,
    pub unit_price: f64,
    pub quantity: u32,
    pub total_price: f64,
    pub purchase_date: DateTime<Utc>,
    pub user_id: Option<u64>,
}

impl PurchaseRecord {
    pub fn new(sweet: &Sweet, quantity: u32, user_id: Option<u64>, at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            sweet_id: sweet.id,
            sweet_name: sweet.name.clone(),
            category: sweet.category.clone(),
            description: sweet.description.clone(),
            unit_price: sweet.price,
            quantity,
            total_price: sweet.price * quantity as f64,
            purchase_date: at,
            user_id,
        }
    }
}

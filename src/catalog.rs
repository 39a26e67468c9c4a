//! Storefront and admin-panel inventory logic.
//!
//! Reads go remote-then-local; a successful remote listing refreshes the local
//! copy. Mutations are sent to the remote on a best-effort basis and always
//! applied to the local catalog, so the surface sees its change either way.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::info;

use crate::errors::CatalogError;
use crate::fallback::{FallbackPolicy, Source};
use crate::models::{PurchaseRecord, Sweet, SweetDraft};
use crate::remote::RemoteCatalog;
use crate::session::{Session, SessionState};
use crate::storage::Storage;

pub const ALL_CATEGORIES: &str = "All Categories";

/// Dashboard filter. Empty fields match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SweetFilter {
    /// Case-insensitive substring of name or description
    pub search: Option<String>,
    /// Exact category; `None` or "All Categories" means any
    pub category: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
}

impl SweetFilter {
    pub fn is_empty(&self) -> bool {
        self.search.as_deref().map_or(true, str::is_empty)
            && self.selected_category().is_none()
            && self.min_price.is_none()
            && self.max_price.is_none()
    }

    /// The category to filter on, None for any
    pub fn selected_category(&self) -> Option<&str> {
        self.category.as_deref().filter(|c| *c != ALL_CATEGORIES && !c.is_empty())
    }

    pub fn matches(&self, sweet: &Sweet) -> bool {
        let matches_search = match self.search.as_deref() {
            Some(term) if !term.is_empty() => {
                let term = term.to_lowercase();
                sweet.name.to_lowercase().contains(&term) || sweet.description.to_lowercase().contains(&term)
            }
            _ => true,
        };
        let matches_category = self.selected_category().map_or(true, |c| sweet.category == c);
        let matches_price = self.min_price.map_or(true, |min| sweet.price >= min)
            && self.max_price.map_or(true, |max| sweet.price <= max);
        matches_search && matches_category && matches_price
    }

    pub fn apply(&self, sweets: &[Sweet]) -> Vec<Sweet> {
        sweets.iter().filter(|s| self.matches(s)).cloned().collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockStatus {
    OutOfStock,
    LowStock,
    MediumStock,
    InStock,
}

impl StockStatus {
    pub fn label(&self) -> &'static str {
        match self {
            StockStatus::OutOfStock => "Out of Stock",
            StockStatus::LowStock => "Low Stock",
            StockStatus::MediumStock => "Medium Stock",
            StockStatus::InStock => "In Stock",
        }
    }
}

pub fn stock_status(quantity: u32) -> StockStatus {
    match quantity {
        0 => StockStatus::OutOfStock,
        1..=4 => StockStatus::LowStock,
        5..=9 => StockStatus::MediumStock,
        _ => StockStatus::InStock,
    }
}

pub fn format_currency(amount: f64) -> String {
    format!("${:.2}", amount)
}

pub fn categories() -> Vec<&'static str> {
    vec![ALL_CATEGORIES, "Chocolate", "Gummy", "Cake", "Cookie", "Hard Candy", "Fudge", "Spun Sugar"]
}

/// The demo inventory used when no remote catalog was ever fetched
pub fn demo_sweets() -> Vec<Sweet> {
    let sweet = |id, name: &str, category: &str, price, quantity, description: &str| Sweet {
        id,
        name: name.to_string(),
        category: category.to_string(),
        price,
        quantity,
        description: description.to_string(),
        image: String::new(),
    };
    vec![
        sweet(1, "Dark Chocolate Truffle", "Chocolate", 3.99, 25, "Rich dark chocolate truffle with cocoa powder coating"),
        sweet(2, "Strawberry Gummy Bears", "Gummy", 2.49, 50, "Soft and chewy strawberry-flavored gummy bears"),
        sweet(3, "Vanilla Cupcake", "Cake", 4.99, 12, "Fluffy vanilla cupcake with cream cheese frosting"),
        sweet(4, "Mint Chocolate Chip Cookie", "Cookie", 2.99, 30, "Crispy cookie with mint chocolate chips"),
        sweet(5, "Rainbow Lollipop", "Hard Candy", 1.99, 0, "Colorful spiral rainbow lollipop"),
        sweet(6, "Caramel Fudge", "Fudge", 5.49, 18, "Smooth caramel fudge with sea salt"),
        sweet(7, "Cotton Candy", "Spun Sugar", 3.49, 15, "Pink and blue cotton candy on a stick"),
        sweet(8, "Chocolate Chip Muffin", "Cake", 3.79, 20, "Moist chocolate chip muffin with buttermilk"),
        sweet(9, "Sour Patch Kids", "Gummy", 2.79, 35, "Sour then sweet gummy candy kids"),
        sweet(10, "White Chocolate Mousse", "Chocolate", 6.99, 8, "Light and airy white chocolate mousse"),
        sweet(11, "Peppermint Bark", "Chocolate", 4.49, 22, "Dark chocolate with peppermint pieces"),
        sweet(12, "Jelly Beans Assorted", "Hard Candy", 3.29, 40, "Mixed flavors of colorful jelly beans"),
    ]
}

pub struct CatalogService {
    remote: Option<Arc<dyn RemoteCatalog>>,
    storage: Storage,
    session: SessionState,
    policy: FallbackPolicy,
}

impl CatalogService {
    pub fn new(remote: Option<Arc<dyn RemoteCatalog>>, storage: Storage, session: SessionState) -> Self {
        Self {
            remote,
            storage,
            session,
            policy: FallbackPolicy,
        }
    }

    fn local_catalog(&self) -> Result<Vec<Sweet>, CatalogError> {
        self.storage.seed_catalog(&demo_sweets())?;
        Ok(self.storage.all_sweets()?)
    }

    fn local_sweet(&self, id: u64) -> Result<Sweet, CatalogError> {
        self.storage.seed_catalog(&demo_sweets())?;
        self.storage.get_sweet(id)?.ok_or(CatalogError::NotFound(id))
    }

    pub async fn list(&self) -> Result<Vec<Sweet>, CatalogError> {
        let remote = self.remote.as_deref().map(|r| r.list_sweets());
        let served = self.policy.run("list sweets", remote, || self.local_catalog()).await?;
        if served.source == Source::Remote {
            self.storage.replace_catalog(&served.value)?;
        }
        Ok(served.value)
    }

    pub async fn search(&self, filter: &SweetFilter) -> Result<Vec<Sweet>, CatalogError> {
        let remote = self.remote.as_deref().map(|r| r.search_sweets(filter));
        let served = self
            .policy
            .run("search sweets", remote, || -> Result<Vec<Sweet>, CatalogError> {
                Ok(filter.apply(&self.local_catalog()?))
            })
            .await?;
        Ok(served.value)
    }

    /// Remote first, else local. A remote hit is written through to the local
    /// catalog so later stock checks and ledger entries see the same record.
    pub async fn get(&self, id: u64) -> Result<Sweet, CatalogError> {
        let remote = self.remote.as_deref().map(|r| r.get_sweet(id));
        let served = self.policy.run("get sweet", remote, || self.local_sweet(id)).await?;
        if served.source == Source::Remote {
            self.storage.put_sweet(&served.value)?;
        }
        Ok(served.value)
    }

    fn require_session(&self) -> Result<Session, CatalogError> {
        self.session
            .current()
            .filter(|s| !s.token.is_empty())
            .ok_or(CatalogError::Unauthenticated)
    }

    fn require_admin(&self) -> Result<Session, CatalogError> {
        let session = self.require_session()?;
        if !self.session.is_admin() {
            return Err(CatalogError::Forbidden);
        }
        Ok(session)
    }

    /// Buy `quantity` units. Stock is checked against the freshest record
    /// (remote, else local) before the purchase is sent.
    pub async fn purchase(&self, id: u64, quantity: u32) -> Result<PurchaseRecord, CatalogError> {
        let session = self.require_session()?;
        if quantity == 0 {
            return Err(CatalogError::InvalidQuantity);
        }
        let sweet = self.get(id).await?;
        if sweet.quantity < quantity {
            return Err(CatalogError::InsufficientStock {
                requested: quantity,
                available: sweet.quantity,
            });
        }

        let remote = self.remote.as_deref().map(|r| r.purchase_sweet(id, quantity));
        self.policy.best_effort("purchase sweet", remote).await;

        self.storage.modify_sweet(id, |s| {
            s.quantity = s.quantity.saturating_sub(quantity);
            true
        })?;
        let record = PurchaseRecord::new(&sweet, quantity, Some(session.user_id), Utc::now());
        self.storage.prepend_purchase(&record)?;
        info!("{} purchased {} x {}", session.username, quantity, sweet.name);
        Ok(record)
    }

    /// Admin: add a sweet. Uses the remote id when the remote accepted it.
    pub async fn add(&self, draft: SweetDraft) -> Result<Sweet, CatalogError> {
        self.require_admin()?;
        let remote = self.remote.as_deref().map(|r| r.create_sweet(&draft));
        let remote_id = self.policy.best_effort("add sweet", remote).await.map(|c| c.id);
        self.local_catalog()?;
        let id = match remote_id {
            Some(id) => id,
            None => self.storage.next_sweet_id()?,
        };
        let sweet = draft.into_sweet(id);
        self.storage.put_sweet(&sweet)?;
        info!("added sweet {} ({})", sweet.id, sweet.name);
        Ok(sweet)
    }

    pub async fn update(&self, id: u64, draft: SweetDraft) -> Result<Sweet, CatalogError> {
        self.require_admin()?;
        self.get(id).await?;
        let remote = self.remote.as_deref().map(|r| r.update_sweet(id, &draft));
        self.policy.best_effort("update sweet", remote).await;
        let sweet = draft.into_sweet(id);
        self.storage.put_sweet(&sweet)?;
        Ok(sweet)
    }

    pub async fn delete(&self, id: u64) -> Result<(), CatalogError> {
        self.require_admin()?;
        self.get(id).await?;
        let remote = self.remote.as_deref().map(|r| r.delete_sweet(id));
        self.policy.best_effort("delete sweet", remote).await;
        self.storage.delete_sweet(id)?;
        info!("deleted sweet {}", id);
        Ok(())
    }

    pub async fn restock(&self, id: u64, quantity: u32) -> Result<Sweet, CatalogError> {
        self.require_admin()?;
        if quantity == 0 {
            return Err(CatalogError::InvalidQuantity);
        }
        self.get(id).await?;
        let remote = self.remote.as_deref().map(|r| r.restock_sweet(id, quantity));
        self.policy.best_effort("restock sweet", remote).await;
        self.storage
            .modify_sweet(id, |s| {
                s.quantity = s.quantity.saturating_add(quantity);
                true
            })?
            .ok_or(CatalogError::NotFound(id))
    }

    pub fn purchases(&self) -> Result<Vec<PurchaseRecord>, CatalogError> {
        Ok(self.storage.purchases()?)
    }

    pub fn purchases_for(&self, user_id: u64) -> Result<Vec<PurchaseRecord>, CatalogError> {
        Ok(self
            .purchases()?
            .into_iter()
            .filter(|p| p.user_id == Some(user_id))
            .collect())
    }

    /// Units bought on `now`'s UTC calendar day
    pub fn purchased_today(&self, now: DateTime<Utc>) -> Result<u32, CatalogError> {
        let today = now.date_naive();
        Ok(self
            .purchases()?
            .iter()
            .filter(|p| p.purchase_date.date_naive() == today)
            .map(|p| p.quantity)
            .sum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ApiError;
    use crate::models::Role;
    use crate::remote::CreatedSweet;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    /// Remote that records calls and fails or succeeds on demand
    #[derive(Default)]
    struct ScriptedRemote {
        up: bool,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedRemote {
        fn result<T>(&self, call: String, value: T) -> Result<T, ApiError> {
            self.calls.lock().push(call);
            if self.up {
                Ok(value)
            } else {
                Err(ApiError::Unavailable)
            }
        }
    }

    #[async_trait]
    impl RemoteCatalog for ScriptedRemote {
        async fn list_sweets(&self) -> Result<Vec<Sweet>, ApiError> {
            self.result("list".into(), vec![demo_sweets()[0].clone()])
        }
        async fn search_sweets(&self, _filter: &SweetFilter) -> Result<Vec<Sweet>, ApiError> {
            self.result("search".into(), vec![])
        }
        async fn get_sweet(&self, id: u64) -> Result<Sweet, ApiError> {
            let sweet = Sweet {
                id,
                name: "Remote Toffee".to_string(),
                category: "Fudge".to_string(),
                price: 9.0,
                quantity: 4,
                description: String::new(),
                image: String::new(),
            };
            self.result(format!("get {}", id), sweet)
        }
        async fn create_sweet(&self, _draft: &SweetDraft) -> Result<CreatedSweet, ApiError> {
            self.result("create".into(), CreatedSweet { id: 500 })
        }
        async fn update_sweet(&self, id: u64, _draft: &SweetDraft) -> Result<serde_json::Value, ApiError> {
            self.result(format!("update {}", id), serde_json::Value::Null)
        }
        async fn delete_sweet(&self, id: u64) -> Result<serde_json::Value, ApiError> {
            self.result(format!("delete {}", id), serde_json::Value::Null)
        }
        async fn purchase_sweet(&self, id: u64, quantity: u32) -> Result<serde_json::Value, ApiError> {
            self.result(format!("purchase {} {}", id, quantity), serde_json::Value::Null)
        }
        async fn restock_sweet(&self, id: u64, quantity: u32) -> Result<serde_json::Value, ApiError> {
            self.result(format!("restock {} {}", id, quantity), serde_json::Value::Null)
        }
    }

    fn service(remote: Option<Arc<ScriptedRemote>>, role: Option<Role>) -> CatalogService {
        let storage = Storage::temporary().unwrap();
        let session = SessionState::new(storage.clone());
        if let Some(role) = role {
            session
                .set(&Session {
                    token: "mock_t".to_string(),
                    role,
                    user_id: 2,
                    username: "user1".to_string(),
                })
                .unwrap();
        }
        let remote = remote.map(|r| r as Arc<dyn RemoteCatalog>);
        CatalogService::new(remote, storage, session)
    }

    fn draft(name: &str) -> SweetDraft {
        SweetDraft {
            name: name.to_string(),
            category: "Fudge".to_string(),
            price: 1.25,
            quantity: 3,
            description: String::new(),
            image: String::new(),
        }
    }

    #[test]
    fn filter_matches_name_description_category_and_price() {
        let sweets = demo_sweets();
        let by_text = SweetFilter { search: Some("CHOCOLATE".into()), ..Default::default() };
        // name or description: truffle, mint cookie, muffin, mousse, bark
        assert_eq!(by_text.apply(&sweets).len(), 5);

        let by_category = SweetFilter { category: Some("Gummy".into()), ..Default::default() };
        let ids: Vec<u64> = by_category.apply(&sweets).iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![2, 9]);

        let all = SweetFilter { category: Some(ALL_CATEGORIES.into()), ..Default::default() };
        assert!(all.is_empty());
        assert_eq!(all.apply(&sweets).len(), 12);

        let by_price = SweetFilter { min_price: Some(3.49), max_price: Some(3.99), ..Default::default() };
        let ids: Vec<u64> = by_price.apply(&sweets).iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![1, 7, 8]);
    }

    #[test]
    fn stock_thresholds() {
        assert_eq!(stock_status(0), StockStatus::OutOfStock);
        assert_eq!(stock_status(4), StockStatus::LowStock);
        assert_eq!(stock_status(5), StockStatus::MediumStock);
        assert_eq!(stock_status(9), StockStatus::MediumStock);
        assert_eq!(stock_status(10).label(), "In Stock");
        assert_eq!(format_currency(3.5), "$3.50");
    }

    #[tokio::test]
    async fn list_falls_back_to_demo_catalog() {
        let remote = Arc::new(ScriptedRemote::default());
        let svc = service(Some(remote.clone()), None);
        assert_eq!(svc.list().await.unwrap().len(), 12);
        assert_eq!(remote.calls.lock().as_slice(), ["list"]);
    }

    #[tokio::test]
    async fn remote_listing_refreshes_local_copy() {
        let remote = Arc::new(ScriptedRemote { up: true, ..Default::default() });
        let svc = service(Some(remote), None);
        assert_eq!(svc.list().await.unwrap().len(), 1);
        assert_eq!(svc.storage.all_sweets().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn purchase_requires_login_and_stock() {
        let anonymous = service(None, None);
        assert!(matches!(anonymous.purchase(1, 1).await, Err(CatalogError::Unauthenticated)));

        let svc = service(None, Some(Role::User));
        assert!(matches!(svc.purchase(1, 0).await, Err(CatalogError::InvalidQuantity)));
        assert!(matches!(
            svc.purchase(5, 1).await,
            Err(CatalogError::InsufficientStock { requested: 1, available: 0 })
        ));
        assert!(matches!(svc.purchase(99, 1).await, Err(CatalogError::NotFound(99))));
        assert!(svc.purchases().unwrap().is_empty());
    }

    #[tokio::test]
    async fn purchase_updates_stock_and_ledger_even_when_remote_fails() {
        let remote = Arc::new(ScriptedRemote::default());
        let svc = service(Some(remote.clone()), Some(Role::User));

        let record = svc.purchase(3, 2).await.unwrap();
        assert_eq!(record.sweet_name, "Vanilla Cupcake");
        assert_eq!(record.total_price, 4.99 * 2.0);
        assert_eq!(record.user_id, Some(2));
        assert_eq!(svc.storage.get_sweet(3).unwrap().unwrap().quantity, 10);
        assert_eq!(remote.calls.lock().as_slice(), ["get 3", "purchase 3 2"]);

        svc.purchase(1, 1).await.unwrap();
        assert_eq!(svc.purchases_for(2).unwrap().len(), 2);
        assert!(svc.purchases_for(3).unwrap().is_empty());
        assert_eq!(svc.purchased_today(Utc::now()).unwrap(), 3);
        assert_eq!(svc.purchases().unwrap()[0].sweet_id, 1);
    }

    #[tokio::test]
    async fn purchase_uses_remote_record_when_remote_is_up() {
        let remote = Arc::new(ScriptedRemote { up: true, ..Default::default() });
        let svc = service(Some(remote.clone()), Some(Role::User));

        let record = svc.purchase(40, 3).await.unwrap();
        assert_eq!(record.sweet_name, "Remote Toffee");
        assert_eq!(record.total_price, 27.0);
        assert_eq!(svc.storage.get_sweet(40).unwrap().unwrap().quantity, 1);
        assert!(matches!(
            svc.purchase(40, 5).await,
            Err(CatalogError::InsufficientStock { requested: 5, available: 4 })
        ));
        assert_eq!(remote.calls.lock().as_slice(), ["get 40", "purchase 40 3", "get 40"]);
    }

    #[tokio::test]
    async fn admin_operations_are_gated() {
        let svc = service(None, Some(Role::User));
        assert!(matches!(svc.add(draft("x")).await, Err(CatalogError::Forbidden)));
        assert!(matches!(svc.restock(1, 5).await, Err(CatalogError::Forbidden)));
        assert!(matches!(svc.delete(1).await, Err(CatalogError::Forbidden)));

        let anonymous = service(None, None);
        assert!(matches!(anonymous.update(1, draft("x")).await, Err(CatalogError::Unauthenticated)));
    }

    #[tokio::test]
    async fn admin_crud_applies_locally() {
        let svc = service(None, Some(Role::Admin));

        let added = svc.add(draft("Maple Fudge")).await.unwrap();
        assert_eq!(added.id, 13);

        let updated = svc.update(13, draft("Maple Walnut Fudge")).await.unwrap();
        assert_eq!(svc.get(13).await.unwrap().name, updated.name);

        assert_eq!(svc.restock(13, 7).await.unwrap().quantity, 10);
        assert!(matches!(svc.restock(13, 0).await, Err(CatalogError::InvalidQuantity)));

        svc.delete(13).await.unwrap();
        assert!(matches!(svc.get(13).await, Err(CatalogError::NotFound(13))));
        assert!(matches!(svc.delete(13).await, Err(CatalogError::NotFound(13))));
    }

    #[tokio::test]
    async fn add_uses_remote_id_when_accepted() {
        let remote = Arc::new(ScriptedRemote { up: true, ..Default::default() });
        let svc = service(Some(remote), Some(Role::Admin));
        assert_eq!(svc.add(draft("Remote Fudge")).await.unwrap().id, 500);
    }

    #[tokio::test]
    async fn search_falls_back_to_local_filter() {
        let svc = service(Some(Arc::new(ScriptedRemote::default())), None);
        let filter = SweetFilter { search: Some("fudge".into()), ..Default::default() };
        let found = svc.search(&filter).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, 6);
    }
}

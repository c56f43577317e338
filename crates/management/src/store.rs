//! In-memory document store backed by DashMap, one collection per entity.
//!
//! Production: replace with the hosted document database. This provides the
//! same collection-level surface for development and testing.

use crate::models::*;
use chrono::{DateTime, Datelike, Duration, Utc};
use dashmap::DashMap;
use lci_core::types::*;
use lci_core::{LciError, LciResult};
use rand::Rng;
use tracing::info;
use uuid::Uuid;

/// Thread-safe in-memory store for posts, influencers, products, partners, users and audit log.
pub struct ManagementStore {
    posts: DashMap<Uuid, CampaignRecord>,
    influencers: DashMap<Uuid, Influencer>,
    products: DashMap<Uuid, Product>,
    partners: DashMap<Uuid, Partner>,
    users: DashMap<Uuid, User>,
    audit_log: DashMap<Uuid, AuditLogEntry>,
}

fn non_negative(field: &str, value: f64) -> LciResult<()> {
    if value < 0.0 || value.is_nan() {
        return Err(LciError::Validation(format!("'{field}' must be non-negative")));
    }
    Ok(())
}

fn non_empty(field: &str, value: &str) -> LciResult<()> {
    if value.trim().is_empty() {
        return Err(LciError::Validation(format!("'{field}' must not be empty")));
    }
    Ok(())
}

/// Post dates are charted per day from the earliest post, so keep them on
/// the calendar the dashboard accepts.
fn supported_date(field: &str, value: DateTime<Utc>) -> LciResult<()> {
    if !(1970..=9999).contains(&value.year()) {
        return Err(LciError::Validation(format!("'{field}' must fall between 1970 and 9999")));
    }
    Ok(())
}

fn newest_first<T: Clone>(map: &DashMap<Uuid, T>, created_at: impl Fn(&T) -> DateTime<Utc>) -> Vec<T> {
    let mut items: Vec<T> = map.iter().map(|r| r.value().clone()).collect();
    items.sort_by_key(|item| std::cmp::Reverse(created_at(item)));
    items
}

impl ManagementStore {
    pub fn new() -> Self {
        info!("Management store initialized (in-memory)");
        Self {
            posts: DashMap::new(),
            influencers: DashMap::new(),
            products: DashMap::new(),
            partners: DashMap::new(),
            users: DashMap::new(),
            audit_log: DashMap::new(),
        }
    }

    /// Store pre-populated with demo influencers, products, partners and posts.
    pub fn with_demo_data() -> Self {
        let store = Self::new();
        store.seed_demo_data(Utc::now());
        store
    }

    // ─── Influencers ───────────────────────────────────────────────────────

    pub fn list_influencers(&self) -> Vec<Influencer> {
        newest_first(&self.influencers, |i| i.created_at)
    }

    pub fn get_influencer(&self, id: Uuid) -> Option<Influencer> {
        self.influencers.get(&id).map(|r| r.value().clone())
    }

    pub fn create_influencer(&self, req: CreateInfluencerRequest, user: &str) -> LciResult<Influencer> {
        non_empty("name", &req.name)?;
        let influencer = Influencer {
            id: Uuid::new_v4(),
            name: req.name,
            handle: req.handle,
            platform: req.platform,
            followers: req.followers,
            created_at: Utc::now(),
        };
        self.influencers.insert(influencer.id, influencer.clone());
        self.log_audit(user, AuditAction::Create, "influencer", influencer.id, serde_json::json!({"name": &influencer.name}));
        Ok(influencer)
    }

    pub fn update_influencer(&self, id: Uuid, req: UpdateInfluencerRequest, user: &str) -> LciResult<Influencer> {
        if let Some(name) = &req.name {
            non_empty("name", name)?;
        }
        let updated = self
            .influencers
            .get_mut(&id)
            .map(|mut entry| {
                let i = entry.value_mut();
                if let Some(name) = req.name { i.name = name; }
                if let Some(handle) = req.handle { i.handle = handle; }
                if let Some(platform) = req.platform { i.platform = platform; }
                if let Some(followers) = req.followers { i.followers = followers; }
                i.clone()
            })
            .ok_or_else(|| LciError::NotFound(format!("influencer {id}")))?;
        self.log_audit(user, AuditAction::Update, "influencer", id, serde_json::json!({}));
        Ok(updated)
    }

    /// Posts keep their (now dangling) reference.
    pub fn delete_influencer(&self, id: Uuid, user: &str) -> bool {
        let removed = self.influencers.remove(&id).is_some();
        if removed {
            self.log_audit(user, AuditAction::Delete, "influencer", id, serde_json::json!({}));
        }
        removed
    }

    // ─── Products ──────────────────────────────────────────────────────────

    pub fn list_products(&self) -> Vec<Product> {
        newest_first(&self.products, |p| p.created_at)
    }

    pub fn get_product(&self, id: Uuid) -> Option<Product> {
        self.products.get(&id).map(|r| r.value().clone())
    }

    pub fn create_product(&self, req: CreateProductRequest, user: &str) -> LciResult<Product> {
        non_empty("name", &req.name)?;
        non_negative("price", req.price)?;
        let product = Product {
            id: Uuid::new_v4(),
            name: req.name,
            price: req.price,
            created_at: Utc::now(),
        };
        self.products.insert(product.id, product.clone());
        self.log_audit(user, AuditAction::Create, "product", product.id, serde_json::json!({"name": &product.name}));
        Ok(product)
    }

    pub fn update_product(&self, id: Uuid, req: UpdateProductRequest, user: &str) -> LciResult<Product> {
        if let Some(name) = &req.name {
            non_empty("name", name)?;
        }
        if let Some(price) = req.price {
            non_negative("price", price)?;
        }
        let updated = self
            .products
            .get_mut(&id)
            .map(|mut entry| {
                let p = entry.value_mut();
                if let Some(name) = req.name { p.name = name; }
                if let Some(price) = req.price { p.price = price; }
                p.clone()
            })
            .ok_or_else(|| LciError::NotFound(format!("product {id}")))?;
        self.log_audit(user, AuditAction::Update, "product", id, serde_json::json!({}));
        Ok(updated)
    }

    pub fn delete_product(&self, id: Uuid, user: &str) -> bool {
        let removed = self.products.remove(&id).is_some();
        if removed {
            self.log_audit(user, AuditAction::Delete, "product", id, serde_json::json!({}));
        }
        removed
    }

    // ─── Partners ──────────────────────────────────────────────────────────

    pub fn list_partners(&self) -> Vec<Partner> {
        newest_first(&self.partners, |p| p.created_at)
    }

    pub fn get_partner(&self, id: Uuid) -> Option<Partner> {
        self.partners.get(&id).map(|r| r.value().clone())
    }

    pub fn create_partner(&self, req: CreatePartnerRequest, user: &str) -> LciResult<Partner> {
        non_empty("name", &req.name)?;
        if let Some(c) = req.default_commission {
            non_negative("default_commission.value", c.value)?;
        }
        let partner = Partner {
            id: Uuid::new_v4(),
            name: req.name,
            contact_email: req.contact_email,
            default_commission: req.default_commission,
            created_at: Utc::now(),
        };
        self.partners.insert(partner.id, partner.clone());
        self.log_audit(user, AuditAction::Create, "partner", partner.id, serde_json::json!({"name": &partner.name}));
        Ok(partner)
    }

    pub fn update_partner(&self, id: Uuid, req: UpdatePartnerRequest, user: &str) -> LciResult<Partner> {
        if let Some(name) = &req.name {
            non_empty("name", name)?;
        }
        if let Some(c) = req.default_commission {
            non_negative("default_commission.value", c.value)?;
        }
        let updated = self
            .partners
            .get_mut(&id)
            .map(|mut entry| {
                let p = entry.value_mut();
                if let Some(name) = req.name { p.name = name; }
                if let Some(email) = req.contact_email { p.contact_email = Some(email); }
                if let Some(c) = req.default_commission { p.default_commission = Some(c); }
                p.clone()
            })
            .ok_or_else(|| LciError::NotFound(format!("partner {id}")))?;
        self.log_audit(user, AuditAction::Update, "partner", id, serde_json::json!({}));
        Ok(updated)
    }

    pub fn delete_partner(&self, id: Uuid, user: &str) -> bool {
        let removed = self.partners.remove(&id).is_some();
        if removed {
            self.log_audit(user, AuditAction::Delete, "partner", id, serde_json::json!({}));
        }
        removed
    }

    // ─── Posts ─────────────────────────────────────────────────────────────

    pub fn list_posts(&self) -> Vec<CampaignRecord> {
        newest_first(&self.posts, |p| p.created_at)
    }

    pub fn get_post(&self, id: Uuid) -> Option<CampaignRecord> {
        self.posts.get(&id).map(|r| r.value().clone())
    }

    fn check_references(&self, influencer_id: Uuid, product_id: Uuid, partner_id: Option<Uuid>) -> LciResult<()> {
        if !self.influencers.contains_key(&influencer_id) {
            return Err(LciError::Validation(format!("unknown influencer {influencer_id}")));
        }
        if !self.products.contains_key(&product_id) {
            return Err(LciError::Validation(format!("unknown product {product_id}")));
        }
        if let Some(partner_id) = partner_id {
            if !self.partners.contains_key(&partner_id) {
                return Err(LciError::Validation(format!("unknown partner {partner_id}")));
            }
        }
        Ok(())
    }

    pub fn create_post(&self, req: CreatePostRequest, user: &str) -> LciResult<CampaignRecord> {
        non_empty("title", &req.title)?;
        non_negative("investment", req.investment)?;
        non_negative("revenue", req.revenue)?;
        supported_date("post_date", req.post_date)?;
        self.check_references(req.influencer_id, req.product_id, req.partner_id)?;

        let commission = req.commission.or_else(|| {
            req.partner_id
                .and_then(|id| self.partners.get(&id).and_then(|p| p.default_commission))
        });
        let post = CampaignRecord {
            id: Uuid::new_v4(),
            title: req.title,
            influencer_id: req.influencer_id,
            product_id: req.product_id,
            partner_id: req.partner_id,
            post_date: req.post_date,
            investment: req.investment,
            revenue: req.revenue,
            views: req.views,
            clicks: req.clicks,
            page_visits: req.page_visits,
            sales: req.sales,
            commission,
            created_at: Utc::now(),
        };
        self.posts.insert(post.id, post.clone());
        self.log_audit(user, AuditAction::Create, "post", post.id, serde_json::json!({"title": &post.title}));
        Ok(post)
    }

    /// Validates a patched copy under the entry guard, so a concurrent
    /// delete or update cannot be overwritten.
    pub fn update_post(&self, id: Uuid, req: UpdatePostRequest, user: &str) -> LciResult<CampaignRecord> {
        let mut entry = self
            .posts
            .get_mut(&id)
            .ok_or_else(|| LciError::NotFound(format!("post {id}")))?;
        let mut post = entry.value().clone();
        if let Some(title) = req.title { post.title = title; }
        if let Some(influencer_id) = req.influencer_id { post.influencer_id = influencer_id; }
        if let Some(product_id) = req.product_id { post.product_id = product_id; }
        if let Some(partner_id) = req.partner_id { post.partner_id = Some(partner_id); }
        if let Some(post_date) = req.post_date { post.post_date = post_date; }
        if let Some(investment) = req.investment { post.investment = investment; }
        if let Some(revenue) = req.revenue { post.revenue = revenue; }
        if let Some(views) = req.views { post.views = views; }
        if let Some(clicks) = req.clicks { post.clicks = clicks; }
        if let Some(page_visits) = req.page_visits { post.page_visits = page_visits; }
        if let Some(sales) = req.sales { post.sales = sales; }
        if let Some(commission) = req.commission { post.commission = Some(commission); }

        non_empty("title", &post.title)?;
        non_negative("investment", post.investment)?;
        non_negative("revenue", post.revenue)?;
        supported_date("post_date", post.post_date)?;
        self.check_references(post.influencer_id, post.product_id, post.partner_id)?;

        *entry.value_mut() = post.clone();
        drop(entry);
        self.log_audit(user, AuditAction::Update, "post", id, serde_json::json!({}));
        Ok(post)
    }

    pub fn delete_post(&self, id: Uuid, user: &str) -> bool {
        let removed = self.posts.remove(&id).is_some();
        if removed {
            self.log_audit(user, AuditAction::Delete, "post", id, serde_json::json!({}));
        }
        removed
    }

    // ─── Users ─────────────────────────────────────────────────────────────

    pub fn list_users(&self) -> Vec<User> {
        newest_first(&self.users, |u| u.created_at)
    }

    pub fn get_user(&self, id: Uuid) -> Option<User> {
        self.users.get(&id).map(|r| r.value().clone())
    }

    pub fn find_user_by_email(&self, email: &str) -> Option<User> {
        let wanted = email.trim();
        self.users
            .iter()
            .find(|r| r.value().email.eq_ignore_ascii_case(wanted))
            .map(|r| r.value().clone())
    }

    pub fn create_user(&self, req: CreateUserRequest, user: &str) -> LciResult<User> {
        non_empty("name", &req.name)?;
        let email = req.email.trim().to_string();
        if !email.contains('@') {
            return Err(LciError::Validation("'email' is not a valid address".into()));
        }
        if self.find_user_by_email(&email).is_some() {
            return Err(LciError::Validation(format!("user with email {email} already exists")));
        }
        let created = User {
            id: Uuid::new_v4(),
            name: req.name,
            email,
            role: req.role,
            paid_at: None,
            subscription_expires_at: None,
            created_at: Utc::now(),
        };
        self.users.insert(created.id, created.clone());
        self.log_audit(user, AuditAction::Create, "user", created.id, serde_json::json!({"email": &created.email}));
        Ok(created)
    }

    pub fn update_user(&self, id: Uuid, req: UpdateUserRequest, user: &str) -> LciResult<User> {
        if let Some(name) = &req.name {
            non_empty("name", name)?;
        }
        let updated = self
            .users
            .get_mut(&id)
            .map(|mut entry| {
                let u = entry.value_mut();
                if let Some(name) = req.name { u.name = name; }
                if let Some(role) = req.role { u.role = role; }
                u.clone()
            })
            .ok_or_else(|| LciError::NotFound(format!("user {id}")))?;
        self.log_audit(user, AuditAction::Update, "user", id, serde_json::json!({}));
        Ok(updated)
    }

    pub fn delete_user(&self, id: Uuid, user: &str) -> bool {
        let removed = self.users.remove(&id).is_some();
        if removed {
            self.log_audit(user, AuditAction::Delete, "user", id, serde_json::json!({}));
        }
        removed
    }

    /// Write the payment fields consumed by the subscription-expiry logic.
    pub fn record_payment(
        &self,
        id: Uuid,
        paid_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> LciResult<User> {
        let updated = self
            .users
            .get_mut(&id)
            .map(|mut entry| {
                let u = entry.value_mut();
                u.paid_at = Some(paid_at);
                u.subscription_expires_at = Some(expires_at);
                u.clone()
            })
            .ok_or_else(|| LciError::NotFound(format!("user {id}")))?;
        self.log_audit(
            "payment-webhook",
            AuditAction::Update,
            "user",
            id,
            serde_json::json!({"paid_at": paid_at, "subscription_expires_at": expires_at}),
        );
        Ok(updated)
    }

    // ─── Audit Log ─────────────────────────────────────────────────────────

    pub fn get_audit_log(&self) -> Vec<AuditLogEntry> {
        let mut entries: Vec<AuditLogEntry> = self.audit_log.iter().map(|r| r.value().clone()).collect();
        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        entries
    }

    pub fn log_audit(&self, user: &str, action: AuditAction, resource_type: &str, resource_id: Uuid, details: serde_json::Value) {
        let entry = AuditLogEntry {
            id: Uuid::new_v4(),
            user: user.to_string(),
            action,
            resource_type: resource_type.to_string(),
            resource_id: resource_id.to_string(),
            details,
            timestamp: Utc::now(),
        };
        self.audit_log.insert(entry.id, entry);
    }

    // ─── Demo Data ─────────────────────────────────────────────────────────

    fn seed_demo_data(&self, now: DateTime<Utc>) {
        let created_at = now - Duration::days(120);
        let influencers: Vec<Influencer> = [
            ("Ana Ribeiro", "@anaribeiro", "instagram", 182_000),
            ("Lucas Prado", "@lucasprado", "youtube", 96_500),
            ("Marina Costa", "@marinacosta", "tiktok", 410_000),
        ]
        .into_iter()
        .map(|(name, handle, platform, followers)| Influencer {
            id: Uuid::new_v4(),
            name: name.into(),
            handle: handle.into(),
            platform: platform.into(),
            followers,
            created_at,
        })
        .collect();

        let products: Vec<Product> = [("Vitamin C Serum", 129.9), ("Protein Bar Box", 89.0), ("Running Shoes", 499.0)]
            .into_iter()
            .map(|(name, price)| Product {
                id: Uuid::new_v4(),
                name: name.into(),
                price,
                created_at,
            })
            .collect();

        let partner = Partner {
            id: Uuid::new_v4(),
            name: "Growth Agency".into(),
            contact_email: Some("finance@growth.example".into()),
            default_commission: Some(Commission {
                kind: CommissionKind::Percentage,
                value: 10.0,
            }),
            created_at,
        };

        let mut rng = rand::thread_rng();
        let mut posts = Vec::new();
        for day in (0..90).step_by(3) {
            let influencer = &influencers[day % influencers.len()];
            let product = &products[(day / 3) % products.len()];
            let with_partner = day % 2 == 0;
            let views: u64 = rng.gen_range(5_000..60_000);
            let clicks = views * rng.gen_range(2..8) / 100;
            let page_visits = clicks * rng.gen_range(50..90) / 100;
            let sales = page_visits * rng.gen_range(5..20) / 100;
            let post_date = now - Duration::days(day as i64);
            posts.push(CampaignRecord {
                id: Uuid::new_v4(),
                title: format!("{} × {}", influencer.name, product.name),
                influencer_id: influencer.id,
                product_id: product.id,
                partner_id: with_partner.then_some(partner.id),
                post_date,
                investment: f64::from(rng.gen_range(300u32..2_500)),
                revenue: sales as f64 * product.price,
                views,
                clicks,
                page_visits,
                sales,
                commission: with_partner.then_some(partner.default_commission).flatten(),
                created_at: post_date,
            });
        }

        let admin = User {
            id: Uuid::new_v4(),
            name: "Administrator".into(),
            email: "admin@lci.local".into(),
            role: UserRole::Admin,
            paid_at: Some(now),
            subscription_expires_at: Some(now + Duration::days(30)),
            created_at,
        };

        for i in influencers {
            self.influencers.insert(i.id, i);
        }
        for p in products {
            self.products.insert(p.id, p);
        }
        self.partners.insert(partner.id, partner);
        let post_count = posts.len();
        for p in posts {
            self.posts.insert(p.id, p);
        }
        self.users.insert(admin.id, admin);
        info!(posts = post_count, "Seeded demo data");
    }
}

impl Default for ManagementStore {
    fn default() -> Self {
        Self::new()
    }
}

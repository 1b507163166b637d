//! In-memory doubles for the storage traits and the identity provider, so
//! the router can be driven without Postgres or Google.

use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;

use crate::app::AppState;
use crate::auth::oauth::{Identity, IdentityProvider, OAuthError};
use crate::config::{AppConfig, Environment};
use crate::database::{DatabaseError, LinkedRecipe, Recipe, RecipeStore, User, UserStore};
use crate::filter::{tokenize, ItemFilter};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn page<T>(items: Vec<T>, filter: &ItemFilter) -> Vec<T> {
    if filter.count == 0 {
        return items;
    }
    let count = filter.count as usize;
    items
        .into_iter()
        .skip(count * filter.skip as usize)
        .take(count)
        .collect()
}

fn matches_all(terms: &[String], fields: &[&str]) -> bool {
    terms.iter().all(|term| {
        let term = term.to_lowercase();
        fields.iter().any(|f| f.to_lowercase().contains(&term))
    })
}

#[derive(Default)]
pub struct MemoryRecipeStore {
    recipes: Mutex<Vec<Recipe>>,
    last_id: AtomicI32,
}

impl MemoryRecipeStore {
    pub fn insert(&self, title: &str, author_id: i32) -> Recipe {
        let mut recipes = lock(&self.recipes);
        let recipe = Recipe {
            id: self.last_id.fetch_add(1, Ordering::SeqCst) + 1,
            title: title.to_string(),
            author_id,
            ..Default::default()
        };
        recipes.push(recipe.clone());
        recipe
    }

    pub fn snapshot(&self, id: i32) -> Option<Recipe> {
        lock(&self.recipes).iter().find(|r| r.id == id).cloned()
    }
}

#[async_trait]
impl RecipeStore for MemoryRecipeStore {
    async fn list(&self, filter: &ItemFilter) -> Result<Vec<Recipe>, DatabaseError> {
        let terms = tokenize(&filter.query);
        let mut found: Vec<Recipe> = lock(&self.recipes)
            .iter()
            .filter(|r| {
                let tags = r.tags.join(" ");
                matches_all(&terms, &[r.title.as_str(), tags.as_str()])
            })
            .cloned()
            .collect();
        found.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(page(found, filter))
    }

    async fn get(&self, id: i32) -> Result<Recipe, DatabaseError> {
        self.snapshot(id)
            .ok_or_else(|| DatabaseError::NotFound(format!("recipe {}", id)))
    }

    async fn create(&self, recipe: &Recipe) -> Result<Recipe, DatabaseError> {
        let mut created = self.insert(&recipe.title, recipe.author_id);
        created.summary = recipe.summary.clone();
        let mut recipes = lock(&self.recipes);
        if let Some(stored) = recipes.iter_mut().find(|r| r.id == created.id) {
            *stored = created.clone();
        }
        Ok(created)
    }

    async fn save(&self, recipe: &Recipe, user_id: i32, force: bool) -> Result<Recipe, DatabaseError> {
        let mut recipes = lock(&self.recipes);
        let stored = recipes
            .iter_mut()
            .find(|r| r.id == recipe.id)
            .ok_or_else(|| DatabaseError::NotFound(format!("recipe {}", recipe.id)))?;
        if !force && stored.author_id != user_id {
            return Err(DatabaseError::NoRowsAffected);
        }
        let revision = stored.revision + 1;
        let author_id = stored.author_id;
        *stored = Recipe {
            revision,
            author_id,
            tags: recipe.distinct_tags().into_iter().map(String::from).collect(),
            ..recipe.clone()
        };
        Ok(stored.clone())
    }

    async fn delete(&self, id: i32, user_id: i32, force: bool) -> Result<(), DatabaseError> {
        let mut recipes = lock(&self.recipes);
        let index = recipes
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| DatabaseError::NotFound(format!("recipe {}", id)))?;
        if !force && recipes[index].author_id != user_id {
            return Err(DatabaseError::NoRowsAffected);
        }
        recipes.remove(index);
        Ok(())
    }

    async fn tags(&self) -> Result<Vec<String>, DatabaseError> {
        let mut tags: Vec<String> = lock(&self.recipes)
            .iter()
            .flat_map(|r| r.tags.iter().cloned())
            .collect();
        tags.sort();
        tags.dedup();
        Ok(tags)
    }

    async fn titles(&self) -> Result<Vec<LinkedRecipe>, DatabaseError> {
        let mut titles: Vec<LinkedRecipe> = lock(&self.recipes)
            .iter()
            .map(|r| LinkedRecipe {
                id: r.id,
                title: r.title.clone(),
            })
            .collect();
        titles.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(titles)
    }

    async fn ping(&self) -> Result<(), DatabaseError> {
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryUserStore {
    users: Mutex<Vec<(User, Option<String>)>>,
    last_id: AtomicI32,
}

impl MemoryUserStore {
    pub fn insert(&self, email: &str, role: &str, token: Option<&str>) -> User {
        let mut users = lock(&self.users);
        let user = User {
            id: self.last_id.fetch_add(1, Ordering::SeqCst) + 1,
            email: email.to_string(),
            role: role.to_string(),
            creation_date: Utc::now(),
            ..Default::default()
        };
        users.push((user.clone(), token.map(String::from)));
        user
    }

    pub fn token_of(&self, id: i32) -> Option<String> {
        lock(&self.users)
            .iter()
            .find(|(u, _)| u.id == id)
            .and_then(|(_, t)| t.clone())
    }

    pub fn count(&self) -> usize {
        lock(&self.users).len()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn list(&self, filter: &ItemFilter) -> Result<Vec<User>, DatabaseError> {
        let terms = tokenize(&filter.query);
        let found: Vec<User> = lock(&self.users)
            .iter()
            .map(|(u, _)| u)
            .filter(|u| matches_all(&terms, &[u.name.as_deref().unwrap_or(""), u.email.as_str(), u.role.as_str()]))
            .cloned()
            .collect();
        Ok(page(found, filter))
    }

    async fn get(&self, id: i32) -> Result<User, DatabaseError> {
        lock(&self.users)
            .iter()
            .find(|(u, _)| u.id == id)
            .map(|(u, _)| u.clone())
            .ok_or_else(|| DatabaseError::NotFound(format!("user {}", id)))
    }

    async fn create(&self, user: &User) -> Result<User, DatabaseError> {
        Ok(self.insert(&user.email, &user.role, None))
    }

    async fn update(&self, id: i32, user: &User) -> Result<User, DatabaseError> {
        let mut users = lock(&self.users);
        let (stored, _) = users
            .iter_mut()
            .find(|(u, _)| u.id == id)
            .ok_or_else(|| DatabaseError::NotFound(format!("user {}", id)))?;
        stored.email = user.email.clone();
        stored.role = user.role.clone();
        Ok(stored.clone())
    }

    async fn delete(&self, id: i32) -> Result<(), DatabaseError> {
        let mut users = lock(&self.users);
        let before = users.len();
        users.retain(|(u, _)| u.id != id);
        if users.len() == before {
            return Err(DatabaseError::NotFound(format!("user {}", id)));
        }
        Ok(())
    }

    async fn get_by_token(&self, token: &str) -> Result<User, DatabaseError> {
        lock(&self.users)
            .iter()
            .find(|(_, t)| t.as_deref() == Some(token))
            .map(|(u, _)| u.clone())
            .ok_or_else(|| DatabaseError::NotFound("session token".to_string()))
    }

    async fn record_login(&self, email: &str, name: &str, token: &str) -> Result<User, DatabaseError> {
        let mut users = lock(&self.users);
        let (user, stored_token) = users
            .iter_mut()
            .find(|(u, _)| u.email == email)
            .ok_or_else(|| DatabaseError::NotFound(format!("user with email {}", email)))?;
        user.name = Some(name.to_string());
        user.lastlog = Some(Utc::now());
        *stored_token = Some(token.to_string());
        Ok(user.clone())
    }

    async fn logout(&self, token: &str) -> Result<(), DatabaseError> {
        for (user, stored) in lock(&self.users).iter_mut() {
            if stored.as_deref() == Some(token) {
                *stored = None;
                user.lastlog = Some(Utc::now());
            }
        }
        Ok(())
    }
}

/// Identity provider that vouches for a fixed identity and counts exchanges.
pub struct FakeIdentity {
    pub identity: Identity,
    exchanges: Mutex<u32>,
}

impl FakeIdentity {
    pub fn new(email: &str, name: &str) -> Self {
        Self {
            identity: Identity {
                email: email.to_string(),
                name: name.to_string(),
            },
            exchanges: Mutex::new(0),
        }
    }

    pub fn exchanges(&self) -> u32 {
        *lock(&self.exchanges)
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentity {
    fn authorize_url(&self, state: &str) -> String {
        format!("https://idp.example/auth?state={}", state)
    }

    async fn exchange(&self, code: &str) -> Result<Identity, OAuthError> {
        *lock(&self.exchanges) += 1;
        if code == "bad-code" {
            return Err(OAuthError::TokenRejected {
                status: 400,
                body: "invalid_grant".to_string(),
            });
        }
        Ok(self.identity.clone())
    }
}

/// Handles to the doubles behind a test `AppState`.
pub struct TestContext {
    pub recipes: Arc<MemoryRecipeStore>,
    pub users: Arc<MemoryUserStore>,
    pub identity: Arc<FakeIdentity>,
    pub state: AppState,
}

impl TestContext {
    pub fn new() -> Self {
        let recipes = Arc::new(MemoryRecipeStore::default());
        let users = Arc::new(MemoryUserStore::default());
        let identity = Arc::new(FakeIdentity::new("cook@example.com", ""));
        let state = AppState {
            recipes: recipes.clone(),
            users: users.clone(),
            identity: identity.clone(),
            config: Arc::new(AppConfig::for_environment(Environment::Development)),
        };
        Self {
            recipes,
            users,
            identity,
            state,
        }
    }

    /// Insert a user holding session token `token`.
    pub fn signed_in(&self, email: &str, role: &str, token: &str) -> User {
        self.users.insert(email, role, Some(token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ids_are_not_reused_after_delete() {
        let recipes = MemoryRecipeStore::default();
        let first = recipes.insert("Bean Soup", 1);
        let second = recipes.insert("Pea Soup", 1);
        recipes.delete(first.id, 1, false).await.unwrap();
        let third = recipes.insert("Apple Pie", 1);
        assert_ne!(third.id, second.id);
        assert_eq!(recipes.get(second.id).await.unwrap().title, "Pea Soup");

        let users = MemoryUserStore::default();
        let alice = users.insert("alice@example.com", "User", None);
        let bob = users.insert("bob@example.com", "User", None);
        users.delete(alice.id).await.unwrap();
        let carol = users.insert("carol@example.com", "User", None);
        assert_ne!(carol.id, bob.id);
    }
}

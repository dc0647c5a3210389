//! In-memory implementations of the persistence ports.
//!
//! `MemoryStore` backs the server when no database is configured and gives
//! handler tests a fully functional store without I/O. One struct implements
//! every port so the assigned-only filter can see the recipe associations
//! created through the recipe port.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use crate::domain::attribute::{Attribute, AttributeId, AttributeKind, AttributeName};
use crate::domain::recipe::{Recipe, RecipeDraft, RecipeFilter, RecipeId, RecipePatch};
use crate::domain::user::{EmailAddress, User, UserId};

use super::access_token_repository::{AccessTokenRepository, TokenPersistenceError};
use super::attribute_repository::{
    AttributeListing, AttributePersistenceError, AttributeRepository,
};
use super::image_store::{ImageStore, ImageStoreError};
use super::recipe_repository::{RecipePersistenceError, RecipeRepository};
use super::user_repository::{ProfileChanges, UserPersistenceError, UserRepository};

#[derive(Debug, Clone)]
struct AttributeRow {
    id: AttributeId,
    owner: UserId,
    name: String,
}

#[derive(Debug, Clone)]
struct RecipeRow {
    id: RecipeId,
    owner: UserId,
    title: String,
    time_minutes: i32,
    price: rust_decimal::Decimal,
    link: Option<String>,
    image_path: Option<String>,
    tag_ids: Vec<AttributeId>,
    ingredient_ids: Vec<AttributeId>,
}

impl RecipeRow {
    fn to_recipe(&self) -> Recipe {
        Recipe {
            id: self.id,
            title: self.title.clone(),
            time_minutes: self.time_minutes,
            price: self.price,
            link: self.link.clone(),
            image_path: self.image_path.clone(),
            tag_ids: self.tag_ids.clone(),
            ingredient_ids: self.ingredient_ids.clone(),
        }
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    users: Vec<User>,
    tokens: HashMap<String, UserId>,
    tags: Vec<AttributeRow>,
    ingredients: Vec<AttributeRow>,
    recipes: Vec<RecipeRow>,
    saved_images: Vec<String>,
    next_attribute_id: AttributeId,
    next_recipe_id: RecipeId,
}

impl MemoryState {
    fn attributes(&self, kind: AttributeKind) -> &Vec<AttributeRow> {
        match kind {
            AttributeKind::Tag => &self.tags,
            AttributeKind::Ingredient => &self.ingredients,
        }
    }

    fn attributes_mut(&mut self, kind: AttributeKind) -> &mut Vec<AttributeRow> {
        match kind {
            AttributeKind::Tag => &mut self.tags,
            AttributeKind::Ingredient => &mut self.ingredients,
        }
    }

    fn assigned_ids(&self, kind: AttributeKind) -> Vec<AttributeId> {
        self.recipes
            .iter()
            .flat_map(|recipe| match kind {
                AttributeKind::Tag => recipe.tag_ids.iter().copied(),
                AttributeKind::Ingredient => recipe.ingredient_ids.iter().copied(),
            })
            .collect()
    }

    fn attribute_exists(&self, kind: AttributeKind, id: AttributeId) -> bool {
        self.attributes(kind).iter().any(|row| row.id == id)
    }

    fn check_associations(
        &self,
        tag_ids: &[AttributeId],
        ingredient_ids: &[AttributeId],
    ) -> Result<(), RecipePersistenceError> {
        for id in tag_ids {
            if !self.attribute_exists(AttributeKind::Tag, *id) {
                return Err(RecipePersistenceError::unknown_attribute(format!(
                    "tag {id}"
                )));
            }
        }
        for id in ingredient_ids {
            if !self.attribute_exists(AttributeKind::Ingredient, *id) {
                return Err(RecipePersistenceError::unknown_attribute(format!(
                    "ingredient {id}"
                )));
            }
        }
        Ok(())
    }
}

fn normalized_ids(ids: &[AttributeId]) -> Vec<AttributeId> {
    let mut ids = ids.to_vec();
    ids.sort_unstable();
    ids.dedup();
    ids
}

fn intersects(stored: &[AttributeId], requested: &[AttributeId]) -> bool {
    stored.iter().any(|id| requested.contains(id))
}

/// Shared in-memory store implementing every persistence port.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        // A poisoned lock means a panic mid-mutation; tests surface it.
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Paths written through the [`ImageStore`] port, oldest first.
    #[must_use]
    pub fn saved_image_paths(&self) -> Vec<String> {
        self.lock().saved_images.clone()
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn insert(&self, user: &User) -> Result<(), UserPersistenceError> {
        let mut state = self.lock();
        if state
            .users
            .iter()
            .any(|existing| existing.email() == user.email())
        {
            return Err(UserPersistenceError::email_taken(user.email().to_string()));
        }
        state.users.push(user.clone());
        Ok(())
    }

    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<User>, UserPersistenceError> {
        Ok(self
            .lock()
            .users
            .iter()
            .find(|user| user.email() == email)
            .cloned())
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError> {
        Ok(self.lock().users.iter().find(|user| user.id() == id).cloned())
    }

    async fn update_profile(
        &self,
        id: &UserId,
        changes: ProfileChanges,
    ) -> Result<Option<User>, UserPersistenceError> {
        let mut state = self.lock();
        let Some(user) = state.users.iter_mut().find(|user| user.id() == id) else {
            return Ok(None);
        };
        let mut updated = user.clone();
        if let Some(name) = changes.name {
            updated = User::from_parts(
                *updated.id(),
                updated.email().clone(),
                name,
                updated.password_hash().clone(),
                updated.is_active(),
                updated.is_staff(),
                updated.is_superuser(),
            );
        }
        if let Some(hash) = changes.password_hash {
            updated = User::from_parts(
                *updated.id(),
                updated.email().clone(),
                updated.name().clone(),
                hash,
                updated.is_active(),
                updated.is_staff(),
                updated.is_superuser(),
            );
        }
        *user = updated.clone();
        Ok(Some(updated))
    }
}

#[async_trait]
impl AccessTokenRepository for MemoryStore {
    async fn store(&self, fingerprint: &str, user: &UserId) -> Result<(), TokenPersistenceError> {
        self.lock().tokens.insert(fingerprint.to_owned(), *user);
        Ok(())
    }

    async fn find_user(
        &self,
        fingerprint: &str,
    ) -> Result<Option<UserId>, TokenPersistenceError> {
        Ok(self.lock().tokens.get(fingerprint).copied())
    }
}

#[async_trait]
impl AttributeRepository for MemoryStore {
    async fn list_for_owner(
        &self,
        owner: &UserId,
        kind: AttributeKind,
        listing: AttributeListing,
    ) -> Result<Vec<Attribute>, AttributePersistenceError> {
        let state = self.lock();
        let assigned = listing.assigned_only.then(|| state.assigned_ids(kind));
        let mut result: Vec<Attribute> = state
            .attributes(kind)
            .iter()
            .filter(|row| row.owner == *owner)
            .filter(|row| match &assigned {
                Some(ids) => ids.contains(&row.id),
                None => true,
            })
            .map(|row| Attribute {
                id: row.id,
                name: row.name.clone(),
            })
            .collect();
        result.sort_by(|a, b| b.name.cmp(&a.name).then(a.id.cmp(&b.id)));
        Ok(result)
    }

    async fn create(
        &self,
        owner: &UserId,
        kind: AttributeKind,
        name: &AttributeName,
    ) -> Result<Attribute, AttributePersistenceError> {
        let mut state = self.lock();
        state.next_attribute_id += 1;
        let id = state.next_attribute_id;
        state.attributes_mut(kind).push(AttributeRow {
            id,
            owner: *owner,
            name: name.as_ref().to_owned(),
        });
        Ok(Attribute {
            id,
            name: name.as_ref().to_owned(),
        })
    }

    async fn find_by_ids(
        &self,
        owner: &UserId,
        kind: AttributeKind,
        ids: &[AttributeId],
    ) -> Result<Vec<Attribute>, AttributePersistenceError> {
        let state = self.lock();
        let mut result: Vec<Attribute> = state
            .attributes(kind)
            .iter()
            .filter(|row| row.owner == *owner && ids.contains(&row.id))
            .map(|row| Attribute {
                id: row.id,
                name: row.name.clone(),
            })
            .collect();
        result.sort_by_key(|attribute| attribute.id);
        Ok(result)
    }
}

#[async_trait]
impl RecipeRepository for MemoryStore {
    async fn list(
        &self,
        owner: &UserId,
        filter: &RecipeFilter,
    ) -> Result<Vec<Recipe>, RecipePersistenceError> {
        let state = self.lock();
        Ok(state
            .recipes
            .iter()
            .filter(|row| row.owner == *owner)
            .filter(|row| match &filter.tag_ids {
                Some(ids) => intersects(&row.tag_ids, ids),
                None => true,
            })
            .filter(|row| match &filter.ingredient_ids {
                Some(ids) => intersects(&row.ingredient_ids, ids),
                None => true,
            })
            .map(RecipeRow::to_recipe)
            .collect())
    }

    async fn find(
        &self,
        owner: &UserId,
        id: RecipeId,
    ) -> Result<Option<Recipe>, RecipePersistenceError> {
        let state = self.lock();
        Ok(state
            .recipes
            .iter()
            .find(|row| row.owner == *owner && row.id == id)
            .map(RecipeRow::to_recipe))
    }

    async fn create(
        &self,
        owner: &UserId,
        draft: &RecipeDraft,
    ) -> Result<Recipe, RecipePersistenceError> {
        let mut state = self.lock();
        state.check_associations(&draft.tag_ids, &draft.ingredient_ids)?;
        state.next_recipe_id += 1;
        let row = RecipeRow {
            id: state.next_recipe_id,
            owner: *owner,
            title: draft.title.clone(),
            time_minutes: draft.time_minutes,
            price: draft.price,
            link: draft.link.clone(),
            image_path: None,
            tag_ids: normalized_ids(&draft.tag_ids),
            ingredient_ids: normalized_ids(&draft.ingredient_ids),
        };
        let recipe = row.to_recipe();
        state.recipes.push(row);
        Ok(recipe)
    }

    async fn replace(
        &self,
        owner: &UserId,
        id: RecipeId,
        draft: &RecipeDraft,
    ) -> Result<Option<Recipe>, RecipePersistenceError> {
        let mut state = self.lock();
        state.check_associations(&draft.tag_ids, &draft.ingredient_ids)?;
        let owner = *owner;
        let Some(row) = state
            .recipes
            .iter_mut()
            .find(|row| row.owner == owner && row.id == id)
        else {
            return Ok(None);
        };
        row.title = draft.title.clone();
        row.time_minutes = draft.time_minutes;
        row.price = draft.price;
        row.link = draft.link.clone();
        row.tag_ids = normalized_ids(&draft.tag_ids);
        row.ingredient_ids = normalized_ids(&draft.ingredient_ids);
        Ok(Some(row.to_recipe()))
    }

    async fn update(
        &self,
        owner: &UserId,
        id: RecipeId,
        patch: &RecipePatch,
    ) -> Result<Option<Recipe>, RecipePersistenceError> {
        let mut state = self.lock();
        if let Some(ids) = &patch.tag_ids {
            state.check_associations(ids, &[])?;
        }
        if let Some(ids) = &patch.ingredient_ids {
            state.check_associations(&[], ids)?;
        }
        let owner = *owner;
        let Some(row) = state
            .recipes
            .iter_mut()
            .find(|row| row.owner == owner && row.id == id)
        else {
            return Ok(None);
        };
        if let Some(title) = &patch.title {
            row.title = title.clone();
        }
        if let Some(time) = patch.time_minutes {
            row.time_minutes = time;
        }
        if let Some(price) = patch.price {
            row.price = price;
        }
        if let Some(link) = &patch.link {
            row.link = Some(link.clone());
        }
        if let Some(ids) = &patch.tag_ids {
            row.tag_ids = normalized_ids(ids);
        }
        if let Some(ids) = &patch.ingredient_ids {
            row.ingredient_ids = normalized_ids(ids);
        }
        Ok(Some(row.to_recipe()))
    }

    async fn delete(
        &self,
        owner: &UserId,
        id: RecipeId,
    ) -> Result<bool, RecipePersistenceError> {
        let mut state = self.lock();
        let before = state.recipes.len();
        state
            .recipes
            .retain(|row| !(row.owner == *owner && row.id == id));
        Ok(state.recipes.len() < before)
    }

    async fn set_image_path(
        &self,
        owner: &UserId,
        id: RecipeId,
        path: &str,
    ) -> Result<Option<Recipe>, RecipePersistenceError> {
        let mut state = self.lock();
        let owner = *owner;
        let Some(row) = state
            .recipes
            .iter_mut()
            .find(|row| row.owner == owner && row.id == id)
        else {
            return Ok(None);
        };
        row.image_path = Some(path.to_owned());
        Ok(Some(row.to_recipe()))
    }
}

#[async_trait]
impl ImageStore for MemoryStore {
    async fn save(&self, relative_path: &str, _bytes: Vec<u8>) -> Result<(), ImageStoreError> {
        self.lock().saved_images.push(relative_path.to_owned());
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::password::PasswordHash;
    use crate::domain::user::DisplayName;
    use rstest::rstest;

    fn user(email: &str) -> User {
        User::new(
            UserId::random(),
            EmailAddress::new(email).expect("valid email"),
            DisplayName::new("Test Cook").expect("valid name"),
            PasswordHash::from_stored("$argon2id$stub"),
        )
    }

    fn draft(title: &str, tag_ids: Vec<AttributeId>) -> RecipeDraft {
        RecipeDraft::new(
            title,
            10,
            "5.00".parse().expect("decimal"),
            None,
            tag_ids,
            vec![],
        )
        .expect("valid draft")
    }

    // MemoryStore implements both repository traits, so `create` needs
    // qualified calls in these tests.
    async fn create_attribute(store: &MemoryStore, owner: &UserId, kind: AttributeKind, name: &str) -> Attribute {
        AttributeRepository::create(
            store,
            owner,
            kind,
            &AttributeName::new(name).expect("valid name"),
        )
        .await
        .expect("create attribute")
    }

    async fn create_recipe(store: &MemoryStore, owner: &UserId, draft: &RecipeDraft) -> Recipe {
        RecipeRepository::create(store, owner, draft)
            .await
            .expect("create recipe")
    }

    #[tokio::test]
    async fn duplicate_email_insert_fails_without_overwriting() {
        let store = MemoryStore::new();
        let first = user("dup@example.com");
        let second = user("dup@example.com");
        store.insert(&first).await.expect("first insert succeeds");
        let err = store
            .insert(&second)
            .await
            .expect_err("duplicate email must fail");
        assert!(matches!(err, UserPersistenceError::EmailTaken { .. }));
        let stored = store
            .find_by_email(first.email())
            .await
            .expect("lookup succeeds")
            .expect("user present");
        assert_eq!(stored.id(), first.id());
    }

    #[tokio::test]
    async fn attribute_listing_is_owner_scoped_and_name_descending() {
        let store = MemoryStore::new();
        let alice = UserId::random();
        let bob = UserId::random();
        for name in ["apple", "zucchini", "mango"] {
            create_attribute(&store, &alice, AttributeKind::Ingredient, name).await;
        }
        create_attribute(&store, &bob, AttributeKind::Ingredient, "salt").await;

        let listed = store
            .list_for_owner(&alice, AttributeKind::Ingredient, AttributeListing::default())
            .await
            .expect("list succeeds");
        let names: Vec<&str> = listed.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, ["zucchini", "mango", "apple"]);
    }

    #[tokio::test]
    async fn assigned_only_deduplicates_shared_attributes() {
        let store = MemoryStore::new();
        let owner = UserId::random();
        let tag = create_attribute(&store, &owner, AttributeKind::Tag, "dinner").await;
        let unused = create_attribute(&store, &owner, AttributeKind::Tag, "unused").await;
        create_recipe(&store, &owner, &draft("Stew", vec![tag.id])).await;
        create_recipe(&store, &owner, &draft("Curry", vec![tag.id])).await;

        let listed = store
            .list_for_owner(
                &owner,
                AttributeKind::Tag,
                AttributeListing {
                    assigned_only: true,
                },
            )
            .await
            .expect("list succeeds");
        assert_eq!(listed.len(), 1);
        assert_eq!(listed.first().map(|a| a.id), Some(tag.id));
        assert!(listed.iter().all(|a| a.id != unused.id));
    }

    #[rstest]
    #[case(vec![1], true)]
    #[case(vec![999], false)]
    #[tokio::test]
    async fn recipe_filter_matches_on_intersection(
        #[case] requested: Vec<AttributeId>,
        #[case] expect_match: bool,
    ) {
        let store = MemoryStore::new();
        let owner = UserId::random();
        let tag = create_attribute(&store, &owner, AttributeKind::Tag, "quick").await;
        assert_eq!(tag.id, 1);
        create_recipe(&store, &owner, &draft("Omelette", vec![tag.id])).await;

        let filter = RecipeFilter {
            tag_ids: Some(requested),
            ingredient_ids: None,
        };
        let listed = store.list(&owner, &filter).await.expect("list succeeds");
        assert_eq!(!listed.is_empty(), expect_match);
    }

    #[tokio::test]
    async fn replace_clears_associations_absent_from_draft() {
        let store = MemoryStore::new();
        let owner = UserId::random();
        let tag = create_attribute(&store, &owner, AttributeKind::Tag, "baked").await;
        let recipe = create_recipe(&store, &owner, &draft("Bread", vec![tag.id])).await;

        let replaced = store
            .replace(&owner, recipe.id, &draft("Bread v2", vec![]))
            .await
            .expect("replace succeeds")
            .expect("recipe exists");
        assert!(replaced.tag_ids.is_empty());
    }

    #[tokio::test]
    async fn cross_user_access_is_invisible() {
        let store = MemoryStore::new();
        let alice = UserId::random();
        let bob = UserId::random();
        let recipe = create_recipe(&store, &alice, &draft("Secret Sauce", vec![])).await;

        assert!(store
            .find(&bob, recipe.id)
            .await
            .expect("find succeeds")
            .is_none());
        assert!(!store.delete(&bob, recipe.id).await.expect("delete succeeds"));
        assert!(store
            .find(&alice, recipe.id)
            .await
            .expect("find succeeds")
            .is_some());
    }
}

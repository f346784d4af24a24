//! In-memory repositories for service tests
//!
//! `InMemoryStore` implements every repository port over one mutex-guarded
//! state, so the follow edges it reports are mirrored the same way the
//! PostgreSQL edge table mirrors them. It can also simulate a store outage,
//! a concurrent toggle racing the next follow write and a failing profile
//! update.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use social_common::auth::JwtService;
use social_core::traits::{FollowRepository, PostRepository, RepoResult, UserRepository};
use social_core::{
    DomainError, FollowTransition, LikeToggle, Post, Reply, Snowflake, SnowflakeGenerator, User,
};

use crate::services::{ServiceContext, ServiceContextBuilder};

pub const TEST_JWT_SECRET: &str = "in-memory-test-secret-at-least-32-bytes";

#[derive(Default)]
struct State {
    /// Users as stored; adjacency lists are filled from `follows` on read
    users: HashMap<Snowflake, User>,
    passwords: HashMap<Snowflake, String>,
    /// Edges in insertion order
    follows: Vec<(Snowflake, Snowflake)>,
    posts: HashMap<Snowflake, Post>,
}

impl State {
    fn hydrate(&self, user: &User) -> User {
        let mut user = user.clone();
        user.followers = self
            .follows
            .iter()
            .filter(|(_, followee)| *followee == user.id)
            .map(|(follower, _)| *follower)
            .collect();
        user.following = self
            .follows
            .iter()
            .filter(|(follower, _)| *follower == user.id)
            .map(|(_, followee)| *followee)
            .collect();
        user
    }

    fn has_edge(&self, follower: Snowflake, followee: Snowflake) -> bool {
        self.follows.contains(&(follower, followee))
    }

    fn flip_edge(&mut self, follower: Snowflake, followee: Snowflake) {
        if self.has_edge(follower, followee) {
            self.follows.retain(|edge| *edge != (follower, followee));
        } else {
            self.follows.push((follower, followee));
        }
    }

    fn check_unique(&self, user: &User) -> RepoResult<()> {
        for other in self.users.values().filter(|u| u.id != user.id) {
            if other.username == user.username {
                return Err(DomainError::UsernameAlreadyExists);
            }
            if other.email == user.email {
                return Err(DomainError::EmailAlreadyExists);
            }
        }
        Ok(())
    }
}

/// Shared in-memory store; clones see the same data
#[derive(Clone)]
pub struct InMemoryStore {
    state: Arc<Mutex<State>>,
    unavailable: Arc<AtomicBool>,
    race_next_toggle: Arc<AtomicBool>,
    conflict_next_toggle: Arc<AtomicBool>,
    fail_next_update: Arc<AtomicBool>,
    generator: Arc<SnowflakeGenerator>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State::default())),
            unavailable: Arc::new(AtomicBool::new(false)),
            race_next_toggle: Arc::new(AtomicBool::new(false)),
            conflict_next_toggle: Arc::new(AtomicBool::new(false)),
            fail_next_update: Arc::new(AtomicBool::new(false)),
            generator: Arc::new(SnowflakeGenerator::new(1)),
        }
    }

    /// Builder with every repository pointing at this store
    pub fn context_builder(&self) -> ServiceContextBuilder {
        ServiceContextBuilder::new()
            .user_repo(Arc::new(self.clone()))
            .follow_repo(Arc::new(self.clone()))
            .post_repo(Arc::new(self.clone()))
            .jwt_service(Arc::new(JwtService::new(TEST_JWT_SECRET, 900, 604_800)))
            .snowflake_generator(Arc::clone(&self.generator))
    }

    pub fn context(&self) -> ServiceContext {
        ServiceContext::new(
            Arc::new(self.clone()),
            Arc::new(self.clone()),
            Arc::new(self.clone()),
            Arc::new(JwtService::new(TEST_JWT_SECRET, 900, 604_800)),
            Arc::clone(&self.generator),
        )
    }

    /// Every repository call fails with `Unavailable` while set
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// The next follow write finds its edge already flipped by someone else
    pub fn race_next_toggle(&self) {
        self.race_next_toggle.store(true, Ordering::SeqCst);
    }

    /// The next follow write reports a conflict and leaves the edge as it was
    pub fn conflict_next_toggle(&self) {
        self.conflict_next_toggle.store(true, Ordering::SeqCst);
    }

    /// The next profile update fails with `Unavailable`, writing nothing
    pub fn fail_next_update(&self) {
        self.fail_next_update.store(true, Ordering::SeqCst);
    }

    /// Current password hash, bypassing the availability switches
    pub fn password_hash(&self, id: Snowflake) -> Option<String> {
        self.state.lock().passwords.get(&id).cloned()
    }

    /// Insert a user directly; its password hash is not a valid hash
    pub fn seed_user(&self, username: &str) -> User {
        let user = User::new(
            self.generator.generate(),
            username.to_string(),
            username.to_string(),
            format!("{username}@example.com"),
        );
        let mut state = self.state.lock();
        state.users.insert(user.id, user.clone());
        state.passwords.insert(user.id, "seeded".to_string());
        user
    }

    /// Add the edge `follower → followee` without going through a toggle
    pub fn seed_follow(&self, follower: Snowflake, followee: Snowflake) {
        let mut state = self.state.lock();
        if !state.has_edge(follower, followee) {
            state.follows.push((follower, followee));
        }
    }

    pub fn seed_post(&self, author: Snowflake, text: &str, created_at: DateTime<Utc>) -> Post {
        let mut post = Post::new(self.generator.generate(), author, text.to_string(), None);
        post.created_at = created_at;
        post.updated_at = created_at;
        self.state.lock().posts.insert(post.id, post.clone());
        post
    }

    /// Raw follow edges in insertion order
    pub fn edges(&self) -> Vec<(Snowflake, Snowflake)> {
        self.state.lock().follows.clone()
    }

    fn check_available(&self) -> RepoResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(DomainError::Unavailable("in-memory store is offline".to_string()));
        }
        Ok(())
    }

    fn find_user_where(&self, pred: impl Fn(&User) -> bool) -> RepoResult<Option<User>> {
        self.check_available()?;
        let state = self.state.lock();
        Ok(state.users.values().find(|u| pred(u)).map(|u| state.hydrate(u)))
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<User>> {
        self.find_user_where(|u| u.id == id)
    }

    async fn find_by_username(&self, username: &str) -> RepoResult<Option<User>> {
        self.find_user_where(|u| u.username == username)
    }

    async fn find_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        self.find_user_where(|u| u.email == email)
    }

    async fn username_exists(&self, username: &str) -> RepoResult<bool> {
        Ok(self.find_user_where(|u| u.username == username)?.is_some())
    }

    async fn email_exists(&self, email: &str) -> RepoResult<bool> {
        Ok(self.find_user_where(|u| u.email == email)?.is_some())
    }

    async fn create(&self, user: &User, password_hash: &str) -> RepoResult<()> {
        self.check_available()?;
        let mut state = self.state.lock();
        state.check_unique(user)?;

        let mut stored = user.clone();
        stored.followers.clear();
        stored.following.clear();
        state.users.insert(user.id, stored);
        state.passwords.insert(user.id, password_hash.to_string());
        Ok(())
    }

    async fn update(&self, user: &User) -> RepoResult<()> {
        self.check_available()?;
        if self.fail_next_update.swap(false, Ordering::SeqCst) {
            return Err(DomainError::Unavailable("profile update failed".to_string()));
        }
        let mut state = self.state.lock();
        if !state.users.contains_key(&user.id) {
            return Err(DomainError::UserNotFound(user.id));
        }
        state.check_unique(user)?;

        if let Some(stored) = state.users.get_mut(&user.id) {
            stored.name.clone_from(&user.name);
            stored.username.clone_from(&user.username);
            stored.email.clone_from(&user.email);
            stored.profile_pic.clone_from(&user.profile_pic);
            stored.bio.clone_from(&user.bio);
            stored.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn set_frozen(&self, id: Snowflake, frozen: bool) -> RepoResult<()> {
        self.check_available()?;
        let mut state = self.state.lock();
        let user = state.users.get_mut(&id).ok_or(DomainError::UserNotFound(id))?;
        user.is_frozen = frozen;
        user.updated_at = Utc::now();
        Ok(())
    }

    async fn get_password_hash(&self, id: Snowflake) -> RepoResult<Option<String>> {
        self.check_available()?;
        Ok(self.state.lock().passwords.get(&id).cloned())
    }

    async fn update_password(&self, id: Snowflake, password_hash: &str) -> RepoResult<()> {
        self.check_available()?;
        let mut state = self.state.lock();
        if !state.users.contains_key(&id) {
            return Err(DomainError::UserNotFound(id));
        }
        state.passwords.insert(id, password_hash.to_string());
        Ok(())
    }

    async fn find_suggestion_candidates(
        &self,
        for_user: Snowflake,
        limit: i64,
    ) -> RepoResult<Vec<User>> {
        self.check_available()?;
        let state = self.state.lock();
        let mut candidates: Vec<User> = state
            .users
            .values()
            .filter(|u| u.id != for_user && !u.is_frozen && !state.has_edge(for_user, u.id))
            .map(|u| state.hydrate(u))
            .collect();
        candidates.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        candidates.truncate(limit.clamp(1, 100) as usize);
        Ok(candidates)
    }
}

#[async_trait]
impl FollowRepository for InMemoryStore {
    async fn is_following(&self, follower: Snowflake, followee: Snowflake) -> RepoResult<bool> {
        self.check_available()?;
        Ok(self.state.lock().has_edge(follower, followee))
    }

    async fn toggle(
        &self,
        follower: Snowflake,
        followee: Snowflake,
        currently_following: bool,
    ) -> RepoResult<FollowTransition> {
        self.check_available()?;
        if follower == followee {
            return Err(DomainError::InvalidOperation(
                "You cannot follow or unfollow yourself".to_string(),
            ));
        }

        let mut state = self.state.lock();
        for id in [follower, followee] {
            if !state.users.contains_key(&id) {
                return Err(DomainError::UserNotFound(id));
            }
        }

        if self.conflict_next_toggle.swap(false, Ordering::SeqCst) {
            return Err(DomainError::FollowConflict { follower, followee });
        }

        if self.race_next_toggle.swap(false, Ordering::SeqCst) {
            // Another writer performs the very same toggle first
            state.flip_edge(follower, followee);
        }

        if state.has_edge(follower, followee) != currently_following {
            return Err(DomainError::FollowConflict { follower, followee });
        }

        state.flip_edge(follower, followee);
        Ok(FollowTransition::from_current(currently_following))
    }

    async fn followers_of(&self, user_id: Snowflake) -> RepoResult<Vec<Snowflake>> {
        self.check_available()?;
        let state = self.state.lock();
        Ok(state
            .follows
            .iter()
            .filter(|(_, followee)| *followee == user_id)
            .map(|(follower, _)| *follower)
            .collect())
    }

    async fn following_of(&self, user_id: Snowflake) -> RepoResult<Vec<Snowflake>> {
        self.check_available()?;
        let state = self.state.lock();
        Ok(state
            .follows
            .iter()
            .filter(|(follower, _)| *follower == user_id)
            .map(|(_, followee)| *followee)
            .collect())
    }
}

fn newest_first(posts: &mut [Post]) {
    posts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
}

#[async_trait]
impl PostRepository for InMemoryStore {
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<Post>> {
        self.check_available()?;
        Ok(self.state.lock().posts.get(&id).cloned())
    }

    async fn find_by_author(&self, author_id: Snowflake) -> RepoResult<Vec<Post>> {
        self.find_by_author_in(&[author_id]).await
    }

    async fn find_by_author_in(&self, author_ids: &[Snowflake]) -> RepoResult<Vec<Post>> {
        self.check_available()?;
        let state = self.state.lock();
        let mut posts: Vec<Post> = state
            .posts
            .values()
            .filter(|p| author_ids.contains(&p.author_id))
            .cloned()
            .collect();
        newest_first(&mut posts);
        Ok(posts)
    }

    async fn create(&self, post: &Post) -> RepoResult<()> {
        self.check_available()?;
        let mut state = self.state.lock();
        if !state.users.contains_key(&post.author_id) {
            return Err(DomainError::UserNotFound(post.author_id));
        }
        state.posts.insert(post.id, post.clone());
        Ok(())
    }

    async fn delete(&self, id: Snowflake) -> RepoResult<()> {
        self.check_available()?;
        self.state
            .lock()
            .posts
            .remove(&id)
            .map(|_| ())
            .ok_or(DomainError::PostNotFound(id))
    }

    async fn toggle_like(&self, post_id: Snowflake, user_id: Snowflake) -> RepoResult<LikeToggle> {
        self.check_available()?;
        let mut state = self.state.lock();
        let post = state
            .posts
            .get_mut(&post_id)
            .ok_or(DomainError::PostNotFound(post_id))?;

        if post.is_liked_by(user_id) {
            post.likes.retain(|id| *id != user_id);
            Ok(LikeToggle::Unliked)
        } else {
            post.likes.push(user_id);
            Ok(LikeToggle::Liked)
        }
    }

    async fn add_reply(&self, reply: &Reply) -> RepoResult<()> {
        self.check_available()?;
        let mut state = self.state.lock();
        let post = state
            .posts
            .get_mut(&reply.post_id)
            .ok_or(DomainError::PostNotFound(reply.post_id))?;
        post.replies.push(reply.clone());
        Ok(())
    }
}

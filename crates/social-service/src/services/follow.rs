//! Follow-graph manager
//!
//! Toggles the directed edge between two users. The store writes the edge in
//! one transaction, so both adjacency lists change together; this service
//! adds the domain checks, per-actor serialization and conflict
//! reconciliation around that write.

use social_core::{DomainError, FollowTransition, Snowflake, User};
use tracing::{info, instrument, warn};

use crate::dto::FollowResponse;

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};

/// What a toggle did, with both users as they are after it
#[derive(Debug, Clone)]
pub struct FollowOutcome {
    pub transition: FollowTransition,
    pub actor: User,
    pub target: User,
}

impl FollowOutcome {
    pub fn is_following(&self) -> bool {
        self.transition.is_following()
    }

    pub fn to_response(&self) -> FollowResponse {
        FollowResponse {
            user_id: self.target.id.to_string(),
            following: self.is_following(),
            followers_count: self.target.followers_count(),
            following_count: self.actor.following_count(),
        }
    }
}

/// Follow service
pub struct FollowService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> FollowService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Follow `target` if `actor` does not follow it yet, otherwise unfollow.
    ///
    /// Toggles by the same actor are serialized for the whole
    /// read-decide-write sequence.
    #[instrument(skip(self))]
    pub async fn toggle_follow(
        &self,
        actor: Snowflake,
        target: Snowflake,
    ) -> ServiceResult<FollowOutcome> {
        if actor == target {
            return Err(DomainError::InvalidOperation(
                "You cannot follow or unfollow yourself".to_string(),
            )
            .into());
        }

        let _guard = self.ctx.follow_locks().acquire(actor).await;

        let actor_user = self.load(actor).await?;
        // Existence check only; the edge state comes from the actor's side
        self.load(target).await?;

        let currently_following = actor_user.is_following(target);
        let intended = FollowTransition::from_current(currently_following);

        let transition = match self
            .ctx
            .follow_repo()
            .toggle(actor, target, currently_following)
            .await
        {
            Ok(transition) => transition,
            Err(DomainError::FollowConflict { .. }) => {
                warn!(%actor, %target, ?intended, "Follow toggle conflicted, reconciling");
                self.reconcile(actor, target, intended).await?
            }
            Err(e) => return Err(e.into()),
        };

        let (actor_user, target_user) = self.load_pair(actor, target).await?;

        info!(%actor, %target, ?transition, "Follow toggled");

        Ok(FollowOutcome {
            transition,
            actor: actor_user,
            target: target_user,
        })
    }

    /// Re-read both sides once after a conflict.
    ///
    /// Another writer may have performed the same transition; if both
    /// adjacency lists already show the intended state and agree with each
    /// other, the toggle is reported as done. Anything else is a genuine
    /// conflict.
    async fn reconcile(
        &self,
        actor: Snowflake,
        target: Snowflake,
        intended: FollowTransition,
    ) -> ServiceResult<FollowTransition> {
        let (actor_user, target_user) = self.load_pair(actor, target).await?;

        let settled = actor_user.is_following(target) == intended.is_following()
            && actor_user.edge_is_mirrored_with(&target_user);

        if settled {
            info!(%actor, %target, ?intended, "Follow conflict reconciled");
            Ok(intended)
        } else {
            Err(DomainError::FollowConflict {
                follower: actor,
                followee: target,
            }
            .into())
        }
    }

    async fn load_pair(&self, actor: Snowflake, target: Snowflake) -> ServiceResult<(User, User)> {
        Ok((self.load(actor).await?, self.load(target).await?))
    }

    async fn load(&self, user_id: Snowflake) -> ServiceResult<User> {
        self.ctx
            .user_repo()
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| ServiceError::Domain(DomainError::UserNotFound(user_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::InMemoryStore;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_toggle_twice_adds_then_removes_mirrored_edge() {
        let store = InMemoryStore::new();
        let ctx = store.context();
        let alice = store.seed_user("alice");
        let bob = store.seed_user("bob");
        let service = FollowService::new(&ctx);

        let first = service.toggle_follow(alice.id, bob.id).await.unwrap();
        assert_eq!(first.transition, FollowTransition::Followed);
        assert_eq!(first.actor.following, vec![bob.id]);
        assert_eq!(first.target.followers, vec![alice.id]);

        let second = service.toggle_follow(alice.id, bob.id).await.unwrap();
        assert_eq!(second.transition, FollowTransition::Unfollowed);
        assert!(second.actor.following.is_empty());
        assert!(second.target.followers.is_empty());
        assert!(store.edges().is_empty());
    }

    #[tokio::test]
    async fn test_self_follow_is_invalid() {
        let store = InMemoryStore::new();
        let ctx = store.context();
        let alice = store.seed_user("alice");

        let err = FollowService::new(&ctx)
            .toggle_follow(alice.id, alice.id)
            .await
            .unwrap_err();

        assert!(matches!(err.as_domain(), Some(DomainError::InvalidOperation(_))));
        assert_eq!(err.status_code(), 400);
        assert!(store.edges().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_user_is_not_found() {
        let store = InMemoryStore::new();
        let ctx = store.context();
        let alice = store.seed_user("alice");
        let ghost = Snowflake::new(999);
        let service = FollowService::new(&ctx);

        let err = service.toggle_follow(alice.id, ghost).await.unwrap_err();
        assert!(matches!(err.as_domain(), Some(DomainError::UserNotFound(id)) if *id == ghost));

        let err = service.toggle_follow(ghost, alice.id).await.unwrap_err();
        assert_eq!(err.status_code(), 404);
    }

    #[tokio::test]
    async fn test_conflict_with_same_transition_reconciles() {
        let store = InMemoryStore::new();
        let ctx = store.context();
        let alice = store.seed_user("alice");
        let bob = store.seed_user("bob");

        store.race_next_toggle();
        let outcome = FollowService::new(&ctx)
            .toggle_follow(alice.id, bob.id)
            .await
            .unwrap();

        assert_eq!(outcome.transition, FollowTransition::Followed);
        assert!(outcome.actor.is_following(bob.id));
        assert!(outcome.target.is_followed_by(alice.id));
        assert_eq!(store.edges(), vec![(alice.id, bob.id)]);
    }

    #[tokio::test]
    async fn test_unsettled_conflict_propagates() {
        let store = InMemoryStore::new();
        let ctx = store.context();
        let alice = store.seed_user("alice");
        let bob = store.seed_user("bob");
        let carol = store.seed_user("carol");
        store.seed_follow(carol.id, bob.id);
        let before = store.edges();

        store.conflict_next_toggle();
        let err = FollowService::new(&ctx)
            .toggle_follow(alice.id, bob.id)
            .await
            .unwrap_err();

        assert_eq!(err.status_code(), 409);
        assert_eq!(err.error_code(), "FOLLOW_CONFLICT");
        assert!(matches!(
            err.as_domain(),
            Some(DomainError::FollowConflict { follower, followee })
                if *follower == alice.id && *followee == bob.id
        ));
        assert_eq!(store.edges(), before);

        // The switch is one-shot; the retry goes through
        let outcome = FollowService::new(&ctx).toggle_follow(alice.id, bob.id).await.unwrap();
        assert_eq!(outcome.transition, FollowTransition::Followed);
    }

    #[tokio::test]
    async fn test_store_unavailable_propagates() {
        let store = InMemoryStore::new();
        let ctx = store.context();
        let alice = store.seed_user("alice");
        let bob = store.seed_user("bob");

        store.set_unavailable(true);
        let err = FollowService::new(&ctx)
            .toggle_follow(alice.id, bob.id)
            .await
            .unwrap_err();

        assert_eq!(err.status_code(), 503);
        store.set_unavailable(false);
        assert!(store.edges().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_toggles_by_one_actor_stay_consistent() {
        let store = InMemoryStore::new();
        let ctx = Arc::new(store.context());
        let alice = store.seed_user("alice");
        let bob = store.seed_user("bob");

        let mut handles = Vec::new();
        for _ in 0..10 {
            let ctx = Arc::clone(&ctx);
            handles.push(tokio::spawn(async move {
                FollowService::new(&ctx).toggle_follow(alice.id, bob.id).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        // Ten serialized toggles end where they started
        assert!(store.edges().is_empty());
        assert_eq!(ctx.follow_locks().active(), 0);
    }

    #[tokio::test]
    async fn test_outcome_response_counts() {
        let store = InMemoryStore::new();
        let ctx = store.context();
        let alice = store.seed_user("alice");
        let bob = store.seed_user("bob");
        let carol = store.seed_user("carol");
        let service = FollowService::new(&ctx);

        service.toggle_follow(alice.id, bob.id).await.unwrap();
        let outcome = service.toggle_follow(carol.id, bob.id).await.unwrap();

        let response = outcome.to_response();
        assert!(response.following);
        assert_eq!(response.followers_count, 2);
        assert_eq!(response.following_count, 1);
        assert_eq!(outcome.target.followers, vec![alice.id, carol.id]);
        assert_eq!(store.edges(), vec![(alice.id, bob.id), (carol.id, bob.id)]);
    }
}

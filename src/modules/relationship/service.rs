use std::sync::Arc;

use uuid::Uuid;

use crate::{
    api::error,
    modules::{
        notification::{repository::NotificationRepository, schema::NotificationKind},
        push::{message::RelationshipEvent, publisher::EventPublisher},
        relationship::{
            model::{DerivedStatus, PairKey, RelationResponse, RelationshipCounts, TargetRef},
            repository::RelationshipRepository,
        },
        user::{repository::UserRepository, schema::UserEntity},
    },
};

/// Transition logic over the canonical store. Every mutation is one
/// conditional statement against the pair-unique row; events are emitted after
/// the mutation commits; invalid-for-current-status calls are no-ops that
/// return the current derived status, so clients may retry freely.
#[derive(Clone)]
pub struct RelationshipService<R, U, N>
where
    R: RelationshipRepository + Send + Sync,
    U: UserRepository + Send + Sync,
    N: NotificationRepository + Send + Sync,
{
    relationship_repo: Arc<R>,
    user_repo: Arc<U>,
    notification_repo: Arc<N>,
    publisher: Arc<dyn EventPublisher>,
}

impl<R, U, N> RelationshipService<R, U, N>
where
    R: RelationshipRepository + Send + Sync,
    U: UserRepository + Send + Sync,
    N: NotificationRepository + Send + Sync,
{
    pub fn with_dependencies(
        relationship_repo: Arc<R>,
        user_repo: Arc<U>,
        notification_repo: Arc<N>,
        publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        RelationshipService { relationship_repo, user_repo, notification_repo, publisher }
    }

    async fn resolve(&self, target: &TargetRef) -> Result<UserEntity, error::SystemError> {
        let user = match target {
            TargetRef::Id(id) => self.user_repo.find_by_id(id).await?,
            TargetRef::Username(name) => self.user_repo.find_by_username(name).await?,
        };

        user.ok_or_else(|| error::SystemError::not_found("Target user not found"))
    }

    async fn resolve_other(
        &self,
        viewer: Uuid,
        target: TargetRef,
    ) -> Result<UserEntity, error::SystemError> {
        let user = self.resolve(&target).await?;
        if user.id == viewer {
            return Err(error::SystemError::bad_request("Cannot target yourself"));
        }
        Ok(user)
    }

    async fn derived(&self, viewer: Uuid, target: Uuid) -> Result<DerivedStatus, error::SystemError> {
        let pair = PairKey::new(viewer, target);
        let record = self.relationship_repo.find_by_pair(&pair).await?;
        Ok(DerivedStatus::derive(&viewer, &target, record.as_ref()))
    }

    /// Notification append is a side effect of an already-committed mutation;
    /// a failure here is logged, never surfaced.
    async fn notify(&self, recipient: Uuid, kind: NotificationKind, actor_id: Uuid) {
        let actor = match self.user_repo.find_by_id(&actor_id).await {
            Ok(Some(actor)) => actor,
            Ok(None) => return,
            Err(e) => {
                log::error!("Failed to load actor {} for notification: {}", actor_id, e);
                return;
            }
        };

        let message = match kind {
            NotificationKind::FriendRequest => {
                format!("{} sent you a friend request", actor.display_name)
            }
            NotificationKind::FriendAccept => {
                format!("{} accepted your friend request", actor.display_name)
            }
        };
        let link = format!("/profile/{}", actor.username);

        if let Err(e) =
            self.notification_repo.append(&recipient, kind, &actor_id, &message, &link).await
        {
            log::error!("Failed to append notification for {}: {}", recipient, e);
        }
    }

    pub async fn request(
        &self,
        viewer: Uuid,
        target: TargetRef,
    ) -> Result<DerivedStatus, error::SystemError> {
        let target = self.resolve_other(viewer, target).await?;
        let pair = PairKey::new(viewer, target.id);

        // Two passes: if the row vanishes between the insert and the
        // update/select (a concurrent cancel or decline), retry the insert.
        for _ in 0..2 {
            if let Some(rel) =
                self.relationship_repo.try_create_pending(&pair, &viewer, &target.id).await?
            {
                self.publisher.publish(RelationshipEvent::RequestCreated {
                    from_user_id: viewer,
                    to_user_id: target.id,
                    id: rel.id,
                });
                self.notify(target.id, NotificationKind::FriendRequest, viewer).await;
                return Ok(DerivedStatus::Pending);
            }

            // The pair already has a row. If it is a pending request addressed
            // to the viewer, the requests crossed: resolve to friendship.
            if let Some(rel) =
                self.relationship_repo.accept_pending_addressed_to(&pair, &viewer).await?
            {
                self.publisher
                    .publish(RelationshipEvent::Accepted { a: rel.user_low, b: rel.user_high });
                self.notify(target.id, NotificationKind::FriendAccept, viewer).await;
                return Ok(DerivedStatus::Friends);
            }

            // Idempotent re-request or already friends.
            if let Some(rel) = self.relationship_repo.find_by_pair(&pair).await? {
                return Ok(DerivedStatus::derive(&viewer, &target.id, Some(&rel)));
            }
        }

        Err(error::SystemError::DatabaseError(
            "relationship row kept vanishing during request".into(),
        ))
    }

    pub async fn cancel(
        &self,
        viewer: Uuid,
        target: TargetRef,
    ) -> Result<DerivedStatus, error::SystemError> {
        let target = self.resolve_other(viewer, target).await?;
        let pair = PairKey::new(viewer, target.id);

        if self
            .relationship_repo
            .delete_pending_requested_by(&pair, &viewer)
            .await?
            .is_some()
        {
            self.publisher.publish(RelationshipEvent::RequestCanceled {
                from_user_id: viewer,
                to_user_id: target.id,
            });
            return Ok(DerivedStatus::None);
        }

        self.derived(viewer, target.id).await
    }

    pub async fn accept(
        &self,
        viewer: Uuid,
        target: TargetRef,
    ) -> Result<DerivedStatus, error::SystemError> {
        let target = self.resolve_other(viewer, target).await?;
        let pair = PairKey::new(viewer, target.id);

        if let Some(rel) =
            self.relationship_repo.accept_pending_addressed_to(&pair, &viewer).await?
        {
            self.publisher
                .publish(RelationshipEvent::Accepted { a: rel.user_low, b: rel.user_high });
            self.notify(target.id, NotificationKind::FriendAccept, viewer).await;
            return Ok(DerivedStatus::Friends);
        }

        self.derived(viewer, target.id).await
    }

    pub async fn decline(
        &self,
        viewer: Uuid,
        target: TargetRef,
    ) -> Result<DerivedStatus, error::SystemError> {
        let target = self.resolve_other(viewer, target).await?;
        let pair = PairKey::new(viewer, target.id);

        if let Some(rel) =
            self.relationship_repo.delete_pending_addressed_to(&pair, &viewer).await?
        {
            self.publisher.publish(RelationshipEvent::Declined {
                from_user_id: rel.requested_by.unwrap_or(target.id),
                to_user_id: rel.requested_to.unwrap_or(viewer),
            });
            return Ok(DerivedStatus::None);
        }

        self.derived(viewer, target.id).await
    }

    pub async fn unfriend(
        &self,
        viewer: Uuid,
        target: TargetRef,
    ) -> Result<DerivedStatus, error::SystemError> {
        let target = self.resolve_other(viewer, target).await?;
        let pair = PairKey::new(viewer, target.id);

        if self.relationship_repo.delete_accepted(&pair).await?.is_some() {
            self.publisher
                .publish(RelationshipEvent::Removed { a: pair.low(), b: pair.high() });
            return Ok(DerivedStatus::None);
        }

        self.derived(viewer, target.id).await
    }

    pub async fn status(
        &self,
        viewer: Uuid,
        target: TargetRef,
    ) -> Result<DerivedStatus, error::SystemError> {
        let user = self.resolve(&target).await?;
        if user.id == viewer {
            return Ok(DerivedStatus::Myself);
        }
        self.derived(viewer, user.id).await
    }

    pub async fn counts(&self, viewer: Uuid) -> Result<RelationshipCounts, error::SystemError> {
        self.relationship_repo.counts(&viewer).await
    }

    pub async fn incoming(&self, viewer: Uuid) -> Result<Vec<RelationResponse>, error::SystemError> {
        let rows = self.relationship_repo.incoming_for(&viewer).await?;
        Ok(rows.into_iter().map(RelationResponse::from).collect())
    }

    pub async fn outgoing(&self, viewer: Uuid) -> Result<Vec<RelationResponse>, error::SystemError> {
        let rows = self.relationship_repo.outgoing_for(&viewer).await?;
        Ok(rows.into_iter().map(RelationResponse::from).collect())
    }

    pub async fn friends(&self, viewer: Uuid) -> Result<Vec<RelationResponse>, error::SystemError> {
        let rows = self.relationship_repo.friends_for(&viewer).await?;
        Ok(rows.into_iter().map(RelationResponse::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    use crate::modules::notification::schema::NotificationEntity;
    use crate::modules::relationship::model::RelationUserRow;
    use crate::modules::relationship::schema::{RelationshipEntity, RelationshipStatus};

    #[derive(Default)]
    struct MemRelationships {
        rows: Mutex<HashMap<(Uuid, Uuid), RelationshipEntity>>,
    }

    impl MemRelationships {
        fn key(pair: &PairKey) -> (Uuid, Uuid) {
            (pair.low(), pair.high())
        }

        fn row_count(&self) -> usize {
            self.rows.lock().unwrap().len()
        }

        fn user_row(rel: &RelationshipEntity, other: Uuid) -> RelationUserRow {
            RelationUserRow {
                id: rel.id,
                from_user_id: rel.requested_by,
                to_user_id: rel.requested_to,
                user_id: other,
                username: other.to_string(),
                display_name: other.to_string(),
                avatar_url: None,
                created_at: rel.created_at,
            }
        }
    }

    #[async_trait::async_trait]
    impl RelationshipRepository for MemRelationships {
        async fn find_by_pair(
            &self,
            pair: &PairKey,
        ) -> Result<Option<RelationshipEntity>, error::SystemError> {
            Ok(self.rows.lock().unwrap().get(&Self::key(pair)).cloned())
        }

        async fn try_create_pending(
            &self,
            pair: &PairKey,
            requester: &Uuid,
            recipient: &Uuid,
        ) -> Result<Option<RelationshipEntity>, error::SystemError> {
            let mut rows = self.rows.lock().unwrap();
            if rows.contains_key(&Self::key(pair)) {
                return Ok(None);
            }
            let now = chrono::Utc::now();
            let rel = RelationshipEntity {
                id: Uuid::now_v7(),
                user_low: pair.low(),
                user_high: pair.high(),
                status: RelationshipStatus::Pending,
                requested_by: Some(*requester),
                requested_to: Some(*recipient),
                created_at: now,
                updated_at: now,
            };
            rows.insert(Self::key(pair), rel.clone());
            Ok(Some(rel))
        }

        async fn accept_pending_addressed_to(
            &self,
            pair: &PairKey,
            viewer: &Uuid,
        ) -> Result<Option<RelationshipEntity>, error::SystemError> {
            let mut rows = self.rows.lock().unwrap();
            match rows.get_mut(&Self::key(pair)) {
                Some(rel)
                    if rel.status == RelationshipStatus::Pending
                        && rel.requested_to == Some(*viewer) =>
                {
                    rel.status = RelationshipStatus::Accepted;
                    rel.requested_by = None;
                    rel.requested_to = None;
                    rel.updated_at = chrono::Utc::now();
                    Ok(Some(rel.clone()))
                }
                _ => Ok(None),
            }
        }

        async fn delete_pending_requested_by(
            &self,
            pair: &PairKey,
            viewer: &Uuid,
        ) -> Result<Option<RelationshipEntity>, error::SystemError> {
            let mut rows = self.rows.lock().unwrap();
            let matches = rows
                .get(&Self::key(pair))
                .map(|rel| {
                    rel.status == RelationshipStatus::Pending
                        && rel.requested_by == Some(*viewer)
                })
                .unwrap_or(false);
            if matches {
                return Ok(rows.remove(&Self::key(pair)));
            }
            Ok(None)
        }

        async fn delete_pending_addressed_to(
            &self,
            pair: &PairKey,
            viewer: &Uuid,
        ) -> Result<Option<RelationshipEntity>, error::SystemError> {
            let mut rows = self.rows.lock().unwrap();
            let matches = rows
                .get(&Self::key(pair))
                .map(|rel| {
                    rel.status == RelationshipStatus::Pending
                        && rel.requested_to == Some(*viewer)
                })
                .unwrap_or(false);
            if matches {
                return Ok(rows.remove(&Self::key(pair)));
            }
            Ok(None)
        }

        async fn delete_accepted(
            &self,
            pair: &PairKey,
        ) -> Result<Option<RelationshipEntity>, error::SystemError> {
            let mut rows = self.rows.lock().unwrap();
            let matches = rows
                .get(&Self::key(pair))
                .map(|rel| rel.status == RelationshipStatus::Accepted)
                .unwrap_or(false);
            if matches {
                return Ok(rows.remove(&Self::key(pair)));
            }
            Ok(None)
        }

        async fn counts(
            &self,
            user_id: &Uuid,
        ) -> Result<RelationshipCounts, error::SystemError> {
            let rows = self.rows.lock().unwrap();
            let mut counts = RelationshipCounts { incoming: 0, outgoing: 0, friends: 0 };
            for rel in rows.values() {
                if rel.user_low != *user_id && rel.user_high != *user_id {
                    continue;
                }
                match rel.status {
                    RelationshipStatus::Accepted => counts.friends += 1,
                    RelationshipStatus::Pending if rel.requested_to == Some(*user_id) => {
                        counts.incoming += 1
                    }
                    RelationshipStatus::Pending if rel.requested_by == Some(*user_id) => {
                        counts.outgoing += 1
                    }
                    RelationshipStatus::Pending => {}
                }
            }
            Ok(counts)
        }

        async fn incoming_for(
            &self,
            user_id: &Uuid,
        ) -> Result<Vec<RelationUserRow>, error::SystemError> {
            let rows = self.rows.lock().unwrap();
            Ok(rows
                .values()
                .filter(|rel| {
                    rel.status == RelationshipStatus::Pending
                        && rel.requested_to == Some(*user_id)
                })
                .map(|rel| Self::user_row(rel, rel.requested_by.unwrap_or_default()))
                .collect())
        }

        async fn outgoing_for(
            &self,
            user_id: &Uuid,
        ) -> Result<Vec<RelationUserRow>, error::SystemError> {
            let rows = self.rows.lock().unwrap();
            Ok(rows
                .values()
                .filter(|rel| {
                    rel.status == RelationshipStatus::Pending
                        && rel.requested_by == Some(*user_id)
                })
                .map(|rel| Self::user_row(rel, rel.requested_to.unwrap_or_default()))
                .collect())
        }

        async fn friends_for(
            &self,
            user_id: &Uuid,
        ) -> Result<Vec<RelationUserRow>, error::SystemError> {
            let rows = self.rows.lock().unwrap();
            Ok(rows
                .values()
                .filter(|rel| {
                    rel.status == RelationshipStatus::Accepted
                        && (rel.user_low == *user_id || rel.user_high == *user_id)
                })
                .map(|rel| {
                    let other =
                        if rel.user_low == *user_id { rel.user_high } else { rel.user_low };
                    Self::user_row(rel, other)
                })
                .collect())
        }
    }

    struct MemUsers {
        users: HashMap<Uuid, UserEntity>,
    }

    impl MemUsers {
        fn new(users: Vec<UserEntity>) -> Self {
            Self { users: users.into_iter().map(|u| (u.id, u)).collect() }
        }
    }

    #[async_trait::async_trait]
    impl UserRepository for MemUsers {
        async fn find_by_id(
            &self,
            id: &Uuid,
        ) -> Result<Option<UserEntity>, error::SystemError> {
            Ok(self.users.get(id).cloned())
        }

        async fn find_by_username(
            &self,
            username: &str,
        ) -> Result<Option<UserEntity>, error::SystemError> {
            Ok(self.users.values().find(|u| u.username == username).cloned())
        }
    }

    #[derive(Default)]
    struct MemNotifications {
        items: Mutex<Vec<NotificationEntity>>,
    }

    #[async_trait::async_trait]
    impl NotificationRepository for MemNotifications {
        async fn append(
            &self,
            recipient_id: &Uuid,
            kind: NotificationKind,
            actor_id: &Uuid,
            message: &str,
            link: &str,
        ) -> Result<NotificationEntity, error::SystemError> {
            let notification = NotificationEntity {
                id: Uuid::now_v7(),
                user_id: *recipient_id,
                kind,
                actor_id: *actor_id,
                message: message.to_string(),
                link: link.to_string(),
                read: false,
                created_at: chrono::Utc::now(),
            };
            self.items.lock().unwrap().push(notification.clone());
            Ok(notification)
        }
    }

    #[derive(Default)]
    struct RecordingPublisher {
        events: Mutex<Vec<RelationshipEvent>>,
    }

    impl EventPublisher for RecordingPublisher {
        fn publish(&self, event: RelationshipEvent) {
            self.events.lock().unwrap().push(event);
        }
    }

    fn user(username: &str) -> UserEntity {
        UserEntity {
            id: Uuid::now_v7(),
            username: username.to_string(),
            display_name: username.to_string(),
            avatar_url: None,
            created_at: chrono::Utc::now(),
        }
    }

    type TestService = RelationshipService<MemRelationships, MemUsers, MemNotifications>;

    struct Harness {
        service: TestService,
        relationships: Arc<MemRelationships>,
        notifications: Arc<MemNotifications>,
        publisher: Arc<RecordingPublisher>,
    }

    impl Harness {
        fn new(users: Vec<UserEntity>) -> Self {
            let relationships = Arc::new(MemRelationships::default());
            let notifications = Arc::new(MemNotifications::default());
            let publisher = Arc::new(RecordingPublisher::default());
            let service = RelationshipService::with_dependencies(
                relationships.clone(),
                Arc::new(MemUsers::new(users)),
                notifications.clone(),
                publisher.clone(),
            );
            Harness { service, relationships, notifications, publisher }
        }

        fn events(&self) -> Vec<RelationshipEvent> {
            self.publisher.events.lock().unwrap().clone()
        }

        fn notifications(&self) -> Vec<NotificationEntity> {
            self.notifications.items.lock().unwrap().clone()
        }
    }

    #[tokio::test]
    async fn request_creates_pending_and_notifies_recipient_only() {
        let alice = user("alice");
        let bob = user("bob");
        let h = Harness::new(vec![alice.clone(), bob.clone()]);

        let status = h.service.request(alice.id, TargetRef::Id(bob.id)).await.unwrap();
        assert_eq!(status, DerivedStatus::Pending);

        let events = h.events();
        assert_eq!(events.len(), 1);
        assert!(matches!(
            events[0],
            RelationshipEvent::RequestCreated { from_user_id, to_user_id, .. }
                if from_user_id == alice.id && to_user_id == bob.id
        ));

        let notifications = h.notifications();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].user_id, bob.id);
        assert_eq!(notifications[0].kind, NotificationKind::FriendRequest);
        assert_eq!(notifications[0].actor_id, alice.id);
    }

    #[tokio::test]
    async fn repeated_request_is_idempotent() {
        let alice = user("alice");
        let bob = user("bob");
        let h = Harness::new(vec![alice.clone(), bob.clone()]);

        h.service.request(alice.id, TargetRef::Id(bob.id)).await.unwrap();
        let status = h.service.request(alice.id, TargetRef::Id(bob.id)).await.unwrap();

        assert_eq!(status, DerivedStatus::Pending);
        assert_eq!(h.events().len(), 1, "no duplicate event");
        assert_eq!(h.notifications().len(), 1, "no duplicate notification");
        assert_eq!(h.relationships.row_count(), 1);
    }

    #[tokio::test]
    async fn crossed_requests_resolve_to_friendship() {
        let alice = user("alice");
        let bob = user("bob");
        let h = Harness::new(vec![alice.clone(), bob.clone()]);

        h.service.request(alice.id, TargetRef::Id(bob.id)).await.unwrap();
        let status = h.service.request(bob.id, TargetRef::Id(alice.id)).await.unwrap();
        assert_eq!(status, DerivedStatus::Friends);

        // Never two pending rows: the pair collapses to one accepted record.
        assert_eq!(h.relationships.row_count(), 1);
        let pair = PairKey::new(alice.id, bob.id);
        let rel = h.relationships.find_by_pair(&pair).await.unwrap().unwrap();
        assert_eq!(rel.status, RelationshipStatus::Accepted);
        assert_eq!(rel.requested_by, None);
        assert_eq!(rel.requested_to, None);

        let events = h.events();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[1], RelationshipEvent::Accepted { .. }));

        // The accept notification goes to the original requester.
        let notifications = h.notifications();
        assert_eq!(notifications.len(), 2);
        assert_eq!(notifications[1].user_id, alice.id);
        assert_eq!(notifications[1].kind, NotificationKind::FriendAccept);

        assert_eq!(
            h.service.status(alice.id, TargetRef::Id(bob.id)).await.unwrap(),
            DerivedStatus::Friends
        );
        assert_eq!(
            h.service.status(bob.id, TargetRef::Id(alice.id)).await.unwrap(),
            DerivedStatus::Friends
        );
    }

    #[tokio::test]
    async fn accept_only_succeeds_for_the_addressee() {
        let alice = user("alice");
        let bob = user("bob");
        let h = Harness::new(vec![alice.clone(), bob.clone()]);

        h.service.request(alice.id, TargetRef::Id(bob.id)).await.unwrap();

        // The requester cannot accept their own request: state unchanged.
        let status = h.service.accept(alice.id, TargetRef::Id(bob.id)).await.unwrap();
        assert_eq!(status, DerivedStatus::Pending);
        assert_eq!(h.events().len(), 1);

        let status = h.service.accept(bob.id, TargetRef::Id(alice.id)).await.unwrap();
        assert_eq!(status, DerivedStatus::Friends);
        assert_eq!(h.events().len(), 2);

        let notifications = h.notifications();
        assert_eq!(notifications.len(), 2);
        assert_eq!(notifications[1].user_id, alice.id);
        assert_eq!(notifications[1].kind, NotificationKind::FriendAccept);
    }

    #[tokio::test]
    async fn cancel_only_succeeds_for_the_requester() {
        let alice = user("alice");
        let bob = user("bob");
        let h = Harness::new(vec![alice.clone(), bob.clone()]);

        h.service.request(alice.id, TargetRef::Id(bob.id)).await.unwrap();

        // The addressee cannot cancel: they still see the incoming request.
        let status = h.service.cancel(bob.id, TargetRef::Id(alice.id)).await.unwrap();
        assert_eq!(status, DerivedStatus::Incoming);
        assert_eq!(h.relationships.row_count(), 1);

        let status = h.service.cancel(alice.id, TargetRef::Id(bob.id)).await.unwrap();
        assert_eq!(status, DerivedStatus::None);
        assert_eq!(h.relationships.row_count(), 0);

        let events = h.events();
        assert_eq!(events.len(), 2);
        assert!(matches!(
            events[1],
            RelationshipEvent::RequestCanceled { from_user_id, to_user_id }
                if from_user_id == alice.id && to_user_id == bob.id
        ));

        assert_eq!(
            h.service.status(bob.id, TargetRef::Id(alice.id)).await.unwrap(),
            DerivedStatus::None
        );
    }

    #[tokio::test]
    async fn decline_only_succeeds_for_the_addressee() {
        let alice = user("alice");
        let bob = user("bob");
        let h = Harness::new(vec![alice.clone(), bob.clone()]);

        h.service.request(alice.id, TargetRef::Id(bob.id)).await.unwrap();

        let status = h.service.decline(alice.id, TargetRef::Id(bob.id)).await.unwrap();
        assert_eq!(status, DerivedStatus::Pending, "requester cannot decline");
        assert_eq!(h.relationships.row_count(), 1);

        let status = h.service.decline(bob.id, TargetRef::Id(alice.id)).await.unwrap();
        assert_eq!(status, DerivedStatus::None);
        assert_eq!(h.relationships.row_count(), 0);

        let events = h.events();
        assert!(matches!(
            events[1],
            RelationshipEvent::Declined { from_user_id, to_user_id }
                if from_user_id == alice.id && to_user_id == bob.id
        ));

        // Declines notify nobody.
        assert_eq!(h.notifications().len(), 1);
    }

    #[tokio::test]
    async fn unfriend_deletes_the_record_for_both_sides() {
        let alice = user("alice");
        let bob = user("bob");
        let h = Harness::new(vec![alice.clone(), bob.clone()]);

        h.service.request(alice.id, TargetRef::Id(bob.id)).await.unwrap();
        h.service.accept(bob.id, TargetRef::Id(alice.id)).await.unwrap();

        let status = h.service.unfriend(alice.id, TargetRef::Id(bob.id)).await.unwrap();
        assert_eq!(status, DerivedStatus::None);
        assert_eq!(h.relationships.row_count(), 0, "no tombstone");

        assert!(matches!(h.events()[2], RelationshipEvent::Removed { .. }));

        assert_eq!(
            h.service.status(alice.id, TargetRef::Id(bob.id)).await.unwrap(),
            DerivedStatus::None
        );
        assert_eq!(
            h.service.status(bob.id, TargetRef::Id(alice.id)).await.unwrap(),
            DerivedStatus::None
        );
    }

    #[tokio::test]
    async fn unfriend_on_pending_is_a_no_op() {
        let alice = user("alice");
        let bob = user("bob");
        let h = Harness::new(vec![alice.clone(), bob.clone()]);

        h.service.request(alice.id, TargetRef::Id(bob.id)).await.unwrap();

        let status = h.service.unfriend(alice.id, TargetRef::Id(bob.id)).await.unwrap();
        assert_eq!(status, DerivedStatus::Pending);
        assert_eq!(h.relationships.row_count(), 1);
    }

    #[tokio::test]
    async fn self_reference_is_invalid_for_mutations() {
        let alice = user("alice");
        let h = Harness::new(vec![alice.clone()]);

        let err = h.service.request(alice.id, TargetRef::Id(alice.id)).await.unwrap_err();
        assert!(matches!(err, error::SystemError::BadRequest(_)));

        // status() reports "self" instead of failing.
        let status = h.service.status(alice.id, TargetRef::Id(alice.id)).await.unwrap();
        assert_eq!(status, DerivedStatus::Myself);
    }

    #[tokio::test]
    async fn unresolved_target_is_not_found() {
        let alice = user("alice");
        let h = Harness::new(vec![alice.clone()]);

        let err = h
            .service
            .request(alice.id, TargetRef::Username("nobody".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, error::SystemError::NotFound(_)));
    }

    #[tokio::test]
    async fn username_targets_resolve_through_identity_lookup() {
        let alice = user("alice");
        let bob = user("bob");
        let h = Harness::new(vec![alice.clone(), bob.clone()]);

        let status = h
            .service
            .request(alice.id, TargetRef::Username("bob".to_string()))
            .await
            .unwrap();
        assert_eq!(status, DerivedStatus::Pending);
        assert_eq!(
            h.service.status(bob.id, TargetRef::Username("alice".to_string())).await.unwrap(),
            DerivedStatus::Incoming
        );
    }

    #[tokio::test]
    async fn counts_split_by_direction_and_membership() {
        let alice = user("alice");
        let bob = user("bob");
        let carol = user("carol");
        let dave = user("dave");
        let h = Harness::new(vec![alice.clone(), bob.clone(), carol.clone(), dave.clone()]);

        h.service.request(bob.id, TargetRef::Id(alice.id)).await.unwrap();
        h.service.request(alice.id, TargetRef::Id(carol.id)).await.unwrap();
        h.service.request(alice.id, TargetRef::Id(dave.id)).await.unwrap();
        h.service.accept(dave.id, TargetRef::Id(alice.id)).await.unwrap();

        let counts = h.service.counts(alice.id).await.unwrap();
        assert_eq!(counts.incoming, 1);
        assert_eq!(counts.outgoing, 1);
        assert_eq!(counts.friends, 1);
    }

    #[tokio::test]
    async fn list_reads_embed_the_counterparty() {
        let alice = user("alice");
        let bob = user("bob");
        let h = Harness::new(vec![alice.clone(), bob.clone()]);

        h.service.request(alice.id, TargetRef::Id(bob.id)).await.unwrap();

        let outgoing = h.service.outgoing(alice.id).await.unwrap();
        assert_eq!(outgoing.len(), 1);
        assert_eq!(outgoing[0].from_user_id, Some(alice.id));
        assert_eq!(outgoing[0].to_user_id, Some(bob.id));
        assert_eq!(outgoing[0].user.id, bob.id);

        let incoming = h.service.incoming(bob.id).await.unwrap();
        assert_eq!(incoming.len(), 1);
        assert_eq!(incoming[0].user.id, alice.id);
    }
}

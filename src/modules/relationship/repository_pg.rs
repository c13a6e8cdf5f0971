use uuid::Uuid;

use crate::{
    api::error,
    modules::relationship::{
        model::{PairKey, RelationUserRow, RelationshipCounts},
        repository::RelationshipRepository,
        schema::RelationshipEntity,
    },
};

#[derive(Clone)]
pub struct RelationshipRepositoryPg {
    pool: sqlx::PgPool,
}

impl RelationshipRepositoryPg {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl RelationshipRepository for RelationshipRepositoryPg {
    async fn find_by_pair(
        &self,
        pair: &PairKey,
    ) -> Result<Option<RelationshipEntity>, error::SystemError> {
        let relationship = sqlx::query_as::<_, RelationshipEntity>(
            "SELECT * FROM relationships WHERE user_low = $1 AND user_high = $2",
        )
        .bind(pair.low())
        .bind(pair.high())
        .fetch_optional(&self.pool)
        .await?;

        Ok(relationship)
    }

    async fn try_create_pending(
        &self,
        pair: &PairKey,
        requester: &Uuid,
        recipient: &Uuid,
    ) -> Result<Option<RelationshipEntity>, error::SystemError> {
        // ON CONFLICT DO NOTHING absorbs the create race: the loser observes no
        // returned row and falls through to the update/select path.
        let relationship = sqlx::query_as::<_, RelationshipEntity>(
            r#"
            INSERT INTO relationships (user_low, user_high, status, requested_by, requested_to)
            VALUES ($1, $2, 'pending', $3, $4)
            ON CONFLICT (user_low, user_high) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(pair.low())
        .bind(pair.high())
        .bind(requester)
        .bind(recipient)
        .fetch_optional(&self.pool)
        .await?;

        Ok(relationship)
    }

    async fn accept_pending_addressed_to(
        &self,
        pair: &PairKey,
        viewer: &Uuid,
    ) -> Result<Option<RelationshipEntity>, error::SystemError> {
        let relationship = sqlx::query_as::<_, RelationshipEntity>(
            r#"
            UPDATE relationships
            SET status = 'accepted', requested_by = NULL, requested_to = NULL, updated_at = now()
            WHERE user_low = $1 AND user_high = $2
              AND status = 'pending' AND requested_to = $3
            RETURNING *
            "#,
        )
        .bind(pair.low())
        .bind(pair.high())
        .bind(viewer)
        .fetch_optional(&self.pool)
        .await?;

        Ok(relationship)
    }

    async fn delete_pending_requested_by(
        &self,
        pair: &PairKey,
        viewer: &Uuid,
    ) -> Result<Option<RelationshipEntity>, error::SystemError> {
        let relationship = sqlx::query_as::<_, RelationshipEntity>(
            r#"
            DELETE FROM relationships
            WHERE user_low = $1 AND user_high = $2
              AND status = 'pending' AND requested_by = $3
            RETURNING *
            "#,
        )
        .bind(pair.low())
        .bind(pair.high())
        .bind(viewer)
        .fetch_optional(&self.pool)
        .await?;

        Ok(relationship)
    }

    async fn delete_pending_addressed_to(
        &self,
        pair: &PairKey,
        viewer: &Uuid,
    ) -> Result<Option<RelationshipEntity>, error::SystemError> {
        let relationship = sqlx::query_as::<_, RelationshipEntity>(
            r#"
            DELETE FROM relationships
            WHERE user_low = $1 AND user_high = $2
              AND status = 'pending' AND requested_to = $3
            RETURNING *
            "#,
        )
        .bind(pair.low())
        .bind(pair.high())
        .bind(viewer)
        .fetch_optional(&self.pool)
        .await?;

        Ok(relationship)
    }

    async fn delete_accepted(
        &self,
        pair: &PairKey,
    ) -> Result<Option<RelationshipEntity>, error::SystemError> {
        let relationship = sqlx::query_as::<_, RelationshipEntity>(
            r#"
            DELETE FROM relationships
            WHERE user_low = $1 AND user_high = $2 AND status = 'accepted'
            RETURNING *
            "#,
        )
        .bind(pair.low())
        .bind(pair.high())
        .fetch_optional(&self.pool)
        .await?;

        Ok(relationship)
    }

    async fn counts(&self, user_id: &Uuid) -> Result<RelationshipCounts, error::SystemError> {
        let counts = sqlx::query_as::<_, RelationshipCounts>(
            r#"
            SELECT
                COUNT(*) FILTER (WHERE status = 'pending' AND requested_to = $1) AS incoming,
                COUNT(*) FILTER (WHERE status = 'pending' AND requested_by = $1) AS outgoing,
                COUNT(*) FILTER (WHERE status = 'accepted') AS friends
            FROM relationships
            WHERE user_low = $1 OR user_high = $1
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(counts)
    }

    async fn incoming_for(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<RelationUserRow>, error::SystemError> {
        let rows = sqlx::query_as::<_, RelationUserRow>(
            r#"
            SELECT
                r.id,
                r.requested_by AS from_user_id,
                r.requested_to AS to_user_id,
                u.id AS user_id,
                u.username,
                u.display_name,
                u.avatar_url,
                r.created_at
            FROM relationships r
            JOIN users u
                ON u.id = r.requested_by
            WHERE r.status = 'pending' AND r.requested_to = $1
            ORDER BY r.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn outgoing_for(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<RelationUserRow>, error::SystemError> {
        let rows = sqlx::query_as::<_, RelationUserRow>(
            r#"
            SELECT
                r.id,
                r.requested_by AS from_user_id,
                r.requested_to AS to_user_id,
                u.id AS user_id,
                u.username,
                u.display_name,
                u.avatar_url,
                r.created_at
            FROM relationships r
            JOIN users u
                ON u.id = r.requested_to
            WHERE r.status = 'pending' AND r.requested_by = $1
            ORDER BY r.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn friends_for(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<RelationUserRow>, error::SystemError> {
        let rows = sqlx::query_as::<_, RelationUserRow>(
            r#"
            SELECT
                r.id,
                r.requested_by AS from_user_id,
                r.requested_to AS to_user_id,
                u.id AS user_id,
                u.username,
                u.display_name,
                u.avatar_url,
                r.created_at
            FROM relationships r
            JOIN users u
                ON u.id = CASE
                    WHEN r.user_low = $1 THEN r.user_high
                    ELSE r.user_low
                END
            WHERE r.status = 'accepted'
              AND (r.user_low = $1 OR r.user_high = $1)
            ORDER BY r.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}

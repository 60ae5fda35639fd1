//! Maintenance of many-to-many join tables.
//!
//! The store has no cascading deletes, so join rows are inserted and removed
//! here explicitly. A delta is applied adds first, then removes, in list order
//! and without deduplication. Every write goes through the caller's
//! connection, normally an open transaction, so an error leaves nothing behind
//! once the transaction is dropped.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, IntoActiveModel,
    PrimaryKeyTrait, QueryFilter, QuerySelect, Value,
};
use tracing::{debug, error};
use uuid::Uuid;

use crate::entities::{account_role, category_news, menu_role};
use crate::errors::ServiceError;

/// Column layout of a join table seen from one side.
#[derive(Debug, Clone, Copy)]
pub struct Link<E: EntityTrait> {
    pub id: E::Column,
    pub owner: E::Column,
    pub reference: E::Column,
}

impl<E: EntityTrait> Link<E> {
    /// Same table seen from the other side.
    pub fn flipped(self) -> Self {
        Self {
            id: self.id,
            owner: self.reference,
            reference: self.owner,
        }
    }
}

/// category -> news
pub fn category_news_link() -> Link<category_news::Entity> {
    Link {
        id: category_news::Column::Id,
        owner: category_news::Column::CategoryId,
        reference: category_news::Column::NewsId,
    }
}

/// menu -> role
pub fn menu_role_link() -> Link<menu_role::Entity> {
    Link {
        id: menu_role::Column::Id,
        owner: menu_role::Column::MenuId,
        reference: menu_role::Column::RoleId,
    }
}

/// account -> role
pub fn account_role_link() -> Link<account_role::Entity> {
    Link {
        id: account_role::Column::Id,
        owner: account_role::Column::AccountId,
        reference: account_role::Column::RoleId,
    }
}

/// What to do when an added pair already exists.
#[derive(Debug, Clone)]
pub enum OnDuplicate {
    /// Abort the whole operation with this conflict message
    Conflict(String),
    /// Leave the existing row alone and continue
    Skip,
}

/// Which rows a removal targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveScope {
    /// Only the (owner, reference) pair
    Pair,
    /// Every row carrying the reference, whichever owner it belongs to
    AnyOwner,
}

#[derive(Debug, Clone)]
pub struct DeltaPolicy {
    pub on_duplicate: OnDuplicate,
    pub remove_scope: RemoveScope,
}

/// Add/remove lists of referenced ids. Callers resolve the lists first and
/// drop references that do not exist.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssociationDelta {
    pub add: Vec<Uuid>,
    pub remove: Vec<Uuid>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeltaOutcome {
    pub added: u64,
    pub removed: u64,
}

pub async fn pair_exists<C, E>(db: &C, link: &Link<E>, owner: Uuid, reference: Uuid) -> Result<bool, ServiceError>
where
    C: ConnectionTrait,
    E: EntityTrait,
{
    let found = E::find()
        .filter(link.owner.eq(owner))
        .filter(link.reference.eq(reference))
        .one(db)
        .await?;
    Ok(found.is_some())
}

pub async fn insert_pair<C, E>(db: &C, link: &Link<E>, owner: Uuid, reference: Uuid) -> Result<(), ServiceError>
where
    C: ConnectionTrait,
    E: EntityTrait,
    E::ActiveModel: ActiveModelTrait<Entity = E> + Send,
    E::Model: IntoActiveModel<E::ActiveModel>,
{
    let mut row = <E::ActiveModel as ActiveModelTrait>::default();
    row.set(link.id, Value::from(Uuid::new_v4()));
    row.set(link.owner, Value::from(owner));
    row.set(link.reference, Value::from(reference));
    E::insert(row).exec_without_returning(db).await?;
    Ok(())
}

/// Removes the (owner, reference) pair, or every row carrying `reference`
/// when the scope is [`RemoveScope::AnyOwner`].
pub async fn remove_reference<C, E>(
    db: &C,
    link: &Link<E>,
    owner: Uuid,
    reference: Uuid,
    scope: RemoveScope,
) -> Result<u64, ServiceError>
where
    C: ConnectionTrait,
    E: EntityTrait,
{
    let mut delete = E::delete_many().filter(link.reference.eq(reference));
    if scope == RemoveScope::Pair {
        delete = delete.filter(link.owner.eq(owner));
    }
    let result = delete.exec(db).await?;
    Ok(result.rows_affected)
}

/// Removes every join row owned by `owner`.
pub async fn remove_owner<C, E>(db: &C, link: &Link<E>, owner: Uuid) -> Result<u64, ServiceError>
where
    C: ConnectionTrait,
    E: EntityTrait,
{
    let result = E::delete_many()
        .filter(link.owner.eq(owner))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}

/// Referenced ids linked to `owner`, in storage order.
pub async fn references_of<C, E>(db: &C, link: &Link<E>, owner: Uuid) -> Result<Vec<Uuid>, ServiceError>
where
    C: ConnectionTrait,
    E: EntityTrait,
{
    let ids = E::find()
        .select_only()
        .column(link.reference)
        .filter(link.owner.eq(owner))
        .into_tuple::<Uuid>()
        .all(db)
        .await?;
    Ok(ids)
}

/// Keeps the ids whose row exists in `E`, preserving order and repeats.
pub async fn existing_ids<C, E>(db: &C, ids: &[Uuid]) -> Result<Vec<Uuid>, ServiceError>
where
    C: ConnectionTrait,
    E: EntityTrait,
    <E::PrimaryKey as PrimaryKeyTrait>::ValueType: From<Uuid>,
{
    let mut existing = Vec::with_capacity(ids.len());
    for id in ids {
        if E::find_by_id(*id).one(db).await?.is_some() {
            existing.push(*id);
        } else {
            debug!(reference = %id, "Skipping missing association reference");
        }
    }
    Ok(existing)
}

/// Applies `delta` to the join table for `owner`.
///
/// Stops at the first duplicate when the policy says so; rows written before
/// that point are only discarded if `db` is a transaction that is not
/// committed.
pub async fn apply_delta<C, E>(
    db: &C,
    link: &Link<E>,
    owner: Uuid,
    delta: &AssociationDelta,
    policy: &DeltaPolicy,
) -> Result<DeltaOutcome, ServiceError>
where
    C: ConnectionTrait,
    E: EntityTrait,
    E::ActiveModel: ActiveModelTrait<Entity = E> + Send,
    E::Model: IntoActiveModel<E::ActiveModel>,
{
    let mut outcome = DeltaOutcome::default();

    for reference in &delta.add {
        if pair_exists(db, link, owner, *reference).await? {
            match &policy.on_duplicate {
                OnDuplicate::Conflict(message) => {
                    error!(%owner, %reference, "{}", message);
                    return Err(ServiceError::Conflict(message.clone()));
                }
                OnDuplicate::Skip => continue,
            }
        }
        insert_pair(db, link, owner, *reference).await?;
        outcome.added += 1;
    }

    for reference in &delta.remove {
        outcome.removed += remove_reference(db, link, owner, *reference, policy.remove_scope).await?;
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{establish_connection, run_migrations, DbConfig};
    use crate::entities::category_news;
    use assert_matches::assert_matches;
    use sea_orm::{DatabaseConnection, PaginatorTrait, TransactionTrait};

    async fn memory_db() -> DatabaseConnection {
        let db = establish_connection(&DbConfig {
            url: "sqlite::memory:".into(),
            max_connections: 1,
            ..Default::default()
        })
        .await
        .unwrap();
        run_migrations(&db).await.unwrap();
        db
    }

    fn conflict(message: &str) -> DeltaPolicy {
        DeltaPolicy {
            on_duplicate: OnDuplicate::Conflict(message.into()),
            remove_scope: RemoveScope::AnyOwner,
        }
    }

    async fn rows(db: &DatabaseConnection) -> u64 {
        category_news::Entity::find().count(db).await.unwrap()
    }

    #[tokio::test]
    async fn duplicate_add_conflicts_and_keeps_one_row() {
        let db = memory_db().await;
        let link = category_news_link();
        let (category, news) = (Uuid::new_v4(), Uuid::new_v4());
        let delta = AssociationDelta {
            add: vec![news],
            remove: vec![],
        };

        let first = apply_delta(&db, &link, category, &delta, &conflict("dup")).await.unwrap();
        assert_eq!(first.added, 1);

        let second = apply_delta(&db, &link, category, &delta, &conflict("dup")).await;
        assert_matches!(second, Err(ServiceError::Conflict(msg)) if msg == "dup");
        assert_eq!(rows(&db).await, 1);
    }

    #[tokio::test]
    async fn skip_policy_ignores_existing_pairs() {
        let db = memory_db().await;
        let link = category_news_link().flipped();
        let (news, category) = (Uuid::new_v4(), Uuid::new_v4());
        let policy = DeltaPolicy {
            on_duplicate: OnDuplicate::Skip,
            remove_scope: RemoveScope::AnyOwner,
        };
        let delta = AssociationDelta {
            add: vec![category, category],
            remove: vec![],
        };

        let outcome = apply_delta(&db, &link, news, &delta, &policy).await.unwrap();
        assert_eq!(outcome.added, 1);
        assert_eq!(references_of(&db, &link, news).await.unwrap(), vec![category]);
    }

    #[tokio::test]
    async fn remove_scope_controls_reach() {
        let db = memory_db().await;
        let link = category_news_link();
        let (first, second, news) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        insert_pair(&db, &link, first, news).await.unwrap();
        insert_pair(&db, &link, second, news).await.unwrap();

        let removed = remove_reference(&db, &link, first, news, RemoveScope::Pair).await.unwrap();
        assert_eq!(removed, 1);
        assert_eq!(rows(&db).await, 1);

        insert_pair(&db, &link, first, news).await.unwrap();
        let removed = remove_reference(&db, &link, first, news, RemoveScope::AnyOwner).await.unwrap();
        assert_eq!(removed, 2);
        assert_eq!(rows(&db).await, 0);
    }

    #[tokio::test]
    async fn aborted_transaction_leaves_no_rows() {
        let db = memory_db().await;
        let link = category_news_link();
        let category = Uuid::new_v4();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        insert_pair(&db, &link, category, b).await.unwrap();

        let txn = db.begin().await.unwrap();
        let delta = AssociationDelta {
            add: vec![a, b],
            remove: vec![],
        };
        let result = apply_delta(&txn, &link, category, &delta, &conflict("dup")).await;
        assert!(result.is_err());
        drop(txn);

        assert!(!pair_exists(&db, &link, category, a).await.unwrap());
        assert_eq!(rows(&db).await, 1);
    }
}

//! # Member Repository

use std::sync::Arc;

use tracing::debug;

use shelf_core::{Member, MemberUpdate, NewMember};

use super::MEMBERS_TABLE;
use crate::error::DbResult;
use crate::query::{Filter, Query};
use crate::store::{decode_row, decode_rows, to_row, DataStore};

/// Repository for the `members` table.
#[derive(Clone)]
pub struct MemberRepository {
    store: Arc<dyn DataStore>,
}

impl MemberRepository {
    /// Creates a new MemberRepository.
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        MemberRepository { store }
    }

    /// Inserts a member and returns it with its assigned id.
    pub async fn insert(&self, member: &NewMember) -> DbResult<Member> {
        debug!(name = %member.name, "Inserting member");
        let row = self.store.insert(MEMBERS_TABLE, to_row(member)?).await?;
        decode_row(row)
    }

    /// Gets a member by id.
    ///
    /// ## Returns
    /// * `Ok(Some(Member))` - Member found
    /// * `Ok(None)` - No member with this id
    pub async fn get(&self, member_id: i64) -> DbResult<Option<Member>> {
        let rows = self
            .store
            .select(&Query::from(MEMBERS_TABLE).eq("member_id", member_id))
            .await?;
        Ok(decode_rows(rows)?.into_iter().next())
    }

    /// Applies the supplied fields; returns the updated rows (empty if the id is unknown).
    pub async fn update(&self, member_id: i64, update: &MemberUpdate) -> DbResult<Vec<Member>> {
        debug!(member_id, "Updating member");
        let rows = self
            .store
            .update(MEMBERS_TABLE, to_row(update)?, &[Filter::eq("member_id", member_id)])
            .await?;
        decode_rows(rows)
    }

    /// Deletes a member; returns the deleted rows.
    pub async fn delete(&self, member_id: i64) -> DbResult<Vec<Member>> {
        debug!(member_id, "Deleting member");
        let rows = self
            .store
            .delete(MEMBERS_TABLE, &[Filter::eq("member_id", member_id)])
            .await?;
        decode_rows(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;

    fn repo() -> MemberRepository {
        MemberRepository::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn test_insert_get_update_delete() {
        let repo = repo();
        let ada = repo
            .insert(&NewMember {
                name: "Ada".into(),
                email: "ada@example.com".into(),
            })
            .await
            .unwrap();
        assert_eq!(ada.member_id, 1);

        assert_eq!(repo.get(1).await.unwrap(), Some(ada.clone()));
        assert_eq!(repo.get(2).await.unwrap(), None);

        let updated = repo
            .update(
                1,
                &MemberUpdate {
                    email: Some("ada@lovelace.org".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated[0].email, "ada@lovelace.org");
        assert_eq!(updated[0].name, "Ada");

        assert_eq!(repo.delete(1).await.unwrap().len(), 1);
        assert!(repo.delete(1).await.unwrap().is_empty());
    }
}

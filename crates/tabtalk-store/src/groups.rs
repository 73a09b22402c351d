use tabtalk_shared::RecordId;

use crate::database::Database;
use crate::error::Result;
use crate::models::{Group, GroupIndex, GroupPatch, NewGroup};

impl Database {
    pub fn create_group(&mut self, group: NewGroup) -> Result<Group> {
        let group: Group = self.insert(group)?;
        tracing::info!(id = %group.id, name = %group.name, members = group.members.len(), "created group");
        Ok(group)
    }

    pub fn get_group(&self, id: &RecordId) -> Result<Option<Group>> {
        self.get(id)
    }

    pub fn list_groups_for_user(&self, user_id: &RecordId) -> Result<Vec<Group>> {
        self.get_by_index::<Group>(GroupIndex::Members, user_id)
    }

    pub fn update_group(&mut self, id: &RecordId, patch: GroupPatch) -> Result<Group> {
        self.update(id, patch)
    }
}

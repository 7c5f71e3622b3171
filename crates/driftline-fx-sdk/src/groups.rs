use serde::{Deserialize, Serialize};

/// Identity of a presentational control group.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct GroupId(pub u16);

impl GroupId {
    pub const fn new(raw: u16) -> Self {
        Self(raw)
    }
}

/// Label shown for lookups against an unknown group id in release builds.
pub const FALLBACK_GROUP_LABEL: &str = "Other";

/// One control group: display label plus a vertical layout slot consumed by
/// the presentation shell. Has no effect on audio.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupDef {
    pub id: GroupId,
    pub label: String,
    pub layout_slot: i32,
}

impl GroupDef {
    pub fn new(id: GroupId, label: impl Into<String>, layout_slot: i32) -> Self {
        Self {
            id,
            label: label.into(),
            layout_slot,
        }
    }
}

/// Immutable per-effect-type group table, built once at registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupTable {
    groups: Vec<GroupDef>,
}

impl GroupTable {
    pub fn new(groups: Vec<GroupDef>) -> Self {
        for pair in groups.windows(2) {
            assert!(
                pair[1].id > pair[0].id,
                "group ids must be strictly increasing"
            );
        }
        Self { groups }
    }

    pub fn iter(&self) -> impl Iterator<Item = &GroupDef> {
        self.groups.iter()
    }

    fn find(&self, id: GroupId) -> Option<&GroupDef> {
        self.groups.binary_search_by(|g| g.id.cmp(&id)).ok().map(|i| &self.groups[i])
    }

    /// Display label for a group. Unknown ids are a programming error: fatal
    /// in debug builds, mapped to [`FALLBACK_GROUP_LABEL`] in release.
    pub fn label_for(&self, id: GroupId) -> &str {
        match self.find(id) {
            Some(group) => &group.label,
            None => {
                debug_assert!(false, "label for unknown group {id:?}");
                log::warn!("unknown control group {id:?}, using fallback label");
                FALLBACK_GROUP_LABEL
            }
        }
    }

    /// Vertical layout slot for a group; unknown ids fall back to slot 0
    /// under the same policy as [`label_for`](Self::label_for).
    pub fn layout_slot_for(&self, id: GroupId) -> i32 {
        match self.find(id) {
            Some(group) => group.layout_slot,
            None => {
                debug_assert!(false, "layout slot for unknown group {id:?}");
                0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> GroupTable {
        GroupTable::new(vec![
            GroupDef::new(GroupId::new(0), "Delay", 0),
            GroupDef::new(GroupId::new(1), "Warp", 1),
        ])
    }

    #[test]
    fn known_groups_resolve() {
        let table = table();
        assert_eq!(table.label_for(GroupId::new(1)), "Warp");
        assert_eq!(table.layout_slot_for(GroupId::new(1)), 1);
    }

    #[test]
    fn unknown_group_falls_back_in_release() {
        if cfg!(debug_assertions) {
            return;
        }
        let table = table();
        assert_eq!(table.label_for(GroupId::new(9)), FALLBACK_GROUP_LABEL);
        assert_eq!(table.layout_slot_for(GroupId::new(9)), 0);
    }
}

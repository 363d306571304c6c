use std::collections::HashMap;

use crate::compute::{FieldDesc, FieldId};
use crate::error::{EngineError, EngineResult};

/// Backend-owned storage for fields.
///
/// Fields are addressed by `FieldId`; the logical label is a secondary
/// index (the most recent field created under a label wins).
#[derive(Debug)]
pub struct FieldArena<T> {
    entries: Vec<(FieldDesc, T)>,
    by_label: HashMap<String, FieldId>,
}

impl<T> Default for FieldArena<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            by_label: HashMap::new(),
        }
    }
}

impl<T> FieldArena<T> {
    pub fn insert(&mut self, desc: FieldDesc, payload: T) -> FieldId {
        let id = FieldId(self.entries.len() as u32);
        self.by_label.insert(desc.label.clone(), id);
        self.entries.push((desc, payload));
        id
    }

    pub fn desc(&self, id: FieldId) -> EngineResult<&FieldDesc> {
        self.entry(id).map(|(desc, _)| desc)
    }

    pub fn get(&self, id: FieldId) -> EngineResult<&T> {
        self.entry(id).map(|(_, payload)| payload)
    }

    pub fn get_mut(&mut self, id: FieldId) -> EngineResult<&mut T> {
        self.entries
            .get_mut(id.0 as usize)
            .map(|(_, payload)| payload)
            .ok_or_else(|| missing(id))
    }

    pub fn entry(&self, id: FieldId) -> EngineResult<&(FieldDesc, T)> {
        self.entries.get(id.0 as usize).ok_or_else(|| missing(id))
    }

    pub fn by_label(&self, label: &str) -> Option<FieldId> {
        self.by_label.get(label).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn missing(id: FieldId) -> EngineError {
    EngineError::ResourceNotFound {
        resource_type: "field".to_string(),
        id: format!("{:?}", id),
    }
}

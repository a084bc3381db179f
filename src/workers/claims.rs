//! Process-local set of videos currently inside the conversion pipeline.

use dashmap::DashSet;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone, Default, Debug)]
pub struct ClaimSet {
    inner: Arc<DashSet<Uuid>>,
}

impl ClaimSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims `id` if nobody holds it. The claim is released when the guard drops.
    pub fn try_claim(&self, id: Uuid) -> Option<ClaimGuard> {
        if self.inner.insert(id) {
            Some(ClaimGuard {
                id,
                claims: self.clone(),
            })
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn ids(&self) -> Vec<Uuid> {
        self.inner.iter().map(|id| *id).collect()
    }
}

#[derive(Debug)]
pub struct ClaimGuard {
    id: Uuid,
    claims: ClaimSet,
}

impl Drop for ClaimGuard {
    fn drop(&mut self) {
        self.claims.inner.remove(&self.id);
    }
}

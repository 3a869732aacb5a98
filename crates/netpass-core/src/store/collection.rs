// ── Tenant-keyed record table ──
//
// `DashMap` storage with a secondary (tenant, name) index. The index entry
// is claimed before the row is written, so two writers racing for the same
// name cannot both succeed.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use uuid::Uuid;

use crate::model::{SubscriberCredential, TenantId, Voucher};

/// A record addressable by id and by a tenant-unique name.
pub(crate) trait Keyed: Clone {
    fn id(&self) -> Uuid;
    fn tenant_id(&self) -> TenantId;
    fn name(&self) -> &str;
}

impl Keyed for Voucher {
    fn id(&self) -> Uuid {
        self.id
    }
    fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }
    fn name(&self) -> &str {
        &self.code
    }
}

impl Keyed for SubscriberCredential {
    fn id(&self) -> Uuid {
        self.id
    }
    fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }
    fn name(&self) -> &str {
        &self.username
    }
}

pub(crate) struct TenantTable<T: Keyed> {
    by_id: DashMap<Uuid, T>,
    by_name: DashMap<(TenantId, String), Uuid>,
}

impl<T: Keyed> TenantTable<T> {
    pub(crate) fn new() -> Self {
        Self {
            by_id: DashMap::new(),
            by_name: DashMap::new(),
        }
    }

    /// Insert a new row. Hands the row back if its name is taken.
    pub(crate) fn insert_unique(&self, row: T) -> Result<(), T> {
        let key = (row.tenant_id(), row.name().to_owned());
        match self.by_name.entry(key) {
            Entry::Occupied(_) => Err(row),
            Entry::Vacant(slot) => {
                let id = row.id();
                self.by_id.insert(id, row);
                slot.insert(id);
                Ok(())
            }
        }
    }

    /// Look up by id, hiding rows of other tenants.
    pub(crate) fn get(&self, tenant: TenantId, id: Uuid) -> Option<T> {
        self.by_id
            .get(&id)
            .filter(|r| r.tenant_id() == tenant)
            .map(|r| r.value().clone())
    }

    pub(crate) fn find(&self, tenant: TenantId, name: &str) -> Option<T> {
        let id = *self.by_name.get(&(tenant, name.to_owned()))?;
        self.get(tenant, id)
    }

    /// All rows of a tenant, ordered by name.
    pub(crate) fn list(&self, tenant: TenantId) -> Vec<T> {
        let mut rows: Vec<T> = self
            .by_id
            .iter()
            .filter(|r| r.tenant_id() == tenant)
            .map(|r| r.value().clone())
            .collect();
        rows.sort_by(|a, b| a.name().cmp(b.name()));
        rows
    }

    pub(crate) fn all(&self) -> Vec<T> {
        self.by_id.iter().map(|r| r.value().clone()).collect()
    }

    /// Run `f` with the row locked for writing.
    pub(crate) fn with_row_mut<R>(
        &self,
        tenant: TenantId,
        id: Uuid,
        f: impl FnOnce(&mut T) -> R,
    ) -> Option<R> {
        let mut row = self.by_id.get_mut(&id)?;
        if row.tenant_id() != tenant {
            return None;
        }
        Some(f(row.value_mut()))
    }

    /// Visit every row with write access, one shard lock at a time.
    pub(crate) fn for_each_mut(&self, mut f: impl FnMut(&mut T)) {
        for mut row in self.by_id.iter_mut() {
            f(row.value_mut());
        }
    }

    /// Remove the row if it belongs to `tenant` and `keep` says no.
    pub(crate) fn remove_unless(
        &self,
        tenant: TenantId,
        id: Uuid,
        keep: impl FnOnce(&T) -> bool,
    ) -> Option<T> {
        let (_, row) = self
            .by_id
            .remove_if(&id, |_, row| row.tenant_id() == tenant && !keep(row))?;
        self.by_name.remove(&(tenant, row.name().to_owned()));
        Some(row)
    }

    pub(crate) fn len(&self) -> usize {
        self.by_id.len()
    }
}

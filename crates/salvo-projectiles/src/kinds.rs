//! Kind dispatch tables
//!
//! A record stores its projectile kind as a `u8` index into the handler's
//! table. The table resolves the index back to configuration and to the
//! factory that presents the record.

use crate::config::MAX_KINDS;
use crate::error::{Error, Rejected, Result};
use crate::visual::{InstanceId, VisualFactory};
use salvo_core::{EventRecord, RenderContext};
use salvo_netcode::{ReconcileStats, ViewProvider, VisualBinding, VisualReconciler};
use tracing::{debug, error, warn};

/// A projectile kind registered in a [`KindTable`]
pub trait ProjectileKind {
    /// Record this kind writes into the event buffer
    type Record: EventRecord;

    /// Unique name within its family
    fn name(&self) -> &str;

    /// Factory presenting this kind's records
    fn factory_mut(&mut self) -> &mut dyn VisualFactory<Self::Record>;
}

/// Ordered table of projectile kinds
#[derive(Debug)]
pub struct KindTable<P> {
    kinds: Vec<P>,
}

impl<P: ProjectileKind> KindTable<P> {
    pub fn new() -> Self {
        Self { kinds: Vec::new() }
    }

    /// Register a kind and return its index
    pub fn register(&mut self, kind: P) -> Result<u8> {
        if self.kinds.len() >= MAX_KINDS {
            return Err(Error::TooManyKinds { max: MAX_KINDS });
        }
        if self.index_of(kind.name()).is_some() {
            return Err(Error::DuplicateDefinition(kind.name().to_string()));
        }
        let index = self.kinds.len() as u8;
        self.kinds.push(kind);
        Ok(index)
    }

    pub fn get(&self, kind: u8) -> salvo_core::Result<&P> {
        self.kinds
            .get(kind as usize)
            .ok_or(salvo_core::Error::UnknownKind(kind))
    }

    pub fn get_mut(&mut self, kind: u8) -> salvo_core::Result<&mut P> {
        self.kinds
            .get_mut(kind as usize)
            .ok_or(salvo_core::Error::UnknownKind(kind))
    }

    /// Index of the kind registered under `name`
    pub fn index_of(&self, name: &str) -> Option<u8> {
        self.kinds
            .iter()
            .position(|k| k.name() == name)
            .map(|i| i as u8)
    }

    /// Resolve a kind for the producer, logging unknown kinds
    pub(crate) fn resolve(&self, kind: u8, family: &str) -> std::result::Result<&P, Rejected> {
        self.get(kind).map_err(|_| {
            error!(kind, family, "projectile kind is not registered");
            Rejected::UnknownKind(kind)
        })
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &P> {
        self.kinds.iter()
    }
}

impl<P: ProjectileKind> Default for KindTable<P> {
    fn default() -> Self {
        Self::new()
    }
}

/// Presentation instance of one record: its kind and the factory's instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VisualHandle {
    pub kind: u8,
    pub instance: InstanceId,
}

/// Routes reconciliation callbacks to the factory of each record's kind
pub struct KindBinding<'t, 'c, P> {
    table: &'t mut KindTable<P>,
    ctx: RenderContext<'c>,
}

impl<'t, 'c, P: ProjectileKind> KindBinding<'t, 'c, P> {
    pub fn new(table: &'t mut KindTable<P>, ctx: RenderContext<'c>) -> Self {
        Self { table, ctx }
    }
}

impl<P: ProjectileKind> VisualBinding<P::Record> for KindBinding<'_, '_, P> {
    type Handle = VisualHandle;

    fn spawn(&mut self, record: &P::Record) -> Option<VisualHandle> {
        let kind = record.kind();
        let Ok(projectile) = self.table.get_mut(kind) else {
            warn!(kind, "replicated record has an unregistered kind, not presenting it");
            return None;
        };
        let factory = projectile.factory_mut();
        let instance = factory.create_instance();
        factory.activate(instance, record);
        Some(VisualHandle { kind, instance })
    }

    fn render(
        &mut self,
        handle: VisualHandle,
        confirmed: &P::Record,
        predicted: &P::Record,
        alpha: f32,
    ) -> bool {
        match self.table.get_mut(handle.kind) {
            Ok(projectile) => projectile.factory_mut().render(
                handle.instance,
                &self.ctx,
                confirmed,
                predicted,
                alpha,
            ),
            Err(_) => false,
        }
    }

    fn despawn(&mut self, handle: VisualHandle) {
        if let Ok(projectile) = self.table.get_mut(handle.kind) {
            let factory = projectile.factory_mut();
            factory.deactivate(handle.instance);
            factory.release(handle.instance);
        }
    }
}

/// One observer frame for a handler's visuals
///
/// Returns `None` when the frame was skipped: a dedicated server, missing or
/// malformed views, or a destroyed owning entity (which also tears every
/// visual down).
pub(crate) fn render_frame<P, V>(
    table: &mut KindTable<P>,
    visuals: &mut VisualReconciler<P::Record, VisualHandle>,
    capacity: usize,
    views: &V,
    ctx: RenderContext<'_>,
) -> Option<ReconcileStats>
where
    P: ProjectileKind,
    V: ViewProvider<P::Record> + ?Sized,
{
    if !ctx.clock.mode().presents_visuals() {
        return None;
    }

    let views = match views.snapshots() {
        Ok(views) => views,
        Err(salvo_netcode::Error::EntityGone) => {
            let removed = visuals.teardown(&mut KindBinding::new(table, ctx));
            debug!(removed, "owning entity gone, visuals torn down");
            return None;
        }
        Err(err) => {
            warn!(%err, "snapshots unavailable, skipping render pass");
            return None;
        }
    };

    if views.capacity() != capacity {
        warn!(
            expected = capacity,
            actual = views.capacity(),
            "snapshot capacity mismatch, skipping render pass"
        );
        return None;
    }

    Some(visuals.reconcile(&views, &mut KindBinding::new(table, ctx)))
}

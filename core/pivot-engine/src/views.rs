//! FILENAME: core/pivot-engine/src/views.rs
//! Pivot Views - several independent pivots over the same dataset.
//!
//! Each view owns its config, options and latest result. Recomputes follow
//! last-request-wins: a compute is started with `begin_compute`, which bumps
//! the view's generation, and a result is only accepted by `complete` if no
//! newer compute was started in between. A failed compute leaves the previous
//! result in place.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::definition::{PivotConfig, PivotOptions};
use crate::engine::{calculate_pivot, calculate_pivot_json};
use crate::error::PivotError;
use crate::result::PivotResult;
use crate::value::Row;
use crate::{log_debug, log_info, log_warn};

pub type ViewId = u32;

#[derive(Debug, Clone)]
pub struct PivotView {
    pub id: ViewId,
    pub name: String,
    pub config: PivotConfig,
    pub options: PivotOptions,
    result: Option<Arc<PivotResult>>,
    last_error: Option<PivotError>,
    generation: u64,
}

impl PivotView {
    pub fn result(&self) -> Option<Arc<PivotResult>> {
        self.result.clone()
    }

    /// Error of the most recent failed compute, cleared by the next success.
    pub fn last_error(&self) -> Option<&PivotError> {
        self.last_error.as_ref()
    }
}

/// A started compute. Carries a snapshot of the inputs so the computation
/// can run without holding on to the registry.
#[derive(Debug, Clone)]
pub struct ComputeTicket {
    pub view: ViewId,
    pub generation: u64,
    pub config: PivotConfig,
    pub options: PivotOptions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Applied,
    /// The compute failed; the previous result was kept.
    Failed,
    /// A newer compute was started; this outcome was discarded.
    Superseded,
}

#[derive(Debug, Default)]
pub struct PivotViews {
    views: FxHashMap<ViewId, PivotView>,
    next_id: ViewId,
}

impl PivotViews {
    pub fn new() -> Self {
        PivotViews::default()
    }

    pub fn create(&mut self, name: impl Into<String>, config: PivotConfig, options: PivotOptions) -> ViewId {
        self.next_id += 1;
        let id = self.next_id;
        self.views.insert(
            id,
            PivotView {
                id,
                name: name.into(),
                config,
                options,
                result: None,
                last_error: None,
                generation: 0,
            },
        );
        log_info!("VIEWS", "created view {}", id);
        id
    }

    pub fn remove(&mut self, id: ViewId) -> Result<PivotView, PivotError> {
        let view = self.views.remove(&id).ok_or(PivotError::UnknownView(id))?;
        log_info!("VIEWS", "removed view {}", id);
        Ok(view)
    }

    pub fn get(&self, id: ViewId) -> Option<&PivotView> {
        self.views.get(&id)
    }

    /// View ids in creation order.
    pub fn ids(&self) -> Vec<ViewId> {
        let mut ids: Vec<ViewId> = self.views.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    pub fn result(&self, id: ViewId) -> Option<Arc<PivotResult>> {
        self.views.get(&id)?.result()
    }

    /// Replaces a view's config and options. The stored result is kept until
    /// the next completed compute.
    pub fn update_config(
        &mut self,
        id: ViewId,
        config: PivotConfig,
        options: PivotOptions,
    ) -> Result<(), PivotError> {
        let view = self.view_mut(id)?;
        view.config = config;
        view.options = options;
        Ok(())
    }

    /// Starts a compute, superseding any compute still in flight for the view.
    pub fn begin_compute(&mut self, id: ViewId) -> Result<ComputeTicket, PivotError> {
        let view = self.view_mut(id)?;
        view.generation += 1;
        Ok(ComputeTicket {
            view: id,
            generation: view.generation,
            config: view.config.clone(),
            options: view.options,
        })
    }

    /// Applies the outcome of a compute started with `begin_compute`.
    pub fn complete(
        &mut self,
        ticket: ComputeTicket,
        outcome: Result<PivotResult, PivotError>,
    ) -> Result<Completion, PivotError> {
        let view = self.view_mut(ticket.view)?;
        if ticket.generation != view.generation {
            log_debug!(
                "VIEWS",
                "view {} dropped stale generation {} (current {})",
                ticket.view,
                ticket.generation,
                view.generation
            );
            return Ok(Completion::Superseded);
        }

        match outcome {
            Ok(result) => {
                view.result = Some(Arc::new(result));
                view.last_error = None;
                Ok(Completion::Applied)
            }
            Err(e) => {
                log_warn!("VIEWS", "view {} compute failed: {}", ticket.view, e);
                view.last_error = Some(e);
                Ok(Completion::Failed)
            }
        }
    }

    /// Synchronous begin + compute + complete over typed rows.
    pub fn recompute(&mut self, id: ViewId, rows: &[Row]) -> Result<Arc<PivotResult>, PivotError> {
        let ticket = self.begin_compute(id)?;
        let result = calculate_pivot(rows, &ticket.config, &ticket.options);
        self.complete(ticket, Ok(result))?;
        self.result(id).ok_or(PivotError::UnknownView(id))
    }

    /// Synchronous recompute over an untyped JSON row set. On a malformed row
    /// set the error is returned and the previous result stays current.
    pub fn recompute_json(
        &mut self,
        id: ViewId,
        rows: &serde_json::Value,
    ) -> Result<Arc<PivotResult>, PivotError> {
        let ticket = self.begin_compute(id)?;
        let outcome = calculate_pivot_json(rows, &ticket.config, &ticket.options);
        let failure = outcome.as_ref().err().cloned();
        self.complete(ticket, outcome)?;
        match failure {
            Some(e) => Err(e),
            None => self.result(id).ok_or(PivotError::UnknownView(id)),
        }
    }

    fn view_mut(&mut self, id: ViewId) -> Result<&mut PivotView, PivotError> {
        self.views.get_mut(&id).ok_or(PivotError::UnknownView(id))
    }
}

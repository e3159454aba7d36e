use crate::config::EngineConfig;
use crate::place::{PlacedBounds, PlacedLabel, place_label};
use crate::render::SvgCanvas;
use crate::style::{Feature, LabelOptions, TextSymbolizer};
use geo::{Geometry, Rect};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;

/// Scale-denominator range within which a label is visible.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleRange {
    pub min: f64,
    pub max: f64,
}

impl ScaleRange {
    pub fn contains(&self, denominator: f64) -> bool {
        denominator >= self.min && denominator <= self.max
    }
}

/// One label to paint: its text, effective priority, collision margin, the
/// symbolizer it came from, and every source geometry that shares it.
#[derive(Debug, Clone)]
pub struct LabelCacheItem {
    pub text: String,
    pub priority: f64,
    pub space_around: i32,
    pub symbolizer: TextSymbolizer,
    pub geometries: Vec<Geometry<f64>>,
    pub layer_ids: HashSet<String>,
    pub scale_range: Option<ScaleRange>,
}

impl LabelCacheItem {
    pub fn new(
        layer_id: String,
        text: String,
        priority: f64,
        space_around: i32,
        symbolizer: TextSymbolizer,
        geometry: Geometry<f64>,
        scale_range: Option<ScaleRange>,
    ) -> Self {
        let mut layer_ids = HashSet::new();
        layer_ids.insert(layer_id);
        Self {
            text,
            priority,
            space_around,
            symbolizer,
            geometries: vec![geometry],
            layer_ids,
            scale_range,
        }
    }
}

/// Protocol violations: the caller broke the
/// `start_layer … end_layer … end/clear` bracketing.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CacheError {
    #[error("layer {0:?} is still active; call end_layer before end or clear")]
    LayerStillActive(String),
}

/// Cooperative cancellation handle for a running paint pass. The only part
/// of the cache that may be touched from another thread.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn stop(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    fn reset(&self) {
        self.0.store(false, Ordering::Relaxed);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ItemHandle {
    Grouped(String),
    Standalone(usize),
}

/// Accumulates labels across one or more layers, then paints them in
/// priority order with collision avoidance. One instance serves one render
/// pass: single writer while populating, single reader in [`end`].
///
/// [`end`]: LabelCache::end
pub struct LabelCache {
    engine: EngineConfig,
    grouped: HashMap<String, LabelCacheItem>,
    standalone: Vec<LabelCacheItem>,
    order: Vec<ItemHandle>,
    /// Set on every mutation; [`Self::end`] re-sorts only when needed and
    /// otherwise walks the order left by the previous sort.
    dirty: bool,
    enabled: HashSet<String>,
    active: HashSet<String>,
    cancel: CancelToken,
}

impl LabelCache {
    pub fn new(engine: EngineConfig) -> Self {
        Self {
            engine,
            grouped: HashMap::new(),
            standalone: Vec::new(),
            order: Vec::new(),
            dirty: false,
            enabled: HashSet::new(),
            active: HashSet::new(),
            cancel: CancelToken::default(),
        }
    }

    /// Begin a render pass: clears a pending cancellation request.
    pub fn start(&mut self) {
        self.cancel.reset();
    }

    /// Bracket the population of one layer. A layer is painted only while
    /// enabled, and `end`/`clear` refuse to run while any layer is active.
    pub fn start_layer(&mut self, layer_id: &str) {
        self.enabled.insert(layer_id.to_string());
        self.active.insert(layer_id.to_string());
    }

    pub fn end_layer(&mut self, layer_id: &str) {
        self.active.remove(layer_id);
    }

    /// Re-admit a previously disabled layer to the output.
    pub fn enable_layer(&mut self, layer_id: &str) {
        self.enabled.insert(layer_id.to_string());
    }

    /// Hide a layer's labels without discarding them. Refused while the
    /// layer is still being populated.
    pub fn disable_layer(&mut self, layer_id: &str) -> Result<(), CacheError> {
        if self.active.contains(layer_id) {
            return Err(CacheError::LayerStillActive(layer_id.to_string()));
        }
        self.enabled.remove(layer_id);
        Ok(())
    }

    pub fn is_layer_enabled(&self, layer_id: &str) -> bool {
        self.enabled.contains(layer_id)
    }

    /// Handle that lets another thread request early termination of `end`.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Request early termination of a running paint pass.
    pub fn stop(&self) {
        self.cancel.stop();
    }

    /// Accumulate one feature's label. Silently does nothing when the label
    /// expression yields no text (or only whitespace). Grouped symbolizers
    /// merge same-text labels into one multi-geometry item; non-grouped
    /// symbolizers append unconditionally.
    pub fn put(
        &mut self,
        layer_id: &str,
        symbolizer: &TextSymbolizer,
        feature: &Feature,
        shape: Geometry<f64>,
        scale_range: Option<ScaleRange>,
    ) {
        let Some(text) = symbolizer.label.evaluate_string(feature) else {
            return;
        };
        let text = text.trim().to_string();
        if text.is_empty() {
            return;
        }

        let priority = symbolizer
            .priority
            .as_ref()
            .and_then(|expr| expr.evaluate_number(feature))
            .unwrap_or(self.engine.default_priority);
        let options = LabelOptions::resolve(&symbolizer.options);

        if !options.group {
            self.standalone.push(LabelCacheItem::new(
                layer_id.to_string(),
                text,
                priority,
                options.space_around,
                symbolizer.clone(),
                shape,
                scale_range,
            ));
            self.order
                .push(ItemHandle::Standalone(self.standalone.len() - 1));
            self.dirty = true;
            return;
        }

        match self.grouped.get_mut(&text) {
            Some(existing) => {
                existing.geometries.push(shape);
                existing.layer_ids.insert(layer_id.to_string());
                // A constant priority stays at the first value seen; only a
                // per-feature expression accumulates across the group.
                if let Some(expr) = &symbolizer.priority {
                    if !expr.is_literal() {
                        existing.priority += priority;
                    }
                }
            }
            None => {
                let item = LabelCacheItem::new(
                    layer_id.to_string(),
                    text.clone(),
                    priority,
                    options.space_around,
                    symbolizer.clone(),
                    shape,
                    scale_range,
                );
                self.grouped.insert(text.clone(), item);
                self.order.push(ItemHandle::Grouped(text));
            }
        }
        self.dirty = true;
    }

    fn item(&self, handle: &ItemHandle) -> Option<&LabelCacheItem> {
        match handle {
            ItemHandle::Grouped(text) => self.grouped.get(text),
            ItemHandle::Standalone(index) => self.standalone.get(*index),
        }
    }

    fn item_enabled(&self, item: &LabelCacheItem) -> bool {
        item.layer_ids.iter().any(|id| self.enabled.contains(id))
    }

    fn in_scale(&self, item: &LabelCacheItem) -> bool {
        match (self.engine.scale_denominator, item.scale_range) {
            (Some(denominator), Some(range)) => range.contains(denominator),
            _ => true,
        }
    }

    fn sort_if_dirty(&mut self) {
        if !self.dirty {
            return;
        }
        let mut keyed: Vec<(f64, ItemHandle)> = self
            .order
            .iter()
            .map(|handle| {
                let priority = self.item(handle).map(|item| item.priority).unwrap_or(0.0);
                (priority, handle.clone())
            })
            .collect();
        // Stable: equal priorities keep insertion order.
        keyed.sort_by(|a, b| b.0.total_cmp(&a.0));
        self.order = keyed.into_iter().map(|(_, handle)| handle).collect();
        self.dirty = false;
    }

    /// All painting-eligible items, highest priority first. Ties keep
    /// insertion order; no further tie-break is defined.
    pub fn ordered_labels(&mut self) -> Vec<&LabelCacheItem> {
        self.sort_if_dirty();
        self.order
            .iter()
            .filter_map(|handle| self.item(handle))
            .filter(|item| self.item_enabled(item))
            .collect()
    }

    /// Paint every eligible label onto `canvas`, highest priority first,
    /// recording accepted bounds so later labels avoid them. Returns the
    /// accepted labels. Fails only on a protocol violation; any single
    /// label's placement failure merely skips that label.
    pub fn end(
        &mut self,
        canvas: &mut SvgCanvas,
        display: Rect<f64>,
    ) -> Result<Vec<PlacedLabel>, CacheError> {
        if let Some(layer) = self.active.iter().next() {
            return Err(CacheError::LayerStillActive(layer.clone()));
        }

        // Drop one pixel of width and height so tiled rendering does not
        // count the shared boundary row twice.
        let display = Rect::new(
            display.min(),
            (display.max().x - 1.0, display.max().y - 1.0).into(),
        );
        let display_poly = display.to_polygon();

        self.sort_if_dirty();
        let order = self.order.clone();
        let mut placed_bounds = PlacedBounds::new();
        let mut accepted = Vec::new();

        for handle in &order {
            if self.cancel.is_stopped() {
                log::debug!("label pass cancelled after {} labels", accepted.len());
                break;
            }
            let Some(item) = self.item(handle) else {
                continue;
            };
            if !self.item_enabled(item) || !self.in_scale(item) {
                continue;
            }
            match place_label(item, &display_poly, &display, &placed_bounds) {
                Ok(label) => {
                    canvas.paint_label(&label);
                    if item.space_around >= 0 {
                        let space = label.collision_space(item.space_around);
                        if let Some(shield) = label.shield_bounds {
                            placed_bounds.record(shield, space);
                        }
                        placed_bounds.record(label.bounds, space);
                    }
                    accepted.push(label);
                }
                Err(err) => {
                    log::debug!("skipping label {:?}: {err}", item.text);
                }
            }
        }
        Ok(accepted)
    }

    /// Drop every accumulated label and all layer state.
    pub fn clear(&mut self) -> Result<(), CacheError> {
        if let Some(layer) = self.active.iter().next() {
            return Err(CacheError::LayerStillActive(layer.clone()));
        }
        self.grouped.clear();
        self.standalone.clear();
        self.order.clear();
        self.enabled.clear();
        self.dirty = false;
        Ok(())
    }

    /// Drop the labels of one layer. Items shared with other layers merely
    /// lose this layer's id.
    pub fn clear_layer(&mut self, layer_id: &str) -> Result<(), CacheError> {
        if self.active.contains(layer_id) {
            return Err(CacheError::LayerStillActive(layer_id.to_string()));
        }
        self.enabled.remove(layer_id);
        for item in self.grouped.values_mut() {
            item.layer_ids.remove(layer_id);
        }
        for item in &mut self.standalone {
            item.layer_ids.remove(layer_id);
        }
        self.grouped.retain(|_, item| !item.layer_ids.is_empty());
        // Standalone items keep their slots so existing handles stay valid;
        // the order list drops handles whose item went away.
        let empty_standalone: HashSet<usize> = self
            .standalone
            .iter()
            .enumerate()
            .filter(|(_, item)| item.layer_ids.is_empty())
            .map(|(index, _)| index)
            .collect();
        self.order.retain(|handle| match handle {
            ItemHandle::Grouped(text) => self.grouped.contains_key(text),
            ItemHandle::Standalone(index) => !empty_standalone.contains(index),
        });
        self.dirty = true;
        Ok(())
    }

    /// Number of accumulated items (grouped entries count once).
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

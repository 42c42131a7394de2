// src/terrain/chunk_manager.rs
use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender, channel};
use std::time::{Duration, Instant};

use glam::{Vec2, Vec3};
use tracing::{debug, info, warn};

use crate::error::{TerrainError, TerrainResult};
use crate::terrain::map_generator::{ChunkMesh, MapSource, build_chunk_mesh};
pub use crate::terrain::terrain_config::ChunkPosition;
use crate::terrain::terrain_config::{CHUNK_WORLD_SIZE, LEVELS_OF_DETAIL, MeshStyle, StreamingSettings};
use crate::threading::ThreadPool;

/// Ground-plane square covered by a chunk.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChunkBounds {
    pub min: Vec2,
    pub max: Vec2,
}

impl ChunkBounds {
    pub fn for_chunk(position: ChunkPosition) -> Self {
        let centre = position.world_origin();
        let half = Vec2::splat(CHUNK_WORLD_SIZE / 2.0);
        ChunkBounds { min: centre - half, max: centre + half }
    }

    // Distance to the nearest point of the square; 0 inside it
    pub fn distance_to(&self, point: Vec2) -> f32 {
        let outside = (self.min - point).max(point - self.max).max(Vec2::ZERO);
        outside.length()
    }
}

/// Level of detail for a chunk at `distance` from the viewer.
///
/// `floor(distance / max_view_distance * LEVELS_OF_DETAIL)`, clamped, so a
/// chunk exactly at the view distance gets the coarsest level.
pub fn lod_for_distance(distance: f32, max_view_distance: f32) -> usize {
    let level = (distance / max_view_distance * LEVELS_OF_DETAIL as f32).floor();
    (level.max(0.0) as usize).min(LEVELS_OF_DETAIL - 1)
}

/// Receives finished chunk meshes and visibility changes.
///
/// Always called from the thread that drives [`ChunkGrid`].
pub trait ChunkRenderer {
    fn apply_mesh(&mut self, position: ChunkPosition, origin: Vec3, mesh: &ChunkMesh);

    fn set_visible(&mut self, _position: ChunkPosition, _visible: bool) {}
}

// For headless use; meshes still end up in the cache
pub struct NullRenderer;

impl ChunkRenderer for NullRenderer {
    fn apply_mesh(&mut self, _position: ChunkPosition, _origin: Vec3, _mesh: &ChunkMesh) {}
}

#[derive(Debug, Clone, Default)]
enum LodSlot {
    #[default]
    Empty,
    // Acts as the build ticket: at most one build per (chunk, lod)
    Building,
    Ready(Arc<ChunkMesh>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    Hidden,
    Applied,
    AlreadyApplied,
    Started,
    InFlight,
}

enum BuildResult {
    Built { position: ChunkPosition, lod: usize, mesh: ChunkMesh },
    Failed { position: ChunkPosition, lod: usize, error: TerrainError },
}

/// Runs chunk builds on the worker pool and reports back over a channel.
pub struct BuildDispatcher {
    pool: Arc<ThreadPool>,
    source: Arc<dyn MapSource>,
    style: MeshStyle,
    sender: Sender<BuildResult>,
}

impl BuildDispatcher {
    fn dispatch(&self, position: ChunkPosition, lod: usize) {
        let source = Arc::clone(&self.source);
        let sender = self.sender.clone();
        let style = self.style;

        self.pool.execute(move || {
            let outcome = catch_unwind(AssertUnwindSafe(|| {
                build_chunk_mesh(source.as_ref(), position, lod, style)
            }));
            let result = match outcome {
                Ok(Ok(mesh)) => BuildResult::Built { position, lod, mesh },
                Ok(Err(error)) => BuildResult::Failed { position, lod, error },
                Err(payload) => BuildResult::Failed {
                    position,
                    lod,
                    error: TerrainError::BuildPanicked(panic_message(payload.as_ref())),
                },
            };
            // Receiver is gone if the grid was dropped mid-build
            let _ = sender.send(result);
        });
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Per-coordinate chunk state: bounds, visibility and the LOD mesh cache.
#[derive(Debug)]
pub struct TerrainChunk {
    position: ChunkPosition,
    bounds: ChunkBounds,
    visible: bool,
    target_lod: Option<usize>,
    applied_lod: Option<usize>,
    lod_meshes: [LodSlot; LEVELS_OF_DETAIL],
}

impl TerrainChunk {
    pub fn new(position: ChunkPosition) -> Self {
        TerrainChunk {
            position,
            bounds: ChunkBounds::for_chunk(position),
            visible: false,
            target_lod: None,
            applied_lod: None,
            lod_meshes: Default::default(),
        }
    }

    pub fn position(&self) -> ChunkPosition {
        self.position
    }

    pub fn bounds(&self) -> ChunkBounds {
        self.bounds
    }

    pub fn world_origin(&self) -> Vec3 {
        let origin = self.position.world_origin();
        Vec3::new(origin.x, 0.0, origin.y)
    }

    pub fn distance_from(&self, viewer: Vec2) -> f32 {
        self.bounds.distance_to(viewer)
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn show(&mut self) {
        self.visible = true;
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }

    pub fn target_lod(&self) -> Option<usize> {
        self.target_lod
    }

    // LOD whose mesh was last handed to the renderer
    pub fn applied_lod(&self) -> Option<usize> {
        self.applied_lod
    }

    pub fn cached_mesh(&self, lod: usize) -> Option<&Arc<ChunkMesh>> {
        match &self.lod_meshes[check_lod(lod)] {
            LodSlot::Ready(mesh) => Some(mesh),
            _ => None,
        }
    }

    pub fn is_building(&self, lod: usize) -> bool {
        matches!(self.lod_meshes[check_lod(lod)], LodSlot::Building)
    }

    /// Show the mesh for `lod`, building it in the background if it is not cached.
    ///
    /// Does nothing while the chunk is hidden. A build already in flight for
    /// the same level is not duplicated.
    pub fn request_lod(
        &mut self,
        lod: usize,
        builds: &BuildDispatcher,
        renderer: &mut dyn ChunkRenderer,
    ) -> RequestOutcome {
        let lod = check_lod(lod);
        if !self.visible {
            return RequestOutcome::Hidden;
        }
        self.target_lod = Some(lod);

        match &self.lod_meshes[lod] {
            LodSlot::Ready(mesh) => {
                if self.applied_lod == Some(lod) {
                    return RequestOutcome::AlreadyApplied;
                }
                let mesh = Arc::clone(mesh);
                self.apply(&mesh, renderer);
                RequestOutcome::Applied
            }
            LodSlot::Building => RequestOutcome::InFlight,
            LodSlot::Empty => {
                debug!(
                    "Chunk [{}, {}, {}] Creating mesh",
                    self.position.x, self.position.y, lod
                );
                self.lod_meshes[lod] = LodSlot::Building;
                builds.dispatch(self.position, lod);
                RequestOutcome::Started
            }
        }
    }

    // Results are cached even when no longer wanted; they never go stale within a session
    fn complete_build(&mut self, lod: usize, mesh: Arc<ChunkMesh>, renderer: &mut dyn ChunkRenderer) {
        debug!(
            "Chunk [{}, {}, {}] Mesh created",
            self.position.x, self.position.y, lod
        );
        self.lod_meshes[lod] = LodSlot::Ready(Arc::clone(&mesh));
        if self.visible && self.target_lod == Some(lod) {
            self.apply(&mesh, renderer);
        }
    }

    // Leave the slot empty so the next request retries
    fn fail_build(&mut self, lod: usize) {
        self.lod_meshes[lod] = LodSlot::Empty;
    }

    fn apply(&mut self, mesh: &ChunkMesh, renderer: &mut dyn ChunkRenderer) {
        renderer.apply_mesh(self.position, self.world_origin(), mesh);
        self.applied_lod = Some(mesh.lod);
    }
}

fn check_lod(lod: usize) -> usize {
    assert!(
        lod < LEVELS_OF_DETAIL,
        "level of detail {} out of range 0..{}",
        lod,
        LEVELS_OF_DETAIL
    );
    lod
}

/// Streams terrain chunks around a moving viewer.
///
/// Chunks are created lazily and never removed. Each [`ChunkGrid::update`]
/// recomputes visibility in a square ring around the viewer's chunk and asks
/// every touched chunk for the LOD matching its distance. Builds run on the
/// worker pool; their results are applied by [`ChunkGrid::apply_completed`]
/// on the calling thread.
pub struct ChunkGrid {
    chunks: HashMap<ChunkPosition, TerrainChunk>,
    last_visible_chunks: Vec<ChunkPosition>,
    settings: StreamingSettings,
    max_chunks_visible: i32,
    viewer_position: Vec2,
    builds: BuildDispatcher,
    results: Receiver<BuildResult>,
    in_flight: usize,
}

impl ChunkGrid {
    pub fn new(settings: StreamingSettings, source: Arc<dyn MapSource>) -> TerrainResult<Self> {
        let settings = settings.sanitized();
        let pool = Arc::new(ThreadPool::new(settings.resolved_worker_threads())?);
        Ok(Self::with_thread_pool(settings, source, pool))
    }

    pub fn with_thread_pool(
        settings: StreamingSettings,
        source: Arc<dyn MapSource>,
        pool: Arc<ThreadPool>,
    ) -> Self {
        let settings = settings.sanitized();
        let max_chunks_visible = settings.max_chunks_visible();
        let (sender, results) = channel();
        info!(
            "ChunkGrid: view distance {}, scanning {} chunks around the viewer, {:?} meshes",
            settings.max_view_distance, max_chunks_visible, settings.mesh_style
        );

        ChunkGrid {
            chunks: HashMap::new(),
            last_visible_chunks: Vec::new(),
            max_chunks_visible,
            viewer_position: Vec2::ZERO,
            builds: BuildDispatcher { pool, source, style: settings.mesh_style, sender },
            settings,
            results,
            in_flight: 0,
        }
    }

    pub fn settings(&self) -> &StreamingSettings {
        &self.settings
    }

    pub fn viewer_position(&self) -> Vec2 {
        self.viewer_position
    }

    pub fn chunk(&self, position: ChunkPosition) -> Option<&TerrainChunk> {
        self.chunks.get(&position)
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn visible_chunks(&self) -> &[ChunkPosition] {
        &self.last_visible_chunks
    }

    pub fn builds_in_flight(&self) -> usize {
        self.in_flight
    }

    // Future builds use the new source; cached meshes are kept as they are
    pub fn set_map_source(&mut self, source: Arc<dyn MapSource>) {
        self.builds.source = source;
    }

    pub fn resolve_level_of_detail(&self, chunk: &TerrainChunk) -> usize {
        lod_for_distance(chunk.distance_from(self.viewer_position), self.settings.max_view_distance)
    }

    // Apply finished builds, then rescan around the viewer
    pub fn tick(&mut self, viewer: Vec2, renderer: &mut dyn ChunkRenderer) {
        self.apply_completed(renderer);
        self.update(viewer, renderer);
    }

    pub fn update(&mut self, viewer: Vec2, renderer: &mut dyn ChunkRenderer) {
        self.viewer_position = viewer;
        let max_view_distance = self.settings.max_view_distance;

        let previous: HashSet<ChunkPosition> = self.last_visible_chunks.drain(..).collect();
        for position in &previous {
            if let Some(chunk) = self.chunks.get_mut(position) {
                chunk.hide();
            }
        }

        let current = ChunkPosition::from_world(viewer);
        let radius = self.max_chunks_visible;
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                let position = ChunkPosition::new(current.x + dx, current.y + dy);
                let chunk = self.chunks.entry(position).or_insert_with(|| {
                    debug!("Chunk [{}, {}] created", position.x, position.y);
                    TerrainChunk::new(position)
                });

                let distance = chunk.distance_from(viewer);
                if distance <= max_view_distance {
                    chunk.show();
                    self.last_visible_chunks.push(position);
                } else {
                    chunk.hide();
                }

                let lod = lod_for_distance(distance, max_view_distance);
                if chunk.request_lod(lod, &self.builds, renderer) == RequestOutcome::Started {
                    self.in_flight += 1;
                }
            }
        }

        for position in &previous {
            let still_visible = self.chunks.get(position).is_some_and(|c| c.is_visible());
            if !still_visible {
                renderer.set_visible(*position, false);
            }
        }
        for position in &self.last_visible_chunks {
            if !previous.contains(position) {
                renderer.set_visible(*position, true);
            }
        }
    }

    /// Drain finished builds without blocking. Returns how many were handled.
    pub fn apply_completed(&mut self, renderer: &mut dyn ChunkRenderer) -> usize {
        let mut handled = 0;
        while let Ok(result) = self.results.try_recv() {
            self.handle_result(result, renderer);
            handled += 1;
        }
        handled
    }

    /// Block until every dispatched build has been handled or `timeout` passes.
    /// Returns false on timeout.
    pub fn wait_for_builds(&mut self, renderer: &mut dyn ChunkRenderer, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while self.in_flight > 0 {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.results.recv_timeout(remaining) {
                Ok(result) => self.handle_result(result, renderer),
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                    return false;
                }
            }
        }
        true
    }

    fn handle_result(&mut self, result: BuildResult, renderer: &mut dyn ChunkRenderer) {
        self.in_flight = self.in_flight.saturating_sub(1);
        match result {
            BuildResult::Built { position, lod, mesh } => {
                if let Some(chunk) = self.chunks.get_mut(&position) {
                    chunk.complete_build(lod, Arc::new(mesh), renderer);
                }
            }
            BuildResult::Failed { position, lod, error } => {
                warn!(
                    "Chunk [{}, {}, {}] build failed: {}",
                    position.x, position.y, lod, error
                );
                if let Some(chunk) = self.chunks.get_mut(&position) {
                    chunk.fail_build(lod);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::map_generator::Map;

    struct UnusedSource;

    impl MapSource for UnusedSource {
        fn generate_map(&self, _position: ChunkPosition) -> TerrainResult<Map> {
            Err(TerrainError::generation("not used"))
        }
    }

    #[test]
    fn viewer_chunk_is_rounded() {
        assert_eq!(ChunkPosition::from_world(Vec2::new(0.0, 0.0)), ChunkPosition::new(0, 0));
        assert_eq!(ChunkPosition::from_world(Vec2::new(47.0, -47.0)), ChunkPosition::new(0, 0));
        assert_eq!(ChunkPosition::from_world(Vec2::new(49.0, -49.0)), ChunkPosition::new(1, -1));
        assert_eq!(ChunkPosition::from_world(Vec2::new(-200.0, 300.0)), ChunkPosition::new(-2, 3));
    }

    #[test]
    fn bounds_cover_the_whole_chunk() {
        let bounds = ChunkBounds::for_chunk(ChunkPosition::new(1, -2));
        assert_eq!(bounds.min, Vec2::new(48.0, -240.0));
        assert_eq!(bounds.max, Vec2::new(144.0, -144.0));
    }

    #[test]
    fn distance_is_to_nearest_point_of_bounds() {
        let bounds = ChunkBounds::for_chunk(ChunkPosition::new(0, 0));
        assert_eq!(bounds.distance_to(Vec2::new(10.0, -20.0)), 0.0);
        assert_eq!(bounds.distance_to(Vec2::new(48.0, 0.0)), 0.0);
        assert_eq!(bounds.distance_to(Vec2::new(58.0, 0.0)), 10.0);
        assert_eq!(bounds.distance_to(Vec2::new(51.0, 52.0)), 5.0);
    }

    #[test]
    fn lod_boundaries() {
        assert_eq!(lod_for_distance(0.0, 600.0), 0);
        assert_eq!(lod_for_distance(119.9, 600.0), 0);
        assert_eq!(lod_for_distance(120.0, 600.0), 1);
        assert_eq!(lod_for_distance(599.0, 600.0), LEVELS_OF_DETAIL - 1);
        // At exactly the view distance the raw level would be LEVELS_OF_DETAIL
        assert_eq!(lod_for_distance(600.0, 600.0), LEVELS_OF_DETAIL - 1);
        assert_eq!(lod_for_distance(5000.0, 600.0), LEVELS_OF_DETAIL - 1);
    }

    #[test]
    fn hidden_chunk_ignores_requests() {
        let pool = Arc::new(ThreadPool::new(1).unwrap());
        let grid = ChunkGrid::with_thread_pool(StreamingSettings::default(), Arc::new(UnusedSource), pool);
        let mut chunk = TerrainChunk::new(ChunkPosition::new(0, 0));

        let outcome = chunk.request_lod(0, &grid.builds, &mut NullRenderer);
        assert_eq!(outcome, RequestOutcome::Hidden);
        assert!(!chunk.is_building(0));
        assert_eq!(chunk.target_lod(), None);
    }

    #[test]
    fn second_request_while_building_is_not_dispatched() {
        let pool = Arc::new(ThreadPool::new(1).unwrap());
        let grid = ChunkGrid::with_thread_pool(StreamingSettings::default(), Arc::new(UnusedSource), pool);
        let mut chunk = TerrainChunk::new(ChunkPosition::new(0, 0));
        chunk.show();

        assert_eq!(chunk.request_lod(2, &grid.builds, &mut NullRenderer), RequestOutcome::Started);
        assert_eq!(chunk.request_lod(2, &grid.builds, &mut NullRenderer), RequestOutcome::InFlight);
        assert!(chunk.is_building(2));
        assert_eq!(chunk.target_lod(), Some(2));
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn unsupported_lod_panics() {
        TerrainChunk::new(ChunkPosition::new(0, 0)).cached_mesh(LEVELS_OF_DETAIL);
    }

    #[test]
    fn panic_payloads_become_messages() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");
        let payload: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(payload.as_ref()), "bang");
        let payload: Box<dyn Any + Send> = Box::new(3_u8);
        assert_eq!(panic_message(payload.as_ref()), "unknown panic");
    }
}

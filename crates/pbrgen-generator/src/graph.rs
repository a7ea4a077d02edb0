//! The fixed texture-derivation task graph.
//!
//! One run executes thirteen tasks. The four albedo variants and the
//! high-detail normal extraction depend only on the raw input and
//! start immediately; everything else gates on upstream buffers:
//!
//! ```text
//! raw ─┬─ albedo LL / HL / LH / HH     (median 0|1 x shadow 0|1)
//!      │        │ (HL)
//!      │        └─ height_base ─┬─ height_sharp
//!      │                        └─ height_smooth ─┬─ normal_no_details ─┐
//!      │                                          ├─ occlusion_low      │
//!      │                                          ├─ occlusion_high     │
//!      │                                          └──────── metallic_low ─ metallic_high
//!      └─ normal_high_details
//! ```
//!
//! The graph is fixed, so acyclicity could be checked by inspection --
//! it is still verified with a toposort at build time, as the wiring
//! is the one place a refactor could silently introduce a cycle.

use std::sync::Arc;

use pbrgen_pipeline::{GrayBuffer, RgbBuffer, blur, contrast, grayscale, median, metallic,
    normal, occlusion, shadows, surface_blur};
use petgraph::algo::toposort;
use petgraph::graph::DiGraph;

use crate::error::GenerateError;
use crate::slot::Slot;
use crate::task::{DependencyTask, TaskBoard, TaskId};

/// Number of tasks in the graph.
pub const TASK_COUNT: usize = 13;

// Stage parameters, matching the generation recipe the variant pairs
// are blended from.
const NOISE_REMOVAL_LOW: f32 = 0.0;
const NOISE_REMOVAL_HIGH: f32 = 1.0;
const SHADOW_REMOVAL_LOW: f32 = 0.0;
const SHADOW_REMOVAL_HIGH: f32 = 1.0;
const HEIGHT_SHARP_RADIUS: u32 = 2;
const HEIGHT_SMOOTH_RADIUS: u32 = 4;
const NORMAL_SMOOTH_RADIUS: u32 = 2;
const NORMAL_SMOOTH_FLATNESS: f32 = 2.0;
const NORMAL_DETAIL_RADIUS: u32 = 0;
const NORMAL_DETAIL_FLATNESS: f32 = 1.0;
const OCCLUSION_SPREAD_LOW: u32 = 5;
const OCCLUSION_SPREAD_HIGH: u32 = 15;
const METALLIC_STRENGTH: f32 = 0.5;

// Task indices. Order is arbitrary but stable: diagnostics and tests
// refer to tasks by name, not index.
const ALBEDO_LL: usize = 0;
const ALBEDO_HL: usize = 1;
const ALBEDO_LH: usize = 2;
const ALBEDO_HH: usize = 3;
const HEIGHT_BASE: usize = 4;
const HEIGHT_SHARP: usize = 5;
const HEIGHT_SMOOTH: usize = 6;
const NORMAL_NO_DETAILS: usize = 7;
const NORMAL_HIGH_DETAILS: usize = 8;
const OCCLUSION_LOW: usize = 9;
const OCCLUSION_HIGH: usize = 10;
const METALLIC_LOW: usize = 11;
const METALLIC_HIGH: usize = 12;

/// Output slots for every cached variant a run produces.
pub(crate) struct GraphOutputs {
    pub albedo_low_noise_low_shadow: Arc<Slot<RgbBuffer>>,
    pub albedo_high_noise_low_shadow: Arc<Slot<RgbBuffer>>,
    pub albedo_low_noise_high_shadow: Arc<Slot<RgbBuffer>>,
    pub albedo_high_noise_high_shadow: Arc<Slot<RgbBuffer>>,
    pub height_sharp: Arc<Slot<GrayBuffer>>,
    pub height_smooth: Arc<Slot<GrayBuffer>>,
    pub normal_no_details: Arc<Slot<RgbBuffer>>,
    pub normal_high_details: Arc<Slot<RgbBuffer>>,
    pub occlusion_low: Arc<Slot<GrayBuffer>>,
    pub occlusion_high: Arc<Slot<GrayBuffer>>,
    pub metallic_low: Arc<Slot<GrayBuffer>>,
    pub metallic_high: Arc<Slot<GrayBuffer>>,
}

/// A built run: tasks ready to spawn plus the output slots the cache
/// is assembled from.
pub(crate) struct TaskGraph {
    pub tasks: Vec<DependencyTask>,
    pub outputs: GraphOutputs,
}

/// Wire the thirteen tasks over a shared raw input buffer.
///
/// Each albedo job chains a median filter and shadow suppression with
/// a cancellation check between the two, so an abort lands between
/// operators instead of waiting out the whole chain.
pub(crate) fn build(raw: &Arc<RgbBuffer>, board: &Arc<TaskBoard>) -> TaskGraph {
    let outputs = GraphOutputs {
        albedo_low_noise_low_shadow: Slot::new(),
        albedo_high_noise_low_shadow: Slot::new(),
        albedo_low_noise_high_shadow: Slot::new(),
        albedo_high_noise_high_shadow: Slot::new(),
        height_sharp: Slot::new(),
        height_smooth: Slot::new(),
        normal_no_details: Slot::new(),
        normal_high_details: Slot::new(),
        occlusion_low: Slot::new(),
        occlusion_high: Slot::new(),
        metallic_low: Slot::new(),
        metallic_high: Slot::new(),
    };
    let height_base: Arc<Slot<GrayBuffer>> = Slot::new();

    let mut tasks = Vec::with_capacity(TASK_COUNT);

    let albedo_variants = [
        (ALBEDO_LL, "albedo_low_noise_low_shadow", NOISE_REMOVAL_LOW,
            SHADOW_REMOVAL_LOW, Arc::clone(&outputs.albedo_low_noise_low_shadow)),
        (ALBEDO_HL, "albedo_high_noise_low_shadow", NOISE_REMOVAL_HIGH,
            SHADOW_REMOVAL_LOW, Arc::clone(&outputs.albedo_high_noise_low_shadow)),
        (ALBEDO_LH, "albedo_low_noise_high_shadow", NOISE_REMOVAL_LOW,
            SHADOW_REMOVAL_HIGH, Arc::clone(&outputs.albedo_low_noise_high_shadow)),
        (ALBEDO_HH, "albedo_high_noise_high_shadow", NOISE_REMOVAL_HIGH,
            SHADOW_REMOVAL_HIGH, Arc::clone(&outputs.albedo_high_noise_high_shadow)),
    ];
    for (id, name, noise, shadow, out) in albedo_variants {
        let input = Arc::clone(raw);
        let gate = Arc::clone(board);
        tasks.push(DependencyTask::new(
            TaskId(id),
            name,
            vec![],
            Box::new(move || {
                let filtered = median::median_filter_rgb(&input, noise);
                if gate.is_cancelled() {
                    return Err(GenerateError::Cancelled);
                }
                out.publish(shadows::remove_shadow_highlight(&filtered, shadow));
                Ok(())
            }),
        ));
    }

    {
        let input = Arc::clone(&outputs.albedo_high_noise_low_shadow);
        let out = Arc::clone(&height_base);
        tasks.push(DependencyTask::new(
            TaskId(HEIGHT_BASE),
            "height_base",
            vec![TaskId(ALBEDO_HL)],
            Box::new(move || {
                let albedo = input.get()?;
                out.publish(contrast::autocontrast(&grayscale::grayscale(&albedo)));
                Ok(())
            }),
        ));
    }

    {
        let input = Arc::clone(&height_base);
        let out = Arc::clone(&outputs.height_sharp);
        tasks.push(DependencyTask::new(
            TaskId(HEIGHT_SHARP),
            "height_sharp",
            vec![TaskId(HEIGHT_BASE)],
            Box::new(move || {
                let base = input.get()?;
                out.publish(surface_blur::surface_blur(
                    &base,
                    HEIGHT_SHARP_RADIUS,
                    surface_blur::DEFAULT_THRESHOLD,
                ));
                Ok(())
            }),
        ));
    }

    {
        let input = Arc::clone(&height_base);
        let gate = Arc::clone(board);
        let out = Arc::clone(&outputs.height_smooth);
        tasks.push(DependencyTask::new(
            TaskId(HEIGHT_SMOOTH),
            "height_smooth",
            vec![TaskId(HEIGHT_BASE)],
            Box::new(move || {
                let base = input.get()?;
                let blurred = blur::gaussian_blur(&base);
                if gate.is_cancelled() {
                    return Err(GenerateError::Cancelled);
                }
                out.publish(surface_blur::surface_blur(
                    &blurred,
                    HEIGHT_SMOOTH_RADIUS,
                    surface_blur::DEFAULT_THRESHOLD,
                ));
                Ok(())
            }),
        ));
    }

    {
        let input = Arc::clone(&outputs.height_smooth);
        let out = Arc::clone(&outputs.normal_no_details);
        tasks.push(DependencyTask::new(
            TaskId(NORMAL_NO_DETAILS),
            "normal_no_details",
            vec![TaskId(HEIGHT_SMOOTH)],
            Box::new(move || {
                let height = input.get()?;
                out.publish(normal::normal_map(
                    &height,
                    NORMAL_SMOOTH_RADIUS,
                    NORMAL_SMOOTH_FLATNESS,
                ));
                Ok(())
            }),
        ));
    }

    {
        let input = Arc::clone(raw);
        let gate = Arc::clone(board);
        let out = Arc::clone(&outputs.normal_high_details);
        tasks.push(DependencyTask::new(
            TaskId(NORMAL_HIGH_DETAILS),
            "normal_high_details",
            vec![],
            Box::new(move || {
                let gray = grayscale::grayscale(&input);
                if gate.is_cancelled() {
                    return Err(GenerateError::Cancelled);
                }
                out.publish(normal::normal_map(
                    &gray,
                    NORMAL_DETAIL_RADIUS,
                    NORMAL_DETAIL_FLATNESS,
                ));
                Ok(())
            }),
        ));
    }

    let occlusion_variants = [
        (OCCLUSION_LOW, "occlusion_low", OCCLUSION_SPREAD_LOW,
            Arc::clone(&outputs.occlusion_low)),
        (OCCLUSION_HIGH, "occlusion_high", OCCLUSION_SPREAD_HIGH,
            Arc::clone(&outputs.occlusion_high)),
    ];
    for (id, name, spread, out) in occlusion_variants {
        let input = Arc::clone(&outputs.height_smooth);
        tasks.push(DependencyTask::new(
            TaskId(id),
            name,
            vec![TaskId(HEIGHT_SMOOTH)],
            Box::new(move || {
                let height = input.get()?;
                out.publish(occlusion::occlusion(&height, spread));
                Ok(())
            }),
        ));
    }

    {
        let height_in = Arc::clone(&outputs.height_smooth);
        let normal_in = Arc::clone(&outputs.normal_no_details);
        let gate = Arc::clone(board);
        let out = Arc::clone(&outputs.metallic_low);
        tasks.push(DependencyTask::new(
            TaskId(METALLIC_LOW),
            "metallic_low",
            vec![TaskId(HEIGHT_SMOOTH), TaskId(NORMAL_NO_DETAILS)],
            Box::new(move || {
                let height = height_in.get()?;
                let normals = normal_in.get()?;
                let estimate = metallic::metallic(&height, &normals, METALLIC_STRENGTH)?;
                if gate.is_cancelled() {
                    return Err(GenerateError::Cancelled);
                }
                out.publish(blur::gaussian_blur(&estimate));
                Ok(())
            }),
        ));
    }

    {
        let input = Arc::clone(&outputs.metallic_low);
        let out = Arc::clone(&outputs.metallic_high);
        tasks.push(DependencyTask::new(
            TaskId(METALLIC_HIGH),
            "metallic_high",
            vec![TaskId(METALLIC_LOW)],
            Box::new(move || {
                let low = input.get()?;
                out.publish(contrast::autocontrast(&low));
                Ok(())
            }),
        ));
    }

    TaskGraph { tasks, outputs }
}

/// Verify the task graph is acyclic.
///
/// # Errors
///
/// Returns [`GenerateError::Internal`] if a dependency cycle exists.
pub(crate) fn verify_acyclic(tasks: &[DependencyTask]) -> Result<(), GenerateError> {
    let mut graph = DiGraph::<&'static str, ()>::new();
    let nodes: Vec<_> = tasks.iter().map(|t| graph.add_node(t.name())).collect();
    for task in tasks {
        for dep in task.dependencies() {
            graph.add_edge(nodes[dep.0], nodes[task.id.0], ());
        }
    }
    toposort(&graph, None)
        .map(|_| ())
        .map_err(|_| GenerateError::Internal("task graph contains a cycle"))
}

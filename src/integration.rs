//! Scripted replay of host interactions.
//!
//! A replay script is a JSON document describing a viewport, an initial
//! data source and a list of steps (batches, measurements, scrolling,
//! commits). [`replay`] drives a [`StateController`] through the steps and
//! records what the host would observe after each one. The binary uses this
//! to inspect layouts without a UI.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::config::{CompensationAnchor, LayoutSettings};
use crate::model::{ItemAlignment, ItemKind, ItemPath, LayoutError, ModelState, Size};
use crate::state::{
    CompensationState, ContentOffsetSnapshot, Edge, ElementSpec, LayoutAttributes, SectionSpec,
    SectionedDataSource, StateController, StructuralChange, Viewport,
};

/// Errors raised while loading or replaying a script.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ReplayError {
    /// The script file could not be read.
    #[error("Failed to read script at {path}: {reason}")]
    Read {
        /// Script path.
        path: PathBuf,
        /// Reason for failure.
        reason: String,
    },

    /// The script is not valid JSON or does not match the script format.
    #[error("Invalid script: {reason}")]
    Parse {
        /// Parse error details.
        reason: String,
    },

    /// A source edit addressed something that does not exist.
    #[error("Step {step}: source edit {edit} is out of range")]
    InvalidEdit {
        /// One-based step number.
        step: usize,
        /// Zero-based index of the edit within the step.
        edit: usize,
    },

    /// The controller rejected the step.
    #[error("Step {step}: {source}")]
    Layout {
        /// One-based step number.
        step: usize,
        /// Underlying layout error.
        source: LayoutError,
    },
}

/// A complete replay script.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReplayScript {
    /// Settings for this script. Falls back to the resolved configuration.
    #[serde(default)]
    pub settings: Option<LayoutSettings>,
    /// Initial viewport.
    #[serde(default)]
    pub viewport: Viewport,
    /// Initial data source.
    #[serde(default)]
    pub source: SectionedDataSource,
    /// Steps to replay in order.
    #[serde(default)]
    pub steps: Vec<ReplayStep>,
}

/// One host interaction.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case", deny_unknown_fields)]
pub enum ReplayStep {
    /// Update the data source, then process the structural changes.
    Batch {
        /// Replacement data source, applied before `edits`.
        #[serde(default)]
        source: Option<SectionedDataSource>,
        /// Incremental edits to the data source.
        #[serde(default)]
        edits: Vec<SourceEdit>,
        /// Changes describing what the edits did.
        changes: Vec<StructuralChange>,
    },
    /// Report an exact measurement.
    Measure {
        /// Element kind.
        #[serde(default = "default_kind")]
        kind: ItemKind,
        /// Element path.
        path: ItemPath,
        /// Measured size.
        size: Size,
        /// Snapshot the path addresses.
        #[serde(default = "default_state")]
        state: ModelState,
    },
    /// Change an element's alignment.
    Align {
        /// Element kind.
        #[serde(default = "default_kind")]
        kind: ItemKind,
        /// Element path.
        path: ItemPath,
        /// New alignment.
        alignment: ItemAlignment,
        /// Snapshot the path addresses.
        #[serde(default = "default_state")]
        state: ModelState,
    },
    /// Scroll to an absolute offset.
    Scroll {
        /// New vertical content offset.
        y: f64,
    },
    /// Apply pending compensation to the scroll offset, as a host does on
    /// its next layout pass.
    Settle,
    /// Promote the after-update snapshot.
    Commit,
    /// Rebuild from the current or a replacement data source.
    Reload {
        /// Replacement data source.
        #[serde(default)]
        source: Option<SectionedDataSource>,
    },
    /// Change the viewport size, keeping the anchored element in place.
    Resize {
        /// New viewport size.
        size: Size,
    },
}

fn default_kind() -> ItemKind {
    ItemKind::Cell
}

fn default_state() -> ModelState {
    ModelState::BeforeUpdate
}

/// An edit to a [`SectionedDataSource`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case", deny_unknown_fields)]
pub enum SourceEdit {
    /// Insert a section.
    InsertSection {
        /// Destination index.
        at: usize,
        /// Section description.
        section: SectionSpec,
    },
    /// Remove a section.
    RemoveSection {
        /// Source index.
        at: usize,
    },
    /// Move a section.
    MoveSection {
        /// Source index.
        from: usize,
        /// Destination index.
        to: usize,
    },
    /// Replace a section's description.
    ReplaceSection {
        /// Section index.
        at: usize,
        /// New description.
        section: SectionSpec,
    },
    /// Insert a cell.
    InsertItem {
        /// Destination path.
        path: ItemPath,
        /// Cell description.
        item: ElementSpec,
    },
    /// Remove a cell.
    RemoveItem {
        /// Source path.
        path: ItemPath,
    },
    /// Move a cell.
    MoveItem {
        /// Source path.
        from: ItemPath,
        /// Destination path.
        to: ItemPath,
    },
    /// Replace a cell's description.
    ReplaceItem {
        /// Cell path.
        path: ItemPath,
        /// New description.
        item: ElementSpec,
    },
}

impl SourceEdit {
    /// Apply to `source`. Returns `false` if the edit is out of range.
    pub fn apply(&self, source: &mut SectionedDataSource) -> bool {
        match self {
            Self::InsertSection { at, section } => source.insert_section(*at, section.clone()),
            Self::RemoveSection { at } => source.remove_section(*at).is_some(),
            Self::MoveSection { from, to } => source.move_section(*from, *to),
            Self::ReplaceSection { at, section } => source.replace_section(*at, section.clone()),
            Self::InsertItem { path, item } => source.insert_item(*path, *item),
            Self::RemoveItem { path } => source.remove_item(*path).is_some(),
            Self::MoveItem { from, to } => source.move_item(*from, *to),
            Self::ReplaceItem { path, item } => source.replace_item(*path, *item),
        }
    }
}

/// What the host observes after one step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepReport {
    /// Step number; 0 is the initial load.
    pub step: usize,
    /// Step action name.
    pub action: &'static str,
    /// Whether a batch is in flight after the step.
    pub batch_active: bool,
    /// Scroll offset after the step.
    pub content_offset: f64,
    /// Content height of the committed snapshot.
    pub content_height: f64,
    /// Content height of the after-update snapshot, during a batch.
    pub content_height_after_update: Option<f64>,
    /// Compensation accumulators after the step.
    pub compensation: CompensationState,
    /// Offset applied by a `settle` or `resize` step.
    pub applied_offset: Option<f64>,
    /// Elements in the visible area of the current snapshot.
    pub visible: Vec<LayoutAttributes>,
}

/// Full replay output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplayReport {
    /// Settings the replay ran with.
    pub settings: LayoutSettings,
    /// Report for the initial load followed by one per step.
    pub steps: Vec<StepReport>,
}

/// Read and parse a replay script.
///
/// # Errors
/// [`ReplayError::Read`] if the file cannot be read, [`ReplayError::Parse`]
/// if it is not a valid script.
pub fn load_script(path: &Path) -> Result<ReplayScript, ReplayError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ReplayError::Read {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    parse_script(&contents)
}

/// Parse a replay script from JSON text.
///
/// # Errors
/// [`ReplayError::Parse`] if the text is not a valid script.
pub fn parse_script(contents: &str) -> Result<ReplayScript, ReplayError> {
    serde_json::from_str(contents).map_err(|e| ReplayError::Parse {
        reason: e.to_string(),
    })
}

/// Settings a replay runs with: the script's own settings if present,
/// otherwise the configured ones, with the CLI anchor applied last.
pub fn resolve_settings(
    script: &ReplayScript,
    configured: LayoutSettings,
    anchor_override: Option<CompensationAnchor>,
) -> LayoutSettings {
    let mut settings = script.settings.unwrap_or(configured);
    if let Some(anchor) = anchor_override {
        settings.compensation_anchor = anchor;
    }
    settings.sanitized()
}

/// Replay `script` with `settings`.
///
/// # Errors
/// Stops at the first step the controller rejects or whose source edits
/// are out of range.
pub fn replay(script: &ReplayScript, settings: LayoutSettings) -> Result<ReplayReport, ReplayError> {
    let mut source = script.source.clone();
    let mut controller = StateController::new(settings, script.viewport);
    controller.reload_data(&source);

    let mut steps = Vec::with_capacity(script.steps.len() + 1);
    steps.push(observe(&mut controller, 0, "load", None));

    for (index, step) in script.steps.iter().enumerate() {
        let number = index + 1;
        let applied = run_step(&mut controller, &mut source, step, number)?;
        steps.push(observe(&mut controller, number, action_name(step), applied));
    }

    info!(steps = steps.len(), "replay finished");
    Ok(ReplayReport {
        settings: *controller.settings(),
        steps,
    })
}

fn run_step(
    controller: &mut StateController,
    source: &mut SectionedDataSource,
    step: &ReplayStep,
    number: usize,
) -> Result<Option<f64>, ReplayError> {
    let layout = |err: LayoutError| ReplayError::Layout {
        step: number,
        source: err,
    };
    debug!(step = number, action = action_name(step), "replaying step");

    match step {
        ReplayStep::Batch {
            source: replacement,
            edits,
            changes,
        } => {
            if let Some(replacement) = replacement {
                *source = replacement.clone();
            }
            for (edit_index, edit) in edits.iter().enumerate() {
                if !edit.apply(source) {
                    return Err(ReplayError::InvalidEdit {
                        step: number,
                        edit: edit_index,
                    });
                }
            }
            controller.process(changes, source).map_err(layout)?;
            Ok(None)
        }
        ReplayStep::Measure { kind, path, size, state } => {
            controller
                .update_measured_size(*kind, *path, *size, *state)
                .map_err(layout)?;
            Ok(None)
        }
        ReplayStep::Align {
            kind,
            path,
            alignment,
            state,
        } => {
            controller
                .update_alignment(*kind, *path, *alignment, *state)
                .map_err(layout)?;
            Ok(None)
        }
        ReplayStep::Scroll { y } => {
            controller.set_content_offset(*y);
            Ok(None)
        }
        ReplayStep::Settle => {
            let current = controller.viewport().content_offset.y;
            let target = controller.target_content_offset(current)
                + controller.take_batch_update_compensating_offset();
            controller.set_content_offset(target);
            Ok(Some(target - current))
        }
        ReplayStep::Commit => {
            controller.commit();
            Ok(None)
        }
        ReplayStep::Reload { source: replacement } => {
            if let Some(replacement) = replacement {
                *source = replacement.clone();
            }
            controller.reload_data(source);
            Ok(None)
        }
        ReplayStep::Resize { size } => Ok(resize(controller, *size)),
    }
}

/// Change width or height the way a host handles rotation: remember the
/// anchored element, invalidate measurements, then scroll it back.
fn resize(controller: &mut StateController, size: Size) -> Option<f64> {
    let edge = match controller.settings().compensation_anchor {
        CompensationAnchor::Bottom => Edge::Bottom,
        CompensationAnchor::Top | CompensationAnchor::Disabled => Edge::Top,
    };
    let snapshot: Option<ContentOffsetSnapshot> = controller.content_offset_snapshot(edge);
    let current = controller.viewport().content_offset.y;

    let viewport = Viewport {
        size,
        ..*controller.viewport()
    };
    controller.set_viewport(viewport);
    controller.invalidate_layout_metrics();

    let target = snapshot.and_then(|snapshot| controller.content_offset_for(&snapshot))?;
    controller.set_content_offset(target);
    Some(target - current)
}

fn observe(
    controller: &mut StateController,
    step: usize,
    action: &'static str,
    applied_offset: Option<f64>,
) -> StepReport {
    let batch_active = controller.is_batch_active();
    let state = if batch_active {
        ModelState::AfterUpdate
    } else {
        ModelState::BeforeUpdate
    };
    let visible_bounds = controller.viewport().visible_bounds();

    StepReport {
        step,
        action,
        batch_active,
        content_offset: controller.viewport().content_offset.y,
        content_height: controller
            .content_size(ModelState::BeforeUpdate)
            .map_or(0.0, |size| size.height),
        content_height_after_update: batch_active
            .then(|| controller.content_size(ModelState::AfterUpdate))
            .flatten()
            .map(|size| size.height),
        compensation: controller.compensation(),
        applied_offset,
        visible: controller.visible_attributes(visible_bounds, state),
    }
}

fn action_name(step: &ReplayStep) -> &'static str {
    match step {
        ReplayStep::Batch { .. } => "batch",
        ReplayStep::Measure { .. } => "measure",
        ReplayStep::Align { .. } => "align",
        ReplayStep::Scroll { .. } => "scroll",
        ReplayStep::Settle => "settle",
        ReplayStep::Commit => "commit",
        ReplayStep::Reload { .. } => "reload",
        ReplayStep::Resize { .. } => "resize",
    }
}

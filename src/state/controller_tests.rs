//! Tests for the state controller.

use super::*;
use crate::state::provider::{ElementSpec, SectionSpec, SectionedDataSource};

const HEIGHT: f64 = 40.0;
const SPACING: f64 = 7.0;
const VIEWPORT_HEIGHT: f64 = 600.0;

fn settings(anchor: CompensationAnchor) -> LayoutSettings {
    LayoutSettings {
        estimated_item_size: Size::new(300.0, HEIGHT),
        inter_item_spacing: SPACING,
        inter_section_spacing: 3.0,
        compensation_anchor: anchor,
        ..LayoutSettings::default()
    }
}

fn source(counts: &[usize]) -> SectionedDataSource {
    SectionedDataSource::new(
        counts
            .iter()
            .map(|&count| SectionSpec::uniform(count, ElementSpec::estimated(300.0, HEIGHT)))
            .collect(),
    )
}

fn controller(counts: &[usize], anchor: CompensationAnchor) -> (StateController, SectionedDataSource) {
    let source = source(counts);
    let mut controller = StateController::new(
        settings(anchor),
        Viewport::new(Size::new(300.0, VIEWPORT_HEIGHT)),
    );
    controller.reload_data(&source);
    (controller, source)
}

/// 100 cells: content height 100 * 40 + 99 * 7.
const LONG_LIST_HEIGHT: f64 = 4693.0;

fn scrolled_to_bottom(anchor: CompensationAnchor) -> (StateController, SectionedDataSource) {
    let (mut controller, source) = controller(&[100], anchor);
    controller.set_content_offset(LONG_LIST_HEIGHT - VIEWPORT_HEIGHT);
    (controller, source)
}

fn insert_at(
    controller: &mut StateController,
    source: &mut SectionedDataSource,
    path: ItemPath,
) -> Result<(), LayoutError> {
    source.insert_item(path, ElementSpec::estimated(300.0, HEIGHT));
    controller.process(&[StructuralChange::ItemInsert { path }], source)
}

// ===== Snapshots and lifecycle =====

#[test]
fn reload_data_builds_committed_snapshot() {
    let (controller, _) = controller(&[100], CompensationAnchor::Disabled);

    assert!(!controller.is_batch_active());
    assert_eq!(
        controller.content_size(ModelState::BeforeUpdate),
        Some(Size::new(300.0, LONG_LIST_HEIGHT))
    );
}

#[test]
fn after_update_queries_outside_batch_return_none() {
    let (controller, _) = controller(&[3], CompensationAnchor::Disabled);
    let path = ItemPath::new(0, 0);

    assert_eq!(controller.frame_for(ItemKind::Cell, path, ModelState::AfterUpdate), None);
    assert_eq!(controller.identity_at(path, ItemKind::Cell, ModelState::AfterUpdate), None);
    assert_eq!(controller.content_size(ModelState::AfterUpdate), None);
}

#[test]
fn process_then_commit_promotes_after_update() {
    let (mut controller, mut source) = controller(&[3], CompensationAnchor::Disabled);

    insert_at(&mut controller, &mut source, ItemPath::new(0, 3)).expect("valid batch");
    assert!(controller.is_batch_active());
    assert_eq!(controller.model(ModelState::BeforeUpdate).map(|m| m.element_count()), Some(3));
    assert_eq!(controller.model(ModelState::AfterUpdate).map(|m| m.element_count()), Some(4));

    controller.commit();

    assert!(!controller.is_batch_active());
    assert!(controller.tracker().is_empty());
    assert_eq!(controller.model(ModelState::BeforeUpdate).map(|m| m.element_count()), Some(4));
}

#[test]
fn second_batch_before_commit_is_rejected() {
    let (mut controller, mut source) = controller(&[3], CompensationAnchor::Disabled);
    insert_at(&mut controller, &mut source, ItemPath::new(0, 0)).expect("valid batch");

    let result = insert_at(&mut controller, &mut source, ItemPath::new(0, 0));
    assert_eq!(result, Err(LayoutError::BatchAlreadyActive));
}

#[test]
fn rejected_batch_leaves_state_untouched() {
    let (mut controller, source) = scrolled_to_bottom(CompensationAnchor::Bottom);
    let before = controller.model(ModelState::BeforeUpdate).cloned();

    // Host did not update its data: counts disagree
    let result = controller.process(
        &[StructuralChange::ItemInsert { path: ItemPath::new(0, 0) }],
        &source,
    );

    assert!(matches!(result, Err(LayoutError::InconsistentBatch { .. })));
    assert!(!controller.is_batch_active());
    assert!(controller.tracker().is_empty());
    assert!(controller.compensation().is_zero());
    assert_eq!(controller.model(ModelState::BeforeUpdate).cloned(), before);
}

#[test]
fn identity_bridge_follows_moves() {
    let (mut controller, mut source) = controller(&[100, 100, 100], CompensationAnchor::Disabled);
    let height = controller.content_size(ModelState::BeforeUpdate).map(|s| s.height);
    let moves = [((0, 0), (2, 0)), ((1, 0), (1, 1)), ((2, 0), (0, 0))]
        .map(|(from, to)| (ItemPath::from(from), ItemPath::from(to)));
    let ids: Vec<_> = moves
        .iter()
        .map(|&(from, _)| controller.identity_at(from, ItemKind::Cell, ModelState::BeforeUpdate))
        .collect();

    for &(from, to) in &moves {
        source.move_item(from, to);
    }
    let changes: Vec<_> = moves
        .iter()
        .map(|&(from, to)| StructuralChange::ItemMove { from, to })
        .collect();
    controller.process(&changes, &source).expect("valid batch");

    assert_eq!(controller.content_size(ModelState::AfterUpdate).map(|s| s.height), height);
    for (id, &(_, to)) in ids.iter().zip(&moves) {
        assert_eq!(controller.identity_at(to, ItemKind::Cell, ModelState::AfterUpdate), *id);
    }
    let first = ids[0].expect("identity exists");
    assert_eq!(controller.path_for(first, ModelState::AfterUpdate), Some(ItemPath::new(2, 0)));
    assert_eq!(controller.path_for(first, ModelState::BeforeUpdate), Some(ItemPath::new(0, 0)));
}

#[test]
fn section_identity_is_queryable() {
    let (controller, _) = controller(&[1, 1], CompensationAnchor::Disabled);
    let id = controller
        .section_identity_at(1, ModelState::BeforeUpdate)
        .expect("section exists");
    assert_eq!(controller.section_index_for(id, ModelState::BeforeUpdate), Some(1));
    assert_eq!(controller.section_identity_at(2, ModelState::BeforeUpdate), None);
}

// ===== Frames and visible attributes =====

#[test]
fn frame_for_places_cells_with_spacing() {
    let (controller, _) = controller(&[3], CompensationAnchor::Disabled);
    let frame = controller.frame_for(ItemKind::Cell, ItemPath::new(0, 2), ModelState::BeforeUpdate);
    assert_eq!(frame, Some(Rect::new(0.0, 94.0, 300.0, 40.0)));
}

#[test]
fn frame_for_missing_element_is_none() {
    let (controller, _) = controller(&[3], CompensationAnchor::Disabled);
    assert_eq!(
        controller.frame_for(ItemKind::Cell, ItemPath::new(0, 3), ModelState::BeforeUpdate),
        None
    );
    assert_eq!(
        controller.frame_for(ItemKind::Header, ItemPath::new(0, 0), ModelState::BeforeUpdate),
        None
    );
}

#[test]
fn visible_attributes_match_full_scan_while_scrolling() {
    let (mut controller, _) = controller(&[40, 40, 40], CompensationAnchor::Disabled);
    for step in 0..30 {
        let rect = Rect::new(0.0, f64::from(step) * 97.0, 300.0, VIEWPORT_HEIGHT);
        let cached = controller.visible_attributes(rect, ModelState::BeforeUpdate);
        let full = controller.scan_attributes(rect, ModelState::BeforeUpdate, ScanMode::Exhaustive);
        assert_eq!(cached, full, "mismatch at step {step}");
    }
}

#[test]
fn visible_attributes_refresh_after_measurement() {
    let (mut controller, _) = controller(&[20], CompensationAnchor::Disabled);
    let rect = Rect::new(0.0, 0.0, 300.0, 200.0);
    let initial = controller.visible_attributes(rect, ModelState::BeforeUpdate);

    controller
        .update_measured_size(ItemKind::Cell, ItemPath::new(0, 0), Size::new(300.0, 190.0), ModelState::BeforeUpdate)
        .expect("element exists");

    let refreshed = controller.visible_attributes(rect, ModelState::BeforeUpdate);
    assert_ne!(initial, refreshed);
    assert_eq!(
        refreshed,
        controller.scan_attributes(rect, ModelState::BeforeUpdate, ScanMode::Exhaustive)
    );
}

#[test]
fn visible_attributes_for_after_update_without_batch_are_empty() {
    let (mut controller, _) = controller(&[5], CompensationAnchor::Disabled);
    let rect = Rect::new(0.0, 0.0, 300.0, 600.0);
    assert!(controller.visible_attributes(rect, ModelState::AfterUpdate).is_empty());
}

#[test]
fn update_alignment_moves_frame_horizontally() {
    let source = SectionedDataSource::new(vec![SectionSpec::uniform(
        2,
        ElementSpec::estimated(100.0, HEIGHT).aligned(ItemAlignment::Leading),
    )]);
    let mut controller = StateController::new(
        settings(CompensationAnchor::Disabled),
        Viewport::new(Size::new(300.0, VIEWPORT_HEIGHT)),
    );
    controller.reload_data(&source);
    let path = ItemPath::new(0, 1);
    let rect = Rect::new(0.0, 0.0, 300.0, 600.0);
    controller.visible_attributes(rect, ModelState::BeforeUpdate);

    controller
        .update_alignment(ItemKind::Cell, path, ItemAlignment::Trailing, ModelState::BeforeUpdate)
        .expect("element exists");

    let frame = controller.frame_for(ItemKind::Cell, path, ModelState::BeforeUpdate).unwrap();
    assert_eq!((frame.min_x(), frame.min_y()), (200.0, 47.0));
    let visible = controller.visible_attributes(rect, ModelState::BeforeUpdate);
    assert_eq!(visible[1].frame, frame);
}

#[test]
fn measuring_missing_cell_reports_section_length() {
    let (mut controller, _) = controller(&[2], CompensationAnchor::Disabled);
    let path = ItemPath::new(0, 5);

    let result = controller.update_measured_size(ItemKind::Cell, path, Size::new(300.0, 10.0), ModelState::BeforeUpdate);
    assert_eq!(
        result,
        Err(LayoutError::ItemOutOfRange {
            path,
            count: 2,
            state: ModelState::BeforeUpdate,
        })
    );

    // A section without a header has nothing to measure there either
    let header = controller.update_measured_size(
        ItemKind::Header,
        ItemPath::new(0, 0),
        Size::new(300.0, 10.0),
        ModelState::BeforeUpdate,
    );
    assert!(matches!(header, Err(LayoutError::ItemOutOfRange { count: 2, .. })));
    assert_eq!(controller.content_size(ModelState::BeforeUpdate), Some(Size::new(300.0, 87.0)));
}

#[test]
fn update_on_missing_element_is_an_error() {
    let (mut controller, _) = controller(&[2], CompensationAnchor::Disabled);

    let result = controller.update_measured_size(
        ItemKind::Cell,
        ItemPath::new(3, 0),
        Size::new(300.0, 10.0),
        ModelState::BeforeUpdate,
    );
    assert!(matches!(result, Err(LayoutError::SectionOutOfRange { section: 3, count: 1, .. })));

    let result = controller.update_alignment(
        ItemKind::Cell,
        ItemPath::new(0, 0),
        ItemAlignment::Center,
        ModelState::AfterUpdate,
    );
    assert_eq!(result, Err(LayoutError::NoActiveBatch));
}

#[test]
fn zero_width_leading_cell_stays_visible() {
    let source = SectionedDataSource::new(vec![SectionSpec::uniform(
        1,
        ElementSpec::exact(0.0, HEIGHT).aligned(ItemAlignment::Leading),
    )]);
    let mut controller = StateController::new(
        settings(CompensationAnchor::Disabled),
        Viewport::new(Size::new(300.0, VIEWPORT_HEIGHT)),
    );
    controller.reload_data(&source);
    let path = ItemPath::new(0, 0);

    let frame = controller
        .frame_for(ItemKind::Cell, path, ModelState::BeforeUpdate)
        .expect("cell exists");
    assert_eq!(frame, Rect::new(0.0, 0.0, 0.0, HEIGHT));

    let visible = controller.visible_attributes(Rect::new(0.0, 0.0, 300.0, VIEWPORT_HEIGHT), ModelState::BeforeUpdate);
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].path, path);
}

#[test]
fn viewport_resize_invalidates_frames() {
    let source = SectionedDataSource::new(vec![SectionSpec::uniform(
        1,
        ElementSpec::estimated(100.0, HEIGHT).aligned(ItemAlignment::Trailing),
    )]);
    let mut controller = StateController::new(
        settings(CompensationAnchor::Disabled),
        Viewport::new(Size::new(300.0, VIEWPORT_HEIGHT)),
    );
    controller.reload_data(&source);
    let rect = Rect::new(0.0, 0.0, 500.0, 600.0);
    assert_eq!(controller.visible_attributes(rect, ModelState::BeforeUpdate)[0].frame.min_x(), 200.0);

    controller.set_viewport(Viewport::new(Size::new(500.0, VIEWPORT_HEIGHT)));

    assert_eq!(controller.visible_attributes(rect, ModelState::BeforeUpdate)[0].frame.min_x(), 400.0);
}

// ===== Compensation =====

#[test]
fn insert_above_bottom_anchor_proposes_height_and_spacing() {
    let (mut controller, mut source) = scrolled_to_bottom(CompensationAnchor::Bottom);

    insert_at(&mut controller, &mut source, ItemPath::new(0, 0)).expect("valid batch");

    assert_eq!(controller.compensation().proposed(), HEIGHT + SPACING);
    let proposed_y = LONG_LIST_HEIGHT - VIEWPORT_HEIGHT;
    assert_eq!(controller.target_content_offset(proposed_y), proposed_y + HEIGHT + SPACING);
    assert_eq!(controller.compensation().proposed(), 0.0);
    assert_eq!(controller.compensation().total_proposed(), HEIGHT + SPACING);

    controller.commit();
    assert!(controller.compensation().is_zero());
}

#[test]
fn insert_below_visible_area_needs_no_compensation() {
    let (mut controller, mut source) = controller(&[100], CompensationAnchor::Bottom);

    insert_at(&mut controller, &mut source, ItemPath::new(0, 50)).expect("valid batch");

    assert!(controller.compensation().is_zero());
}

#[test]
fn disabled_anchor_never_compensates() {
    let (mut controller, mut source) = scrolled_to_bottom(CompensationAnchor::Disabled);

    insert_at(&mut controller, &mut source, ItemPath::new(0, 0)).expect("valid batch");

    assert!(controller.compensation().is_zero());
    assert_eq!(controller.target_content_offset(100.0), 100.0);
}

#[test]
fn short_content_needs_no_compensation() {
    let (mut controller, mut source) = controller(&[3], CompensationAnchor::Bottom);

    insert_at(&mut controller, &mut source, ItemPath::new(0, 0)).expect("valid batch");

    assert!(controller.compensation().is_zero());
}

#[test]
fn delete_above_bottom_anchor_proposes_negative_offset() {
    let (mut controller, mut source) = scrolled_to_bottom(CompensationAnchor::Bottom);
    let path = ItemPath::new(0, 0);
    source.remove_item(path);

    controller
        .process(&[StructuralChange::ItemDelete { path }], &source)
        .expect("valid batch");

    assert_eq!(controller.compensation().proposed(), -(HEIGHT + SPACING));
}

/// Frame of the cell the bottom anchor keeps in place, in `state`.
fn anchored_frame(controller: &StateController, path: ItemPath, state: ModelState) -> Rect {
    controller
        .model(state)
        .and_then(|model| model.element_frame(path, ItemKind::Cell))
        .expect("anchored cell exists")
}

fn bottom_of_sections(counts: &[usize]) -> (StateController, SectionedDataSource) {
    let (mut controller, source) = controller(counts, CompensationAnchor::Bottom);
    let height = controller
        .content_size(ModelState::BeforeUpdate)
        .map_or(0.0, |size| size.height);
    controller.set_content_offset(height - VIEWPORT_HEIGHT);
    (controller, source)
}

#[test]
fn first_cell_into_empty_section_compensates_by_height_only() {
    let (mut controller, mut source) = bottom_of_sections(&[0, 100]);
    let before = anchored_frame(&controller, ItemPath::new(1, 99), ModelState::BeforeUpdate);

    insert_at(&mut controller, &mut source, ItemPath::new(0, 0)).expect("valid batch");

    let after = anchored_frame(&controller, ItemPath::new(1, 99), ModelState::AfterUpdate);
    assert_eq!(after.min_y() - before.min_y(), HEIGHT);
    assert_eq!(controller.compensation().proposed(), HEIGHT);
}

#[test]
fn last_cell_out_of_section_compensates_by_height_only() {
    let (mut controller, mut source) = bottom_of_sections(&[1, 100]);
    let before = anchored_frame(&controller, ItemPath::new(1, 99), ModelState::BeforeUpdate);
    let path = ItemPath::new(0, 0);
    source.remove_item(path);

    controller
        .process(&[StructuralChange::ItemDelete { path }], &source)
        .expect("valid batch");

    let after = anchored_frame(&controller, ItemPath::new(1, 99), ModelState::AfterUpdate);
    assert_eq!(after.min_y() - before.min_y(), -HEIGHT);
    assert_eq!(controller.compensation().proposed(), -HEIGHT);
}

#[test]
fn cells_filling_empty_section_share_gaps_between_them() {
    let (mut controller, mut source) = bottom_of_sections(&[0, 100]);
    let before = anchored_frame(&controller, ItemPath::new(1, 99), ModelState::BeforeUpdate);
    let paths: Vec<_> = (0..3).map(|item| ItemPath::new(0, item)).collect();
    for &path in &paths {
        source.insert_item(path, ElementSpec::estimated(300.0, HEIGHT));
    }
    let changes: Vec<_> = paths.iter().map(|&path| StructuralChange::ItemInsert { path }).collect();

    controller.process(&changes, &source).expect("valid batch");

    let after = anchored_frame(&controller, ItemPath::new(1, 99), ModelState::AfterUpdate);
    assert_eq!(after.min_y() - before.min_y(), 3.0 * HEIGHT + 2.0 * SPACING);
    assert_eq!(controller.compensation().proposed(), after.min_y() - before.min_y());
}

#[test]
fn emptying_section_with_several_cells_drops_one_gap_less() {
    let (mut controller, mut source) = bottom_of_sections(&[2, 100]);
    let before = anchored_frame(&controller, ItemPath::new(1, 99), ModelState::BeforeUpdate);
    let paths = [ItemPath::new(0, 0), ItemPath::new(0, 1)];
    source.remove_item(paths[1]);
    source.remove_item(paths[0]);
    let changes: Vec<_> = paths.iter().map(|&path| StructuralChange::ItemDelete { path }).collect();

    controller.process(&changes, &source).expect("valid batch");

    let after = anchored_frame(&controller, ItemPath::new(1, 99), ModelState::AfterUpdate);
    assert_eq!(after.min_y() - before.min_y(), -(2.0 * HEIGHT + SPACING));
    assert_eq!(controller.compensation().proposed(), after.min_y() - before.min_y());
}

#[test]
fn top_anchor_compensates_only_above_top_edge() {
    let (mut controller, mut source) = controller(&[100], CompensationAnchor::Top);
    controller.set_content_offset(1000.0);

    // (0, 30) lands at 1410, below the top edge
    insert_at(&mut controller, &mut source, ItemPath::new(0, 30)).expect("valid batch");
    assert!(controller.compensation().is_zero());
    controller.commit();

    insert_at(&mut controller, &mut source, ItemPath::new(0, 0)).expect("valid batch");
    assert_eq!(controller.compensation().proposed(), HEIGHT + SPACING);
}

#[test]
fn measurement_above_anchor_accumulates_batch_update_offset() {
    let (mut controller, _) = scrolled_to_bottom(CompensationAnchor::Bottom);

    controller
        .update_measured_size(ItemKind::Cell, ItemPath::new(0, 0), Size::new(300.0, 100.0), ModelState::BeforeUpdate)
        .expect("element exists");

    assert_eq!(controller.compensation().batch_update(), 60.0);
    assert_eq!(controller.take_batch_update_compensating_offset(), 60.0);
    assert_eq!(controller.take_batch_update_compensating_offset(), 0.0);
}

#[test]
fn measurement_below_anchor_is_not_compensated() {
    let (mut controller, _) = controller(&[100], CompensationAnchor::Bottom);

    controller
        .update_measured_size(ItemKind::Cell, ItemPath::new(0, 50), Size::new(300.0, 100.0), ModelState::BeforeUpdate)
        .expect("element exists");

    assert_eq!(controller.compensation().batch_update(), 0.0);
}

#[test]
fn batch_update_offset_is_held_during_batch() {
    let (mut controller, mut source) = scrolled_to_bottom(CompensationAnchor::Bottom);
    insert_at(&mut controller, &mut source, ItemPath::new(0, 99)).expect("valid batch");

    controller
        .update_measured_size(ItemKind::Cell, ItemPath::new(0, 0), Size::new(300.0, 100.0), ModelState::AfterUpdate)
        .expect("element exists");

    assert_eq!(controller.take_batch_update_compensating_offset(), 0.0);
    assert_eq!(controller.compensation().batch_update(), 60.0);
}

#[test]
fn measurement_of_committed_snapshot_is_mirrored_into_batch() {
    let (mut controller, mut source) = controller(&[3], CompensationAnchor::Disabled);
    insert_at(&mut controller, &mut source, ItemPath::new(0, 0)).expect("valid batch");

    controller
        .update_measured_size(ItemKind::Cell, ItemPath::new(0, 0), Size::new(300.0, 100.0), ModelState::BeforeUpdate)
        .expect("element exists");

    let after = controller.model(ModelState::AfterUpdate).expect("batch active");
    let item = after.element(ItemPath::new(0, 1), ItemKind::Cell).expect("shifted cell");
    assert_eq!(item.height(), 100.0);
}

#[test]
fn total_compensation_offsets_frames_both_ways() {
    let (mut controller, mut source) = scrolled_to_bottom(CompensationAnchor::Bottom);
    insert_at(&mut controller, &mut source, ItemPath::new(0, 0)).expect("valid batch");
    controller.target_content_offset(0.0);

    let frame = Rect::new(0.0, 100.0, 300.0, 40.0);
    let total = HEIGHT + SPACING;
    assert_eq!(
        controller.offset_by_total_compensation(frame, ModelState::AfterUpdate, false),
        frame.offset_by(0.0, total)
    );
    assert_eq!(
        controller.offset_by_total_compensation(frame, ModelState::AfterUpdate, true),
        frame.offset_by(0.0, -total)
    );
    assert_eq!(
        controller.offset_by_total_compensation(frame, ModelState::BeforeUpdate, false),
        frame
    );
}

#[test]
fn after_update_visible_region_includes_compensated_rect() {
    let (mut controller, mut source) = scrolled_to_bottom(CompensationAnchor::Bottom);
    insert_at(&mut controller, &mut source, ItemPath::new(0, 0)).expect("valid batch");

    let rect = Rect::new(0.0, LONG_LIST_HEIGHT - VIEWPORT_HEIGHT, 300.0, VIEWPORT_HEIGHT);
    let visible = controller.visible_attributes(rect, ModelState::AfterUpdate);

    assert_eq!(
        visible,
        controller.scan_attributes(rect, ModelState::AfterUpdate, ScanMode::Exhaustive)
    );
    let last = visible.last().expect("something visible");
    assert_eq!(last.path, ItemPath::new(0, 100));
}

// ===== Transitions =====

#[test]
fn inserted_element_appears_from_compensated_frame() {
    let (mut controller, mut source) = scrolled_to_bottom(CompensationAnchor::Bottom);
    insert_at(&mut controller, &mut source, ItemPath::new(0, 0)).expect("valid batch");
    controller.target_content_offset(0.0);

    let appearing = controller
        .appearing_attributes(ItemPath::new(0, 0), ItemKind::Cell)
        .expect("element exists");

    assert_eq!(appearing.transition, Transition::Inserted);
    assert_eq!(appearing.attributes.frame.min_y(), -(HEIGHT + SPACING));
}

#[test]
fn persisted_element_appears_from_previous_position() {
    let (mut controller, mut source) = controller(&[5], CompensationAnchor::Disabled);
    let id = controller.identity_at(ItemPath::new(0, 0), ItemKind::Cell, ModelState::BeforeUpdate);
    insert_at(&mut controller, &mut source, ItemPath::new(0, 0)).expect("valid batch");

    let appearing = controller
        .appearing_attributes(ItemPath::new(0, 1), ItemKind::Cell)
        .expect("element exists");

    assert_eq!(appearing.transition, Transition::Persisted);
    assert_eq!(Some(appearing.attributes.id), id);
    assert_eq!(appearing.attributes.frame.min_y(), 0.0);
}

#[test]
fn deleted_element_disappears_and_persisted_one_travels() {
    let (mut controller, mut source) = controller(&[5], CompensationAnchor::Disabled);
    source.remove_item(ItemPath::new(0, 0));
    controller
        .process(&[StructuralChange::ItemDelete { path: ItemPath::new(0, 0) }], &source)
        .expect("valid batch");

    let deleted = controller
        .disappearing_attributes(ItemPath::new(0, 0), ItemKind::Cell)
        .expect("element existed");
    assert_eq!(deleted.transition, Transition::Deleted);

    let persisted = controller
        .disappearing_attributes(ItemPath::new(0, 1), ItemKind::Cell)
        .expect("element existed");
    assert_eq!(persisted.transition, Transition::Persisted);
    assert_eq!(persisted.attributes.frame.min_y(), 0.0);
}

// ===== Content offset snapshots =====

#[test]
fn top_edge_snapshot_follows_growth_above() {
    let (mut controller, _) = controller(&[100], CompensationAnchor::Disabled);
    controller.set_content_offset(1000.0);

    let snapshot = controller.content_offset_snapshot(Edge::Top).expect("content visible");
    assert_eq!(snapshot.path, ItemPath::new(0, 21));
    assert_eq!(snapshot.distance, -13.0);

    controller
        .update_measured_size(ItemKind::Cell, ItemPath::new(0, 0), Size::new(300.0, 100.0), ModelState::BeforeUpdate)
        .expect("element exists");

    assert_eq!(controller.content_offset_for(&snapshot), Some(1060.0));
}

#[test]
fn bottom_edge_snapshot_round_trips() {
    let (mut controller, _) = controller(&[100], CompensationAnchor::Disabled);
    controller.set_content_offset(1000.0);

    let snapshot = controller.content_offset_snapshot(Edge::Bottom).expect("content visible");
    assert_eq!(snapshot.path, ItemPath::new(0, 34));

    assert_eq!(controller.content_offset_for(&snapshot), Some(1000.0));
}

#[test]
fn snapshot_falls_back_to_path_after_full_reload() {
    let (mut controller, source) = controller(&[100], CompensationAnchor::Disabled);
    controller.set_content_offset(1000.0);
    let snapshot = controller.content_offset_snapshot(Edge::Top).expect("content visible");

    controller.reload_data(&source);

    assert_eq!(controller.path_for(snapshot.id, ModelState::BeforeUpdate), None);
    assert_eq!(controller.content_offset_for(&snapshot), Some(1000.0));
}

#[test]
fn snapshot_offset_is_clamped_to_scrollable_range() {
    let (mut controller, mut source) = controller(&[100], CompensationAnchor::Disabled);
    controller.set_content_offset(LONG_LIST_HEIGHT - VIEWPORT_HEIGHT);
    let snapshot = controller.content_offset_snapshot(Edge::Top).expect("content visible");
    assert_eq!(snapshot.path, ItemPath::new(0, 87));

    for index in (90..100).rev() {
        source.remove_item(ItemPath::new(0, index));
    }
    controller.reload_data(&source);

    // 90 cells leave a scrollable range of 0..=3623
    assert_eq!(controller.content_offset_for(&snapshot), Some(3623.0));
}

#[test]
fn snapshot_of_vanished_element_is_none() {
    let (mut controller, mut source) = controller(&[100], CompensationAnchor::Disabled);
    controller.set_content_offset(LONG_LIST_HEIGHT - VIEWPORT_HEIGHT);
    let snapshot = controller.content_offset_snapshot(Edge::Bottom).expect("content visible");

    for _ in 0..50 {
        source.remove_item(ItemPath::new(0, 0));
    }
    controller.reload_data(&source);

    assert_eq!(controller.content_offset_for(&snapshot), None);

    let empty = StateController::new(
        settings(CompensationAnchor::Disabled),
        Viewport::new(Size::new(300.0, VIEWPORT_HEIGHT)),
    );
    assert_eq!(empty.content_offset_snapshot(Edge::Top), None);
}

// ===== Metrics =====

#[test]
fn invalidate_layout_metrics_keeps_measured_heights_as_estimates() {
    let (mut controller, _) = controller(&[10], CompensationAnchor::Disabled);
    controller
        .update_measured_size(ItemKind::Cell, ItemPath::new(0, 3), Size::new(300.0, 90.0), ModelState::BeforeUpdate)
        .expect("element exists");
    let height = controller.content_size(ModelState::BeforeUpdate);

    controller.invalidate_layout_metrics();

    assert_eq!(controller.content_size(ModelState::BeforeUpdate), height);
    let model = controller.model(ModelState::BeforeUpdate).unwrap();
    assert_eq!(model.element(ItemPath::new(0, 3), ItemKind::Cell).unwrap().calculated_size(), None);
}

#[test]
fn keep_content_at_bottom_pins_short_transcripts() {
    let source = source(&[2]);
    let mut controller = StateController::new(
        LayoutSettings {
            keep_content_at_bottom_of_visible_area: true,
            ..settings(CompensationAnchor::Disabled)
        },
        Viewport::new(Size::new(300.0, VIEWPORT_HEIGHT)),
    );
    controller.reload_data(&source);

    let frame = controller
        .frame_for(ItemKind::Cell, ItemPath::new(0, 1), ModelState::BeforeUpdate)
        .unwrap();
    assert_eq!(frame.max_y(), VIEWPORT_HEIGHT);
    assert_eq!(
        controller.content_size(ModelState::BeforeUpdate).map(|s| s.height),
        Some(VIEWPORT_HEIGHT)
    );
}

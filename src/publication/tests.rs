use super::*;
use crate::division::{BasicView, DivisionLayoutManager, GroupingScope};
use crate::geometry::{BindingEdge, DivisionSettings, Margins, PublicationGeometry, Sides, StartAt};
use crate::page::PageHandle;
use crate::stream::{Block, BlockStream, ContentStream, DependentRef, NoteStream, ObjectId, SharedStream};
use crate::{Point, Rect};
use proptest::prelude::*;
use std::cell::RefCell;
use std::rc::Rc;

// Letter paper at 720 dpi with one-inch margins: 6480px of text per page,
// 1056px tall pages on a 96 dpi screen, 10px between pages

const FULL: i32 = i32::MAX;

fn controller() -> PublicationController {
    PublicationController::new(PublicationGeometry::default()).unwrap()
}

fn division(stream: SharedStream, settings: DivisionSettings) -> DivisionLayoutManager {
    DivisionLayoutManager::new(settings, stream, BasicView::new(ObjectId(1))).unwrap()
}

fn single(stream: BlockStream) -> (PublicationController, SharedStream) {
    let stream = SharedStream::new(stream);
    let mut controller = controller();
    controller.add_division(division(stream.clone(), DivisionSettings::default()));
    controller.create_pages();
    (controller, stream)
}

/// Blocks of `lines` 20px lines whose estimate is `ratio` times the truth
fn lazy_blocks(count: usize, lines: usize, ratio: f64) -> BlockStream {
    BlockStream::new(
        (0..count)
            .map(|i| {
                let block = Block::new(ObjectId(i as u64 + 1), lines, 20);
                let estimate = (block.real_height() as f64 * ratio) as i32;
                block.with_estimate(estimate)
            })
            .collect(),
    )
}

/// Each laid-out page of a division starts exactly where the previous one
/// stopped
fn assert_contiguous(controller: &PublicationController, division: usize) {
    let pages: Vec<_> = controller
        .pages()
        .iter()
        .filter(|page| page.contains_division(division))
        .collect();
    for pair in pages.windows(2) {
        let end = pair[0]
            .elements()
            .iter()
            .filter(|e| e.division() == division && e.is_main_stream())
            .map(|e| e.stream_range().1)
            .max()
            .unwrap();
        assert_eq!(pair[1].offset_from_top_of_div(division), Some(end));
    }
}

fn assert_close(actual: i32, expected: i32) {
    assert!((actual - expected).abs() <= 1, "{actual} is not within 1px of {expected}");
}

#[test]
fn test_zoom_fills_available_width() {
    let geometry = PublicationGeometry {
        page_width: 8 * 72000,
        ..PublicationGeometry::default()
    };
    let controller = PublicationController::new(geometry).unwrap();

    assert_eq!(controller.calculate_zoom_factor(40 * 96), 5.0);
    assert_eq!(controller.calculate_zoom_factor(4 * 96), 0.5);
    assert_eq!(controller.calculate_zoom_factor(0), 1.0);
}

#[test]
fn test_invalid_zoom_is_ignored() {
    let mut controller = controller();
    controller.set_zoom(2.0);
    controller.set_zoom(0.0);
    controller.set_zoom(f64::NAN);
    assert_eq!(controller.zoom(), 2.0);
    assert_eq!(controller.page_height_screen(), 2112);
}

#[test]
fn test_create_pages_slices_estimate() {
    let (controller, _) = single(BlockStream::uniform(10, 100, 20));

    let offsets: Vec<_> = controller
        .pages()
        .iter()
        .map(|page| page.offset_from_top_of_div(0).unwrap())
        .collect();
    assert_eq!(offsets, vec![0, 6480, 12960, 19440]);
    assert!(controller.pages().iter().all(|page| page.needs_layout()));

    let numbers: Vec<_> = controller.pages().iter().map(|page| page.page_number()).collect();
    assert_eq!(numbers, vec![1, 2, 3, 4]);
    assert_eq!(controller.auto_scroll_min_size(), crate::Size::new(836, 4 * 1066 + 10));
}

#[test]
fn test_empty_division_has_no_pages() {
    let (mut controller, _) = single(BlockStream::default());

    assert_eq!(controller.page_count(), 0);
    assert!(controller.prepare_to_draw_pages(0, FULL).is_empty());
    assert_eq!(controller.page_rect(0), None);
    assert_eq!(controller.element_from_point(Point::new(100, 100), Point::default()), None);
    assert_eq!(controller.auto_scroll_min_size().height, 10);
}

#[test]
fn test_queries_before_create_pages() {
    let stream = SharedStream::new(BlockStream::uniform(1, 10, 20));
    let mut controller = controller();
    controller.add_division(division(stream.clone(), DivisionSettings::default()));

    assert!(controller.pages().is_empty());
    assert!(controller.page_from_printer_y(0, 10, false, None).is_none());
    assert!(controller
        .invalid_rects(&stream, Rect::new(0, 0, 10, 10), Point::default())
        .is_empty());
}

#[test]
fn test_exact_estimate_keeps_page_count() {
    let (mut controller, stream) = single(BlockStream::uniform(5, 10, 20));
    assert_eq!(controller.page_count(), 1);

    let pages = controller.prepare_to_draw_pages(0, FULL);
    assert_eq!(pages.len(), 1);
    assert!(!pages[0].needs_layout());
    assert_eq!(pages[0].elements().len(), 1);
    assert_eq!(pages[0].elements()[0].location().height, 1000);

    controller.adjust_scroll_range(&stream, 0, 0);
    assert_eq!(controller.page_count(), 1);
}

#[test]
fn test_lazy_growth_inserts_pages() {
    // Real content is twelve times the estimate
    let (mut controller, _) = single(lazy_blocks(40, 50, 1.0 / 12.0));
    controller.set_scroll_position(Point::new(0, 500));
    let estimated = controller.page_count();
    assert_eq!(estimated, 1);

    controller.prepare_to_draw_pages(0, FULL);

    assert!(controller.page_count() > estimated);
    assert_eq!(controller.page_count(), 7);
    assert_eq!(controller.scroll_position(), Point::new(0, 500));
    assert!(controller.pages().iter().all(|page| !page.needs_layout()));
    assert_contiguous(&controller, 0);
    assert_eq!(controller.division(0).unwrap().cached_height(4680), Some(40_000));
}

#[test]
fn test_lazy_shrink_removes_pages() {
    // Estimates twelve times the real content
    let (mut controller, _) = single(lazy_blocks(40, 50, 12.0));
    controller.set_scroll_position(Point::new(0, 500));
    let estimated = controller.page_count();
    assert_eq!(estimated, 75);

    controller.prepare_to_draw_pages(0, FULL);

    assert!(controller.page_count() < estimated);
    assert_eq!(controller.page_count(), 7);
    assert_eq!(controller.scroll_position(), Point::new(0, 500));
    assert_contiguous(&controller, 0);
    let last = controller.pages().last().unwrap();
    assert_eq!(last.offset_from_top_of_div(0), Some(6 * 6480));
}

#[test]
fn test_offsets_contiguous_across_columns() {
    let stream = SharedStream::new(lazy_blocks(30, 40, 0.5));
    let mut controller = controller();
    let settings = DivisionSettings {
        columns: 2,
        ..DivisionSettings::default()
    };
    controller.add_division(division(stream, settings));
    controller.create_pages();
    controller.prepare_to_draw_pages(0, FULL);

    // 24000px in two 6480px columns per page
    assert_eq!(controller.page_count(), 2);
    assert_contiguous(&controller, 0);
    let first = &controller.pages()[0];
    assert_eq!(first.elements().len(), 2);
    assert_eq!(first.elements()[1].offset_to_top_page_boundary(), 6480);
    assert_eq!(first.elements()[1].current_column(), 2);
}

#[test]
fn test_prepare_is_idempotent() {
    let (mut controller, _) = single(lazy_blocks(20, 50, 0.3));
    controller.prepare_to_draw_pages(0, 3000);
    let before: Vec<_> = controller.pages().to_vec();

    let again: Vec<_> = controller
        .prepare_to_draw_pages(0, 3000)
        .into_iter()
        .cloned()
        .collect();
    assert_eq!(controller.pages(), before.as_slice());
    assert_eq!(again.len(), 3);
    assert_eq!(again.as_slice(), &before[..3]);
}

#[test]
fn test_only_requested_pages_are_laid_out() {
    let (mut controller, _) = single(BlockStream::uniform(10, 100, 20));
    let pages = controller.prepare_to_draw_pages(1076, 1100);

    assert_eq!(pages.len(), 1);
    assert_eq!(pages[0].page_number(), 2);
    let laid_out: Vec<_> = controller.pages().iter().map(|page| !page.needs_layout()).collect();
    assert_eq!(laid_out, vec![false, true, false, false]);
}

#[test]
fn test_prepare_to_print_range() {
    let (mut controller, _) = single(BlockStream::uniform(10, 100, 20));
    let pages = controller.prepare_to_print(1, 2);
    assert_eq!(pages.len(), 2);
    assert!(pages.iter().all(|page| !page.needs_layout()));
    assert!(controller.prepare_to_print(9, 12).is_empty());
}

fn parity_controller(geometry: PublicationGeometry) -> PublicationController {
    let mut controller = PublicationController::new(geometry).unwrap();
    let settings = DivisionSettings {
        margins: Margins {
            inside: 9000,
            outside: 4500,
            ..Margins::default()
        },
        ..DivisionSettings::default()
    };
    let stream = SharedStream::new(BlockStream::uniform(10, 100, 20));
    controller.add_division(division(stream, settings));
    controller.create_pages();
    controller
}

fn first_element_x(controller: &PublicationController, index: usize) -> i32 {
    controller.pages()[index].elements()[0].location().x
}

#[test]
fn test_margins_follow_page_parity() {
    let mut left_bound = parity_controller(PublicationGeometry::default());
    left_bound.prepare_to_draw_pages(0, FULL);
    assert_eq!(first_element_x(&left_bound, 0), 90);
    assert_eq!(first_element_x(&left_bound, 1), 45);
    assert_eq!(first_element_x(&left_bound, 2), 90);

    let mut top_bound = parity_controller(PublicationGeometry {
        binding_edge: BindingEdge::Top,
        ..PublicationGeometry::default()
    });
    top_bound.prepare_to_draw_pages(0, FULL);
    assert_eq!(first_element_x(&top_bound, 0), 45);
    assert_eq!(first_element_x(&top_bound, 1), 90);

    let mut simplex = parity_controller(PublicationGeometry {
        sides: Sides::Simplex,
        ..PublicationGeometry::default()
    });
    simplex.prepare_to_draw_pages(0, FULL);
    assert_eq!(first_element_x(&simplex, 0), 90);
    assert_eq!(first_element_x(&simplex, 1), 90);
}

#[test]
fn test_renumbering_moves_laid_out_elements() {
    let mut controller = parity_controller(PublicationGeometry::default());
    controller.prepare_to_draw_pages(1076, 1100);
    assert_eq!(first_element_x(&controller, 1), 45);

    let first = controller.pages()[0].handle();
    assert!(controller.delete_page(first));
    assert_eq!(controller.pages()[0].page_number(), 1);
    assert!(!controller.pages()[0].needs_layout());
    assert_eq!(first_element_x(&controller, 0), 90);
}

#[test]
fn test_adjust_inside_laid_out_page() {
    let (mut controller, stream) = single(BlockStream::uniform(10, 100, 20));
    controller.prepare_to_draw_pages(0, FULL);
    controller.set_scroll_position(Point::new(0, 2000));
    let second = controller.pages()[1].clone();

    controller.adjust_scroll_range(&stream, 7000, 1000);

    // The page showing the change is untouched, later pages move
    assert_eq!(controller.pages()[1], second);
    assert_eq!(controller.page_count(), 5);
    let inserted = &controller.pages()[2];
    assert!(inserted.needs_layout());
    assert_eq!(inserted.offset_from_top_of_div(0), Some(12960));
    assert_eq!(controller.pages()[3].offset_from_top_of_div(0), Some(13960));
    assert_eq!(controller.pages()[3].elements()[0].offset_to_top_page_boundary(), 13960);
    assert_eq!(controller.pages()[4].offset_from_top_of_div(0), Some(20440));
    assert_eq!(controller.scroll_position(), Point::new(0, 2000));
    assert_eq!(controller.auto_scroll_min_size().height, 5 * 1066 + 10);
}

#[test]
fn test_adjust_inside_multi_column_page() {
    let stream = SharedStream::new(BlockStream::uniform(10, 100, 20));
    let mut controller = controller();
    let settings = DivisionSettings {
        columns: 2,
        ..DivisionSettings::default()
    };
    controller.add_division(division(stream.clone(), settings));
    controller.create_pages();
    controller.prepare_to_draw_pages(0, FULL);
    let first = controller.pages()[0].clone();
    assert_eq!(first.elements()[1].stream_range(), (6480, 12960));

    controller.adjust_scroll_range(&stream, 100, 1000);

    // Both columns of the first page keep what they show
    assert_eq!(controller.pages()[0], first);
    assert_eq!(controller.page_count(), 3);
    assert!(controller.pages()[1].needs_layout());
    assert_eq!(controller.pages()[1].offset_from_top_of_div(0), Some(12960));
    assert_eq!(controller.pages()[2].offset_from_top_of_div(0), Some(13960));
    assert_contiguous(&controller, 0);

    controller.prepare_to_draw_pages(0, FULL);
    assert_eq!(controller.pages()[0], first);
    assert!(controller.pages().iter().all(|page| !page.needs_layout()));
    assert_contiguous(&controller, 0);
    let end = controller
        .pages()
        .iter()
        .flat_map(|page| page.elements())
        .map(|element| element.stream_range().1)
        .max();
    assert_eq!(end, Some(20000));
}

#[test]
fn test_adjust_estimates_grow_and_shrink() {
    let (mut controller, stream) = single(BlockStream::uniform(10, 100, 20));
    controller.adjust_scroll_range(&stream, 100, 7000);
    assert!(controller.page_count() > 4);
    assert_eq!(controller.pages().last().unwrap().offset_from_top_of_div(0), Some(26440));

    let (mut controller, stream) = single(BlockStream::uniform(10, 100, 20));
    controller.adjust_scroll_range(&stream, 100, -10_000);
    let offsets: Vec<_> = controller
        .pages()
        .iter()
        .map(|page| page.offset_from_top_of_div(0).unwrap())
        .collect();
    assert_eq!(offsets, vec![0, 2960, 9440]);
}

#[test]
fn test_continuous_divisions_share_a_page() {
    let mut controller = controller();
    let a = SharedStream::new(BlockStream::uniform(1, 100, 20));
    let b = SharedStream::new(BlockStream::uniform(1, 400, 20));
    let c = SharedStream::new(BlockStream::uniform(1, 10, 20));
    let continuous = DivisionSettings {
        start_at: StartAt::Continuous,
        ..DivisionSettings::default()
    };
    controller.add_division(division(a, DivisionSettings::default()));
    controller.add_division(division(b, continuous));
    controller.add_division(division(c, DivisionSettings::default()));
    controller.create_pages();

    // b starts below a's 2000px and needs one more page; c starts fresh
    assert_eq!(controller.page_count(), 3);
    assert_eq!(controller.pages()[0].slots().len(), 2);
    assert_eq!(controller.pages()[1].offset_from_top_of_div(1), Some(4480));

    controller.prepare_to_draw_pages(0, FULL);
    let shared = &controller.pages()[0];
    assert_eq!(shared.elements().len(), 2);
    assert_eq!(shared.elements()[0].location(), Rect::new(720, 720, 4680, 2000));
    assert_eq!(shared.elements()[1].location(), Rect::new(720, 2720, 4680, 4480));
    assert_contiguous(&controller, 1);

    let numbers: Vec<_> = controller.pages().iter().map(|page| page.page_number()).collect();
    assert_eq!(numbers, vec![1, 1, 1]);
}

#[test]
fn test_footnotes_never_share_pages_between_divisions() {
    let mut controller = controller();
    let a = SharedStream::new(BlockStream::uniform(1, 100, 20));
    let b = SharedStream::new(BlockStream::uniform(1, 100, 20));
    let mut first = division(a, DivisionSettings::default());
    first.add_subordinate_stream(SharedStream::new(NoteStream::default()), GroupingScope::Page);
    controller.add_division(first);
    controller.add_division(division(
        b,
        DivisionSettings {
            start_at: StartAt::Continuous,
            ..DivisionSettings::default()
        },
    ));
    controller.create_pages();

    assert_eq!(controller.page_count(), 2);
    assert!(controller.pages().iter().all(|page| page.slots().len() == 1));
}

fn footnoted(lines: usize, references: &[(usize, u64)], notes: Vec<(ObjectId, i32)>) -> PublicationController {
    let mut block = Block::new(ObjectId(1), lines, 20);
    for (line, note) in references {
        block = block.with_reference(*line, DependentRef::new(0, ObjectId(*note)));
    }
    let mut controller = controller();
    let mut manager = division(SharedStream::new(BlockStream::new(vec![block])), DivisionSettings::default());
    manager.add_subordinate_stream(SharedStream::new(NoteStream::new(notes)), GroupingScope::Page);
    controller.add_division(manager);
    controller.create_pages();
    controller
}

fn notes_on(controller: &PublicationController, index: usize) -> Vec<Rect> {
    controller.pages()[index]
        .elements()
        .iter()
        .filter(|e| !e.is_main_stream())
        .map(|e| e.location())
        .collect()
}

#[test]
fn test_footnotes_that_never_fit_together_are_deferred() {
    // Two 4000px notes referenced near the top of the first page
    let mut controller = footnoted(400, &[(2, 10), (3, 11)], vec![(ObjectId(10), 4000), (ObjectId(11), 4000)]);
    controller.prepare_to_draw_pages(0, FULL);

    assert_eq!(controller.page_count(), 3);
    assert!(notes_on(&controller, 0).is_empty());
    // The deferred batch is split once it is carried over
    assert_eq!(notes_on(&controller, 1), vec![Rect::new(720, 3200, 4680, 4000)]);
    assert_eq!(notes_on(&controller, 2), vec![Rect::new(720, 3200, 4680, 4000)]);
    assert_eq!(controller.pages()[2].offset_from_top_of_div(0), Some(8000));

    let second = &controller.pages()[1];
    let main: Vec<_> = second.elements().iter().filter(|e| e.is_main_stream()).collect();
    assert_eq!(main[0].stream_range(), (6480, 8000));
}

#[test]
fn test_footnote_batch_moves_with_its_reference() {
    // Notes referenced near the bottom of the first page do not fit below
    // a full page of text; the text is shortened so both go to page two
    let mut controller = footnoted(400, &[(300, 10), (301, 11)], vec![(ObjectId(10), 1500), (ObjectId(11), 1500)]);
    controller.prepare_to_draw_pages(0, FULL);

    assert_eq!(controller.page_count(), 3);
    assert!(notes_on(&controller, 0).is_empty());
    assert_eq!(controller.pages()[0].elements()[0].stream_range(), (0, 3480));
    assert_eq!(notes_on(&controller, 1), vec![Rect::new(720, 4200, 4680, 3000)]);
    assert_eq!(controller.pages()[1].offset_from_top_of_div(0), Some(3480));
    assert_eq!(controller.pages()[2].offset_from_top_of_div(0), Some(6960));
    assert_contiguous(&controller, 0);
}

fn laid_out_single() -> (PublicationController, SharedStream) {
    let (mut controller, stream) = single(BlockStream::uniform(10, 100, 20));
    controller.prepare_to_draw_pages(0, FULL);
    (controller, stream)
}

#[test]
fn test_element_from_point_inside_text() {
    let (controller, _) = laid_out_single();
    let hit = controller
        .element_from_point(Point::new(210, 210), Point::default())
        .unwrap();

    assert_eq!(hit.page_index, 0);
    assert_eq!(hit.page, controller.pages()[0].handle());
    assert!(hit.element.is_main_stream());
    assert_close(hit.stream_point.x, 780);
    assert_close(hit.stream_point.y, 780);

    // Same window point one page further down
    let hit = controller
        .element_from_point(Point::new(210, 210), Point::new(0, 1066))
        .unwrap();
    assert_eq!(hit.page_index, 1);
    assert_close(hit.stream_point.y, 6480 + 780);
}

#[test]
fn test_element_from_point_in_margins_and_gaps() {
    let (controller, _) = laid_out_single();

    // Left margin beside the text snaps to the column
    let hit = controller
        .element_from_point(Point::new(30, 210), Point::default())
        .unwrap();
    assert_eq!(hit.stream_point.x, 0);
    assert_close(hit.stream_point.y, 780);

    // Top margin and the gap between pages
    assert_eq!(controller.element_from_point(Point::new(210, 30), Point::default()), None);
    assert_eq!(controller.element_from_point(Point::new(210, 1071), Point::default()), None);
}

#[test]
fn test_page_from_printer_y_on_boundaries() {
    let (controller, _) = laid_out_single();
    let pages = controller.pages();

    let (page, y) = controller.page_from_printer_y(0, 6480, false, None).unwrap();
    assert_eq!(page.handle(), pages[1].handle());
    assert_eq!(y, 720);

    let (page, y) = controller.page_from_printer_y(0, 6480, true, None).unwrap();
    assert_eq!(page.handle(), pages[0].handle());
    assert_eq!(y, 7200);

    let (page, y) = controller.page_from_printer_y(0, 0, true, None).unwrap();
    assert_eq!(page.handle(), pages[0].handle());
    assert_eq!(y, 720);

    assert!(controller.page_from_printer_y(0, 20_000, false, None).is_none());
    assert!(controller.page_from_printer_y(3, 10, false, None).is_none());
}

#[test]
fn test_page_from_printer_y_for_footnotes() {
    let mut controller = footnoted(100, &[(2, 10)], vec![(ObjectId(10), 300)]);
    controller.prepare_to_draw_pages(0, FULL);
    let notes = controller.division(0).unwrap().subordinates()[0].stream.clone();

    let (page, y) = controller.page_from_printer_y(0, 100, false, Some(&notes)).unwrap();
    assert_eq!(page.handle(), controller.pages()[0].handle());
    assert_eq!(y, 7200 - 300 + 100);
}

#[test]
fn test_invalid_rects_split_across_pages() {
    let (controller, stream) = laid_out_single();
    let rects = controller.invalid_rects(&stream, Rect::new(0, 6000, 100, 1000), Point::default());

    assert_eq!(rects.len(), 2);
    assert_close(rects[0].x, 106);
    assert_close(rects[0].y, 906);
    assert_close(rects[0].bottom(), 970);
    assert_close(rects[1].y, 1172);
    assert_close(rects[1].bottom(), 1076 + 165);

    let scrolled = controller.invalid_rects(&stream, Rect::new(0, 6000, 100, 1000), Point::new(0, 1066));
    assert_close(scrolled[1].y, 106);
}

#[test]
fn test_invalid_rects_on_estimate_pages() {
    let (controller, stream) = single(BlockStream::uniform(10, 100, 20));
    let rects = controller.invalid_rects(&stream, Rect::new(0, 6380, 100, 200), Point::default());

    assert_eq!(rects.len(), 2);
    assert_close(rects[0].bottom(), 10 + 960);
    assert_close(rects[1].y, 1076 + 96);
}

#[test]
fn test_stale_handles_are_not_found() {
    let (mut controller, _) = single(BlockStream::uniform(10, 100, 20));
    let handle = controller.pages()[1].handle();

    assert_eq!(controller.index_of_page(handle), Some(1));
    assert!(controller.delete_page(handle));
    assert!(controller.find_page(handle).is_none());
    assert!(controller.index_of_page(handle).is_none());
    assert!(controller.page_after(handle).is_none());
    assert!(!controller.delete_page(handle));
    assert!(controller.insert_page_after(handle, 0, 0).is_none());
}

#[test]
fn test_page_navigation() {
    let (mut controller, _) = single(BlockStream::uniform(10, 100, 20));
    let first = controller.pages()[0].handle();
    let second = controller.pages()[1].handle();
    assert_eq!(controller.page_after(first).map(|page| page.handle()), Some(second));

    let inserted = controller.insert_page_after(first, 0, 3000).unwrap();
    assert_eq!(controller.index_of_page(inserted), Some(1));
    assert_eq!(controller.find_page(inserted).unwrap().page_number(), 2);
    assert_ne!(inserted, PageHandle(0));
    assert!(controller.insert_page_after(first, 5, 0).is_none());
}

#[test]
fn test_shared_stream_disposed_once() {
    let notes = Rc::new(RefCell::new(NoteStream::new(vec![(ObjectId(1), 40)])));
    let main = Rc::new(RefCell::new(BlockStream::uniform(2, 10, 20)));
    {
        let mut controller = controller();
        for _ in 0..3 {
            let mut manager = division(SharedStream::from_rc(main.clone()), DivisionSettings::default());
            manager.add_subordinate_stream(SharedStream::from_rc(notes.clone()), GroupingScope::Page);
            controller.add_division(manager);
        }
        assert_eq!(controller.registry().len(), 2);
        controller.create_pages();
        controller.prepare_to_draw_pages(0, FULL);
        controller.dispose();
        assert_eq!(controller.page_count(), 0);
    }
    assert_eq!(notes.borrow().dispose_count(), 1);
    assert_eq!(main.borrow().dispose_count(), 1);
}

#[test]
fn test_deleted_pages_are_discarded_by_streams() {
    let typed = Rc::new(RefCell::new(BlockStream::uniform(10, 100, 20)));
    let stream = SharedStream::from_rc(typed.clone());
    let mut controller = controller();
    controller.add_division(division(stream, DivisionSettings::default()));
    controller.create_pages();
    controller.prepare_to_draw_pages(0, FULL);

    let handle = controller.pages()[0].handle();
    assert_eq!(typed.borrow().page_position(handle), Some(0));
    controller.delete_page(handle);
    assert_eq!(typed.borrow().page_position(handle), None);
}

#[test]
fn test_page_selections_after_layout() {
    let (controller, _) = laid_out_single();
    let page = &controller.pages()[1];
    let top = page.top_of_page_selection().unwrap();
    let bottom = page.bottom_of_page_selection().unwrap();
    assert!(top.is_collapsed() && bottom.is_collapsed());
    // 6480px into 2000px blocks: block 3, line 24
    assert_eq!(top.anchor.paragraph, 3);
    assert_eq!(top.anchor.offset, 24 * 60);
    assert!(top.anchor < bottom.end);
}

fn random_publication(
    columns: usize,
    right_to_left: bool,
    continuous: bool,
    blocks: &[(usize, u8)],
) -> PublicationController {
    let mut controller = controller();
    for start_at in [StartAt::NewPage, if continuous { StartAt::Continuous } else { StartAt::NewPage }] {
        let stream = BlockStream::new(
            blocks
                .iter()
                .enumerate()
                .map(|(i, (lines, ratio))| {
                    let block = Block::new(ObjectId(i as u64), *lines, 20);
                    let estimate = block.real_height() * *ratio as i32 / 4;
                    block.with_estimate(estimate)
                })
                .collect(),
        );
        let settings = DivisionSettings {
            columns,
            start_at,
            ..DivisionSettings::default()
        };
        let view = BasicView::new(ObjectId(1)).right_to_left(right_to_left);
        let manager = DivisionLayoutManager::new(settings, SharedStream::new(stream), view).unwrap();
        controller.add_division(manager);
    }
    controller.create_pages();
    controller.prepare_to_draw_pages(0, FULL);
    controller
}

proptest! {
    #[test]
    fn elements_never_intersect(
        columns in 1usize..=3,
        right_to_left in any::<bool>(),
        continuous in any::<bool>(),
        blocks in prop::collection::vec((1usize..200, 1u8..9), 1..12),
    ) {
        let controller = random_publication(columns, right_to_left, continuous, &blocks);
        for page in controller.pages() {
            let elements = page.elements();
            for (i, a) in elements.iter().enumerate() {
                for b in &elements[i + 1..] {
                    prop_assert!(!a.location().intersects(&b.location()));
                }
            }
        }
    }

    #[test]
    fn laid_out_offsets_are_contiguous(
        columns in 1usize..=3,
        blocks in prop::collection::vec((1usize..200, 1u8..9), 1..12),
    ) {
        let controller = random_publication(columns, false, false, &blocks);
        for division in 0..2 {
            prop_assert_eq!(first_gap(&controller, division), None);
        }
    }

    #[test]
    fn offsets_stay_contiguous_after_adjusting(
        columns in 1usize..=3,
        blocks in prop::collection::vec((1usize..200, 1u8..9), 1..12),
        division in 0usize..2,
        position in 0.0f64..1.0,
        delta in -2000i32..2000,
    ) {
        let mut controller = random_publication(columns, false, false, &blocks);
        let stream = controller.division(division).unwrap().main_stream().clone();
        let total: usize = blocks.iter().map(|(lines, _)| lines * 20).sum();
        let position = (total as f64 * position) as i32;

        controller.adjust_scroll_range(&stream, position, delta);
        for _ in 0..4 {
            if controller.pages().iter().all(|page| !page.needs_layout()) {
                break;
            }
            controller.prepare_to_draw_pages(0, FULL);
        }

        for division in 0..2 {
            prop_assert_eq!(first_gap(&controller, division), None);
        }
    }
}

/// Main-stream elements of a division on one page, in column order
fn main_columns(page: &crate::page::Page, division: usize) -> Vec<&crate::page::PageElement> {
    let mut columns: Vec<_> = page
        .elements()
        .iter()
        .filter(|e| e.division() == division && e.is_main_stream())
        .collect();
    columns.sort_by_key(|e| e.current_column());
    columns
}

/// The first place where a laid-out division skips or repeats content, as
/// (page index, expected offset, actual offset)
fn first_gap(controller: &PublicationController, division: usize) -> Option<(usize, i32, i32)> {
    let pages: Vec<_> = controller
        .pages()
        .iter()
        .enumerate()
        .filter(|(_, page)| page.contains_division(division) && !page.needs_layout())
        .collect();
    for (index, page) in &pages {
        let columns = main_columns(page, division);
        let Some(offset) = page.offset_from_top_of_div(division) else {
            continue;
        };
        let mut expected = offset;
        for column in columns {
            let (top, bottom) = column.stream_range();
            if top != expected {
                return Some((*index, expected, top));
            }
            expected = bottom;
        }
        let next = controller.pages()[index + 1..]
            .iter()
            .position(|other| other.contains_division(division))
            .map(|skip| index + 1 + skip);
        if let Some(next) = next {
            let actual = controller.pages()[next].offset_from_top_of_div(division).unwrap_or(0);
            if actual != expected {
                return Some((next, expected, actual));
            }
        }
    }
    None
}

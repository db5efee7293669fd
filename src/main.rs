//! Pagewise demo: paginate a lazily measured publication and print the pages
//!
//! Usage: `pagewise [blocks] [columns]`. Set `RUST_LOG=debug` to watch the
//! estimate pages being corrected.

use pagewise::division::BasicView;
use pagewise::stream::{Block, BlockStream, DependentRef, NoteStream};
use pagewise::{
    DisplayList, DivisionLayoutManager, DivisionSettings, GroupingScope, LayoutError, ObjectId,
    PublicationController, PublicationGeometry, Rect, SharedStream, StartAt,
};

fn main() -> Result<(), LayoutError> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let blocks: usize = args.next().and_then(|arg| arg.parse().ok()).unwrap_or(60);
    let columns: usize = args.next().and_then(|arg| arg.parse().ok()).unwrap_or(1);

    // Every block is estimated at half its real height; every fifth block
    // references a footnote
    let mut notes = Vec::new();
    let body = (0..blocks)
        .map(|i| {
            let block = Block::new(ObjectId(i as u64 + 1), 30 + i % 25, 20);
            let estimate = block.real_height() / 2;
            let block = block.with_estimate(estimate);
            if i % 5 == 0 {
                let note = ObjectId(10_000 + i as u64);
                notes.push((note, 200 + (i as i32 % 3) * 150));
                block.with_reference(3, DependentRef::new(0, note))
            } else {
                block
            }
        })
        .collect();

    let settings = DivisionSettings {
        columns,
        ..DivisionSettings::default()
    };
    let mut body = DivisionLayoutManager::new(
        settings,
        SharedStream::new(BlockStream::new(body)),
        BasicView::new(ObjectId(1)).with_title("Body").with_page_numbers(),
    )?;
    body.add_subordinate_stream(SharedStream::new(NoteStream::new(notes)), GroupingScope::Page);

    let appendix = DivisionLayoutManager::new(
        DivisionSettings {
            start_at: StartAt::NewPage,
            ..DivisionSettings::default()
        },
        SharedStream::new(BlockStream::uniform(4, 40, 20)),
        BasicView::new(ObjectId(2)).with_title("Appendix"),
    )?;

    let mut controller = PublicationController::new(PublicationGeometry::default())?;
    controller.add_division(body);
    controller.add_division(appendix);

    controller.create_pages();
    let estimated = controller.page_count();
    controller.prepare_to_draw_pages(0, i32::MAX);
    log::info!("{estimated} estimated pages became {}", controller.page_count());

    println!("Pagewise demo");
    println!("=============");
    println!();
    for page in controller.pages() {
        let slots: Vec<String> = page
            .slots()
            .iter()
            .map(|slot| format!("division {} from {}", slot.division, slot.offset))
            .collect();
        let notes = page.elements().iter().filter(|e| !e.is_main_stream()).count();
        println!(
            "page {:>3}: {} ({} elements, {} footnote blocks)",
            page.page_number(),
            slots.join(", "),
            page.elements().len(),
            notes
        );
    }

    let size = controller.auto_scroll_min_size();
    let viewport = Rect::new(0, 0, size.width, 1200);
    let list = DisplayList::build(&controller, viewport);
    println!();
    println!(
        "{} pages ({}x{} screen px), first screen shows {} items",
        controller.page_count(),
        size.width,
        size.height,
        list.item_count()
    );
    Ok(())
}

mod events;
mod layout;

use std::time::Instant;

use pdf_writer::types::{ActionType, AnnotationType};
use pdf_writer::{Content, Filter, Name, Pdf, Rect, Ref};

use crate::error::Error;
use crate::fonts::{BuiltinFont, register_fonts};
use crate::model::{Alignment, Paragraph, Report, Run, TabAlignment, TabStop, TocEntry};

use events::{PageCapture, PageNumberStamper};
use layout::{build_paragraph_lines, build_tabbed_line, render_lines};

// A4 geometry, in points
pub(crate) const PAGE_WIDTH: f32 = 595.0;
pub(crate) const PAGE_HEIGHT: f32 = 842.0;
const MARGIN: f32 = 36.0;
const TEXT_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN;

pub(crate) const FOOTER_Y: f32 = 20.0;
pub(crate) const FOOTER_FONT_SIZE: f32 = 10.0;

const TITLE_FONT_SIZE: f32 = 12.0;
const BODY_FONT_SIZE: f32 = 11.0;
const LINE_FACTOR: f32 = 1.2;
const TITLE_SPACE_AFTER: f32 = 8.0;
const BODY_SPACE_AFTER: f32 = 6.0;
const TOC_ROW_GAP: f32 = 2.0;

/// A link annotation on the ToC page pointing at a section page.
/// `target_page` is the raw (pre-relocation) page number of the section.
struct TocLink {
    rect: Rect,
    target_page: u32,
}

struct BuildPlan {
    pages: Vec<Content>,
    links: Vec<TocLink>,
    footers: Vec<Option<u32>>,
    entries: Vec<TocEntry>,
}

pub(crate) fn render(report: &Report) -> Result<Vec<u8>, Error> {
    let plan = build_pages(report);
    log::debug!(
        "footer plan {:?}, {} toc rows",
        plan.footers,
        plan.entries.len(),
    );
    Ok(assemble(plan, report.compress))
}

/// Run the whole pipeline up to (but excluding) PDF object assembly:
/// lay out section pages (capture hook fires per title), build the ToC
/// from the captured numbers, move it to the front, stamp footers.
fn build_pages(report: &Report) -> BuildPlan {
    let t0 = Instant::now();

    let mut capture = PageCapture::new(report.entries.clone());
    let mut stamper = PageNumberStamper::new();

    let mut pages = paginate(report, &mut capture);
    let t_layout = t0.elapsed();

    // Page numbers are final only now; the ToC goes in as the last page.
    let entries = capture.into_entries();
    let (toc_content, links) = build_toc(&entries);
    pages.push(toc_content);

    // Relocate the ToC to the front. The numbering mode switches with the
    // move so every footer stamped from here on accounts for the extra page.
    let toc_raw_page = pages.len();
    move_page(&mut pages, toc_raw_page, 1);
    stamper.note_inserted_front_page();

    let footers: Vec<Option<u32>> = pages
        .iter_mut()
        .enumerate()
        .map(|(i, content)| stamper.end_page(i as u32 + 1, content))
        .collect();

    log::info!(
        "Build phases: layout={:.1}ms, toc+footers={:.1}ms ({} pages, {} toc rows)",
        t_layout.as_secs_f64() * 1000.0,
        (t0.elapsed() - t_layout).as_secs_f64() * 1000.0,
        pages.len(),
        entries.len(),
    );

    BuildPlan {
        pages,
        links,
        footers,
        entries,
    }
}

/// Move the page at 1-based position `from` to position `to`; the pages
/// in between shift by one.
fn move_page(pages: &mut Vec<Content>, from: usize, to: usize) {
    let page = pages.remove(from - 1);
    pages.insert(to - 1, page);
}

/// Tracks the open page and the vertical layout slot while paragraphs flow
/// into the document.
struct PageCursor {
    pages: Vec<Content>,
    content: Content,
    slot_top: f32,
}

impl PageCursor {
    fn new() -> Self {
        PageCursor {
            pages: Vec::new(),
            content: Content::new(),
            slot_top: PAGE_HEIGHT - MARGIN,
        }
    }

    fn page_no(&self) -> u32 {
        self.pages.len() as u32 + 1
    }

    fn at_page_top(&self) -> bool {
        (self.slot_top - (PAGE_HEIGHT - MARGIN)).abs() < 1.0
    }

    fn break_page(&mut self) {
        self.pages.push(std::mem::replace(&mut self.content, Content::new()));
        self.slot_top = PAGE_HEIGHT - MARGIN;
    }

    /// Place a paragraph, overflowing onto continuation pages as needed.
    /// Returns the page the paragraph started on.
    fn place(&mut self, para: &Paragraph) -> u32 {
        let first_run = para.runs.iter().find(|r| !r.is_tab);
        let font = first_run.map_or(BuiltinFont::TimesRoman, |r| r.font);
        let font_size = first_run.map_or(BODY_FONT_SIZE, |r| r.font_size);
        let line_h = font_size * LINE_FACTOR;

        let lines = build_paragraph_lines(&para.runs, TEXT_WIDTH);

        // keep-with-next: leave room for at least the first line of the
        // following block, or break to a fresh page before starting
        let keep_extra = if para.keep_with_next {
            BODY_FONT_SIZE * LINE_FACTOR
        } else {
            0.0
        };
        let needed = lines.len() as f32 * line_h + keep_extra;
        if !self.at_page_top() && self.slot_top - needed < MARGIN {
            self.break_page();
        }

        let start_page = self.page_no();
        let mut first = 0usize;
        while first < lines.len() {
            let available = self.slot_top - MARGIN;
            let mut fit = (available / line_h).floor() as usize;
            if fit == 0 {
                if !self.at_page_top() {
                    self.break_page();
                    continue;
                }
                // degenerate: a line taller than the page, place it anyway
                fit = 1;
            }
            let take = fit.min(lines.len() - first);

            let baseline = self.slot_top - font_size * font.ascender_ratio();
            render_lines(
                &mut self.content,
                &lines[first..first + take],
                para.alignment,
                MARGIN,
                TEXT_WIDTH,
                baseline,
                line_h,
                lines.len(),
                first,
            );
            self.slot_top -= take as f32 * line_h;
            first += take;
            if first < lines.len() {
                self.break_page();
            }
        }

        self.slot_top -= para.space_after;
        start_page
    }

    fn finish(mut self) -> Vec<Content> {
        self.pages.push(self.content);
        self.pages
    }
}

/// Lay out every section: title paragraph (captured), body paragraphs,
/// forced page break before each subsequent section.
fn paginate(report: &Report, capture: &mut PageCapture) -> Vec<Content> {
    if report.sections.is_empty() {
        return Vec::new();
    }

    let mut cursor = PageCursor::new();

    for (idx, section) in report.sections.iter().enumerate() {
        if idx > 0 {
            cursor.break_page();
        }

        let title = Paragraph {
            runs: vec![Run::text(
                section.title.clone(),
                BuiltinFont::TimesRoman,
                TITLE_FONT_SIZE,
            )],
            alignment: Alignment::Left,
            space_after: TITLE_SPACE_AFTER,
            keep_with_next: true,
        };
        let title_page = cursor.place(&title);
        capture.record(idx, title_page);

        for text in &section.body {
            let para = Paragraph {
                runs: vec![Run::text(text.clone(), BuiltinFont::TimesRoman, BODY_FONT_SIZE)],
                alignment: Alignment::Justify,
                space_after: BODY_SPACE_AFTER,
                keep_with_next: false,
            };
            cursor.place(&para);
        }
    }

    cursor.finish()
}

/// The number a ToC row shows: the physical position of the section's page
/// once the ToC itself occupies the front of the document.
fn final_position(entry: &TocEntry) -> u32 {
    entry.page + 1
}

/// Emit the table-of-contents page: a heading, then one row per entry with
/// the page number right-aligned behind a dotted leader. Must only run once
/// all section pages exist.
fn build_toc(entries: &[TocEntry]) -> (Content, Vec<TocLink>) {
    let mut content = Content::new();
    let mut links = Vec::new();
    let mut slot_top = PAGE_HEIGHT - MARGIN;
    let line_h = BODY_FONT_SIZE * LINE_FACTOR;

    let heading = [Run::text(
        "Table of Contents",
        BuiltinFont::HelveticaBold,
        BODY_FONT_SIZE,
    )];
    let heading_lines = build_paragraph_lines(&heading, TEXT_WIDTH);
    let baseline = slot_top - BODY_FONT_SIZE * BuiltinFont::HelveticaBold.ascender_ratio();
    render_lines(
        &mut content,
        &heading_lines,
        Alignment::Left,
        MARGIN,
        TEXT_WIDTH,
        baseline,
        line_h,
        heading_lines.len(),
        0,
    );
    slot_top -= heading_lines.len() as f32 * line_h + TITLE_SPACE_AFTER;

    let stops = [TabStop {
        position: TEXT_WIDTH,
        alignment: TabAlignment::Right,
        leader: Some('.'),
    }];

    for entry in entries {
        let runs = [
            Run::text(entry.title.clone(), BuiltinFont::TimesRoman, BODY_FONT_SIZE),
            Run::tab(),
            Run::text(
                final_position(entry).to_string(),
                BuiltinFont::TimesRoman,
                BODY_FONT_SIZE,
            ),
        ];
        let line = build_tabbed_line(&runs, &stops);
        let baseline = slot_top - BODY_FONT_SIZE * BuiltinFont::TimesRoman.ascender_ratio();
        render_lines(
            &mut content,
            std::slice::from_ref(&line),
            Alignment::Left,
            MARGIN,
            TEXT_WIDTH,
            baseline,
            line_h,
            1,
            0,
        );

        links.push(TocLink {
            rect: Rect::new(
                MARGIN,
                baseline - BODY_FONT_SIZE * 0.25,
                MARGIN + TEXT_WIDTH,
                baseline + BODY_FONT_SIZE * 0.8,
            ),
            target_page: entry.page,
        });

        slot_top -= line_h + TOC_ROW_GAP;
    }

    (content, links)
}

/// Write the PDF object graph: content streams, link annotations, page
/// tree, shared base-14 font resources.
fn assemble(plan: BuildPlan, compress: bool) -> Vec<u8> {
    let mut pdf = Pdf::new();
    let mut next_id = 1i32;
    let mut alloc = || {
        let r = Ref::new(next_id);
        next_id += 1;
        r
    };

    let catalog_id = alloc();
    let pages_id = alloc();
    let fonts = register_fonts(&mut pdf, &mut alloc);

    let n = plan.pages.len();
    let page_ids: Vec<Ref> = (0..n).map(|_| alloc()).collect();
    let content_ids: Vec<Ref> = (0..n).map(|_| alloc()).collect();

    // ToC row links live on the front page; a section's raw page p sits at
    // 0-based index p now that the ToC occupies index 0.
    let annot_refs: Vec<Ref> = plan
        .links
        .iter()
        .map(|link| {
            let annot_ref = alloc();
            let mut annot = pdf.annotation(annot_ref);
            annot
                .subtype(AnnotationType::Link)
                .rect(link.rect)
                .border(0.0, 0.0, 0.0, None);
            annot
                .action()
                .action_type(ActionType::GoTo)
                .destination()
                .page(page_ids[link.target_page as usize])
                .xyz(0.0, PAGE_HEIGHT, None);
            annot_ref
        })
        .collect();

    for (i, content) in plan.pages.into_iter().enumerate() {
        let raw = content.finish();
        if compress {
            let data = miniz_oxide::deflate::compress_to_vec_zlib(&raw, 6);
            pdf.stream(content_ids[i], &data).filter(Filter::FlateDecode);
        } else {
            pdf.stream(content_ids[i], &raw);
        }
    }

    pdf.catalog(catalog_id).pages(pages_id);
    pdf.pages(pages_id)
        .kids(page_ids.iter().copied())
        .count(n as i32);

    for i in 0..n {
        let mut page = pdf.page(page_ids[i]);
        page.media_box(Rect::new(0.0, 0.0, PAGE_WIDTH, PAGE_HEIGHT))
            .parent(pages_id)
            .contents(content_ids[i]);
        if i == 0 && !annot_refs.is_empty() {
            page.annotations(annot_refs.iter().copied());
        }
        let mut resources = page.resources();
        let mut font_dict = resources.fonts();
        for (font, font_ref) in &fonts {
            font_dict.pair(Name(font.resource_name().as_bytes()), *font_ref);
        }
    }

    pdf.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_section_report() -> Report {
        let mut report = Report::new();
        report.add_section("Page 1");
        report.add_section("Page 2");
        report.add_section("Page 3");
        report
    }

    #[test]
    fn move_page_to_front_shifts_the_rest_down() {
        let mut pages: Vec<Content> = (0..4).map(|_| Content::new()).collect();
        // tag each page so order is observable
        for (i, p) in pages.iter_mut().enumerate() {
            p.set_font(Name(b"F1"), i as f32 + 1.0);
        }
        move_page(&mut pages, 4, 1);
        let streams: Vec<Vec<u8>> = pages.into_iter().map(|p| p.finish().into_vec()).collect();
        assert!(String::from_utf8_lossy(&streams[0]).contains("4 Tf"));
        assert!(String::from_utf8_lossy(&streams[1]).contains("1 Tf"));
        assert!(String::from_utf8_lossy(&streams[3]).contains("3 Tf"));
    }

    #[test]
    fn capture_assigns_one_page_per_section() {
        let plan = build_pages(&three_section_report());
        let pages: Vec<u32> = plan.entries.iter().map(|e| e.page).collect();
        assert_eq!(pages, vec![1, 2, 3]);
    }

    #[test]
    fn toc_page_plus_one_page_per_section() {
        let plan = build_pages(&three_section_report());
        assert_eq!(plan.pages.len(), 4);
    }

    #[test]
    fn footers_skip_front_page_and_count_from_one() {
        let plan = build_pages(&three_section_report());
        assert_eq!(plan.footers, vec![None, Some(1), Some(2), Some(3)]);
    }

    #[test]
    fn toc_rows_show_final_physical_positions() {
        let plan = build_pages(&three_section_report());
        let shown: Vec<u32> = plan.entries.iter().map(final_position).collect();
        assert_eq!(shown, vec![2, 3, 4]);
    }

    #[test]
    fn toc_links_target_raw_section_pages() {
        let plan = build_pages(&three_section_report());
        let targets: Vec<u32> = plan.links.iter().map(|l| l.target_page).collect();
        assert_eq!(targets, vec![1, 2, 3]);
    }

    #[test]
    fn long_body_spills_onto_continuation_pages() {
        let mut report = Report::new();
        report.add_section("First");
        // ~60 lines per page at 11pt; 3000 words of body far exceed one page
        let filler = "lorem ipsum dolor sit amet consectetur adipiscing elit ".repeat(400);
        report.add_paragraph(filler);
        report.add_section("Second");

        let plan = build_pages(&report);
        assert!(plan.pages.len() > 3, "expected overflow pages");
        assert_eq!(plan.entries[0].page, 1);
        // "Second" starts after every continuation page of "First"
        let second_page = plan.entries[1].page;
        assert_eq!(second_page as usize, plan.pages.len() - 1);
    }

    #[test]
    fn empty_report_renders_a_single_toc_page_without_footer() {
        let report = Report::new();
        let plan = build_pages(&report);
        assert_eq!(plan.pages.len(), 1);
        assert_eq!(plan.footers, vec![None]);
        assert!(plan.links.is_empty());
    }

    #[test]
    fn render_emits_a_pdf_header() {
        let bytes = render(&three_section_report()).unwrap();
        assert!(bytes.starts_with(b"%PDF-"));
    }
}

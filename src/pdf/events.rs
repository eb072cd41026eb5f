use pdf_writer::{Content, Name, Str};

use crate::fonts::{BuiltinFont, to_winansi_bytes};
use crate::model::{PageNumbering, TocEntry};

use super::{FOOTER_FONT_SIZE, FOOTER_Y, PAGE_WIDTH};

/// Observes the pagination pass and records the page each section title
/// lands on. Entries start provisional; `record` overwrites with the
/// authoritative value once layout has placed the title. On a re-fire for
/// the same entry the last write wins.
pub(super) struct PageCapture {
    entries: Vec<TocEntry>,
}

impl PageCapture {
    pub(super) fn new(entries: Vec<TocEntry>) -> Self {
        PageCapture { entries }
    }

    pub(super) fn record(&mut self, index: usize, page: u32) {
        if let Some(entry) = self.entries.get_mut(index) {
            log::debug!("captured \"{}\" on page {page}", entry.title);
            entry.page = page;
        } else {
            log::warn!("capture fired for unknown entry index {index}");
        }
    }

    pub(super) fn into_entries(self) -> Vec<TocEntry> {
        self.entries
    }
}

/// Draws the centered page number into a page footer. Starts in `Direct`
/// mode; once the ToC page has been moved to the front the mode switches
/// to `OffsetByInsertedPage`, which skips page 1 and shifts the rest down
/// by one.
pub(super) struct PageNumberStamper {
    numbering: PageNumbering,
}

impl PageNumberStamper {
    pub(super) fn new() -> Self {
        PageNumberStamper {
            numbering: PageNumbering::Direct,
        }
    }

    /// Irreversible for a given build: called by the relocator right when
    /// the ToC page is moved to position 1.
    pub(super) fn note_inserted_front_page(&mut self) {
        self.numbering = PageNumbering::OffsetByInsertedPage;
    }

    /// Fired once per page as its content stream is finalized. Returns the
    /// number drawn, if any.
    pub(super) fn end_page(&self, raw_page: u32, content: &mut Content) -> Option<u32> {
        let number = self.numbering.displayed(raw_page)?;

        let text = number.to_string();
        let font = BuiltinFont::Helvetica;
        let x = (PAGE_WIDTH - font.text_width(&text, FOOTER_FONT_SIZE)) / 2.0;

        content
            .begin_text()
            .set_font(Name(font.resource_name().as_bytes()), FOOTER_FONT_SIZE)
            .next_line(x, FOOTER_Y)
            .show(Str(&to_winansi_bytes(&text)))
            .end_text();

        Some(number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries() -> Vec<TocEntry> {
        vec![
            TocEntry {
                title: "Introduction".into(),
                page: 1,
            },
            TocEntry {
                title: "Methods".into(),
                page: 2,
            },
        ]
    }

    #[test]
    fn record_overwrites_provisional_page() {
        let mut capture = PageCapture::new(entries());
        capture.record(1, 5);
        let out = capture.into_entries();
        assert_eq!(out[0].page, 1);
        assert_eq!(out[1].page, 5);
    }

    #[test]
    fn refire_keeps_last_authoritative_value() {
        let mut capture = PageCapture::new(entries());
        capture.record(0, 3);
        capture.record(0, 4); // re-layout pass wins
        assert_eq!(capture.into_entries()[0].page, 4);
    }

    #[test]
    fn record_out_of_range_is_ignored() {
        let mut capture = PageCapture::new(entries());
        capture.record(9, 7);
        assert_eq!(capture.into_entries(), entries());
    }

    #[test]
    fn direct_mode_stamps_every_page() {
        let stamper = PageNumberStamper::new();
        let mut content = Content::new();
        assert_eq!(stamper.end_page(1, &mut content), Some(1));
        assert_eq!(stamper.end_page(3, &mut content), Some(3));
        assert!(!content.finish().is_empty());
    }

    #[test]
    fn offset_mode_skips_front_page_and_shifts() {
        let mut stamper = PageNumberStamper::new();
        stamper.note_inserted_front_page();

        let mut front = Content::new();
        assert_eq!(stamper.end_page(1, &mut front), None);
        assert!(front.finish().is_empty());

        let mut second = Content::new();
        assert_eq!(stamper.end_page(2, &mut second), Some(1));
        let bytes = second.finish();
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("(1)"));
    }
}

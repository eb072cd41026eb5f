use std::path::Path;
use std::time::Instant;

use crate::error::Error;
use crate::fonts::BuiltinFont;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Alignment {
    Left,
    Center,
    Right,
    Justify,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum TabAlignment {
    Left,
    Right,
}

#[derive(Clone, Debug)]
pub(crate) struct TabStop {
    pub(crate) position: f32,
    pub(crate) alignment: TabAlignment,
    pub(crate) leader: Option<char>,
}

#[derive(Clone, Debug)]
pub(crate) struct Run {
    pub(crate) text: String,
    pub(crate) font: BuiltinFont,
    pub(crate) font_size: f32,
    pub(crate) is_tab: bool,
}

impl Run {
    pub(crate) fn text(text: impl Into<String>, font: BuiltinFont, font_size: f32) -> Self {
        Run {
            text: text.into(),
            font,
            font_size,
            is_tab: false,
        }
    }

    pub(crate) fn tab() -> Self {
        Run {
            text: String::new(),
            font: BuiltinFont::TimesRoman,
            font_size: 0.0,
            is_tab: true,
        }
    }
}

pub(crate) struct Paragraph {
    pub(crate) runs: Vec<Run>,
    pub(crate) alignment: Alignment,
    pub(crate) space_after: f32,
    pub(crate) keep_with_next: bool,
}

/// One table-of-contents entry. The page number is provisional from the
/// moment the section is added until the capture hook overwrites it with
/// the page the title actually landed on.
#[derive(Clone, Debug, PartialEq)]
pub struct TocEntry {
    pub title: String,
    pub page: u32,
}

/// Footer numbering mode. Switched once per build, from `Direct` to
/// `OffsetByInsertedPage` when the ToC page is moved to the front.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PageNumbering {
    Direct,
    OffsetByInsertedPage,
}

impl PageNumbering {
    /// The number the footer shows for a page, counted from 1.
    /// `None` means the page carries no footer (the relocated ToC page).
    pub fn displayed(self, raw_page: u32) -> Option<u32> {
        match self {
            PageNumbering::Direct => Some(raw_page),
            PageNumbering::OffsetByInsertedPage => {
                if raw_page == 1 {
                    None
                } else {
                    Some(raw_page - 1)
                }
            }
        }
    }
}

pub struct Section {
    pub title: String,
    pub body: Vec<String>,
}

/// Builder for a sectioned report. Each section starts on its own page;
/// rendering lays the sections out, assembles a table of contents from the
/// captured page numbers and moves it to the front of the document.
pub struct Report {
    pub(crate) sections: Vec<Section>,
    pub(crate) entries: Vec<TocEntry>,
    pub(crate) compress: bool,
}

impl Report {
    pub fn new() -> Self {
        Report {
            sections: Vec::new(),
            entries: Vec::new(),
            compress: true,
        }
    }

    /// Append a titled section, forced onto a fresh page. Records a
    /// provisional ToC entry; the real page number is only known once
    /// layout has run.
    pub fn add_section(&mut self, title: impl Into<String>) {
        let title = title.into();
        self.entries.push(TocEntry {
            title: title.clone(),
            page: self.sections.len() as u32 + 1,
        });
        self.sections.push(Section {
            title,
            body: Vec::new(),
        });
    }

    /// Append a body paragraph to the most recently added section.
    /// Ignored (with a warning) when no section exists yet.
    pub fn add_paragraph(&mut self, text: impl Into<String>) {
        match self.sections.last_mut() {
            Some(section) => section.body.push(text.into()),
            None => log::warn!("add_paragraph called before any add_section; dropped"),
        }
    }

    /// Disable content-stream compression (mainly for tests and debugging).
    pub fn set_compression(&mut self, compress: bool) {
        self.compress = compress;
    }

    pub fn render(&self) -> Result<Vec<u8>, Error> {
        crate::pdf::render(self)
    }

    /// Render and write the report to `output`, creating the parent
    /// directory if it does not exist.
    pub fn write_to(&self, output: &Path) -> Result<(), Error> {
        let t0 = Instant::now();

        let bytes = crate::pdf::render(self)?;
        let t_render = t0.elapsed();

        if let Some(dir) = output.parent()
            && !dir.as_os_str().is_empty()
        {
            std::fs::create_dir_all(dir).map_err(Error::Io)?;
        }
        std::fs::write(output, &bytes).map_err(Error::Io)?;

        log::info!(
            "Timing: render={:.1}ms, write={:.1}ms (output {} bytes, {} sections)",
            t_render.as_secs_f64() * 1000.0,
            (t0.elapsed() - t_render).as_secs_f64() * 1000.0,
            bytes.len(),
            self.sections.len(),
        );

        Ok(())
    }
}

impl Default for Report {
    fn default() -> Self {
        Report::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_section_records_provisional_entry() {
        let mut report = Report::new();
        report.add_section("Introduction");
        report.add_section("Methods");

        assert_eq!(report.entries.len(), 2);
        assert_eq!(report.entries[0].title, "Introduction");
        assert_eq!(report.entries[0].page, 1);
        assert_eq!(report.entries[1].page, 2);
    }

    #[test]
    fn add_paragraph_attaches_to_last_section() {
        let mut report = Report::new();
        report.add_paragraph("orphan text");
        assert!(report.sections.is_empty());

        report.add_section("Results");
        report.add_paragraph("First paragraph.");
        report.add_paragraph("Second paragraph.");
        assert_eq!(report.sections[0].body.len(), 2);
    }

    #[test]
    fn direct_numbering_passes_raw_page_through() {
        assert_eq!(PageNumbering::Direct.displayed(1), Some(1));
        assert_eq!(PageNumbering::Direct.displayed(7), Some(7));
    }

    #[test]
    fn offset_numbering_skips_first_page_and_shifts_rest() {
        let mode = PageNumbering::OffsetByInsertedPage;
        assert_eq!(mode.displayed(1), None);
        assert_eq!(mode.displayed(2), Some(1));
        assert_eq!(mode.displayed(4), Some(3));
    }
}

use pdf_writer::{Content, Name, Str};

use crate::fonts::{BuiltinFont, to_winansi_bytes};
use crate::model::{Alignment, Run, TabAlignment, TabStop};

pub(super) struct WordChunk {
    pub(super) font: BuiltinFont,
    pub(super) text: String,
    pub(super) font_size: f32,
    pub(super) x_offset: f32, // x relative to line start
    pub(super) width: f32,
}

pub(super) struct TextLine {
    pub(super) chunks: Vec<WordChunk>,
    pub(super) total_width: f32,
}

fn finish_line(chunks: &mut Vec<WordChunk>) -> TextLine {
    let total_width = chunks.last().map(|c| c.x_offset + c.width).unwrap_or(0.0);
    TextLine {
        chunks: std::mem::take(chunks),
        total_width,
    }
}

/// Layout runs into word-wrapped lines. No space is inserted between runs
/// unless the preceding text ended with whitespace or the new run starts
/// with whitespace.
pub(super) fn build_paragraph_lines(runs: &[Run], max_width: f32) -> Vec<TextLine> {
    let mut lines: Vec<TextLine> = Vec::new();
    let mut current_chunks: Vec<WordChunk> = Vec::new();
    let mut current_x: f32 = 0.0;
    let mut prev_ended_with_ws = false;
    let mut prev_space_w: f32 = 0.0;

    for run in runs {
        if run.is_tab {
            continue; // tabs handled in build_tabbed_line
        }

        let space_w = run.font.space_width(run.font_size);
        let starts_with_ws = run.text.starts_with(char::is_whitespace);

        for (i, word) in run.text.split_whitespace().enumerate() {
            let ww = run.font.text_width(word, run.font_size);

            let need_space =
                !current_chunks.is_empty() && (i > 0 || starts_with_ws || prev_ended_with_ws);

            // The space belongs to the run that owns the whitespace char.
            let effective_space_w = if i > 0 || starts_with_ws {
                space_w
            } else {
                prev_space_w
            };

            let proposed_x = if need_space {
                current_x + effective_space_w
            } else {
                current_x
            };

            if !current_chunks.is_empty() && proposed_x + ww > max_width {
                lines.push(finish_line(&mut current_chunks));
                current_x = 0.0;
            } else {
                current_x = proposed_x;
            }

            current_chunks.push(WordChunk {
                font: run.font,
                text: word.to_string(),
                font_size: run.font_size,
                x_offset: current_x,
                width: ww,
            });
            current_x += ww;
        }

        prev_ended_with_ws = run.text.ends_with(char::is_whitespace);
        prev_space_w = space_w;
    }

    if !current_chunks.is_empty() {
        lines.push(finish_line(&mut current_chunks));
    }

    if lines.is_empty() {
        lines.push(TextLine {
            chunks: vec![],
            total_width: 0.0,
        });
    }
    lines
}

fn find_next_tab_stop(current_x: f32, tab_stops: &[TabStop]) -> TabStop {
    const DEFAULT_TAB_INTERVAL: f32 = 36.0; // 0.5 inches

    for stop in tab_stops {
        if stop.position > current_x + 0.5 {
            return stop.clone();
        }
    }
    let next_default = ((current_x / DEFAULT_TAB_INTERVAL).floor() + 1.0) * DEFAULT_TAB_INTERVAL;
    TabStop {
        position: next_default,
        alignment: TabAlignment::Left,
        leader: None,
    }
}

fn segment_width(runs: &[&Run]) -> f32 {
    let mut w: f32 = 0.0;
    let mut first = true;
    for run in runs {
        let space_w = run.font.space_width(run.font_size);
        for (i, word) in run.text.split_whitespace().enumerate() {
            if !first || i > 0 {
                w += space_w;
            }
            w += run.font.text_width(word, run.font_size);
            first = false;
        }
    }
    w
}

/// Build the single line of a paragraph containing tab markers, e.g. a ToC
/// row: title, tab, page number right-aligned at the stop with the gap
/// filled by leader characters.
pub(super) fn build_tabbed_line(runs: &[Run], tab_stops: &[TabStop]) -> TextLine {
    // Split runs into segments at tab markers
    let mut segments: Vec<Vec<&Run>> = Vec::new();
    let mut current_seg: Vec<&Run> = Vec::new();
    for run in runs {
        if run.is_tab {
            segments.push(std::mem::take(&mut current_seg));
        } else {
            current_seg.push(run);
        }
    }
    segments.push(std::mem::take(&mut current_seg));

    let mut all_chunks: Vec<WordChunk> = Vec::new();
    let mut current_x: f32 = 0.0;

    for (seg_idx, seg_runs) in segments.iter().enumerate() {
        if seg_idx > 0 {
            let stop = find_next_tab_stop(current_x, tab_stops);

            let seg_start = match stop.alignment {
                TabAlignment::Left => stop.position.max(current_x),
                TabAlignment::Right => (stop.position - segment_width(seg_runs)).max(current_x),
            };

            // Fill the gap up to the aligned text with leader characters
            if let Some(leader_char) = stop.leader
                && let Some(run) = seg_runs.first().or_else(|| {
                    segments[..seg_idx].iter().rev().flat_map(|s| s.last()).next()
                })
            {
                let char_w = run.font.char_width_1000(leader_char) * run.font_size / 1000.0;
                let leader_gap = seg_start - current_x;
                if char_w > 0.0 && leader_gap > char_w * 2.0 {
                    let count = ((leader_gap - char_w) / char_w).floor() as usize;
                    if count > 0 {
                        let leader_w = count as f32 * char_w;
                        all_chunks.push(WordChunk {
                            font: run.font,
                            text: std::iter::repeat_n(leader_char, count).collect(),
                            font_size: run.font_size,
                            x_offset: seg_start - leader_w,
                            width: leader_w,
                        });
                    }
                }
            }

            current_x = seg_start;
        }

        let mut prev_ws = false;
        for run in seg_runs {
            let space_w = run.font.space_width(run.font_size);
            for (i, word) in run.text.split_whitespace().enumerate() {
                let ww = run.font.text_width(word, run.font_size);
                if !all_chunks.is_empty()
                    && (i > 0 || prev_ws || run.text.starts_with(char::is_whitespace))
                {
                    current_x += space_w;
                }
                all_chunks.push(WordChunk {
                    font: run.font,
                    text: word.to_string(),
                    font_size: run.font_size,
                    x_offset: current_x,
                    width: ww,
                });
                current_x += ww;
            }
            prev_ws = run.text.ends_with(char::is_whitespace);
        }
    }

    let total_width = all_chunks
        .last()
        .map(|c| c.x_offset + c.width)
        .unwrap_or(0.0);
    TextLine {
        chunks: all_chunks,
        total_width,
    }
}

/// Render pre-built lines applying the paragraph alignment.
/// `total_line_count` is the full paragraph line count (for justify: the
/// last line stays left-aligned).
pub(super) fn render_lines(
    content: &mut Content,
    lines: &[TextLine],
    alignment: Alignment,
    margin_left: f32,
    text_width: f32,
    first_baseline_y: f32,
    line_h: f32,
    total_line_count: usize,
    first_line_index: usize,
) {
    let mut cur_font: Option<(BuiltinFont, f32)> = None;
    let last_line_idx = total_line_count.saturating_sub(1);

    for (line_num, line) in lines.iter().enumerate() {
        if line.chunks.is_empty() {
            continue;
        }
        let y = first_baseline_y - line_num as f32 * line_h;
        let global_line_idx = first_line_index + line_num;

        let is_justified = alignment == Alignment::Justify
            && global_line_idx != last_line_idx
            && line.chunks.len() > 1;

        let line_start_x = match alignment {
            Alignment::Center => margin_left + (text_width - line.total_width) / 2.0,
            Alignment::Right => margin_left + text_width - line.total_width,
            Alignment::Left | Alignment::Justify => margin_left,
        };

        let extra_per_gap = if is_justified {
            (text_width - line.total_width) / (line.chunks.len() - 1) as f32
        } else {
            0.0
        };

        content.begin_text();
        let mut td_x = 0.0_f32;
        let mut td_y = 0.0_f32;

        for (chunk_idx, chunk) in line.chunks.iter().enumerate() {
            let x = line_start_x + chunk.x_offset + chunk_idx as f32 * extra_per_gap;

            if cur_font != Some((chunk.font, chunk.font_size)) {
                content.set_font(Name(chunk.font.resource_name().as_bytes()), chunk.font_size);
                cur_font = Some((chunk.font, chunk.font_size));
            }

            content.next_line(x - td_x, y - td_y);
            td_x = x;
            td_y = y;

            content.show(Str(&to_winansi_bytes(&chunk.text)));
        }
        content.end_text();
    }
}

//! PDF export.
//!
//! Pages are A4 and use only the standard Helvetica family with WinAnsi
//! encoding, so no font program is embedded. Text is laid out here: words
//! are measured with the Helvetica metrics, broken greedily into lines,
//! justified, and flowed onto as many pages as needed.

use std::mem;

use pdf_writer::{Content, Filter, Name, Pdf, Rect, Ref, Str, TextStr};

use super::{load_cover, sorted_chapters, Cover, ExportError, ExportFormat, ExportLabels, Exporter};
use crate::core::image_info::ImageKind;
use crate::core::markup::{RichText, Span};
use crate::{Book, Chapter, APP_NAME};

const PAGE_WIDTH: f32 = 595.28;
const PAGE_HEIGHT: f32 = 841.89;
const CM: f32 = 72.0 / 2.54;
const INCH: f32 = 72.0;
const MARGIN_X: f32 = 1.5 * CM;
const MARGIN_Y: f32 = 2.0 * CM;
const CONTENT_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN_X;

const COVER_IMAGE: Name<'static> = Name(b"Im1");

/// Vertical metrics and alignment of a block of text.
#[derive(Debug, Clone, Copy)]
struct ParagraphStyle {
    size: f32,
    leading: f32,
    bold: bool,
    first_indent: f32,
    left_indent: f32,
    space_before: f32,
    space_after: f32,
    justify: bool,
}

const SECTION_TITLE: ParagraphStyle = ParagraphStyle {
    size: 14.0,
    leading: 18.0,
    bold: true,
    first_indent: 0.0,
    left_indent: 0.0,
    space_before: 12.0,
    space_after: 6.0,
    justify: false,
};

const BODY: ParagraphStyle = ParagraphStyle {
    size: 10.0,
    leading: 14.0,
    bold: false,
    first_indent: 0.5 * CM,
    left_indent: 0.0,
    space_before: 0.0,
    space_after: 6.0,
    justify: true,
};

const INDEX_ITEM: ParagraphStyle = ParagraphStyle {
    size: 10.0,
    leading: 12.0,
    bold: false,
    first_indent: 0.0,
    left_indent: 0.5 * CM,
    space_before: 0.0,
    space_after: 0.0,
    justify: false,
};

/// A4 PDF with a full-bleed cover page, an index and one chapter per page.
pub struct PdfExporter {
    labels: ExportLabels,
}

impl PdfExporter {
    pub fn new(labels: ExportLabels) -> Self {
        Self { labels }
    }

    /// Lays the book out and returns the content stream of every page.
    fn layout(&self, book: &Book, chapters: &[Chapter], cover_size: Option<(u32, u32)>) -> Vec<Vec<u8>> {
        let labels = &self.labels;
        let chapters = sorted_chapters(chapters);
        let mut flow = Flow::new();

        if let Some((width, height)) = cover_size {
            flow.cover_image(width as f32, height as f32);
        }
        flow.centered(&book.title, PdfFont::Bold, 18.0, PAGE_HEIGHT - 3.0 * INCH);
        flow.centered(
            &labels.author_line(&book.author),
            PdfFont::Regular,
            10.0,
            PAGE_HEIGHT - 3.5 * INCH,
        );

        flow.new_page();
        flow.heading(labels.index);
        flow.space(0.2 * CM);
        if chapters.is_empty() {
            flow.plain_paragraph(labels.no_chapters, &BODY);
        }
        for chapter in &chapters {
            flow.plain_paragraph(&labels.index_entry(chapter), &INDEX_ITEM);
        }

        let prologue = RichText::parse(&book.prologue);
        let has_prologue = !prologue.plain_text().trim().is_empty();
        if has_prologue {
            flow.new_page();
            flow.heading(labels.prologue);
            flow.rich_text(&prologue);
        }

        for chapter in &chapters {
            flow.new_page();
            flow.heading(&labels.chapter_header(chapter));
            flow.rich_text(&RichText::parse(&chapter.content));
        }
        if chapters.is_empty() && !has_prologue {
            flow.new_page();
            flow.plain_paragraph(labels.no_content, &BODY);
        }

        flow.finish()
    }
}

impl Exporter for PdfExporter {
    fn format(&self) -> ExportFormat {
        ExportFormat::Pdf
    }

    fn render(&self, book: &Book, chapters: &[Chapter]) -> Result<Vec<u8>, ExportError> {
        let cover = load_cover(book).filter(|cover| {
            let usable = cover.info.kind == ImageKind::Jpeg;
            if !usable {
                log::warn!("PDF covers must be JPEG; skipping {}", cover.info.kind.extension());
            }
            usable
        });
        let pages = self.layout(
            book,
            chapters,
            cover.as_ref().map(|c| (c.info.width, c.info.height)),
        );
        if pages.is_empty() {
            return Err(ExportError::Pdf("layout produced no pages".to_string()));
        }
        Ok(write_document(book, &pages, cover.as_ref()))
    }
}

/// Serialises laid-out pages into a PDF file.
fn write_document(book: &Book, pages: &[Vec<u8>], cover: Option<&Cover>) -> Vec<u8> {
    let mut ids = RefAlloc::default();
    let catalog_id = ids.next();
    let tree_id = ids.next();
    let info_id = ids.next();
    let font_ids: Vec<Ref> = PdfFont::ALL.iter().map(|_| ids.next()).collect();
    let image_id = cover.map(|_| ids.next());
    let page_ids: Vec<(Ref, Ref)> = pages.iter().map(|_| (ids.next(), ids.next())).collect();

    let mut pdf = Pdf::new();
    pdf.catalog(catalog_id).pages(tree_id);
    pdf.pages(tree_id)
        .kids(page_ids.iter().map(|(page, _)| *page))
        .count(page_ids.len() as i32);
    pdf.document_info(info_id)
        .title(TextStr(&book.title))
        .author(TextStr(&book.author))
        .creator(TextStr(APP_NAME));

    for (font, id) in PdfFont::ALL.iter().zip(&font_ids) {
        pdf.type1_font(*id)
            .base_font(Name(font.base_name()))
            .encoding_predefined(Name(b"WinAnsiEncoding"));
    }

    if let (Some(cover), Some(id)) = (cover, image_id) {
        let mut image = pdf.image_xobject(id, &cover.data);
        image.filter(Filter::DctDecode);
        image.width(cover.info.width as i32);
        image.height(cover.info.height as i32);
        image.bits_per_component(8);
        let space = image.color_space();
        match cover.info.components {
            1 => space.device_gray(),
            4 => space.device_cmyk(),
            _ => space.device_rgb(),
        }
    }

    for (index, ((page_id, content_id), content)) in page_ids.iter().zip(pages).enumerate() {
        {
            let mut page = pdf.page(*page_id);
            page.media_box(Rect::new(0.0, 0.0, PAGE_WIDTH, PAGE_HEIGHT));
            page.parent(tree_id);
            page.contents(*content_id);
            let mut resources = page.resources();
            {
                let mut fonts = resources.fonts();
                for (font, id) in PdfFont::ALL.iter().zip(&font_ids) {
                    fonts.pair(font.resource_name(), *id);
                }
            }
            if let (0, Some(id)) = (index, image_id) {
                resources.x_objects().pair(COVER_IMAGE, id);
            }
        }
        pdf.stream(*content_id, content);
    }

    pdf.finish()
}

#[derive(Default)]
struct RefAlloc(i32);

impl RefAlloc {
    fn next(&mut self) -> Ref {
        self.0 += 1;
        Ref::new(self.0)
    }
}

// ── Fonts ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PdfFont {
    Regular,
    Bold,
    Oblique,
    BoldOblique,
}

impl PdfFont {
    const ALL: [PdfFont; 4] = [Self::Regular, Self::Bold, Self::Oblique, Self::BoldOblique];

    fn for_style(bold: bool, italic: bool) -> Self {
        match (bold, italic) {
            (false, false) => Self::Regular,
            (true, false) => Self::Bold,
            (false, true) => Self::Oblique,
            (true, true) => Self::BoldOblique,
        }
    }

    fn base_name(self) -> &'static [u8] {
        match self {
            Self::Regular => b"Helvetica",
            Self::Bold => b"Helvetica-Bold",
            Self::Oblique => b"Helvetica-Oblique",
            Self::BoldOblique => b"Helvetica-BoldOblique",
        }
    }

    fn resource_name(self) -> Name<'static> {
        match self {
            Self::Regular => Name(b"F1"),
            Self::Bold => Name(b"F2"),
            Self::Oblique => Name(b"F3"),
            Self::BoldOblique => Name(b"F4"),
        }
    }

    fn is_bold(self) -> bool {
        matches!(self, Self::Bold | Self::BoldOblique)
    }

    /// Advance width in thousandths of an em.
    fn char_width(self, c: char) -> u16 {
        let table = if self.is_bold() { &HELVETICA_BOLD_WIDTHS } else { &HELVETICA_WIDTHS };
        let c = base_letter(c).unwrap_or(c);
        match c {
            ' '..='~' => table[c as usize - 0x20],
            '\u{a0}' => table[0],
            '\t' => table[0],
            '¡' => 333,
            '¿' => 611,
            '°' => 400,
            '–' | '«' | '»' | '€' => 556,
            '—' | '…' | '‰' => 1000,
            '\u{2018}' | '\u{2019}' => if self.is_bold() { 278 } else { 222 },
            '\u{201c}' | '\u{201d}' => if self.is_bold() { 500 } else { 333 },
            '•' => 350,
            _ if win_ansi(c) == b'?' => table[usize::from(b'?' - 0x20)],
            _ => 556,
        }
    }

    fn text_width(self, text: &str, size: f32) -> f32 {
        let units: u32 = text.chars().map(|c| u32::from(self.char_width(c))).sum();
        units as f32 * size / 1000.0
    }
}

/// Helvetica advance widths for U+0020 through U+007E.
#[rustfmt::skip]
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
    278, 278, 584, 584, 584, 556, 1015,
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833,
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
    278, 278, 278, 469, 556, 333,
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833,
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500,
    334, 260, 334, 584,
];

/// Helvetica-Bold advance widths for U+0020 through U+007E.
#[rustfmt::skip]
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
    333, 333, 584, 584, 584, 611, 975,
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833,
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
    333, 278, 333, 584, 556, 333,
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889,
    611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500,
    389, 280, 389, 584,
];

/// Accented Latin letters share the advance width of their base letter.
fn base_letter(c: char) -> Option<char> {
    Some(match c {
        'À'..='Å' => 'A',
        'Ç' => 'C',
        'È'..='Ë' => 'E',
        'Ì'..='Ï' => 'I',
        'Ñ' => 'N',
        'Ò'..='Ö' | 'Ø' => 'O',
        'Ù'..='Ü' => 'U',
        'Ý' | 'Ÿ' => 'Y',
        'Š' => 'S',
        'Ž' => 'Z',
        'à'..='å' => 'a',
        'ç' => 'c',
        'è'..='ë' => 'e',
        'ì'..='ï' => 'i',
        'ñ' => 'n',
        'ò'..='ö' | 'ø' => 'o',
        'ù'..='ü' => 'u',
        'ý' | 'ÿ' => 'y',
        'š' => 's',
        'ž' => 'z',
        _ => return None,
    })
}

/// Maps a character to its WinAnsiEncoding byte, or `?` when it has none.
fn win_ansi(c: char) -> u8 {
    match u32::from(c) {
        code @ (0x20..=0x7e | 0xa0..=0xff) => code as u8,
        _ => match c {
            '\t' => b' ',
            '€' => 0x80,
            '‚' => 0x82,
            'ƒ' => 0x83,
            '„' => 0x84,
            '…' => 0x85,
            '†' => 0x86,
            '‡' => 0x87,
            'ˆ' => 0x88,
            '‰' => 0x89,
            'Š' => 0x8a,
            '‹' => 0x8b,
            'Œ' => 0x8c,
            'Ž' => 0x8e,
            '\u{2018}' => 0x91,
            '\u{2019}' => 0x92,
            '\u{201c}' => 0x93,
            '\u{201d}' => 0x94,
            '•' => 0x95,
            '–' => 0x96,
            '—' => 0x97,
            '˜' => 0x98,
            '™' => 0x99,
            'š' => 0x9a,
            '›' => 0x9b,
            'œ' => 0x9c,
            'ž' => 0x9e,
            'Ÿ' => 0x9f,
            _ => b'?',
        },
    }
}

fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars().map(win_ansi).collect()
}

// ── Layout ────────────────────────────────────────────────────────

/// A run of characters inside one word that share a font and colour.
#[derive(Debug, Clone)]
struct Fragment {
    text: String,
    font: PdfFont,
    size: f32,
    color: [u8; 3],
    underline: bool,
    width: f32,
}

/// The unit of line breaking; never split across lines.
#[derive(Debug, Clone, Default)]
struct Word {
    fragments: Vec<Fragment>,
}

impl Word {
    fn width(&self) -> f32 {
        self.fragments.iter().map(|f| f.width).sum()
    }

    /// Width of the space that follows this word, in its last font.
    fn space_width(&self) -> f32 {
        self.fragments
            .last()
            .map_or(0.0, |f| f.font.text_width(" ", f.size))
    }

    fn max_size(&self) -> f32 {
        self.fragments.iter().map(|f| f.size).fold(0.0, f32::max)
    }

    /// Cuts a word wider than `max_width` into pieces that fit, character
    /// by character. Every piece keeps at least one character.
    fn split_to_fit(self, max_width: f32) -> Vec<Word> {
        if self.width() <= max_width {
            return vec![self];
        }
        let mut pieces = Vec::new();
        let mut current = Word::default();
        let mut current_width = 0.0;
        for fragment in self.fragments {
            let mut text = String::new();
            let mut text_width = 0.0;
            for c in fragment.text.chars() {
                let advance = f32::from(fragment.font.char_width(c)) * fragment.size / 1000.0;
                let used = current_width + text_width;
                if used > 0.0 && used + advance > max_width {
                    if !text.is_empty() {
                        current.fragments.push(fragment.part(mem::take(&mut text), text_width));
                    }
                    pieces.push(mem::take(&mut current));
                    current_width = 0.0;
                    text_width = 0.0;
                }
                text.push(c);
                text_width += advance;
            }
            if !text.is_empty() {
                current_width += text_width;
                current.fragments.push(fragment.part(text, text_width));
            }
        }
        if !current.fragments.is_empty() {
            pieces.push(current);
        }
        pieces
    }
}

impl Fragment {
    fn part(&self, text: String, width: f32) -> Fragment {
        Fragment {
            text,
            font: self.font,
            size: self.size,
            color: self.color,
            underline: self.underline,
            width,
        }
    }
}

/// Splits styled spans into words, keeping style changes inside a word.
fn words(spans: &[Span], style: &ParagraphStyle) -> Vec<Word> {
    let mut words = Vec::new();
    let mut current = Word::default();
    for span in spans {
        let font = PdfFont::for_style(style.bold || span.style.bold, span.style.italic);
        let size = span.style.size.map_or(style.size, f32::from);
        let make = |text: String| Fragment {
            width: font.text_width(&text, size),
            text,
            font,
            size,
            color: span.style.color.unwrap_or([0, 0, 0]),
            underline: span.style.underline,
        };
        let mut piece = String::new();
        for c in span.text.chars() {
            if c.is_whitespace() && c != '\u{a0}' {
                if !piece.is_empty() {
                    current.fragments.push(make(mem::take(&mut piece)));
                }
                if !current.fragments.is_empty() {
                    words.push(mem::take(&mut current));
                }
            } else {
                piece.push(c);
            }
        }
        if !piece.is_empty() {
            current.fragments.push(make(piece));
        }
    }
    if !current.fragments.is_empty() {
        words.push(current);
    }
    words
}

/// Greedy line breaking. The first line is `first_width` wide, the rest
/// `width`. A word wider than the line is cut across lines.
fn break_lines(words: Vec<Word>, first_width: f32, width: f32) -> Vec<Vec<Word>> {
    let mut lines: Vec<Vec<Word>> = Vec::new();
    let mut line: Vec<Word> = Vec::new();
    let mut line_width = 0.0;
    let narrowest = first_width.min(width);
    for word in words.into_iter().flat_map(|w| w.split_to_fit(narrowest)) {
        let available = if lines.is_empty() { first_width } else { width };
        let needed = match line.last() {
            Some(prev) => line_width + prev.space_width() + word.width(),
            None => word.width(),
        };
        if !line.is_empty() && needed > available {
            lines.push(mem::take(&mut line));
            line_width = word.width();
        } else {
            line_width = needed;
        }
        line.push(word);
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

/// Page-by-page writer. The cursor `y` is the top of the next line.
struct Flow {
    current: Content,
    pages: Vec<Vec<u8>>,
    y: f32,
}

impl Flow {
    fn new() -> Self {
        Self {
            current: Content::new(),
            pages: Vec::new(),
            y: PAGE_HEIGHT - MARGIN_Y,
        }
    }

    fn new_page(&mut self) {
        let done = mem::replace(&mut self.current, Content::new());
        self.pages.push(done.finish());
        self.y = PAGE_HEIGHT - MARGIN_Y;
    }

    fn finish(mut self) -> Vec<Vec<u8>> {
        self.pages.push(self.current.finish());
        self.pages
    }

    fn at_top(&self) -> bool {
        self.y >= PAGE_HEIGHT - MARGIN_Y
    }

    fn ensure_space(&mut self, height: f32) {
        if !self.at_top() && self.y - height < MARGIN_Y {
            self.new_page();
        }
    }

    fn space(&mut self, height: f32) {
        if self.y - height < MARGIN_Y {
            self.new_page();
        } else {
            self.y -= height;
        }
    }

    /// Scales the cover so it covers the whole page, centred, keeping its
    /// aspect ratio.
    fn cover_image(&mut self, width: f32, height: f32) {
        let ratio = height / width;
        let mut target_w = PAGE_WIDTH;
        let mut target_h = target_w * ratio;
        if target_h < PAGE_HEIGHT {
            target_h = PAGE_HEIGHT;
            target_w = target_h / ratio;
        }
        let x = (PAGE_WIDTH - target_w) / 2.0;
        let y = (PAGE_HEIGHT - target_h) / 2.0;
        self.current.save_state();
        self.current.transform([target_w, 0.0, 0.0, target_h, x, y]);
        self.current.x_object(COVER_IMAGE);
        self.current.restore_state();
    }

    fn centered(&mut self, text: &str, font: PdfFont, size: f32, baseline: f32) {
        let fragment = Fragment {
            text: text.to_string(),
            font,
            size,
            color: [0, 0, 0],
            underline: false,
            width: font.text_width(text, size),
        };
        let x = (PAGE_WIDTH - fragment.width) / 2.0;
        self.show(&fragment, x, baseline);
    }

    fn heading(&mut self, text: &str) {
        self.plain_paragraph(text, &SECTION_TITLE);
    }

    fn plain_paragraph(&mut self, text: &str, style: &ParagraphStyle) {
        let mut rich = RichText::default();
        rich.push(text, Default::default());
        self.paragraph(rich.spans(), style);
    }

    /// Every line of the rich text is its own body paragraph.
    fn rich_text(&mut self, text: &RichText) {
        for line in text.lines() {
            self.paragraph(&line, &BODY);
        }
    }

    fn paragraph(&mut self, spans: &[Span], style: &ParagraphStyle) {
        if !self.at_top() && style.space_before > 0.0 {
            self.space(style.space_before);
        }
        let words = words(spans, style);
        if words.is_empty() {
            self.space(style.leading);
            return;
        }

        let width = CONTENT_WIDTH - style.left_indent;
        let lines = break_lines(words, width - style.first_indent, width);
        let last = lines.len() - 1;
        for (i, line) in lines.iter().enumerate() {
            let indent = style.left_indent + if i == 0 { style.first_indent } else { 0.0 };
            let size = line.iter().map(Word::max_size).fold(style.size, f32::max);
            let leading = style.leading.max(size * 1.2);
            self.ensure_space(leading);
            let baseline = self.y - size;

            let natural: f32 = line.iter().map(Word::width).sum::<f32>()
                + line[..line.len() - 1].iter().map(Word::space_width).sum::<f32>();
            let extra = if style.justify && i < last && line.len() > 1 {
                ((width - indent + style.left_indent - natural) / (line.len() - 1) as f32).max(0.0)
            } else {
                0.0
            };

            let mut x = MARGIN_X + indent;
            for word in line {
                for fragment in &word.fragments {
                    self.show(fragment, x, baseline);
                    x += fragment.width;
                }
                x += word.space_width() + extra;
            }
            self.y -= leading;
        }
        if style.space_after > 0.0 {
            self.space(style.space_after);
        }
    }

    fn show(&mut self, fragment: &Fragment, x: f32, baseline: f32) {
        let [r, g, b] = fragment.color.map(|v| f32::from(v) / 255.0);
        let content = &mut self.current;
        content.begin_text();
        content.set_font(fragment.font.resource_name(), fragment.size);
        content.set_fill_rgb(r, g, b);
        content.set_text_matrix([1.0, 0.0, 0.0, 1.0, x, baseline]);
        content.show(Str(&encode_win_ansi(&fragment.text)));
        content.end_text();
        if fragment.underline {
            let y = baseline - fragment.size * 0.12;
            content.set_stroke_rgb(r, g, b);
            content.set_line_width(fragment.size / 18.0);
            content.move_to(x, y);
            content.line_to(x + fragment.width, y);
            content.stroke();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::export::tests::{chapter, sample_book};
    use crate::core::image_info::tests::{jpeg_header, png_header};
    use crate::SpanStyle;
    use tempfile::tempdir;

    fn render(book: &Book, chapters: &[Chapter]) -> Vec<u8> {
        PdfExporter::new(ExportLabels::default())
            .render(book, chapters)
            .unwrap()
    }

    fn contains(haystack: &[u8], needle: &[u8]) -> bool {
        haystack.windows(needle.len()).any(|w| w == needle)
    }

    fn count(haystack: &[u8], needle: &[u8]) -> usize {
        haystack.windows(needle.len()).filter(|w| *w == needle).count()
    }

    fn page_count(pdf: &[u8]) -> usize {
        count(pdf, b"/Type /Page") - count(pdf, b"/Type /Pages")
    }

    #[test]
    fn test_empty_book_has_cover_index_and_notice() {
        let pdf = render(&sample_book(), &[]);
        assert!(pdf.starts_with(b"%PDF-"));
        assert!(contains(&pdf, b"%%EOF"));
        assert_eq!(page_count(&pdf), 3);
        assert!(contains(&pdf, b"/BaseFont /Helvetica-Bold"));
        assert!(contains(&pdf, b"/WinAnsiEncoding"));
    }

    #[test]
    fn test_one_page_per_section() {
        let mut book = sample_book();
        book.prologue = "Antes de todo".to_string();
        let pdf = render(&book, &[chapter(2, "Dos", "Fin"), chapter(1, "Uno", "Hola mundo")]);
        // cover, index, prologue, two chapters
        assert_eq!(page_count(&pdf), 5);
        assert!(contains(&pdf, b"(Hola)"));
        assert!(contains(&pdf, b"(mundo)"));
    }

    #[test]
    fn test_long_chapter_flows_onto_more_pages() {
        let content = vec!["palabra"; 4000].join(" ");
        let pdf = render(&sample_book(), &[chapter(1, "Largo", &content)]);
        assert!(page_count(&pdf) > 3);
    }

    #[test]
    fn test_jpeg_cover_is_embedded() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cover.jpg");
        std::fs::write(&path, jpeg_header(600, 900)).unwrap();
        let mut book = sample_book();
        book.cover_image_path = Some(path.to_string_lossy().into_owned());

        let pdf = render(&book, &[]);
        assert!(contains(&pdf, b"/Subtype /Image"));
        assert!(contains(&pdf, b"/DCTDecode"));
        assert!(contains(&pdf, b"/Im1 Do"));
    }

    #[test]
    fn test_png_cover_is_skipped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cover.png");
        std::fs::write(&path, png_header(600, 900)).unwrap();
        let mut book = sample_book();
        book.cover_image_path = Some(path.to_string_lossy().into_owned());

        let pdf = render(&book, &[]);
        assert!(!contains(&pdf, b"/Subtype /Image"));
        assert_eq!(page_count(&pdf), 3);
    }

    #[test]
    fn test_win_ansi_encoding() {
        assert_eq!(encode_win_ansi("Ñandú €"), vec![0xd1, b'a', b'n', b'd', 0xfa, b' ', 0x80]);
        assert_eq!(encode_win_ansi("“sí”"), vec![0x93, b's', 0xed, 0x94]);
        assert_eq!(encode_win_ansi("日本"), b"??".to_vec());
    }

    #[test]
    fn test_text_width_uses_helvetica_metrics() {
        assert!((PdfFont::Regular.text_width("Hello", 10.0) - 22.78).abs() < 1e-3);
        assert!((PdfFont::Bold.text_width("Hello", 10.0) - 24.45).abs() < 1e-3);
        assert_eq!(PdfFont::Regular.char_width('á'), PdfFont::Regular.char_width('a'));
        assert_eq!(PdfFont::for_style(true, true), PdfFont::BoldOblique);
    }

    #[test]
    fn test_words_keep_style_changes_inside_a_word() {
        let mut rich = RichText::default();
        rich.push("ne", SpanStyle::default());
        rich.push("gri", SpanStyle { bold: true, ..SpanStyle::default() });
        rich.push("ta  dos", SpanStyle::default());
        let words = words(rich.spans(), &BODY);
        assert_eq!(words.len(), 2);
        assert_eq!(words[0].fragments.len(), 3);
        assert_eq!(words[0].fragments[1].font, PdfFont::Bold);
        assert_eq!(words[1].fragments[0].text, "dos");
    }

    #[test]
    fn test_break_lines_respects_width() {
        let text = vec!["lorem ipsum dolor"; 30].join(" ");
        let spans = RichText::plain(&text);
        let lines = break_lines(words(spans.spans(), &BODY), 100.0, 150.0);
        assert!(lines.len() > 1);
        for (i, line) in lines.iter().enumerate() {
            let limit = if i == 0 { 100.0 } else { 150.0 };
            let width: f32 = line.iter().map(Word::width).sum::<f32>()
                + line[..line.len() - 1].iter().map(Word::space_width).sum::<f32>();
            assert!(width <= limit + 1e-3, "line {i} is {width}pt wide");
        }
        let total: usize = lines.iter().map(Vec::len).sum();
        assert_eq!(total, 90);
    }

    #[test]
    fn test_long_word_is_cut_to_the_line() {
        let word = "W".repeat(40);
        let text = format!("a {word} b");
        let spans = RichText::plain(&text);
        let lines = break_lines(words(spans.spans(), &BODY), 80.0, 100.0);
        assert!(lines.len() > 3);
        for (i, line) in lines.iter().enumerate() {
            let width: f32 = line.iter().map(Word::width).sum::<f32>()
                + line[..line.len() - 1].iter().map(Word::space_width).sum::<f32>();
            assert!(width <= 100.0 + 1e-3, "line {i} is {width}pt wide");
        }
        let letters: String = lines
            .iter()
            .flatten()
            .flat_map(|w| w.fragments.iter().map(|f| f.text.as_str()))
            .collect();
        assert_eq!(letters, format!("a{word}b"));
    }
}

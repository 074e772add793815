//! Word (`.docx`) export.
//!
//! The package is written part by part with `zip`; only the WordprocessingML
//! features the book layout needs are emitted.

use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::{load_cover, sorted_chapters, Cover, ExportError, ExportFormat, ExportLabels, Exporter};
use crate::core::markup::{escape_text, RichText, Span, SpanStyle};
use crate::{Book, Chapter, APP_NAME};

const EMU_PER_INCH: u64 = 914_400;
const COVER_WIDTH_EMU: u64 = 5 * EMU_PER_INCH;
const COVER_REL_ID: &str = "rIdCover";

const NS_W: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const NS_R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const NS_WP: &str = "http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing";
const NS_A: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const NS_PIC: &str = "http://schemas.openxmlformats.org/drawingml/2006/picture";
const REL_TYPE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// Microsoft Word document with a cover, bulleted index and one chapter per page.
pub struct DocxExporter {
    labels: ExportLabels,
}

impl DocxExporter {
    pub fn new(labels: ExportLabels) -> Self {
        Self { labels }
    }

    fn document_xml(&self, book: &Book, chapters: &[Chapter], cover: Option<&Cover>) -> String {
        let labels = &self.labels;
        let chapters = sorted_chapters(chapters);
        let mut body = Body::default();

        if let Some(cover) = cover {
            body.picture(cover);
            body.paragraph(Align::Left, &[]);
        }

        let title_style = SpanStyle {
            bold: true,
            face: Some("Calibri".to_string()),
            size: Some(18),
            ..SpanStyle::default()
        };
        body.text_paragraph(Align::Center, &book.title, &title_style);
        let author_style = SpanStyle {
            face: Some("Calibri".to_string()),
            size: Some(10),
            ..SpanStyle::default()
        };
        body.text_paragraph(Align::Center, &labels.author_line(&book.author), &author_style);

        let heading = SpanStyle {
            bold: true,
            size: Some(14),
            ..SpanStyle::default()
        };
        body.page_break();
        body.text_paragraph(Align::Left, labels.index, &heading);
        if chapters.is_empty() {
            body.text_paragraph(Align::Left, labels.no_chapters, &SpanStyle::default());
        }
        for chapter in &chapters {
            body.bullet(&labels.index_entry(chapter));
        }

        let prologue = RichText::parse(&book.prologue);
        if !prologue.plain_text().trim().is_empty() {
            body.page_break();
            body.text_paragraph(Align::Left, labels.prologue, &heading);
            body.rich_text(&prologue);
        }

        for chapter in &chapters {
            body.page_break();
            body.text_paragraph(Align::Left, &labels.chapter_header(chapter), &heading);
            body.rich_text(&RichText::parse(&chapter.content));
        }
        if chapters.is_empty() && prologue.plain_text().trim().is_empty() {
            body.page_break();
            body.text_paragraph(Align::Left, labels.no_content, &SpanStyle::default());
        }

        format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
             <w:document xmlns:w=\"{NS_W}\" xmlns:r=\"{NS_R}\" xmlns:wp=\"{NS_WP}\">\
             <w:body>{}<w:sectPr><w:pgSz w:w=\"11906\" w:h=\"16838\"/>\
             <w:pgMar w:top=\"1440\" w:right=\"1440\" w:bottom=\"1440\" w:left=\"1440\" \
             w:header=\"708\" w:footer=\"708\" w:gutter=\"0\"/></w:sectPr></w:body></w:document>",
            body.xml
        )
    }
}

impl Exporter for DocxExporter {
    fn format(&self) -> ExportFormat {
        ExportFormat::Docx
    }

    fn render(&self, book: &Book, chapters: &[Chapter]) -> Result<Vec<u8>, ExportError> {
        let cover = load_cover(book);
        let document = self.document_xml(book, chapters, cover.as_ref());

        let mut parts: Vec<(String, Vec<u8>)> = vec![
            ("[Content_Types].xml".to_string(), content_types_xml(cover.as_ref()).into_bytes()),
            ("_rels/.rels".to_string(), ROOT_RELS.as_bytes().to_vec()),
            ("docProps/core.xml".to_string(), core_xml(book).into_bytes()),
            (
                "word/_rels/document.xml.rels".to_string(),
                document_rels_xml(cover.as_ref()).into_bytes(),
            ),
            ("word/document.xml".to_string(), document.into_bytes()),
            ("word/styles.xml".to_string(), STYLES_XML.as_bytes().to_vec()),
            ("word/numbering.xml".to_string(), NUMBERING_XML.as_bytes().to_vec()),
        ];
        if let Some(cover) = cover {
            parts.push((cover_part_name(&cover), cover.data));
        }

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        for (name, data) in &parts {
            zip.start_file(name.as_str(), options)?;
            zip.write_all(data)?;
        }
        Ok(zip.finish()?.into_inner())
    }
}

#[derive(Clone, Copy)]
enum Align {
    Left,
    Center,
    Both,
}

impl Align {
    fn property(self) -> &'static str {
        match self {
            Self::Left => "",
            Self::Center => "<w:jc w:val=\"center\"/>",
            Self::Both => "<w:jc w:val=\"both\"/>",
        }
    }
}

/// Accumulates the children of `<w:body>`.
#[derive(Default)]
struct Body {
    xml: String,
    next_drawing_id: u32,
}

impl Body {
    fn paragraph(&mut self, align: Align, spans: &[Span]) {
        self.xml.push_str("<w:p>");
        let props = align.property();
        if !props.is_empty() {
            self.xml.push_str("<w:pPr>");
            self.xml.push_str(props);
            self.xml.push_str("</w:pPr>");
        }
        for span in spans {
            self.xml.push_str(&run(span));
        }
        self.xml.push_str("</w:p>");
    }

    fn text_paragraph(&mut self, align: Align, text: &str, style: &SpanStyle) {
        let span = Span {
            text: text.to_string(),
            style: style.clone(),
        };
        self.paragraph(align, std::slice::from_ref(&span));
    }

    /// One justified paragraph per line of the rich text.
    fn rich_text(&mut self, text: &RichText) {
        for line in text.lines() {
            self.paragraph(Align::Both, &line);
        }
    }

    fn bullet(&mut self, text: &str) {
        self.xml.push_str(
            "<w:p><w:pPr><w:pStyle w:val=\"ListBullet\"/>\
             <w:numPr><w:ilvl w:val=\"0\"/><w:numId w:val=\"1\"/></w:numPr></w:pPr>",
        );
        self.xml.push_str(&run(&Span {
            text: text.to_string(),
            style: SpanStyle::default(),
        }));
        self.xml.push_str("</w:p>");
    }

    fn page_break(&mut self) {
        self.xml.push_str("<w:p><w:r><w:br w:type=\"page\"/></w:r></w:p>");
    }

    fn picture(&mut self, cover: &Cover) {
        self.next_drawing_id += 1;
        let id = self.next_drawing_id;
        let cx = COVER_WIDTH_EMU;
        let cy = COVER_WIDTH_EMU * u64::from(cover.info.height) / u64::from(cover.info.width);
        let name = cover_file_name(cover);
        self.xml.push_str(&format!(
            "<w:p><w:pPr><w:jc w:val=\"center\"/></w:pPr><w:r><w:drawing>\
             <wp:inline distT=\"0\" distB=\"0\" distL=\"0\" distR=\"0\">\
             <wp:extent cx=\"{cx}\" cy=\"{cy}\"/>\
             <wp:docPr id=\"{id}\" name=\"Picture {id}\"/>\
             <wp:cNvGraphicFramePr><a:graphicFrameLocks xmlns:a=\"{NS_A}\" noChangeAspect=\"1\"/></wp:cNvGraphicFramePr>\
             <a:graphic xmlns:a=\"{NS_A}\"><a:graphicData uri=\"{NS_PIC}\">\
             <pic:pic xmlns:pic=\"{NS_PIC}\">\
             <pic:nvPicPr><pic:cNvPr id=\"0\" name=\"{name}\"/><pic:cNvPicPr/></pic:nvPicPr>\
             <pic:blipFill><a:blip r:embed=\"{COVER_REL_ID}\"/><a:stretch><a:fillRect/></a:stretch></pic:blipFill>\
             <pic:spPr><a:xfrm><a:off x=\"0\" y=\"0\"/><a:ext cx=\"{cx}\" cy=\"{cy}\"/></a:xfrm>\
             <a:prstGeom prst=\"rect\"><a:avLst/></a:prstGeom></pic:spPr>\
             </pic:pic></a:graphicData></a:graphic></wp:inline></w:drawing></w:r></w:p>"
        ));
    }
}

/// A `<w:r>` for one span. Embedded newlines become `<w:br/>`.
fn run(span: &Span) -> String {
    let style = &span.style;
    let mut props = String::new();
    if let Some(face) = &style.face {
        let face = escape_text(face);
        props.push_str(&format!(
            "<w:rFonts w:ascii=\"{face}\" w:hAnsi=\"{face}\" w:cs=\"{face}\"/>"
        ));
    }
    if style.bold {
        props.push_str("<w:b/>");
    }
    if style.italic {
        props.push_str("<w:i/>");
    }
    if let Some([r, g, b]) = style.color {
        props.push_str(&format!("<w:color w:val=\"{r:02X}{g:02X}{b:02X}\"/>"));
    }
    if let Some(size) = style.size {
        let half_points = u32::from(size) * 2;
        props.push_str(&format!("<w:sz w:val=\"{half_points}\"/><w:szCs w:val=\"{half_points}\"/>"));
    }
    if style.underline {
        props.push_str("<w:u w:val=\"single\"/>");
    }

    let mut out = String::from("<w:r>");
    if !props.is_empty() {
        out.push_str("<w:rPr>");
        out.push_str(&props);
        out.push_str("</w:rPr>");
    }
    for (i, piece) in span.text.split('\n').enumerate() {
        if i > 0 {
            out.push_str("<w:br/>");
        }
        let piece = xml_chars(piece);
        if !piece.is_empty() {
            out.push_str("<w:t xml:space=\"preserve\">");
            out.push_str(&escape_text(&piece));
            out.push_str("</w:t>");
        }
    }
    out.push_str("</w:r>");
    out
}

/// Drops the C0 control characters XML 1.0 does not allow; tabs survive.
fn xml_chars(text: &str) -> String {
    text.chars()
        .filter(|&c| c >= ' ' || c == '\t' || c == '\n')
        .collect()
}

fn cover_file_name(cover: &Cover) -> String {
    format!("cover.{}", cover.info.kind.extension())
}

fn cover_part_name(cover: &Cover) -> String {
    format!("word/media/{}", cover_file_name(cover))
}

fn content_types_xml(cover: Option<&Cover>) -> String {
    let image_default = cover
        .map(|cover| {
            let kind = cover.info.kind;
            format!(
                "<Default Extension=\"{}\" ContentType=\"{}\"/>",
                kind.extension(),
                kind.mime_type()
            )
        })
        .unwrap_or_default();
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
         <Types xmlns=\"http://schemas.openxmlformats.org/package/2006/content-types\">\
         <Default Extension=\"rels\" ContentType=\"application/vnd.openxmlformats-package.relationships+xml\"/>\
         <Default Extension=\"xml\" ContentType=\"application/xml\"/>\
         {image_default}\
         <Override PartName=\"/word/document.xml\" ContentType=\"{WML}.document.main+xml\"/>\
         <Override PartName=\"/word/styles.xml\" ContentType=\"{WML}.styles+xml\"/>\
         <Override PartName=\"/word/numbering.xml\" ContentType=\"{WML}.numbering+xml\"/>\
         <Override PartName=\"/docProps/core.xml\" ContentType=\"application/vnd.openxmlformats-package.core-properties+xml\"/>\
         </Types>",
        WML = "application/vnd.openxmlformats-officedocument.wordprocessingml"
    )
}

const ROOT_RELS: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">\
<Relationship Id=\"rId1\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument\" Target=\"word/document.xml\"/>\
<Relationship Id=\"rId2\" Type=\"http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties\" Target=\"docProps/core.xml\"/>\
</Relationships>";

fn document_rels_xml(cover: Option<&Cover>) -> String {
    let mut xml = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
         <Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">\
         <Relationship Id=\"rId1\" Type=\"{REL_TYPE}/styles\" Target=\"styles.xml\"/>\
         <Relationship Id=\"rId2\" Type=\"{REL_TYPE}/numbering\" Target=\"numbering.xml\"/>"
    );
    if let Some(cover) = cover {
        xml.push_str(&format!(
            "<Relationship Id=\"{COVER_REL_ID}\" Type=\"{REL_TYPE}/image\" Target=\"media/{}\"/>",
            cover_file_name(cover)
        ));
    }
    xml.push_str("</Relationships>");
    xml
}

fn core_xml(book: &Book) -> String {
    let now = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
         <cp:coreProperties xmlns:cp=\"http://schemas.openxmlformats.org/package/2006/metadata/core-properties\" \
         xmlns:dc=\"http://purl.org/dc/elements/1.1/\" xmlns:dcterms=\"http://purl.org/dc/terms/\" \
         xmlns:xsi=\"http://www.w3.org/2001/XMLSchema-instance\">\
         <dc:title>{}</dc:title><dc:creator>{}</dc:creator>\
         <cp:lastModifiedBy>{APP_NAME}</cp:lastModifiedBy>\
         <dcterms:created xsi:type=\"dcterms:W3CDTF\">{now}</dcterms:created>\
         <dcterms:modified xsi:type=\"dcterms:W3CDTF\">{now}</dcterms:modified>\
         </cp:coreProperties>",
        escape_text(&book.title),
        escape_text(&book.author)
    )
}

const STYLES_XML: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
<w:styles xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\">\
<w:docDefaults><w:rPrDefault><w:rPr><w:rFonts w:ascii=\"Calibri\" w:hAnsi=\"Calibri\" w:cs=\"Calibri\"/>\
<w:sz w:val=\"22\"/><w:szCs w:val=\"22\"/></w:rPr></w:rPrDefault>\
<w:pPrDefault><w:pPr><w:spacing w:after=\"120\"/></w:pPr></w:pPrDefault></w:docDefaults>\
<w:style w:type=\"paragraph\" w:default=\"1\" w:styleId=\"Normal\"><w:name w:val=\"Normal\"/></w:style>\
<w:style w:type=\"paragraph\" w:styleId=\"ListBullet\"><w:name w:val=\"List Bullet\"/>\
<w:basedOn w:val=\"Normal\"/><w:pPr><w:numPr><w:numId w:val=\"1\"/></w:numPr></w:pPr></w:style>\
</w:styles>";

const NUMBERING_XML: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
<w:numbering xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\">\
<w:abstractNum w:abstractNumId=\"0\"><w:lvl w:ilvl=\"0\"><w:start w:val=\"1\"/>\
<w:numFmt w:val=\"bullet\"/><w:lvlText w:val=\"\u{2022}\"/><w:lvlJc w:val=\"left\"/>\
<w:pPr><w:ind w:left=\"720\" w:hanging=\"360\"/></w:pPr></w:lvl></w:abstractNum>\
<w:num w:numId=\"1\"><w:abstractNumId w:val=\"0\"/></w:num>\
</w:numbering>";

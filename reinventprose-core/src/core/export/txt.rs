use std::fmt::Write as _;

use super::{sorted_chapters, ExportError, ExportFormat, ExportLabels, Exporter};
use crate::core::markup::to_plain_text;
use crate::{Book, Chapter};

const RULE_WIDTH: usize = 30;

/// Plain UTF-8 text with all formatting stripped.
pub struct TxtExporter {
    labels: ExportLabels,
}

impl TxtExporter {
    pub fn new(labels: ExportLabels) -> Self {
        Self { labels }
    }

    fn render_text(&self, book: &Book, chapters: &[Chapter]) -> String {
        let labels = &self.labels;
        let chapters = sorted_chapters(chapters);
        let rule = "-".repeat(RULE_WIDTH);
        let mut out = String::new();

        let title = book.title.to_uppercase();
        out.push_str(&title);
        out.push('\n');
        out.push_str(&underline('=', &title));
        out.push_str("\n\n");
        out.push_str(&labels.author_line(&book.author));
        out.push_str("\n\n");
        out.push_str(&rule);
        out.push_str("\n\n");

        out.push_str(labels.index);
        out.push('\n');
        out.push_str(&underline('-', labels.index));
        out.push('\n');
        if chapters.is_empty() {
            out.push_str(labels.no_chapters);
            out.push('\n');
        }
        for chapter in &chapters {
            out.push_str(&labels.index_entry(chapter));
            out.push('\n');
        }
        let _ = write!(out, "\n{rule}\n\n");

        let prologue = to_plain_text(&book.prologue);
        if !prologue.is_empty() {
            out.push_str(labels.prologue);
            out.push('\n');
            out.push_str(&underline('-', labels.prologue));
            let _ = write!(out, "\n{prologue}\n\n{rule}\n\n");
        }

        if chapters.is_empty() {
            out.push_str(labels.no_content);
            out.push('\n');
        }
        for chapter in &chapters {
            let header = labels.chapter_header(chapter);
            let _ = write!(
                out,
                "{header}\n{}\n{}\n\n",
                underline('-', &header),
                to_plain_text(&chapter.content)
            );
        }
        out
    }
}

impl Exporter for TxtExporter {
    fn format(&self) -> ExportFormat {
        ExportFormat::Txt
    }

    fn render(&self, book: &Book, chapters: &[Chapter]) -> Result<Vec<u8>, ExportError> {
        Ok(self.render_text(book, chapters).into_bytes())
    }
}

fn underline(ch: char, text: &str) -> String {
    std::iter::repeat(ch).take(text.chars().count()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::export::tests::{chapter, sample_book};

    fn render(book: &Book, chapters: &[Chapter]) -> String {
        let bytes = TxtExporter::new(ExportLabels::default())
            .render(book, chapters)
            .unwrap();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_full_layout() {
        let mut book = sample_book();
        book.prologue = "Érase <i>una</i> vez".to_string();
        let chapters = vec![
            chapter(2, "Dos", "Segundo<br />párrafo &amp; más"),
            chapter(1, "Uno", "<b>Hola</b>"),
        ];

        let rule = "-".repeat(30);
        let expected = format!(
            "LA LARGA NOCHE\n==============\n\n\
             Por: Ana Pérez\n\n{rule}\n\n\
             ÍNDICE\n------\n\
             Capítulo 1: Uno\n\
             Capítulo 2: Dos\n\
             \n{rule}\n\n\
             PRÓLOGO\n-------\nÉrase una vez\n\n{rule}\n\n\
             CAPÍTULO 1: UNO\n---------------\nHola\n\n\
             CAPÍTULO 2: DOS\n---------------\nSegundo\npárrafo & más\n\n"
        );
        assert_eq!(render(&book, &chapters), expected);
    }

    #[test]
    fn test_empty_book() {
        let text = render(&sample_book(), &[]);
        assert!(text.contains("ÍNDICE\n------\n(No hay capítulos)\n"));
        assert!(text.ends_with("No hay contenido de capítulos para exportar.\n"));
        assert!(!text.contains("PRÓLOGO"));
    }

    #[test]
    fn test_title_underline_counts_chars() {
        let mut book = sample_book();
        book.title = "Año".to_string();
        let text = render(&book, &[]);
        assert!(text.starts_with("AÑO\n===\n\n"));
    }

    #[test]
    fn test_english_labels() {
        let bytes = TxtExporter::new(ExportLabels::english())
            .render(&sample_book(), &[chapter(1, "One", "")])
            .unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.contains("By: Ana Pérez"));
        assert!(text.contains("CONTENTS\n--------\nChapter 1: One\n"));
        assert!(text.contains("CHAPTER 1: ONE\n"));
    }
}

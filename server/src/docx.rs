use std::io::Cursor;

use kernel::Question;

pub const DOCX_EXTENSION: &str = ".docx";
pub const DOCX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
const DOCUMENT_PART: &str = "word/document.xml";

/// Whether the bytes are a zip container holding a Word main document part.
#[must_use]
pub fn is_word_document(data: &[u8]) -> bool {
    match zip::ZipArchive::new(Cursor::new(data)) {
        Ok(mut archive) => archive.by_name(DOCUMENT_PART).is_ok(),
        Err(e) => {
            tracing::debug!("not a zip container: {e}");
            false
        }
    }
}

/// Questions handed back for an uploaded document. The document content is not read.
#[must_use]
pub fn placeholder_questions(file_name: &str) -> Vec<Question> {
    vec![
        Question {
            id: 1,
            question: format!("Sample question from {file_name}"),
            options: ["Option A", "Option B", "Option C", "Option D"]
                .map(String::from)
                .to_vec(),
            correct_answer: 0,
            explanation: Some("This is a sample question from the uploaded document.".to_owned()),
        },
        Question {
            id: 2,
            question: format!("Another question from {file_name}"),
            options: ["Choice A", "Choice B", "Choice C", "Choice D"]
                .map(String::from)
                .to_vec(),
            correct_answer: 1,
            explanation: Some(
                "This is another sample question from the uploaded document.".to_owned(),
            ),
        },
    ]
}

//! View-model of the query form page.
//!
//! Each element the page script used to look up by id is owned here as a
//! typed value. A renderer (browser binding, CLI, test) reads the state back
//! out after each event.

use crate::error::ClientError;
use crate::models::{Attachment, DecisionResult, QueryRequest};
use crate::render::DecisionCard;
use crate::transport::QueryTransport;

/// Element ids of the page markup.
pub mod ids {
    pub const FORM: &str = "query-form";
    pub const QUERY: &str = "query";
    pub const FILE_UPLOAD: &str = "file-upload";
    pub const DROP_AREA: &str = "drop-area";
    pub const RESULT: &str = "result";
}

pub const HIGHLIGHT_CLASS: &str = "highlight";

/// Whether the browser's default handling of an event must be suppressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultAction {
    Prevent,
    Allow,
}

#[derive(Debug, Default)]
pub struct FileInput {
    files: Vec<Attachment>,
}

impl FileInput {
    pub fn files(&self) -> &[Attachment] {
        &self.files
    }

    pub fn first(&self) -> Option<&Attachment> {
        self.files.first()
    }

    pub fn set_files(&mut self, files: Vec<Attachment>) {
        self.files = files;
    }
}

#[derive(Debug, Default)]
pub struct DropZone {
    highlighted: bool,
}

impl DropZone {
    pub fn is_highlighted(&self) -> bool {
        self.highlighted
    }

    pub fn class_list(&self) -> Vec<&'static str> {
        if self.highlighted {
            vec![HIGHLIGHT_CLASS]
        } else {
            Vec::new()
        }
    }
}

#[derive(Debug, Default)]
pub struct ResultContainer {
    card: Option<DecisionCard>,
    inner_html: String,
}

impl ResultContainer {
    pub fn card(&self) -> Option<&DecisionCard> {
        self.card.as_ref()
    }

    pub fn inner_html(&self) -> &str {
        &self.inner_html
    }

    fn replace(&mut self, card: DecisionCard) {
        self.inner_html = card.to_html();
        self.card = Some(card);
    }
}

#[derive(Debug, Default)]
pub struct QueryForm {
    query: String,
    file_input: FileInput,
    drop_zone: DropZone,
    result: ResultContainer,
}

impl QueryForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    pub fn file_input(&self) -> &FileInput {
        &self.file_input
    }

    pub fn drop_zone(&self) -> &DropZone {
        &self.drop_zone
    }

    pub fn result(&self) -> &ResultContainer {
        &self.result
    }

    /// File picker path.
    pub fn select_files(&mut self, files: Vec<Attachment>) {
        self.file_input.set_files(files);
    }

    pub fn drag_over(&mut self) -> DefaultAction {
        self.drop_zone.highlighted = true;
        DefaultAction::Prevent
    }

    /// Browsers only open a dropped file when `dragover` or `drop` goes
    /// uncancelled. Leaving the zone has no default to suppress.
    pub fn drag_leave(&mut self) -> DefaultAction {
        self.drop_zone.highlighted = false;
        DefaultAction::Allow
    }

    /// Dropped files replace the picker's selection.
    pub fn drop(&mut self, files: Vec<Attachment>) -> DefaultAction {
        self.drop_zone.highlighted = false;
        self.file_input.set_files(files);
        DefaultAction::Prevent
    }

    /// Query text plus the first selected file, if any.
    pub fn build_request(&self) -> QueryRequest {
        QueryRequest {
            query: self.query.clone(),
            file: self.file_input.first().cloned(),
        }
    }

    /// Sends the form and replaces the result container with the decision
    /// card. On error the container keeps its previous contents.
    pub async fn submit<T>(&mut self, transport: &T) -> Result<DecisionResult, ClientError>
    where
        T: QueryTransport + ?Sized,
    {
        let request = self.build_request();
        log::info!(
            "Submitting query ({} chars, file: {:?})",
            request.query.chars().count(),
            request.file.as_ref().map(|f| f.file_name.as_str())
        );

        let result = transport.submit(request).await?;
        log::info!("Received decision: {}", result.decision);

        self.result.replace(DecisionCard::new(&result));
        Ok(result)
    }
}

//! Streaming multipart/form-data parsing.
//!
//! The body is read part by part and chunk by chunk. Each read becomes a
//! [`PartEvent`] fed to a [`FormParser`], a small state machine:
//!
//! ```text
//! Collecting --violation--> Draining --end/error--> Done(Err)
//! Collecting --end--------------------------------> Done(Ok)
//! Collecting --stream error-----------------------> Done(Err)
//! ```
//!
//! Validation happens as early as the data allows: the file count and MIME
//! type are checked when a file part starts, image dimensions once its last
//! chunk has arrived. After the first violation the parser drops everything
//! it collected and keeps consuming the stream without buffering, so the
//! client still sees a clean response rather than a reset connection. Only
//! that first violation is reported.

use std::collections::HashMap;

use async_trait::async_trait;
use axum::{
    body::Bytes,
    extract::{FromRequest, Multipart, Request},
    http::{HeaderMap, header},
};

use fren_config::UploadConfig;
use fren_core::AppError;

use crate::routing::{Flow, HandlerResult, RequestContext, Stage};

/// Where the image dimension limit of a route comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DimensionLimit {
    Pixels(u32),
    /// The `avatar_max_dimension` upload setting.
    AvatarSetting,
}

impl DimensionLimit {
    pub fn resolve(self, uploads: &UploadConfig) -> u32 {
        match self {
            DimensionLimit::Pixels(pixels) => pixels,
            DimensionLimit::AvatarSetting => uploads.avatar_max_dimension,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartOptions {
    pub max_files: usize,
    /// Allowed MIME types; `None` accepts any.
    pub mime_types: Option<&'static [&'static str]>,
    /// When set, every file must decode as an image within this bound.
    pub max_image_dimension: Option<DimensionLimit>,
}

impl MultipartOptions {
    pub fn files(max_files: usize) -> Self {
        Self {
            max_files,
            mime_types: None,
            max_image_dimension: None,
        }
    }

    pub fn mime_types(mut self, mime_types: &'static [&'static str]) -> Self {
        self.mime_types = Some(mime_types);
        self
    }

    pub fn max_image_dimension(mut self, limit: DimensionLimit) -> Self {
        self.max_image_dimension = Some(limit);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub field_name: String,
    pub file_name: String,
    pub mime_type: String,
    pub data: Bytes,
}

/// A fully received form: text fields and files grouped by field name.
#[derive(Debug, Default)]
pub struct MultipartForm {
    pub fields: HashMap<String, String>,
    pub files: HashMap<String, Vec<UploadedFile>>,
}

impl MultipartForm {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn files(&self, name: &str) -> &[UploadedFile] {
        self.files.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn take_files(&mut self, name: &str) -> Vec<UploadedFile> {
        self.files.remove(name).unwrap_or_default()
    }

    pub fn file_count(&self) -> usize {
        self.files.values().map(Vec::len).sum()
    }
}

/// One read from the multipart stream.
#[derive(Debug)]
pub enum PartEvent {
    FieldStart {
        name: String,
        file_name: Option<String>,
        content_type: Option<String>,
    },
    Chunk(Bytes),
    FieldEnd,
    StreamEnd,
    StreamError(String),
}

#[derive(Debug)]
enum ParserState {
    Collecting,
    Draining(AppError),
    Done(Option<AppError>),
}

#[derive(Debug)]
enum Part {
    Text { name: String, data: Vec<u8> },
    File { file: UploadedFile, data: Vec<u8> },
    Skipped,
}

#[derive(Debug)]
pub struct FormParser {
    max_files: usize,
    mime_types: Option<&'static [&'static str]>,
    max_dimension: Option<u32>,
    state: ParserState,
    part: Option<Part>,
    file_count: usize,
    form: MultipartForm,
}

impl FormParser {
    /// `max_dimension` is the resolved image limit, if the route has one.
    pub fn new(options: &MultipartOptions, max_dimension: Option<u32>) -> Self {
        Self {
            max_files: options.max_files,
            mime_types: options.mime_types,
            max_dimension,
            state: ParserState::Collecting,
            part: None,
            file_count: 0,
            form: MultipartForm::default(),
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self.state, ParserState::Done(_))
    }

    pub fn handle(&mut self, event: PartEvent) {
        if self.is_done() {
            return;
        }

        match event {
            PartEvent::FieldStart {
                name,
                file_name,
                content_type,
            } => self.start_part(name, file_name, content_type),
            PartEvent::Chunk(chunk) => match &mut self.part {
                Some(Part::Text { data, .. }) | Some(Part::File { data, .. }) => {
                    data.extend_from_slice(&chunk)
                }
                Some(Part::Skipped) | None => {}
            },
            PartEvent::FieldEnd => self.end_part(),
            PartEvent::StreamEnd => self.finish_stream(None),
            PartEvent::StreamError(reason) => {
                self.finish_stream(Some(AppError::invalid_parameter(reason)))
            }
        }
    }

    /// The parsed form, or the first violation.
    pub fn finish(self) -> Result<MultipartForm, AppError> {
        match self.state {
            ParserState::Done(None) => Ok(self.form),
            ParserState::Done(Some(err)) | ParserState::Draining(err) => Err(err),
            ParserState::Collecting => Err(AppError::invalid_parameter("incomplete form")),
        }
    }

    fn start_part(&mut self, name: String, file_name: Option<String>, content_type: Option<String>) {
        let collecting = matches!(self.state, ParserState::Collecting);

        let Some(file_name) = file_name else {
            self.part = Some(if collecting {
                Part::Text {
                    name,
                    data: Vec::new(),
                }
            } else {
                Part::Skipped
            });
            return;
        };

        self.file_count += 1;
        self.part = Some(Part::Skipped);
        if !collecting {
            return;
        }

        if self.file_count > self.max_files {
            let max = self.max_files;
            self.fail(format!("{name}: maximum number of {max} file(s) exceeded"));
            return;
        }

        let mime_type = content_type.unwrap_or_else(|| "application/octet-stream".to_string());
        if let Some(allowed) = self.mime_types {
            if !allowed.iter().any(|allowed| allowed.eq_ignore_ascii_case(&mime_type)) {
                self.fail(format!("{name}: unsupported mime type '{mime_type}'"));
                return;
            }
        }

        self.part = Some(Part::File {
            file: UploadedFile {
                field_name: name,
                file_name,
                mime_type,
                data: Bytes::new(),
            },
            data: Vec::new(),
        });
    }

    fn end_part(&mut self) {
        match self.part.take() {
            Some(Part::Text { name, data }) => {
                let value = String::from_utf8_lossy(&data).into_owned();
                self.form.fields.insert(name, value);
            }
            Some(Part::File { mut file, data }) => {
                if let Some(max) = self.max_dimension {
                    if let Err(reason) = check_image(&data, max) {
                        self.fail(format!("{}: {reason}", file.field_name));
                        return;
                    }
                }
                file.data = Bytes::from(data);
                self.form
                    .files
                    .entry(file.field_name.clone())
                    .or_default()
                    .push(file);
            }
            Some(Part::Skipped) | None => {}
        }
    }

    fn finish_stream(&mut self, stream_error: Option<AppError>) {
        self.part = None;
        let state = std::mem::replace(&mut self.state, ParserState::Done(None));
        let outcome = match state {
            ParserState::Draining(first) => Some(first),
            _ => stream_error,
        };
        if outcome.is_some() {
            self.form = MultipartForm::default();
        }
        self.state = ParserState::Done(outcome);
    }

    /// Records the first violation and switches to draining.
    fn fail(&mut self, reason: String) {
        if matches!(self.state, ParserState::Collecting) {
            self.state = ParserState::Draining(AppError::invalid_parameter(reason));
            self.part = Some(Part::Skipped);
            self.form = MultipartForm::default();
        }
    }
}

fn check_image(data: &[u8], max: u32) -> Result<(), &'static str> {
    let size = imagesize::blob_size(data).map_err(|_| "image corrupt")?;
    let max = max as usize;
    if size.width > max || size.height > max {
        return Err("maximum image size exceeded");
    }
    Ok(())
}

pub fn is_multipart(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| {
            value
                .trim_start()
                .to_ascii_lowercase()
                .starts_with("multipart/form-data")
        })
        .unwrap_or(false)
}

/// Feeds every read of `multipart` to `parser` until the stream ends.
async fn drive(multipart: &mut Multipart, parser: &mut FormParser) {
    loop {
        let mut field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => return parser.handle(PartEvent::StreamEnd),
            Err(e) => return parser.handle(PartEvent::StreamError(e.body_text())),
        };

        parser.handle(PartEvent::FieldStart {
            name: field.name().unwrap_or_default().to_string(),
            file_name: field.file_name().map(str::to_string),
            content_type: field.content_type().map(str::to_string),
        });

        loop {
            match field.chunk().await {
                Ok(Some(chunk)) => parser.handle(PartEvent::Chunk(chunk)),
                Ok(None) => {
                    parser.handle(PartEvent::FieldEnd);
                    break;
                }
                Err(e) => return parser.handle(PartEvent::StreamError(e.body_text())),
            }
        }
    }
}

/// Parses a multipart body into `ctx.form`. Requests that are not
/// multipart pass through untouched.
pub struct ParseMultipart(pub MultipartOptions);

#[async_trait]
impl Stage for ParseMultipart {
    async fn run(&self, ctx: &mut RequestContext) -> HandlerResult {
        if !is_multipart(ctx.headers()) {
            return Ok(Flow::Next);
        }
        let Some(body) = ctx.take_body() else {
            return Ok(Flow::Next);
        };

        let mut request = Request::new(body);
        *request.headers_mut() = ctx.headers().clone();
        *request.extensions_mut() = ctx.extensions().clone();
        let mut multipart = Multipart::from_request(request, &())
            .await
            .map_err(|e| AppError::invalid_parameter(e.body_text()))?;

        let max_dimension = self
            .0
            .max_image_dimension
            .map(|limit| limit.resolve(&ctx.state().upload_config));
        let mut parser = FormParser::new(&self.0, max_dimension);
        drive(&mut multipart, &mut parser).await;

        let form = parser.finish()?;
        tracing::debug!(
            fields = form.fields.len(),
            files = form.file_count(),
            "Parsed multipart form"
        );
        ctx.form = Some(form);
        Ok(Flow::Next)
    }
}

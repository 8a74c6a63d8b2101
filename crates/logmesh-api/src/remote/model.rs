//! Remote API models for cross-node communication
//!
//! Request/response models ride a small payload envelope: a metadata block
//! carrying the request type plus a JSON body. The file-transfer side
//! channel has its own payload type ([`TransferPayload`]) that is pushed to
//! a delivery queue instead of riding an RPC reply.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::logdata::model::{LogEntry, LogQuery};

// Header keys stamped on cross-node requests
pub const HEADER_SOURCE: &str = "source";
pub const SOURCE_CLUSTER: &str = "cluster";

// Wire markers of the acceptance/decline status channel
pub const ACCEPTED_MARKER: &str = "ACCEPTED";
pub const DECLINED_MARKER: &str = "DECLINED";

/// Envelope metadata: the request type used for handler dispatch plus
/// free-form headers.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub r#type: String,
    pub headers: HashMap<String, String>,
}

/// Payload envelope carried across the call boundary in both directions.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payload {
    pub metadata: Metadata,
    pub body: Vec<u8>,
}

/// Base trait for all request models
pub trait RequestTrait {
    fn headers(&self) -> HashMap<String, String>;

    fn request_type(&self) -> &'static str {
        ""
    }

    fn body(&self) -> Vec<u8>
    where
        Self: Serialize,
    {
        serde_json::to_vec(self).unwrap_or_default()
    }

    fn insert_headers(&mut self, headers: HashMap<String, String>);

    fn request_id(&self) -> String {
        String::default()
    }

    fn to_payload(&self) -> Payload
    where
        Self: Serialize,
    {
        let mut metadata = Metadata {
            r#type: self.request_type().to_string(),
            ..Default::default()
        };
        for (k, v) in self.headers() {
            metadata.headers.insert(k, v);
        }
        Payload {
            metadata,
            body: self.body(),
        }
    }

    fn from_payload<T>(value: &Payload) -> T
    where
        T: for<'a> Deserialize<'a> + Default,
    {
        serde_json::from_slice::<T>(&value.body).unwrap_or_default()
    }
}

/// Base request structure
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    #[serde(skip)]
    pub headers: HashMap<String, String>,
    pub request_id: String,
}

impl Request {
    pub fn new() -> Self {
        Self {
            headers: HashMap::new(),
            ..Default::default()
        }
    }
}

impl RequestTrait for Request {
    fn headers(&self) -> HashMap<String, String> {
        self.headers.clone()
    }

    fn insert_headers(&mut self, headers: HashMap<String, String>) {
        if self.headers.is_empty() {
            self.headers = HashMap::with_capacity(headers.len());
        }
        for (k, v) in headers {
            self.headers.insert(k, v);
        }
    }

    fn request_id(&self) -> String {
        self.request_id.clone()
    }
}

/// Response status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseCode {
    Success = 200,
    Fail = 500,
}

impl ResponseCode {
    pub fn code(&self) -> i32 {
        *self as i32
    }
}

/// Base trait for all response models
pub trait ResponseTrait {
    fn response_type(&self) -> &'static str {
        ""
    }

    fn body(&self) -> Vec<u8>
    where
        Self: Serialize,
    {
        serde_json::to_vec(self).unwrap_or_default()
    }

    fn result_code(&self) -> i32;

    fn message(&self) -> String {
        String::default()
    }

    fn to_payload(&self) -> Payload
    where
        Self: Serialize,
    {
        Payload {
            metadata: Metadata {
                r#type: self.response_type().to_string(),
                ..Default::default()
            },
            body: self.body(),
        }
    }

    fn from_payload<T>(value: &Payload) -> T
    where
        T: for<'a> Deserialize<'a> + Default,
    {
        serde_json::from_slice::<T>(&value.body).unwrap_or_default()
    }
}

/// Base response structure
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub request_id: String,
    pub result_code: i32,
    pub error_code: i32,
    pub message: String,
}

impl Response {
    pub fn ok(request_id: String) -> Self {
        Self {
            request_id,
            result_code: ResponseCode::Success.code(),
            error_code: 0,
            message: String::default(),
        }
    }

    pub fn fail(request_id: String, message: impl Into<String>) -> Self {
        Self {
            request_id,
            result_code: ResponseCode::Fail.code(),
            error_code: ResponseCode::Fail.code(),
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.result_code == ResponseCode::Success.code()
    }
}

/// Outcome of the async file-request handshake.
///
/// The wire format stays the original bare status string (a success marker,
/// or a failure marker followed by `: <reason>`) so unmigrated peers keep
/// working across a rolling upgrade; in-process the status is this tagged
/// type and callers never match on prefixes themselves.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AcceptStatus {
    Accepted,
    Declined(String),
}

impl AcceptStatus {
    pub fn declined(reason: impl Into<String>) -> Self {
        AcceptStatus::Declined(reason.into())
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, AcceptStatus::Accepted)
    }

    pub fn to_wire(&self) -> String {
        match self {
            AcceptStatus::Accepted => ACCEPTED_MARKER.to_string(),
            AcceptStatus::Declined(reason) => format!("{}: {}", DECLINED_MARKER, reason),
        }
    }

    pub fn from_wire(status: &str) -> Self {
        if status == ACCEPTED_MARKER {
            return AcceptStatus::Accepted;
        }
        match status.strip_prefix(DECLINED_MARKER) {
            Some(reason) => AcceptStatus::Declined(
                reason.trim_start_matches(':').trim_start().to_string(),
            ),
            // Anything unrecognized is treated as a decline, reason verbatim
            None => AcceptStatus::Declined(status.to_string()),
        }
    }
}

/// Query a bounded batch of log entries from a peer
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogQueryRequest {
    #[serde(flatten)]
    pub request: Request,
    pub query: LogQuery,
}

impl LogQueryRequest {
    pub fn new(query: LogQuery) -> Self {
        Self {
            request: Request::new(),
            query,
        }
    }
}

impl RequestTrait for LogQueryRequest {
    fn headers(&self) -> HashMap<String, String> {
        self.request.headers()
    }

    fn request_type(&self) -> &'static str {
        "LogQueryRequest"
    }

    fn insert_headers(&mut self, headers: HashMap<String, String>) {
        self.request.insert_headers(headers);
    }

    fn request_id(&self) -> String {
        self.request.request_id()
    }
}

impl From<&Payload> for LogQueryRequest {
    fn from(value: &Payload) -> Self {
        LogQueryRequest::from_payload(value)
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogQueryResponse {
    #[serde(flatten)]
    pub response: Response,
    pub events: Vec<LogEntry>,
}

impl LogQueryResponse {
    pub fn new(response: Response, events: Vec<LogEntry>) -> Self {
        Self { response, events }
    }
}

impl ResponseTrait for LogQueryResponse {
    fn response_type(&self) -> &'static str {
        "LogQueryResponse"
    }

    fn result_code(&self) -> i32 {
        self.response.result_code
    }

    fn message(&self) -> String {
        self.response.message.clone()
    }
}

impl From<&Payload> for LogQueryResponse {
    fn from(value: &Payload) -> Self {
        <LogQueryResponse as ResponseTrait>::from_payload(value)
    }
}

/// Two-phase file request: asks the owning node to stage its log database
/// and push it to the requester's delivery queue. The reply carries only
/// the acceptance status, never file bytes.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRequest {
    #[serde(flatten)]
    pub request: Request,
    /// Routable address the payload should be delivered back to
    pub requester_address: String,
    /// Caller-chosen token linking the push delivery to this request
    pub correlation_id: u64,
}

impl FileRequest {
    pub fn new(requester_address: impl Into<String>, correlation_id: u64) -> Self {
        Self {
            request: Request::new(),
            requester_address: requester_address.into(),
            correlation_id,
        }
    }
}

impl RequestTrait for FileRequest {
    fn headers(&self) -> HashMap<String, String> {
        self.request.headers()
    }

    fn request_type(&self) -> &'static str {
        "FileRequest"
    }

    fn insert_headers(&mut self, headers: HashMap<String, String>) {
        self.request.insert_headers(headers);
    }

    fn request_id(&self) -> String {
        self.request.request_id()
    }
}

impl From<&Payload> for FileRequest {
    fn from(value: &Payload) -> Self {
        FileRequest::from_payload(value)
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRequestResponse {
    #[serde(flatten)]
    pub response: Response,
    /// Acceptance status in its wire form; see [`AcceptStatus`]
    pub status: String,
}

impl FileRequestResponse {
    pub fn new(request_id: String, status: AcceptStatus) -> Self {
        Self {
            response: Response::ok(request_id),
            status: status.to_wire(),
        }
    }

    pub fn accept_status(&self) -> AcceptStatus {
        AcceptStatus::from_wire(&self.status)
    }
}

impl ResponseTrait for FileRequestResponse {
    fn response_type(&self) -> &'static str {
        "FileRequestResponse"
    }

    fn result_code(&self) -> i32 {
        self.response.result_code
    }

    fn message(&self) -> String {
        self.response.message.clone()
    }
}

impl From<&Payload> for FileRequestResponse {
    fn from(value: &Payload) -> Self {
        <FileRequestResponse as ResponseTrait>::from_payload(value)
    }
}

/// Unsolicited file upload: the bytes ride inside the request itself, so
/// the ordinary RPC bound applies and no correlation id is involved.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilePushRequest {
    #[serde(flatten)]
    pub request: Request,
    pub file_name: String,
    pub data: Vec<u8>,
    /// Address of the pushing node
    pub source: String,
}

impl FilePushRequest {
    pub fn new(file_name: impl Into<String>, data: Vec<u8>, source: impl Into<String>) -> Self {
        Self {
            request: Request::new(),
            file_name: file_name.into(),
            data,
            source: source.into(),
        }
    }
}

impl RequestTrait for FilePushRequest {
    fn headers(&self) -> HashMap<String, String> {
        self.request.headers()
    }

    fn request_type(&self) -> &'static str {
        "FilePushRequest"
    }

    fn insert_headers(&mut self, headers: HashMap<String, String>) {
        self.request.insert_headers(headers);
    }

    fn request_id(&self) -> String {
        self.request.request_id()
    }
}

impl From<&Payload> for FilePushRequest {
    fn from(value: &Payload) -> Self {
        FilePushRequest::from_payload(value)
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilePushResponse {
    #[serde(flatten)]
    pub response: Response,
    /// Short status/size summary, e.g. "stored 17 bytes"
    pub message: String,
}

impl FilePushResponse {
    pub fn new(request_id: String, message: impl Into<String>) -> Self {
        Self {
            response: Response::ok(request_id),
            message: message.into(),
        }
    }
}

impl ResponseTrait for FilePushResponse {
    fn response_type(&self) -> &'static str {
        "FilePushResponse"
    }

    fn result_code(&self) -> i32 {
        self.response.result_code
    }

    fn message(&self) -> String {
        self.message.clone()
    }
}

impl From<&Payload> for FilePushResponse {
    fn from(value: &Payload) -> Self {
        <FilePushResponse as ResponseTrait>::from_payload(value)
    }
}

/// File bytes pushed to a delivery queue, tagged with the correlation id of
/// the request that asked for them. Produced once, consumed once.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferPayload {
    pub correlation_id: u64,
    pub file_name: String,
    pub data: Vec<u8>,
    /// Address of the node that staged and pushed the file
    pub source: String,
}

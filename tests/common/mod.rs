#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chatbridge::logging::{LogLine, Logger};
use chatbridge::providers::types::{
    GenerateObjectRequest, GenerateObjectResponse, GenerateTextRequest, GenerateTextResponse,
};
use chatbridge::providers::{LanguageModel, ProviderError, ProviderFuture};
use serde_json::Value;

/// What a stub primitive should do when called.
pub enum Reply<T> {
    Ok(T),
    Fail(fn() -> ProviderError),
}

/// A `LanguageModel` that records every call it receives.
pub struct StubModel {
    text_reply: Reply<GenerateTextResponse>,
    object_reply: Reply<Value>,
    pub text_calls: AtomicUsize,
    pub object_calls: AtomicUsize,
    pub last_text: Mutex<Option<GenerateTextRequest>>,
    pub last_object: Mutex<Option<GenerateObjectRequest>>,
}

impl StubModel {
    pub fn new(text_reply: Reply<GenerateTextResponse>, object_reply: Reply<Value>) -> Arc<Self> {
        Arc::new(Self {
            text_reply,
            object_reply,
            text_calls: AtomicUsize::new(0),
            object_calls: AtomicUsize::new(0),
            last_text: Mutex::new(None),
            last_object: Mutex::new(None),
        })
    }

    pub fn returning_text(text: &str) -> Arc<Self> {
        Self::new(
            Reply::Ok(GenerateTextResponse::text(text)),
            Reply::Fail(|| ProviderError::Other("unexpected object call".into())),
        )
    }

    pub fn returning_object(object: Value) -> Arc<Self> {
        Self::new(
            Reply::Fail(|| ProviderError::Other("unexpected text call".into())),
            Reply::Ok(object),
        )
    }

    pub fn text_calls(&self) -> usize {
        self.text_calls.load(Ordering::SeqCst)
    }

    pub fn object_calls(&self) -> usize {
        self.object_calls.load(Ordering::SeqCst)
    }
}

impl LanguageModel for StubModel {
    fn provider(&self) -> &str {
        "stub"
    }

    fn model_id(&self) -> &str {
        "stub-model"
    }

    fn generate_text<'a>(
        &'a self,
        request: &'a GenerateTextRequest,
    ) -> ProviderFuture<'a, GenerateTextResponse> {
        Box::pin(async move {
            self.text_calls.fetch_add(1, Ordering::SeqCst);
            *self.last_text.lock().unwrap() = Some(request.clone());
            match &self.text_reply {
                Reply::Ok(response) => Ok(response.clone()),
                Reply::Fail(make) => Err(make()),
            }
        })
    }

    fn generate_object<'a>(
        &'a self,
        request: &'a GenerateObjectRequest,
    ) -> ProviderFuture<'a, GenerateObjectResponse> {
        Box::pin(async move {
            self.object_calls.fetch_add(1, Ordering::SeqCst);
            *self.last_object.lock().unwrap() = Some(request.clone());
            match &self.object_reply {
                Reply::Ok(object) => Ok(GenerateObjectResponse::new(object.clone())),
                Reply::Fail(make) => Err(make()),
            }
        })
    }
}

/// A logger that keeps every line it receives.
pub fn capturing_logger() -> (Logger, Arc<Mutex<Vec<LogLine>>>) {
    let lines = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&lines);
    let logger: Logger = Arc::new(move |line: &LogLine| sink.lock().unwrap().push(line.clone()));
    (logger, lines)
}

//! In-memory compiler service with canned responses, for tests.

use std::{
    cell::{Cell, RefCell},
    collections::VecDeque,
};

use anyhow::{anyhow, Result};
use serde_json::json;

use super::{CompileRequest, CompileResponse, CompileService, Library};

pub struct FakeService {
    catalog: Vec<Library>,
    responses: RefCell<VecDeque<CompileResponse>>,
    pub library_calls: Cell<usize>,
    pub requests: RefCell<Vec<CompileRequest>>,
}

impl FakeService {
    /// Responses are handed out in order, one per compile call.
    pub fn new(responses: Vec<CompileResponse>) -> Self {
        let catalog = serde_json::from_value(json!([
            { "name": "range-v3", "versions": [{ "version": "trunk", "path": ["/libs/range-v3/include"] }] },
            { "name": "cppcoro", "versions": [{ "version": "trunk", "path": ["/libs/cppcoro/include"] }] }
        ]))
        .unwrap();
        Self {
            catalog,
            responses: RefCell::new(responses.into()),
            library_calls: Cell::new(0),
            requests: RefCell::new(Vec::new()),
        }
    }

    pub fn with_catalog(mut self, catalog: Vec<Library>) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn response(value: serde_json::Value) -> CompileResponse {
        serde_json::from_value(value).unwrap()
    }
}

impl CompileService for FakeService {
    async fn libraries(&self) -> Result<Vec<Library>> {
        self.library_calls.set(self.library_calls.get() + 1);
        Ok(self.catalog.clone())
    }

    async fn compile(&self, request: &CompileRequest) -> Result<CompileResponse> {
        self.requests.borrow_mut().push(request.clone());
        self.responses
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| anyhow!("no canned response left"))
    }
}

use httpmock::prelude::*;
use httpmock::{
    Mock,
    Then,
    When,
};
use serde_json::json;

type Handler = Box<dyn Fn(When, Then)>;

// Fake kubernetes apiserver; register handlers for the requests a test expects, call `build`, and
// then `assert` at the end to check that each handler was hit the expected number of times.
pub struct MockServerBuilder {
    server: MockServer,
    handlers: Vec<(Handler, usize)>,
    mocks: Vec<(usize, usize)>,
}

fn print_req(req: &HttpMockRequest) -> bool {
    // Use println instead of info! so that this works outside of the lib crate
    println!("    Received: {} {}", req.method(), req.uri().path());
    true
}

impl MockServerBuilder {
    pub fn new() -> MockServerBuilder {
        MockServerBuilder {
            server: MockServer::start(),
            handlers: vec![],
            mocks: vec![],
        }
    }

    pub fn assert(&self) {
        for (id, calls) in &self.mocks {
            println!("checking assertions for mock {id}");
            Mock::new(*id, &self.server).assert_calls(*calls);
        }
    }

    pub fn handle<F: Fn(When, Then) + 'static>(&mut self, f: F) -> &mut Self {
        self.handle_multiple(1, f)
    }

    // For requests that are made more than once, e.g. repeated GETs while polling
    pub fn handle_multiple<F: Fn(When, Then) + 'static>(&mut self, calls: usize, f: F) -> &mut Self {
        self.handlers.push((
            Box::new(move |w, t| {
                let w = w.matches(print_req);
                f(w, t);
            }),
            calls,
        ));
        self
    }

    pub fn handle_not_found(&mut self, path: String) -> &mut Self {
        self.handle(move |when, then| {
            when.path(&path);
            then.status(404).json_body(status_not_found());
        })
    }

    pub fn build(&mut self) {
        for (f, calls) in self.handlers.iter() {
            self.mocks.push((self.server.mock(f).id, *calls));
        }

        // Print all unmatched/unhandled requests for easier debugging;
        // this has to go last so that the other mock rules have a chance
        // to match first
        self.server.mock(|when, then| {
            when.matches(print_req);
            then.status(404).json_body(status_not_found());
        });
    }

    pub fn url(&self) -> http::Uri {
        http::Uri::try_from(self.server.url("/")).unwrap()
    }

    pub fn base_url(&self) -> String {
        self.server.base_url()
    }
}

impl Default for MockServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub fn make_fake_apiserver() -> (MockServerBuilder, kube::Client) {
    let builder = MockServerBuilder::new();
    let config = kube::Config::new(builder.url());
    let client = kube::Client::try_from(config).unwrap();
    (builder, client)
}

pub fn status_ok() -> serde_json::Value {
    json!({
      "kind": "Status",
      "apiVersion": "v1",
      "metadata": {},
      "status": "Success",
      "code": 200
    })
}

pub fn status_not_found() -> serde_json::Value {
    json!({
      "kind": "Status",
      "apiVersion": "v1",
      "metadata": {},
      "status": "Failure",
      "reason": "NotFound",
      "code": 404
    })
}

pub fn status_conflict() -> serde_json::Value {
    json!({
      "kind": "Status",
      "apiVersion": "v1",
      "metadata": {},
      "status": "Failure",
      "reason": "AlreadyExists",
      "code": 409
    })
}

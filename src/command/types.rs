use super::error::CommandError;
use super::node::NodeAddr;

use async_trait::async_trait;

/// A unit of cluster work that can be issued against any node.
#[async_trait]
pub trait Command: Send + Sync + 'static {
    type Response: AggregateResponse;

    fn name(&self) -> &'static str;

    /// Path of the endpoint this command hits on every node.
    fn target_endpoint(&self) -> &'static str;

    /// Issues the request against one node and decodes its response.
    async fn send_request(
        &self,
        client: &reqwest::Client,
        node: &NodeAddr,
    ) -> Result<Self::Response, CommandError>;
}

/// A per-node response that can absorb the responses of other nodes.
///
/// `append` must not depend on the order peers complete in: folding the same
/// set of responses in any order yields the same content.
pub trait AggregateResponse: Send + 'static {
    fn append(&mut self, other: Self)
    where
        Self: Sized;

    fn add_error(&mut self, error: String);

    fn errors(&self) -> &[String];

    fn render(&self) -> String;
}

/// Display step for a finished pass.
pub trait Reporter<R>: Send + Sync {
    fn report(&self, response: &R);
}

/// Prints the aggregate, then each collected error, to standard error.
#[derive(Debug, Clone, Copy, Default)]
pub struct StderrReporter;

impl<R: AggregateResponse> Reporter<R> for StderrReporter {
    fn report(&self, response: &R) {
        eprintln!("{}", response.render());
        for error in response.errors() {
            eprintln!("ERROR: {}", error);
        }
    }
}

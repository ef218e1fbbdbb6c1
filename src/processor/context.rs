//! Record processing context: shared collaborators for every record task.

use std::sync::Arc;

use crate::config::RunConfig;
use crate::coordinator::AcceptedCounter;
use crate::parser::MessageParser;
use crate::source::RecordSource;

/// Shared state for record tasks, reducing parameter passing between helpers.
///
/// One context serves a whole run; tasks hold it through an `Arc`.
pub struct RecordContext {
    pub(crate) source: Arc<dyn RecordSource>,
    pub(crate) config: Arc<RunConfig>,
    pub(crate) parser: MessageParser,
    pub(crate) accepted: Arc<AcceptedCounter>,
}

impl RecordContext {
    /// Build a context around a record source and run configuration
    pub fn new(source: Arc<dyn RecordSource>, config: Arc<RunConfig>) -> Self {
        let parser = MessageParser::new(config.customer_tool.clone());
        Self {
            source,
            config,
            parser,
            accepted: Arc::new(AcceptedCounter::default()),
        }
    }

    /// Counter of notifications accepted so far in this run
    pub fn accepted(&self) -> &AcceptedCounter {
        &self.accepted
    }

    /// Run configuration shared by all tasks
    pub fn config(&self) -> &RunConfig {
        &self.config
    }
}

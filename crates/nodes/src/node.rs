//! [`HeliconeNode`]: runs a batch of items through the gateway.
//!
//! Items are processed strictly in order, one request at a time. Each item is
//! independent: parameters are resolved, the request is built and sent, and
//! the outcome is recorded before the next item starts.

use std::sync::Arc;

use gateway::{ChatTransport, GatewayCredential, OutboundRequest, RequestBuilder};
use tracing::{info, info_span, warn, Instrument};

use crate::{ItemError, NodeError, NodeItem, NodeOutput, NodeParameters};

/// The Helicone chat node.
#[derive(Clone)]
pub struct HeliconeNode {
    builder: RequestBuilder,
    transport: Arc<dyn ChatTransport>,
    parameters: NodeParameters,
    continue_on_fail: bool,
}

impl HeliconeNode {
    pub fn new(
        credential: GatewayCredential,
        parameters: NodeParameters,
        transport: Arc<dyn ChatTransport>,
    ) -> Self {
        Self {
            builder: RequestBuilder::new(credential),
            transport,
            parameters,
            continue_on_fail: false,
        }
    }

    /// When set, item failures become `{"error": ...}` outputs instead of
    /// aborting the batch.
    pub fn with_continue_on_fail(mut self, continue_on_fail: bool) -> Self {
        self.continue_on_fail = continue_on_fail;
        self
    }

    /// Resolves parameters for `item` and builds its request without sending.
    pub fn prepare(&self, item: &NodeItem) -> Result<OutboundRequest, ItemError> {
        let parameters = match item.parameter_overrides() {
            Some(overrides) => self.parameters.overlay(overrides)?,
            None => self.parameters.clone(),
        };
        let request = parameters.to_chat_request()?;
        Ok(self.builder.build(&request)?)
    }

    /// Builds and sends the request for one item.
    pub async fn execute_item(&self, item: &NodeItem) -> Result<serde_json::Value, ItemError> {
        let request = self.prepare(item)?;
        Ok(self.transport.send(&request).await?)
    }

    /// Runs every item in order and returns one output per item.
    ///
    /// # Errors
    ///
    /// With continue-on-failure off, the first failing item aborts the batch
    /// with [`NodeError::Item`]. With it on, this never fails.
    pub async fn execute(&self, items: &[NodeItem]) -> Result<Vec<NodeOutput>, NodeError> {
        let mut outputs = Vec::with_capacity(items.len());

        for (index, item) in items.iter().enumerate() {
            let span = info_span!("helicone_item", item_index = index);
            match self.execute_item(item).instrument(span).await {
                Ok(response) => outputs.push(NodeOutput::success(index, response)),
                Err(err) if self.continue_on_fail => {
                    warn!(item_index = index, error = %err, "Item failed; continuing");
                    outputs.push(NodeOutput::error(index, err.to_string()));
                }
                Err(err) => {
                    return Err(NodeError::Item {
                        item_index: index,
                        source: err,
                    })
                }
            }
        }

        info!(
            items = items.len(),
            failed = outputs.iter().filter(|o| o.is_error()).count(),
            "Batch complete"
        );
        Ok(outputs)
    }
}

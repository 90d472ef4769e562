use crate::application::controller::TransactionFlowController;
use crate::domain::flow::{FlowIntent, FlowState};
use crate::error::Result;

/// Walks `intent` through every step of its plan without a UI.
///
/// Stops at the first error and abandons the flow. A commit failure is
/// accepted as the flow's result, so the returned state always has an
/// outcome when this returns `Ok`.
pub async fn drive(
    controller: &TransactionFlowController,
    intent: &FlowIntent,
) -> Result<FlowState> {
    loop {
        let state = controller.snapshot().await;
        if state.status.is_terminal() {
            return Ok(state);
        }
        if state.can_finish_with_failure() {
            return controller.finish_with_failure().await;
        }
        let Some(input) = intent.input_for(state.current_step) else {
            return Ok(state);
        };

        if let Err(err) = controller.advance(input).await {
            tracing::warn!(step = %state.current_step, error = %err, "intent stopped");
            if !controller.snapshot().await.status.is_terminal() {
                controller.abandon().await.ok();
            }
            return Err(err);
        }
    }
}

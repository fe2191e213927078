//! Given steps for incremental review BDD scenarios.

use eyre::WrapErr;
use rstest_bdd_macros::given;

use super::world::{ReviewWorld, run_async};
use crate::test_helpers::{REVIEWER, WEBHOOK_SECRET, mr_event_payload};

#[given("an open merge request with backend changes")]
pub fn open_merge_request(world: &mut ReviewWorld) {
    world
        .app
        .seed_merge_request(world.mr_iid, "feature/x", &["app/Models/User.php"]);
}

#[given(r#"a completed "{risk}" risk review with findings "{first}" and "{second}""#)]
pub fn completed_first_review(
    world: &mut ReviewWorld,
    risk: String,
    first: String,
    second: String,
) -> Result<(), eyre::Report> {
    super::when::run_review(world, &risk, &first, &second)
        .wrap_err("complete the first review in scenario setup")?;
    world.threads_before_re_review = world.app.vcs.created_discussions().len();
    Ok(())
}

/// Delivers the MR-open webhook and captures the dispatched task and its
/// pipeline token.
pub fn dispatch_review(world: &mut ReviewWorld) -> Result<(), eyre::Report> {
    let (status, body) = run_async(world.app.deliver_webhook(
        Some("Merge Request Hook"),
        Some(WEBHOOK_SECRET),
        None,
        &mr_event_payload("open", world.mr_iid, "feature/x", REVIEWER.value()),
    ));
    eyre::ensure!(status.is_success(), "webhook delivery failed: {status}");
    let task_id = body["task_id"]
        .as_u64()
        .ok_or_else(|| eyre::eyre!("webhook response carries no task id"))?;
    world.task_id = Some(task_id);
    world.bearer = Some(world.app.last_pipeline_token());
    Ok(())
}
